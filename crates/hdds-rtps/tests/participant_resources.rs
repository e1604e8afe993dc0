// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::too_many_lines)] // Example/test code

//! Participant entity and listen-resource management over the in-memory bus.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use hdds_rtps::endpoint::{Endpoint, WriterProxy};
use hdds_rtps::protocol::constants::RTPS_HEADER_SIZE;
use hdds_rtps::protocol::{
    create_message_gap, create_message_heartbeat, create_submessage_gap, Gap, Heartbeat,
};
use hdds_rtps::transport::{MemoryTransport, StaticIpFinder};
use hdds_rtps::{
    DiscoveryProtocol, EndpointKind, EndpointQos, Endianness, EntityId, Error, Guid, GuidPrefix,
    Locator, LivelinessProtocol, Participant, ReaderAttributes, ReaderListener, SequenceNumber,
    SequenceNumberSet, StateKind, TopicAttributes, TopicKind, TypeDescriptor, WriterAttributes, WriterLiveliness,
};
use parking_lot::Mutex;

fn host() -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, 5)
}

fn participant(bus: &MemoryTransport) -> Arc<Participant> {
    Participant::builder("resources")
        .memory_transport(bus.clone())
        .ip_finder(StaticIpFinder(vec![host()]))
        .build()
        .expect("participant")
}

fn topic() -> TopicAttributes {
    TopicAttributes::new("sensors/temperature", "Temperature", TopicKind::NoKey)
}

fn descriptor() -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::new("Temperature", 8, false))
}

fn reader_on(p: &Participant, locators: Vec<Locator>) -> hdds_rtps::Result<Arc<Endpoint>> {
    let mut attrs = ReaderAttributes::new(topic());
    attrs.unicast_locators = locators;
    p.create_reader(attrs, false, StateKind::Stateless, descriptor(), None, None)
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_default_unicast_resolves_to_host_fallback_port() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);

    let reader = reader_on(&p, Vec::new()).expect("reader");
    let expected = Locator::udpv4(host(), 7555);
    assert_eq!(reader.unicast_locators(), vec![expected]);
    assert_eq!(p.listen_resource_locators(), vec![expected]);
    assert!(bus.is_bound(&expected));
}

#[test]
fn test_equal_locators_share_one_resource() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let locator = Locator::udpv4(host(), 7411);

    let a = reader_on(&p, vec![locator]).expect("first reader");
    let b = reader_on(&p, vec![locator]).expect("second reader");

    assert_eq!(p.listen_resource_count(), 1);
    let associated = p.listen_resource_associations(&locator).expect("resource");
    assert_eq!(associated, vec![a.entity_id(), b.entity_id()]);
    assert_eq!(bus.bound_count(), 1);
}

#[test]
fn test_default_locators_shared_between_endpoints() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);

    let reader = reader_on(&p, Vec::new()).expect("reader");
    let writer = p
        .create_writer(
            WriterAttributes::new(topic()),
            false,
            StateKind::Stateful,
            descriptor(),
            None,
            None,
        )
        .expect("stateful writer");

    assert_eq!(p.listen_resource_count(), 1);
    assert_eq!(reader.unicast_locators(), writer.unicast_locators());
}

#[test]
fn test_failed_bind_leaves_nothing_behind() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let good = Locator::udpv4(host(), 7420);
    let refused = Locator::udpv4(host(), 7421);
    bus.refuse(refused);

    let existing = reader_on(&p, vec![good]).expect("reader");
    let counts = (p.user_reader_count(), p.all_readers().len(), p.listen_resource_count());

    let err = reader_on(&p, vec![Locator::udpv4(host(), 7422), refused]).expect_err("bind failure");
    match err {
        Error::ListenResourceBindFailure { locator, .. } => assert_eq!(locator, refused),
        other => panic!("unexpected error {:?}", other),
    }

    assert_eq!(
        (p.user_reader_count(), p.all_readers().len(), p.listen_resource_count()),
        counts
    );
    // The locator that did bind during the failed call was released again.
    assert!(!bus.is_bound(&Locator::udpv4(host(), 7422)));
    assert_eq!(
        p.listen_resource_associations(&good),
        Some(vec![existing.entity_id()])
    );
}

#[test]
fn test_failed_bind_stateful_writer() {
    let bus = MemoryTransport::new();
    let refused = Locator::udpv4(host(), 7430);
    bus.refuse(refused);
    let p = participant(&bus);

    let mut attrs = WriterAttributes::new(topic());
    attrs.unicast_locators = vec![refused];
    let err = p
        .create_writer(attrs.clone(), false, StateKind::Stateful, descriptor(), None, None)
        .expect_err("bind failure");
    assert!(matches!(err, Error::ListenResourceBindFailure { .. }));
    assert_eq!(p.user_writer_count(), 0);
    assert_eq!(p.listen_resource_count(), 0);

    // Stateless writers do not listen, so the same locator is fine.
    p.create_writer(attrs, false, StateKind::Stateless, descriptor(), None, None)
        .expect("stateless writer");
    assert_eq!(p.user_writer_count(), 1);
}

#[test]
fn test_entity_ids_are_unique() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let mut ids = HashSet::new();
    for i in 0..40 {
        let endpoint = if i % 2 == 0 {
            p.create_writer(
                WriterAttributes::new(topic()),
                false,
                StateKind::Stateless,
                descriptor(),
                None,
                None,
            )
        } else {
            reader_on(&p, Vec::new())
        }
        .expect("endpoint");
        assert!(ids.insert(endpoint.entity_id()), "duplicate id");
    }
    assert_eq!(ids.len(), 40);
}

#[test]
fn test_delete_not_found_and_wrong_kind() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let reader = reader_on(&p, Vec::new()).expect("reader");

    assert!(!p.delete_user_endpoint(&reader, 'W'));
    assert!(!p.delete_user_endpoint(&reader, 'x'));
    assert_eq!(p.user_reader_count(), 1);
    assert_eq!(p.listen_resource_count(), 1);
    assert!(!reader.is_closed());

    let stranger = Guid::new(GuidPrefix::new([9; 12]), reader.entity_id());
    assert!(matches!(
        p.remove_user_endpoint(stranger, EndpointKind::Reader),
        Err(Error::EndpointNotFound(_))
    ));

    assert!(p.delete_user_endpoint(&reader, 'R'));
    assert!(reader.is_closed());
    assert!(!p.delete_user_endpoint(&reader, 'R'));
}

#[test]
fn test_last_endpoint_delete_destroys_resource() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let locator = Locator::udpv4(host(), 7440);
    let a = reader_on(&p, vec![locator]).expect("reader a");
    let b = reader_on(&p, vec![locator]).expect("reader b");

    assert!(p.delete_user_endpoint(&a, 'R'));
    assert_eq!(p.listen_resource_count(), 1);
    assert!(bus.is_bound(&locator));

    assert!(p.delete_user_endpoint(&b, 'R'));
    assert_eq!(p.listen_resource_count(), 0);
    assert!(!bus.is_bound(&locator));
    assert!(p.endpoint(b.entity_id()).is_none());
}

#[test]
fn test_port_zero_writes_back_resolved_locator() {
    let bus = MemoryTransport::new();
    let p = Participant::builder("ephemeral")
        .memory_transport(bus.clone())
        .default_unicast_locator(Locator::udpv4(host(), 0))
        .build()
        .expect("participant");

    let reader = reader_on(&p, Vec::new()).expect("reader");
    let resolved = reader.unicast_locators()[0];
    assert_ne!(resolved.port, 0);
    assert_eq!(p.default_unicast_locators(), vec![resolved]);

    // The default now names the bound resource, so it is shared.
    reader_on(&p, Vec::new()).expect("second reader");
    assert_eq!(p.listen_resource_count(), 1);
}

#[derive(Default)]
struct Recorder {
    heartbeats: Mutex<Vec<(Guid, i32)>>,
    gaps: Mutex<usize>,
}

impl ReaderListener for Recorder {
    fn on_heartbeat(&self, _reader: &Guid, writer: &Guid, heartbeat: &Heartbeat) {
        self.heartbeats.lock().push((*writer, heartbeat.count));
    }

    fn on_gap(&self, _reader: &Guid, _writer: &Guid, _gap: &Gap) {
        *self.gaps.lock() += 1;
    }
}

#[test]
fn test_dispatch_survives_malformed_datagram() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let locator = Locator::udpv4(host(), 7450);
    let recorder = Arc::new(Recorder::default());

    let mut attrs = ReaderAttributes::new(topic());
    attrs.unicast_locators = vec![locator];
    let reader = p
        .create_reader(
            attrs,
            false,
            StateKind::Stateless,
            descriptor(),
            Some(Arc::clone(&recorder) as Arc<dyn ReaderListener>),
            None,
        )
        .expect("reader");

    let remote = GuidPrefix::new([7; 12]);
    let writer_id = EntityId::new([0, 0, 1, 0x03]);
    let heartbeat = create_message_heartbeat(
        remote,
        reader.entity_id(),
        writer_id,
        SequenceNumber(1),
        SequenceNumber(4),
        9,
        false,
        false,
        Endianness::Big,
    )
    .expect("heartbeat");

    // Truncated copy: valid header, submessage cut short.
    assert_eq!(bus.inject(&locator, &heartbeat[..30]), 1);
    assert_eq!(bus.inject(&locator, &heartbeat), 1);

    wait_until("heartbeat delivery", || !recorder.heartbeats.lock().is_empty());
    assert_eq!(
        *recorder.heartbeats.lock(),
        vec![(Guid::new(remote, writer_id), 9)]
    );
}

#[test]
fn test_writer_heartbeat_reaches_local_reader() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let recorder = Arc::new(Recorder::default());
    let reader = p
        .create_reader(
            ReaderAttributes::new(topic()),
            false,
            StateKind::Stateless,
            descriptor(),
            Some(Arc::clone(&recorder) as Arc<dyn ReaderListener>),
            None,
        )
        .expect("reader");

    let writer = p
        .create_writer(
            WriterAttributes::new(topic()),
            false,
            StateKind::Stateless,
            descriptor(),
            None,
            None,
        )
        .expect("writer");
    for locator in reader.unicast_locators() {
        writer.add_reader_locator(locator).expect("stateless writer");
    }
    writer.new_change().expect("sn");
    assert_eq!(writer.send_heartbeat().expect("send"), 1);

    wait_until("heartbeat from local writer", || !recorder.heartbeats.lock().is_empty());
    assert_eq!(recorder.heartbeats.lock()[0], (writer.guid(), 1));
}

#[derive(Default)]
struct DiscoveryLog {
    events: Mutex<Vec<(char, EntityId, bool)>>,
    announcements: Mutex<usize>,
}

impl DiscoveryProtocol for DiscoveryLog {
    fn local_writer_matching(&self, writer: &Arc<Endpoint>, active: bool) {
        self.events.lock().push(('W', writer.entity_id(), active));
    }

    fn local_reader_matching(&self, reader: &Arc<Endpoint>, active: bool) {
        self.events.lock().push(('R', reader.entity_id(), active));
    }

    fn announce_participant_state(&self, _new_change: bool) {
        *self.announcements.lock() += 1;
    }

    fn stop_participant_announcement(&self) {}

    fn reset_participant_announcement(&self) {}
}

#[test]
fn test_collaborators_notified() {
    let bus = MemoryTransport::new();
    let discovery = Arc::new(DiscoveryLog::default());
    let liveliness = Arc::new(WriterLiveliness::new());
    let p = Participant::builder("collaborators")
        .memory_transport(bus)
        .ip_finder(StaticIpFinder(vec![host()]))
        .discovery(Arc::clone(&discovery) as Arc<dyn DiscoveryProtocol>)
        .liveliness(Arc::clone(&liveliness) as Arc<dyn LivelinessProtocol>)
        .build()
        .expect("participant");

    let writer = p
        .create_writer(
            WriterAttributes::new(topic()),
            false,
            StateKind::Stateless,
            descriptor(),
            None,
            None,
        )
        .expect("writer");
    let reader = reader_on(&p, Vec::new()).expect("reader");
    assert!(liveliness.contains(&writer.guid()));

    p.announce_participant_state();
    assert_eq!(*discovery.announcements.lock(), 1);

    assert!(p.delete_user_endpoint(&writer, 'W'));
    assert!(p.delete_user_endpoint(&reader, 'R'));
    assert!(liveliness.is_empty());
    assert_eq!(
        *discovery.events.lock(),
        vec![
            ('W', writer.entity_id(), true),
            ('R', reader.entity_id(), true),
            ('W', writer.entity_id(), false),
            ('R', reader.entity_id(), false),
        ]
    );
}

#[test]
fn test_drop_closes_endpoints_and_releases_locators() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let reader = reader_on(&p, Vec::new()).expect("reader");
    let mut qos = EndpointQos::reliable();
    qos.heartbeat_period = Duration::from_millis(10);
    let mut attrs = WriterAttributes::new(topic());
    attrs.qos = qos;
    let writer = p
        .create_writer(attrs, false, StateKind::Stateful, descriptor(), None, None)
        .expect("writer");
    assert!(writer.participant().is_some());

    drop(p);
    assert!(reader.is_closed());
    assert!(writer.is_closed());
    assert!(writer.participant().is_none());
    assert_eq!(bus.bound_count(), 0);
}

#[test]
fn test_resource_semaphore_accumulates_posts() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    p.resource_semaphore_post();
    p.resource_semaphore_post();
    p.resource_semaphore_wait();
    p.resource_semaphore_wait();

    let waiter = {
        let p = Arc::clone(&p);
        thread::spawn(move || p.resource_semaphore_wait())
    };
    thread::sleep(Duration::from_millis(20));
    assert!(!waiter.is_finished());
    p.resource_semaphore_post();
    waiter.join().expect("waiter");
}

#[test]
fn test_gap_at_sequence_number_limits_keeps_dispatch_alive() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);
    let locator = Locator::udpv4(host(), 7800);
    let recorder = Arc::new(Recorder::default());

    let mut attrs = ReaderAttributes::new(topic());
    attrs.unicast_locators = vec![locator];
    let reader = p
        .create_reader(
            attrs,
            false,
            StateKind::Stateful,
            descriptor(),
            Some(Arc::clone(&recorder) as Arc<dyn ReaderListener>),
            None,
        )
        .expect("stateful reader");
    let remote = GuidPrefix::new([8; 12]);
    let writer_id = EntityId::new([0, 0, 2, 0x03]);
    let writer = Guid::new(remote, writer_id);
    reader
        .matched_writer_add(WriterProxy::new(writer, Vec::new(), Vec::new()))
        .expect("match writer");

    let heartbeat = create_message_heartbeat(
        remote,
        reader.entity_id(),
        writer_id,
        SequenceNumber(1),
        SequenceNumber(4),
        3,
        false,
        false,
        Endianness::Big,
    )
    .expect("heartbeat");

    // GAP whose bitmap runs past i64::MAX: base i64::MAX - 10 with 32 bits.
    let one = SequenceNumberSet::from_members(SequenceNumber(1), [SequenceNumber(1)]).expect("set");
    let mut gap = create_submessage_gap(SequenceNumber(1), &one, reader.entity_id(), writer_id, Endianness::Big)
        .expect("gap");
    gap[12..20].copy_from_slice(&[0x80, 0, 0, 0, 0, 0, 0, 0]);
    gap[20..28].copy_from_slice(&[0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF5]);
    gap[28..32].copy_from_slice(&32u32.to_be_bytes());
    let mut overflowing = heartbeat[..RTPS_HEADER_SIZE].to_vec();
    overflowing.extend_from_slice(&gap);
    assert_eq!(bus.inject(&locator, &overflowing), 1);

    // Largest legal GAP: everything from i64::MIN up to i64::MAX.
    let top = SequenceNumberSet::from_members(SequenceNumber(i64::MAX - 255), [SequenceNumber(i64::MAX)])
        .expect("top set");
    let widest = create_message_gap(
        remote,
        SequenceNumber(i64::MIN),
        &top,
        reader.entity_id(),
        writer_id,
        Endianness::Little,
    )
    .expect("gap");
    assert_eq!(bus.inject(&locator, &widest), 1);

    assert_eq!(bus.inject(&locator, &heartbeat), 1);
    wait_until("heartbeat after GAPs", || !recorder.heartbeats.lock().is_empty());

    assert_eq!(*recorder.heartbeats.lock(), vec![(writer, 3)]);
    assert_eq!(*recorder.gaps.lock(), 1);
    assert!(bus.is_bound(&locator));
    let proxy = reader.writer_proxy(&writer).expect("proxy");
    assert_eq!(
        proxy.irrelevant_ranges(),
        vec![
            (SequenceNumber(i64::MIN), SequenceNumber(i64::MAX - 256)),
            (SequenceNumber(i64::MAX), SequenceNumber(i64::MAX)),
        ]
    );
}

#[test]
fn test_create_reader_with_concurrent_semaphore_waiter() {
    let bus = MemoryTransport::new();
    let p = participant(&bus);

    let waiter = {
        let p = Arc::clone(&p);
        thread::spawn(move || p.resource_semaphore_wait())
    };
    thread::sleep(Duration::from_millis(20));
    assert!(!waiter.is_finished());

    let (done_tx, done_rx) = mpsc::channel();
    let creator = {
        let p = Arc::clone(&p);
        thread::spawn(move || {
            let created = reader_on(&p, vec![Locator::udpv4(host(), 7801)]).map(|r| r.entity_id());
            let _ = done_tx.send(created);
        })
    };

    let created = done_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("create_reader returned while another thread waits on the semaphore");
    assert!(created.is_ok());
    assert_eq!(p.listen_resource_count(), 1);
    creator.join().expect("creator");

    // The listen thread did not hand its readiness to the waiter.
    assert!(!waiter.is_finished());
    p.resource_semaphore_post();
    waiter.join().expect("waiter");
}
