// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic

//! Listen resources over real UDP sockets on the loopback interface.

use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hdds_rtps::protocol::{create_message_heartbeat, Heartbeat};
use hdds_rtps::{
    Endianness, EntityId, Guid, GuidPrefix, Locator, Participant, ReaderAttributes,
    ReaderListener, SequenceNumber, StateKind, TopicAttributes, TopicKind, TypeDescriptor,
    WriterAttributes,
};

#[derive(Default)]
struct Counter {
    heartbeats: AtomicUsize,
}

impl ReaderListener for Counter {
    fn on_heartbeat(&self, _reader: &Guid, _writer: &Guid, _heartbeat: &Heartbeat) {
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
    }
}

fn loopback_participant(name: &str) -> Arc<Participant> {
    Participant::builder(name)
        .default_send_port(0)
        .default_unicast_locator(Locator::udpv4(Ipv4Addr::LOCALHOST, 0))
        .build()
        .expect("participant")
}

fn topic() -> TopicAttributes {
    TopicAttributes::new("loopback", "Loopback", TopicKind::NoKey)
}

fn wait_for(counter: &AtomicUsize, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while counter.load(Ordering::SeqCst) < expected {
        assert!(Instant::now() < deadline, "timed out waiting for {} heartbeats", expected);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_port_zero_resolves_to_bound_port() {
    let p = loopback_participant("udp-resolve");
    let reader = p
        .create_reader(
            ReaderAttributes::new(topic()),
            false,
            StateKind::Stateless,
            Arc::new(TypeDescriptor::new("Loopback", 4, false)),
            None,
            None,
        )
        .expect("reader");

    let locator = reader.unicast_locators()[0];
    assert_ne!(locator.port, 0);
    assert_eq!(p.listen_resource_locators(), vec![locator]);

    // The port is really taken.
    let taken = UdpSocket::bind((Ipv4Addr::LOCALHOST, locator.port as u16));
    assert!(taken.is_err());
}

#[test]
fn test_raw_datagram_and_local_writer_reach_reader() {
    let p = loopback_participant("udp-dispatch");
    let counter = Arc::new(Counter::default());
    let reader = p
        .create_reader(
            ReaderAttributes::new(topic()),
            false,
            StateKind::Stateless,
            Arc::new(TypeDescriptor::new("Loopback", 4, false)),
            Some(Arc::clone(&counter) as Arc<dyn ReaderListener>),
            None,
        )
        .expect("reader");
    let target = reader.unicast_locators()[0]
        .to_socket_addr()
        .expect("socket address");

    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("sender");
    sender.send_to(b"not rtps", target).expect("send garbage");
    let heartbeat = create_message_heartbeat(
        GuidPrefix::new([3; 12]),
        EntityId::UNKNOWN,
        EntityId([0, 0, 9, 0x03]),
        SequenceNumber(1),
        SequenceNumber(1),
        1,
        true,
        false,
        Endianness::Little,
    )
    .expect("heartbeat");
    sender.send_to(&heartbeat, target).expect("send heartbeat");
    wait_for(&counter.heartbeats, 1);

    let writer = p
        .create_writer(
            WriterAttributes::new(topic()),
            false,
            StateKind::Stateless,
            Arc::new(TypeDescriptor::new("Loopback", 4, false)),
            None,
            None,
        )
        .expect("writer");
    writer
        .add_reader_locator(reader.unicast_locators()[0])
        .expect("reader locator");
    writer.send_heartbeat().expect("send");
    wait_for(&counter.heartbeats, 2);
}

#[test]
fn test_delete_releases_udp_port() {
    let p = loopback_participant("udp-release");
    let reader = p
        .create_reader(
            ReaderAttributes::new(topic()),
            false,
            StateKind::Stateless,
            Arc::new(TypeDescriptor::new("Loopback", 4, false)),
            None,
            None,
        )
        .expect("reader");
    let port = reader.unicast_locators()[0].port as u16;

    assert!(p.delete_user_endpoint(&reader, 'R'));
    assert_eq!(p.listen_resource_count(), 0);
    UdpSocket::bind((Ipv4Addr::LOCALHOST, port)).expect("port free after delete");
}
