// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Submessage Codec Benchmark
//!
//! Encode and parse cost of the control submessages a writer emits on
//! every heartbeat period, plus endpoint creation on an in-memory bus.

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hdds_rtps::protocol::{create_message_gap, create_message_heartbeat, RtpsMessage};
use hdds_rtps::transport::{MemoryTransport, StaticIpFinder};
use hdds_rtps::{
    Endianness, EntityId, GuidPrefix, Participant, ReaderAttributes, SequenceNumber,
    SequenceNumberSet, StateKind, TopicAttributes, TopicKind, TypeDescriptor,
};
use std::net::Ipv4Addr;
use std::sync::Arc;

const PREFIX: GuidPrefix = GuidPrefix([0x01, 0xAA, 127, 0, 0, 1, 0, 0, 0, 0, 0, 1]);
const READER: EntityId = EntityId([0, 0, 1, 0x04]);
const WRITER: EntityId = EntityId([0, 0, 1, 0x03]);

fn bench_heartbeat(c: &mut Criterion) {
    for endianness in [Endianness::Little, Endianness::Big] {
        c.bench_function(&format!("heartbeat_encode_{:?}", endianness), |b| {
            let mut count = 0;
            b.iter(|| {
                count += 1;
                create_message_heartbeat(
                    PREFIX,
                    READER,
                    WRITER,
                    SequenceNumber(1),
                    black_box(SequenceNumber(1_000)),
                    count,
                    false,
                    false,
                    endianness,
                )
                .expect("encode")
            });
        });
    }

    let bytes = create_message_heartbeat(
        PREFIX,
        READER,
        WRITER,
        SequenceNumber(1),
        SequenceNumber(1_000),
        1,
        true,
        false,
        Endianness::Big,
    )
    .expect("encode");
    c.bench_function("heartbeat_parse", |b| {
        b.iter(|| RtpsMessage::parse(black_box(&bytes)).expect("parse"));
    });
}

fn bench_gap(c: &mut Criterion) {
    let base = SequenceNumber(1_000);
    let set = SequenceNumberSet::from_members(base, (0..256).step_by(3).map(|i| SequenceNumber(base.0 + i)))
        .expect("set");

    c.bench_function("gap_encode_full_bitmap", |b| {
        b.iter(|| {
            create_message_gap(PREFIX, SequenceNumber(900), black_box(&set), READER, WRITER, Endianness::Little)
                .expect("encode")
        });
    });

    let bytes = create_message_gap(PREFIX, SequenceNumber(900), &set, READER, WRITER, Endianness::Little)
        .expect("encode");
    c.bench_function("gap_parse_full_bitmap", |b| {
        b.iter(|| RtpsMessage::parse(black_box(&bytes)).expect("parse"));
    });
}

fn bench_reader_lifecycle(c: &mut Criterion) {
    let participant = Participant::builder("bench")
        .memory_transport(MemoryTransport::new())
        .ip_finder(StaticIpFinder(vec![Ipv4Addr::LOCALHOST]))
        .build()
        .expect("participant");
    let descriptor = Arc::new(TypeDescriptor::new("Bench", 8, false));
    let topic = TopicAttributes::new("bench/topic", "Bench", TopicKind::NoKey);

    // The first reader binds the shared resource; the loop measures reuse.
    let _anchor = participant
        .create_reader(ReaderAttributes::new(topic.clone()), false, StateKind::Stateless, Arc::clone(&descriptor), None, None)
        .expect("anchor reader");

    c.bench_function("reader_create_delete_shared_resource", |b| {
        b.iter(|| {
            let reader = participant
                .create_reader(
                    ReaderAttributes::new(topic.clone()),
                    false,
                    StateKind::Stateless,
                    Arc::clone(&descriptor),
                    None,
                    None,
                )
                .expect("reader");
            participant.delete_user_endpoint(&reader, 'R')
        });
    });
}

criterion_group!(benches, bench_heartbeat, bench_gap, bench_reader_lifecycle);
criterion_main!(benches);
