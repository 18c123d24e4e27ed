//! Connection dispatch benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hlnet_core::{Config, Connection, LocalConnection};
use hlnet_channel::MemoryTransport;
use hlnet_protocol::{encode_message, IntegerMessage, MsgKind, Writer};
use std::cell::Cell;
use std::rc::Rc;

const TICK: MsgKind = MsgKind::User(100);

fn packet(frames: usize) -> Bytes {
    let mut writer = Writer::new();
    let mut packet = Vec::new();
    for i in 0..frames {
        encode_message(&mut writer, TICK, &IntegerMessage::new(i as u32)).unwrap();
        packet.extend_from_slice(writer.as_slice());
    }
    Bytes::from(packet)
}

fn counting_connection() -> (Connection, Rc<Cell<u64>>) {
    let transport = Rc::new(MemoryTransport::new());
    let mut conn = Connection::new(transport, 0, 1, "bench", &Config::default()).unwrap();
    let total = Rc::new(Cell::new(0u64));
    let sink = total.clone();
    conn.register_message(TICK, move |_, msg: IntegerMessage| {
        sink.set(sink.get() + u64::from(msg.value));
        Ok(())
    });
    (conn, total)
}

fn bench_handle_packet(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_packet");

    for frames in [1usize, 16, 128] {
        let packet = packet(frames);
        let (mut conn, total) = counting_connection();

        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &packet, |b, packet| {
            b.iter(|| black_box(conn.handle_packet(packet.clone(), 0)));
        });
        black_box(total.get());
    }

    group.finish();
}

fn bench_pause_resume(c: &mut Criterion) {
    let mut group = c.benchmark_group("pause_resume");

    for frames in [16usize, 128] {
        let packet = packet(frames);
        let (mut conn, _) = counting_connection();

        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &packet, |b, packet| {
            b.iter(|| {
                conn.pause_handling();
                conn.handle_packet(packet.clone(), 0);
                black_box(conn.resume_handling())
            });
        });
    }

    group.finish();
}

fn bench_loopback_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("loopback_update");

    for messages in [1u32, 64] {
        let (mut server, mut client) = LocalConnection::pair(&Config::default()).unwrap();
        server.register_message(TICK, |_, msg: IntegerMessage| {
            black_box(msg.value);
            Ok(())
        });

        group.throughput(Throughput::Elements(u64::from(messages)));
        group.bench_with_input(BenchmarkId::from_parameter(messages), &messages, |b, &messages| {
            b.iter(|| {
                for i in 0..messages {
                    client.send(TICK, &IntegerMessage::new(i)).unwrap();
                }
                black_box(server.update())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_handle_packet,
    bench_pause_resume,
    bench_loopback_update,
);
criterion_main!(benches);
