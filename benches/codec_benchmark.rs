use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gsm_bts_core::bitvec::{BitVector, BitVectorBuilder};
use gsm_bts_core::l2::{ControlField, L2Address, L2Frame, Primitive, Sapi, CR};
use gsm_bts_core::l3::{L3Header, ProtocolDiscriminator, TransactionId};
use std::time::Duration;

fn benchmark_bitvector_fields(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitvector_fields");
    group.measurement_time(Duration::from_secs(10));
    group.warm_up_time(Duration::from_secs(3));

    let bv = BitVector::from_bytes(vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04]);
    group.bench_function("read_field_8bit", |b| {
        b.iter(|| {
            let _ = bv.read_field(black_box(8), black_box(8));
        })
    });
    group.bench_function("read_field_3bit", |b| {
        b.iter(|| {
            let _ = bv.read_field(black_box(5), black_box(3));
        })
    });

    group.bench_function("builder_append_field", |b| {
        b.iter(|| {
            let mut builder = BitVectorBuilder::with_capacity(4);
            builder.append_field(black_box(0x5), black_box(3));
            builder.append_field(black_box(0x1a), black_box(5));
            builder.append_byte(black_box(0xff));
            black_box(builder.freeze())
        })
    });

    group.finish();
}

fn benchmark_l2_frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("l2_frame_codec");
    group.measurement_time(Duration::from_secs(10));
    group.warm_up_time(Duration::from_secs(3));

    let frame = L2Frame::new(
        Primitive::L3Data,
        L2Address { sapi: Sapi::RrMmCc, cr: CR::Command },
        ControlField::Info { ns: 3, nr: 5, p: false },
        vec![0x01, 0x02, 0x03, 0x04, 0x05],
    );

    group.bench_function("encode", |b| {
        b.iter(|| black_box(frame.to_bitvector().unwrap()))
    });

    let bv = frame.to_bitvector().unwrap();
    group.bench_function("decode", |b| {
        b.iter(|| {
            let _ = L2Frame::from_bitvector(black_box(&bv), Primitive::L3Data);
        })
    });

    group.finish();
}

fn benchmark_l3_header_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("l3_header_codec");

    let headers = [
        (
            "without_ti",
            L3Header {
                pd: ProtocolDiscriminator::RadioResource,
                ti: None,
                message_type: 0x3f,
            },
        ),
        (
            "with_short_ti",
            L3Header {
                pd: ProtocolDiscriminator::CallControl,
                ti: Some(TransactionId { flag: false, value: 2 }),
                message_type: 0x05,
            },
        ),
    ];

    for (name, header) in &headers {
        group.bench_with_input(BenchmarkId::new("encode", name), header, |b, header| {
            b.iter(|| black_box(header.encode()))
        });

        let bytes = header.encode();
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            b.iter(|| {
                let _ = L3Header::decode(black_box(bytes));
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_bitvector_fields,
    benchmark_l2_frame_codec,
    benchmark_l3_header_codec
);
criterion_main!(benches);
