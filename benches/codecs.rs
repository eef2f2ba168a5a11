//! Benchmarks for the varint, bit-packed and packed codecs.
//!
//! Each benchmark encodes or decodes a mix of small and large magnitudes so every length
//! tier is exercised.

extern crate netpack;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use netpack::{
    codec::{
        read_value_packed,
        varint::{read_u64_packed, write_u64_packed},
        write_value_packed, BitPacked, BIT_PACKED_U32_MAX,
    },
    BufferReader, BufferWriter,
};
use std::hint::black_box;

const COUNT: usize = 4096;

fn sample_values() -> Vec<u64> {
    (0..COUNT as u64)
        .map(|i| match i % 4 {
            0 => i % 240,
            1 => 241 + i % 2000,
            2 => i * 9_973,
            _ => u64::MAX - i,
        })
        .collect()
}

fn bench_varint(c: &mut Criterion) {
    let values = sample_values();
    let mut encoded = BufferWriter::new(64, COUNT * 9).unwrap();
    for &value in &values {
        write_u64_packed(&mut encoded, value).unwrap();
    }
    let data = encoded.into_vec();

    let mut group = c.benchmark_group("varint_u64");
    group.throughput(Throughput::Elements(COUNT as u64));
    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut writer = BufferWriter::fixed(COUNT * 9);
            for &value in &values {
                write_u64_packed(&mut writer, black_box(value)).unwrap();
            }
            black_box(writer.length())
        });
    });
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut reader = BufferReader::borrowed(black_box(&data));
            let mut sum = 0u64;
            for _ in 0..COUNT {
                sum = sum.wrapping_add(read_u64_packed(&mut reader).unwrap());
            }
            black_box(sum)
        });
    });
    group.finish();
}

fn bench_bit_packed(c: &mut Criterion) {
    let values: Vec<u32> = sample_values()
        .into_iter()
        .map(|v| (v & u64::from(BIT_PACKED_U32_MAX)) as u32)
        .collect();

    let mut group = c.benchmark_group("bit_packed_u32");
    group.throughput(Throughput::Elements(COUNT as u64));
    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut writer = BufferWriter::fixed(COUNT * 4);
            for &value in &values {
                black_box(value).write_bit_packed(&mut writer).unwrap();
            }
            black_box(writer.length())
        });
    });
    group.finish();
}

fn bench_packed_strings(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog".to_string();
    let mut writer = BufferWriter::new(64, 4096).unwrap();
    write_value_packed(&mut writer, &text).unwrap();
    let data = writer.into_vec();

    let mut group = c.benchmark_group("packed_string");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut writer = BufferWriter::fixed(256);
            write_value_packed(&mut writer, black_box(&text)).unwrap();
            black_box(writer.length())
        });
    });
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut reader = BufferReader::borrowed(black_box(&data));
            black_box(read_value_packed::<String>(&mut reader).unwrap())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_varint, bench_bit_packed, bench_packed_strings);
criterion_main!(benches);
