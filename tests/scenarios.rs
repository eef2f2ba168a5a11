//! End-to-end behaviour of the cursors and codecs through the public API.

use netpack::{
    codec::{
        varint::{
            packed_size_u64, read_i64_packed, read_u64_packed, write_i64_packed, write_u64_packed,
        },
        BitPacked, BIT_PACKED_I32_MAX, BIT_PACKED_I32_MIN, BIT_PACKED_U16_MAX,
        BIT_PACKED_U32_MAX, BIT_PACKED_U64_MAX,
    },
    utils::ZigZag,
    BufferReader, BufferWriter, Error, WriterConfig,
};

#[test]
fn varint_sequence_roundtrip() {
    let values = [0u64, 240, 241, 2287, 2288, 70000, u64::from(u32::MAX)];

    let mut writer = BufferWriter::new(64, 64).unwrap();
    for value in values {
        write_u64_packed(&mut writer, value).unwrap();
    }
    assert_eq!(writer.length(), 1 + 1 + 2 + 2 + 3 + 4 + 5);
    assert_eq!(writer.length(), 18);

    let mut reader = BufferReader::from_writer(&writer);
    let decoded: Vec<u64> = values
        .iter()
        .map(|_| read_u64_packed(&mut reader).unwrap())
        .collect();
    assert_eq!(decoded, values);
    assert!(!reader.has_more_data());
}

#[test]
fn negative_one_is_one_byte() {
    let mut writer = BufferWriter::new(8, 8).unwrap();
    write_i64_packed(&mut writer, -1).unwrap();
    assert_eq!(writer.as_slice(), &[1]);

    let mut reader = BufferReader::from_writer(&writer);
    assert_eq!(read_i64_packed(&mut reader).unwrap(), -1);
}

#[test]
fn single_growth_to_max() {
    let mut writer = BufferWriter::with_config(WriterConfig::growable(4, 8)).unwrap();
    let mut capacities = vec![writer.capacity()];
    for byte in 1..=6u8 {
        writer.write_byte(byte).unwrap();
        if capacities.last() != Some(&writer.capacity()) {
            capacities.push(writer.capacity());
        }
    }
    assert_eq!(capacities, vec![4, 8]);
    assert_eq!(writer.capacity(), 8);

    let mut reader = BufferReader::from_writer(&writer);
    assert_eq!(reader.read_bytes(6).unwrap(), &[1, 2, 3, 4, 5, 6]);
}

#[test]
fn bit_context_commits_one_byte() {
    let mut writer = BufferWriter::new(4, 4).unwrap();
    {
        let mut bits = writer.enter_bitwise_context().unwrap();
        bits.write_bits(0b101, 3).unwrap();
        bits.write_bits(0b00001, 5).unwrap();
    }
    assert_eq!(writer.position(), 1);
    assert_eq!(writer.as_slice(), &[0b0000_1101]);

    let mut reader = BufferReader::from_writer(&writer);
    {
        let mut bits = reader.enter_bitwise_context().unwrap();
        assert_eq!(bits.read_bits(3).unwrap(), 0b101);
        assert_eq!(bits.read_bits(5).unwrap(), 0b00001);
    }
    assert_eq!(reader.position(), 1);
}

#[test]
fn oversized_request_is_refused() {
    let mut writer = BufferWriter::new(4, 10).unwrap();
    writer.write_bytes(&[1, 2]).unwrap();

    assert!(!writer.try_begin_write(100));
    assert_eq!(writer.position(), 2);
    assert_eq!(writer.length(), 2);
    assert!(matches!(
        writer.write_bytes(&[0; 100]),
        Err(Error::CapacityExceeded { .. })
    ));
    assert_eq!(writer.as_slice(), &[1, 2]);
}

#[test]
fn capacity_invariant_holds() {
    let mut writer = BufferWriter::new(1, 300).unwrap();
    for round in 0..100u64 {
        let _ = write_u64_packed(&mut writer, round * 1_000_003);
        let _ = writer.write_value(&round);
        assert!(writer.position() <= writer.capacity());
        assert!(writer.capacity() <= writer.max_capacity());
    }
    assert!(writer.try_begin_write(writer.max_capacity() - writer.position()));
    assert_eq!(writer.capacity(), writer.max_capacity());
}

#[test]
fn reserved_window_is_writable() {
    let mut writer = BufferWriter::new(1, 64).unwrap();
    let mut batch = writer.reserve(40).unwrap();
    for i in 0..5u64 {
        batch.write_value(&i);
    }
    assert_eq!(batch.remaining(), 0);
    drop(batch);
    assert_eq!(writer.position(), 40);
    assert!(writer.capacity() >= 40);
}

#[test]
fn backward_seek_keeps_length() {
    let mut writer = BufferWriter::new(8, 64).unwrap();
    writer.write_bytes(&[0; 10]).unwrap();
    writer.seek(2);
    writer.write_value(&0xABCDu16).unwrap();
    assert_eq!(writer.length(), 10);

    writer.seek(0);
    assert_eq!(writer.length(), 10);
    writer.truncate();
    assert_eq!(writer.length(), 0);
}

#[test]
fn bit_contexts_restore_alignment() {
    for total_bits in 0..=40usize {
        let mut writer = BufferWriter::new(1, 16).unwrap();
        writer.write_byte(0xEE).unwrap();
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            let mut left = total_bits;
            while left > 0 {
                let chunk = left.min(7);
                bits.write_bits(u64::MAX, chunk).unwrap();
                left -= chunk;
            }
        }
        assert_eq!(writer.position(), 1 + total_bits.div_ceil(8), "bits {total_bits}");
        writer.write_byte(0x55).unwrap();

        let mut reader = BufferReader::from_writer(&writer);
        assert_eq!(reader.read_byte().unwrap(), 0xEE);
        {
            let mut bits = reader.enter_bitwise_context().unwrap();
            for _ in 0..total_bits {
                assert!(bits.read_bit().unwrap());
            }
        }
        assert_eq!(reader.read_byte().unwrap(), 0x55);
    }
}

#[test]
fn varint_length_is_monotonic() {
    let mut previous = 0;
    let mut value = 0u64;
    loop {
        let size = packed_size_u64(value);
        assert!(size >= previous, "size shrank at {value}");
        previous = size;
        let (next, overflow) = value.overflowing_add(value / 3 + 1);
        if overflow {
            break;
        }
        value = next;
    }
    assert_eq!(packed_size_u64(u64::MAX), 9);
}

#[test]
fn sixteen_bit_varint_costs_more_than_fixed() {
    let mut writer = BufferWriter::new(8, 8).unwrap();
    write_u64_packed(&mut writer, u64::from(u16::MAX)).unwrap();
    assert_eq!(writer.length(), 3);
    assert!(writer.length() > std::mem::size_of::<u16>());
}

#[test]
fn bit_packed_boundaries() {
    let mut writer = BufferWriter::new(8, 256).unwrap();
    BIT_PACKED_U16_MAX.write_bit_packed(&mut writer).unwrap();
    BIT_PACKED_U32_MAX.write_bit_packed(&mut writer).unwrap();
    BIT_PACKED_U64_MAX.write_bit_packed(&mut writer).unwrap();
    BIT_PACKED_I32_MIN.write_bit_packed(&mut writer).unwrap();
    BIT_PACKED_I32_MAX.write_bit_packed(&mut writer).unwrap();
    0u64.write_bit_packed(&mut writer).unwrap();

    let mut reader = BufferReader::from_writer(&writer);
    assert_eq!(u16::read_bit_packed(&mut reader).unwrap(), BIT_PACKED_U16_MAX);
    assert_eq!(u32::read_bit_packed(&mut reader).unwrap(), BIT_PACKED_U32_MAX);
    assert_eq!(u64::read_bit_packed(&mut reader).unwrap(), BIT_PACKED_U64_MAX);
    assert_eq!(i32::read_bit_packed(&mut reader).unwrap(), BIT_PACKED_I32_MIN);
    assert_eq!(i32::read_bit_packed(&mut reader).unwrap(), BIT_PACKED_I32_MAX);
    assert_eq!(u64::read_bit_packed(&mut reader).unwrap(), 0);
    assert!(!reader.has_more_data());

    assert!(matches!(
        (BIT_PACKED_U64_MAX + 1).write_bit_packed(&mut writer),
        Err(Error::BitBudgetExceeded { bits: 61, .. })
    ));
}

#[test]
fn zigzag_is_injective_on_samples() {
    let mut seen = std::collections::HashSet::new();
    for shift in 0..63 {
        for value in [1i64 << shift, -(1i64 << shift), (1i64 << shift) - 1] {
            assert_eq!(i64::unzigzag(value.zigzag()), value);
            seen.insert((value, value.zigzag()));
        }
    }
    let images: std::collections::HashSet<u64> = seen.iter().map(|&(_, z)| z).collect();
    let preimages: std::collections::HashSet<i64> = seen.iter().map(|&(v, _)| v).collect();
    assert_eq!(images.len(), preimages.len());
}

#[test]
fn borrowed_reader_over_writer_bytes() {
    let mut writer = BufferWriter::new(32, 32).unwrap();
    writer.write_slice(&[1.0f32, 2.0, 3.0]).unwrap();
    writer.write_string("end", true).unwrap();

    let mut reader = BufferReader::borrowed(writer.as_slice());
    assert_eq!(reader.read_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(reader.read_string(true).unwrap(), "end");
}
