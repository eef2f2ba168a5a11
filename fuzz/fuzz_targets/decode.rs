#![no_main]

use libfuzzer_sys::fuzz_target;
use netpack::{
    codec::{varint, BitPacked, Packed},
    BufferReader,
};

// Decoders may reject any input; they must never panic or read out of bounds.
fuzz_target!(|data: &[u8]| {
    let mut reader = BufferReader::borrowed(data);
    while reader.has_more_data() {
        let start = reader.position();
        let _ = varint::read_u64_packed(&mut reader);
        let _ = varint::read_i32_packed(&mut reader);
        let _ = u64::read_bit_packed(&mut reader);
        let _ = i16::read_bit_packed(&mut reader);
        let _ = String::read_packed(&mut reader);
        let _ = Vec::<i64>::read_packed(&mut reader);
        let _ = char::read_packed(&mut reader);
        let _ = reader.read_string(false);
        let _ = reader.read_vec::<u32>();
        if let Ok(mut bits) = reader.enter_bitwise_context() {
            let _ = bits.read_bits(13);
        }
        if reader.position() == start {
            reader.seek(start + 1);
        }
    }
});
