//! Fuzz target: `NecDecoder::push` / `finish`
//!
//! Interprets the input as little-endian u16 level durations (alternating
//! mark/space, starting with a mark) and asserts that the decoder never
//! panics, only reports NEC frames whose checksum holds, and is empty
//! after every `finish`.
//!
//! cargo fuzz run fuzz_nec_decoder

#![no_main]

use airvent::app::keymap::Protocol;
use airvent::drivers::nec::NecDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = NecDecoder::new();

    for (i, pair) in data.chunks_exact(2).enumerate() {
        let duration = u32::from(u16::from_le_bytes([pair[0], pair[1]]));
        decoder.push(i % 2 == 0, duration);
    }

    if let Some(signal) = decoder.finish() {
        if signal.protocol == Protocol::Nec {
            let cmd = ((signal.code >> 8) & 0xFF) as u8;
            assert_eq!(cmd, !(signal.code as u8), "NEC frame with bad checksum");
            assert!(signal.code <= u64::from(u32::MAX));
        }
    }
    assert!(decoder.is_empty(), "finish must reset the burst");
});
