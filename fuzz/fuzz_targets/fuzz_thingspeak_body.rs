//! Fuzz target: `thingspeak::parse_last_entry`
//!
//! Feeds arbitrary bytes as a `last.json` body.  Parsing must never panic
//! and any accepted value must be finite.
//!
//! cargo fuzz run fuzz_thingspeak_body

#![no_main]

use airvent::adapters::thingspeak::parse_last_entry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&field, body)) = data.split_first() else {
        return;
    };
    if let Ok(reading) = parse_last_entry(body, field % 9) {
        assert!(reading.value.is_finite());
    }
});
