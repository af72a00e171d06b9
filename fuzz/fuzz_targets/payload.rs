#![no_main]
use libfuzzer_sys::fuzz_target;
use memhog::{fill_byte, Payload};

fuzz_target!(|input: (u32, u16)| {
    let (round, len) = input;
    let round = round as usize;
    let payload = Payload::new(round, len as usize);
    assert_eq!(payload.len(), len as usize);
    let fill = fill_byte(round);
    assert!(payload.as_bytes().iter().all(|&b| b == fill));
});
