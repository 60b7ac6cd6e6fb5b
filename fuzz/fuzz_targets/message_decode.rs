//! Decoding arbitrary bytes must never panic.
//!
//! Anything that decodes and validates must encode again, and decoding that
//! encoding must give back the same message.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ofp_proto::{FrameReader, Message, Wire};

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = Message::from_bytes(data) {
        if message.validate().is_ok() {
            let encoded = message.to_bytes().expect("validated message must encode");
            assert_eq!(Message::peek_length(&encoded), Some(encoded.len()));

            let again = Message::from_bytes(&encoded).expect("own encoding must decode");
            assert_eq!(again, message);
        }
    }

    // the same bytes as a stream, split at an arbitrary point
    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let mut reader = FrameReader::new();
    reader.extend(&data[..split]);
    reader.extend(&data[split..]);
    while let Ok(Some(frame)) = reader.read_frame() {
        assert!(frame.len() >= 8);
    }
});
