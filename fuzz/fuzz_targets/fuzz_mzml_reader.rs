#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use smiter::mzml::MzMLReader;

fuzz_target!(|data: &[u8]| {
    // Malformed documents must produce errors, never panics
    let mut reader = MzMLReader::new(Cursor::new(data));
    for _ in 0..100 {
        match reader.next_spectrum() {
            Ok(Some(_scan)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    let _ = reader.next_chromatogram();
});
