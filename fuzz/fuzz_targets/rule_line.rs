//! Fuzz target for rule line splitting and decoding
//!
//! Tests the robustness of line splitting against arbitrary text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pam_rule::{split_line, RuleDecoder};

fuzz_target!(|data: &[u8]| {
    // Try to parse as UTF-8
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(Some(line)) = split_line(text) {
            // Split fields are never empty and never contain a comment
            assert!(!line.module_type.is_empty());
            assert!(!line.control.is_empty());
            assert!(!line.module_name.is_empty());
            assert!(line.arguments.iter().all(|a| !a.is_empty() && !a.contains('#')));
        }

        let _ = RuleDecoder::default().decode_str(text);
    }
});
