//! Fuzz target for the description parser entry point
//!
//! Feeds arbitrary byte strings through the full pipeline: grammar engine,
//! resolver, normalizer and converter. Successful parses must also render
//! to text that parses again.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Don't fuzz extremely long inputs - diminishing returns
        if input.len() > 200 {
            return;
        }

        if let Ok((description, _)) = ferro_hgvs_grammar::parse_description(input) {
            let rendered = description.to_string();
            assert!(
                ferro_hgvs_grammar::parse_description(&rendered).is_ok(),
                "rendering of {:?} does not parse: {:?}",
                input,
                rendered
            );
        }
    }
});
