#![no_main]

use dbsetup_core::{effective_order, trailing_order};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    let implicit = trailing_order(name);
    if let Some(order) = implicit {
        // Only a trailing ASCII digit run can produce an order.
        assert!(name.ends_with(|c: char| c.is_ascii_digit()));
        assert_eq!(effective_order(-1, implicit), Some(order));
    }
});
