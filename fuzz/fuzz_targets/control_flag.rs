//! Fuzz target for control flag decoding
//!
//! Checks that both decoders are total and that the strict decoder never
//! disagrees with the legacy one on input it accepts.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pam_rule::{decode_control, decode_control_strict, ActionToken, Outcome};

#[derive(Arbitrary, Debug)]
struct FuzzControlInput {
    /// Raw control flag token
    control: String,
    /// Wrap the token in brackets before decoding
    bracket: bool,
}

fuzz_target!(|input: FuzzControlInput| {
    if input.control.len() > 1000 {
        return;
    }

    let control = if input.bracket {
        format!("[{}]", input.control)
    } else {
        input.control
    };

    let legacy = decode_control(&control);

    // Every extracted action must still satisfy the action token grammar
    for outcome in Outcome::ALL {
        if let Some(action) = legacy.get(outcome) {
            assert!(
                ActionToken::new(action.as_str()).is_some(),
                "Malformed action {:?} from {:?}",
                action,
                control
            );
        }
    }

    if let Ok(strict) = decode_control_strict(&control) {
        assert_eq!(strict, legacy, "Strict and legacy disagree on {:?}", control);
    }
});
