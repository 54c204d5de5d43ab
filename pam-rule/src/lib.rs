//! Decoder for PAM stack configuration rules.
//!
//! Each non-blank, non-comment line of a stack configuration names a module
//! type, a control flag, a module and its arguments:
//!
//! ```text
//! auth  [success=1 default=ignore]  pam_unix.so  nullok
//! ```
//!
//! This crate validates the module type and collapses the control flag, in
//! either its keyword form (`required`, `sufficient`, ...) or its bracketed
//! form, into a [`ControlTable`] with one optional action per outcome. Module
//! names and arguments are carried through untouched.
//!
//! ## Example
//!
//! ```rust
//! use pam_rule::{ModuleType, Outcome, Rule};
//!
//! let rule = Rule::new(1, "-auth", "requisite", "pam_faillock.so", vec![])?;
//! assert_eq!(rule.module_type(), ModuleType::Auth);
//! assert_eq!(rule.action(Outcome::Default).unwrap().as_str(), "die");
//! # Ok::<(), pam_rule::RuleError>(())
//! ```
//!
//! ## Control modes
//!
//! [`ControlMode::Legacy`] (the default) decodes bracketed flags by scanning
//! for `success=`, `ignore=` and `default=`, and silently leaves every action
//! unset for syntax it does not recognize. [`ControlMode::Strict`] tokenizes
//! the bracket contents and turns anything unexpected into a [`RuleError`].
//!
//! ## Environment Variables
//! - `PAM_RULE_CONFIG` (optional): Path to a YAML decoder config
//! - `PAM_RULE_CONTROL_MODE` (optional): `legacy` or `strict`

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod line;
pub mod rule;

pub use config::{ConfigError, DecoderConfig};
pub use error::RuleError;
pub use line::{split_line, RuleLine};
pub use rule::{
    decode_control, decode_control_strict, parse_module_type, ActionKind, ActionToken,
    ControlKeyword, ControlMode, ControlTable, ModuleType, ModuleTypeToken, Outcome, Rule,
    RuleDecoder,
};
