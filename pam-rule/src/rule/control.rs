//! Control flag decoding.
//!
//! A control flag is either one of five keyword shortcuts or an explicit
//! bracketed `[outcome=action ...]` list. Both forms collapse into a
//! [`ControlTable`] holding an optional action per [`Outcome`].
//!
//! Two decoders are provided:
//! - [`decode_control`] reproduces the historical behavior byte for byte,
//!   including leaving every slot unset for syntax it does not recognize.
//! - [`decode_control_strict`] tokenizes the bracket contents and rejects
//!   anything that is not a well-formed `key=value` list. Every input it
//!   accepts decodes to the same table as [`decode_control`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

static ACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]*\d*$").expect("action pattern is valid"));

// First match wins; the capture stops at the first character outside [a-z]*\d*.
static SUCCESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"success=([a-z]*\d*)").expect("success pattern is valid"));
static IGNORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ignore=([a-z]*\d*)").expect("ignore pattern is valid"));
static DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"default=([a-z]*\d*)").expect("default pattern is valid"));

/// Module outcome category an action is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Module returned success
    Success,
    /// Module asked to be ignored
    Ignore,
    /// Any outcome not explicitly listed
    Default,
}

impl Outcome {
    /// All outcomes, in the order they are conventionally written.
    pub const ALL: [Outcome; 3] = [Outcome::Success, Outcome::Ignore, Outcome::Default];

    /// Key used for this outcome inside a bracketed control flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Ignore => "ignore",
            Outcome::Default => "default",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "success" => Some(Outcome::Success),
            "ignore" => Some(Outcome::Ignore),
            "default" => Some(Outcome::Default),
            _ => None,
        }
    }
}

/// An action token: lowercase letters followed by digits, e.g. `ok`, `die` or `2`.
///
/// Only the shape is guaranteed. Whether the token names an action the
/// evaluation engine knows about is answered by [`ActionToken::kind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ActionToken(String);

impl ActionToken {
    /// Wrap `value` if it matches the action token grammar.
    pub fn new(value: &str) -> Option<Self> {
        ACTION_RE
            .is_match(value)
            .then(|| ActionToken(value.to_string()))
    }

    /// The token as written in the control flag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the token as one of the actions libpam understands.
    pub fn kind(&self) -> Option<ActionKind> {
        match self.0.as_str() {
            "ok" => Some(ActionKind::Ok),
            "done" => Some(ActionKind::Done),
            "bad" => Some(ActionKind::Bad),
            "die" => Some(ActionKind::Die),
            "ignore" => Some(ActionKind::Ignore),
            "reset" => Some(ActionKind::Reset),
            jump if !jump.is_empty() && jump.bytes().all(|b| b.is_ascii_digit()) => {
                jump.parse().ok().map(ActionKind::Jump)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Actions an evaluation engine can take for a module outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Record the outcome unless a failure is already recorded
    Ok,
    /// Like `ok`, then return to the application
    Done,
    /// Record failure and keep going
    Bad,
    /// Record failure and return to the application
    Die,
    /// Do not let this outcome influence the result
    Ignore,
    /// Forget the recorded state and start over
    Reset,
    /// Skip the next N modules in the stack
    Jump(u32),
}

/// How a rule reacts to each module outcome. `None` defers to the engine default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlTable {
    /// Action when the module succeeds
    pub success: Option<ActionToken>,
    /// Action when the module asks to be ignored
    pub ignore: Option<ActionToken>,
    /// Action for every other outcome
    pub default: Option<ActionToken>,
}

impl ControlTable {
    pub fn get(&self, outcome: Outcome) -> Option<&ActionToken> {
        match outcome {
            Outcome::Success => self.success.as_ref(),
            Outcome::Ignore => self.ignore.as_ref(),
            Outcome::Default => self.default.as_ref(),
        }
    }

    fn slot_mut(&mut self, outcome: Outcome) -> &mut Option<ActionToken> {
        match outcome {
            Outcome::Success => &mut self.success,
            Outcome::Ignore => &mut self.ignore,
            Outcome::Default => &mut self.default,
        }
    }

    /// True when no outcome has an explicit action.
    pub fn is_empty(&self) -> bool {
        Outcome::ALL.iter().all(|o| self.get(*o).is_none())
    }

    fn from_keywords(
        success: Option<&str>,
        ignore: Option<&str>,
        default: Option<&str>,
    ) -> Self {
        let token = |v: Option<&str>| v.map(|s| ActionToken(s.to_string()));
        Self {
            success: token(success),
            ignore: token(ignore),
            default: token(default),
        }
    }
}

impl fmt::Display for ControlTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, outcome) in Outcome::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match self.get(*outcome) {
                Some(action) => write!(f, "{}={}", outcome.as_str(), action)?,
                None => write!(f, "{}=-", outcome.as_str())?,
            }
        }
        Ok(())
    }
}

/// Keyword shortcuts for common control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKeyword {
    Required,
    Requisite,
    Sufficient,
    Optional,
    Include,
}

impl ControlKeyword {
    /// Exact, case-sensitive match.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "required" => Some(ControlKeyword::Required),
            "requisite" => Some(ControlKeyword::Requisite),
            "sufficient" => Some(ControlKeyword::Sufficient),
            "optional" => Some(ControlKeyword::Optional),
            "include" => Some(ControlKeyword::Include),
            _ => None,
        }
    }

    /// The explicit table this shortcut stands for.
    pub fn table(&self) -> ControlTable {
        match self {
            ControlKeyword::Required => {
                ControlTable::from_keywords(Some("ok"), Some("ignore"), Some("bad"))
            }
            ControlKeyword::Requisite => {
                ControlTable::from_keywords(Some("ok"), Some("ignore"), Some("die"))
            }
            ControlKeyword::Sufficient => {
                ControlTable::from_keywords(Some("done"), None, Some("ignore"))
            }
            ControlKeyword::Optional => ControlTable::from_keywords(Some("ok"), None, Some("ignore")),
            ControlKeyword::Include => ControlTable::default(),
        }
    }
}

/// Which control flag decoder a [`RuleDecoder`](crate::RuleDecoder) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Historical behavior; unrecognized syntax yields an empty table
    #[default]
    Legacy,
    /// Reject anything that is not a keyword or a well-formed bracket list
    Strict,
}

/// Decode a control flag the historical way. Never fails.
pub fn decode_control(token: &str) -> ControlTable {
    if let Some(keyword) = ControlKeyword::from_token(token) {
        return keyword.table();
    }

    if !token.contains('[') {
        return ControlTable::default();
    }

    let first = |re: &Regex| {
        re.captures(token)
            .and_then(|caps| caps.get(1))
            .map(|m| ActionToken(m.as_str().to_string()))
    };

    ControlTable {
        success: first(&SUCCESS_RE),
        ignore: first(&IGNORE_RE),
        default: first(&DEFAULT_RE),
    }
}

/// Decode a control flag, rejecting anything that is not a keyword or a
/// whitespace-separated `[outcome=action ...]` list.
pub fn decode_control_strict(token: &str) -> Result<ControlTable, RuleError> {
    if let Some(keyword) = ControlKeyword::from_token(token) {
        return Ok(keyword.table());
    }

    let inner = token
        .strip_prefix('[')
        .ok_or_else(|| RuleError::UnrecognizedControl {
            token: token.to_string(),
        })?
        .strip_suffix(']')
        .ok_or_else(|| RuleError::malformed_control(token, "missing closing ']'"))?;

    let mut table = ControlTable::default();
    for item in inner.split_whitespace() {
        let (key, value) = item.split_once('=').ok_or_else(|| {
            RuleError::malformed_control(token, format!("expected key=value, got \"{item}\""))
        })?;

        let outcome = Outcome::from_key(key).ok_or_else(|| {
            RuleError::malformed_control(token, format!("unknown outcome \"{key}\""))
        })?;

        if value.is_empty() {
            return Err(RuleError::malformed_control(
                token,
                format!("missing action for \"{key}\""),
            ));
        }
        let action = ActionToken::new(value).ok_or_else(|| {
            RuleError::malformed_control(token, format!("invalid action \"{value}\""))
        })?;

        let slot = table.slot_mut(outcome);
        if slot.is_some() {
            return Err(RuleError::malformed_control(
                token,
                format!("duplicate outcome \"{key}\""),
            ));
        }
        *slot = Some(action);
    }

    if table.is_empty() {
        return Err(RuleError::malformed_control(token, "empty action list"));
    }

    Ok(table)
}
