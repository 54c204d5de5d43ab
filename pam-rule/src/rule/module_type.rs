//! Module type (management group) validation.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::RuleError;

/// Anchored to the whole token. The leading `-` tells libpam not to log when
/// the module cannot be loaded because it is missing from the system.
static MODULE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(auth|account|password|session)$").expect("module type pattern is valid")
});

/// Stack phase a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Authenticate the user and establish credentials
    Auth,
    /// Non-authentication account management (expiry, access hours)
    Account,
    /// Updating the authentication token
    Password,
    /// Work done before and after a session is provided
    Session,
}

impl ModuleType {
    /// Keyword as it appears in a stack configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Auth => "auth",
            ModuleType::Account => "account",
            ModuleType::Password => "password",
            ModuleType::Session => "session",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A validated module type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleTypeToken {
    /// Bare category, without the marker
    pub module_type: ModuleType,
    /// Whether the token carried the leading `-` marker
    pub quiet_if_missing: bool,
}

/// Validate a raw module type token such as `auth` or `-session`.
pub fn parse_module_type(token: &str) -> Result<ModuleTypeToken, RuleError> {
    let captures = MODULE_TYPE_RE
        .captures(token)
        .ok_or_else(|| RuleError::InvalidModuleType {
            token: token.to_string(),
        })?;

    let module_type = match &captures[1] {
        "auth" => ModuleType::Auth,
        "account" => ModuleType::Account,
        "password" => ModuleType::Password,
        _ => ModuleType::Session,
    };

    Ok(ModuleTypeToken {
        module_type,
        quiet_if_missing: token.starts_with('-'),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_categories() {
        for (token, expected) in [
            ("auth", ModuleType::Auth),
            ("account", ModuleType::Account),
            ("password", ModuleType::Password),
            ("session", ModuleType::Session),
        ] {
            let parsed = parse_module_type(token).unwrap();
            assert_eq!(parsed.module_type, expected);
            assert!(!parsed.quiet_if_missing);
            assert_eq!(parsed.module_type.to_string(), token);
        }
    }

    #[test]
    fn test_dash_prefix_is_dropped() {
        let parsed = parse_module_type("-session").unwrap();
        assert_eq!(parsed.module_type, ModuleType::Session);
        assert!(parsed.quiet_if_missing);

        let parsed = parse_module_type("-auth").unwrap();
        assert_eq!(parsed.module_type, ModuleType::Auth);
    }

    #[test]
    fn test_rejects_near_misses() {
        for token in [
            "sesion", "Auth", "auth ", " auth", "--auth", "auth-", "authx", "xauth", "", "-",
            "auth\n",
        ] {
            let err = parse_module_type(token).unwrap_err();
            assert_eq!(
                err,
                RuleError::InvalidModuleType {
                    token: token.to_string()
                }
            );
        }
    }

    #[test]
    fn test_error_names_token() {
        let err = parse_module_type("sesion").unwrap_err();
        assert_eq!(err.to_string(), "Invalid module type \"sesion\"");
    }
}
