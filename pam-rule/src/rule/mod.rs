//! Parsed stack rules.
//!
//! A [`Rule`] is built once by a [`RuleDecoder`] and never mutated afterwards.

pub mod control;
pub mod module_type;

use serde::Serialize;

use crate::config::DecoderConfig;
use crate::error::RuleError;
use crate::line::split_line;

pub use control::{
    decode_control, decode_control_strict, ActionKind, ActionToken, ControlKeyword, ControlMode,
    ControlTable, Outcome,
};
pub use module_type::{parse_module_type, ModuleType, ModuleTypeToken};

/// One rule line of a stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    line_number: usize,
    module_type: ModuleType,
    control: ControlTable,
    module_name: String,
    arguments: Vec<String>,
}

impl Rule {
    /// Build a rule using the historical control flag decoder.
    pub fn new(
        line_number: usize,
        module_type: &str,
        control: &str,
        module_name: impl Into<String>,
        arguments: Vec<String>,
    ) -> Result<Self, RuleError> {
        RuleDecoder::default().construct(line_number, module_type, control, module_name, arguments)
    }

    /// 1-based line the rule came from. Diagnostic only.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Bare module type; the `-` marker is not retained.
    pub fn module_type(&self) -> ModuleType {
        self.module_type
    }

    pub fn control(&self) -> &ControlTable {
        &self.control
    }

    /// Action for one outcome, if the control flag set one.
    pub fn action(&self, outcome: Outcome) -> Option<&ActionToken> {
        self.control.get(outcome)
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

/// Validates rule fields and decodes control flags.
#[derive(Debug, Clone, Default)]
pub struct RuleDecoder {
    config: DecoderConfig,
}

impl RuleDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Validate the module type, decode the control flag and assemble a [`Rule`].
    ///
    /// Fails without decoding the control flag when the module type is invalid.
    /// In [`ControlMode::Legacy`] an unrecognized control flag produces a rule
    /// with no actions set rather than an error.
    pub fn construct(
        &self,
        line_number: usize,
        module_type: &str,
        control: &str,
        module_name: impl Into<String>,
        arguments: Vec<String>,
    ) -> Result<Rule, RuleError> {
        let module_type = parse_module_type(module_type)?.module_type;

        let table = match self.config.control_mode {
            ControlMode::Legacy => {
                let table = decode_control(control);
                if table.is_empty() && ControlKeyword::from_token(control).is_none() {
                    tracing::warn!(
                        line = line_number,
                        control = %control,
                        "Control flag set no actions; outcomes fall through to engine defaults"
                    );
                }
                table
            }
            ControlMode::Strict => decode_control_strict(control)?,
        };

        tracing::debug!(
            line = line_number,
            module_type = %module_type,
            control = %table,
            "Decoded rule"
        );

        Ok(Rule {
            line_number,
            module_type,
            control: table,
            module_name: module_name.into(),
            arguments,
        })
    }

    /// Decode one configuration line.
    ///
    /// Returns `Ok(None)` for blank lines, comments and `@` directives.
    pub fn decode_line(&self, line_number: usize, text: &str) -> Result<Option<Rule>, RuleError> {
        let Some(fields) = split_line(text)? else {
            return Ok(None);
        };

        self.construct(
            line_number,
            fields.module_type,
            fields.control,
            fields.module_name,
            fields.arguments.into_iter().map(String::from).collect(),
        )
        .map(Some)
    }

    /// Decode every rule in a single configuration file's contents.
    ///
    /// Stops at the first bad line; the error carries its 1-based line number.
    pub fn decode_str(&self, content: &str) -> Result<Vec<Rule>, RuleError> {
        let mut rules = Vec::new();
        for (index, text) in content.lines().enumerate() {
            let line_number = index + 1;
            if let Some(rule) = self
                .decode_line(line_number, text)
                .map_err(|e| e.at_line(line_number))?
            {
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn strict() -> RuleDecoder {
        RuleDecoder::new(DecoderConfig {
            control_mode: ControlMode::Strict,
        })
    }

    fn actions(rule: &Rule) -> [Option<&str>; 3] {
        [
            rule.action(Outcome::Success).map(ActionToken::as_str),
            rule.action(Outcome::Ignore).map(ActionToken::as_str),
            rule.action(Outcome::Default).map(ActionToken::as_str),
        ]
    }

    #[test]
    fn test_module_types_with_and_without_marker() {
        for (token, expected) in [
            ("auth", ModuleType::Auth),
            ("-auth", ModuleType::Auth),
            ("account", ModuleType::Account),
            ("-account", ModuleType::Account),
            ("password", ModuleType::Password),
            ("-password", ModuleType::Password),
            ("session", ModuleType::Session),
            ("-session", ModuleType::Session),
        ] {
            let rule = Rule::new(1, token, "required", "pam_unix.so", vec![]).unwrap();
            assert_eq!(rule.module_type(), expected);
        }
    }

    #[test]
    fn test_invalid_module_type_fails() {
        for token in ["sesion", "Auth", "auth "] {
            let err = Rule::new(3, token, "required", "pam_unix.so", vec![]).unwrap_err();
            assert_eq!(
                err,
                RuleError::InvalidModuleType {
                    token: token.to_string()
                }
            );
        }
    }

    #[test]
    fn test_invalid_module_type_checked_before_control() {
        // strict mode would reject the control flag too; the module type error wins
        let err = strict()
            .construct(1, "bogus", "garbage", "pam_unix.so", vec![])
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidModuleType { .. }));
    }

    #[test]
    fn test_keyword_controls() {
        let cases = [
            ("required", [Some("ok"), Some("ignore"), Some("bad")]),
            ("requisite", [Some("ok"), Some("ignore"), Some("die")]),
            ("sufficient", [Some("done"), None, Some("ignore")]),
            ("optional", [Some("ok"), None, Some("ignore")]),
            ("include", [None, None, None]),
        ];
        for (control, expected) in cases {
            let rule = Rule::new(1, "auth", control, "pam_unix.so", vec![]).unwrap();
            assert_eq!(actions(&rule), expected, "{control}");
        }
    }

    #[test]
    fn test_bracket_controls() {
        let rule = Rule::new(1, "auth", "[success=ok default=die]", "pam_unix.so", vec![]).unwrap();
        assert_eq!(actions(&rule), [Some("ok"), None, Some("die")]);

        let rule = Rule::new(
            1,
            "auth",
            "[success=ok2 ignore=ignore1 default=bad3]",
            "pam_unix.so",
            vec![],
        )
        .unwrap();
        assert_eq!(actions(&rule), [Some("ok2"), Some("ignore1"), Some("bad3")]);
    }

    #[test]
    fn test_garbage_control_is_empty_not_error() {
        let rule = Rule::new(1, "auth", "garbage", "pam_unix.so", vec![]).unwrap();
        assert_eq!(actions(&rule), [None, None, None]);
        assert!(rule.control().is_empty());
    }

    #[test]
    fn test_strict_garbage_control_fails() {
        let err = strict()
            .construct(1, "auth", "garbage", "pam_unix.so", vec![])
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::UnrecognizedControl {
                token: "garbage".to_string()
            }
        );
    }

    #[test]
    fn test_identical_inputs_give_identical_rules() {
        let build = || {
            Rule::new(
                7,
                "-session",
                "[success=1 default=ignore]",
                "pam_systemd.so",
                args(&["debug"]),
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_module_and_arguments_pass_through() {
        let arguments = args(&["nullok", "try_first_pass", "[a b]", "x=\\]"]);
        for control in ["required", "[success=ok]", "garbage"] {
            let rule = Rule::new(
                12,
                "password",
                control,
                "/lib/security/pam_unix.so",
                arguments.clone(),
            )
            .unwrap();
            assert_eq!(rule.module_name(), "/lib/security/pam_unix.so");
            assert_eq!(rule.arguments(), arguments.as_slice());
            assert_eq!(rule.line_number(), 12);
        }
    }

    #[test]
    fn test_decode_line() {
        let decoder = RuleDecoder::default();
        let rule = decoder
            .decode_line(4, "auth [success=1 default=ignore] pam_unix.so nullok")
            .unwrap()
            .unwrap();
        assert_eq!(rule.line_number(), 4);
        assert_eq!(actions(&rule), [Some("1"), None, Some("ignore")]);
        assert_eq!(rule.module_name(), "pam_unix.so");
        assert_eq!(rule.arguments(), ["nullok".to_string()]);

        assert!(decoder.decode_line(5, "# comment").unwrap().is_none());
        assert!(decoder.decode_line(6, "@include common-auth").unwrap().is_none());
    }

    #[test]
    fn test_decode_str() {
        let content = "\
#%PAM-1.0
auth       required     pam_env.so
auth       sufficient   pam_unix.so try_first_pass nullok

-session   optional     pam_systemd.so
@include common-account
";
        let rules = RuleDecoder::default().decode_str(content).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].line_number(), 2);
        assert_eq!(rules[1].arguments(), ["try_first_pass", "nullok"]);
        assert_eq!(rules[2].line_number(), 5);
        assert_eq!(rules[2].module_type(), ModuleType::Session);
    }

    #[test]
    fn test_decode_str_reports_line() {
        let content = "auth required pam_env.so\nauht required pam_unix.so\n";
        let err = RuleDecoder::default().decode_str(content).unwrap_err();
        assert_eq!(err.to_string(), "line 2: Invalid module type \"auht\"");
        match err {
            RuleError::Line { line, source } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, RuleError::InvalidModuleType { .. }));
            }
            other => panic!("expected line error, got {other:?}"),
        }
    }

    #[test]
    fn test_serialize_rule() {
        let rule = Rule::new(1, "-auth", "sufficient", "pam_sss.so", args(&["forward_pass"])).unwrap();
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "line_number": 1,
                "module_type": "auth",
                "control": {"success": "done", "ignore": null, "default": "ignore"},
                "module_name": "pam_sss.so",
                "arguments": ["forward_pass"],
            })
        );
    }
}
