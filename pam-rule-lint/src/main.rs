//! pam-rule-lint: decode and check PAM stack configuration files
//!
//! Reads a single stack file (directives such as `@include` are skipped, not
//! followed) and reports how each rule's control flag decodes.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pam_rule::{ControlMode, DecoderConfig, Outcome, Rule, RuleDecoder};
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "pam-rule-lint")]
#[command(about = "Decode and check PAM stack configuration rules")]
#[command(version)]
struct Cli {
    /// Decoder config file (defaults to PAM_RULE_CONFIG, then /etc/pam-rule/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reject control flags the legacy decoder would silently accept
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every rule in a stack file and report bad lines
    Check {
        /// Stack file, e.g. /etc/pam.d/sshd
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Decode a single module type and control flag
    Decode {
        /// Module type, e.g. auth or -session
        #[arg(allow_hyphen_values = true)]
        module_type: String,

        /// Control flag, e.g. requisite or "[success=1 default=ignore]"
        control: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Result of checking one stack file
#[derive(Debug, Serialize)]
struct Report {
    file: String,
    control_mode: ControlMode,
    rules: Vec<Rule>,
    errors: Vec<LineMessage>,
    warnings: Vec<LineMessage>,
}

#[derive(Debug, Serialize)]
struct LineMessage {
    line: usize,
    message: String,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pam_rule=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let decoder = RuleDecoder::new(load_config(cli.config.as_deref(), cli.strict)?);

    match cli.command {
        Commands::Check { file, format } => run_check(&decoder, &file, format),
        Commands::Decode {
            module_type,
            control,
        } => run_decode(&decoder, &module_type, &control),
    }
}

/// Resolve decoder config: explicit file, then environment, then `--strict` on top.
fn load_config(path: Option<&Path>, strict: bool) -> anyhow::Result<DecoderConfig> {
    let mut config = match path {
        Some(path) => DecoderConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DecoderConfig::from_env().context("Failed to load config from environment")?,
    };

    if strict {
        config.control_mode = ControlMode::Strict;
    }

    debug!(control_mode = ?config.control_mode, "Decoder configured");
    Ok(config)
}

fn run_check(decoder: &RuleDecoder, file: &Path, format: Format) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let report = check_content(decoder, &file.display().to_string(), &content);
    info!(
        file = %report.file,
        rules = report.rules.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Checked stack file"
    );

    match format {
        Format::Text => print!("{}", render_text(&report)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{}: {} invalid rule(s)",
            report.file,
            report.errors.len()
        ))
    }
}

/// Decode every line, collecting errors instead of stopping at the first one.
fn check_content(decoder: &RuleDecoder, file: &str, content: &str) -> Report {
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (index, text) in content.lines().enumerate() {
        let line = index + 1;
        match decoder.decode_line(line, text) {
            Ok(Some(rule)) => {
                warnings.extend(unknown_actions(&rule));
                rules.push(rule);
            }
            Ok(None) => {}
            Err(e) => {
                error!(file = %file, line, "{}", e);
                errors.push(LineMessage {
                    line,
                    message: e.to_string(),
                });
            }
        }
    }

    Report {
        file: file.to_string(),
        control_mode: decoder.config().control_mode,
        rules,
        errors,
        warnings,
    }
}

/// Actions that are well formed but that libpam would not act on.
fn unknown_actions(rule: &Rule) -> Vec<LineMessage> {
    Outcome::ALL
        .iter()
        .filter_map(|outcome| {
            let action = rule.action(*outcome)?;
            if action.kind().is_some() {
                return None;
            }
            warn!(
                line = rule.line_number(),
                outcome = outcome.as_str(),
                action = %action,
                "Unknown action"
            );
            Some(LineMessage {
                line: rule.line_number(),
                message: format!("unknown action \"{}\" for {}", action, outcome.as_str()),
            })
        })
        .collect()
}

fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for rule in &report.rules {
        out.push_str(&format!(
            "{:>4}  {:<8}  {}  {}",
            rule.line_number(),
            rule.module_type(),
            rule.control(),
            rule.module_name()
        ));
        for arg in rule.arguments() {
            out.push(' ');
            out.push_str(arg);
        }
        out.push('\n');
    }
    for warning in &report.warnings {
        out.push_str(&format!("{:>4}  warning: {}\n", warning.line, warning.message));
    }
    for err in &report.errors {
        out.push_str(&format!("{:>4}  error: {}\n", err.line, err.message));
    }
    out
}

fn run_decode(decoder: &RuleDecoder, module_type: &str, control: &str) -> anyhow::Result<()> {
    let rule = decoder.construct(1, module_type, control, String::new(), Vec::new())?;

    println!("type:    {}", rule.module_type());
    for outcome in Outcome::ALL {
        match rule.action(outcome) {
            Some(action) => println!("{:<8} {}", format!("{}:", outcome.as_str()), action),
            None => println!("{:<8} -", format!("{}:", outcome.as_str())),
        }
    }
    Ok(())
}
