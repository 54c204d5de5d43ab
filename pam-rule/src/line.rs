//! Splitting a configuration line into rule fields.
//!
//! Fields are separated by whitespace. A field that opens with `[` runs to the
//! matching unescaped `]`, so bracketed control flags and arguments may
//! contain spaces. Everything after `#` is a comment.

use crate::error::RuleError;

/// Raw fields of one rule line, borrowed from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine<'a> {
    pub module_type: &'a str,
    pub control: &'a str,
    pub module_name: &'a str,
    pub arguments: Vec<&'a str>,
}

/// Split a line into rule fields.
///
/// Returns `Ok(None)` for blank lines, comments and `@` directives such as
/// `@include`, which are left to whoever assembles the whole file.
pub fn split_line(text: &str) -> Result<Option<RuleLine<'_>>, RuleError> {
    let text = match text.find('#') {
        Some(index) => &text[..index],
        None => text,
    };

    let mut rest = text;
    let Some(module_type) = next_field(&mut rest)? else {
        return Ok(None);
    };

    if module_type.starts_with('@') {
        tracing::debug!(directive = %module_type, "Skipping directive line");
        return Ok(None);
    }

    let control = next_field(&mut rest)?.ok_or_else(|| RuleError::MalformedLine {
        reason: "missing control flag".to_string(),
    })?;
    let module_name = next_field(&mut rest)?.ok_or_else(|| RuleError::MalformedLine {
        reason: "missing module name".to_string(),
    })?;

    let mut arguments = Vec::new();
    while let Some(argument) = next_field(&mut rest)? {
        arguments.push(argument);
    }

    Ok(Some(RuleLine {
        module_type,
        control,
        module_name,
        arguments,
    }))
}

fn next_field<'a>(rest: &mut &'a str) -> Result<Option<&'a str>, RuleError> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return Ok(None);
    }

    let end = if trimmed.starts_with('[') {
        closing_bracket(trimmed).ok_or_else(|| RuleError::MalformedLine {
            reason: format!("unterminated '[' in \"{}\"", trimmed.trim_end()),
        })? + 1
    } else {
        trimmed
            .find(char::is_whitespace)
            .unwrap_or(trimmed.len())
    };

    let (field, remainder) = trimmed.split_at(end);
    *rest = remainder;
    Ok(Some(field))
}

/// Byte index of the first `]` not preceded by a backslash.
fn closing_bracket(field: &str) -> Option<usize> {
    let bytes = field.as_bytes();
    (1..bytes.len()).find(|&i| bytes[i] == b']' && bytes[i - 1] != b'\\')
}
