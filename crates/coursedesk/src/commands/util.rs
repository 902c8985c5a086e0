//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use coursedesk_core::{FilterRule, Relation, SortOrder, SortRule};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Spinner on stderr while a request is in flight. `None` when quiet or
/// not attached to a terminal.
pub fn spinner(global: &GlobalOpts, message: String) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

/// `COLUMN=VALUE` (contains) or `COLUMN:RELATION:VALUE`.
pub fn parse_filter(raw: &str) -> Result<FilterRule, CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "filter".into(),
        reason: format!("{reason} in '{raw}'"),
    };

    let mut parts = raw.splitn(3, ':');
    if let (Some(column), Some(relation), Some(value)) = (parts.next(), parts.next(), parts.next()) {
        if let Ok(relation) = relation.parse::<Relation>() {
            if column.is_empty() {
                return Err(invalid("missing column"));
            }
            return Ok(FilterRule::new(column, relation, value));
        }
    }

    match raw.split_once('=') {
        Some(("", _)) => Err(invalid("missing column")),
        Some((column, value)) => Ok(FilterRule::contains(column, value)),
        None => Err(invalid("expected COLUMN=VALUE or COLUMN:RELATION:VALUE")),
    }
}

/// `COLUMN`, `-COLUMN`, or `COLUMN:ORDER`.
pub fn parse_sort(raw: &str) -> Result<SortRule, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "sort".into(),
        reason,
    };

    if let Some(column) = raw.strip_prefix('-') {
        return non_empty(column, raw).map(SortRule::desc).map_err(invalid);
    }
    match raw.split_once(':') {
        Some((column, order)) => {
            let column = non_empty(column, raw).map_err(invalid)?;
            let order: SortOrder = order
                .parse()
                .map_err(|_| invalid(format!("unknown order '{order}' in '{raw}'")))?;
            Ok(SortRule {
                column: column.into(),
                order,
            })
        }
        None => non_empty(raw, raw).map(SortRule::asc).map_err(invalid),
    }
}

fn non_empty<'a>(column: &'a str, raw: &str) -> Result<&'a str, String> {
    if column.is_empty() {
        Err(format!("missing column in '{raw}'"))
    } else {
        Ok(column)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn filters() {
        assert_eq!(
            parse_filter("name=an").unwrap(),
            FilterRule::contains("name", "an")
        );
        assert_eq!(
            parse_filter("email:startsWith:a@").unwrap(),
            FilterRule::new("email", Relation::StartsWith, "a@")
        );
        // Not a relation, so the whole thing is COLUMN=VALUE.
        assert_eq!(
            parse_filter("title=10:30:00").unwrap(),
            FilterRule::contains("title", "10:30:00")
        );
        assert!(parse_filter("=x").is_err());
        assert!(parse_filter("name").is_err());
    }

    #[test]
    fn sorts() {
        assert_eq!(parse_sort("name").unwrap(), SortRule::asc("name"));
        assert_eq!(parse_sort("-created_at").unwrap(), SortRule::desc("created_at"));
        assert_eq!(parse_sort("id:desc").unwrap(), SortRule::desc("id"));
        assert!(parse_sort("id:sideways").is_err());
        assert!(parse_sort("-").is_err());
    }
}
