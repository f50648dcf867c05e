//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use arronax_core::{AttributeDefinition, EntityKind, Operation, Sort, SortDirection};

use crate::cli::EntityArg;
use crate::error::CliError;

/// One `--filter` / `--not-filter` argument after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub attribute: String,
    pub operator: Operation,
    pub values: Vec<String>,
    pub inverse: bool,
}

pub fn entity_kind(arg: EntityArg) -> EntityKind {
    match arg {
        EntityArg::Blocks => EntityKind::Blocks,
        EntityArg::Accounts => EntityKind::Accounts,
        EntityArg::Operations => EntityKind::Operations,
    }
}

/// Parse `attr:operation[:value[,value...]]`.
///
/// The value part is split on commas only for operations taking more than
/// one value, so `kind:eq:a,b` keeps the comma.
pub fn parse_filter(raw: &str, inverse: bool) -> Result<FilterSpec, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: if inverse { "--not-filter" } else { "--filter" }.into(),
        reason,
    };

    let mut parts = raw.splitn(3, ':');
    let attribute = parts.next().unwrap_or_default().trim();
    let op = parts.next().map(str::trim).unwrap_or_default();
    let rest = parts.next();

    if attribute.is_empty() || op.is_empty() {
        return Err(invalid(format!(
            "expected attr:operation[:value], got '{raw}'"
        )));
    }
    let operator: Operation = op
        .parse()
        .map_err(|_| invalid(format!("unknown operation '{op}'")))?;

    let values: Vec<String> = match (operator.arity(), rest) {
        (Some(0), None) => Vec::new(),
        (Some(0), Some(_)) => {
            return Err(invalid(format!("{operator} takes no value")));
        }
        (_, None) => return Err(invalid(format!("{operator} needs a value"))),
        (Some(1), Some(v)) => vec![v.to_owned()],
        (_, Some(v)) => v.split(',').map(|s| s.trim().to_owned()).collect(),
    };

    if let Some(n) = operator.arity() {
        if values.len() != n {
            return Err(invalid(format!(
                "{operator} needs {n} value(s), got {}",
                values.len()
            )));
        }
    }

    Ok(FilterSpec {
        attribute: attribute.to_owned(),
        operator,
        values,
        inverse,
    })
}

/// Parse `attr[:asc|desc]`; descending when no direction is given.
pub fn parse_sort(raw: &str) -> Result<Sort, CliError> {
    let (attribute, direction) = match raw.split_once(':') {
        Some((attr, dir)) => {
            let order: SortDirection = dir.parse().map_err(|_| CliError::Validation {
                field: "--sort".into(),
                reason: format!("direction must be 'asc' or 'desc', got '{dir}'"),
            })?;
            (attr, order)
        }
        None => (raw, SortDirection::Desc),
    };
    if attribute.is_empty() {
        return Err(CliError::Validation {
            field: "--sort".into(),
            reason: "missing attribute name".into(),
        });
    }
    Ok(Sort {
        order_by: attribute.to_owned(),
        order: direction,
    })
}

/// Look an attribute up by name, pointing at `attributes <entity>` if absent.
pub fn require_attribute<'a>(
    attributes: &'a [AttributeDefinition],
    entity: EntityKind,
    name: &str,
) -> Result<&'a AttributeDefinition, CliError> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "attribute".into(),
            identifier: name.into(),
            list_command: format!("attributes {entity}"),
        })
}

/// Stderr spinner for slow queries; hidden when quiet or not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_value_filter() {
        let f = parse_filter("kind:eq:Double Baking Evidence", false).unwrap();
        assert_eq!(f.attribute, "kind");
        assert_eq!(f.operator, Operation::Eq);
        assert_eq!(f.values, ["Double Baking Evidence"]);
        assert!(!f.inverse);
    }

    #[test]
    fn single_value_keeps_commas_and_colons() {
        let f = parse_filter("parameters:like:a,b:c", false).unwrap();
        assert_eq!(f.values, ["a,b:c"]);
    }

    #[test]
    fn between_splits_on_comma() {
        let f = parse_filter("level:between:100, 200", true).unwrap();
        assert_eq!(f.values, ["100", "200"]);
        assert!(f.inverse);
        assert!(parse_filter("level:between:100", false).is_err());
    }

    #[test]
    fn in_accepts_any_count() {
        let f = parse_filter("kind:in:transaction,origination,reveal", false).unwrap();
        assert_eq!(f.values.len(), 3);
    }

    #[test]
    fn isnull_takes_no_value() {
        let f = parse_filter("delegate:isnull", true).unwrap();
        assert!(f.values.is_empty());
        assert!(parse_filter("delegate:isnull:x", false).is_err());
    }

    #[test]
    fn rejects_malformed_filters() {
        assert!(parse_filter("kind", false).is_err());
        assert!(parse_filter("kind:resembles:x", false).is_err());
        assert!(parse_filter("kind:eq", false).is_err());
        assert!(parse_filter(":eq:x", false).is_err());
    }

    #[test]
    fn sort_defaults_to_descending() {
        assert_eq!(parse_sort("level").unwrap(), Sort::desc("level"));
        let asc = parse_sort("timestamp:ASC").unwrap();
        assert_eq!(asc.order, SortDirection::Asc);
        assert!(parse_sort("level:sideways").is_err());
        assert!(parse_sort(":asc").is_err());
    }
}
