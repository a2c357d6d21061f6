//! Field remapping rules for legacy imports
//!
//! Rule sets translate identifiers between the legacy application's naming
//! scheme and Medley's: filesystem path prefixes, downloader indices, and
//! tracker site names. All remap functions are pure and total: an empty
//! rule set is a no-op and unmatched values pass through unchanged.

use crate::SyncError;

/// A single `source:destination` substitution rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapRule {
    pub source: String,
    pub dest: String,
}

/// Parse newline-delimited `source:destination` rule text
///
/// Blank lines are skipped. A non-blank line without a `:` delimiter is a
/// configuration error. Lines with more than one `:` split on the first.
pub fn parse_rules(text: &str) -> Result<Vec<RemapRule>, SyncError> {
    let mut rules = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((source, dest)) => rules.push(RemapRule {
                source: source.to_string(),
                dest: dest.to_string(),
            }),
            None => {
                return Err(SyncError::RuleParse {
                    line: line.to_string(),
                })
            }
        }
    }
    Ok(rules)
}

/// Rewrite a filesystem path through the rule set
///
/// The first rule whose source appears in the value wins; only the first
/// occurrence is replaced, then directory separators are normalized to `/`.
/// No match leaves the value untouched.
pub fn remap_path(value: &str, rules: &[RemapRule]) -> String {
    for rule in rules {
        if rule.source.is_empty() {
            continue;
        }
        if value.contains(&rule.source) {
            return value.replacen(&rule.source, &rule.dest, 1).replace('\\', "/");
        }
    }
    value.to_string()
}

/// Rewrite a downloader index through the rule set
///
/// Comparison is numeric on both sides; the matched rule's destination is
/// returned as its literal text, not re-coerced to a number. Values or rule
/// sources that do not parse as integers never match.
pub fn remap_downloader(value: &str, rules: &[RemapRule]) -> String {
    let Ok(index) = value.trim().parse::<i64>() else {
        return value.to_string();
    };
    for rule in rules {
        if rule.source.trim().parse::<i64>() == Ok(index) {
            return rule.dest.clone();
        }
    }
    value.to_string()
}

/// Rewrite a site name through the rule set (exact match)
pub fn remap_site(value: &str, rules: &[RemapRule]) -> String {
    for rule in rules {
        if rule.source == value {
            return rule.dest.clone();
        }
    }
    value.to_string()
}
