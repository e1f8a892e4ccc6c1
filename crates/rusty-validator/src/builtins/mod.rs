// File: src/builtins/mod.rs
// Purpose: Built-in predicate library and parameter parsing helpers

mod collection;
mod comparison;
mod conditional;
mod cross_field;
mod format;
mod presence;
mod string;

use std::sync::Arc;

use crate::field_level::{FieldLevel, Predicate};

/// `(name, predicate, run_on_nil)`
pub(crate) type Builtin = (&'static str, Predicate, bool);

/// Aliases registered by every new validator
pub(crate) const ALIASES: &[(&str, &str)] = &[("iscolor", "hexcolor|rgb|rgba|hsl|hsla")];

/// Every built-in predicate
pub(crate) fn all() -> Vec<Builtin> {
    let mut rules = Vec::new();
    rules.extend(presence::rules());
    rules.extend(conditional::rules());
    rules.extend(comparison::rules());
    rules.extend(cross_field::rules());
    rules.extend(string::rules());
    rules.extend(format::rules());
    rules.extend(collection::rules());
    rules
}

pub(crate) fn rule<F>(name: &'static str, f: F) -> Builtin
where
    F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
{
    (name, Arc::new(f), false)
}

pub(crate) fn rule_on_nil<F>(name: &'static str, f: F) -> Builtin
where
    F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
{
    (name, Arc::new(f), true)
}

/// Parses an integer parameter; `0x`, `0o` and `0b` prefixes are accepted
///
/// # Panics
///
/// When the parameter is not an integer.
pub(crate) fn as_int(param: &str) -> i64 {
    parse_int(param).unwrap_or_else(|| panic!("Bad param '{param}': expected an integer"))
}

pub(crate) fn as_uint(param: &str) -> u64 {
    parse_unsigned(param.strip_prefix('+').unwrap_or(param))
        .unwrap_or_else(|| panic!("Bad param '{param}': expected an unsigned integer"))
}

pub(crate) fn as_float(param: &str) -> f64 {
    param
        .trim()
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("Bad param '{param}': expected a number"))
}

/// Length-style parameter: a count of characters or elements
pub(crate) fn as_len(param: &str) -> usize {
    usize::try_from(as_uint(param)).unwrap_or(usize::MAX)
}

fn parse_int(param: &str) -> Option<i64> {
    let param = param.trim();
    let (negative, digits) = match param.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, param.strip_prefix('+').unwrap_or(param)),
    };

    let magnitude = i128::from(parse_unsigned(digits)?);
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn parse_unsigned(digits: &str) -> Option<u64> {
    let digits = digits.trim();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(body) = lower.strip_prefix("0x") {
        (16, body)
    } else if let Some(body) = lower.strip_prefix("0o") {
        (8, body)
    } else if let Some(body) = lower.strip_prefix("0b") {
        (2, body)
    } else {
        (10, lower.as_str())
    };

    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(&body.replace('_', ""), radix).ok()
}

/// Splits a space-separated parameter list, keeping single-quoted items whole
pub(crate) fn split_params(param: &str) -> Vec<String> {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static SPLIT_PARAMS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"'[^']*'|\S+").unwrap());

    SPLIT_PARAMS_REGEX
        .find_iter(param)
        .map(|m| {
            let item = m.as_str();
            item.strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .unwrap_or(item)
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_as_int_prefixes() {
        assert_eq!(as_int("10"), 10);
        assert_eq!(as_int("-3"), -3);
        assert_eq!(as_int("0x1F"), 31);
        assert_eq!(as_int("0o17"), 15);
        assert_eq!(as_int("0b101"), 5);
    }

    #[test]
    #[should_panic(expected = "Bad param 'ten'")]
    fn test_as_int_rejects_words() {
        as_int("ten");
    }

    #[test]
    #[should_panic(expected = "expected an unsigned integer")]
    fn test_as_uint_rejects_negative() {
        as_uint("-1");
    }

    #[test]
    fn test_as_float() {
        assert_eq!(as_float("2.5"), 2.5);
        assert_eq!(as_float("-1"), -1.0);
    }

    #[test]
    fn test_split_params_quotes() {
        assert_eq!(split_params("red 'dark blue' green"), vec!["red", "dark blue", "green"]);
        assert!(split_params("   ").is_empty());
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let rules = all();
        let names: HashSet<&str> = rules.iter().map(|(name, _, _)| *name).collect();
        assert_eq!(names.len(), rules.len());
        assert!(names.contains("required"));
        assert!(!names.contains("iscolor"));
    }
}
