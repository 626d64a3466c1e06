//! Stock predicate constructors for the common field checks. Each returns a
//! closure suitable for [`ValidationEngine::add_value_rule`]; only
//! [`matches_pattern`] can fail to build (bad regex).
//!
//! [`ValidationEngine::add_value_rule`]: crate::validation::engine::ValidationEngine::add_value_rule

use crate::error::RuleBuildError;
use model::core::value::Value;
use regex::Regex;

pub fn required() -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    |value| !value.is_null()
}

/// Null or a non-string value fails; whitespace-only strings fail too.
pub fn not_empty() -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    |value| match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Null => false,
        other => other.as_string().is_some(),
    }
}

pub fn min_length(len: usize) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    move |value| {
        value
            .as_string()
            .is_some_and(|s| s.chars().count() >= len)
    }
}

pub fn max_length(len: usize) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    move |value| {
        value
            .as_string()
            .is_some_and(|s| s.chars().count() <= len)
    }
}

pub fn min(bound: f64) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    move |value| value.as_f64().is_some_and(|v| v >= bound)
}

pub fn max(bound: f64) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    move |value| value.as_f64().is_some_and(|v| v <= bound)
}

pub fn one_of(allowed: Vec<Value>) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    move |value| allowed.iter().any(|a| a.equal(value))
}

pub fn matches_pattern(
    field: &str,
    pattern: &str,
) -> Result<impl Fn(&Value) -> bool + Send + Sync + 'static, RuleBuildError> {
    let regex = Regex::new(pattern).map_err(|source| RuleBuildError::InvalidPattern {
        field: field.to_string(),
        source,
    })?;
    Ok(move |value: &Value| {
        value
            .as_string()
            .is_some_and(|s| regex.is_match(&s))
    })
}

/// Deliberately loose: one `@`, non-empty local part, dot in the domain.
pub fn email() -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    |value| {
        value.as_string().is_some_and(|s| {
            let s = s.trim();
            let mut parts = s.splitn(2, '@');
            match (parts.next(), parts.next()) {
                (Some(local), Some(domain)) => {
                    !local.is_empty()
                        && !domain.is_empty()
                        && !domain.contains('@')
                        && domain.contains('.')
                        && !domain.starts_with('.')
                        && !domain.ends_with('.')
                }
                _ => false,
            }
        })
    }
}
