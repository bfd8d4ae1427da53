//! Validation rules: `in:[a,b,c]` membership and `range:[lo,hi]` bounds.
//!
//! A range uses `[`/`]` for inclusive and `(`/`)` for exclusive ends; an
//! empty end is unbounded, so `range:[1,)` means "at least 1".

use std::ops::Bound;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    In(Vec<String>),
    Range { lower: Bound<String>, upper: Bound<String> },
}

/// A literal in the rule could not be parsed as the field's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadLiteral;

impl ValidationRule {
    /// Parse a rule attached to `key`.
    pub fn parse(key: &str, spec: &str) -> Result<ValidationRule> {
        let Some((action, body)) = spec.split_once(':') else {
            return Err(ConfigError::InvalidValidation {
                key: key.to_string(),
                spec: spec.to_string(),
            });
        };
        match action.trim() {
            "in" => Ok(ValidationRule::In(parse_members(body))),
            "range" => parse_range(key, body),
            _ => Err(ConfigError::UnsupportedValidation {
                key: key.to_string(),
                spec: spec.to_string(),
            }),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, ValidationRule::Range { .. })
    }

    /// Check `value` against the rule.
    ///
    /// Rule literals are converted with `parse`; membership uses `eq`. An
    /// `in` rule stops at the first matching member, so later members are
    /// never parsed.
    pub fn matches<T, P, E>(&self, value: &T, parse: P, eq: E) -> Result<bool, BadLiteral>
    where
        T: PartialOrd,
        P: Fn(&str) -> Option<T>,
        E: Fn(&T, &T) -> bool,
    {
        match self {
            ValidationRule::In(members) => {
                for member in members {
                    let candidate = parse(member).ok_or(BadLiteral)?;
                    if eq(value, &candidate) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ValidationRule::Range { lower, upper } => {
                let lower = parse_bound(lower, &parse)?;
                let upper = parse_bound(upper, &parse)?;
                let above = match &lower {
                    Bound::Included(lo) => value >= lo,
                    Bound::Excluded(lo) => value > lo,
                    Bound::Unbounded => true,
                };
                let below = match &upper {
                    Bound::Included(hi) => value <= hi,
                    Bound::Excluded(hi) => value < hi,
                    Bound::Unbounded => true,
                };
                Ok(above && below)
            }
        }
    }
}

fn parse_bound<T, P>(bound: &Bound<String>, parse: &P) -> Result<Bound<T>, BadLiteral>
where
    P: Fn(&str) -> Option<T>,
{
    Ok(match bound {
        Bound::Included(text) => Bound::Included(parse(text).ok_or(BadLiteral)?),
        Bound::Excluded(text) => Bound::Excluded(parse(text).ok_or(BadLiteral)?),
        Bound::Unbounded => Bound::Unbounded,
    })
}

fn parse_members(body: &str) -> Vec<String> {
    let inner = body.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner.split(',').map(|m| m.trim().to_string()).collect()
}

fn parse_range(key: &str, body: &str) -> Result<ValidationRule> {
    let rules = body.trim();
    let invalid = || ConfigError::InvalidRangeRule {
        key: key.to_string(),
        rules: rules.to_string(),
    };

    let mut chars = rules.chars();
    let open = chars.next().ok_or_else(invalid)?;
    let close = chars.next_back().ok_or_else(invalid)?;
    let inner = chars.as_str();
    let (lo, hi) = inner.split_once(',').ok_or_else(invalid)?;
    if hi.contains(',') {
        return Err(invalid());
    }

    let (lo, hi) = (lo.trim(), hi.trim());
    if lo.is_empty() && hi.is_empty() {
        return Err(invalid());
    }
    let lower = match (open, lo.is_empty()) {
        (_, true) => Bound::Unbounded,
        ('[', false) => Bound::Included(lo.to_string()),
        ('(', false) => Bound::Excluded(lo.to_string()),
        _ => return Err(invalid()),
    };
    let upper = match (close, hi.is_empty()) {
        (_, true) => Bound::Unbounded,
        (']', false) => Bound::Included(hi.to_string()),
        (')', false) => Bound::Excluded(hi.to_string()),
        _ => return Err(invalid()),
    };
    if !matches!(open, '[' | '(') || !matches!(close, ']' | ')') {
        return Err(invalid());
    }
    Ok(ValidationRule::Range { lower, upper })
}
