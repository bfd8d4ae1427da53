//! Required-field and validation-rule checks against the resolved store.
//!
//! Both checks run in one walk after loading. A field with no resolved value
//! skips rule evaluation; whether that is an error is the required check's
//! concern alone.

use std::time::Duration;

use crate::duration;
use crate::error::{ConfigError, Result};
use crate::rule::{BadLiteral, ValidationRule};
use crate::schema::FieldSchema;
use crate::setting::{Setting, Slot, ValueKind};
use crate::store::Store;
use crate::value::Value;
use crate::walk::FieldVisitor;

/// Floats within this distance count as equal for `in` rules.
const FLOAT_TOLERANCE: f64 = 1e-3;

pub(crate) struct Validator<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Validator<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: Store> FieldVisitor for Validator<'_, S> {
    fn visit(&mut self, key: &str, field: &FieldSchema, slot: &mut dyn Slot) -> Result<()> {
        let resolved = self.store.get(key);
        if field.is_required() && resolved.is_none() {
            return Err(ConfigError::Required(key.to_string()));
        }

        let Some(spec) = field.tags.validation.filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let Some(value) = resolved else {
            return Ok(());
        };
        check_rule(key, spec, slot.kind(), &value)
    }
}

/// Evaluate the rule `spec` for `key` against its resolved `value`,
/// comparing under the semantics of `kind`.
pub fn check_rule(key: &str, spec: &str, kind: ValueKind, value: &Value) -> Result<()> {
    let rule = ValidationRule::parse(key, spec)?;
    let outcome = match kind {
        ValueKind::Duration => {
            let actual: Duration = typed(key, value)?;
            rule.matches(&actual, |s| duration::parse(s).ok(), |a, b| a == b)
        }
        ValueKind::String => {
            if rule.is_range() {
                return Err(ConfigError::StringRange {
                    key: key.to_string(),
                    spec: spec.to_string(),
                });
            }
            let actual: String = typed(key, value)?;
            rule.matches(&actual, |s| Some(s.to_string()), |a, b| a == b)
        }
        ValueKind::Float => {
            let actual: f64 = typed(key, value)?;
            rule.matches(
                &actual,
                |s| s.parse().ok(),
                |a, b| (a - b).abs() < FLOAT_TOLERANCE,
            )
        }
        ValueKind::Int => {
            let actual: i64 = typed(key, value)?;
            rule.matches(&actual, |s| s.parse().ok(), |a, b| a == b)
        }
        ValueKind::Uint => {
            let actual: u64 = typed(key, value)?;
            rule.matches(&actual, |s| s.parse().ok(), |a, b| a == b)
        }
        ValueKind::Bool | ValueKind::Sequence | ValueKind::Map => Err(BadLiteral),
    };

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err(ConfigError::ValidationFailed {
            key: key.to_string(),
            spec: spec.to_string(),
            value: value.to_string(),
        }),
        Err(BadLiteral) => Err(ConfigError::BadValidationValue {
            key: key.to_string(),
            spec: spec.to_string(),
        }),
    }
}

fn typed<T: Setting>(key: &str, value: &Value) -> Result<T> {
    T::decode(value).map_err(|source| ConfigError::Decode {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(spec: &str, kind: ValueKind, value: impl Into<Value>) -> Result<()> {
        check_rule("k", spec, kind, &value.into())
    }

    #[test]
    fn int_membership_and_range() {
        assert!(check("in:[2, 9]", ValueKind::Int, 2i64).is_ok());
        let err = check("in:[2, 9]", ValueKind::Int, 5i64).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[k] did not pass validation. want [in:[2, 9]] real [5]"
        );
        assert!(check("range:[2, 9]", ValueKind::Int, 2i64).is_ok());
        assert!(check("range:[2, 9]", ValueKind::Int, 9i64).is_ok());
        assert!(check("range:(2, 9)", ValueKind::Int, 2i64).is_err());
        assert!(check("range:(2, 9)", ValueKind::Int, 9i64).is_err());
        assert!(check("range:[, 9]", ValueKind::Int, -1000i64).is_ok());
    }

    #[test]
    fn int_values_arrive_as_text() {
        assert!(check("in:[-3]", ValueKind::Int, "-3").is_ok());
    }

    #[test]
    fn uint_rejects_negative_literal() {
        let err = check("range:[-1, 9]", ValueKind::Uint, 3i64).unwrap_err();
        assert!(matches!(err, ConfigError::BadValidationValue { .. }));
        assert_eq!(err.to_string(), "[k] failed to parse validation values [range:[-1, 9]]");
    }

    #[test]
    fn float_membership_uses_tolerance() {
        assert!(check("in:[1.5, 2.0]", ValueKind::Float, 1.5004).is_ok());
        assert!(check("in:[1.5, 2.0]", ValueKind::Float, 1.51).is_err());
        assert!(check("range:(1.0, 2.0)", ValueKind::Float, "1.99").is_ok());
    }

    #[test]
    fn string_membership_only() {
        assert!(check("in:[dev, prod]", ValueKind::String, "prod").is_ok());
        assert!(check("in:[dev, prod]", ValueKind::String, "qa").is_err());
        let err = check("range:[a, z]", ValueKind::String, "m").unwrap_err();
        assert!(matches!(err, ConfigError::StringRange { .. }));
    }

    #[test]
    fn duration_compares_exactly() {
        assert!(check("in:[1s, 1m]", ValueKind::Duration, "60s").is_ok());
        assert!(check("range:[1s, 1m]", ValueKind::Duration, "30s").is_ok());
        assert!(check("range:[1s, 1m]", ValueKind::Duration, "2m").is_err());
        let err = check("in:[soon]", ValueKind::Duration, "1s").unwrap_err();
        assert!(matches!(err, ConfigError::BadValidationValue { .. }));
    }

    #[test]
    fn other_kinds_cannot_be_validated() {
        let err = check("in:[true]", ValueKind::Bool, true).unwrap_err();
        assert!(matches!(err, ConfigError::BadValidationValue { .. }));
    }

    #[test]
    fn bad_spec_reported_before_value() {
        let err = check("between:1,2", ValueKind::Int, 1i64).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedValidation { .. }));
    }
}
