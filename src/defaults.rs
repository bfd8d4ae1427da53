//! Applying declared defaults directly to a record, without any sources.

use crate::error::{ConfigError, Result};
use crate::schema::{Config, FieldSchema};
use crate::setting::Slot;
use crate::walk::{FieldVisitor, walk};

struct DefaultApplier;

impl FieldVisitor for DefaultApplier {
    fn visit(&mut self, _key: &str, field: &FieldSchema, slot: &mut dyn Slot) -> Result<()> {
        let Some(literal) = field.tags.default.filter(|d| !d.is_empty()) else {
            return Ok(());
        };
        slot.apply_default(literal)
            .map_err(|source| ConfigError::CoerceError {
                field: field.name.to_string(),
                value: literal.to_string(),
                source,
            })
    }
}

/// Fill `config` from its `default` attributes only.
///
/// Scalar fields already holding a non-zero value are left alone; sequences
/// and maps are always replaced by their default.
pub fn load_defaults(config: &mut dyn Config) -> Result<()> {
    walk("", config, &mut DefaultApplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AllKinds, Layered};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn fills_every_kind() {
        let mut conf = AllKinds::default();
        load_defaults(&mut conf).unwrap();
        assert!(conf.flag);
        assert_eq!(conf.i8, -8);
        assert_eq!(conf.i16, -333);
        assert_eq!(conf.i32, -32);
        assert_eq!(conf.i64, -64);
        assert_eq!(conf.u8, 8);
        assert_eq!(conf.u16, 16);
        assert_eq!(conf.u32, 32);
        assert_eq!(conf.u64, 64);
        assert_eq!(conf.f32, 1.32);
        assert_eq!(conf.f64, 2.64);
        assert_eq!(conf.text, "hello");
        assert_eq!(conf.dur, Duration::from_secs(86400));
        assert_eq!(conf.alias.0, -7);
        assert_eq!(conf.list, vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(conf.map, HashMap::from([("k1".to_string(), 1)]));
    }

    #[test]
    fn non_zero_scalars_survive() {
        let mut conf = AllKinds {
            i16: 5,
            text: "set".into(),
            ..AllKinds::default()
        };
        load_defaults(&mut conf).unwrap();
        assert_eq!(conf.i16, 5);
        assert_eq!(conf.text, "set");
    }

    #[test]
    fn containers_always_replaced() {
        let mut conf = AllKinds {
            list: vec!["old".into()],
            ..AllKinds::default()
        };
        load_defaults(&mut conf).unwrap();
        assert_eq!(conf.list, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn nested_defaults_applied() {
        let mut conf = Layered::default();
        load_defaults(&mut conf).unwrap();
        assert_eq!(conf.server.port, 8080);
        assert_eq!(conf.server.host, "localhost");
    }

    #[test]
    fn bad_literal_names_field_and_value() {
        let mut conf = crate::fixtures::test::BadDefault::default();
        let err = load_defaults(&mut conf).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to convert value (lots) to u8 for field: count: \
             cannot decode \"lots\" as u8: invalid digit found in string"
        );
    }
}
