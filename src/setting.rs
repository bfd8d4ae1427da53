//! Typed leaf settings.
//!
//! [`Setting`] is implemented for every type a config field may hold: bool,
//! all integer widths, floats, strings and paths, [`Duration`], optional values,
//! sequences and string-keyed maps. Newtypes get it through
//! `#[derive(Setting)]`, which delegates to the wrapped type.
//!
//! Decoding is weakly typed: a string `"-333"` decodes into an `i16`, `1` into
//! a bool, and a JSON string `"[1,2]"` into a `Vec<u8>`. Narrowing is always
//! range-checked.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::duration;
use crate::value::{Mapping, Value};

/// The broad category of a setting, used to pick validation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Duration,
    Sequence,
    Map,
}

impl ValueKind {
    /// Containers are always replaced by their default, never merged.
    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Sequence | ValueKind::Map)
    }
}

/// A value that could not be turned into the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    expected: &'static str,
    found: String,
    reason: Option<String>,
}

impl DecodeError {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        let found = match found {
            Value::String(s) => format!("\"{s}\""),
            other => format!("{} {other}", other.type_name()),
        };
        Self {
            expected,
            found,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl fmt::Display) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn expected(&self) -> &'static str {
        self.expected
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot decode {} as {}", self.found, self.expected)?;
        if let Some(reason) = &self.reason {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

/// A type that can live in a leaf field of a config record.
pub trait Setting: Sized {
    const KIND: ValueKind;

    /// Decode from a loaded value, accepting loosely typed input.
    fn decode(value: &Value) -> Result<Self, DecodeError>;

    /// Parse a default literal from a field attribute.
    fn parse_literal(literal: &str) -> Result<Self, DecodeError> {
        Self::decode(&Value::String(literal.to_string()))
    }

    fn is_zero(&self) -> bool;

    fn to_value(&self) -> Value;
}

/// Object-safe view of a [`Setting`] stored in a record field.
///
/// Walkers hand out `&mut dyn Slot` so visitors can work on fields without
/// knowing their concrete type.
pub trait Slot {
    fn kind(&self) -> ValueKind;
    fn holds_zero(&self) -> bool;
    /// Apply a default literal. Scalars keep a non-zero value already present;
    /// sequences and maps are replaced outright.
    fn apply_default(&mut self, literal: &str) -> Result<(), DecodeError>;
    fn assign(&mut self, value: &Value) -> Result<(), DecodeError>;
    fn current(&self) -> Value;
}

impl<T: Setting> Slot for T {
    fn kind(&self) -> ValueKind {
        T::KIND
    }

    fn holds_zero(&self) -> bool {
        Setting::is_zero(self)
    }

    fn apply_default(&mut self, literal: &str) -> Result<(), DecodeError> {
        let parsed = T::parse_literal(literal)?;
        if T::KIND.is_container() || Setting::is_zero(self) {
            *self = parsed;
        }
        Ok(())
    }

    fn assign(&mut self, value: &Value) -> Result<(), DecodeError> {
        *self = T::decode(value)?;
        Ok(())
    }

    fn current(&self) -> Value {
        self.to_value()
    }
}

fn weak_i64(value: &Value, expected: &'static str) -> Result<i64, DecodeError> {
    let fail = || DecodeError::new(expected, value);
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) if f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s.trim().parse().map_err(|e| fail().with_reason(e)),
        Value::Duration(d) => i64::try_from(d.as_nanos()).map_err(|_| fail()),
        _ => Err(fail()),
    }
}

fn weak_u64(value: &Value, expected: &'static str) -> Result<u64, DecodeError> {
    let fail = || DecodeError::new(expected, value);
    match value {
        Value::Integer(i) => u64::try_from(*i).map_err(|_| fail().with_reason("negative value")),
        Value::Bool(b) => Ok(u64::from(*b)),
        Value::Float(f) if f.is_finite() && *f >= 0.0 && *f <= u64::MAX as f64 => {
            Ok(f.trunc() as u64)
        }
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s.trim().parse().map_err(|e| fail().with_reason(e)),
        Value::Duration(d) => u64::try_from(d.as_nanos()).map_err(|_| fail()),
        _ => Err(fail()),
    }
}

fn weak_f64(value: &Value, expected: &'static str) -> Result<f64, DecodeError> {
    let fail = || DecodeError::new(expected, value);
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s.trim().parse().map_err(|e| fail().with_reason(e)),
        _ => Err(fail()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

macro_rules! signed_setting {
    ($($ty:ty),* $(,)?) => {$(
        impl Setting for $ty {
            const KIND: ValueKind = ValueKind::Int;

            fn decode(value: &Value) -> Result<Self, DecodeError> {
                let wide = weak_i64(value, stringify!($ty))?;
                <$ty>::try_from(wide).map_err(|_| {
                    DecodeError::new(stringify!($ty), value).with_reason("out of range")
                })
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn to_value(&self) -> Value {
                i64::try_from(*self)
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::String(self.to_string()))
            }
        }
    )*};
}

macro_rules! unsigned_setting {
    ($($ty:ty),* $(,)?) => {$(
        impl Setting for $ty {
            const KIND: ValueKind = ValueKind::Uint;

            fn decode(value: &Value) -> Result<Self, DecodeError> {
                let wide = weak_u64(value, stringify!($ty))?;
                <$ty>::try_from(wide).map_err(|_| {
                    DecodeError::new(stringify!($ty), value).with_reason("out of range")
                })
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn to_value(&self) -> Value {
                i64::try_from(*self)
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::String(self.to_string()))
            }
        }
    )*};
}

macro_rules! float_setting {
    ($($ty:ty),* $(,)?) => {$(
        impl Setting for $ty {
            const KIND: ValueKind = ValueKind::Float;

            fn decode(value: &Value) -> Result<Self, DecodeError> {
                match value {
                    // Parse text at the target width to avoid double rounding.
                    Value::String(s) if !s.trim().is_empty() => <$ty>::from_str(s.trim())
                        .map_err(|e| DecodeError::new(stringify!($ty), value).with_reason(e)),
                    _ => weak_f64(value, stringify!($ty)).map(|f| f as $ty),
                }
            }

            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn to_value(&self) -> Value {
                Value::Float(f64::from(*self))
            }
        }
    )*};
}

signed_setting!(i8, i16, i32, i64, isize);
unsigned_setting!(u8, u16, u32, u64, usize);
float_setting!(f32, f64);

impl Setting for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Integer(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::String(s) if s.trim().is_empty() => Ok(false),
            Value::String(s) => parse_bool(s.trim())
                .ok_or_else(|| DecodeError::new("bool", value).with_reason("invalid syntax")),
            _ => Err(DecodeError::new("bool", value)),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Setting for String {
    const KIND: ValueKind = ValueKind::String;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::Duration(_) => {
                Ok(value.to_string())
            }
            _ => Err(DecodeError::new("string", value)),
        }
    }

    fn parse_literal(literal: &str) -> Result<Self, DecodeError> {
        Ok(literal.to_string())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Setting for PathBuf {
    const KIND: ValueKind = ValueKind::String;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        String::decode(value).map(PathBuf::from)
    }

    fn parse_literal(literal: &str) -> Result<Self, DecodeError> {
        Ok(PathBuf::from(literal))
    }

    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }

    fn to_value(&self) -> Value {
        Value::String(self.display().to_string())
    }
}

impl Setting for Duration {
    const KIND: ValueKind = ValueKind::Duration;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        let fail = || DecodeError::new("duration", value);
        match value {
            Value::Duration(d) => Ok(*d),
            Value::Integer(i) => u64::try_from(*i)
                .map(Duration::from_nanos)
                .map_err(|_| fail().with_reason("negative durations are not supported")),
            Value::Float(f) if f.is_finite() && *f >= 0.0 => Ok(Duration::from_nanos(*f as u64)),
            Value::String(s) if s.trim().is_empty() => Ok(Duration::ZERO),
            // Bare digits count as nanoseconds.
            Value::String(s) if s.trim().bytes().all(|b| b.is_ascii_digit()) => s
                .trim()
                .parse()
                .map(Duration::from_nanos)
                .map_err(|e| fail().with_reason(e)),
            Value::String(s) => duration::parse(s).map_err(|e| fail().with_reason(e)),
            // The shape serde gives a `Duration`, so dumped records load back.
            Value::Mapping(map) => {
                let part = |name: &str| match map.get(name) {
                    None => Ok(0),
                    Some(Value::Integer(i)) => u64::try_from(*i).map_err(|_| {
                        fail().with_reason(format!("{name} must not be negative"))
                    }),
                    Some(_) => Err(fail().with_reason(format!("{name} must be an integer"))),
                };
                if let Some(extra) = map.keys().find(|k| !matches!(k.as_str(), "secs" | "nanos")) {
                    return Err(fail().with_reason(format!("unexpected field {extra}")));
                }
                let nanos = u32::try_from(part("nanos")?)
                    .ok()
                    .filter(|n| *n < 1_000_000_000)
                    .ok_or_else(|| fail().with_reason("nanos out of range"))?;
                Ok(Duration::new(part("secs")?, nanos))
            }
            _ => Err(fail()),
        }
    }

    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }

    fn to_value(&self) -> Value {
        Value::Duration(*self)
    }
}

impl<T: Setting> Setting for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }

    fn parse_literal(literal: &str) -> Result<Self, DecodeError> {
        T::parse_literal(literal).map(Some)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Setting::to_value)
    }
}

/// Parse structured text (a JSON array or object) embedded in a string value.
fn parse_structured(text: &str, expected: &'static str) -> Result<Value, DecodeError> {
    serde_json::from_str::<Value>(text).map_err(|e| {
        DecodeError::new(expected, &Value::String(text.to_string())).with_reason(e)
    })
}

fn is_empty_literal(text: &str) -> bool {
    matches!(text.trim(), "" | "[]" | "{}")
}

impl<T: Setting> Setting for Vec<T> {
    const KIND: ValueKind = ValueKind::Sequence;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    T::decode(item).map_err(|e| {
                        DecodeError::new("sequence", value).with_reason(format!("item {i}: {e}"))
                    })
                })
                .collect(),
            Value::String(s) if is_empty_literal(s) => Ok(Vec::new()),
            Value::String(s) if s.trim_start().starts_with('[') => {
                Self::decode(&parse_structured(s, "sequence")?)
            }
            // Env and flag text such as `a,b` splits into one element per part.
            Value::String(s) => s
                .split(',')
                .map(|part| T::decode(&Value::String(part.trim().to_string())))
                .collect(),
            // A lone scalar becomes a one-element sequence.
            Value::Mapping(_) => Err(DecodeError::new("sequence", value)),
            scalar => Ok(vec![T::decode(scalar)?]),
        }
    }

    fn parse_literal(literal: &str) -> Result<Self, DecodeError> {
        if is_empty_literal(literal) {
            return Ok(Vec::new());
        }
        Self::decode(&parse_structured(literal, "sequence")?)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(Setting::to_value).collect())
    }
}

fn decode_entries<T: Setting, M: FromIterator<(String, T)>>(
    value: &Value,
) -> Result<M, DecodeError> {
    match value {
        Value::Null => Ok(M::from_iter(std::iter::empty())),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, item)| {
                T::decode(item).map(|v| (key.clone(), v)).map_err(|e| {
                    DecodeError::new("map", value).with_reason(format!("entry {key}: {e}"))
                })
            })
            .collect(),
        Value::String(s) if is_empty_literal(s) => Ok(M::from_iter(std::iter::empty())),
        Value::String(s) => decode_entries(&parse_structured(s, "map")?),
        _ => Err(DecodeError::new("map", value)),
    }
}

fn entries_value<'a, T: Setting + 'a>(entries: impl Iterator<Item = (&'a String, &'a T)>) -> Value {
    Value::Mapping(
        entries
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect::<Mapping>(),
    )
}

impl<T: Setting> Setting for HashMap<String, T> {
    const KIND: ValueKind = ValueKind::Map;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        decode_entries(value)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Value {
        entries_value(self.iter())
    }
}

impl<T: Setting> Setting for BTreeMap<String, T> {
    const KIND: ValueKind = ValueKind::Map;

    fn decode(value: &Value) -> Result<Self, DecodeError> {
        decode_entries(value)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Value {
        entries_value(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn integers_from_strings_and_numbers() {
        assert_eq!(i16::decode(&s("-333")).unwrap(), -333);
        assert_eq!(u8::decode(&Value::Integer(111)).unwrap(), 111);
        assert_eq!(i64::decode(&Value::Float(3.0)).unwrap(), 3);
        assert_eq!(u32::decode(&Value::Bool(true)).unwrap(), 1);
        assert_eq!(i32::decode(&s("")).unwrap(), 0);
    }

    #[test]
    fn integer_narrowing_is_checked() {
        let err = i8::decode(&Value::Integer(300)).unwrap_err();
        assert_eq!(err.expected(), "i8");
        assert!(err.to_string().contains("out of range"), "got: {err}");
        assert!(u16::decode(&Value::Integer(-1)).is_err());
        assert!(i32::decode(&s("12abc")).is_err());
    }

    #[test]
    fn u64_above_i64_range() {
        assert_eq!(u64::decode(&s("18446744073709551615")).unwrap(), u64::MAX);
        assert_eq!(u64::MAX.to_value(), s("18446744073709551615"));
    }

    #[test]
    fn floats_keep_target_precision() {
        assert_eq!(f32::decode(&s("1.32")).unwrap(), 1.32f32);
        assert_eq!(f64::decode(&Value::Integer(2)).unwrap(), 2.0);
        assert!(f64::decode(&s("x")).is_err());
    }

    #[test]
    fn bool_forms() {
        for yes in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(bool::decode(&s(yes)).unwrap(), "{yes}");
        }
        for no in ["0", "f", "F", "false", "FALSE", "False", ""] {
            assert!(!bool::decode(&s(no)).unwrap(), "{no}");
        }
        assert!(bool::decode(&s("fasle")).is_err());
        assert!(bool::decode(&Value::Integer(2)).unwrap());
    }

    #[test]
    fn strings_from_scalars() {
        assert_eq!(String::decode(&Value::Integer(5)).unwrap(), "5");
        assert_eq!(String::decode(&Value::Bool(false)).unwrap(), "false");
        assert!(String::decode(&Value::Sequence(vec![])).is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(
            Duration::decode(&s("86400s")).unwrap(),
            Duration::from_secs(86400)
        );
        assert_eq!(
            Duration::decode(&Value::Integer(1_000)).unwrap(),
            Duration::from_micros(1)
        );
        assert_eq!(Duration::decode(&s("42")).unwrap(), Duration::from_nanos(42));
        assert!(Duration::decode(&s("-1s")).is_err());
        assert!(Duration::decode(&Value::Integer(-1)).is_err());
    }

    #[test]
    fn durations_from_secs_nanos_mapping() {
        let mut m = Mapping::new();
        m.insert("secs".into(), Value::Integer(7));
        m.insert("nanos".into(), Value::Integer(500));
        assert_eq!(
            Duration::decode(&Value::Mapping(m.clone())).unwrap(),
            Duration::new(7, 500)
        );

        m.insert("nanos".into(), Value::Integer(1_000_000_000));
        assert!(Duration::decode(&Value::Mapping(m.clone())).is_err());

        m.insert("nanos".into(), Value::Integer(0));
        m.insert("mins".into(), Value::Integer(1));
        assert!(Duration::decode(&Value::Mapping(m)).is_err());
    }

    #[test]
    fn sequences_from_lists_json_and_scalars() {
        let list = Value::Sequence(vec![s("1"), Value::Integer(2)]);
        assert_eq!(Vec::<i32>::decode(&list).unwrap(), vec![1, 2]);
        assert_eq!(Vec::<i32>::decode(&s("[3, 4]")).unwrap(), vec![3, 4]);
        assert_eq!(Vec::<String>::decode(&s("solo")).unwrap(), vec!["solo"]);
        assert!(Vec::<i32>::decode(&s("[1,")).is_err());
    }

    #[test]
    fn sequences_split_comma_text() {
        assert_eq!(Vec::<String>::decode(&s("a,b")).unwrap(), vec!["a", "b"]);
        assert_eq!(Vec::<u16>::decode(&s("1, 2,3")).unwrap(), vec![1, 2, 3]);
        assert!(Vec::<u16>::decode(&s("1,x")).is_err());
        assert!(Vec::<u16>::decode(&s("")).unwrap().is_empty());
    }

    #[test]
    fn sequence_item_error_names_index() {
        let list = Value::Sequence(vec![Value::Integer(1), s("x")]);
        let err = Vec::<u8>::decode(&list).unwrap_err();
        assert!(err.to_string().contains("item 1"), "got: {err}");
    }

    #[test]
    fn maps_from_mappings_and_json() {
        let mut m = Mapping::new();
        m.insert("k1".into(), s("1"));
        let decoded = HashMap::<String, i32>::decode(&Value::Mapping(m)).unwrap();
        assert_eq!(decoded["k1"], 1);

        let decoded = BTreeMap::<String, String>::decode(&s(r#"{"a": "b"}"#)).unwrap();
        assert_eq!(decoded["a"], "b");
        assert!(HashMap::<String, i32>::decode(&Value::Integer(1)).is_err());
    }

    #[test]
    fn option_wraps_inner() {
        assert_eq!(Option::<u16>::decode(&Value::Null).unwrap(), None);
        assert_eq!(Option::<u16>::decode(&s("7")).unwrap(), Some(7));
        assert_eq!(<Option<u16> as Setting>::KIND, ValueKind::Uint);
    }

    #[test]
    fn container_literals() {
        assert!(Vec::<String>::parse_literal("[]").unwrap().is_empty());
        assert!(HashMap::<String, String>::parse_literal("{}").unwrap().is_empty());
        assert_eq!(
            Vec::<String>::parse_literal(r#"["s1","s2"]"#).unwrap(),
            vec!["s1", "s2"]
        );
    }

    #[test]
    fn default_respects_non_zero_scalars() {
        let mut port: u16 = 8080;
        port.apply_default("80").unwrap();
        assert_eq!(port, 8080);

        let mut unset: u16 = 0;
        unset.apply_default("80").unwrap();
        assert_eq!(unset, 80);
    }

    #[test]
    fn default_replaces_containers() {
        let mut tags = vec!["old".to_string()];
        tags.apply_default(r#"["new"]"#).unwrap();
        assert_eq!(tags, vec!["new"]);
    }

    #[test]
    fn slot_reports_kind_and_value() {
        let timeout = Duration::from_secs(3);
        let slot: &dyn Slot = &timeout;
        assert_eq!(slot.kind(), ValueKind::Duration);
        assert!(!slot.holds_zero());
        assert_eq!(slot.current(), Value::Duration(Duration::from_secs(3)));
    }
}
