//! Typed extraction of single config values.
//!
//! Each supported kind implements [`ConfigValue`]. A stored value that already
//! has the requested JSON shape is copied directly; anything else goes through
//! a `serde_json` round-trip into the requested type.

use abtest_types::{AbError, AbResult, ConfigMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A value kind that can be read out of an experiment config.
pub trait ConfigValue: DeserializeOwned + Default {
    /// Kind name reported in conversion errors.
    const KIND: &'static str;

    /// Direct copy when `value` already has this kind's shape.
    fn from_exact(value: &Value) -> Option<Self>;
}

impl ConfigValue for bool {
    const KIND: &'static str = "bool";

    fn from_exact(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl ConfigValue for String {
    const KIND: &'static str = "string";

    fn from_exact(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl ConfigValue for i64 {
    const KIND: &'static str = "i64";

    /// Integral floats such as `3.0` count as integers.
    fn from_exact(value: &Value) -> Option<Self> {
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        })
    }
}

impl ConfigValue for f64 {
    const KIND: &'static str = "f64";

    fn from_exact(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl ConfigValue for Vec<String> {
    const KIND: &'static str = "string list";

    fn from_exact(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(String::from_exact).collect()
    }
}

impl ConfigValue for Vec<i64> {
    const KIND: &'static str = "i64 list";

    fn from_exact(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(i64::from_exact).collect()
    }
}

impl ConfigValue for ConfigMap {
    const KIND: &'static str = "map";

    fn from_exact(value: &Value) -> Option<Self> {
        value.as_object().map(|object| object.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Write `value` into `dest`.
///
/// `null` leaves `dest` untouched. On a failed conversion `dest` is reset to
/// its zero value and the error is returned.
pub(crate) fn assign<T: ConfigValue>(key: &str, value: &Value, dest: &mut T) -> AbResult<()> {
    if value.is_null() {
        return Ok(());
    }

    if let Some(exact) = T::from_exact(value) {
        *dest = exact;
        return Ok(());
    }

    match serde_json::from_value::<T>(value.clone()) {
        Ok(converted) => {
            *dest = converted;
            Ok(())
        },
        Err(e) => {
            *dest = T::default();
            Err(AbError::Conversion {
                key: key.to_string(),
                expected: T::KIND.to_string(),
                message: e.to_string(),
            })
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_shapes() {
        let mut flag = false;
        assign("k", &json!(true), &mut flag).unwrap();
        assert!(flag);

        let mut names: Vec<String> = Vec::new();
        assign("k", &json!(["a", "b"]), &mut names).unwrap();
        assert_eq!(names, vec!["a", "b"]);

        let mut map = ConfigMap::new();
        assign("k", &json!({"x": 1}), &mut map).unwrap();
        assert_eq!(map["x"], json!(1));
    }

    #[test]
    fn test_integral_floats_read_as_i64() {
        let mut count = 0_i64;
        assign("k", &json!(3.0), &mut count).unwrap();
        assert_eq!(count, 3);

        let mut ids: Vec<i64> = Vec::new();
        assign("k", &json!([1.0, 2]), &mut ids).unwrap();
        assert_eq!(ids, vec![1, 2]);

        assert!(assign("k", &json!(1.5), &mut count).is_err());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_integers_read_as_f64() {
        let mut ratio = 0.0_f64;
        assign("k", &json!(2), &mut ratio).unwrap();
        assert!((ratio - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mixed_list_rejected() {
        let mut names = vec!["stale".to_string()];
        let err = assign("k", &json!(["a", 1]), &mut names).unwrap_err();

        assert!(names.is_empty());
        assert!(matches!(err, AbError::Conversion { .. }));
    }

    #[test]
    fn test_mismatch_resets_to_zero() {
        let mut label = "keep".to_string();
        let err = assign("color", &json!(42), &mut label).unwrap_err();

        assert_eq!(label, "");
        match err {
            AbError::Conversion { key, expected, .. } => {
                assert_eq!(key, "color");
                assert_eq!(expected, "string");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_null_leaves_destination() {
        let mut count = 7_i64;
        assign("k", &Value::Null, &mut count).unwrap();
        assert_eq!(count, 7);
    }
}
