//! Forgiving field deserializers
//!
//! Designs come from a language model and documents come back from clients,
//! so individual fields are often the wrong JSON type: numbers as strings,
//! `"48px"` font sizes, `null` where an object belongs. Each helper here
//! accepts the reasonable variants and maps everything else to "absent"
//! instead of rejecting the whole payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

pub(crate) fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(string(d)?.unwrap_or_default())
}

pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    Ok(value_to_f32(&Value::deserialize(d)?))
}

pub(crate) fn number_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    Ok(number(d)?.unwrap_or(0.0))
}

pub(crate) fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim(), "true" | "1" | "yes"),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

/// Pixel dimension: a whole, non-negative number, possibly written as
/// `800.0` or `"800px"`.
pub(crate) fn dimension<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(d)?;
    value_to_dimension(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid dimension: {value}")))
}

/// Any structured value that fails to deserialize becomes `None`.
pub(crate) fn object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(d)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// A list of objects; entries that fail to deserialize are dropped, a
/// non-array becomes `None`.
pub(crate) fn list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn value_to_f32(value: &Value) -> Option<f32> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix("px").unwrap_or(s).trim_end();
            s.parse::<f32>().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn value_to_dimension(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(_) => f64::from(value_to_f32(value)?),
        _ => return None,
    };
    (v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v)).then_some(v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_strings_and_px_suffix() {
        assert_eq!(value_to_f32(&json!(48)), Some(48.0));
        assert_eq!(value_to_f32(&json!("48")), Some(48.0));
        assert_eq!(value_to_f32(&json!(" 36px ")), Some(36.0));
        assert_eq!(value_to_f32(&json!("large")), None);
        assert_eq!(value_to_f32(&json!(null)), None);
        assert_eq!(value_to_f32(&json!({"v": 1})), None);
    }

    #[test]
    fn dimensions_accept_whole_floats_and_strings() {
        assert_eq!(value_to_dimension(&json!(800)), Some(800));
        assert_eq!(value_to_dimension(&json!(800.0)), Some(800));
        assert_eq!(value_to_dimension(&json!("1200")), Some(1200));
        assert_eq!(value_to_dimension(&json!("1200px")), Some(1200));
        assert_eq!(value_to_dimension(&json!(800.5)), None);
        assert_eq!(value_to_dimension(&json!(-1)), None);
        assert_eq!(value_to_dimension(&json!(1.0e12)), None);
        assert_eq!(value_to_dimension(&json!(null)), None);
    }

    #[test]
    fn strings_accept_scalars() {
        assert_eq!(value_to_string(json!("a")), Some("a".into()));
        assert_eq!(value_to_string(json!(12)), Some("12".into()));
        assert_eq!(value_to_string(json!(true)), Some("true".into()));
        assert_eq!(value_to_string(json!(["a"])), None);
        assert_eq!(value_to_string(json!(null)), None);
    }
}
