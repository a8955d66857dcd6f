use crate::validator::{Validator, ValidatorArgs};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Every builtin validator, one instance each.
pub(crate) fn all() -> Vec<Arc<dyn Validator>> {
    vec![
        Arc::new(Required),
        Arc::new(StringValidator),
        Arc::new(IntegerValidator),
        Arc::new(UuidValidator),
        Arc::new(DateValidator),
    ]
}

// ============================================================================
// Argument helpers
// ============================================================================

// Reject argument keys the validator does not understand.
fn reject_unknown(args: &ValidatorArgs, allowed: &[&str]) -> Result<(), String> {
    match args.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(format!("unknown argument '{key}'")),
        None => Ok(()),
    }
}

fn usize_arg(args: &ValidatorArgs, key: &str) -> Result<Option<usize>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| format!("argument '{key}' must be a non-negative integer")),
    }
}

fn i64_arg(args: &ValidatorArgs, key: &str) -> Result<Option<i64>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("argument '{key}' must be an integer")),
    }
}

fn str_arg<'a>(args: &'a ValidatorArgs, key: &str) -> Result<Option<&'a str>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(format!("argument '{key}' must be a string")),
    }
}

// Request inputs arrive as text more often than not.
fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

///
/// Required
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Required;

impl Validator for Required {
    fn name(&self) -> &'static str {
        "required"
    }

    fn validate_args(&self, args: &ValidatorArgs) -> Result<(), String> {
        reject_unknown(args, &[])
    }

    fn validate(&self, value: &Value, _: &ValidatorArgs) -> Result<(), String> {
        match value {
            Value::Null => Err("value is required".to_string()),
            Value::String(s) if s.is_empty() => Err("value is required".to_string()),
            _ => Ok(()),
        }
    }
}

///
/// StringValidator
/// Accepts text; optional `minLength` / `maxLength` bound the char count.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct StringValidator;

impl Validator for StringValidator {
    fn name(&self) -> &'static str {
        "string"
    }

    fn validate_args(&self, args: &ValidatorArgs) -> Result<(), String> {
        reject_unknown(args, &["minLength", "maxLength"])?;
        let min = usize_arg(args, "minLength")?;
        let max = usize_arg(args, "maxLength")?;

        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(format!("minLength ({min}) exceeds maxLength ({max})"));
        }

        Ok(())
    }

    fn validate(&self, value: &Value, args: &ValidatorArgs) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        let text = as_text(value).ok_or_else(|| "value is not a string".to_string())?;
        let len = text.chars().count();

        if let Some(min) = usize_arg(args, "minLength")?
            && len < min
        {
            return Err(format!("length ({len}) is lower than minimum of {min}"));
        }
        if let Some(max) = usize_arg(args, "maxLength")?
            && len > max
        {
            return Err(format!("length ({len}) is greater than maximum of {max}"));
        }

        Ok(())
    }
}

///
/// IntegerValidator
/// Accepts integers or integer text; optional inclusive `min` / `max`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerValidator;

impl Validator for IntegerValidator {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn validate_args(&self, args: &ValidatorArgs) -> Result<(), String> {
        reject_unknown(args, &["min", "max"])?;
        let min = i64_arg(args, "min")?;
        let max = i64_arg(args, "max")?;

        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(format!("min ({min}) exceeds max ({max})"));
        }

        Ok(())
    }

    fn validate(&self, value: &Value, args: &ValidatorArgs) -> Result<(), String> {
        let n = match value {
            Value::Null => return Ok(()),
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| "value is not an integer".to_string())?;

        if let Some(min) = i64_arg(args, "min")?
            && n < min
        {
            return Err(format!("{n} must be >= {min}"));
        }
        if let Some(max) = i64_arg(args, "max")?
            && n > max
        {
            return Err(format!("{n} must be <= {max}"));
        }

        Ok(())
    }
}

///
/// UuidValidator
///

#[derive(Clone, Copy, Debug, Default)]
pub struct UuidValidator;

impl Validator for UuidValidator {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn validate_args(&self, args: &ValidatorArgs) -> Result<(), String> {
        reject_unknown(args, &[])
    }

    fn validate(&self, value: &Value, _: &ValidatorArgs) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        let text = as_text(value).ok_or_else(|| "value is not a string".to_string())?;

        Uuid::parse_str(text)
            .map(|_| ())
            .map_err(|e| format!("'{text}' is not a valid uuid: {e}"))
    }
}

///
/// DateValidator
/// Parses text with a chrono `format` (default `%Y-%m-%d`).
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DateValidator;

impl DateValidator {
    pub const DEFAULT_FORMAT: &'static str = "%Y-%m-%d";
}

impl Validator for DateValidator {
    fn name(&self) -> &'static str {
        "date"
    }

    fn validate_args(&self, args: &ValidatorArgs) -> Result<(), String> {
        reject_unknown(args, &["format"])?;
        if let Some(format) = str_arg(args, "format")?
            && format.is_empty()
        {
            return Err("argument 'format' is empty".to_string());
        }

        Ok(())
    }

    fn validate(&self, value: &Value, args: &ValidatorArgs) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        let text = as_text(value).ok_or_else(|| "value is not a string".to_string())?;
        let format = str_arg(args, "format")?.unwrap_or(Self::DEFAULT_FORMAT);

        NaiveDate::parse_from_str(text, format)
            .map(|_| ())
            .map_err(|e| format!("'{text}' does not match date format '{format}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> ValidatorArgs {
        match value {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    #[test]
    fn required_rejects_null_and_empty_text() {
        let none = ValidatorArgs::new();

        assert!(Required.validate(&Value::Null, &none).is_err());
        assert!(Required.validate(&json!(""), &none).is_err());
        assert!(Required.validate(&json!("x"), &none).is_ok());
        assert!(Required.validate(&json!(0), &none).is_ok());
    }

    #[test]
    fn string_bounds_are_checked() {
        let bounds = args(json!({ "minLength": 2, "maxLength": 4 }));

        assert!(StringValidator.validate_args(&bounds).is_ok());
        assert!(StringValidator.validate(&json!("a"), &bounds).is_err());
        assert!(StringValidator.validate(&json!("abc"), &bounds).is_ok());
        assert!(StringValidator.validate(&json!("abcde"), &bounds).is_err());
        assert!(StringValidator.validate(&json!(12), &bounds).is_err());
    }

    #[test]
    fn string_args_reject_inverted_bounds_and_unknown_keys() {
        assert!(
            StringValidator
                .validate_args(&args(json!({ "minLength": 5, "maxLength": 1 })))
                .is_err()
        );
        assert!(
            StringValidator
                .validate_args(&args(json!({ "pattern": ".*" })))
                .is_err(),
            "unsupported argument keys should be rejected"
        );
        assert!(
            StringValidator
                .validate_args(&args(json!({ "minLength": "two" })))
                .is_err()
        );
    }

    #[test]
    fn integer_accepts_numbers_and_numeric_text() {
        let bounds = args(json!({ "min": 0, "max": 10 }));

        assert!(IntegerValidator.validate(&json!(5), &bounds).is_ok());
        assert!(IntegerValidator.validate(&json!("7"), &bounds).is_ok());
        assert!(IntegerValidator.validate(&json!(11), &bounds).is_err());
        assert!(IntegerValidator.validate(&json!(-1), &bounds).is_err());
        assert!(IntegerValidator.validate(&json!(1.5), &bounds).is_err());
        assert!(IntegerValidator.validate(&json!("x"), &bounds).is_err());
    }

    #[test]
    fn uuid_and_date_parse_text() {
        let none = ValidatorArgs::new();

        assert!(
            UuidValidator
                .validate(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8"), &none)
                .is_ok()
        );
        assert!(UuidValidator.validate(&json!("not-a-uuid"), &none).is_err());

        assert!(DateValidator.validate(&json!("2024-02-29"), &none).is_ok());
        assert!(DateValidator.validate(&json!("2023-02-29"), &none).is_err());

        let custom = args(json!({ "format": "%d/%m/%Y" }));
        assert!(DateValidator.validate_args(&custom).is_ok());
        assert!(DateValidator.validate(&json!("31/12/2024"), &custom).is_ok());
    }
}
