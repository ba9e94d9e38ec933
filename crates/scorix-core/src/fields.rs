//! Typed field validation policies.
//!
//! A [`FieldSpec`] is an immutable validation policy declared once per field
//! name in a request schema: the `required`/`nullable` flags plus a
//! [`FieldKind`] constraint. Per-request values live in the incoming JSON
//! map and are handed to the spec at validation time, so a spec is shared
//! across every request instance of the same type.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::validation::ValidationResult;

/// Gender code for "unknown".
pub const UNKNOWN: i64 = 0;
/// Gender code for "male".
pub const MALE: i64 = 1;
/// Gender code for "female".
pub const FEMALE: i64 = 2;

/// Apparent-age cutoff for birthday fields, in days (365 * 70).
pub const MAX_AGE_DAYS: i64 = 25_550;

/// Type-specific constraint applied after the base required/nullable rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any string; numeric input is accepted via its string representation.
    Char,
    /// A JSON object, optionally JSON-decoded when supplied as a string.
    Arguments,
    /// A string matching the full email pattern.
    Email,
    /// Exactly 11 digits with a leading 7; integers are coerced to decimal.
    Phone,
    /// A `DD.MM.YYYY` calendar date.
    Date,
    /// A date whose apparent age does not exceed 70 years.
    BirthDay,
    /// The integer 0, 1 or 2, as a JSON number or a string of digits.
    Gender,
    /// A non-empty list of integers, optionally JSON-decoded from a string.
    ClientIds,
}

/// Immutable validation policy for one named field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldSpec {
    pub const fn new(kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            kind,
            required,
            nullable,
        }
    }

    /// Validate one resolved raw value against this policy.
    ///
    /// The base rule runs first: a missing value on a required field and an
    /// empty value on a non-nullable field are distinct failures. Subtype
    /// rules only run for values that are present and non-empty.
    pub fn validate(&self, name: &str, value: Option<&Value>) -> ValidationResult {
        let Some(value) = value else {
            if self.required {
                return ValidationResult::with_error(format!(
                    "{name}: required field is missing"
                ));
            }
            return ValidationResult::ok();
        };
        if is_empty_value(value) {
            if !self.nullable {
                return ValidationResult::with_error(format!("{name}: field must not be empty"));
            }
            return ValidationResult::ok();
        }
        self.kind.check(name, value)
    }
}

impl FieldKind {
    fn check(&self, name: &str, value: &Value) -> ValidationResult {
        match self {
            FieldKind::Char => check_char(name, value),
            FieldKind::Arguments => check_arguments(name, value),
            FieldKind::Email => check_email(name, value),
            FieldKind::Phone => check_phone(name, value),
            FieldKind::Date => check_date(name, value),
            FieldKind::BirthDay => check_birthday(name, value),
            FieldKind::Gender => check_gender(name, value),
            FieldKind::ClientIds => check_client_ids(name, value),
        }
    }
}

/// Resolve a field's raw value from the input map.
///
/// Absent keys and explicit JSON nulls both map to the "not supplied"
/// placeholder, matching the base rule's "missing" condition.
pub fn resolve<'a>(values: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    match values.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Canonical empty forms: `""`, `[]` and `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// String coercion shared by the character-like kinds: strings pass
/// through, numbers are converted via their decimal representation.
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, format_description!("[day].[month].[year]"))
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("static regex")
    })
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^7\d{10}$").expect("static regex"))
}

fn check_char(name: &str, value: &Value) -> ValidationResult {
    if coerce_string(value).is_none() {
        return ValidationResult::with_error(format!("{name}: expected a string"));
    }
    ValidationResult::ok()
}

fn check_arguments(name: &str, value: &Value) -> ValidationResult {
    let decoded;
    let resolved = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(v) => {
                decoded = v;
                &decoded
            }
            Err(err) => {
                return ValidationResult::with_error(format!("{name}: cannot decode JSON ({err})"));
            }
        },
        other => other,
    };
    if !resolved.is_object() {
        return ValidationResult::with_error(format!("{name}: expected a JSON object"));
    }
    ValidationResult::ok()
}

fn check_email(name: &str, value: &Value) -> ValidationResult {
    let Some(text) = coerce_string(value) else {
        return ValidationResult::with_error(format!("{name}: expected a string"));
    };
    if !email_regex().is_match(&text) {
        return ValidationResult::with_error(format!("{name}: malformed email address"));
    }
    ValidationResult::ok()
}

fn check_phone(name: &str, value: &Value) -> ValidationResult {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_i64().is_some() => n.to_string(),
        _ => {
            return ValidationResult::with_error(format!(
                "{name}: expected a string or an integer"
            ));
        }
    };
    if !phone_regex().is_match(&text) {
        return ValidationResult::with_error(format!(
            "{name}: malformed phone number (expected 11 digits starting with 7)"
        ));
    }
    ValidationResult::ok()
}

fn check_date(name: &str, value: &Value) -> ValidationResult {
    let Some(text) = coerce_string(value) else {
        return ValidationResult::with_error(format!("{name}: expected a string"));
    };
    if parse_date(&text).is_err() {
        return ValidationResult::with_error(format!(
            "{name}: malformed date (expected DD.MM.YYYY)"
        ));
    }
    ValidationResult::ok()
}

fn check_birthday(name: &str, value: &Value) -> ValidationResult {
    let Some(text) = coerce_string(value) else {
        return ValidationResult::with_error(format!("{name}: expected a string"));
    };
    let Ok(date) = parse_date(&text) else {
        return ValidationResult::with_error(format!(
            "{name}: malformed date (expected DD.MM.YYYY)"
        ));
    };
    // Future dates are not rejected; only an apparent age above 70 years is.
    if (today() - date).whole_days() > MAX_AGE_DAYS {
        return ValidationResult::with_error(format!(
            "{name}: more than 70 years since {text}"
        ));
    }
    ValidationResult::ok()
}

fn check_gender(name: &str, value: &Value) -> ValidationResult {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(UNKNOWN..=FEMALE) => ValidationResult::ok(),
        _ => ValidationResult::with_error(format!("{name}: expected 0, 1 or 2")),
    }
}

fn check_client_ids(name: &str, value: &Value) -> ValidationResult {
    let decoded;
    let resolved = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(v) => {
                decoded = v;
                &decoded
            }
            Err(err) => {
                return ValidationResult::with_error(format!("{name}: cannot decode JSON ({err})"));
            }
        },
        other => other,
    };
    let Some(items) = resolved.as_array() else {
        return ValidationResult::with_error(format!("{name}: expected a list of integers"));
    };
    if items.is_empty() {
        return ValidationResult::with_error(format!("{name}: field must not be empty"));
    }
    if !items.iter().all(|item| item.as_i64().is_some()) {
        return ValidationResult::with_error(format!("{name}: expected a list of integers"));
    }
    ValidationResult::ok()
}
