//! Request schemas and their cross-field invariants.
//!
//! Each request type declares its schema once as an ordered, static list of
//! `(name, FieldSpec)` pairs; per-request raw values stay in the incoming
//! JSON map. `parse` validates every declared field in declaration order,
//! applies the request's own invariant and only then builds the normalized
//! struct, so an `Ok` value is always fully validated.

use serde_json::{Map, Value};
use time::Date;

use crate::fields::{self, FieldKind, FieldSpec};
use crate::validation::ValidationResult;

/// Login that selects the admin authentication path and score override.
pub const ADMIN_LOGIN: &str = "admin";

/// Ordered, immutable field registry of a request type.
pub type Schema = &'static [(&'static str, FieldSpec)];

/// Validate every declared field of `schema` against `values`, aggregating
/// failures in declaration order. Keys not named by the schema are ignored.
pub fn validate_schema(schema: Schema, values: &Map<String, Value>) -> ValidationResult {
    let mut result = ValidationResult::ok();
    for (name, spec) in schema {
        result.merge(spec.validate(name, fields::resolve(values, name)));
    }
    result
}

/// Field names from `schema` carrying an informative value: present,
/// non-null and not one of the canonical empty forms. Note that the
/// integer `0` counts as supplied.
pub fn supplied_fields(schema: Schema, values: &Map<String, Value>) -> Vec<String> {
    schema
        .iter()
        .filter_map(|(name, _)| {
            fields::resolve(values, name)
                .filter(|value| !fields::is_empty_value(value))
                .map(|_| (*name).to_string())
        })
        .collect()
}

fn string_field(values: &Map<String, Value>, name: &str) -> Option<String> {
    fields::resolve(values, name).and_then(fields::coerce_string)
}

fn date_field(values: &Map<String, Value>, name: &str) -> Option<Date> {
    fields::resolve(values, name)
        .and_then(Value::as_str)
        .and_then(|text| fields::parse_date(text).ok())
}

fn object_field(values: &Map<String, Value>, name: &str) -> Option<Map<String, Value>> {
    match fields::resolve(values, name)? {
        Value::Object(map) => Some(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// The top-level envelope: account/login/token/arguments/method.
#[derive(Debug, Clone)]
pub struct MethodRequest {
    pub account: Option<String>,
    pub login: String,
    pub token: String,
    pub arguments: Map<String, Value>,
    pub method: String,
}

impl MethodRequest {
    pub const SCHEMA: Schema = &[
        ("account", FieldSpec::new(FieldKind::Char, false, true)),
        ("login", FieldSpec::new(FieldKind::Char, true, true)),
        ("token", FieldSpec::new(FieldKind::Char, true, true)),
        ("arguments", FieldSpec::new(FieldKind::Arguments, true, true)),
        ("method", FieldSpec::new(FieldKind::Char, true, false)),
    ];

    pub fn parse(body: &Value) -> Result<Self, ValidationResult> {
        let Some(values) = body.as_object() else {
            return Err(ValidationResult::with_error(
                "request body must be a JSON object",
            ));
        };
        let result = validate_schema(Self::SCHEMA, values);
        if !result.is_valid() {
            return Err(result);
        }
        Ok(Self {
            account: string_field(values, "account"),
            login: string_field(values, "login").unwrap_or_default(),
            token: string_field(values, "token").unwrap_or_default(),
            arguments: object_field(values, "arguments").unwrap_or_default(),
            method: string_field(values, "method").unwrap_or_default(),
        })
    }

    /// Derived, never stored.
    pub fn is_admin(&self) -> bool {
        self.login == ADMIN_LOGIN
    }
}

/// Arguments of the `online_score` method.
#[derive(Debug, Clone)]
pub struct OnlineScoreRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<Date>,
    pub gender: Option<i64>,
    supplied: Vec<String>,
}

impl OnlineScoreRequest {
    pub const SCHEMA: Schema = &[
        ("first_name", FieldSpec::new(FieldKind::Char, false, true)),
        ("last_name", FieldSpec::new(FieldKind::Char, false, true)),
        ("email", FieldSpec::new(FieldKind::Email, false, true)),
        ("phone", FieldSpec::new(FieldKind::Phone, false, true)),
        ("birthday", FieldSpec::new(FieldKind::BirthDay, false, true)),
        ("gender", FieldSpec::new(FieldKind::Gender, false, true)),
    ];

    pub fn parse(values: &Map<String, Value>) -> Result<Self, ValidationResult> {
        let mut result = validate_schema(Self::SCHEMA, values);
        let supplied = supplied_fields(Self::SCHEMA, values);
        if !has_informative_pair(&supplied) {
            result.append(
                "at least one pair of phone-email, first_name-last_name \
                 or gender-birthday must be supplied",
            );
        }
        if !result.is_valid() {
            return Err(result);
        }
        Ok(Self {
            first_name: string_field(values, "first_name"),
            last_name: string_field(values, "last_name"),
            email: string_field(values, "email"),
            phone: phone_field(values),
            birthday: date_field(values, "birthday"),
            gender: gender_field(values),
            supplied,
        })
    }

    /// Names of the fields that were actually supplied, in schema order.
    pub fn supplied(&self) -> &[String] {
        &self.supplied
    }
}

fn has_informative_pair(supplied: &[String]) -> bool {
    let has = |name: &str| supplied.iter().any(|s| s == name);
    (has("phone") && has("email"))
        || (has("first_name") && has("last_name"))
        || (has("gender") && has("birthday"))
}

fn phone_field(values: &Map<String, Value>) -> Option<String> {
    match fields::resolve(values, "phone")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_i64().map(|v| v.to_string()),
        _ => None,
    }
}

fn gender_field(values: &Map<String, Value>) -> Option<i64> {
    match fields::resolve(values, "gender")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Arguments of the `clients_interests` method.
#[derive(Debug, Clone)]
pub struct ClientsInterestsRequest {
    pub client_ids: Vec<i64>,
    pub date: Option<Date>,
}

impl ClientsInterestsRequest {
    pub const SCHEMA: Schema = &[
        ("client_ids", FieldSpec::new(FieldKind::ClientIds, true, false)),
        ("date", FieldSpec::new(FieldKind::Date, false, true)),
    ];

    pub fn parse(values: &Map<String, Value>) -> Result<Self, ValidationResult> {
        let result = validate_schema(Self::SCHEMA, values);
        if !result.is_valid() {
            return Err(result);
        }
        Ok(Self {
            client_ids: client_ids_field(values),
            date: date_field(values, "date"),
        })
    }
}

fn client_ids_field(values: &Map<String, Value>) -> Vec<i64> {
    let decoded;
    let resolved = match fields::resolve(values, "client_ids") {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(v) => {
                decoded = v;
                &decoded
            }
            Err(_) => return Vec::new(),
        },
        Some(other) => other,
        None => return Vec::new(),
    };
    resolved
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}
