//! Direct evaluation of validator expressions against JSON values.
//!
//! Mirrors the emitted builtin runtime so a payload can be checked without a
//! JavaScript engine. JSON carries 64-bit integers as decimal strings (or
//! safe-integer numbers) and byte strings as arrays of octets.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use super::target::TsType;
use super::validator::{
    LengthCheck, NumberCheck, ObjectField, PayloadExpr, StringCheck, StringFormat, UnionExpr,
    ValidatorExpr,
};
use crate::ir::{Bound, Tagging};

/// Largest integer a JavaScript number holds exactly.
pub const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

/// Same expression as the emitted runtime's email check.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

const BIGINT_PATTERN: &str = r"^-?(0|[1-9][0-9]*)$";

/// Emitted types and validators of one run, by declaration name.
#[derive(Debug, Clone, Default)]
pub struct ShapeTable {
    pub types: BTreeMap<String, TsType>,
    pub validators: BTreeMap<String, ValidatorExpr>,
    /// Type parameters of generic declarations.
    pub params: BTreeMap<String, Vec<String>>,
}

/// One rejected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// `$` for the root, then `.field` and `[index]` segments.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ShapeTable {
    /// Validates `value` as an instance of the named declaration. Type
    /// parameters of a generic declaration accept any value.
    pub fn validate(&self, name: &str, value: &Value) -> Vec<ValidationIssue> {
        ValidatorExpr::Ref(name.to_string()).check(value, self)
    }

    fn params(&self, name: &str) -> &[String] {
        self.params.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

impl ValidatorExpr {
    /// Every issue the emitted validator would report for `value`.
    pub fn check(&self, value: &Value, table: &ShapeTable) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_at(value, table, "$", &mut issues);
        issues
    }

    /// Whether the emitted validator accepts `value`.
    pub fn accepts(&self, value: &Value, table: &ShapeTable) -> bool {
        self.check(value, table).is_empty()
    }

    fn check_at(&self, value: &Value, table: &ShapeTable, path: &str, issues: &mut Vec<ValidationIssue>) {
        match self {
            ValidatorExpr::Boolean => {
                if !value.is_boolean() {
                    issue(issues, path, "expected boolean".into());
                }
            }
            ValidatorExpr::Number(check) => {
                if let Some(message) = check_number(value, check) {
                    issue(issues, path, message);
                }
            }
            ValidatorExpr::BigInt(check) => match parse_bigint(value) {
                None => issue(issues, path, "expected an integer as bigint or decimal string".into()),
                Some(v) if v < check.min => issue(issues, path, format!("must be >= {}", check.min)),
                Some(v) if v > check.max => issue(issues, path, format!("must be <= {}", check.max)),
                Some(_) => {}
            },
            ValidatorExpr::String(check) => match value.as_str() {
                None => issue(issues, path, "expected string".into()),
                Some(s) => {
                    if let Some(message) = check_string(s, check) {
                        issue(issues, path, message);
                    }
                }
            },
            ValidatorExpr::Bytes(length) => {
                let octets = value.as_array().filter(|items| {
                    items.iter().all(|b| b.as_u64().is_some_and(|b| b <= 255))
                });
                match octets {
                    None => issue(issues, path, "expected Uint8Array or array of octets".into()),
                    Some(items) => {
                        if let Some(message) = check_length(items.len() as u64, length) {
                            issue(issues, path, message);
                        }
                    }
                }
            }
            ValidatorExpr::Unknown => {}
            ValidatorExpr::Literal(expected) => {
                if value.as_str() != Some(expected.as_str()) {
                    issue(issues, path, format!("expected \"{}\"", expected));
                }
            }
            ValidatorExpr::Array { items, length } => match value.as_array() {
                None => issue(issues, path, "expected array".into()),
                Some(values) => {
                    if let Some(message) = check_length(values.len() as u64, length) {
                        issue(issues, path, message);
                    }
                    for (i, item) in values.iter().enumerate() {
                        items.check_at(item, table, &format!("{}[{}]", path, i), issues);
                    }
                }
            },
            ValidatorExpr::Tuple(items) => match value.as_array() {
                Some(values) if values.len() == items.len() => {
                    for (i, (expr, item)) in items.iter().zip(values).enumerate() {
                        expr.check_at(item, table, &format!("{}[{}]", path, i), issues);
                    }
                }
                _ => issue(issues, path, format!("expected tuple of {} elements", items.len())),
            },
            ValidatorExpr::Nullable(inner) => {
                if !value.is_null() {
                    inner.check_at(value, table, path, issues);
                }
            }
            ValidatorExpr::Record(inner) => match value.as_object() {
                None => issue(issues, path, "expected object".into()),
                Some(map) => {
                    for (key, item) in map {
                        inner.check_at(item, table, &format!("{}.{}", path, key), issues);
                    }
                }
            },
            ValidatorExpr::Ref(name) => match table.validators.get(name) {
                Some(expr) => expr.check_at(value, table, path, issues),
                None => issue(issues, path, format!("unknown type '{}'", name)),
            },
            ValidatorExpr::Param(_) => {}
            ValidatorExpr::Apply { name, args } => match table.validators.get(name) {
                Some(expr) => expr.bind(table.params(name), args).check_at(value, table, path, issues),
                None => issue(issues, path, format!("unknown type '{}'", name)),
            },
            ValidatorExpr::Object(fields) => match value.as_object() {
                None => issue(issues, path, "expected object".into()),
                Some(map) => check_fields(fields, map, table, path, issues),
            },
            ValidatorExpr::Brand { inner, .. } => inner.check_at(value, table, path, issues),
            ValidatorExpr::Union(union) => check_union(union, value, table, path, issues),
        }
    }
}

fn issue(issues: &mut Vec<ValidationIssue>, path: &str, message: String) {
    issues.push(ValidationIssue {
        path: path.to_string(),
        message,
    });
}

fn check_fields(
    fields: &[ObjectField],
    map: &Map<String, Value>,
    table: &ShapeTable,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        match map.get(&field.name) {
            Some(v) => field.validator.check_at(v, table, &field_path, issues),
            None if field.optional => {}
            None => issues.push(ValidationIssue {
                path: field_path,
                message: "missing required field".into(),
            }),
        }
    }
}

fn check_payload(
    payload: &PayloadExpr,
    value: &Value,
    table: &ShapeTable,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match payload {
        PayloadExpr::Unit => {}
        PayloadExpr::Newtype(inner) => inner.check_at(value, table, path, issues),
        PayloadExpr::Tuple(items) => ValidatorExpr::Tuple(items.clone()).check_at(value, table, path, issues),
        PayloadExpr::Struct(fields) => match value.as_object() {
            Some(map) => check_fields(fields, map, table, path, issues),
            None => issues.push(ValidationIssue {
                path: path.to_string(),
                message: "expected object".into(),
            }),
        },
    }
}

fn check_union(union: &UnionExpr, value: &Value, table: &ShapeTable, path: &str, issues: &mut Vec<ValidationIssue>) {
    let variant_names = || {
        union
            .variants
            .iter()
            .map(|v| format!("\"{}\"", v.name))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    match &union.tagging {
        Tagging::External => {
            if let Some(name) = value.as_str() {
                let unit = union
                    .variants
                    .iter()
                    .any(|v| v.name == name && v.payload == PayloadExpr::Unit);
                if !unit {
                    issue(issues, path, format!("expected one of {}", variant_names()));
                }
                return;
            }
            let entry = value.as_object().filter(|m| m.len() == 1).and_then(|m| m.iter().next());
            let Some((key, inner)) = entry else {
                issue(issues, path, format!("expected one of {}", variant_names()));
                return;
            };
            match union
                .variants
                .iter()
                .find(|v| &v.name == key && v.payload != PayloadExpr::Unit)
            {
                Some(variant) => check_payload(&variant.payload, inner, table, &format!("{}.{}", path, key), issues),
                None => issue(issues, path, format!("unknown variant \"{}\"", key)),
            }
        }
        Tagging::Internal { tag } | Tagging::Adjacent { tag, .. } => {
            let Some(map) = value.as_object() else {
                issue(issues, path, "expected object".into());
                return;
            };
            let Some(name) = map.get(tag).and_then(Value::as_str) else {
                issue(issues, path, format!("expected \"{}\" to be one of {}", tag, variant_names()));
                return;
            };
            let Some(variant) = union.variants.iter().find(|v| v.name == name) else {
                issue(issues, path, format!("unknown variant \"{}\"", name));
                return;
            };

            match (&union.tagging, &variant.payload) {
                (_, PayloadExpr::Unit) => {}
                (Tagging::Adjacent { content, .. }, payload) => match map.get(content) {
                    Some(inner) => check_payload(payload, inner, table, &format!("{}.{}", path, content), issues),
                    None => issue(issues, path, format!("missing \"{}\"", content)),
                },
                (_, payload) => check_payload(payload, value, table, path, issues),
            }
        }
    }
}

fn check_number(value: &Value, check: &NumberCheck) -> Option<String> {
    let Value::Number(number) = value else {
        return Some("expected number".into());
    };
    let v = if let Some(i) = number.as_i64() {
        Bound::Int(i as i128)
    } else if let Some(u) = number.as_u64() {
        Bound::Int(u as i128)
    } else {
        Bound::Float(number.as_f64().unwrap_or(f64::NAN))
    };

    if let Bound::Float(f) = v {
        if !f.is_finite() {
            return Some("expected finite number".into());
        }
        if check.integer && f.fract() != 0.0 {
            return Some("expected integer".into());
        }
    }
    if let Some(min) = &check.min {
        if min.exceeds(&v) {
            return Some(format!("must be >= {}", min));
        }
    }
    if let Some(max) = &check.max {
        if v.exceeds(max) {
            return Some(format!("must be <= {}", max));
        }
    }
    None
}

fn check_string(s: &str, check: &StringCheck) -> Option<String> {
    // JavaScript string length counts UTF-16 code units.
    let len = s.encode_utf16().count() as u64;
    if let Some(message) = check_length(len, &check.length) {
        return Some(message);
    }
    if check.single_char && s.chars().count() != 1 {
        return Some("expected a single character".into());
    }
    for pattern in &check.patterns {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(s) => {}
            Ok(_) => return Some(format!("must match /{}/", pattern)),
            Err(_) => return Some(format!("pattern /{}/ cannot be evaluated", pattern)),
        }
    }
    for format in &check.formats {
        let ok = match format {
            StringFormat::Email => Regex::new(EMAIL_PATTERN).is_ok_and(|re| re.is_match(s)),
            StringFormat::Url => url::Url::parse(s).is_ok(),
        };
        if !ok {
            return Some(format!("expected {}", format.name()));
        }
    }
    None
}

fn check_length(len: u64, check: &LengthCheck) -> Option<String> {
    match (check.min, check.max) {
        (Some(min), _) if len < min => Some(format!("length must be >= {}", min)),
        (_, Some(max)) if len > max => Some(format!("length must be <= {}", max)),
        _ => None,
    }
}

/// Decodes the wire form of a 64-bit integer.
pub fn parse_bigint(value: &Value) -> Option<i128> {
    match value {
        Value::String(s) => {
            let canonical = Regex::new(BIGINT_PATTERN).is_ok_and(|re| re.is_match(s));
            if canonical {
                s.parse::<i128>().ok()
            } else {
                None
            }
        }
        Value::Number(n) => {
            let v = n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from))?;
            (v.abs() <= MAX_SAFE_INTEGER).then_some(v)
        }
        _ => None,
    }
}

pub fn is_bigint_wire(value: &Value) -> bool {
    parse_bigint(value).is_some()
}
