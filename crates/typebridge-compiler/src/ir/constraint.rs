//! Value-domain constraints.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A declared value-domain restriction on a field or newtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum ValueConstraint {
    /// Inclusive numeric range.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<Bound>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<Bound>,
    },
    /// Inclusive length range (UTF-16 code units for strings, elements for
    /// sequences, bytes for byte strings).
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u64>,
    },
    /// ECMAScript-compatible regular expression, matched unanchored.
    Pattern { regex: String },
    Email,
    Url,
}

impl ValueConstraint {
    pub fn range(min: Option<Bound>, max: Option<Bound>) -> Self {
        ValueConstraint::Range { min, max }
    }

    pub fn length(min: Option<u64>, max: Option<u64>) -> Self {
        ValueConstraint::Length { min, max }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        ValueConstraint::Pattern { regex: regex.into() }
    }

    /// Short name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueConstraint::Range { .. } => "range",
            ValueConstraint::Length { .. } => "length",
            ValueConstraint::Pattern { .. } => "pattern",
            ValueConstraint::Email => "email",
            ValueConstraint::Url => "url",
        }
    }
}

impl fmt::Display for ValueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map(|v| v.to_string()).unwrap_or_default()
        }

        match self {
            ValueConstraint::Range { min, max } => write!(f, "range({}..={})", side(min), side(max)),
            ValueConstraint::Length { min, max } => write!(f, "length({}..={})", side(min), side(max)),
            ValueConstraint::Pattern { regex } => write!(f, "pattern(/{}/)", regex),
            ValueConstraint::Email => f.write_str("email"),
            ValueConstraint::Url => f.write_str("url"),
        }
    }
}

/// An exact numeric bound.
///
/// Integers keep full 128-bit precision so 64-bit limits survive the trip
/// into the emitted `bigint` literals. Bounds that do not fit in a JSON
/// integer are serialized as decimal strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Int(i128),
    Float(f64),
}

impl Bound {
    pub fn is_fractional(&self) -> bool {
        matches!(self, Bound::Float(v) if v.fract() != 0.0)
    }

    /// The bound as an exact integer, if it is one.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Bound::Int(v) => Some(v),
            Bound::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1.7e38 => Some(v as i128),
            Bound::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Bound::Int(v) => v as f64,
            Bound::Float(v) => v,
        }
    }

    /// Numeric comparison across both representations.
    pub fn exceeds(&self, other: &Bound) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a > b,
            _ => self.as_f64() > other.as_f64(),
        }
    }
}

impl From<i64> for Bound {
    fn from(v: i64) -> Self {
        Bound::Int(v as i128)
    }
}

impl From<u64> for Bound {
    fn from(v: u64) -> Self {
        Bound::Int(v as i128)
    }
}

impl From<i128> for Bound {
    fn from(v: i128) -> Self {
        Bound::Int(v)
    }
}

impl From<f64> for Bound {
    fn from(v: f64) -> Self {
        Bound::Float(v)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Int(v) => write!(f, "{}", v),
            Bound::Float(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Bound::Int(v) => {
                if let Ok(small) = i64::try_from(v) {
                    serializer.serialize_i64(small)
                } else if let Ok(unsigned) = u64::try_from(v) {
                    serializer.serialize_u64(unsigned)
                } else {
                    serializer.serialize_str(&v.to_string())
                }
            }
            Bound::Float(v) => serializer.serialize_f64(v),
        }
    }
}

impl<'de> Deserialize<'de> for Bound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BoundVisitor;

        impl<'de> Visitor<'de> for BoundVisitor {
            type Value = Bound;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or a decimal integer string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bound, E> {
                Ok(Bound::Int(v as i128))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bound, E> {
                Ok(Bound::Int(v as i128))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<Bound, E> {
                Ok(Bound::Int(v))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Bound, E> {
                i128::try_from(v)
                    .map(Bound::Int)
                    .map_err(|_| E::custom("bound exceeds i128"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Bound, E> {
                if v.is_finite() {
                    Ok(Bound::Float(v))
                } else {
                    Err(E::custom("bound must be finite"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Bound, E> {
                v.trim()
                    .parse::<i128>()
                    .map(Bound::Int)
                    .map_err(|_| E::custom(format!("invalid integer bound '{}'", v)))
            }
        }

        deserializer.deserialize_any(BoundVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_serialization_keeps_precision() {
        let max = Bound::from(u64::MAX);
        assert_eq!(serde_json::to_string(&max).unwrap(), "18446744073709551615");

        let huge = Bound::Int(i128::MAX);
        let json = serde_json::to_string(&huge).unwrap();
        assert_eq!(json, format!("\"{}\"", i128::MAX));
        assert_eq!(serde_json::from_str::<Bound>(&json).unwrap(), huge);

        let neg: Bound = serde_json::from_str("-9223372036854775808").unwrap();
        assert_eq!(neg, Bound::Int(i64::MIN as i128));
    }

    #[test]
    fn test_bound_float() {
        let b: Bound = serde_json::from_str("1.5").unwrap();
        assert_eq!(b, Bound::Float(1.5));
        assert!(b.is_fractional());
        assert_eq!(Bound::Float(3.0).as_integer(), Some(3));
    }

    #[test]
    fn test_exceeds() {
        assert!(Bound::Int(101).exceeds(&Bound::Int(100)));
        assert!(!Bound::Int(1).exceeds(&Bound::Float(1.5)));
        assert!(Bound::Float(2.5).exceeds(&Bound::Int(2)));
    }

    #[test]
    fn test_constraint_json() {
        let c = ValueConstraint::range(Some(Bound::Int(1)), Some(Bound::Int(100)));
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"constraint":"range","min":1,"max":100}"#);
        assert_eq!(serde_json::from_str::<ValueConstraint>(&json).unwrap(), c);

        let email: ValueConstraint = serde_json::from_str(r#"{"constraint":"email"}"#).unwrap();
        assert_eq!(email, ValueConstraint::Email);
    }
}
