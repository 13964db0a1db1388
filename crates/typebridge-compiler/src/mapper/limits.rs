//! Representable ranges of the target types.

use crate::diagnostic::GeneratorError;
use crate::ir::{Bound, Primitive};

use super::check::MAX_SAFE_INTEGER;

/// Inclusive range of an integer of the given width.
pub fn integer_range(signed: bool, bits: u16) -> (i128, i128) {
    if signed {
        let half = 1i128 << (bits - 1);
        (-half, half - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

/// Checks a declared integer bound and returns it as an exact integer.
pub fn integer_bound(
    bound: &Bound,
    primitive: Primitive,
    (lo, hi): (i128, i128),
    side: &str,
    location: &str,
) -> Result<i128, GeneratorError> {
    let unrepresentable = |reason: &str| GeneratorError::UnrepresentableConstraint {
        location: location.to_string(),
        constraint: format!("{} = {}", side, bound),
        target: format!("{} ({}..={}){}", primitive, lo, hi, reason),
    };

    if bound.is_fractional() {
        return Err(unrepresentable(", which holds integers only"));
    }
    match bound.as_integer() {
        Some(v) if v >= lo && v <= hi => Ok(v),
        _ => Err(unrepresentable("")),
    }
}

/// Checks a declared float bound.
pub fn float_bound(bound: &Bound, bits: u16, side: &str, location: &str) -> Result<Bound, GeneratorError> {
    let unrepresentable = |target: String| GeneratorError::UnrepresentableConstraint {
        location: location.to_string(),
        constraint: format!("{} = {}", side, bound),
        target,
    };

    match *bound {
        Bound::Int(v) if v.abs() > MAX_SAFE_INTEGER => Err(unrepresentable(format!(
            "f{} (integers beyond 2^53 are not exact)",
            bits
        ))),
        Bound::Float(v) if !v.is_finite() => Err(unrepresentable(format!("f{}", bits))),
        _ if bits == 32 && bound.as_f64().abs() > f32::MAX as f64 => {
            Err(unrepresentable("f32 (beyond f32::MAX)".to_string()))
        }
        _ => Ok(*bound),
    }
}

/// Checks a declared length bound.
pub fn length_bound(value: u64, side: &str, location: &str) -> Result<u64, GeneratorError> {
    if value as i128 > MAX_SAFE_INTEGER {
        return Err(GeneratorError::UnrepresentableConstraint {
            location: location.to_string(),
            constraint: format!("length {} = {}", side, value),
            target: "length (at most 2^53 - 1)".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range() {
        assert_eq!(integer_range(false, 8), (0, 255));
        assert_eq!(integer_range(true, 8), (-128, 127));
        assert_eq!(integer_range(false, 64), (0, u64::MAX as i128));
        assert_eq!(integer_range(true, 64), (i64::MIN as i128, i64::MAX as i128));
    }

    #[test]
    fn test_integer_bound() {
        let range = integer_range(false, 8);
        assert_eq!(integer_bound(&Bound::Int(255), Primitive::U8, range, "max", "T.x").unwrap(), 255);
        assert_eq!(integer_bound(&Bound::Float(3.0), Primitive::U8, range, "max", "T.x").unwrap(), 3);

        let err = integer_bound(&Bound::Int(300), Primitive::U8, range, "max", "T.x").unwrap_err();
        assert!(matches!(err, GeneratorError::UnrepresentableConstraint { .. }));
        assert!(err.to_string().contains("max = 300"));

        let err = integer_bound(&Bound::Float(1.5), Primitive::U8, range, "min", "T.x").unwrap_err();
        assert!(err.to_string().contains("u8"));
    }

    #[test]
    fn test_float_bound() {
        assert!(float_bound(&Bound::Int(1 << 53), 64, "max", "T.x").is_err());
        assert!(float_bound(&Bound::Int((1 << 53) - 1), 64, "max", "T.x").is_ok());
        assert!(float_bound(&Bound::Float(1e39), 32, "max", "T.x").is_err());
        assert!(float_bound(&Bound::Float(1e39), 64, "max", "T.x").is_ok());
    }

    #[test]
    fn test_length_bound() {
        assert!(length_bound(20, "max", "T.x").is_ok());
        assert!(length_bound(u64::MAX, "max", "T.x").is_err());
    }
}
