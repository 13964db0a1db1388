//! Type mapping: IR type references to TypeScript types plus validators.
//!
//! The mapper owns all knowledge of the target's numeric ranges, so every
//! constraint applicability and representability check lives here.
//!
//! | Source          | Target                | Validator                          |
//! |-----------------|-----------------------|------------------------------------|
//! | bool            | `boolean`             | boolean                            |
//! | int <= 32 bits  | `number`              | finite integer within width        |
//! | int 64 bits     | `bigint`              | bigint or decimal string in width  |
//! | f32 / f64       | `number`              | finite number                      |
//! | string          | `string`              | string, length, pattern, format    |
//! | char            | `string`              | exactly one code point             |
//! | bytes           | `Uint8Array`          | octets, length                     |
//! | `Sequence(T)`   | `T[]`                 | element-wise, length               |
//! | `Optional(T)`   | `T \| null`           | null or T                          |
//! | `Map(T)`        | `Record<string, T>`   | value-wise                         |
//! | `Tuple(A, B)`   | `[A, B]`              | fixed length, element-wise         |
//! | `Named(N)`      | `N`                   | delegates to N's validator         |
//! | `Generic(N, A)` | `N<A>`                | N's validator factory applied to A |
//! | `Param(T)`      | `T`                   | the validator passed for T         |
//! | opaque          | `unknown`             | anything                           |

mod check;
mod limits;
mod target;
mod validator;

pub use check::{is_bigint_wire, parse_bigint, ShapeTable, ValidationIssue, EMAIL_PATTERN, MAX_SAFE_INTEGER};
pub use limits::integer_range;
pub use target::{is_identifier, property_key, string_literal, TsProperty, TsType};
pub use validator::{
    BigIntCheck, LengthCheck, NumberCheck, ObjectField, PayloadExpr, StringCheck, StringFormat,
    UnionExpr, ValidatorExpr, VariantExpr,
};

use crate::diagnostic::GeneratorError;
use crate::ir::{Bound, Primitive, TypeRef, ValueConstraint};

/// A mapped type reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped {
    pub target: TsType,
    pub validator: ValidatorExpr,
}

/// Maps an unconstrained type reference.
pub fn map(type_ref: &TypeRef) -> Result<Mapped, GeneratorError> {
    map_constrained(type_ref, &[], "<type>")
}

/// Maps a type reference carrying constraints. `location` names the field
/// or newtype in diagnostics (e.g. `User.age`).
///
/// Constraints apply to the value type: a top-level `Optional(T)` is
/// unwrapped first and the result is made nullable.
pub fn map_constrained(
    type_ref: &TypeRef,
    constraints: &[ValueConstraint],
    location: &str,
) -> Result<Mapped, GeneratorError> {
    if let TypeRef::Optional(inner) = type_ref {
        let mapped = map_constrained(inner, constraints, location)?;
        return Ok(nullable(mapped));
    }

    let merged = Merged::new(constraints, location)?;
    map_value(type_ref, &merged, location)
}

/// `T | null`, unless already nullable.
pub fn nullable(mapped: Mapped) -> Mapped {
    // Optional(Optional(T)) has the same wire form as Optional(T).
    if matches!(mapped.target, TsType::Nullable(_)) {
        return mapped;
    }
    Mapped {
        target: TsType::nullable(mapped.target),
        validator: ValidatorExpr::nullable(mapped.validator),
    }
}

fn map_value(type_ref: &TypeRef, merged: &Merged, location: &str) -> Result<Mapped, GeneratorError> {
    match type_ref {
        TypeRef::Primitive(primitive) => map_primitive(*primitive, merged, location),
        TypeRef::Named(name) => {
            merged.allow(&[], &format!("type '{}'", name), location)?;
            Ok(Mapped {
                target: TsType::Named(name.clone()),
                validator: ValidatorExpr::Ref(name.clone()),
            })
        }
        TypeRef::Sequence(inner) => {
            merged.allow(&["length"], "a sequence", location)?;
            let item = map_constrained(inner, &[], &format!("{}[]", location))?;
            Ok(Mapped {
                target: TsType::array(item.target),
                validator: ValidatorExpr::Array {
                    items: Box::new(item.validator),
                    length: merged.length,
                },
            })
        }
        TypeRef::Map(inner) => {
            merged.allow(&[], "a map", location)?;
            let value = map_constrained(inner, &[], &format!("{}{{}}", location))?;
            Ok(Mapped {
                target: TsType::Record(Box::new(value.target)),
                validator: ValidatorExpr::Record(Box::new(value.validator)),
            })
        }
        TypeRef::Tuple(items) => {
            merged.allow(&[], "a tuple", location)?;
            if items.is_empty() {
                return Err(GeneratorError::invalid(location, "empty tuples have no wire shape"));
            }
            let items = map_all(items, location)?;
            Ok(Mapped {
                target: TsType::Tuple(items.iter().map(|m| m.target.clone()).collect()),
                validator: ValidatorExpr::Tuple(items.into_iter().map(|m| m.validator).collect()),
            })
        }
        TypeRef::Param(name) => {
            merged.allow(&[], &format!("type parameter '{}'", name), location)?;
            Ok(Mapped {
                target: TsType::Param(name.clone()),
                validator: ValidatorExpr::Param(name.clone()),
            })
        }
        TypeRef::Generic { name, args } => {
            merged.allow(&[], &format!("type '{}'", name), location)?;
            let args = map_all(args, location)?;
            Ok(Mapped {
                target: TsType::Generic {
                    name: name.clone(),
                    args: args.iter().map(|m| m.target.clone()).collect(),
                },
                validator: ValidatorExpr::Apply {
                    name: name.clone(),
                    args: args.into_iter().map(|m| m.validator).collect(),
                },
            })
        }
        TypeRef::Optional(_) => map_constrained(type_ref, &[], location),
        TypeRef::Opaque => {
            merged.allow(&[], "an opaque value", location)?;
            Ok(Mapped {
                target: TsType::Unknown,
                validator: ValidatorExpr::Unknown,
            })
        }
    }
}

/// Maps tuple elements or type arguments; `location.0`, `location.1`, ...
fn map_all(items: &[TypeRef], location: &str) -> Result<Vec<Mapped>, GeneratorError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| map_constrained(item, &[], &format!("{}.{}", location, i)))
        .collect()
}

fn map_primitive(primitive: Primitive, merged: &Merged, location: &str) -> Result<Mapped, GeneratorError> {
    let on = format!("{}", primitive);
    match primitive {
        Primitive::Bool => {
            merged.allow(&[], &on, location)?;
            Ok(Mapped {
                target: TsType::Boolean,
                validator: ValidatorExpr::Boolean,
            })
        }
        Primitive::Int { signed, bits } => {
            if !matches!(bits, 8 | 16 | 32 | 64) {
                return Err(GeneratorError::UnsupportedPrimitive {
                    location: location.to_string(),
                    primitive: on,
                });
            }
            merged.allow(&["range"], &on, location)?;

            let range = integer_range(signed, bits);
            let min = match &merged.min {
                Some(b) => limits::integer_bound(b, primitive, range, "min", location)?,
                None => range.0,
            };
            let max = match &merged.max {
                Some(b) => limits::integer_bound(b, primitive, range, "max", location)?,
                None => range.1,
            };

            if bits == 64 {
                Ok(Mapped {
                    target: TsType::BigInt,
                    validator: ValidatorExpr::BigInt(BigIntCheck { min, max }),
                })
            } else {
                Ok(Mapped {
                    target: TsType::Number,
                    validator: ValidatorExpr::Number(NumberCheck {
                        integer: true,
                        min: Some(Bound::Int(min)),
                        max: Some(Bound::Int(max)),
                    }),
                })
            }
        }
        Primitive::Float { bits } => {
            if !matches!(bits, 32 | 64) {
                return Err(GeneratorError::UnsupportedPrimitive {
                    location: location.to_string(),
                    primitive: on,
                });
            }
            merged.allow(&["range"], &on, location)?;
            let min = merged
                .min
                .as_ref()
                .map(|b| limits::float_bound(b, bits, "min", location))
                .transpose()?;
            let max = merged
                .max
                .as_ref()
                .map(|b| limits::float_bound(b, bits, "max", location))
                .transpose()?;
            Ok(Mapped {
                target: TsType::Number,
                validator: ValidatorExpr::Number(NumberCheck {
                    integer: false,
                    min,
                    max,
                }),
            })
        }
        Primitive::String => {
            merged.allow(&["length", "pattern", "email", "url"], &on, location)?;
            Ok(Mapped {
                target: TsType::String,
                validator: ValidatorExpr::String(StringCheck {
                    length: merged.length,
                    patterns: merged.patterns.clone(),
                    formats: merged.formats.clone(),
                    single_char: false,
                }),
            })
        }
        Primitive::Char => {
            merged.allow(&["pattern"], &on, location)?;
            Ok(Mapped {
                target: TsType::String,
                validator: ValidatorExpr::String(StringCheck {
                    patterns: merged.patterns.clone(),
                    single_char: true,
                    ..StringCheck::default()
                }),
            })
        }
        Primitive::Bytes => {
            merged.allow(&["length"], &on, location)?;
            Ok(Mapped {
                target: TsType::Uint8Array,
                validator: ValidatorExpr::Bytes(merged.length),
            })
        }
    }
}

/// Constraints of one field, intersected per kind.
#[derive(Debug, Default)]
struct Merged {
    kinds: Vec<&'static str>,
    min: Option<Bound>,
    max: Option<Bound>,
    length: LengthCheck,
    patterns: Vec<String>,
    formats: Vec<StringFormat>,
}

impl Merged {
    fn new(constraints: &[ValueConstraint], location: &str) -> Result<Self, GeneratorError> {
        let mut merged = Merged::default();

        for constraint in constraints {
            let kind = constraint.kind_name();
            if !merged.kinds.contains(&kind) {
                merged.kinds.push(kind);
            }

            match constraint {
                ValueConstraint::Range { min, max } => {
                    if let Some(min) = min {
                        if merged.min.map_or(true, |cur| min.exceeds(&cur)) {
                            merged.min = Some(*min);
                        }
                    }
                    if let Some(max) = max {
                        if merged.max.map_or(true, |cur| cur.exceeds(max)) {
                            merged.max = Some(*max);
                        }
                    }
                }
                ValueConstraint::Length { min, max } => {
                    if let Some(min) = min {
                        let min = limits::length_bound(*min, "min", location)?;
                        merged.length.min = Some(merged.length.min.map_or(min, |cur| cur.max(min)));
                    }
                    if let Some(max) = max {
                        let max = limits::length_bound(*max, "max", location)?;
                        merged.length.max = Some(merged.length.max.map_or(max, |cur| cur.min(max)));
                    }
                }
                ValueConstraint::Pattern { regex } => {
                    if !merged.patterns.contains(regex) {
                        merged.patterns.push(regex.clone());
                    }
                }
                ValueConstraint::Email => {
                    if !merged.formats.contains(&StringFormat::Email) {
                        merged.formats.push(StringFormat::Email);
                    }
                }
                ValueConstraint::Url => {
                    if !merged.formats.contains(&StringFormat::Url) {
                        merged.formats.push(StringFormat::Url);
                    }
                }
            }
        }

        if let (Some(min), Some(max)) = (&merged.min, &merged.max) {
            if min.exceeds(max) {
                return Err(GeneratorError::invalid(
                    location,
                    format!("range minimum {} exceeds maximum {}", min, max),
                ));
            }
        }
        if let (Some(min), Some(max)) = (merged.length.min, merged.length.max) {
            if min > max {
                return Err(GeneratorError::invalid(
                    location,
                    format!("length minimum {} exceeds maximum {}", min, max),
                ));
            }
        }

        Ok(merged)
    }

    /// Rejects constraint kinds that cannot apply to the mapped type.
    fn allow(&self, allowed: &[&str], on: &str, location: &str) -> Result<(), GeneratorError> {
        match self.kinds.iter().find(|k| !allowed.contains(k)) {
            Some(kind) => Err(GeneratorError::invalid(
                location,
                format!("{} constraint cannot apply to {}", kind, on),
            )),
            None => Ok(()),
        }
    }
}
