//! Validators as zod schemas.

use super::{block, factory_params, pad, signature, Dialect, RUNTIME_MODULE};
use crate::emit::runtime;
use crate::ir::Tagging;
use crate::mapper::{
    string_literal, LengthCheck, ObjectField, PayloadExpr, StringFormat, UnionExpr, ValidatorExpr, EMAIL_PATTERN,
};

/// Accepts the three wire forms of a 64-bit integer and decodes to bigint.
const BIGINT_INPUT: &str = "z.union([z.bigint(), z.string().regex(/^-?(0|[1-9][0-9]*)$/), z.number().int().safe()]).transform((value) => BigInt(value))";

/// Accepts a Uint8Array or an array of octets and yields a Uint8Array.
const BYTES_INPUT: &str = "z.union([z.instanceof(Uint8Array), z.array(z.number().int().min(0).max(255)).transform((octets) => Uint8Array.from(octets))])";

pub struct ZodDialect;

pub static ZOD: ZodDialect = ZodDialect;

impl Dialect for ZodDialect {
    fn name(&self) -> &'static str {
        "zod"
    }

    fn validator_name(&self, type_name: &str) -> String {
        format!("{}Schema", type_name)
    }

    fn imports(&self, brand: bool) -> Vec<String> {
        let mut lines = vec!["import { z } from 'zod';".to_string()];
        if brand {
            lines.push(format!("import type {{ Brand }} from '{}';", RUNTIME_MODULE));
        }
        lines
    }

    fn expr(&self, expr: &ValidatorExpr, indent: usize) -> String {
        match expr {
            ValidatorExpr::Boolean => "z.boolean()".to_string(),
            ValidatorExpr::Number(check) => {
                let mut out = String::from("z.number()");
                out.push_str(if check.integer { ".int()" } else { ".finite()" });
                if let Some(min) = check.min {
                    out.push_str(&format!(".min({})", min));
                }
                if let Some(max) = check.max {
                    out.push_str(&format!(".max({})", max));
                }
                out
            }
            ValidatorExpr::BigInt(check) => format!(
                "{}.pipe(z.bigint().min({}n).max({}n))",
                BIGINT_INPUT, check.min, check.max
            ),
            ValidatorExpr::String(check) => {
                let mut out = format!("z.string(){}", length_methods(&check.length));
                for pattern in &check.patterns {
                    out.push_str(&format!(".regex(new RegExp({}))", string_literal(pattern)));
                }
                for format in &check.formats {
                    match format {
                        StringFormat::Email => out.push_str(&format!(
                            ".regex(new RegExp({}), {{ message: \"expected email\" }})",
                            string_literal(EMAIL_PATTERN)
                        )),
                        StringFormat::Url => out.push_str(".url()"),
                    }
                }
                if check.single_char {
                    out.push_str(".refine((s) => [...s].length === 1, { message: \"expected a single character\" })");
                }
                out
            }
            ValidatorExpr::Bytes(length) => {
                let mut out = BYTES_INPUT.to_string();
                if let Some(min) = length.min {
                    out.push_str(&format!(
                        ".refine((bytes) => bytes.length >= {0}, {{ message: \"length must be >= {0}\" }})",
                        min
                    ));
                }
                if let Some(max) = length.max {
                    out.push_str(&format!(
                        ".refine((bytes) => bytes.length <= {0}, {{ message: \"length must be <= {0}\" }})",
                        max
                    ));
                }
                out
            }
            ValidatorExpr::Unknown => "z.unknown()".to_string(),
            ValidatorExpr::Literal(value) => format!("z.literal({})", string_literal(value)),
            ValidatorExpr::Array { items, length } => {
                format!("z.array({}){}", self.expr(items, indent), length_methods(length))
            }
            ValidatorExpr::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|i| self.expr(i, indent)).collect();
                format!("z.tuple([{}])", items.join(", "))
            }
            ValidatorExpr::Nullable(inner) => format!("{}.nullable()", self.expr(inner, indent)),
            ValidatorExpr::Record(inner) => format!("z.record(z.string(), {})", self.expr(inner, indent)),
            ValidatorExpr::Ref(name) | ValidatorExpr::Param(name) => self.validator_name(name),
            ValidatorExpr::Apply { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a, indent)).collect();
                format!("{}({})", self.validator_name(name), args.join(", "))
            }
            ValidatorExpr::Object(fields) => self.object(&[], fields, indent),
            ValidatorExpr::Brand { inner, name } => format!("{}.transform({})", self.expr(inner, indent), name),
            ValidatorExpr::Union(union) => self.union(union, indent),
        }
    }

    fn declaration(&self, type_name: &str, params: &[String], expr: &ValidatorExpr) -> String {
        if params.is_empty() {
            return format!(
                "export const {}: {} = {};\n",
                self.validator_name(type_name),
                schema_type(type_name),
                self.expr(expr, 0)
            );
        }
        format!(
            "export const {} = {}: {} => {};\n",
            self.validator_name(type_name),
            factory_params(self, params, schema_type),
            schema_type(&signature(type_name, params)),
            self.expr(expr, 0)
        )
    }

    fn runtime(&self) -> &'static str {
        runtime::BRAND
    }
}

impl ZodDialect {
    /// `z.object({...})` with `leading` entries (tag literals) before the fields.
    fn object(&self, leading: &[(String, String)], fields: &[ObjectField], indent: usize) -> String {
        let mut entries: Vec<(String, String)> = leading.to_vec();
        entries.extend(fields.iter().map(|field| {
            let value = self.expr(&field.validator, indent + 1);
            let value = if field.optional {
                format!("{}.optional()", value)
            } else {
                value
            };
            (field.name.clone(), value)
        }));
        format!("z.object({})", block(entries, indent))
    }

    fn union(&self, union: &UnionExpr, indent: usize) -> String {
        let inner = indent + 1;

        match &union.tagging {
            Tagging::External => {
                // A lone member is emitted without the surrounding union.
                let level = if union.variants.len() == 1 { indent } else { inner };
                let members: Vec<String> = union
                    .variants
                    .iter()
                    .map(|variant| match &variant.payload {
                        PayloadExpr::Unit => format!("z.literal({})", string_literal(&variant.name)),
                        payload => {
                            let value = self.payload(payload, level + 1);
                            format!(
                                "z.object({}).strict()",
                                block(vec![(variant.name.clone(), value)], level)
                            )
                        }
                    })
                    .collect();
                match <[String; 1]>::try_from(members) {
                    Ok([single]) => single,
                    Err(members) => format!("z.union({})", list(members, indent)),
                }
            }
            Tagging::Internal { tag } => {
                let members = union
                    .variants
                    .iter()
                    .map(|variant| {
                        let leading = [(tag.clone(), format!("z.literal({})", string_literal(&variant.name)))];
                        match &variant.payload {
                            PayloadExpr::Struct(fields) => self.object(&leading, fields, inner),
                            _ => self.object(&leading, &[], inner),
                        }
                    })
                    .collect();
                format!("z.discriminatedUnion({}, {})", string_literal(tag), list(members, indent))
            }
            Tagging::Adjacent { tag, content } => {
                let members = union
                    .variants
                    .iter()
                    .map(|variant| {
                        let mut entries = vec![(tag.clone(), format!("z.literal({})", string_literal(&variant.name)))];
                        if variant.payload != PayloadExpr::Unit {
                            entries.push((content.clone(), self.payload(&variant.payload, inner + 1)));
                        }
                        format!("z.object({})", block(entries, inner))
                    })
                    .collect();
                format!("z.discriminatedUnion({}, {})", string_literal(tag), list(members, indent))
            }
        }
    }

    fn payload(&self, payload: &PayloadExpr, indent: usize) -> String {
        match payload {
            PayloadExpr::Unit => "z.null()".to_string(),
            PayloadExpr::Newtype(inner) => self.expr(inner, indent),
            PayloadExpr::Tuple(items) => self.expr(&ValidatorExpr::Tuple(items.clone()), indent),
            PayloadExpr::Struct(fields) => self.object(&[], fields, indent),
        }
    }
}

/// Schema type decoding unknown input to `ty`.
fn schema_type(ty: &str) -> String {
    format!("z.ZodType<{}, z.ZodTypeDef, unknown>", ty)
}

fn length_methods(length: &LengthCheck) -> String {
    let mut out = String::new();
    if let Some(min) = length.min {
        out.push_str(&format!(".min({})", min));
    }
    if let Some(max) = length.max {
        out.push_str(&format!(".max({})", max));
    }
    out
}

/// `[a, b]` with one member per line.
fn list(items: Vec<String>, indent: usize) -> String {
    let mut out = String::from("[\n");
    for item in items {
        out.push_str(&format!("{}{},\n", pad(indent + 1), item));
    }
    out.push_str(&pad(indent));
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Bound;
    use crate::mapper::{BigIntCheck, NumberCheck, StringCheck, VariantExpr};

    #[test]
    fn test_number_and_bigint() {
        assert_eq!(
            ZOD.expr(
                &ValidatorExpr::Number(NumberCheck {
                    integer: true,
                    min: Some(Bound::Int(1)),
                    max: Some(Bound::Int(100)),
                }),
                0
            ),
            "z.number().int().min(1).max(100)"
        );
        let bigint = ZOD.expr(&ValidatorExpr::BigInt(BigIntCheck { min: 0, max: u64::MAX as i128 }), 0);
        assert!(bigint.starts_with("z.union([z.bigint()"));
        assert!(bigint.ends_with(".pipe(z.bigint().min(0n).max(18446744073709551615n))"));
    }

    #[test]
    fn test_optional_field() {
        let expr = ValidatorExpr::Object(vec![ObjectField {
            name: "age".into(),
            optional: true,
            validator: ValidatorExpr::nullable(ValidatorExpr::String(StringCheck {
                length: LengthCheck { min: Some(1), max: Some(20) },
                ..StringCheck::default()
            })),
        }]);
        assert_eq!(
            ZOD.declaration("User", &[], &expr),
            "export const UserSchema: z.ZodType<User, z.ZodTypeDef, unknown> = z.object({\n  age: z.string().min(1).max(20).nullable().optional(),\n});\n"
        );
    }

    #[test]
    fn test_external_union() {
        let expr = ValidatorExpr::Union(UnionExpr {
            tagging: Tagging::External,
            variants: vec![
                VariantExpr {
                    name: "Active".into(),
                    payload: PayloadExpr::Unit,
                },
                VariantExpr {
                    name: "Banned".into(),
                    payload: PayloadExpr::Newtype(Box::new(ValidatorExpr::Boolean)),
                },
            ],
        });
        assert_eq!(
            ZOD.expr(&expr, 0),
            "z.union([\n  z.literal(\"Active\"),\n  z.object({\n    Banned: z.boolean(),\n  }).strict(),\n])"
        );
    }

    #[test]
    fn test_single_char() {
        let expr = ValidatorExpr::String(StringCheck {
            single_char: true,
            ..StringCheck::default()
        });
        assert_eq!(
            ZOD.expr(&expr, 0),
            "z.string().refine((s) => [...s].length === 1, { message: \"expected a single character\" })"
        );
    }

    #[test]
    fn test_brand_transform() {
        let expr = ValidatorExpr::Brand {
            inner: Box::new(ValidatorExpr::Boolean),
            name: "Flag".into(),
        };
        assert_eq!(ZOD.expr(&expr, 0), "z.boolean().transform(Flag)");
    }
}
