//! Validators for the dependency-free runtime shipped in `runtime.ts`.

use super::{block, factory_params, options, signature, Dialect, RUNTIME_MODULE};
use crate::emit::runtime;
use crate::ir::Tagging;
use crate::mapper::{string_literal, LengthCheck, ObjectField, PayloadExpr, UnionExpr, ValidatorExpr};

pub struct BuiltinDialect;

pub static BUILTIN: BuiltinDialect = BuiltinDialect;

impl Dialect for BuiltinDialect {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn validator_name(&self, type_name: &str) -> String {
        format!("validate{}", type_name)
    }

    fn imports(&self, brand: bool) -> Vec<String> {
        let brand = if brand { ", type Brand" } else { "" };
        vec![format!("import {{ v, type Validator{} }} from '{}';", brand, RUNTIME_MODULE)]
    }

    fn expr(&self, expr: &ValidatorExpr, indent: usize) -> String {
        match expr {
            ValidatorExpr::Boolean => "v.boolean()".to_string(),
            ValidatorExpr::Number(check) => {
                let mut opts = Vec::new();
                if check.integer {
                    opts.push("integer: true".to_string());
                }
                opts.extend(check.min.map(|m| format!("min: {}", m)));
                opts.extend(check.max.map(|m| format!("max: {}", m)));
                call("v.number", &opts)
            }
            ValidatorExpr::BigInt(check) => {
                format!("v.bigint({{ min: {}n, max: {}n }})", check.min, check.max)
            }
            ValidatorExpr::String(check) => {
                let mut opts = length_options(&check.length);
                if !check.patterns.is_empty() {
                    let patterns: Vec<String> = check
                        .patterns
                        .iter()
                        .map(|p| format!("new RegExp({})", string_literal(p)))
                        .collect();
                    opts.push(format!("patterns: [{}]", patterns.join(", ")));
                }
                if !check.formats.is_empty() {
                    let formats: Vec<String> = check.formats.iter().map(|f| string_literal(f.name())).collect();
                    opts.push(format!("formats: [{}]", formats.join(", ")));
                }
                if check.single_char {
                    opts.push("char: true".to_string());
                }
                call("v.string", &opts)
            }
            ValidatorExpr::Bytes(length) => call("v.bytes", &length_options(length)),
            ValidatorExpr::Unknown => "v.unknown()".to_string(),
            ValidatorExpr::Literal(value) => format!("v.literal({})", string_literal(value)),
            ValidatorExpr::Array { items, length } => {
                let items = self.expr(items, indent);
                match options(&length_options(length)) {
                    Some(opts) => format!("v.array({}, {})", items, opts),
                    None => format!("v.array({})", items),
                }
            }
            ValidatorExpr::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|i| self.expr(i, indent)).collect();
                format!("v.tuple([{}])", items.join(", "))
            }
            ValidatorExpr::Nullable(inner) => format!("v.nullable({})", self.expr(inner, indent)),
            ValidatorExpr::Record(inner) => format!("v.record({})", self.expr(inner, indent)),
            ValidatorExpr::Ref(name) | ValidatorExpr::Param(name) => self.validator_name(name),
            ValidatorExpr::Apply { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a, indent)).collect();
                format!("{}({})", self.validator_name(name), args.join(", "))
            }
            ValidatorExpr::Object(fields) => self.object(fields, indent),
            ValidatorExpr::Brand { inner, name } => format!("v.brand({}, {})", self.expr(inner, indent), name),
            ValidatorExpr::Union(union) => self.union(union, indent),
        }
    }

    fn declaration(&self, type_name: &str, params: &[String], expr: &ValidatorExpr) -> String {
        if params.is_empty() {
            return format!(
                "export const {}: Validator<{}> = {};\n",
                self.validator_name(type_name),
                type_name,
                self.expr(expr, 0)
            );
        }
        format!(
            "export const {} = {}: Validator<{}> => {};\n",
            self.validator_name(type_name),
            factory_params(self, params, |p| format!("Validator<{}>", p)),
            signature(type_name, params),
            self.expr(expr, 0)
        )
    }

    fn runtime(&self) -> &'static str {
        runtime::VALIDATORS
    }
}

impl BuiltinDialect {
    fn object(&self, fields: &[ObjectField], indent: usize) -> String {
        let entries = fields
            .iter()
            .map(|field| {
                let value = self.expr(&field.validator, indent + 1);
                let value = if field.optional {
                    format!("v.optional({})", value)
                } else {
                    value
                };
                (field.name.clone(), value)
            })
            .collect();
        format!("v.object({})", block(entries, indent))
    }

    fn union(&self, union: &UnionExpr, indent: usize) -> String {
        let entries = union
            .variants
            .iter()
            .map(|variant| {
                let payload = match &variant.payload {
                    PayloadExpr::Unit => "null".to_string(),
                    PayloadExpr::Newtype(inner) => self.expr(inner, indent + 1),
                    PayloadExpr::Tuple(items) => self.expr(&ValidatorExpr::Tuple(items.clone()), indent + 1),
                    PayloadExpr::Struct(fields) => self.object(fields, indent + 1),
                };
                (variant.name.clone(), payload)
            })
            .collect();
        let variants = block(entries, indent);

        match &union.tagging {
            Tagging::External => format!("v.externalUnion({})", variants),
            Tagging::Internal { tag } => format!("v.taggedUnion({}, {})", string_literal(tag), variants),
            Tagging::Adjacent { tag, content } => format!(
                "v.adjacentUnion({}, {}, {})",
                string_literal(tag),
                string_literal(content),
                variants
            ),
        }
    }
}

fn call(function: &str, opts: &[String]) -> String {
    match options(opts) {
        Some(opts) => format!("{}({})", function, opts),
        None => format!("{}()", function),
    }
}

fn length_options(length: &LengthCheck) -> Vec<String> {
    let mut opts = Vec::new();
    opts.extend(length.min.map(|m| format!("minLength: {}", m)));
    opts.extend(length.max.map(|m| format!("maxLength: {}", m)));
    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Bound;
    use crate::mapper::{BigIntCheck, NumberCheck, StringCheck, StringFormat, VariantExpr};

    #[test]
    fn test_scalars() {
        let d = &BUILTIN;
        assert_eq!(
            d.expr(
                &ValidatorExpr::Number(NumberCheck {
                    integer: true,
                    min: Some(Bound::Int(0)),
                    max: Some(Bound::Int(255)),
                }),
                0
            ),
            "v.number({ integer: true, min: 0, max: 255 })"
        );
        assert_eq!(
            d.expr(&ValidatorExpr::BigInt(BigIntCheck { min: 0, max: u64::MAX as i128 }), 0),
            "v.bigint({ min: 0n, max: 18446744073709551615n })"
        );
        assert_eq!(
            d.expr(
                &ValidatorExpr::String(StringCheck {
                    length: LengthCheck { min: Some(1), max: None },
                    patterns: vec![r"^\d+$".into()],
                    formats: vec![StringFormat::Email],
                    single_char: false,
                }),
                0
            ),
            r#"v.string({ minLength: 1, patterns: [new RegExp("^\\d+$")], formats: ["email"] })"#
        );
        assert_eq!(
            d.expr(
                &ValidatorExpr::String(StringCheck {
                    single_char: true,
                    ..StringCheck::default()
                }),
                0
            ),
            "v.string({ char: true })"
        );
    }

    #[test]
    fn test_object_declaration() {
        let expr = ValidatorExpr::Object(vec![
            ObjectField {
                name: "id".into(),
                optional: false,
                validator: ValidatorExpr::Ref("UserId".into()),
            },
            ObjectField {
                name: "nickname".into(),
                optional: true,
                validator: ValidatorExpr::nullable(ValidatorExpr::String(StringCheck::default())),
            },
        ]);
        assert_eq!(
            BUILTIN.declaration("User", &[], &expr),
            "export const validateUser: Validator<User> = v.object({\n  id: validateUserId,\n  nickname: v.optional(v.nullable(v.string())),\n});\n"
        );
    }

    #[test]
    fn test_generic_factory_with_two_params() {
        let expr = ValidatorExpr::Tuple(vec![
            ValidatorExpr::Param("A".into()),
            ValidatorExpr::Apply {
                name: "Page".into(),
                args: vec![ValidatorExpr::Param("B".into())],
            },
        ]);
        assert_eq!(
            BUILTIN.declaration("Pair", &["A".into(), "B".into()], &expr),
            "export const validatePair = <A, B>(validateA: Validator<A>, validateB: Validator<B>): Validator<Pair<A, B>> => v.tuple([validateA, validatePage(validateB)]);\n"
        );
    }

    #[test]
    fn test_internal_union() {
        let expr = ValidatorExpr::Union(UnionExpr {
            tagging: Tagging::Internal { tag: "kind".into() },
            variants: vec![
                VariantExpr {
                    name: "Idle".into(),
                    payload: PayloadExpr::Unit,
                },
                VariantExpr {
                    name: "Busy".into(),
                    payload: PayloadExpr::Struct(vec![ObjectField {
                        name: "since".into(),
                        optional: false,
                        validator: ValidatorExpr::Boolean,
                    }]),
                },
            ],
        });
        assert_eq!(
            BUILTIN.expr(&expr, 0),
            "v.taggedUnion(\"kind\", {\n  Idle: null,\n  Busy: v.object({\n    since: v.boolean(),\n  }),\n})"
        );
    }
}
