//! TypeScript emission.
//!
//! Each declaration becomes a type declaration and a validator. Both are
//! rendered from one [`TypePlan`], so a field present in the type is always
//! present in the validator with the same optionality.

pub mod dialect;
mod plan;
pub mod runtime;
mod ts_types;

pub use plan::{plan, MappedField, MappedPayload, MappedVariant, PlanBody, TypePlan};
pub use ts_types::BIGINT_WIRE_NOTE;

use serde::{Deserialize, Serialize};

use crate::config::{GeneratorConfig, ValidatorDialect};
use crate::diagnostic::GeneratorError;
use crate::ir::TypeDecl;
use crate::mapper::ShapeTable;
use dialect::dialect_for;

/// Options that change emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitOptions {
    pub dialect: ValidatorDialect,
    pub jsdoc: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            dialect: ValidatorDialect::Builtin,
            jsdoc: true,
        }
    }
}

impl From<&GeneratorConfig> for EmitOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            dialect: config.validators,
            jsdoc: config.generate_jsdoc,
        }
    }
}

/// Emitted text for one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedType {
    pub name: String,
    /// Type declaration, plus the brand constructor for nominal types.
    pub type_source: String,
    pub validator_source: String,
    /// Declarations referenced, in first-use order.
    pub deps: Vec<String>,
    pub branded: bool,
}

/// Plans and renders one declaration.
pub fn emit(decl: &TypeDecl, options: &EmitOptions) -> Result<EmittedType, Vec<GeneratorError>> {
    Ok(emit_plan(&plan(decl)?, options))
}

/// Renders an already planned declaration.
pub fn emit_plan(plan: &TypePlan, options: &EmitOptions) -> EmittedType {
    let dialect = dialect_for(options.dialect);
    EmittedType {
        name: plan.name.clone(),
        type_source: ts_types::render_types(plan, dialect, options.jsdoc),
        validator_source: dialect.declaration(&plan.name, &plan.params, &plan.validator()),
        deps: plan.deps(),
        branded: plan.is_branded(),
    }
}

/// Types and validators of planned declarations, for checking JSON values
/// without a JavaScript engine.
pub fn shape_table<'a>(plans: impl IntoIterator<Item = &'a TypePlan>) -> ShapeTable {
    let mut table = ShapeTable::default();
    for plan in plans {
        table.types.insert(plan.name.clone(), plan.ts_type());
        table.validators.insert(plan.name.clone(), plan.validator());
        if plan.is_generic() {
            table.params.insert(plan.name.clone(), plan.params.clone());
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDecl, Primitive, TypeRef};

    fn user() -> TypeDecl {
        TypeDecl::structure(
            "User",
            vec![
                FieldDecl::new("id", TypeRef::named("UserId")),
                FieldDecl::new("nickname", TypeRef::optional(Primitive::String.into())),
            ],
        )
    }

    #[test]
    fn test_emit_builtin() {
        let emitted = emit(&user(), &EmitOptions::default()).unwrap();
        assert_eq!(emitted.deps, vec!["UserId"]);
        assert!(!emitted.branded);
        assert!(emitted.type_source.contains("  nickname?: string | null;"));
        assert!(emitted.validator_source.contains("nickname: v.optional(v.nullable(v.string()))"));
    }

    #[test]
    fn test_emit_zod() {
        let options = EmitOptions {
            dialect: ValidatorDialect::Zod,
            jsdoc: false,
        };
        let emitted = emit(&user(), &options).unwrap();
        assert!(emitted.validator_source.starts_with("export const UserSchema"));
        assert!(emitted.validator_source.contains("id: UserIdSchema,"));
    }

    #[test]
    fn test_shape_table() {
        let decls = [TypeDecl::newtype("UserId", Primitive::U32, true), user()];
        let plans: Vec<TypePlan> = decls.iter().map(|d| plan(d).unwrap()).collect();
        let table = shape_table(&plans);

        let ok = serde_json::json!({ "id": 7, "nickname": null });
        assert!(table.validate("User", &ok).is_empty());

        let bad = serde_json::json!({ "id": -1 });
        assert_eq!(table.validate("User", &bad).len(), 1);
    }

    #[test]
    fn test_emit_generic_factory() {
        let page = TypeDecl::structure("Page", vec![FieldDecl::new("items", TypeRef::sequence(TypeRef::named("T")))])
            .with_generics(["T"]);

        let emitted = emit(&page, &EmitOptions::default()).unwrap();
        assert!(emitted.type_source.contains("export interface Page<T> {\n  items: T[];\n}"));
        assert_eq!(
            emitted.validator_source,
            "export const validatePage = <T>(validateT: Validator<T>): Validator<Page<T>> => v.object({\n  items: v.array(validateT),\n});\n"
        );

        let zod = EmitOptions {
            dialect: ValidatorDialect::Zod,
            jsdoc: true,
        };
        let emitted = emit(&page, &zod).unwrap();
        assert!(emitted.validator_source.starts_with(
            "export const PageSchema = <T>(TSchema: z.ZodType<T, z.ZodTypeDef, unknown>): z.ZodType<Page<T>, z.ZodTypeDef, unknown> => z.object({"
        ));
        assert!(emitted.validator_source.contains("items: z.array(TSchema),"));
    }

    #[test]
    fn test_generic_use_site() {
        let decls = [
            TypeDecl::structure("Page", vec![FieldDecl::new("items", TypeRef::sequence(TypeRef::named("T")))])
                .with_generics(["T"]),
            TypeDecl::structure(
                "Feed",
                vec![
                    FieldDecl::new("posts", TypeRef::generic("Page", vec![Primitive::String.into()])),
                    FieldDecl::new("cursor", TypeRef::tuple(vec![Primitive::U32.into(), Primitive::Bool.into()])),
                ],
            ),
        ];
        let plans: Vec<TypePlan> = decls.iter().map(|d| plan(d).unwrap()).collect();

        let emitted = emit_plan(&plans[1], &EmitOptions::default());
        assert_eq!(emitted.deps, vec!["Page"]);
        assert!(emitted.type_source.contains("  posts: Page<string>;\n  cursor: [number, boolean];"));
        assert!(emitted.validator_source.contains("posts: validatePage(v.string()),"));

        let table = shape_table(&plans);
        let ok = serde_json::json!({ "posts": { "items": ["a", "b"] }, "cursor": [3, true] });
        assert!(table.validate("Feed", &ok).is_empty());
        let bad = serde_json::json!({ "posts": { "items": [1] }, "cursor": [3] });
        let issues = table.validate("Feed", &bad);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, "$.posts.items[0]");
        assert!(table.types["Feed"].admits(&ok, &table));
    }

    #[test]
    fn test_emit_is_deterministic() {
        let options = EmitOptions::default();
        assert_eq!(emit(&user(), &options).unwrap(), emit(&user(), &options).unwrap());
    }
}
