//! Emission plan for one declaration.
//!
//! Every member is mapped exactly once here. The type renderer, the validator
//! renderers and the shape table all read from the same plan.

use crate::diagnostic::GeneratorError;
use crate::ir::{EnumVariant, FieldDecl, Tagging, TypeDecl, TypeKind, ValueConstraint, VariantPayload};
use crate::mapper::{
    self, Mapped, ObjectField, PayloadExpr, TsProperty, TsType, UnionExpr, ValidatorExpr, VariantExpr,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TypePlan {
    pub name: String,
    /// Type parameters; a generic declaration emits a validator factory.
    pub params: Vec<String>,
    pub doc: Option<String>,
    pub body: PlanBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanBody {
    Struct(Vec<MappedField>),
    Enum {
        tagging: Tagging,
        variants: Vec<MappedVariant>,
    },
    /// Transparent newtype.
    Alias {
        mapped: Mapped,
        annotations: Vec<String>,
    },
    /// Nominal newtype.
    Brand {
        mapped: Mapped,
        annotations: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedField {
    pub name: String,
    /// The property may be absent. Its type then also admits `null`.
    pub optional: bool,
    pub mapped: Mapped,
    pub doc: Option<String>,
    /// JSDoc tags describing the declared constraints.
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedVariant {
    pub name: String,
    pub doc: Option<String>,
    pub payload: MappedPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MappedPayload {
    Unit,
    Newtype(Mapped),
    Tuple(Vec<Mapped>),
    Struct(Vec<MappedField>),
}

/// Maps every member of `decl`, reporting all failures at once.
pub fn plan(decl: &TypeDecl) -> Result<TypePlan, Vec<GeneratorError>> {
    let mut errors = Vec::new();

    let body = match &decl.kind {
        TypeKind::Struct { fields } => PlanBody::Struct(map_fields(&decl.name, fields, &mut errors)),
        TypeKind::Enum { variants, tagging } => PlanBody::Enum {
            tagging: tagging.clone(),
            variants: variants
                .iter()
                .filter_map(|v| map_variant(&decl.name, v, &mut errors))
                .collect(),
        },
        TypeKind::Newtype {
            underlying,
            constraints,
            branded,
        } => {
            let mapped = mapper::map_constrained(underlying, constraints, &decl.name).map_err(|e| vec![e])?;
            let annotations = annotations(constraints);
            if *branded {
                PlanBody::Brand { mapped, annotations }
            } else {
                PlanBody::Alias { mapped, annotations }
            }
        }
    };

    if errors.is_empty() {
        Ok(TypePlan {
            name: decl.name.clone(),
            params: decl.generics.clone(),
            doc: decl.doc.clone(),
            body,
        })
    } else {
        Err(errors)
    }
}

fn map_fields(owner: &str, fields: &[FieldDecl], errors: &mut Vec<GeneratorError>) -> Vec<MappedField> {
    fields
        .iter()
        .filter_map(|field| {
            let location = format!("{}.{}", owner, field.name);
            // A field that may be absent also accepts an explicit null.
            let mapped = mapper::map_constrained(&field.type_ref, &field.constraints, &location).map(|mapped| {
                if field.optional {
                    mapper::nullable(mapped)
                } else {
                    mapped
                }
            });
            match mapped {
                Ok(mapped) => Some(MappedField {
                    name: field.name.clone(),
                    optional: field.is_optional(),
                    mapped,
                    doc: field.doc.clone(),
                    annotations: annotations(&field.constraints),
                }),
                Err(e) => {
                    errors.push(e);
                    None
                }
            }
        })
        .collect()
}

/// Tagging rules (e.g. no tuple variants under an internal tag) are checked
/// by structure validation, not here.
fn map_variant(owner: &str, variant: &EnumVariant, errors: &mut Vec<GeneratorError>) -> Option<MappedVariant> {
    let location = format!("{}::{}", owner, variant.name);

    let payload = match &variant.payload {
        VariantPayload::Unit => MappedPayload::Unit,
        VariantPayload::Tuple(types) => {
            let before = errors.len();
            let mapped: Vec<Mapped> = types
                .iter()
                .enumerate()
                .filter_map(|(i, ty)| {
                    mapper::map_constrained(ty, &[], &format!("{}.{}", location, i))
                        .map_err(|e| errors.push(e))
                        .ok()
                })
                .collect();
            if errors.len() > before {
                return None;
            }
            match <[Mapped; 1]>::try_from(mapped) {
                Ok([single]) => MappedPayload::Newtype(single),
                Err(many) => MappedPayload::Tuple(many),
            }
        }
        VariantPayload::Struct(fields) => MappedPayload::Struct(map_fields(&location, fields, errors)),
    };

    Some(MappedVariant {
        name: variant.name.clone(),
        doc: variant.doc.clone(),
        payload,
    })
}

/// JSDoc tags for declared constraints, in declaration order.
fn annotations(constraints: &[ValueConstraint]) -> Vec<String> {
    let mut tags = Vec::new();
    for constraint in constraints {
        match constraint {
            ValueConstraint::Range { min, max } => {
                tags.extend(min.map(|m| format!("@minimum {}", m)));
                tags.extend(max.map(|m| format!("@maximum {}", m)));
            }
            ValueConstraint::Length { min, max } => {
                tags.extend(min.map(|m| format!("@minLength {}", m)));
                tags.extend(max.map(|m| format!("@maxLength {}", m)));
            }
            ValueConstraint::Pattern { regex } => tags.push(format!("@pattern {}", regex)),
            ValueConstraint::Email => tags.push("@format email".to_string()),
            ValueConstraint::Url => tags.push("@format url".to_string()),
        }
    }
    tags
}

impl TypePlan {
    pub fn is_branded(&self) -> bool {
        matches!(self.body, PlanBody::Brand { .. })
    }

    pub fn is_generic(&self) -> bool {
        !self.params.is_empty()
    }

    /// The declared name with its type parameters: `Page<T>`.
    pub fn signature(&self) -> String {
        if self.params.is_empty() {
            self.name.clone()
        } else {
            format!("{}<{}>", self.name, self.params.join(", "))
        }
    }

    /// The TypeScript type this declaration emits.
    pub fn ts_type(&self) -> TsType {
        match &self.body {
            PlanBody::Struct(fields) => TsType::Object(properties(fields)),
            PlanBody::Enum { tagging, variants } => {
                TsType::Union(variants.iter().map(|v| v.ts_type(tagging)).collect())
            }
            PlanBody::Alias { mapped, .. } => mapped.target.clone(),
            PlanBody::Brand { mapped, .. } => TsType::Brand {
                inner: Box::new(mapped.target.clone()),
                name: self.name.clone(),
            },
        }
    }

    /// The validator this declaration emits.
    pub fn validator(&self) -> ValidatorExpr {
        match &self.body {
            PlanBody::Struct(fields) => ValidatorExpr::Object(object_fields(fields)),
            PlanBody::Enum { tagging, variants } => ValidatorExpr::Union(UnionExpr {
                tagging: tagging.clone(),
                variants: variants
                    .iter()
                    .map(|v| VariantExpr {
                        name: v.name.clone(),
                        payload: v.payload_expr(),
                    })
                    .collect(),
            }),
            PlanBody::Alias { mapped, .. } => mapped.validator.clone(),
            PlanBody::Brand { mapped, .. } => ValidatorExpr::Brand {
                inner: Box::new(mapped.validator.clone()),
                name: self.name.clone(),
            },
        }
    }

    /// Declarations this one refers to, in first-use order.
    pub fn deps(&self) -> Vec<String> {
        self.validator().refs().into_iter().map(str::to_string).collect()
    }
}

impl MappedVariant {
    /// One member of the emitted union, shaped by the tagging style.
    pub fn ts_type(&self, tagging: &Tagging) -> TsType {
        let tag_property = |tag: &str| TsProperty {
            name: tag.to_string(),
            optional: false,
            ty: TsType::StringLiteral(self.name.clone()),
        };

        match tagging {
            Tagging::External => match self.payload_type() {
                None => TsType::StringLiteral(self.name.clone()),
                Some(ty) => TsType::Object(vec![TsProperty {
                    name: self.name.clone(),
                    optional: false,
                    ty,
                }]),
            },
            Tagging::Internal { tag } => {
                let mut props = vec![tag_property(tag)];
                if let MappedPayload::Struct(fields) = &self.payload {
                    props.extend(properties(fields));
                }
                TsType::Object(props)
            }
            Tagging::Adjacent { tag, content } => {
                let mut props = vec![tag_property(tag)];
                if let Some(ty) = self.payload_type() {
                    props.push(TsProperty {
                        name: content.clone(),
                        optional: false,
                        ty,
                    });
                }
                TsType::Object(props)
            }
        }
    }

    fn payload_type(&self) -> Option<TsType> {
        match &self.payload {
            MappedPayload::Unit => None,
            MappedPayload::Newtype(mapped) => Some(mapped.target.clone()),
            MappedPayload::Tuple(items) => Some(TsType::Tuple(items.iter().map(|m| m.target.clone()).collect())),
            MappedPayload::Struct(fields) => Some(TsType::Object(properties(fields))),
        }
    }

    fn payload_expr(&self) -> PayloadExpr {
        match &self.payload {
            MappedPayload::Unit => PayloadExpr::Unit,
            MappedPayload::Newtype(mapped) => PayloadExpr::Newtype(Box::new(mapped.validator.clone())),
            MappedPayload::Tuple(items) => PayloadExpr::Tuple(items.iter().map(|m| m.validator.clone()).collect()),
            MappedPayload::Struct(fields) => PayloadExpr::Struct(object_fields(fields)),
        }
    }
}

fn properties(fields: &[MappedField]) -> Vec<TsProperty> {
    fields
        .iter()
        .map(|f| TsProperty {
            name: f.name.clone(),
            optional: f.optional,
            ty: f.mapped.target.clone(),
        })
        .collect()
}

fn object_fields(fields: &[MappedField]) -> Vec<ObjectField> {
    fields
        .iter()
        .map(|f| ObjectField {
            name: f.name.clone(),
            optional: f.optional,
            validator: f.mapped.validator.clone(),
        })
        .collect()
}
