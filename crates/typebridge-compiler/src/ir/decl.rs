//! Declared types, fields and type references.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValueConstraint;
use crate::diagnostic::Span;

/// One declared type.
///
/// `name` uniquely identifies a declaration within a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Name of the type (e.g., "User", "UserId").
    pub name: String,

    /// Doc comment, carried verbatim to the emitted type declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    /// Type parameters, in declaration order (`T`, `E` of `Outcome<T, E>`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,

    /// Struct, enum or newtype body.
    #[serde(flatten)]
    pub kind: TypeKind,

    /// Where the declaration came from (diagnostics only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Span>,
}

/// The body of a declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// A record with named fields.
    Struct { fields: Vec<FieldDecl> },

    /// A sum type; each variant may carry a payload.
    Enum {
        variants: Vec<EnumVariant>,
        #[serde(default)]
        tagging: Tagging,
    },

    /// A single wrapped type. Branded newtypes become nominal aliases.
    Newtype {
        underlying: TypeRef,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        constraints: Vec<ValueConstraint>,
        #[serde(default)]
        branded: bool,
    },
}

/// One field of a struct (or of a struct-like enum variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Wire name of the field (after serde renames).
    pub name: String,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,

    /// Whether the field may be absent on the wire.
    #[serde(default)]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ValueConstraint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// One enum variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    /// Wire name of the variant.
    pub name: String,

    #[serde(default)]
    pub payload: VariantPayload,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// What a variant carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantPayload {
    #[default]
    Unit,
    Tuple(Vec<TypeRef>),
    Struct(Vec<FieldDecl>),
}

/// How enum variants are laid out on the wire (serde's representations).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Tagging {
    /// `"Unit"` or `{ "Variant": payload }`.
    #[default]
    External,
    /// `{ "<tag>": "Variant", ...fields }`.
    Internal { tag: String },
    /// `{ "<tag>": "Variant", "<content>": payload }`.
    Adjacent { tag: String, content: String },
}

/// A reference from a field (or newtype) to a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Primitive(Primitive),
    /// Another declaration of the same run, by name.
    Named(String),
    Sequence(Box<TypeRef>),
    Optional(Box<TypeRef>),
    /// String-keyed map.
    Map(Box<TypeRef>),
    /// Fixed-length array of heterogeneous elements.
    Tuple(Vec<TypeRef>),
    /// A type parameter of the enclosing declaration.
    Param(String),
    /// A generic declaration applied to type arguments, e.g. `Page<User>`.
    Generic { name: String, args: Vec<TypeRef> },
    /// A value whose shape is not known to the generator.
    Opaque,
}

/// Primitive source types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Bool,
    Int { signed: bool, bits: u16 },
    Float { bits: u16 },
    String,
    /// A single Unicode scalar value, carried as a one-character string.
    Char,
    Bytes,
}

impl Primitive {
    pub const I8: Primitive = Primitive::Int { signed: true, bits: 8 };
    pub const I16: Primitive = Primitive::Int { signed: true, bits: 16 };
    pub const I32: Primitive = Primitive::Int { signed: true, bits: 32 };
    pub const I64: Primitive = Primitive::Int { signed: true, bits: 64 };
    pub const U8: Primitive = Primitive::Int { signed: false, bits: 8 };
    pub const U16: Primitive = Primitive::Int { signed: false, bits: 16 };
    pub const U32: Primitive = Primitive::Int { signed: false, bits: 32 };
    pub const U64: Primitive = Primitive::Int { signed: false, bits: 64 };
    pub const F32: Primitive = Primitive::Float { bits: 32 };
    pub const F64: Primitive = Primitive::Float { bits: 64 };

    pub fn is_integer(&self) -> bool {
        matches!(self, Primitive::Int { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Primitive::Int { .. } | Primitive::Float { .. })
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool => f.write_str("bool"),
            Primitive::Int { signed: true, bits } => write!(f, "i{}", bits),
            Primitive::Int { signed: false, bits } => write!(f, "u{}", bits),
            Primitive::Float { bits } => write!(f, "f{}", bits),
            Primitive::String => f.write_str("string"),
            Primitive::Char => f.write_str("char"),
            Primitive::Bytes => f.write_str("bytes"),
        }
    }
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn sequence(inner: TypeRef) -> Self {
        TypeRef::Sequence(Box::new(inner))
    }

    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional(Box::new(inner))
    }

    pub fn map(value: TypeRef) -> Self {
        TypeRef::Map(Box::new(value))
    }

    pub fn tuple(items: Vec<TypeRef>) -> Self {
        TypeRef::Tuple(items)
    }

    pub fn param(name: impl Into<String>) -> Self {
        TypeRef::Param(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Generic {
            name: name.into(),
            args,
        }
    }

    /// Calls `f` for every named reference, depth first, left to right.
    /// A generic application names its declaration before its arguments.
    pub fn visit_named<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            TypeRef::Named(name) => f(name),
            TypeRef::Generic { name, args } => {
                f(name);
                args.iter().for_each(|arg| arg.visit_named(f));
            }
            TypeRef::Sequence(inner) | TypeRef::Optional(inner) | TypeRef::Map(inner) => {
                inner.visit_named(f)
            }
            TypeRef::Tuple(items) => items.iter().for_each(|item| item.visit_named(f)),
            TypeRef::Primitive(_) | TypeRef::Param(_) | TypeRef::Opaque => {}
        }
    }

    /// Whether an opaque placeholder appears anywhere in this reference.
    pub fn contains_opaque(&self) -> bool {
        match self {
            TypeRef::Opaque => true,
            TypeRef::Sequence(inner) | TypeRef::Optional(inner) | TypeRef::Map(inner) => {
                inner.contains_opaque()
            }
            TypeRef::Tuple(items) | TypeRef::Generic { args: items, .. } => {
                items.iter().any(TypeRef::contains_opaque)
            }
            TypeRef::Primitive(_) | TypeRef::Named(_) | TypeRef::Param(_) => false,
        }
    }

    /// Turns named references to any of `params` into parameter references.
    pub fn bind_params(&mut self, params: &[String]) {
        match self {
            TypeRef::Named(name) if params.contains(name) => *self = TypeRef::Param(std::mem::take(name)),
            TypeRef::Sequence(inner) | TypeRef::Optional(inner) | TypeRef::Map(inner) => inner.bind_params(params),
            TypeRef::Tuple(items) | TypeRef::Generic { args: items, .. } => {
                items.iter_mut().for_each(|item| item.bind_params(params))
            }
            TypeRef::Primitive(_) | TypeRef::Named(_) | TypeRef::Param(_) | TypeRef::Opaque => {}
        }
    }
}

impl From<Primitive> for TypeRef {
    fn from(primitive: Primitive) -> Self {
        TypeRef::Primitive(primitive)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Sequence(inner) => write!(f, "Vec<{}>", inner),
            TypeRef::Optional(inner) => write!(f, "Option<{}>", inner),
            TypeRef::Map(inner) => write!(f, "Map<string, {}>", inner),
            TypeRef::Tuple(items) => write!(f, "({})", join(items)),
            TypeRef::Param(name) => f.write_str(name),
            TypeRef::Generic { name, args } => write!(f, "{}<{}>", name, join(args)),
            TypeRef::Opaque => f.write_str("opaque"),
        }
    }
}

fn join(items: &[TypeRef]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            optional: false,
            constraints: Vec::new(),
            doc: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_constraint(mut self, constraint: ValueConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// A field is optional when flagged so or when its top-level type is
    /// `Optional(T)`.
    pub fn is_optional(&self) -> bool {
        self.optional || matches!(self.type_ref, TypeRef::Optional(_))
    }

    /// The field's value type with one top-level `Optional` stripped.
    pub fn value_type(&self) -> &TypeRef {
        match &self.type_ref {
            TypeRef::Optional(inner) => inner,
            other => other,
        }
    }
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            doc: None,
            generics: Vec::new(),
            kind,
            source: None,
        }
    }

    pub fn structure(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self::new(name, TypeKind::Struct { fields })
    }

    pub fn enumeration(name: impl Into<String>, variants: Vec<EnumVariant>, tagging: Tagging) -> Self {
        Self::new(name, TypeKind::Enum { variants, tagging })
    }

    pub fn newtype(name: impl Into<String>, underlying: impl Into<TypeRef>, branded: bool) -> Self {
        Self::new(
            name,
            TypeKind::Newtype {
                underlying: underlying.into(),
                constraints: Vec::new(),
                branded,
            },
        )
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declares type parameters and binds every body reference to them.
    pub fn with_generics<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.generics = params.into_iter().map(Into::into).collect();
        self.bind_params();
        self
    }

    /// Rewrites named references to this declaration's type parameters as
    /// parameter references.
    pub fn bind_params(&mut self) {
        let params = self.generics.clone();
        if params.is_empty() {
            return;
        }
        for type_ref in self.type_refs_mut() {
            type_ref.bind_params(&params);
        }
    }

    /// "struct", "enum" or "newtype".
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Struct { .. } => "struct",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Newtype { .. } => "newtype",
        }
    }

    /// Struct fields; empty for other kinds.
    pub fn fields(&self) -> &[FieldDecl] {
        match &self.kind {
            TypeKind::Struct { fields } => fields,
            _ => &[],
        }
    }

    /// Enum variants; empty for other kinds.
    pub fn variants(&self) -> &[EnumVariant] {
        match &self.kind {
            TypeKind::Enum { variants, .. } => variants,
            _ => &[],
        }
    }

    /// The wrapped type of a newtype.
    pub fn underlying(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Newtype { underlying, .. } => Some(underlying),
            _ => None,
        }
    }

    /// Every type reference in the body, in declaration order.
    pub fn type_refs(&self) -> Vec<&TypeRef> {
        match &self.kind {
            TypeKind::Struct { fields } => fields.iter().map(|f| &f.type_ref).collect(),
            TypeKind::Enum { variants, .. } => variants
                .iter()
                .flat_map(|v| match &v.payload {
                    VariantPayload::Unit => Vec::new(),
                    VariantPayload::Tuple(types) => types.iter().collect(),
                    VariantPayload::Struct(fields) => fields.iter().map(|f| &f.type_ref).collect(),
                })
                .collect(),
            TypeKind::Newtype { underlying, .. } => vec![underlying],
        }
    }

    fn type_refs_mut(&mut self) -> Vec<&mut TypeRef> {
        match &mut self.kind {
            TypeKind::Struct { fields } => fields.iter_mut().map(|f| &mut f.type_ref).collect(),
            TypeKind::Enum { variants, .. } => variants
                .iter_mut()
                .flat_map(|v| match &mut v.payload {
                    VariantPayload::Unit => Vec::new(),
                    VariantPayload::Tuple(types) => types.iter_mut().collect(),
                    VariantPayload::Struct(fields) => fields.iter_mut().map(|f| &mut f.type_ref).collect(),
                })
                .collect(),
            TypeKind::Newtype { underlying, .. } => vec![underlying],
        }
    }

    /// Whether two declarations describe the same shape. Docs and source
    /// locations do not take part in the comparison.
    pub fn same_shape(&self, other: &TypeDecl) -> bool {
        self.name == other.name
            && self.generics == other.generics
            && strip_docs(&self.kind) == strip_docs(&other.kind)
    }
}

fn strip_docs(kind: &TypeKind) -> TypeKind {
    let strip_fields = |fields: &[FieldDecl]| -> Vec<FieldDecl> {
        fields
            .iter()
            .map(|f| FieldDecl { doc: None, ..f.clone() })
            .collect()
    };

    match kind {
        TypeKind::Struct { fields } => TypeKind::Struct {
            fields: strip_fields(fields),
        },
        TypeKind::Enum { variants, tagging } => TypeKind::Enum {
            variants: variants
                .iter()
                .map(|v| EnumVariant {
                    name: v.name.clone(),
                    payload: match &v.payload {
                        VariantPayload::Struct(fields) => VariantPayload::Struct(strip_fields(fields)),
                        other => other.clone(),
                    },
                    doc: None,
                })
                .collect(),
            tagging: tagging.clone(),
        },
        TypeKind::Newtype { .. } => kind.clone(),
    }
}
