//! Rust type syntax to [`TypeRef`].

use syn::{GenericArgument, PathArguments, PathSegment, Type, TypePath};

use crate::ir::{Primitive, TypeRef};

/// Converts a field or newtype type.
pub fn type_ref(ty: &Type) -> syn::Result<TypeRef> {
    match ty {
        Type::Path(path) => path_type(path),
        Type::Reference(reference) => type_ref(&reference.elem),
        Type::Paren(paren) => type_ref(&paren.elem),
        Type::Group(group) => type_ref(&group.elem),
        Type::Slice(slice) => Ok(sequence_of(type_ref(&slice.elem)?)),
        Type::Array(array) => Ok(sequence_of(type_ref(&array.elem)?)),
        Type::Tuple(tuple) if tuple.elems.is_empty() => {
            Err(syn::Error::new_spanned(ty, "the unit type has no wire shape"))
        }
        Type::Tuple(tuple) => Ok(TypeRef::tuple(
            tuple.elems.iter().map(type_ref).collect::<syn::Result<_>>()?,
        )),
        _ => Err(syn::Error::new_spanned(ty, "unsupported type syntax")),
    }
}

fn path_type(ty: &TypePath) -> syn::Result<TypeRef> {
    if ty.qself.is_some() {
        return Err(syn::Error::new_spanned(ty, "qualified paths are not supported"));
    }

    let Some(last) = ty.path.segments.last() else {
        return Err(syn::Error::new_spanned(ty, "empty type path"));
    };
    let name = last.ident.to_string();

    if is_json_value(ty) {
        return Ok(TypeRef::Opaque);
    }

    let primitive = match name.as_str() {
        "bool" => Some(Primitive::Bool),
        "i8" => Some(Primitive::I8),
        "i16" => Some(Primitive::I16),
        "i32" => Some(Primitive::I32),
        "i64" | "isize" => Some(Primitive::I64),
        "i128" => Some(Primitive::Int { signed: true, bits: 128 }),
        "u8" => Some(Primitive::U8),
        "u16" => Some(Primitive::U16),
        "u32" => Some(Primitive::U32),
        "u64" | "usize" => Some(Primitive::U64),
        "u128" => Some(Primitive::Int { signed: false, bits: 128 }),
        "f32" => Some(Primitive::F32),
        "f64" => Some(Primitive::F64),
        "String" | "str" => Some(Primitive::String),
        "char" => Some(Primitive::Char),
        "Bytes" | "ByteBuf" => Some(Primitive::Bytes),
        _ => None,
    };
    if let Some(primitive) = primitive {
        return Ok(primitive.into());
    }

    match name.as_str() {
        "Option" => Ok(TypeRef::optional(single_arg(last)?)),
        "Box" | "Rc" | "Arc" | "Cow" => single_arg(last),
        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet" => {
            let item = single_arg(last)?;
            if name == "Vec" {
                Ok(sequence_of(item))
            } else {
                Ok(TypeRef::sequence(item))
            }
        }
        "HashMap" | "BTreeMap" | "IndexMap" => {
            let args = type_args(last);
            let [key, value] = args.as_slice() else {
                return Err(syn::Error::new_spanned(last, "expected a key and a value type"));
            };
            if !matches!(type_ref(key)?, TypeRef::Primitive(Primitive::String | Primitive::Char)) {
                return Err(syn::Error::new_spanned(key, "map keys must be strings"));
            }
            Ok(TypeRef::map(type_ref(value)?))
        }
        _ => match &last.arguments {
            PathArguments::Parenthesized(_) => {
                Err(syn::Error::new_spanned(last, "function traits have no wire shape"))
            }
            _ => {
                let args = type_args(last);
                if args.is_empty() {
                    Ok(TypeRef::Named(name))
                } else {
                    let args = args.into_iter().map(type_ref).collect::<syn::Result<_>>()?;
                    Ok(TypeRef::generic(name, args))
                }
            }
        },
    }
}

/// `Vec<u8>`, `[u8]` and `[u8; N]` are byte strings.
fn sequence_of(item: TypeRef) -> TypeRef {
    if item == TypeRef::Primitive(Primitive::U8) {
        TypeRef::Primitive(Primitive::Bytes)
    } else {
        TypeRef::sequence(item)
    }
}

fn is_json_value(ty: &TypePath) -> bool {
    let segments: Vec<String> = ty.path.segments.iter().map(|s| s.ident.to_string()).collect();
    segments == ["serde_json", "Value"]
}

fn type_args(segment: &PathSegment) -> Vec<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn single_arg(segment: &PathSegment) -> syn::Result<TypeRef> {
    match type_args(segment).as_slice() {
        [inner] => type_ref(inner),
        _ => Err(syn::Error::new_spanned(segment, "expected exactly one type argument")),
    }
}
