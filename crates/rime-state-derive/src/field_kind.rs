//! Field shape analysis.

use syn::{GenericArgument, PathArguments, Type};

/// How a field is exposed on the generated lens.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Read and written as a whole value through serde.
    Scalar,
    /// `Option<T>`: absent or null reads as `None`.
    Optional(Type),
    /// `Vec<T>`: gains `push` and a proxy accessor.
    List(Type),
    /// A string-keyed map: gains `insert`.
    Map {
        /// Key type.
        key: Type,
        /// Value type.
        value: Type,
    },
    /// A type with its own lens (`#[rime(nested)]`).
    Nested,
}

impl FieldKind {
    /// Classify a field type. `nested` marks a plain type as having its own lens.
    pub fn classify(ty: &Type, nested: bool) -> Self {
        let Type::Path(type_path) = ty else {
            return FieldKind::Scalar;
        };
        let Some(last) = type_path.path.segments.last() else {
            return FieldKind::Scalar;
        };
        let args = generic_types(&last.arguments);
        match (last.ident.to_string().as_str(), args.as_slice()) {
            ("Option", [inner]) => FieldKind::Optional((*inner).clone()),
            ("Vec", [inner]) => FieldKind::List((*inner).clone()),
            ("HashMap" | "BTreeMap" | "IndexMap", [key, value, ..]) => FieldKind::Map {
                key: (*key).clone(),
                value: (*value).clone(),
            },
            _ if nested => FieldKind::Nested,
            _ => FieldKind::Scalar,
        }
    }

    /// Whether this is a nested lens.
    pub fn is_nested(&self) -> bool {
        matches!(self, FieldKind::Nested)
    }
}

/// Last path segment name of a type, if it is a plain path.
pub fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}

fn generic_types(args: &PathArguments) -> Vec<&Type> {
    match args {
        PathArguments::AngleBracketed(bracketed) => bracketed
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

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_scalars() {
        for ty in [parse_quote!(String), parse_quote!(i64), parse_quote!(bool)] {
            assert_eq!(FieldKind::classify(&ty, false), FieldKind::Scalar);
        }
        let tuple: Type = parse_quote!((i32, i32));
        assert_eq!(FieldKind::classify(&tuple, true), FieldKind::Scalar);
    }

    #[test]
    fn test_containers() {
        let ty: Type = parse_quote!(Option<String>);
        assert_eq!(FieldKind::classify(&ty, false), FieldKind::Optional(parse_quote!(String)));

        let ty: Type = parse_quote!(Vec<Todo>);
        assert_eq!(FieldKind::classify(&ty, false), FieldKind::List(parse_quote!(Todo)));

        let ty: Type = parse_quote!(std::collections::BTreeMap<String, u32>);
        assert!(matches!(FieldKind::classify(&ty, false), FieldKind::Map { .. }));
    }

    #[test]
    fn test_nested() {
        let ty: Type = parse_quote!(Profile);
        assert!(FieldKind::classify(&ty, true).is_nested());
        assert_eq!(FieldKind::classify(&ty, false), FieldKind::Scalar);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(type_name(&parse_quote!(std::string::String)).as_deref(), Some("String"));
        assert_eq!(type_name(&parse_quote!(&str)), None);
    }
}
