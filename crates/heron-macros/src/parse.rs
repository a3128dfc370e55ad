//! Parsing of `#[derive(Record)]` input.
//!
//! This module turns a struct and its field annotations into a
//! [`RecordInput`].

use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Token};

/// The helper attribute that carries a field's source.
pub const ATTRIBUTE: &str = "heron";

/// Sources recognised inside `#[heron(...)]`.
pub const SOURCE_TAGS: [&str; 6] = ["query", "body", "path", "header", "cookie", "file"];

/// A field's binding, parsed from its source annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// The annotation tag (`query`, `body`, ...).
    pub tag: String,
    /// The name within the source. Empty for a bare annotation.
    pub name: String,
    /// The default text, if the payload had a comma.
    pub default: Option<String>,
}

impl FieldBinding {
    /// Returns the `SourceKind` variant name for the tag.
    pub fn variant(&self) -> Ident {
        let mut chars = self.tag.chars();
        let capitalized: String = chars
            .next()
            .map(|first| first.to_ascii_uppercase())
            .into_iter()
            .chain(chars)
            .collect();
        Ident::new(&capitalized, Span::call_site())
    }

    /// Returns `true` for file bindings.
    pub fn is_file(&self) -> bool {
        self.tag == "file"
    }
}

/// A parsed record field.
#[derive(Debug)]
pub struct RecordField {
    /// The field name.
    pub ident: Ident,
    /// The binding, or `None` for an unannotated field.
    pub binding: Option<FieldBinding>,
}

/// A parsed record struct.
#[derive(Debug)]
pub struct RecordInput {
    /// The struct name.
    pub ident: Ident,
    /// The fields, in declaration order.
    pub fields: Vec<RecordField>,
}

impl RecordInput {
    /// Parses a derive input.
    pub fn parse(input: DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "Record cannot be derived for generic structs",
            ));
        }

        let fields = match input.data {
            Data::Struct(data) => match data.fields {
                Fields::Named(named) => named.named,
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "Record can only be derived for structs with named fields",
                    ))
                }
            },
            _ => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Record can only be derived for structs",
                ))
            }
        };

        let fields = fields
            .into_iter()
            .map(|field| {
                let binding = parse_binding(&field.attrs)?;
                Ok(RecordField {
                    // Named fields always carry an ident.
                    ident: field
                        .ident
                        .ok_or_else(|| syn::Error::new(field.ty.span(), "expected a named field"))?,
                    binding,
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            ident: input.ident,
            fields,
        })
    }

    /// Returns the annotated fields, in declaration order.
    pub fn bound_fields(&self) -> impl Iterator<Item = (&RecordField, &FieldBinding)> {
        self.fields
            .iter()
            .filter_map(|field| field.binding.as_ref().map(|binding| (field, binding)))
    }
}

/// Parses the `#[heron(...)]` annotation of one field, if any.
fn parse_binding(attrs: &[Attribute]) -> syn::Result<Option<FieldBinding>> {
    let mut binding: Option<FieldBinding> = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            let Some(tag) = meta
                .path
                .get_ident()
                .map(ToString::to_string)
                .filter(|tag| SOURCE_TAGS.contains(&tag.as_str()))
            else {
                return Err(meta.error(format!(
                    "unknown source, expected one of: {}",
                    SOURCE_TAGS.join(", ")
                )));
            };

            if binding.is_some() {
                return Err(meta.error("a field can have at most one source annotation"));
            }

            let payload = if meta.input.peek(Token![=]) {
                meta.value()?.parse::<LitStr>()?.value()
            } else if meta.input.is_empty() || meta.input.peek(Token![,]) {
                String::new()
            } else {
                return Err(meta.error(format!("expected `{tag}` or `{tag} = \"name\"`")));
            };

            let (name, default) = match payload.split_once(',') {
                Some((name, default)) => (name.to_string(), Some(default.to_string())),
                None => (payload, None),
            };

            if tag == "file" {
                if name.is_empty() {
                    return Err(meta.error("file fields need a part name"));
                }
                if default.is_some() {
                    return Err(meta.error("file fields cannot declare a default"));
                }
            }

            binding = Some(FieldBinding { tag, name, default });
            Ok(())
        })?;
    }

    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse(input: DeriveInput) -> syn::Result<RecordInput> {
        RecordInput::parse(input)
    }

    #[test]
    fn test_parse_annotations() {
        let record = parse(parse_quote! {
            struct Search {
                #[heron(query = "q")]
                q: String,
                #[heron(query = "tags,a,b")]
                tags: Vec<String>,
                #[heron(body)]
                payload: Option<Payload>,
                #[doc = "not a source"]
                other: u8,
            }
        })
        .unwrap();

        assert_eq!(record.ident.to_string(), "Search");
        assert_eq!(record.fields.len(), 4);

        let q = record.fields[0].binding.as_ref().unwrap();
        assert_eq!((q.tag.as_str(), q.name.as_str(), q.default.as_deref()), ("query", "q", None));

        let tags = record.fields[1].binding.as_ref().unwrap();
        assert_eq!(tags.default.as_deref(), Some("a,b"));

        let body = record.fields[2].binding.as_ref().unwrap();
        assert_eq!(body.name, "");
        assert_eq!(body.variant().to_string(), "Body");

        assert!(record.fields[3].binding.is_none());
        assert_eq!(record.bound_fields().count(), 3);
    }

    #[test]
    fn test_default_on_file_rejected() {
        let err = parse(parse_quote! {
            struct Upload {
                #[heron(file = "avatar,none")]
                avatar: UploadedFile,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("cannot declare a default"));
    }

    #[test]
    fn test_unnamed_file_rejected() {
        assert!(parse(parse_quote! {
            struct Upload {
                #[heron(file)]
                avatar: UploadedFile,
            }
        })
        .is_err());
    }

    #[test]
    fn test_two_sources_rejected() {
        let err = parse(parse_quote! {
            struct R {
                #[heron(query = "a")]
                #[heron(header = "a")]
                a: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("at most one"));
    }

    #[test]
    fn test_path_source() {
        let record = parse(parse_quote! {
            struct Lookup {
                #[heron(path = "id")]
                #[serde(rename = "item")]
                id: u64,
            }
        })
        .unwrap();

        let id = record.fields[0].binding.as_ref().unwrap();
        assert_eq!((id.tag.as_str(), id.name.as_str()), ("path", "id"));
        assert_eq!(id.variant().to_string(), "Path");
    }

    #[test]
    fn test_unknown_source_rejected() {
        let err = parse(parse_quote! {
            struct R {
                #[heron(session = "a")]
                a: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("unknown source"));
    }

    #[test]
    fn test_two_sources_in_one_annotation_rejected() {
        let err = parse(parse_quote! {
            struct R {
                #[heron(query = "a", cookie = "a")]
                a: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("at most one"));
    }

    #[test]
    fn test_non_string_payload_rejected() {
        assert!(parse(parse_quote! {
            struct R {
                #[heron(query = 3)]
                a: u8,
            }
        })
        .is_err());
    }

    #[test]
    fn test_list_syntax_rejected() {
        assert!(parse(parse_quote! {
            struct R {
                #[heron(query(name = "a"))]
                a: u8,
            }
        })
        .is_err());
    }

    #[test]
    fn test_tuple_struct_rejected() {
        assert!(parse(parse_quote! { struct R(u8); }).is_err());
    }

    #[test]
    fn test_enum_rejected() {
        assert!(parse(parse_quote! { enum R { A } }).is_err());
    }

    #[test]
    fn test_generics_rejected() {
        assert!(parse(parse_quote! { struct R<T> { a: T } }).is_err());
    }
}
