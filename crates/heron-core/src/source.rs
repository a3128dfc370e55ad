//! Field source kinds.

use crate::DispatchError;
use std::fmt;
use std::str::FromStr;

/// Where within a request a record field reads its raw value from.
///
/// Each annotated field carries exactly one source kind. The annotation tag
/// names are the lowercase variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// URL query string (`?a=1&b=2`).
    Query,
    /// Request body: the whole JSON body, or a named form field.
    Body,
    /// Path parameter matched by the router.
    Path,
    /// Request header.
    Header,
    /// Cookie from the `Cookie` header.
    Cookie,
    /// Uploaded file part.
    File,
}

impl SourceKind {
    /// All source kinds, in annotation lookup order.
    pub const ALL: [SourceKind; 6] = [
        Self::Query,
        Self::Body,
        Self::Path,
        Self::Header,
        Self::Cookie,
        Self::File,
    ];

    /// Returns the annotation tag for this source.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::File => "file",
        }
    }

    /// Looks up a source kind by annotation tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SourceKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| DispatchError::UnsupportedSource(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(kind.to_string(), kind.tag());
        }
    }

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let err = "form".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedSource(ref tag) if tag == "form"));
        assert_eq!(err.error_code(), "UNSUPPORTED_SOURCE");
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(SourceKind::from_tag("Query"), None);
    }
}
