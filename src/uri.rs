//! Virtual URIs addressing entries through a resource loader
//!
//! A virtual URI has the text form `<scheme>:<path>`. It never carries an
//! authority, query or fragment, and its path is kept exactly as written:
//! decoding only happens when a connection asks the loader for bytes.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;

use crate::error::{NestError, Result};

/// Scheme served by the nested container handler
pub const SCHEME: &str = "antlib";

/// `SCHEME` followed by the separating colon
pub const SCHEME_PREFIX: &str = "antlib:";

/// Base path that makes a relative reference resolve to itself
pub const ROOT_MARKER: &str = "./";

/// Separator between path segments
pub const PATH_SEPARATOR: &str = "/";

/// Reference that resolves to the base path unchanged
pub const SELF_REFERENCE: &str = "#runtime";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualUri {
    scheme: String,
    authority: String,
    path: String,
}

impl VirtualUri {
    /// Build a URI for `scheme` with an empty authority.
    pub fn new(scheme: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: String::new(),
            path: path.into(),
        }
    }

    /// Build a URI in the nested container scheme.
    pub fn nested(path: impl Into<String>) -> Self {
        Self::new(SCHEME, path)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The undecoded path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decode the path the way form-encoded text is decoded: `+` is a space,
    /// then `%XX` escapes are read as UTF-8.
    pub fn decoded_path(&self) -> Result<String> {
        let spaced: Cow<'_, str> = if self.path.contains('+') {
            Cow::Owned(self.path.replace('+', " "))
        } else {
            Cow::Borrowed(&self.path)
        };

        percent_decode_str(&spaced)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|e| NestError::MalformedReference {
                uri: self.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for VirtualUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.authority.is_empty() {
            write!(f, "{}:{}", self.scheme, self.path)
        } else {
            write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
        }
    }
}

/// Split `<scheme>:<rest>` when `text` starts with a syntactically valid scheme.
pub fn split_scheme(text: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = text.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some((scheme, rest))
    } else {
        None
    }
}
