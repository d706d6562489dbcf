// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The seam between the runtime and the document engine.
//!
//! The runtime treats a document as an opaque, cloneable, mutable value. All it needs from a
//! document kind is a way to decode it from bytes and encode it back.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    Paged,
    Flow,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paged => "paged",
            Self::Flow => "flow",
        }
    }

    pub fn format_tag(self) -> &'static str {
        match self {
            Self::Paged => "folio.paged",
            Self::Flow => "folio.flow",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = UnknownDocumentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paged" => Ok(Self::Paged),
            "flow" => Ok(Self::Flow),
            _ => Err(UnknownDocumentKind(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDocumentKind(pub String);

impl fmt::Display for UnknownDocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown document kind '{}' (expected 'paged' or 'flow')", self.0)
    }
}

impl std::error::Error for UnknownDocumentKind {}

/// A document kind the runtime can host.
///
/// Implementations must be cheap enough to clone once per session call: the runtime runs each
/// handler against a working copy and only swaps it in when the handler succeeds.
pub trait Document: Clone + Send + Sync + 'static {
    const KIND: DocumentKind;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError>;

    fn encode(&self) -> Result<Vec<u8>, FormatError>;
}

/// Failure reported by the document engine while decoding or encoding.
#[derive(Debug)]
pub enum FormatError {
    Json(serde_json::Error),
    WrongFormat { expected: &'static str, found: String },
    UnsupportedVersion { found: u32 },
    /// Well-formed JSON describing a structurally impossible document.
    Inconsistent(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(source) => write!(f, "malformed document: {source}"),
            Self::WrongFormat { expected, found } => {
                write!(f, "unsupported format '{found}' (expected '{expected}')")
            }
            Self::UnsupportedVersion { found } => write!(
                f,
                "unsupported format version {found} (expected {FORMAT_VERSION})"
            ),
            Self::Inconsistent(detail) => write!(f, "inconsistent document: {detail}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(source) => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json(source)
    }
}

#[derive(Deserialize)]
struct StoredDocument {
    format: String,
    version: u32,
    document: serde_json::Value,
}

#[derive(Serialize)]
struct StoredDocumentRef<'a, T> {
    format: &'static str,
    version: u32,
    document: &'a T,
}

pub(crate) fn decode_stored<T: DeserializeOwned>(
    kind: DocumentKind,
    bytes: &[u8],
) -> Result<T, FormatError> {
    let stored: StoredDocument = serde_json::from_slice(bytes)?;
    if stored.format != kind.format_tag() {
        return Err(FormatError::WrongFormat { expected: kind.format_tag(), found: stored.format });
    }
    if stored.version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion { found: stored.version });
    }
    Ok(serde_json::from_value(stored.document)?)
}

pub(crate) fn encode_stored<T: Serialize>(
    kind: DocumentKind,
    document: &T,
) -> Result<Vec<u8>, FormatError> {
    let stored = StoredDocumentRef { format: kind.format_tag(), version: FORMAT_VERSION, document };
    let mut bytes = serde_json::to_vec_pretty(&stored)?;
    bytes.push(b'\n');
    Ok(bytes)
}
