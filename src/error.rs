// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Error taxonomy shared by every tool call.
//!
//! Each variant renders a stable, greppable message so callers and tests can pattern-match on
//! the text as well as on [`ErrorKind`].

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::{DocumentKind, FormatError};

/// Coarse classification of a [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    MissingSource,
    SessionNotFound,
    SessionBusy,
    ResourceNotFound,
    UpstreamFailure,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::MissingSource => "missing_source",
            Self::SessionNotFound => "session_not_found",
            Self::SessionBusy => "session_busy",
            Self::ResourceNotFound => "resource_not_found",
            Self::UpstreamFailure => "upstream_failure",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum ToolError {
    InvalidRequest(String),
    UnknownOperation {
        kind: DocumentKind,
        name: String,
        suggestion: Option<&'static str>,
    },
    MissingParameter {
        key: String,
    },
    InvalidParameter {
        key: String,
        expected: &'static str,
        actual: String,
    },
    OutOfRange {
        key: String,
        min: i64,
        max: i64,
        actual: i64,
    },
    OutOfRangeFloat {
        key: String,
        min: f64,
        max: f64,
        actual: f64,
    },
    NotOneOf {
        key: String,
        allowed: Vec<String>,
        actual: String,
    },
    MissingSource,
    SessionNotFound {
        session_id: String,
    },
    SessionBusy {
        session_id: String,
        waited: Duration,
    },
    ResourceNotFound {
        path: PathBuf,
    },
    Upstream {
        path: Option<PathBuf>,
        source: FormatError,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Internal(String),
}

impl ToolError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn missing_parameter(key: impl Into<String>) -> Self {
        Self::MissingParameter { key: key.into() }
    }

    pub fn out_of_range(key: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        Self::OutOfRange { key: key.into(), min, max, actual }
    }

    pub fn out_of_range_float(key: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        Self::OutOfRangeFloat { key: key.into(), min, max, actual }
    }

    pub fn not_one_of<T: fmt::Display>(
        key: impl Into<String>,
        allowed: &[T],
        actual: impl fmt::Display,
    ) -> Self {
        Self::NotOneOf {
            key: key.into(),
            allowed: allowed.iter().map(ToString::to_string).collect(),
            actual: actual.to_string(),
        }
    }

    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound { session_id: session_id.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_)
            | Self::UnknownOperation { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::OutOfRange { .. }
            | Self::OutOfRangeFloat { .. }
            | Self::NotOneOf { .. } => ErrorKind::InvalidRequest,
            Self::MissingSource => ErrorKind::MissingSource,
            Self::SessionNotFound { .. } => ErrorKind::SessionNotFound,
            Self::SessionBusy { .. } => ErrorKind::SessionBusy,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::Upstream { .. } | Self::Io { .. } => ErrorKind::UpstreamFailure,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(message) => f.write_str(message),
            Self::UnknownOperation { kind, name, suggestion } => {
                write!(f, "Unknown operation '{name}' for {kind} documents")?;
                if let Some(suggestion) = suggestion {
                    write!(f, " (did you mean '{suggestion}'?)")?;
                }
                Ok(())
            }
            Self::MissingParameter { key } => write!(f, "'{key}' is required"),
            Self::InvalidParameter { key, expected, actual } => {
                write!(f, "'{key}' must be {expected} (got {actual})")
            }
            Self::OutOfRange { key, min, max, actual } => {
                write!(f, "'{key}' must be between {min} and {max} (got {actual})")
            }
            Self::OutOfRangeFloat { key, min, max, actual } => {
                write!(f, "'{key}' must be between {min} and {max} (got {actual})")
            }
            Self::NotOneOf { key, allowed, actual } => {
                write!(f, "'{key}' must be one of {{{}}} (got {actual})", allowed.join(", "))
            }
            Self::MissingSource => f.write_str("either 'sessionId' or 'path' is required"),
            Self::SessionNotFound { session_id } => write!(f, "session '{session_id}' not found"),
            Self::SessionBusy { session_id, waited } => write!(
                f,
                "session '{session_id}' is busy (lock not acquired within {}ms)",
                waited.as_millis()
            ),
            Self::ResourceNotFound { path } => write!(f, "file not found: {}", path.display()),
            Self::Upstream { path: Some(path), source } => {
                write!(f, "cannot process document {}: {source}", path.display())
            }
            Self::Upstream { path: None, source } => write!(f, "cannot process document: {source}"),
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Startup-time registry misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateOperation { kind: DocumentKind, name: String },
    EmptyName { kind: DocumentKind },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOperation { kind, name } => {
                write!(f, "operation '{name}' is already registered for {kind} documents")
            }
            Self::EmptyName { kind } => {
                write!(f, "cannot register an unnamed operation for {kind} documents")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_their_greppable_forms() {
        let err = ToolError::out_of_range("pageIndex", 1, 3, 7);
        assert_eq!(err.to_string(), "'pageIndex' must be between 1 and 3 (got 7)");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = ToolError::out_of_range_float("x", 0.0, 612.0, 612.4);
        assert_eq!(err.to_string(), "'x' must be between 0 and 612 (got 612.4)");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = ToolError::not_one_of("rotation", &[0, 90, 180, 270], 45);
        assert_eq!(err.to_string(), "'rotation' must be one of {0, 90, 180, 270} (got 45)");

        let err = ToolError::missing_parameter("text");
        assert!(err.to_string().contains("is required"));

        let err = ToolError::UnknownOperation {
            kind: DocumentKind::Paged,
            name: "rotat".to_owned(),
            suggestion: Some("rotate"),
        };
        assert!(err.to_string().starts_with("Unknown operation 'rotat'"));
        assert!(err.to_string().contains("did you mean 'rotate'"));
    }

    #[test]
    fn session_and_file_errors_classify_separately() {
        assert_eq!(ToolError::session_not_found("x").kind(), ErrorKind::SessionNotFound);
        assert_eq!(
            ToolError::ResourceNotFound { path: PathBuf::from("a.json") }.kind(),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(ToolError::MissingSource.kind(), ErrorKind::MissingSource);
        assert!(ToolError::session_not_found("x").to_string().contains("not found"));
    }

    #[test]
    fn io_failures_count_as_upstream() {
        let err = ToolError::io("doc.json", io::Error::other("disk on fire"));
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert!(std::error::Error::source(&err).is_some());
    }
}
