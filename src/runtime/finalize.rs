// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Result finalization: decides whether and where a call's mutation persists, and wraps the
//! handler output in one envelope shape.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::context::CallEffects;
use crate::error::ToolError;
use crate::model::{Document, SessionId};
use crate::session::SessionGuard;
use crate::store::{write_document, WriteDurability};

/// What a handler returns: a legacy free-text message or structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Message(String),
    Typed(Value),
}

impl ToolOutput {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    pub fn typed<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        serde_json::to_value(value)
            .map(Self::Typed)
            .map_err(|err| ToolError::Internal(format!("cannot serialize result: {err}")))
    }

    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Message(text) => Some(text),
            Self::Typed(_) => None,
        }
    }

    pub fn as_typed(&self) -> Option<&Value> {
        match self {
            Self::Typed(value) => Some(value),
            Self::Message(_) => None,
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        Self::Typed(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Unchanged,
    /// Kept in memory; the session is now dirty.
    CommittedToSession,
    CommittedToFile(PathBuf),
}

impl CommitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::CommittedToSession => "session",
            Self::CommittedToFile(_) => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub data: ToolOutput,
    pub is_session: bool,
    pub session_id: Option<SessionId>,
    pub commit: CommitOutcome,
    /// Files written by explicit export operations during the call.
    pub exports: Vec<PathBuf>,
}

impl ResultEnvelope {
    pub fn commit_path(&self) -> Option<&Path> {
        match &self.commit {
            CommitOutcome::CommittedToFile(path) => Some(path),
            _ => None,
        }
    }

    /// `{ ...data, isSession, sessionId?, outputPath?, exports?, committed }`.
    ///
    /// Object data is spread into the envelope; any other typed value lands under `result` and
    /// a message under `message`. Envelope keys win over data keys of the same name.
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_fields())
    }

    /// The fields of [`Self::to_json`].
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut out = match &self.data {
            ToolOutput::Typed(Value::Object(fields)) => fields.clone(),
            ToolOutput::Typed(other) => {
                let mut fields = Map::new();
                fields.insert("result".to_owned(), other.clone());
                fields
            }
            ToolOutput::Message(text) => {
                let mut fields = Map::new();
                fields.insert("message".to_owned(), Value::String(text.clone()));
                fields
            }
        };
        out.insert("isSession".to_owned(), Value::Bool(self.is_session));
        if let Some(session_id) = &self.session_id {
            out.insert("sessionId".to_owned(), Value::String(session_id.to_string()));
        }
        if let Some(path) = self.commit_path() {
            out.insert("outputPath".to_owned(), Value::String(path.display().to_string()));
        }
        if !self.exports.is_empty() {
            let exports = self
                .exports
                .iter()
                .map(|path| Value::String(path.display().to_string()))
                .collect();
            out.insert("exports".to_owned(), Value::Array(exports));
        }
        out.insert("committed".to_owned(), Value::String(self.commit.as_str().to_owned()));
        out
    }

    /// Human-readable rendering that carries the same metadata as [`Self::to_json`].
    pub fn to_text(&self) -> String {
        let mut text = match &self.data {
            ToolOutput::Message(message) => message.clone(),
            ToolOutput::Typed(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        };
        if let Some(session_id) = &self.session_id {
            text.push_str(&format!("\nSession: {session_id}"));
            if self.commit == CommitOutcome::CommittedToSession {
                text.push_str(" (changes kept in session; not yet saved)");
            }
        }
        if let Some(path) = self.commit_path() {
            text.push_str(&format!("\nOutput: {}", path.display()));
        }
        for path in &self.exports {
            text.push_str(&format!("\nExported: {}", path.display()));
        }
        text
    }
}

/// Session finalization: a modified working copy replaces the resident document and the
/// session turns dirty. Nothing touches the disk.
pub(crate) fn commit_session<D: Document>(
    guard: &mut SessionGuard<D>,
    working: D,
    effects: CallEffects,
    data: ToolOutput,
) -> ResultEnvelope {
    let commit = if effects.modified {
        guard.replace_document(working);
        guard.mark_dirty();
        CommitOutcome::CommittedToSession
    } else {
        CommitOutcome::Unchanged
    };
    debug!(session_id = %guard.session_id(), commit = commit.as_str(), "finalized");
    ResultEnvelope {
        data,
        is_session: true,
        session_id: Some(guard.session_id().clone()),
        commit,
        exports: effects.exports,
    }
}

/// Transient finalization: a modified document is written atomically to `output_path`, or
/// over `source_path` when no output was given.
pub(crate) fn commit_transient<D: Document>(
    document: &D,
    source_path: &Path,
    output_path: Option<&Path>,
    effects: CallEffects,
    data: ToolOutput,
    durability: WriteDurability,
) -> Result<ResultEnvelope, ToolError> {
    let commit = if effects.modified {
        let target = output_path.unwrap_or(source_path);
        write_document(target, document, durability)?;
        info!(path = %target.display(), "document written");
        CommitOutcome::CommittedToFile(target.to_path_buf())
    } else {
        CommitOutcome::Unchanged
    };
    Ok(ResultEnvelope {
        data,
        is_session: false,
        session_id: None,
        commit,
        exports: effects.exports,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::PagedDocument;
    use crate::store::load_document;
    use crate::testing::TempDir;

    fn envelope(data: ToolOutput, commit: CommitOutcome) -> ResultEnvelope {
        ResultEnvelope {
            data,
            is_session: true,
            session_id: Some(SessionId::new("paged-1").expect("id")),
            commit,
            exports: Vec::new(),
        }
    }

    #[test]
    fn typed_objects_are_spread_into_the_envelope() {
        let out = envelope(
            ToolOutput::Typed(json!({ "pageCount": 3, "isSession": "spoofed" })),
            CommitOutcome::CommittedToSession,
        )
        .to_json();

        assert_eq!(
            out,
            json!({
                "pageCount": 3,
                "isSession": true,
                "sessionId": "paged-1",
                "committed": "session",
            })
        );
    }

    #[test]
    fn messages_and_scalars_get_their_own_keys() {
        let out = envelope(ToolOutput::message("Deleted page 1."), CommitOutcome::Unchanged);
        assert_eq!(out.to_json()["message"], json!("Deleted page 1."));

        let out = envelope(ToolOutput::Typed(json!([1, 2])), CommitOutcome::Unchanged);
        assert_eq!(out.to_json()["result"], json!([1, 2]));
    }

    #[test]
    fn text_rendering_mentions_the_session() {
        let text = envelope(ToolOutput::message("Added text."), CommitOutcome::CommittedToSession)
            .to_text();
        assert!(text.starts_with("Added text."));
        assert!(text.contains("Session: paged-1"));
        assert!(text.contains("session"));
    }

    #[test]
    fn transient_commit_writes_only_when_modified() {
        let tmp = TempDir::new("finalize-transient");
        let source = tmp.path().join("doc.json");
        let doc = PagedDocument::with_blank_pages(2);

        let untouched = commit_transient(
            &doc,
            &source,
            None,
            CallEffects::default(),
            ToolOutput::message("read"),
            WriteDurability::BestEffort,
        )
        .expect("unchanged");
        assert_eq!(untouched.commit, CommitOutcome::Unchanged);
        assert!(!source.exists());

        let output = tmp.path().join("out.json");
        let written = commit_transient(
            &doc,
            &source,
            Some(&output),
            CallEffects { modified: true, exports: Vec::new() },
            ToolOutput::message("changed"),
            WriteDurability::BestEffort,
        )
        .expect("written");
        assert_eq!(written.commit_path(), Some(output.as_path()));
        assert!(!source.exists());
        assert_eq!(load_document::<PagedDocument>(&output).expect("reload"), doc);
        assert_eq!(written.to_json()["outputPath"], json!(output.display().to_string()));
        assert_eq!(written.to_json()["isSession"], json!(false));
    }
}
