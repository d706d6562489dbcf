// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-call binding of a document to a handler.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ToolError;
use crate::model::{Document, SessionId};
use crate::store::{write_document, WriteDurability};

/// Where a call's document comes from. A session id always wins over a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Session(SessionId),
    Path(PathBuf),
}

impl DocumentSource {
    /// Blank strings count as absent. A session id that is not even well-formed cannot name a
    /// live session, so it fails as `SessionNotFound` rather than as a shape error.
    pub fn resolve(path: Option<&str>, session_id: Option<&str>) -> Result<Self, ToolError> {
        if let Some(raw) = session_id.map(str::trim).filter(|raw| !raw.is_empty()) {
            return SessionId::new(raw)
                .map(Self::Session)
                .map_err(|_| ToolError::session_not_found(raw));
        }
        match path.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Ok(Self::Path(PathBuf::from(raw))),
            None => Err(ToolError::MissingSource),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Session(_) => SourceKind::Session,
            Self::Path(_) => SourceKind::Transient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Session,
    Transient,
}

/// Lifecycle of one call: `Resolving -> Bound -> Executed -> Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Resolving,
    Bound,
    Executed,
    Finalized,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolving => "resolving",
            Self::Bound => "bound",
            Self::Executed => "executed",
            Self::Finalized => "finalized",
        })
    }
}

/// What a handler did besides returning its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallEffects {
    pub modified: bool,
    pub exports: Vec<PathBuf>,
}

/// The document a handler works on, plus the bookkeeping the finalizer needs.
///
/// Mutating the document does not by itself persist anything; handlers call
/// [`ExecutionContext::mark_modified`] when they changed it.
pub struct ExecutionContext<'a, D: Document> {
    document: &'a mut D,
    source_kind: SourceKind,
    session_id: Option<SessionId>,
    source_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    durability: WriteDurability,
    effects: CallEffects,
}

impl<'a, D: Document> ExecutionContext<'a, D> {
    pub fn for_session(
        document: &'a mut D,
        session_id: SessionId,
        source_path: Option<PathBuf>,
        output_path: Option<PathBuf>,
        durability: WriteDurability,
    ) -> Self {
        Self {
            document,
            source_kind: SourceKind::Session,
            session_id: Some(session_id),
            source_path,
            output_path,
            durability,
            effects: CallEffects::default(),
        }
    }

    pub fn transient(
        document: &'a mut D,
        source_path: PathBuf,
        output_path: Option<PathBuf>,
        durability: WriteDurability,
    ) -> Self {
        Self {
            document,
            source_kind: SourceKind::Transient,
            session_id: None,
            source_path: Some(source_path),
            output_path,
            durability,
            effects: CallEffects::default(),
        }
    }

    pub fn document(&self) -> &D {
        self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        self.document
    }

    pub fn mark_modified(&mut self) {
        self.effects.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.effects.modified
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn is_session(&self) -> bool {
        self.source_kind == SourceKind::Session
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Explicit export: writes the document as it is right now to `path`.
    pub fn export_to(&mut self, path: &Path) -> Result<(), ToolError> {
        write_document(path, &*self.document, self.durability)?;
        self.effects.exports.push(path.to_path_buf());
        Ok(())
    }

    pub fn exports(&self) -> &[PathBuf] {
        &self.effects.exports
    }

    pub(crate) fn finish(self) -> CallEffects {
        self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::PagedDocument;
    use crate::testing::TempDir;

    #[test]
    fn session_id_beats_path() {
        let source = DocumentSource::resolve(Some("doc.json"), Some("paged-abc")).expect("source");
        assert_eq!(source, DocumentSource::Session(SessionId::new("paged-abc").expect("id")));
        assert_eq!(source.kind(), SourceKind::Session);
    }

    #[test]
    fn blank_values_count_as_absent() {
        let source = DocumentSource::resolve(Some("doc.json"), Some("  ")).expect("source");
        assert_eq!(source, DocumentSource::Path(PathBuf::from("doc.json")));

        let err = DocumentSource::resolve(Some(""), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingSource);
    }

    #[test]
    fn malformed_session_ids_are_not_found() {
        let err = DocumentSource::resolve(None, Some("a/b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[test]
    fn mutation_alone_does_not_flag_the_context() {
        let mut doc = PagedDocument::with_blank_pages(1);
        let mut ctx = ExecutionContext::transient(
            &mut doc,
            PathBuf::from("doc.json"),
            None,
            WriteDurability::BestEffort,
        );
        ctx.document_mut().pages_mut()[0].rotation = 90;
        assert!(!ctx.is_modified());
        ctx.mark_modified();
        assert!(ctx.finish().modified);
    }

    #[test]
    fn export_writes_immediately_and_is_recorded() {
        let tmp = TempDir::new("context-export");
        let target = tmp.path().join("copy.json");
        let mut doc = PagedDocument::with_blank_pages(2);
        let mut ctx = ExecutionContext::for_session(
            &mut doc,
            SessionId::new("paged-1").expect("id"),
            None,
            None,
            WriteDurability::BestEffort,
        );

        ctx.export_to(&target).expect("export");

        assert!(target.is_file());
        let effects = ctx.finish();
        assert_eq!(effects.exports, vec![target]);
        assert!(!effects.modified);
    }
}
