// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Drives one call through `Resolving -> Bound -> Executed -> Finalized`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::context::{CallPhase, DocumentSource, ExecutionContext};
use super::finalize::{commit_session, commit_transient, ResultEnvelope};
use crate::config::RuntimeConfig;
use crate::error::ToolError;
use crate::model::{Document, SessionId};
use crate::params::ParameterSet;
use crate::registry::{Handler, OperationRegistry};
use crate::session::{CloseOutcome, SessionStore};
use crate::store::load_document;

/// One `Execute(operation, path?, sessionId?, outputPath?, ...params)` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCall {
    pub operation: String,
    pub path: Option<String>,
    pub session_id: Option<String>,
    pub output_path: Option<String>,
    pub params: ParameterSet,
}

impl ToolCall {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), ..Self::default() }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn output(mut self, output_path: impl Into<String>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn params(mut self, params: ParameterSet) -> Self {
        self.params = params;
        self
    }
}

/// Hosts the operations of one document kind: a registry, a session store and the call
/// pipeline between them.
pub struct DocumentRuntime<D: Document> {
    registry: Arc<OperationRegistry<D>>,
    sessions: Arc<SessionStore<D>>,
    config: RuntimeConfig,
}

impl<D: Document> Clone for DocumentRuntime<D> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            sessions: Arc::clone(&self.sessions),
            config: self.config,
        }
    }
}

impl<D: Document> DocumentRuntime<D> {
    pub fn new(registry: OperationRegistry<D>, config: RuntimeConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(&config));
        Self::with_sessions(registry, sessions, config)
    }

    /// Builds a runtime around an existing store, e.g. one shared with another component.
    pub fn with_sessions(
        registry: OperationRegistry<D>,
        sessions: Arc<SessionStore<D>>,
        config: RuntimeConfig,
    ) -> Self {
        Self { registry: Arc::new(registry), sessions, config }
    }

    pub fn registry(&self) -> &OperationRegistry<D> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<SessionStore<D>> {
        &self.sessions
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn open_session(&self, path: impl AsRef<Path>) -> Result<SessionId, ToolError> {
        self.sessions.open(path)
    }

    pub async fn close_session(
        &self,
        session_id: &str,
        flush: bool,
    ) -> Result<CloseOutcome, ToolError> {
        self.sessions.close(session_id, flush).await
    }

    pub async fn execute(&self, call: ToolCall) -> Result<ResultEnvelope, ToolError> {
        let ToolCall { operation, path, session_id, output_path, params } = call;
        debug!(kind = %D::KIND, operation = %operation, phase = %CallPhase::Resolving);

        let source = DocumentSource::resolve(path.as_deref(), session_id.as_deref())?;
        if let DocumentSource::Session(session_id) = &source {
            self.sessions.get(session_id.as_str())?;
        }
        let handler = self.registry.prepare(&operation, &params)?;
        let output_path =
            output_path.as_deref().map(str::trim).filter(|raw| !raw.is_empty()).map(PathBuf::from);

        match source {
            DocumentSource::Session(session_id) => {
                self.run_in_session(handler.as_ref(), session_id, output_path, &params).await
            }
            DocumentSource::Path(source_path) => {
                self.run_transient(handler.as_ref(), source_path, output_path, &params)
            }
        }
    }

    async fn run_in_session(
        &self,
        handler: &dyn Handler<D>,
        session_id: SessionId,
        output_path: Option<PathBuf>,
        params: &ParameterSet,
    ) -> Result<ResultEnvelope, ToolError> {
        let mut guard = self.sessions.acquire(session_id.as_str()).await?;
        debug!(session_id = %session_id, operation = handler.name(), phase = %CallPhase::Bound);

        // The handler edits a working copy; the resident document is only replaced on success.
        let mut working = guard.document().clone();
        let mut ctx = ExecutionContext::for_session(
            &mut working,
            session_id.clone(),
            guard.source_path().map(Path::to_path_buf),
            output_path.clone(),
            self.config.durability,
        );
        let data = handler.execute(&mut ctx, params)?;
        let effects = ctx.finish();
        debug!(
            session_id = %session_id,
            operation = handler.name(),
            modified = effects.modified,
            phase = %CallPhase::Executed
        );

        if let Some(path) = &output_path {
            if !effects.exports.contains(path) {
                warn!(
                    session_id = %session_id,
                    path = %path.display(),
                    "outputPath ignored for session calls; use export or session.save"
                );
            }
        }

        let envelope = commit_session(&mut guard, working, effects, data);
        debug!(session_id = %session_id, phase = %CallPhase::Finalized);
        Ok(envelope)
    }

    fn run_transient(
        &self,
        handler: &dyn Handler<D>,
        source_path: PathBuf,
        output_path: Option<PathBuf>,
        params: &ParameterSet,
    ) -> Result<ResultEnvelope, ToolError> {
        let mut document = load_document::<D>(&source_path)?;
        debug!(
            path = %source_path.display(),
            operation = handler.name(),
            phase = %CallPhase::Bound
        );

        let mut ctx = ExecutionContext::transient(
            &mut document,
            source_path.clone(),
            output_path.clone(),
            self.config.durability,
        );
        let data = handler.execute(&mut ctx, params)?;
        let effects = ctx.finish();
        debug!(
            path = %source_path.display(),
            operation = handler.name(),
            modified = effects.modified,
            phase = %CallPhase::Executed
        );

        let envelope = commit_transient(
            &document,
            &source_path,
            output_path.as_deref(),
            effects,
            data,
            self.config.durability,
        )?;
        debug!(path = %source_path.display(), phase = %CallPhase::Finalized);
        Ok(envelope)
    }
}
