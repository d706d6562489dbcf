// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};

use crate::config::RuntimeConfig;
use crate::error::{ErrorKind, RegistryError, ToolError};
use crate::model::{Document, DocumentKind, FlowDocument, PagedDocument, SessionId};
use crate::ops;
use crate::params::{ensure_range, ParameterSet};
use crate::runtime::{DocumentRuntime, ToolCall};
use crate::session::SessionSummary;

use super::types::*;

const MAX_CREATE_PAGES: i64 = 1000;

#[derive(Clone)]
pub struct FolioMcp {
    paged: DocumentRuntime<PagedDocument>,
    flow: DocumentRuntime<FlowDocument>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FolioMcp {
    /// Builds a server hosting the bundled paged and flow operations.
    pub fn new(config: RuntimeConfig) -> Result<Self, RegistryError> {
        Ok(Self::with_runtimes(
            DocumentRuntime::new(ops::paged::registry()?, config),
            DocumentRuntime::new(ops::flow::registry()?, config),
        ))
    }

    pub fn with_runtimes(
        paged: DocumentRuntime<PagedDocument>,
        flow: DocumentRuntime<FlowDocument>,
    ) -> Self {
        Self { paged, flow, tool_router: Self::tool_router() }
    }

    pub fn paged(&self) -> &DocumentRuntime<PagedDocument> {
        &self.paged
    }

    pub fn flow(&self) -> &DocumentRuntime<FlowDocument> {
        &self.flow
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Evicts clean, unlocked sessions of both kinds idle for longer than `ttl`.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<SessionId> {
        let mut evicted = self.paged.sessions().evict_idle(ttl);
        evicted.extend(self.flow.sessions().evict_idle(ttl));
        evicted
    }

    /// Run one operation on a paged document, either a one-shot call on `path` or inside an
    /// open session (`sessionId`); list names with `operations.list`.
    #[tool(name = "paged.execute")]
    async fn paged_execute(
        &self,
        params: Parameters<ExecuteParams>,
    ) -> Result<Json<ExecuteResponse>, ErrorData> {
        execute_with(&self.paged, params.0).await
    }

    /// Run one operation on a flow document, either a one-shot call on `path` or inside an
    /// open session (`sessionId`); list names with `operations.list`.
    #[tool(name = "flow.execute")]
    async fn flow_execute(
        &self,
        params: Parameters<ExecuteParams>,
    ) -> Result<Json<ExecuteResponse>, ErrorData> {
        execute_with(&self.flow, params.0).await
    }

    /// Load a document file into a new session; pass the returned `sessionId` to
    /// `paged.execute`/`flow.execute`.
    #[tool(name = "session.open")]
    async fn session_open(
        &self,
        params: Parameters<SessionOpenParams>,
    ) -> Result<Json<SessionOpenResponse>, ErrorData> {
        let SessionOpenParams { kind, path } = params.0;
        let kind = parse_kind(&kind)?;
        let path = Path::new(path.trim());
        let session_id = match kind {
            DocumentKind::Paged => self.paged.open_session(path),
            DocumentKind::Flow => self.flow.open_session(path),
        }
        .map_err(map_tool_error)?;
        Ok(Json(SessionOpenResponse {
            session_id: session_id.into_string(),
            kind: kind.as_str().to_owned(),
            source_path: Some(path.display().to_string()),
        }))
    }

    /// Start a session on a new empty document (paged documents get `pages` blank pages).
    #[tool(name = "session.create")]
    async fn session_create(
        &self,
        params: Parameters<SessionCreateParams>,
    ) -> Result<Json<SessionOpenResponse>, ErrorData> {
        let SessionCreateParams { kind, pages, path } = params.0;
        let kind = parse_kind(&kind)?;
        let source_path: Option<PathBuf> =
            path.as_deref().map(str::trim).filter(|raw| !raw.is_empty()).map(PathBuf::from);
        let session_id = match kind {
            DocumentKind::Paged => {
                let pages = i64::from(pages.unwrap_or(1));
                let pages =
                    ensure_range("pages", pages, 1, MAX_CREATE_PAGES).map_err(map_tool_error)?;
                let document = PagedDocument::with_blank_pages(pages as usize);
                self.paged.sessions().adopt(document, source_path.clone())
            }
            DocumentKind::Flow => {
                self.flow.sessions().adopt(FlowDocument::default(), source_path.clone())
            }
        };
        Ok(Json(SessionOpenResponse {
            session_id: session_id.into_string(),
            kind: kind.as_str().to_owned(),
            source_path: source_path.map(|path| path.display().to_string()),
        }))
    }

    /// Write a session's document to `outputPath`, or back to the file it was opened from.
    #[tool(name = "session.save")]
    async fn session_save(
        &self,
        params: Parameters<SessionSaveParams>,
    ) -> Result<Json<SessionSaveResponse>, ErrorData> {
        let SessionSaveParams { session_id, output_path } = params.0;
        let session_id = session_id.trim();
        let output_path =
            output_path.as_deref().map(str::trim).filter(|raw| !raw.is_empty()).map(Path::new);
        let written = match self.kind_of_session(session_id)? {
            DocumentKind::Paged => self.paged.sessions().save(session_id, output_path).await,
            DocumentKind::Flow => self.flow.sessions().save(session_id, output_path).await,
        }
        .map_err(map_tool_error)?;
        Ok(Json(SessionSaveResponse {
            session_id: session_id.to_owned(),
            output_path: written.display().to_string(),
        }))
    }

    /// Close a session, waiting for any in-flight call; `save: true` first writes unsaved
    /// changes back to the source file.
    #[tool(name = "session.close")]
    async fn session_close(
        &self,
        params: Parameters<SessionCloseParams>,
    ) -> Result<Json<SessionCloseResponse>, ErrorData> {
        let SessionCloseParams { session_id, save } = params.0;
        let session_id = session_id.trim();
        let outcome = match self.kind_of_session(session_id)? {
            DocumentKind::Paged => self.paged.close_session(session_id, save).await,
            DocumentKind::Flow => self.flow.close_session(session_id, save).await,
        }
        .map_err(map_tool_error)?;
        Ok(Json(SessionCloseResponse {
            session_id: outcome.session_id.into_string(),
            had_unsaved_changes: outcome.was_dirty,
            saved_to: outcome.flushed_to.map(|path| path.display().to_string()),
        }))
    }

    /// List open sessions of both kinds, oldest first.
    #[tool(name = "session.list")]
    async fn session_list(&self) -> Result<Json<SessionListResponse>, ErrorData> {
        let mut sessions = self.paged.sessions().list();
        sessions.extend(self.flow.sessions().list());
        sessions.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(Json(SessionListResponse { sessions: sessions.into_iter().map(summarize).collect() }))
    }

    /// List the operations a document kind supports, with a one-line summary each.
    #[tool(name = "operations.list")]
    async fn operations_list(
        &self,
        params: Parameters<OperationsListParams>,
    ) -> Result<Json<OperationsListResponse>, ErrorData> {
        let kind = parse_kind(&params.0.kind)?;
        let described = match kind {
            DocumentKind::Paged => self.paged.registry().describe(),
            DocumentKind::Flow => self.flow.registry().describe(),
        };
        Ok(Json(OperationsListResponse {
            kind: kind.as_str().to_owned(),
            operations: described
                .into_iter()
                .map(|(name, summary)| McpOperation {
                    name: name.to_owned(),
                    summary: summary.to_owned(),
                })
                .collect(),
        }))
    }

    fn kind_of_session(&self, session_id: &str) -> Result<DocumentKind, ErrorData> {
        if self.paged.sessions().contains(session_id) {
            Ok(DocumentKind::Paged)
        } else if self.flow.sessions().contains(session_id) {
            Ok(DocumentKind::Flow)
        } else {
            Err(map_tool_error(ToolError::session_not_found(session_id)))
        }
    }
}

#[tool_handler]
impl ServerHandler for FolioMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Folio document server (tools: paged.execute, flow.execute, session.open, \
                 session.create, session.save, session.close, session.list, operations.list). \
                 Pass `path` for a one-shot call that writes back to the file (or `outputPath`), \
                 or open a session and pass `sessionId` to keep changes in memory until \
                 session.save/session.close."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

async fn execute_with<D: Document>(
    runtime: &DocumentRuntime<D>,
    params: ExecuteParams,
) -> Result<Json<ExecuteResponse>, ErrorData> {
    let ExecuteParams { operation, path, session_id, output_path, params } = params;
    let call = ToolCall {
        operation,
        path,
        session_id,
        output_path,
        params: ParameterSet::new(params),
    };
    let envelope = runtime.execute(call).await.map_err(map_tool_error)?;
    let mut fields = envelope.to_fields();
    fields.insert("summary".to_owned(), serde_json::Value::String(envelope.to_text()));
    Ok(Json(ExecuteResponse { fields }))
}

fn parse_kind(raw: &str) -> Result<DocumentKind, ErrorData> {
    raw.parse::<DocumentKind>().map_err(|err| {
        ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "kind": ErrorKind::InvalidRequest.as_str(), "value": raw })),
        )
    })
}

fn summarize(summary: SessionSummary) -> McpSessionSummary {
    McpSessionSummary {
        session_id: summary.session_id.into_string(),
        kind: summary.kind.as_str().to_owned(),
        source_path: summary.source_path.map(|path| path.display().to_string()),
        dirty: summary.dirty,
        busy: summary.busy,
        idle_ms: u64::try_from(summary.idle.as_millis()).unwrap_or(u64::MAX),
        created_at_ms: summary
            .created_at
            .duration_since(UNIX_EPOCH)
            .map(|since| u64::try_from(since.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default(),
    }
}

fn map_tool_error(err: ToolError) -> ErrorData {
    let kind = err.kind();
    let data = Some(serde_json::json!({ "kind": kind.as_str() }));
    let message = err.to_string();
    match kind {
        ErrorKind::InvalidRequest | ErrorKind::MissingSource => {
            ErrorData::invalid_params(message, data)
        }
        ErrorKind::SessionNotFound | ErrorKind::ResourceNotFound => {
            ErrorData::resource_not_found(message, data)
        }
        ErrorKind::SessionBusy => ErrorData::invalid_request(message, data),
        ErrorKind::UpstreamFailure | ErrorKind::Internal => {
            ErrorData::internal_error(message, data)
        }
    }
}
