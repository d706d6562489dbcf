// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `Execute(operation, path?, sessionId?, outputPath?, ...params)`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteParams {
    /// Operation name, matched case-insensitively (see `operations.list`).
    pub operation: String,
    /// Document file for a one-shot call. Ignored when `sessionId` is given.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
    /// Where a one-shot call writes its result; defaults to `path`. Export target for
    /// `export`.
    #[serde(default, alias = "output_path")]
    pub output_path: Option<String>,
    /// Operation-specific parameters.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Operation fields plus the envelope keys (`isSession`, `sessionId`, `outputPath`,
/// `committed`) and a readable `summary` line block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteResponse {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionOpenParams {
    /// `paged` or `flow`.
    pub kind: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreateParams {
    pub kind: String,
    /// Blank pages for a new paged document (default 1).
    #[serde(default)]
    pub pages: Option<u32>,
    /// File that `session.save` writes to when no `outputPath` is given.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionOpenResponse {
    pub session_id: String,
    pub kind: String,
    pub source_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSaveParams {
    pub session_id: String,
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSaveResponse {
    pub session_id: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCloseParams {
    pub session_id: String,
    /// Write unsaved changes back to the source file before closing.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCloseResponse {
    pub session_id: String,
    pub had_unsaved_changes: bool,
    pub saved_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct McpSessionSummary {
    pub session_id: String,
    pub kind: String,
    pub source_path: Option<String>,
    pub dirty: bool,
    pub busy: bool,
    pub idle_ms: u64,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<McpSessionSummary>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OperationsListParams {
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpOperation {
    pub name: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperationsListResponse {
    pub kind: String,
    pub operations: Vec<McpOperation>,
}
