// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The call pipeline shared by every operation: source resolution, binding, dispatch and
//! finalization.

mod context;
mod engine;
mod finalize;

pub use context::{CallEffects, CallPhase, DocumentSource, ExecutionContext, SourceKind};
pub use engine::{DocumentRuntime, ToolCall};
pub use finalize::{CommitOutcome, ResultEnvelope, ToolOutput};
