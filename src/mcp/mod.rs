// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! One `execute` tool per document kind plus session management tools, all backed by the
//! shared [`crate::runtime::DocumentRuntime`] pipeline.

mod server;
mod types;

pub use server::FolioMcp;
