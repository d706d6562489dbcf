// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Folio: a document lifecycle runtime.
//!
//! Operations on a document run either against a live, session-resident copy (opened once,
//! edited across many calls, saved explicitly) or as one-shot transient calls that load a file,
//! apply the operation and write the result back. Both paths share one pipeline:
//! [`runtime::DocumentRuntime::execute`] resolves the source, binds the document, dispatches
//! through an [`registry::OperationRegistry`] and finalizes the result.

pub mod config;
pub mod error;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod params;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;
