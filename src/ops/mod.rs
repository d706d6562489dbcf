// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bundled operation sets, one registry per document kind.
//!
//! Handlers are plain functions: they read typed parameters, check content-dependent bounds
//! against the bound document before mutating, and call `mark_modified` only when something
//! actually changed.

mod common;
pub mod flow;
pub mod paged;
