// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Disk persistence for documents.
//!
//! Reads go through [`load_document`]; every write goes through [`write_atomic`], which never
//! leaves a partially written target behind.

mod atomic;

pub use atomic::{load_document, write_atomic, write_document, WriteDurability};
