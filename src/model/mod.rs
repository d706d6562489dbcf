// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Document model.
//!
//! The runtime hosts any [`Document`]; two kinds ship with the crate: page-oriented
//! [`PagedDocument`] and flowing-text [`FlowDocument`].

pub mod document;
pub mod flow;
pub mod ids;
pub mod paged;
pub mod values;

pub use document::{Document, DocumentKind, FormatError, UnknownDocumentKind};
pub use flow::{Cell, FlowBookmark, FlowDocument, Paragraph, Table};
pub use ids::{IdError, SessionId};
pub use paged::{Annotation, Attachment, Bookmark, Page, PagedDocument, TextRun, Watermark};
pub use values::{CellRange, Color, Point, TabAlignment, TabStop};
