// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Page-oriented documents: fixed-size pages carrying positioned text, annotations and
//! watermarks, plus document-level bookmarks, attachments and properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::{decode_stored, encode_stored, Document, DocumentKind, FormatError};
use super::values::{Color, Point};

pub const LETTER_WIDTH: f64 = 612.0;
pub const LETTER_HEIGHT: f64 = 792.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagedDocument {
    pages: Vec<Page>,
    #[serde(default)]
    bookmarks: Vec<Bookmark>,
    #[serde(default)]
    attachments: Vec<Attachment>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl PagedDocument {
    /// A document with `page_count` blank letter-sized pages.
    pub fn with_blank_pages(page_count: usize) -> Self {
        Self { pages: (0..page_count).map(|_| Page::letter()).collect(), ..Self::default() }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    /// Inserts `page` so that it ends up at zero-based `index`; bookmarks keep pointing at the
    /// pages they referenced before.
    pub fn insert_page(&mut self, index: usize, page: Page) {
        let index = index.min(self.pages.len());
        self.pages.insert(index, page);
        for bookmark in &mut self.bookmarks {
            if bookmark.page > index {
                bookmark.page += 1;
            }
        }
    }

    /// Removes the page at zero-based `index` along with the bookmarks that targeted it.
    pub fn remove_page(&mut self, index: usize) -> Page {
        let removed = self.pages.remove(index);
        let page_number = index + 1;
        self.bookmarks.retain(|bookmark| bookmark.page != page_number);
        for bookmark in &mut self.bookmarks {
            if bookmark.page > page_number {
                bookmark.page -= 1;
            }
        }
        removed
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut Vec<Bookmark> {
        &mut self.bookmarks
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut Vec<Attachment> {
        &mut self.attachments
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }

    /// Plain text of each page, runs joined by newlines.
    pub fn page_texts(&self) -> Vec<String> {
        self.pages
            .iter()
            .map(|page| {
                page.texts.iter().map(|run| run.text.as_str()).collect::<Vec<_>>().join("\n")
            })
            .collect()
    }
}

impl Document for PagedDocument {
    const KIND: DocumentKind = DocumentKind::Paged;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        decode_stored(Self::KIND, bytes)
    }

    fn encode(&self) -> Result<Vec<u8>, FormatError> {
        encode_stored(Self::KIND, self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: u16,
    #[serde(default)]
    pub texts: Vec<TextRun>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rotation: 0,
            texts: Vec::new(),
            annotations: Vec::new(),
            watermark: None,
        }
    }

    pub fn letter() -> Self {
        Self::new(LETTER_WIDTH, LETTER_HEIGHT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: String,
    pub contents: String,
    pub points: Vec<Point>,
    pub color: Color,
}

/// A named jump target; `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub page: usize,
}

/// An embedded file; `data` holds the base64 payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub size: usize,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    pub text: String,
    pub color: Color,
    pub opacity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(title: &str, page: usize) -> Bookmark {
        Bookmark { title: title.to_owned(), page }
    }

    #[test]
    fn removing_a_page_drops_and_shifts_bookmarks() {
        let mut doc = PagedDocument::with_blank_pages(3);
        doc.bookmarks_mut().extend([bookmark("one", 1), bookmark("two", 2), bookmark("three", 3)]);

        doc.remove_page(1);

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.bookmarks(), &[bookmark("one", 1), bookmark("three", 2)]);
    }

    #[test]
    fn inserting_a_page_shifts_later_bookmarks() {
        let mut doc = PagedDocument::with_blank_pages(2);
        doc.bookmarks_mut().extend([bookmark("one", 1), bookmark("two", 2)]);

        doc.insert_page(1, Page::letter());

        assert_eq!(doc.bookmarks(), &[bookmark("one", 1), bookmark("two", 3)]);
    }

    #[test]
    fn encodes_and_decodes_through_the_stored_envelope() {
        let mut doc = PagedDocument::with_blank_pages(1);
        doc.pages_mut()[0].texts.push(TextRun {
            text: "Hello".to_owned(),
            x: 72.0,
            y: 720.0,
            font_size: 12.0,
        });
        let bytes = doc.encode().expect("encode");
        assert!(String::from_utf8_lossy(&bytes).contains("\"folio.paged\""));
        assert_eq!(PagedDocument::decode(&bytes).expect("decode"), doc);
    }
}
