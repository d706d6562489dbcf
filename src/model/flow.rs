// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowing-text documents: paragraphs and tables in reading order, with a running header and
//! footer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::{decode_stored, encode_stored, Document, DocumentKind, FormatError};
use super::values::{CellRange, Color, TabStop};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(default)]
    bookmarks: Vec<FlowBookmark>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl FlowDocument {
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut Vec<Paragraph> {
        &mut self.paragraphs
    }

    /// Inserts `paragraph` at zero-based `index`; bookmarks keep their paragraphs.
    pub fn insert_paragraph(&mut self, index: usize, paragraph: Paragraph) {
        let index = index.min(self.paragraphs.len());
        self.paragraphs.insert(index, paragraph);
        for bookmark in &mut self.bookmarks {
            if bookmark.paragraph > index {
                bookmark.paragraph += 1;
            }
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut Vec<Table> {
        &mut self.tables
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn set_header(&mut self, header: Option<String>) {
        self.header = header;
    }

    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    pub fn set_footer(&mut self, footer: Option<String>) {
        self.footer = footer;
    }

    pub fn bookmarks(&self) -> &[FlowBookmark] {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut Vec<FlowBookmark> {
        &mut self.bookmarks
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }

    /// Paragraph text joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

impl Document for FlowDocument {
    const KIND: DocumentKind = DocumentKind::Flow;

    fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let document: Self = decode_stored(Self::KIND, bytes)?;
        for (index, table) in document.tables.iter().enumerate() {
            table.check_shape().map_err(|detail| {
                FormatError::Inconsistent(format!("table {}: {detail}", index + 1))
            })?;
        }
        Ok(document)
    }

    fn encode(&self) -> Result<Vec<u8>, FormatError> {
        encode_stored(Self::KIND, self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tab_stops: Vec<TabStop>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merges: Vec<CellRange>,
    /// Fill colors keyed by role: `header`, `body`, `banded`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shading: BTreeMap<String, Color>,
}

impl Table {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| vec![Cell::default(); columns]).collect(),
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Every row has the same length and every merge lies inside the grid.
    fn check_shape(&self) -> Result<(), String> {
        let columns = self.column_count();
        if let Some((row, cells)) =
            self.rows.iter().enumerate().find(|(_, cells)| cells.len() != columns)
        {
            return Err(format!(
                "row {} has {} cells, expected {columns}",
                row + 1,
                cells.len()
            ));
        }
        for range in &self.merges {
            let ordered = range.start_row <= range.end_row && range.start_col <= range.end_col;
            if !ordered || range.end_row >= self.rows.len() || range.end_col >= columns {
                return Err(format!(
                    "merge rows {}..={} cols {}..={} lies outside the {}x{columns} grid",
                    range.start_row + 1,
                    range.end_row + 1,
                    range.start_col + 1,
                    range.end_col + 1,
                    self.rows.len()
                ));
            }
        }
        Ok(())
    }

    /// Inserts `cells` as row `index`, padded or cut to the column count. Merges below move
    /// down; merges spanning the insertion point grow.
    pub fn insert_row(&mut self, index: usize, mut cells: Vec<Cell>) {
        let index = index.min(self.rows.len());
        cells.resize(self.column_count(), Cell::default());
        self.rows.insert(index, cells);
        for range in &mut self.merges {
            if range.start_row >= index {
                range.start_row += 1;
                range.end_row += 1;
            } else if range.end_row >= index {
                range.end_row += 1;
            }
        }
    }

    /// The merged range covering `(row, column)`, if any.
    pub fn merge_at(&self, row: usize, column: usize) -> Option<&CellRange> {
        self.merges.iter().find(|range| {
            (range.start_row..=range.end_row).contains(&row)
                && (range.start_col..=range.end_col).contains(&column)
        })
    }

    /// Removes row `index` and drops merges that covered it; merges below move up.
    pub fn remove_row(&mut self, index: usize) -> Vec<Cell> {
        let removed = self.rows.remove(index);
        self.merges.retain(|range| !(range.start_row..=range.end_row).contains(&index));
        for range in &mut self.merges {
            if range.start_row > index {
                range.start_row -= 1;
                range.end_row -= 1;
            }
        }
        removed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
}

/// A named position; `paragraph` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowBookmark {
    pub name: String,
    pub paragraph: usize,
}
