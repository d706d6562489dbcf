// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Operations for flowing-text documents.

use serde_json::json;

use super::common::{self, non_empty, OpResult};
use crate::error::{RegistryError, ToolError};
use crate::model::values::column_letters;
use crate::model::{Cell, CellRange, FlowBookmark, FlowDocument, Paragraph, Table};
use crate::params::{ensure_one_of, ensure_range, ColorMap, ParameterSet, TabStops};
use crate::registry::{Operation, OperationRegistry};
use crate::runtime::{ExecutionContext, ToolOutput};

type Ctx<'a> = ExecutionContext<'a, FlowDocument>;

const MAX_ROWS: i64 = 500;
const MAX_COLUMNS: i64 = 64;
const SHADING_ROLES: [&str; 3] = ["header", "body", "banded"];

pub fn operations() -> Vec<Operation<FlowDocument>> {
    vec![
        Operation::new("add_paragraph", "Insert a paragraph", add_paragraph)
            .validated_by(validate_add_paragraph),
        Operation::new("get_text", "Paragraph text with header and footer", get_text),
        Operation::new("add_table", "Append a table", add_table).validated_by(validate_add_table),
        Operation::new("add_row", "Insert a table row", add_row),
        Operation::new("delete_row", "Delete a table row", delete_row),
        Operation::new("edit_cell", "Replace the text of one cell", edit_cell)
            .validated_by(validate_edit_cell),
        Operation::new("merge_cells", "Merge a rectangular cell range", merge_cells)
            .validated_by(validate_merge),
        Operation::new("shade_table", "Set fill colors by table role", shade_table)
            .validated_by(validate_shading),
        Operation::new("set_tab_stops", "Replace a paragraph's tab stops", set_tab_stops)
            .validated_by(validate_tab_stops),
        Operation::new("get_tables", "Table contents and merges", get_tables),
        Operation::new("set_header", "Set or clear the running header", set_header),
        Operation::new("set_footer", "Set or clear the running footer", set_footer),
        Operation::new("add_bookmark", "Bookmark a paragraph", add_bookmark)
            .validated_by(validate_bookmark),
        Operation::new("get_bookmarks", "List bookmarks", get_bookmarks),
        Operation::new(
            "set_property",
            "Set a metadata property",
            common::set_property::<FlowDocument>,
        )
        .validated_by(common::validate_property),
        Operation::new(
            "get_properties",
            "List metadata properties",
            common::get_properties::<FlowDocument>,
        ),
        Operation::new(
            "export",
            "Write the document to outputPath",
            common::export::<FlowDocument>,
        ),
    ]
}

pub fn registry() -> Result<OperationRegistry<FlowDocument>, RegistryError> {
    OperationRegistry::from_operations(operations())
}

fn table_index(ctx: &Ctx<'_>, params: &ParameterSet) -> Result<usize, ToolError> {
    params.index_in("tableIndex", ctx.document().tables().len())
}

fn validate_add_paragraph(params: &ParameterSet) -> Result<(), ToolError> {
    params.required::<String>("text")?;
    params.optional::<String>("style")?;
    Ok(())
}

fn add_paragraph(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let mut paragraph = Paragraph::new(params.required::<String>("text")?);
    paragraph.style = params.optional("style")?;
    let count = ctx.document().paragraphs().len();
    let index = params.optional_index_in("paragraphIndex", count + 1)?.unwrap_or(count);

    ctx.document_mut().insert_paragraph(index, paragraph);
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "paragraphIndex": index + 1,
        "paragraphCount": ctx.document().paragraphs().len(),
    }))
}

fn get_text(ctx: &mut Ctx<'_>, _params: &ParameterSet) -> OpResult {
    let doc = ctx.document();
    let paragraphs = doc
        .paragraphs()
        .iter()
        .enumerate()
        .map(|(index, paragraph)| {
            json!({ "paragraphIndex": index + 1, "text": paragraph.text, "style": paragraph.style })
        })
        .collect::<Vec<_>>();
    ToolOutput::typed(&json!({
        "paragraphs": paragraphs,
        "header": doc.header(),
        "footer": doc.footer(),
        "text": doc.plain_text(),
    }))
}

fn validate_add_table(params: &ParameterSet) -> Result<(), ToolError> {
    let rows = ensure_range("rows", params.required("rows")?, 1, MAX_ROWS)?;
    let columns = ensure_range("columns", params.required("columns")?, 1, MAX_COLUMNS)?;
    if let Some(data) = params.optional::<Vec<Vec<String>>>("data")? {
        if data.len() as i64 > rows {
            return Err(ToolError::invalid_request(format!(
                "'data' has {} rows but the table has {rows}",
                data.len()
            )));
        }
        if let Some(row) = data.iter().find(|row| row.len() as i64 > columns) {
            return Err(ToolError::invalid_request(format!(
                "'data' row has {} cells but the table has {columns} columns",
                row.len()
            )));
        }
    }
    Ok(())
}

fn add_table(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let rows = params.required::<usize>("rows")?;
    let columns = params.required::<usize>("columns")?;
    let data = params.optional_or::<Vec<Vec<String>>>("data", Vec::new())?;

    let mut table = Table::new(rows, columns);
    for (row, values) in table.rows.iter_mut().zip(data) {
        for (cell, text) in row.iter_mut().zip(values) {
            cell.text = text;
        }
    }
    ctx.document_mut().tables_mut().push(table);
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "tableIndex": ctx.document().tables().len(),
        "rows": rows,
        "columns": columns,
    }))
}

fn add_row(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let table = table_index(ctx, params)?;
    let values = params.optional_or::<Vec<String>>("values", Vec::new())?;
    let (rows, columns) = {
        let table = &ctx.document().tables()[table];
        (table.row_count(), table.column_count())
    };
    if values.len() > columns {
        return Err(ToolError::invalid_request(format!(
            "'values' has {} cells but table {} has {columns} columns",
            values.len(),
            table + 1
        )));
    }
    let at = params.optional_index_in("rowIndex", rows + 1)?.unwrap_or(rows);

    let cells = values.into_iter().map(|text| Cell { text }).collect();
    ctx.document_mut().tables_mut()[table].insert_row(at, cells);
    ctx.mark_modified();
    ToolOutput::typed(&json!({ "tableIndex": table + 1, "rowIndex": at + 1, "rows": rows + 1 }))
}

fn delete_row(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let table = table_index(ctx, params)?;
    let rows = ctx.document().tables()[table].row_count();
    let row = params.index_in("rowIndex", rows)?;
    if rows == 1 {
        return Err(ToolError::invalid_request(format!(
            "cannot delete the only row of table {}",
            table + 1
        )));
    }
    ctx.document_mut().tables_mut()[table].remove_row(row);
    ctx.mark_modified();
    Ok(ToolOutput::message(format!(
        "Deleted row {} from table {}. Remaining rows: {}.",
        row + 1,
        table + 1,
        rows - 1
    )))
}

fn validate_edit_cell(params: &ParameterSet) -> Result<(), ToolError> {
    params.required::<String>("text")?;
    Ok(())
}

fn edit_cell(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let table_idx = table_index(ctx, params)?;
    let text: String = params.required("text")?;
    let table = &ctx.document().tables()[table_idx];
    let row = params.index_in("rowIndex", table.row_count())?;
    let column = params.index_in("columnIndex", table.column_count())?;
    let cell_name = format!("{}{}", column_letters(column), row + 1);
    if let Some(range) = table.merge_at(row, column) {
        if (range.start_row, range.start_col) != (row, column) {
            return Err(ToolError::invalid_request(format!(
                "cell {cell_name} is covered by merged range {range}; edit {}{} instead",
                column_letters(range.start_col),
                range.start_row + 1
            )));
        }
    }

    let cell = &mut ctx.document_mut().tables_mut()[table_idx].rows[row][column];
    let changed = cell.text != text;
    cell.text = text;
    if changed {
        ctx.mark_modified();
    }
    ToolOutput::typed(&json!({
        "tableIndex": table_idx + 1,
        "cell": cell_name,
        "changed": changed,
    }))
}

fn validate_merge(params: &ParameterSet) -> Result<(), ToolError> {
    let range: CellRange = params.required("range")?;
    if range.is_single_cell() {
        return Err(ToolError::invalid_request(format!(
            "'range' must span more than one cell (got {range})"
        )));
    }
    Ok(())
}

fn merge_cells(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let table_idx = table_index(ctx, params)?;
    let range: CellRange = params.required("range")?;
    let table = &ctx.document().tables()[table_idx];
    let (rows, columns) = (table.row_count(), table.column_count());
    if range.end_row >= rows || range.end_col >= columns {
        let last = (rows.saturating_sub(1), columns.saturating_sub(1));
        let whole = CellRange::spanning((0, 0), last);
        return Err(ToolError::invalid_request(format!(
            "'range' must lie within {whole} (got {range})"
        )));
    }
    if let Some(existing) = table.merges.iter().find(|merged| merged.overlaps(&range)) {
        return Err(ToolError::invalid_request(format!(
            "'range' {range} overlaps merged range {existing}"
        )));
    }

    let table = &mut ctx.document_mut().tables_mut()[table_idx];
    table.merges.push(range);
    let merge_count = table.merges.len();
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "tableIndex": table_idx + 1,
        "range": range.to_string(),
        "mergeCount": merge_count,
    }))
}

fn shading_colors(params: &ParameterSet) -> Result<ColorMap, ToolError> {
    let ColorMap(colors) = params.required("colors")?;
    let mut normalized = std::collections::BTreeMap::new();
    for (role, color) in colors {
        let role = role.trim().to_ascii_lowercase();
        ensure_one_of("colors", role.as_str(), &SHADING_ROLES)?;
        normalized.insert(role, color);
    }
    Ok(ColorMap(normalized))
}

fn validate_shading(params: &ParameterSet) -> Result<(), ToolError> {
    shading_colors(params).map(|_| ())
}

fn shade_table(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let table_idx = table_index(ctx, params)?;
    let ColorMap(colors) = shading_colors(params)?;

    let table = &mut ctx.document_mut().tables_mut()[table_idx];
    let mut changed = false;
    for (role, color) in colors {
        changed |= table.shading.insert(role, color) != Some(color);
    }
    let shading = table.shading.clone();
    if changed {
        ctx.mark_modified();
    }
    ToolOutput::typed(&json!({ "tableIndex": table_idx + 1, "shading": shading }))
}

fn validate_tab_stops(params: &ParameterSet) -> Result<(), ToolError> {
    params.required::<TabStops>("tabStops")?;
    Ok(())
}

fn set_tab_stops(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let index = params.index_in("paragraphIndex", ctx.document().paragraphs().len())?;
    let TabStops(mut stops) = params.required("tabStops")?;
    stops.sort_by(|a, b| a.position.total_cmp(&b.position));
    if let Some(pair) = stops.windows(2).find(|pair| pair[0].position == pair[1].position) {
        return Err(ToolError::invalid_request(format!(
            "duplicate tab stop at {}",
            pair[0].position
        )));
    }

    let paragraph = &mut ctx.document_mut().paragraphs_mut()[index];
    let changed = paragraph.tab_stops != stops;
    paragraph.tab_stops = stops.clone();
    if changed {
        ctx.mark_modified();
    }
    ToolOutput::typed(&json!({ "paragraphIndex": index + 1, "tabStops": stops }))
}

fn get_tables(ctx: &mut Ctx<'_>, _params: &ParameterSet) -> OpResult {
    let tables = ctx
        .document()
        .tables()
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let cells = table
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.text.as_str()).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            let merges = table.merges.iter().map(ToString::to_string).collect::<Vec<_>>();
            json!({
                "tableIndex": index + 1,
                "rows": table.row_count(),
                "columns": table.column_count(),
                "cells": cells,
                "merges": merges,
                "shading": table.shading,
            })
        })
        .collect::<Vec<_>>();
    ToolOutput::typed(&json!({ "tables": tables }))
}

/// Absent or blank text clears the section.
fn section_text(params: &ParameterSet) -> Result<Option<String>, ToolError> {
    Ok(params.optional::<String>("text")?.filter(|text| !text.trim().is_empty()))
}

fn set_header(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let text = section_text(params)?;
    if ctx.document().header() != text.as_deref() {
        ctx.mark_modified();
    }
    let message = if text.is_some() { "Header set." } else { "Header cleared." };
    ctx.document_mut().set_header(text);
    Ok(ToolOutput::message(message))
}

fn set_footer(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let text = section_text(params)?;
    if ctx.document().footer() != text.as_deref() {
        ctx.mark_modified();
    }
    let message = if text.is_some() { "Footer set." } else { "Footer cleared." };
    ctx.document_mut().set_footer(text);
    Ok(ToolOutput::message(message))
}

fn validate_bookmark(params: &ParameterSet) -> Result<(), ToolError> {
    non_empty(params, "name").map(|_| ())
}

fn add_bookmark(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let name = non_empty(params, "name")?;
    let index = params.index_in("paragraphIndex", ctx.document().paragraphs().len())?;
    if ctx.document().bookmarks().iter().any(|bookmark| bookmark.name == name) {
        return Err(ToolError::invalid_request(format!("bookmark '{name}' already exists")));
    }
    let bookmark = FlowBookmark { name: name.clone(), paragraph: index + 1 };
    ctx.document_mut().bookmarks_mut().push(bookmark);
    ctx.mark_modified();
    ToolOutput::typed(&json!({ "name": name, "paragraphIndex": index + 1 }))
}

fn get_bookmarks(ctx: &mut Ctx<'_>, _params: &ParameterSet) -> OpResult {
    ToolOutput::typed(&json!({ "bookmarks": ctx.document().bookmarks() }))
}
