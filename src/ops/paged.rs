// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Operations for page-oriented documents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::{NoExpand, Regex, RegexBuilder};
use serde_json::json;

use super::common::{self, ensure_between, ensure_positive, non_empty, OpResult};
use crate::error::{RegistryError, ToolError};
use crate::model::paged::{LETTER_HEIGHT, LETTER_WIDTH};
use crate::model::{
    Annotation, Attachment, Bookmark, Color, Page, PagedDocument, TextRun, Watermark,
};
use crate::params::{describe, ensure_one_of, ensure_range, ParameterSet, PointList};
use crate::registry::{Operation, OperationRegistry};
use crate::runtime::{ExecutionContext, ToolOutput};

type Ctx<'a> = ExecutionContext<'a, PagedDocument>;

const ROTATIONS: [i64; 4] = [0, 90, 180, 270];
const ANNOTATION_KINDS: [&str; 4] = ["note", "highlight", "ink", "line"];
const MAX_PAGES_PER_ADD: i64 = 100;
const MARGIN: f64 = 72.0;
const DEFAULT_FONT_SIZE: f64 = 12.0;
const DEFAULT_WATERMARK_OPACITY: f64 = 0.3;
const DEFAULT_REDACTION: &str = "[REDACTED]";
const HIGHLIGHT: Color = Color::rgb(255, 255, 0);

pub fn operations() -> Vec<Operation<PagedDocument>> {
    vec![
        Operation::new("add", "Insert blank pages", add_pages).validated_by(validate_add),
        Operation::new("delete", "Delete one page", delete_page),
        Operation::new("rotate", "Rotate one page or every page", rotate)
            .validated_by(validate_rotate),
        Operation::new("add_text", "Place a run of text on a page", add_text)
            .validated_by(validate_add_text),
        Operation::new("get_content", "Extract the text of one or all pages", get_content),
        Operation::new("get_info", "Page sizes and document counts", get_info),
        Operation::new("add_bookmark", "Bookmark a page", add_bookmark)
            .validated_by(validate_title),
        Operation::new("delete_bookmark", "Remove a bookmark by title", delete_bookmark)
            .validated_by(validate_title),
        Operation::new("get_bookmarks", "List bookmarks", get_bookmarks),
        Operation::new("add_annotation", "Annotate a page with a point list", add_annotation)
            .validated_by(validate_annotation),
        Operation::new("add_watermark", "Watermark one page or every page", add_watermark)
            .validated_by(validate_watermark),
        Operation::new("add_attachment", "Embed a base64 payload", add_attachment)
            .validated_by(validate_attachment),
        Operation::new("redact", "Replace text matching a pattern", redact)
            .validated_by(validate_redact),
        Operation::new(
            "set_property",
            "Set a metadata property",
            common::set_property::<PagedDocument>,
        )
        .validated_by(common::validate_property),
        Operation::new(
            "get_properties",
            "List metadata properties",
            common::get_properties::<PagedDocument>,
        ),
        Operation::new(
            "export",
            "Write the document to outputPath",
            common::export::<PagedDocument>,
        ),
    ]
}

pub fn registry() -> Result<OperationRegistry<PagedDocument>, RegistryError> {
    OperationRegistry::from_operations(operations())
}

/// The zero-based page named by `pageIndex`, or the first page when absent.
fn target_page(ctx: &Ctx<'_>, params: &ParameterSet) -> Result<usize, ToolError> {
    let page_count = ctx.document().page_count();
    match params.optional_index_in("pageIndex", page_count)? {
        Some(index) => Ok(index),
        None if page_count > 0 => Ok(0),
        None => Err(ToolError::invalid_request("document has no pages")),
    }
}

/// `pageIndex` if given, otherwise every page.
fn selected_pages(ctx: &Ctx<'_>, params: &ParameterSet) -> Result<Vec<usize>, ToolError> {
    let page_count = ctx.document().page_count();
    Ok(match params.optional_index_in("pageIndex", page_count)? {
        Some(index) => vec![index],
        None => (0..page_count).collect(),
    })
}

fn validate_add(params: &ParameterSet) -> Result<(), ToolError> {
    if let Some(count) = params.optional::<i64>("count")? {
        ensure_range("count", count, 1, MAX_PAGES_PER_ADD)?;
    }
    for key in ["width", "height"] {
        if let Some(size) = params.optional::<f64>(key)? {
            ensure_positive(key, size)?;
        }
    }
    Ok(())
}

fn add_pages(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let count = params.optional_or::<usize>("count", 1)?;
    let width = params.optional_or("width", LETTER_WIDTH)?;
    let height = params.optional_or("height", LETTER_HEIGHT)?;
    let page_count = ctx.document().page_count();
    let at = params.optional_index_in("pageIndex", page_count + 1)?.unwrap_or(page_count);

    for offset in 0..count {
        ctx.document_mut().insert_page(at + offset, Page::new(width, height));
    }
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "inserted": count,
        "at": at + 1,
        "pageCount": ctx.document().page_count(),
    }))
}

fn delete_page(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let index = params.index_in("pageIndex", ctx.document().page_count())?;
    ctx.document_mut().remove_page(index);
    ctx.mark_modified();
    Ok(ToolOutput::message(format!(
        "Deleted page {}. Remaining pages: {}.",
        index + 1,
        ctx.document().page_count()
    )))
}

fn validate_rotate(params: &ParameterSet) -> Result<(), ToolError> {
    ensure_one_of("rotation", params.required::<i64>("rotation")?, &ROTATIONS)?;
    Ok(())
}

fn rotate(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let rotation = ensure_one_of("rotation", params.required::<i64>("rotation")?, &ROTATIONS)?;
    let rotation = rotation as u16;
    let pages = selected_pages(ctx, params)?;

    let mut changed = false;
    for &index in &pages {
        let page = &mut ctx.document_mut().pages_mut()[index];
        changed |= page.rotation != rotation;
        page.rotation = rotation;
    }
    if changed {
        ctx.mark_modified();
    }
    let pages = pages.iter().map(|index| index + 1).collect::<Vec<_>>();
    ToolOutput::typed(&json!({ "rotation": rotation, "pages": pages }))
}

fn validate_add_text(params: &ParameterSet) -> Result<(), ToolError> {
    non_empty(params, "text")?;
    if let Some(size) = params.optional::<f64>("fontSize")? {
        ensure_between("fontSize", size, 1.0, 400.0)?;
    }
    Ok(())
}

fn add_text(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let text: String = params.required("text")?;
    let font_size = params.optional_or("fontSize", DEFAULT_FONT_SIZE)?;
    let index = target_page(ctx, params)?;
    let (width, height) = {
        let page = &ctx.document().pages()[index];
        (page.width, page.height)
    };
    let x = ensure_between("x", params.optional_or("x", MARGIN.min(width))?, 0.0, width)?;
    let y = params.optional_or("y", (height - MARGIN).max(0.0))?;
    let y = ensure_between("y", y, 0.0, height)?;

    ctx.document_mut().pages_mut()[index].texts.push(TextRun { text, x, y, font_size });
    ctx.mark_modified();
    Ok(ToolOutput::message(format!("Added text to page {}.", index + 1)))
}

fn get_content(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let texts = ctx.document().page_texts();
    let pages = selected_pages(ctx, params)?
        .into_iter()
        .map(|index| json!({ "page": index + 1, "text": texts[index] }))
        .collect::<Vec<_>>();
    ToolOutput::typed(&json!({ "pageCount": texts.len(), "pages": pages }))
}

fn get_info(ctx: &mut Ctx<'_>, _params: &ParameterSet) -> OpResult {
    let doc = ctx.document();
    let pages = doc
        .pages()
        .iter()
        .enumerate()
        .map(|(index, page)| {
            json!({
                "page": index + 1,
                "width": page.width,
                "height": page.height,
                "rotation": page.rotation,
                "annotations": page.annotations.len(),
                "watermarked": page.watermark.is_some(),
            })
        })
        .collect::<Vec<_>>();
    ToolOutput::typed(&json!({
        "pageCount": doc.page_count(),
        "pages": pages,
        "bookmarks": doc.bookmarks().len(),
        "attachments": doc.attachments().len(),
        "properties": doc.properties(),
    }))
}

fn validate_title(params: &ParameterSet) -> Result<(), ToolError> {
    non_empty(params, "title").map(|_| ())
}

fn add_bookmark(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let title = non_empty(params, "title")?;
    let index = params.index_in("pageIndex", ctx.document().page_count())?;
    if ctx.document().bookmarks().iter().any(|bookmark| bookmark.title == title) {
        return Err(ToolError::invalid_request(format!("bookmark '{title}' already exists")));
    }
    ctx.document_mut().bookmarks_mut().push(Bookmark { title: title.clone(), page: index + 1 });
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "title": title,
        "page": index + 1,
        "bookmarkCount": ctx.document().bookmarks().len(),
    }))
}

fn delete_bookmark(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let title = non_empty(params, "title")?;
    let bookmarks = ctx.document_mut().bookmarks_mut();
    let Some(position) = bookmarks.iter().position(|bookmark| bookmark.title == title) else {
        return Err(ToolError::invalid_request(format!("bookmark '{title}' not found")));
    };
    bookmarks.remove(position);
    ctx.mark_modified();
    Ok(ToolOutput::message(format!("Deleted bookmark '{title}'.")))
}

fn get_bookmarks(ctx: &mut Ctx<'_>, _params: &ParameterSet) -> OpResult {
    ToolOutput::typed(&json!({ "bookmarks": ctx.document().bookmarks() }))
}

fn annotation_kind(params: &ParameterSet) -> Result<String, ToolError> {
    let kind = params.optional_or("kind", "note".to_owned())?.trim().to_ascii_lowercase();
    ensure_one_of("kind", kind.as_str(), &ANNOTATION_KINDS)?;
    Ok(kind)
}

fn validate_annotation(params: &ParameterSet) -> Result<(), ToolError> {
    let kind = annotation_kind(params)?;
    let PointList(points) = params.required("points")?;
    if kind == "line" && points.len() != 2 {
        return Err(ToolError::invalid_request(format!(
            "'points' must contain exactly 2 points for a line annotation (got {})",
            points.len()
        )));
    }
    params.optional::<Color>("color")?;
    Ok(())
}

fn add_annotation(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let kind = annotation_kind(params)?;
    let PointList(points) = params.required("points")?;
    let color = params.optional_or("color", HIGHLIGHT)?;
    let contents = params.optional_or("contents", String::new())?;
    let index = params.index_in("pageIndex", ctx.document().page_count())?;

    let page = &ctx.document().pages()[index];
    if let Some(outside) = points
        .iter()
        .find(|p| !(0.0..=page.width).contains(&p.x) || !(0.0..=page.height).contains(&p.y))
    {
        return Err(ToolError::invalid_request(format!(
            "annotation point ({}, {}) is outside page {} ({} x {})",
            outside.x,
            outside.y,
            index + 1,
            page.width,
            page.height
        )));
    }

    let point_count = points.len();
    let page = &mut ctx.document_mut().pages_mut()[index];
    page.annotations.push(Annotation { kind: kind.clone(), contents, points, color });
    let annotation_count = page.annotations.len();
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "page": index + 1,
        "kind": kind,
        "pointCount": point_count,
        "annotationCount": annotation_count,
    }))
}

fn watermark_opacity(params: &ParameterSet) -> Result<f64, ToolError> {
    let opacity = params.optional_or("opacity", DEFAULT_WATERMARK_OPACITY)?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(ToolError::InvalidParameter {
            key: "opacity".to_owned(),
            expected: "a number between 0 and 1",
            actual: describe(&json!(opacity)),
        });
    }
    Ok(opacity)
}

fn validate_watermark(params: &ParameterSet) -> Result<(), ToolError> {
    non_empty(params, "text")?;
    watermark_opacity(params)?;
    params.optional::<Color>("color")?;
    Ok(())
}

fn add_watermark(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let watermark = Watermark {
        text: non_empty(params, "text")?,
        color: params.optional_or("color", Color::GRAY)?,
        opacity: watermark_opacity(params)?,
    };
    let pages = selected_pages(ctx, params)?;
    for &index in &pages {
        ctx.document_mut().pages_mut()[index].watermark = Some(watermark.clone());
    }
    if !pages.is_empty() {
        ctx.mark_modified();
    }
    let pages = pages.iter().map(|index| index + 1).collect::<Vec<_>>();
    ToolOutput::typed(&json!({ "pages": pages, "color": watermark.color }))
}

fn decoded_attachment(params: &ParameterSet) -> Result<Vec<u8>, ToolError> {
    let data: String = params.required("data")?;
    STANDARD.decode(data.trim()).map_err(|_| ToolError::InvalidParameter {
        key: "data".to_owned(),
        expected: "base64-encoded data",
        actual: describe(&json!(data)),
    })
}

fn validate_attachment(params: &ParameterSet) -> Result<(), ToolError> {
    non_empty(params, "name")?;
    decoded_attachment(params)?;
    params.optional::<String>("mimeType")?;
    Ok(())
}

fn add_attachment(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let name = non_empty(params, "name")?;
    let bytes = decoded_attachment(params)?;
    let mime_type = params.optional::<String>("mimeType")?;
    if ctx.document().attachments().iter().any(|attachment| attachment.name == name) {
        return Err(ToolError::invalid_request(format!("attachment '{name}' already exists")));
    }
    ctx.document_mut().attachments_mut().push(Attachment {
        name: name.clone(),
        mime_type,
        size: bytes.len(),
        data: STANDARD.encode(&bytes),
    });
    ctx.mark_modified();
    ToolOutput::typed(&json!({
        "name": name,
        "size": bytes.len(),
        "attachmentCount": ctx.document().attachments().len(),
    }))
}

fn redaction_pattern(params: &ParameterSet) -> Result<Regex, ToolError> {
    let pattern = non_empty(params, "pattern")?;
    let case_insensitive = params.optional_or("caseInsensitive", false)?;
    RegexBuilder::new(&pattern).case_insensitive(case_insensitive).build().map_err(|_| {
        ToolError::InvalidParameter {
            key: "pattern".to_owned(),
            expected: "a valid regular expression",
            actual: describe(&json!(pattern)),
        }
    })
}

fn validate_redact(params: &ParameterSet) -> Result<(), ToolError> {
    redaction_pattern(params)?;
    params.optional::<String>("replacement")?;
    Ok(())
}

fn redact(ctx: &mut Ctx<'_>, params: &ParameterSet) -> OpResult {
    let pattern = redaction_pattern(params)?;
    let replacement = params.optional_or("replacement", DEFAULT_REDACTION.to_owned())?;
    let pages = selected_pages(ctx, params)?;

    let mut matches = 0;
    let mut touched = Vec::new();
    for index in pages {
        let page = &mut ctx.document_mut().pages_mut()[index];
        let mut page_matches = 0;
        for run in &mut page.texts {
            let found = pattern.find_iter(&run.text).count();
            if found > 0 {
                run.text = pattern.replace_all(&run.text, NoExpand(&replacement)).into_owned();
                page_matches += found;
            }
        }
        if page_matches > 0 {
            touched.push(index + 1);
            matches += page_matches;
        }
    }
    if matches > 0 {
        ctx.mark_modified();
    }
    ToolOutput::typed(&json!({ "matches": matches, "pages": touched }))
}
