// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Helpers and handlers shared by both document kinds.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::json;

use crate::error::ToolError;
use crate::model::{Document, FlowDocument, PagedDocument};
use crate::params::{describe, ParameterSet};
use crate::runtime::{ExecutionContext, ToolOutput};

pub(super) type OpResult = Result<ToolOutput, ToolError>;

/// Documents carrying free-form string metadata.
pub(super) trait PropertyBag {
    fn properties(&self) -> &BTreeMap<String, String>;
    fn properties_mut(&mut self) -> &mut BTreeMap<String, String>;
}

impl PropertyBag for PagedDocument {
    fn properties(&self) -> &BTreeMap<String, String> {
        PagedDocument::properties(self)
    }

    fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        PagedDocument::properties_mut(self)
    }
}

impl PropertyBag for FlowDocument {
    fn properties(&self) -> &BTreeMap<String, String> {
        FlowDocument::properties(self)
    }

    fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        FlowDocument::properties_mut(self)
    }
}

/// A required string that must contain something besides whitespace.
pub(super) fn non_empty(params: &ParameterSet, key: &str) -> Result<String, ToolError> {
    let value: String = params.required(key)?;
    if value.trim().is_empty() {
        return Err(ToolError::InvalidParameter {
            key: key.to_owned(),
            expected: "a non-empty string",
            actual: "\"\"".to_owned(),
        });
    }
    Ok(value)
}

pub(super) fn ensure_positive(key: &str, value: f64) -> Result<f64, ToolError> {
    if value > 0.0 {
        return Ok(value);
    }
    Err(ToolError::InvalidParameter {
        key: key.to_owned(),
        expected: "a positive number",
        actual: describe(&json!(value)),
    })
}

/// Inclusive float bounds check; the message carries the unrounded values.
pub(super) fn ensure_between(key: &str, value: f64, min: f64, max: f64) -> Result<f64, ToolError> {
    if (min..=max).contains(&value) {
        return Ok(value);
    }
    Err(ToolError::out_of_range_float(key, min, max, value))
}

pub(super) fn validate_property(params: &ParameterSet) -> Result<(), ToolError> {
    non_empty(params, "name")?;
    params.required::<String>("value")?;
    Ok(())
}

pub(super) fn set_property<D: Document + PropertyBag>(
    ctx: &mut ExecutionContext<'_, D>,
    params: &ParameterSet,
) -> OpResult {
    let name = non_empty(params, "name")?.trim().to_owned();
    let value: String = params.required("value")?;
    let previous = ctx.document_mut().properties_mut().insert(name.clone(), value.clone());
    let changed = previous.as_deref() != Some(value.as_str());
    if changed {
        ctx.mark_modified();
    }
    ToolOutput::typed(&json!({ "name": name, "value": value, "changed": changed }))
}

pub(super) fn get_properties<D: Document + PropertyBag>(
    ctx: &mut ExecutionContext<'_, D>,
    _params: &ParameterSet,
) -> OpResult {
    ToolOutput::typed(&json!({ "properties": ctx.document().properties() }))
}

/// Writes the current document to `outputPath` right away. Works the same in session and
/// transient mode and never counts as a modification.
pub(super) fn export<D: Document>(
    ctx: &mut ExecutionContext<'_, D>,
    _params: &ParameterSet,
) -> OpResult {
    let target = ctx
        .output_path()
        .map(Path::to_path_buf)
        .ok_or_else(|| ToolError::missing_parameter("outputPath"))?;
    ctx.export_to(&target)?;
    Ok(ToolOutput::message(format!("Exported document to {}.", target.display())))
}
