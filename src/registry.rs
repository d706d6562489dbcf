// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-kind operation tables.
//!
//! A registry is filled once at startup and only read afterwards. Lookup is case-insensitive;
//! registering the same name twice is a configuration error reported before any call runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{RegistryError, ToolError};
use crate::model::{Document, DocumentKind};
use crate::params::ParameterSet;
use crate::runtime::{ExecutionContext, ToolOutput};

/// Minimum similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// One named operation for one document kind.
///
/// Handlers must be stateless: the same instance is dispatched concurrently for unrelated
/// calls.
pub trait Handler<D: Document>: Send + Sync {
    fn name(&self) -> &'static str;

    fn summary(&self) -> &'static str {
        ""
    }

    /// Checks that depend only on the parameters. Runs before any lock or document is touched.
    fn validate(&self, _params: &ParameterSet) -> Result<(), ToolError> {
        Ok(())
    }

    fn execute(
        &self,
        ctx: &mut ExecutionContext<'_, D>,
        params: &ParameterSet,
    ) -> Result<ToolOutput, ToolError>;
}

pub type ValidateFn = fn(&ParameterSet) -> Result<(), ToolError>;
pub type ExecuteFn<D> =
    fn(&mut ExecutionContext<'_, D>, &ParameterSet) -> Result<ToolOutput, ToolError>;

/// A handler built from plain functions.
pub struct Operation<D: Document> {
    name: &'static str,
    summary: &'static str,
    validate: Option<ValidateFn>,
    execute: ExecuteFn<D>,
}

impl<D: Document> Operation<D> {
    pub fn new(name: &'static str, summary: &'static str, execute: ExecuteFn<D>) -> Self {
        Self { name, summary, validate: None, execute }
    }

    pub fn validated_by(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }
}

impl<D: Document> Handler<D> for Operation<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn summary(&self) -> &'static str {
        self.summary
    }

    fn validate(&self, params: &ParameterSet) -> Result<(), ToolError> {
        match self.validate {
            Some(validate) => validate(params),
            None => Ok(()),
        }
    }

    fn execute(
        &self,
        ctx: &mut ExecutionContext<'_, D>,
        params: &ParameterSet,
    ) -> Result<ToolOutput, ToolError> {
        (self.execute)(ctx, params)
    }
}

pub struct OperationRegistry<D: Document> {
    handlers: HashMap<String, Arc<dyn Handler<D>>>,
}

impl<D: Document> Default for OperationRegistry<D> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<D: Document> fmt::Debug for OperationRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("kind", &D::KIND)
            .field("operations", &self.names())
            .finish()
    }
}

impl<D: Document> OperationRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> DocumentKind {
        D::KIND
    }

    pub fn register<H: Handler<D> + 'static>(&mut self, handler: H) -> Result<(), RegistryError> {
        let key = normalize(handler.name());
        if key.is_empty() {
            return Err(RegistryError::EmptyName { kind: D::KIND });
        }
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::DuplicateOperation { kind: D::KIND, name: key });
        }
        self.handlers.insert(key, Arc::new(handler));
        Ok(())
    }

    pub fn with<H: Handler<D> + 'static>(mut self, handler: H) -> Result<Self, RegistryError> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn from_operations(
        operations: impl IntoIterator<Item = Operation<D>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for operation in operations {
            registry.register(operation)?;
        }
        Ok(registry)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Handler<D>>, ToolError> {
        self.handlers.get(&normalize(name)).cloned().ok_or_else(|| ToolError::UnknownOperation {
            kind: D::KIND,
            name: name.to_owned(),
            suggestion: self.suggest(name),
        })
    }

    /// Resolves `name` and validates `params` without touching any document.
    ///
    /// The runtime calls this before binding so a bad call never waits on a session lock.
    pub fn prepare(
        &self,
        name: &str,
        params: &ParameterSet,
    ) -> Result<Arc<dyn Handler<D>>, ToolError> {
        let handler = self.resolve(name)?;
        handler.validate(params)?;
        Ok(handler)
    }

    /// [`prepare`](Self::prepare) followed by execution against an already bound context.
    pub fn dispatch(
        &self,
        name: &str,
        ctx: &mut ExecutionContext<'_, D>,
        params: &ParameterSet,
    ) -> Result<ToolOutput, ToolError> {
        self.prepare(name, params)?.execute(ctx, params)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = self.handlers.values().map(|handler| handler.name()).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// `(name, summary)` pairs, sorted by name.
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = self
            .handlers
            .values()
            .map(|handler| (handler.name(), handler.summary()))
            .collect::<Vec<_>>();
        out.sort_unstable_by_key(|(name, _)| *name);
        out
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn suggest(&self, name: &str) -> Option<&'static str> {
        let needle = normalize(name);
        if needle.is_empty() {
            return None;
        }
        self.handlers
            .values()
            .map(|handler| {
                let score = rapidfuzz::fuzz::ratio(needle.chars(), handler.name().chars());
                (score, handler.name())
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(a.1)))
            .map(|(_, name)| name)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
