// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Session store: the single owner of documents shared across calls.
//!
//! Each entry keeps its document behind a per-session async mutex. A call holds that lock for
//! its whole duration through a [`SessionGuard`], so calls on one session serialize while calls
//! on different sessions run independently. The map itself is only locked briefly to look up or
//! insert entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::error::ToolError;
use crate::model::{Document, DocumentKind, SessionId};
use crate::store::{load_document, write_document, WriteDurability};

struct SessionSlot<D> {
    document: D,
    closed: bool,
}

pub struct SessionEntry<D> {
    session_id: SessionId,
    source_path: Option<PathBuf>,
    created_at: SystemTime,
    last_accessed: Mutex<Instant>,
    dirty: AtomicBool,
    slot: Arc<AsyncMutex<SessionSlot<D>>>,
}

impl<D: Document> SessionEntry<D> {
    fn new(session_id: SessionId, document: D, source_path: Option<PathBuf>) -> Self {
        Self {
            session_id,
            source_path,
            created_at: SystemTime::now(),
            last_accessed: Mutex::new(Instant::now()),
            dirty: AtomicBool::new(false),
            slot: Arc::new(AsyncMutex::new(SessionSlot { document, closed: false })),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn idle(&self) -> Duration {
        self.last_accessed.lock().unwrap_or_else(PoisonError::into_inner).elapsed()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// True while some call holds the session lock.
    pub fn is_busy(&self) -> bool {
        self.slot.try_lock().is_err()
    }

    fn touch(&self) {
        *self.last_accessed.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Waits for the session lock without a deadline.
    pub async fn lock(self: &Arc<Self>) -> Result<SessionGuard<D>, ToolError> {
        let slot = Arc::clone(&self.slot).lock_owned().await;
        SessionGuard::bind(Arc::clone(self), slot)
    }
}

/// Exclusive access to one session's live document for the duration of a call.
///
/// Dropping the guard releases the session lock, whichever way the call ends.
pub struct SessionGuard<D> {
    entry: Arc<SessionEntry<D>>,
    slot: OwnedMutexGuard<SessionSlot<D>>,
}

impl<D: Document> SessionGuard<D> {
    fn bind(
        entry: Arc<SessionEntry<D>>,
        slot: OwnedMutexGuard<SessionSlot<D>>,
    ) -> Result<Self, ToolError> {
        if slot.closed {
            return Err(ToolError::session_not_found(entry.session_id.as_str()));
        }
        entry.touch();
        Ok(Self { entry, slot })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.entry.session_id
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.entry.source_path()
    }

    pub fn document(&self) -> &D {
        &self.slot.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.slot.document
    }

    /// Swaps in `document` as the live document, returning the previous one.
    pub fn replace_document(&mut self, document: D) -> D {
        std::mem::replace(&mut self.slot.document, document)
    }

    pub fn mark_dirty(&self) {
        self.entry.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.entry.is_dirty()
    }

    fn close(&mut self) {
        self.slot.closed = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    pub session_id: SessionId,
    pub was_dirty: bool,
    pub flushed_to: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub kind: DocumentKind,
    pub source_path: Option<PathBuf>,
    pub dirty: bool,
    pub busy: bool,
    pub created_at: SystemTime,
    pub idle: Duration,
}

pub struct SessionStore<D> {
    sessions: RwLock<HashMap<SessionId, Arc<SessionEntry<D>>>>,
    lock_timeout: Option<Duration>,
    durability: WriteDurability,
}

impl<D: Document> Default for SessionStore<D> {
    fn default() -> Self {
        Self::new(&RuntimeConfig::default())
    }
}

impl<D: Document> SessionStore<D> {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lock_timeout: config.lock_timeout,
            durability: config.durability,
        }
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    /// Loads the document at `path` into a new session.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<SessionId, ToolError> {
        let path = path.as_ref();
        let document = load_document::<D>(path)?;
        Ok(self.adopt(document, Some(path.to_path_buf())))
    }

    /// Inserts an in-memory document as a new session.
    pub fn adopt(&self, document: D, source_path: Option<PathBuf>) -> SessionId {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session_id = loop {
            let candidate = SessionId::generate(D::KIND);
            if !sessions.contains_key(candidate.as_str()) {
                break candidate;
            }
        };
        info!(
            session_id = %session_id,
            kind = %D::KIND,
            source = ?source_path,
            "session opened"
        );
        let entry = SessionEntry::new(session_id.clone(), document, source_path);
        sessions.insert(session_id.clone(), Arc::new(entry));
        session_id
    }

    /// The live entry for `session_id`. Its document is only reachable through
    /// [`SessionEntry::lock`] or [`Self::acquire`].
    pub fn get(&self, session_id: &str) -> Result<Arc<SessionEntry<D>>, ToolError> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).cloned().ok_or_else(|| ToolError::session_not_found(session_id))
    }

    pub fn contains(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Acquires the session lock, waiting at most the configured lock timeout.
    pub async fn acquire(&self, session_id: &str) -> Result<SessionGuard<D>, ToolError> {
        self.acquire_within(session_id, self.lock_timeout).await
    }

    /// Acquires the session lock, waiting at most `timeout` (`None` waits indefinitely).
    pub async fn acquire_within(
        &self,
        session_id: &str,
        timeout: Option<Duration>,
    ) -> Result<SessionGuard<D>, ToolError> {
        let entry = self.get(session_id)?;
        let started = Instant::now();
        let lock = Arc::clone(&entry.slot).lock_owned();
        let slot = match timeout {
            Some(limit) => tokio::time::timeout(limit, lock).await.map_err(|_| {
                let waited = started.elapsed();
                debug!(session_id, waited_ms = waited.as_millis() as u64, "session lock timed out");
                ToolError::SessionBusy { session_id: session_id.to_owned(), waited }
            })?,
            None => lock.await,
        };
        SessionGuard::bind(entry, slot)
    }

    pub fn mark_dirty(&self, session_id: &str) -> Result<(), ToolError> {
        self.get(session_id)?.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Writes the session's document to `output_path`, or back to its source path.
    ///
    /// Saving to the source path clears the dirty flag.
    pub async fn save(
        &self,
        session_id: &str,
        output_path: Option<&Path>,
    ) -> Result<PathBuf, ToolError> {
        let guard = self.acquire(session_id).await?;
        let target = match output_path {
            Some(path) => path.to_path_buf(),
            None => guard.source_path().map(Path::to_path_buf).ok_or_else(|| {
                ToolError::invalid_request(format!(
                    "session '{session_id}' has no source path; 'outputPath' is required"
                ))
            })?,
        };
        write_document(&target, guard.document(), self.durability)?;
        if guard.source_path() == Some(target.as_path()) {
            guard.entry.dirty.store(false, Ordering::Release);
        }
        info!(session_id, path = %target.display(), "session saved");
        Ok(target)
    }

    /// Closes a session once any in-flight call on it has finished.
    ///
    /// With `flush`, unsaved changes are first written back to the source path; if that write
    /// fails the session stays open.
    pub async fn close(&self, session_id: &str, flush: bool) -> Result<CloseOutcome, ToolError> {
        let mut guard = self.acquire(session_id).await?;
        let was_dirty = guard.is_dirty();
        let mut flushed_to = None;
        if flush && was_dirty {
            let Some(path) = guard.source_path().map(Path::to_path_buf) else {
                return Err(ToolError::invalid_request(format!(
                    "session '{session_id}' has no source path to flush to; use session.save \
                     with 'outputPath' first"
                )));
            };
            write_document(&path, guard.document(), self.durability)?;
            flushed_to = Some(path);
        }

        guard.close();
        self.remove(guard.session_id());
        info!(session_id, was_dirty, flushed = flushed_to.is_some(), "session closed");
        Ok(CloseOutcome { session_id: guard.session_id().clone(), was_dirty, flushed_to })
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = sessions
            .values()
            .map(|entry| SessionSummary {
                session_id: entry.session_id.clone(),
                kind: D::KIND,
                source_path: entry.source_path.clone(),
                dirty: entry.is_dirty(),
                busy: entry.is_busy(),
                created_at: entry.created_at,
                idle: entry.idle(),
            })
            .collect::<Vec<_>>();
        out.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.session_id.cmp(&b.session_id))
        });
        out
    }

    /// Drops clean, unlocked sessions idle for longer than `ttl`. Dirty and busy sessions are
    /// kept.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<SessionId> {
        let candidates = {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            sessions.values().filter(|entry| entry.idle() > ttl).cloned().collect::<Vec<_>>()
        };

        let mut evicted = Vec::new();
        for entry in candidates {
            if entry.is_dirty() {
                warn!(session_id = %entry.session_id, "idle session has unsaved changes; kept");
                continue;
            }
            let Ok(mut slot) = Arc::clone(&entry.slot).try_lock_owned() else {
                debug!(session_id = %entry.session_id, "idle session is busy; kept");
                continue;
            };
            if entry.is_dirty() || slot.closed {
                continue;
            }
            slot.closed = true;
            self.remove(&entry.session_id);
            info!(session_id = %entry.session_id, "idle session evicted");
            evicted.push(entry.session_id.clone());
        }
        evicted
    }

    fn remove(&self, session_id: &SessionId) {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner).remove(session_id.as_str());
    }
}

#[cfg(test)]
mod tests;
