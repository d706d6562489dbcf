// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration shared by every document kind.

use std::time::Duration;

use crate::store::WriteDurability;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How long a call waits for a busy session before failing with `SessionBusy`.
    /// `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
    pub durability: WriteDurability,
    /// Clean sessions idle for longer than this are evicted. `None` keeps sessions until closed.
    pub idle_ttl: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Some(DEFAULT_LOCK_TIMEOUT),
            durability: WriteDurability::default(),
            idle_ttl: None,
        }
    }
}

impl RuntimeConfig {
    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Option<Duration>) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_wait_for_busy_sessions_and_never_evict() {
        let config = RuntimeConfig::default();
        assert_eq!(config.lock_timeout, Some(DEFAULT_LOCK_TIMEOUT));
        assert_eq!(config.idle_ttl, None);
        assert_eq!(config.durability, WriteDurability::BestEffort);
    }

    #[test]
    fn builders_override_single_fields() {
        let config = RuntimeConfig::default()
            .with_lock_timeout(None)
            .with_durability(WriteDurability::Durable)
            .with_idle_ttl(Some(Duration::from_secs(60)));
        assert_eq!(config.lock_timeout, None);
        assert_eq!(config.durability, WriteDurability::Durable);
        assert_eq!(config.idle_ttl, Some(Duration::from_secs(60)));
    }
}
