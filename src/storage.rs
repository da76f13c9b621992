/// Recently submitted values, kept in window.localStorage
use log::warn;
use serde::{Deserialize, Serialize};

pub const RECENT_SHARES_KEY: &str = "recentShares";

/// Most recent first; stored as a bare JSON array of strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentShares {
    pub entries: Vec<String>,
}

impl RecentShares {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `value` at the front, dropping an older copy and anything past `limit`
    pub fn record(&mut self, value: &str, limit: usize) {
        self.entries.retain(|entry| entry != value);
        self.entries.insert(0, value.to_string());
        self.entries.truncate(limit);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read from localStorage; missing or unreadable data gives an empty list
    pub fn load() -> RecentShares {
        let Some(storage) = local_storage() else {
            return RecentShares::new();
        };

        match storage.get_item(RECENT_SHARES_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring unreadable recent shares: {}", e);
                RecentShares::new()
            }),
            _ => RecentShares::new(),
        }
    }

    pub fn save(&self) {
        let Some(storage) = local_storage() else {
            warn!("LocalStorage not supported");
            return;
        };

        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(e) = storage.set_item(RECENT_SHARES_KEY, &json) {
                    warn!("Failed to save recent share: {:?}", e);
                }
            }
            Err(e) => warn!("Failed to serialize recent shares: {}", e),
        }
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}
