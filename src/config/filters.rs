use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Last-used filter values, kept per report kind so a report screen comes
/// back the way it was left. Cleared explicitly with `reset-filters`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FilterSnapshots {
    #[serde(default)]
    pub reports: HashMap<String, FilterSnapshot>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterSnapshot {
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub search: String,
}

impl FilterSnapshots {
    pub fn get(&self, report_key: &str) -> Option<&FilterSnapshot> {
        self.reports.get(report_key)
    }

    pub fn remember(&mut self, report_key: &str, snapshot: FilterSnapshot) {
        self.reports.insert(report_key.to_string(), snapshot);
    }

    /// Drop one report's snapshot, or all of them.
    pub fn clear(&mut self, report_key: Option<&str>) {
        match report_key {
            Some(key) => {
                self.reports.remove(key);
            }
            None => self.reports.clear(),
        }
    }
}
