//! Saved panel configuration per workspace

use dashmap::DashMap;
use ticket_core::{PanelConfig, WorkspaceId};

/// Thread-safe store of each workspace's panel text. Overwrite-only:
/// saving replaces whatever was there, and there is no deletion path.
#[derive(Debug, Default)]
pub struct PanelStore {
    configs: DashMap<WorkspaceId, PanelConfig>,
}

impl PanelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a workspace's panel configuration, replacing any previous one.
    pub fn save(&self, workspace: WorkspaceId, config: PanelConfig) {
        self.configs.insert(workspace, config);
    }

    /// The workspace's saved configuration, if it was ever configured.
    pub fn get(&self, workspace: &WorkspaceId) -> Option<PanelConfig> {
        self.configs.get(workspace).map(|entry| entry.value().clone())
    }
}
