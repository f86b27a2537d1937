//! Saved panel configuration

use serde::{Deserialize, Serialize};

/// The text of a workspace's ticket panel: what the announcement says and
/// what the open-ticket button is labelled. One per workspace, latest
/// write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub title: String,
    pub description: String,
    pub button_label: String,
}

impl PanelConfig {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        button_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            button_label: button_label.into(),
        }
    }
}
