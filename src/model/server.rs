use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sys::geometry::Size;

/// The host's stable sequence number for a window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "w{}", self.0) }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Snapshot of a host window, taken when the switcher asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowData {
    pub id: WindowId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub app_id: Option<AppId>,
    /// `None` for windows that are on every workspace.
    #[serde(default)]
    pub workspace: Option<usize>,
    /// Last time the user interacted with the window.
    #[serde(default)]
    pub user_time: u64,
    #[serde(default = "yes")]
    pub showing: bool,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub demands_attention: bool,
    #[serde(default = "yes")]
    pub interesting: bool,
    /// Native size of the window contents, if the compositor has them.
    #[serde(default)]
    pub texture: Option<Size>,
}

impl WindowData {
    pub fn needs_attention(&self) -> bool { self.urgent || self.demands_attention }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceData {
    pub index: usize,
    #[serde(default)]
    pub name: String,
    /// Tab order as reported by the host. May overlap with other workspaces.
    #[serde(default)]
    pub windows: Vec<WindowId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationData {
    pub id: AppId,
    pub name: String,
}

fn yes() -> bool { true }
