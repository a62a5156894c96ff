//! The seams between the switcher core and the compositor hosting it.
//!
//! Everything the switcher needs from the outside world goes through these
//! traits. Implementations must be cheap to call repeatedly; the switcher
//! re-samples state only at session start and at workspace switches.

use std::time::Duration;

use thiserror::Error;

use crate::model::{AppId, WindowData, WindowId};
use crate::sys::event::Modifiers;
use crate::sys::geometry::Rect;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("window {0} is gone")]
    WindowGone(WindowId),
    #[error("workspace {0} does not exist")]
    NoSuchWorkspace(usize),
    #[error("host refused request: {0}")]
    Refused(String),
}

pub trait WindowSource {
    fn active_workspace(&self) -> usize;

    fn workspace_count(&self) -> usize;

    /// Raw tab list for one workspace, most recently used first.
    fn list_windows_in_workspace(&self, workspace: usize) -> Vec<WindowData>;

    fn window(&self, id: WindowId) -> Option<WindowData>;

    fn is_interesting(&self, window: &WindowData) -> bool { window.interesting }

    fn resolve_application(&self, window: &WindowData) -> Option<AppId>;

    fn windows_of_application(&self, app: &AppId) -> Vec<WindowData>;

    fn application_name(&self, app: &AppId) -> Option<String>;
}

pub trait WorkspaceControl {
    fn switch_to_workspace(&mut self, index: usize) -> Result<(), HostError>;

    fn show_workspace_osd(&mut self);
}

pub trait InputGrab {
    fn acquire_modal_grab(&mut self) -> bool;

    /// Must tolerate being called when no grab is held.
    fn release_modal_grab(&mut self);

    /// Modifiers currently held on the keyboard.
    fn modifiers(&self) -> Modifiers;
}

pub trait Activator {
    fn activate_window(&mut self, id: WindowId) -> Result<(), HostError>;
}

pub trait ScreenSource {
    /// Frame of the monitor the overlay is shown on.
    fn primary_screen(&self) -> Rect;
}

pub trait Host: WindowSource + WorkspaceControl + InputGrab + Activator + ScreenSource {}

impl<T> Host for T where T: WindowSource + WorkspaceControl + InputGrab + Activator + ScreenSource {}

/// Opaque handle to a tile created by a [`TileRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct TileId(pub u64);

pub trait TileRenderer {
    /// Returns `None` if the window has nothing to show.
    fn create_tile(&mut self, window: &WindowData, size: crate::sys::geometry::Size)
    -> Option<TileId>;

    fn set_tile_frame(&mut self, tile: TileId, frame: Rect);

    fn set_tile_painted(&mut self, tile: TileId, painted: bool);

    fn set_tile_highlighted(&mut self, tile: TileId, highlighted: bool);

    /// Must tolerate tiles that were already destroyed.
    fn destroy_tile(&mut self, tile: TileId);

    fn set_popup_frame(&mut self, frame: Rect);

    fn set_title(&mut self, title: &str, urgent: bool);

    fn set_opacity(&mut self, opacity: f64, fade: Duration);
}
