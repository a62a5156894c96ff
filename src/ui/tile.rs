use crate::common::config::SwitcherSettings;
use crate::model::WindowData;
use crate::sys::geometry::Size;
use crate::sys::host::TileId;

/// A rendered thumbnail and the candidate it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    /// Index into the candidate list the overlay was built from.
    pub candidate: usize,
    pub title: String,
    pub urgent: bool,
    pub size: Size,
}

/// Factor that keeps a thumbnail within `fraction` of the screen in both
/// dimensions. Never scales up.
pub fn thumbnail_scale(texture: Size, screen: Size, fraction: f64) -> f64 {
    1f64.min(screen.width * fraction / texture.width)
        .min(screen.height * fraction / texture.height)
}

/// Box a tile needs for `texture`, padding included. `None` when there is
/// nothing to draw.
pub fn thumbnail_size(texture: Size, screen: Size, settings: &SwitcherSettings) -> Option<Size> {
    if !(texture.width > 0.0 && texture.height > 0.0) {
        return None;
    }
    let scale = thumbnail_scale(texture, screen, settings.thumbnail_scale);
    let thumb = Size::new(texture.width * scale, texture.height * scale).ceil();
    let pad = settings.tile_padding * 2.0;
    Some(Size::new(thumb.width + pad, thumb.height + pad))
}

pub fn display_title(window: &WindowData, app_name: Option<&str>) -> String {
    if !window.title.is_empty() {
        return window.title.clone();
    }
    match app_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => " ".to_string(),
    }
}
