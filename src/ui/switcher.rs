//! The thumbnail overlay shown while a switch session is live.
//!
//! The overlay only knows about tiles and geometry. Which tile is selected is
//! decided by the session; the overlay just reflects it through the renderer.

use std::time::Duration;

use tracing::{debug, trace};

use crate::common::config::SwitcherSettings;
use crate::layout_engine::{GridGeometry, GridLayoutEngine};
use crate::model::CandidateList;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::host::{TileRenderer, WindowSource};
use crate::ui::tile::{Tile, display_title, thumbnail_size};

pub struct SwitcherOverlay {
    tiles: Vec<Tile>,
    engine: GridLayoutEngine,
    geometry: GridGeometry,
    popup: Rect,
    highlighted: Option<usize>,
    destroyed: bool,
}

impl SwitcherOverlay {
    /// Creates one tile per candidate that has something to show and lays
    /// them out on `screen`. The overlay starts fully transparent.
    pub fn build<S: WindowSource + ?Sized>(
        candidates: &CandidateList,
        source: &S,
        renderer: &mut dyn TileRenderer,
        screen: Rect,
        settings: &SwitcherSettings,
    ) -> Self {
        let mut tiles = Vec::with_capacity(candidates.len());
        for (idx, candidate) in candidates.iter().enumerate() {
            let window = &candidate.window;
            let Some(size) =
                window.texture.and_then(|tex| thumbnail_size(tex, screen.size, settings))
            else {
                trace!(window = %window.id, "no texture, skipping tile");
                continue;
            };
            let Some(id) = renderer.create_tile(window, size) else {
                trace!(window = %window.id, "renderer declined tile");
                continue;
            };
            let app_name = window.app_id.as_ref().and_then(|app| source.application_name(app));
            tiles.push(Tile {
                id,
                candidate: idx,
                title: display_title(window, app_name.as_deref()),
                urgent: window.needs_attention(),
                size,
            });
        }

        let mut engine = GridLayoutEngine::new(settings.grid());
        engine.measure(tiles.iter().map(|t| t.size));
        renderer.set_opacity(0.0, Duration::ZERO);

        let mut overlay = SwitcherOverlay {
            tiles,
            engine,
            geometry: GridGeometry::default(),
            popup: Rect::default(),
            highlighted: None,
            destroyed: false,
        };
        overlay.layout(renderer, screen, settings);
        debug!(
            tiles = overlay.tiles.len(),
            candidates = candidates.len(),
            columns = overlay.columns(),
            rows = overlay.rows(),
            "built overlay"
        );
        overlay
    }

    /// Sizes the popup to the grid, centers it on `screen` and places the
    /// tiles inside it.
    pub fn layout(
        &mut self,
        renderer: &mut dyn TileRenderer,
        screen: Rect,
        settings: &SwitcherSettings,
    ) {
        let pad = settings.popup_padding;
        let count = self.tiles.len();

        self.engine.set_column_limit(settings.column_limit);
        let (fit, _) = self.engine.compute_layout(screen.width() - pad * 2.0);
        self.engine.set_column_limit(Some(settings.column_limit.map_or(fit, |l| l.min(fit))));

        let grid_width = self.engine.preferred_width(count).natural;
        let grid_height = self.engine.preferred_height(count, grid_width).natural;
        self.popup = screen.centered(Size::new(
            grid_width + pad * 2.0,
            grid_height + settings.title_height + pad * 2.0,
        ));
        renderer.set_popup_frame(self.popup);

        self.geometry = self.engine.allocate(
            count,
            self.popup.inset(pad),
            settings.title_height,
            settings.text_direction,
        );
        for (tile, frame) in self.tiles.iter().zip(&self.geometry.tiles) {
            renderer.set_tile_frame(tile.id, frame.frame);
            renderer.set_tile_painted(tile.id, frame.painted);
        }
    }

    pub fn len(&self) -> usize { self.tiles.len() }

    pub fn is_empty(&self) -> bool { self.tiles.is_empty() }

    pub fn tile(&self, idx: usize) -> Option<&Tile> { self.tiles.get(idx) }

    /// Candidate index behind tile `idx`.
    pub fn candidate(&self, idx: usize) -> Option<usize> { self.tiles.get(idx).map(|t| t.candidate) }

    pub fn columns(&self) -> usize { self.engine.columns() }

    pub fn rows(&self) -> usize { self.engine.rows() }

    pub fn geometry(&self) -> &GridGeometry { &self.geometry }

    pub fn popup_frame(&self) -> Rect { self.popup }

    pub fn highlighted(&self) -> Option<usize> { self.highlighted }

    pub fn highlight(&mut self, renderer: &mut dyn TileRenderer, idx: Option<usize>) {
        if self.highlighted == idx {
            return;
        }
        if let Some(old) = self.highlighted.and_then(|i| self.tiles.get(i)) {
            renderer.set_tile_highlighted(old.id, false);
        }
        self.highlighted = idx.filter(|&i| i < self.tiles.len());
        if let Some(new) = self.highlighted.and_then(|i| self.tiles.get(i)) {
            renderer.set_tile_highlighted(new.id, true);
        }
    }

    /// Shows the title of tile `idx`, marked if its window wants attention.
    pub fn show_title(&self, renderer: &mut dyn TileRenderer, idx: usize) {
        if let Some(tile) = self.tiles.get(idx) {
            renderer.set_title(&tile.title, tile.urgent);
        }
    }

    pub fn tile_at(&self, pt: Point) -> Option<usize> { self.geometry.tile_at(pt) }

    pub fn reveal(&self, renderer: &mut dyn TileRenderer, fade: Duration) {
        if !self.destroyed {
            renderer.set_opacity(1.0, fade);
        }
    }

    /// Tears down every tile. Safe to call more than once.
    pub fn destroy(&mut self, renderer: &mut dyn TileRenderer) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for tile in &self.tiles {
            renderer.destroy_tile(tile.id);
        }
        renderer.set_opacity(0.0, Duration::ZERO);
        self.highlighted = None;
    }

    pub fn is_destroyed(&self) -> bool { self.destroyed }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Binding, WindowCollector, WindowData, WindowId};
    use crate::sys::host::ScreenSource;
    use crate::sys::scene::{RecordingRenderer, Scene, SceneHost};

    fn win(id: u64, texture: Option<Size>) -> WindowData {
        WindowData {
            id: WindowId(id),
            title: format!("window {id}"),
            app_id: None,
            workspace: Some(0),
            user_time: 100 - id,
            showing: true,
            urgent: id == 3,
            demands_attention: false,
            interesting: true,
            texture,
        }
    }

    fn setup(windows: Vec<WindowData>) -> (SceneHost, CandidateList) {
        let order = windows.iter().map(|w| w.id.0).collect();
        let (host, _) = Scene::builder()
            .windows(windows)
            .tab_lists(vec![order])
            .screen(Size::new(1000.0, 800.0))
            .build()
            .into_host();
        let list = WindowCollector::new(&host).collect(&Binding::SwitchWindows.collect_request(), 0);
        (host, list)
    }

    fn settings() -> SwitcherSettings {
        SwitcherSettings {
            tile_padding: 0.0,
            popup_padding: 10.0,
            title_height: 20.0,
            ..SwitcherSettings::default()
        }
    }

    #[test]
    fn windows_without_texture_get_no_tile() {
        let tex = Some(Size::new(1000.0, 800.0));
        let (host, list) = setup(vec![win(1, tex), win(2, None), win(3, tex)]);
        let mut renderer = RecordingRenderer::default();
        let overlay =
            SwitcherOverlay::build(&list, &host, &mut renderer, host.primary_screen(), &settings());
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.candidate(0), Some(0));
        assert_eq!(overlay.candidate(1), Some(2));
        assert!(overlay.tile(1).unwrap().urgent);
        assert_eq!(renderer.live_tiles(), 2);
    }

    #[test]
    fn popup_is_centered_around_grid() {
        // Each thumbnail is 100x80 on a 1000x800 screen.
        let tex = Some(Size::new(1000.0, 800.0));
        let windows = (1..=5).map(|id| win(id, tex)).collect();
        let (host, list) = setup(windows);
        let mut renderer = RecordingRenderer::default();
        let overlay =
            SwitcherOverlay::build(&list, &host, &mut renderer, host.primary_screen(), &settings());

        assert_eq!(overlay.columns(), 5);
        assert_eq!(overlay.rows(), 1);
        let popup = overlay.popup_frame();
        assert_eq!(popup.size, Size::new(540.0 + 20.0, 80.0 + 20.0 + 20.0));
        assert_eq!(popup.origin, Point::new(220.0, 340.0));
        assert_eq!(renderer.popup_frame, Some(popup));
        assert_eq!(overlay.geometry().tiles[0].frame.origin, Point::new(230.0, 370.0));
        assert_eq!(renderer.opacity, 0.0);
    }

    #[test]
    fn screen_width_limits_columns() {
        let tex = Some(Size::new(1000.0, 800.0));
        let windows = (1..=12).map(|id| win(id, tex)).collect();
        let (host, list) = setup(windows);
        let mut renderer = RecordingRenderer::default();
        let overlay =
            SwitcherOverlay::build(&list, &host, &mut renderer, host.primary_screen(), &settings());
        // 980 px of room fits exactly 9 columns of 100 with 10 px gaps.
        assert_eq!(overlay.columns(), 9);
        assert_eq!(overlay.rows(), 2);
    }

    #[test]
    fn highlight_moves_between_tiles() {
        let tex = Some(Size::new(1000.0, 800.0));
        let (host, list) = setup(vec![win(1, tex), win(2, tex)]);
        let mut renderer = RecordingRenderer::default();
        let mut overlay =
            SwitcherOverlay::build(&list, &host, &mut renderer, host.primary_screen(), &settings());
        overlay.highlight(&mut renderer, Some(1));
        overlay.highlight(&mut renderer, Some(0));
        let first = overlay.tile(0).unwrap().id;
        assert_eq!(renderer.highlighted(), vec![first]);
        overlay.highlight(&mut renderer, Some(7));
        assert_eq!(overlay.highlighted(), None);
        assert!(renderer.highlighted().is_empty());
    }

    #[test]
    fn destroy_is_idempotent() {
        let tex = Some(Size::new(1000.0, 800.0));
        let (host, list) = setup(vec![win(1, tex), win(2, tex)]);
        let mut renderer = RecordingRenderer::default();
        let mut overlay =
            SwitcherOverlay::build(&list, &host, &mut renderer, host.primary_screen(), &settings());
        overlay.destroy(&mut renderer);
        overlay.destroy(&mut renderer);
        assert_eq!(renderer.live_tiles(), 0);
        assert_eq!(renderer.destroyed, 2);
        overlay.reveal(&mut renderer, Duration::ZERO);
        assert_eq!(renderer.opacity, 0.0);
    }
}
