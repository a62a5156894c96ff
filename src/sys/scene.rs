//! A headless host described by a RON file.
//!
//! The scene lists workspaces (with their raw tab order), windows and
//! applications, plus an optional input script. [`SceneHost`] implements
//! every host trait against that data, and [`RecordingRenderer`] keeps the
//! tile state a real compositor would draw. The CLI runs the switcher on top
//! of these, and the tests use them as doubles.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::actor::activation::{BindingHandler, KeybindingRegistry};
use crate::actor::switcher::{self, Event};
use crate::common::collections::{HashMap, HashSet};
use crate::model::{AppId, ApplicationData, Binding, WindowData, WindowId, WorkspaceData};
use crate::sys::event::{KeyEvent, Modifiers, PointerEvent};
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::host::{
    Activator, HostError, InputGrab, ScreenSource, TileId, TileRenderer, WindowSource,
    WorkspaceControl,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    #[serde(default)]
    pub active_workspace: usize,
    pub workspaces: Vec<WorkspaceData>,
    #[serde(default)]
    pub windows: Vec<WindowData>,
    #[serde(default)]
    pub applications: Vec<ApplicationData>,
    #[serde(default = "default_screen")]
    pub screen: Size,
    /// Modifiers held when the scene starts.
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default = "yes")]
    pub grab_available: bool,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

/// One step of scripted input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// A host binding fires with `modifiers` held.
    Trigger { binding: Binding, modifiers: Modifiers },
    Press(KeyEvent),
    /// Keys come up; `modifiers` are the ones still held afterwards.
    Release { modifiers: Modifiers },
    Pointer(PointerEvent),
    Wait { ms: u64 },
    GrabLost,
    WorkspacesChanged,
}

impl Scene {
    pub fn builder() -> SceneBuilder { SceneBuilder::default() }

    pub fn load(path: &Path) -> anyhow::Result<Scene> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing scene {}", path.display()))
    }

    pub fn parse(buf: &str) -> anyhow::Result<Scene> {
        let scene: Scene = ron::from_str(buf)?;
        scene.check()?;
        Ok(scene)
    }

    /// Rejects scenes a real host could never produce.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.workspaces.is_empty() {
            bail!("scene needs at least one workspace");
        }
        if self.active_workspace >= self.workspaces.len() {
            bail!(
                "active workspace {} out of range ({} workspaces)",
                self.active_workspace,
                self.workspaces.len()
            );
        }
        let mut ids = HashSet::default();
        for window in &self.windows {
            if !ids.insert(window.id) {
                bail!("window {} is declared twice", window.id);
            }
            if window.workspace.is_some_and(|ws| ws >= self.workspaces.len()) {
                bail!("window {} is on an unknown workspace", window.id);
            }
        }
        for ws in &self.workspaces {
            if let Some(id) = ws.windows.iter().find(|id| !ids.contains(*id)) {
                bail!("workspace {} lists unknown window {id}", ws.index);
            }
        }
        Ok(())
    }

    /// Splits the scene into a live host and its input script.
    pub fn into_host(self) -> (SceneHost, Vec<ScriptStep>) {
        let index = self.windows.iter().enumerate().map(|(i, w)| (w.id, i)).collect();
        let applications = self.applications.into_iter().map(|a| (a.id.clone(), a)).collect();
        let host = SceneHost {
            windows: self.windows,
            index,
            workspaces: self.workspaces,
            applications,
            active_workspace: self.active_workspace,
            screen: Rect::new(Point::default(), self.screen),
            modifiers: ModifierState::new(self.modifiers),
            grab_available: self.grab_available,
            grabbed: false,
            refuse_workspace_switch: false,
            activated: Vec::new(),
            osd_shown: 0,
        };
        (host, self.script)
    }
}

fn default_screen() -> Size { Size::new(1920.0, 1080.0) }

fn yes() -> bool { true }

#[derive(Debug, Default)]
pub struct SceneBuilder {
    active_workspace: usize,
    workspaces: Vec<WorkspaceData>,
    windows: Vec<WindowData>,
    applications: Vec<ApplicationData>,
    screen: Option<Size>,
    modifiers: Modifiers,
    grab_available: Option<bool>,
    script: Vec<ScriptStep>,
}

impl SceneBuilder {
    pub fn windows(mut self, windows: Vec<WindowData>) -> Self {
        self.windows = windows;
        self
    }

    /// Raw tab order per workspace, by window id.
    pub fn tab_lists(mut self, lists: Vec<Vec<u64>>) -> Self {
        self.workspaces = lists
            .into_iter()
            .enumerate()
            .map(|(index, ids)| WorkspaceData {
                index,
                name: format!("Workspace {}", index + 1),
                windows: ids.into_iter().map(WindowId).collect(),
            })
            .collect();
        self
    }

    pub fn active_workspace(mut self, index: usize) -> Self {
        self.active_workspace = index;
        self
    }

    pub fn applications(mut self, applications: Vec<ApplicationData>) -> Self {
        self.applications = applications;
        self
    }

    pub fn screen(mut self, size: Size) -> Self {
        self.screen = Some(size);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn grab_available(mut self, available: bool) -> Self {
        self.grab_available = Some(available);
        self
    }

    pub fn script(mut self, script: Vec<ScriptStep>) -> Self {
        self.script = script;
        self
    }

    pub fn build(self) -> Scene {
        Scene {
            active_workspace: self.active_workspace,
            workspaces: self.workspaces,
            windows: self.windows,
            applications: self.applications,
            screen: self.screen.unwrap_or_else(default_screen),
            modifiers: self.modifiers,
            grab_available: self.grab_available.unwrap_or(true),
            script: self.script,
        }
    }
}

/// Feeds `script` into the switcher the way a host would deliver it.
///
/// Each step waits for the actor to finish the previous one, so the shared
/// modifier state never runs ahead of events still in the queue.
pub async fn play_script(
    script: Vec<ScriptStep>,
    tx: &switcher::Sender,
    keys: &mut SceneKeybindings,
    modifiers: &ModifierState,
) {
    for step in script {
        settle(tx).await;
        debug!(?step, "script");
        match step {
            ScriptStep::Trigger { binding, modifiers: held } => {
                modifiers.set(held);
                if !keys.trigger(binding, held) {
                    debug!(%binding, "binding not handled by the switcher");
                }
            }
            ScriptStep::Press(key) => {
                modifiers.set(key.modifiers);
                tx.send(Event::KeyPressed(key));
            }
            ScriptStep::Release { modifiers: held } => {
                modifiers.set(held);
                tx.send(Event::KeyReleased { modifiers: held });
            }
            ScriptStep::Pointer(pointer) => tx.send(Event::Pointer(pointer)),
            ScriptStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
            ScriptStep::GrabLost => tx.send(Event::GrabLost),
            ScriptStep::WorkspacesChanged => tx.send(Event::WorkspacesChanged),
        }
    }
    settle(tx).await;
}

async fn settle(tx: &switcher::Sender) {
    // An actor that already shut down has nothing left to process.
    _ = tx.request(Event::Barrier).await;
}

/// Keyboard modifier state shared between the host and whatever feeds it
/// input.
#[derive(Debug, Clone, Default)]
pub struct ModifierState(Arc<AtomicU8>);

impl ModifierState {
    pub fn new(modifiers: Modifiers) -> Self { Self(Arc::new(AtomicU8::new(modifiers.bits()))) }

    pub fn get(&self) -> Modifiers { Modifiers::from_bits_truncate(self.0.load(Ordering::Relaxed)) }

    pub fn set(&self, modifiers: Modifiers) { self.0.store(modifiers.bits(), Ordering::Relaxed) }
}

#[derive(Debug)]
pub struct SceneHost {
    windows: Vec<WindowData>,
    index: HashMap<WindowId, usize>,
    workspaces: Vec<WorkspaceData>,
    applications: HashMap<AppId, ApplicationData>,
    active_workspace: usize,
    screen: Rect,
    modifiers: ModifierState,
    grab_available: bool,
    grabbed: bool,
    pub refuse_workspace_switch: bool,
    /// Windows activated so far, oldest first.
    pub activated: Vec<WindowId>,
    pub osd_shown: usize,
}

impl SceneHost {
    pub fn modifier_state(&self) -> ModifierState { self.modifiers.clone() }

    pub fn set_modifiers(&self, modifiers: Modifiers) { self.modifiers.set(modifiers) }

    pub fn is_grabbed(&self) -> bool { self.grabbed }

    pub fn set_grab_available(&mut self, available: bool) { self.grab_available = available; }

    pub fn workspaces(&self) -> &[WorkspaceData] { &self.workspaces }

    /// Replaces the workspace list, as a host would after the user adds or
    /// removes workspaces.
    pub fn set_workspaces(&mut self, workspaces: Vec<WorkspaceData>) {
        self.workspaces = workspaces;
        self.active_workspace = self.active_workspace.min(self.workspaces.len().saturating_sub(1));
    }

    /// Removes a window the way a client closing it would.
    pub fn close_window(&mut self, id: WindowId) -> bool {
        if self.index.remove(&id).is_none() {
            return false;
        }
        self.windows.retain(|w| w.id != id);
        self.index = self.windows.iter().enumerate().map(|(i, w)| (w.id, i)).collect();
        for ws in &mut self.workspaces {
            ws.windows.retain(|w| *w != id);
        }
        true
    }

    fn max_user_time(&self) -> u64 { self.windows.iter().map(|w| w.user_time).max().unwrap_or(0) }
}

impl WindowSource for SceneHost {
    fn active_workspace(&self) -> usize { self.active_workspace }

    fn workspace_count(&self) -> usize { self.workspaces.len() }

    fn list_windows_in_workspace(&self, workspace: usize) -> Vec<WindowData> {
        let Some(ws) = self.workspaces.get(workspace) else {
            return Vec::new();
        };
        ws.windows.iter().filter_map(|id| self.window(*id)).collect()
    }

    fn window(&self, id: WindowId) -> Option<WindowData> {
        self.index.get(&id).map(|&i| self.windows[i].clone())
    }

    fn resolve_application(&self, window: &WindowData) -> Option<AppId> { window.app_id.clone() }

    fn windows_of_application(&self, app: &AppId) -> Vec<WindowData> {
        self.windows.iter().filter(|w| w.app_id.as_ref() == Some(app)).cloned().collect()
    }

    fn application_name(&self, app: &AppId) -> Option<String> {
        self.applications.get(app).map(|a| a.name.clone())
    }
}

impl WorkspaceControl for SceneHost {
    fn switch_to_workspace(&mut self, index: usize) -> Result<(), HostError> {
        if index >= self.workspaces.len() {
            return Err(HostError::NoSuchWorkspace(index));
        }
        if self.refuse_workspace_switch {
            return Err(HostError::Refused(format!("switch to workspace {index}")));
        }
        debug!(from = self.active_workspace, to = index, "switching workspace");
        self.active_workspace = index;
        Ok(())
    }

    fn show_workspace_osd(&mut self) {
        trace!(workspace = self.active_workspace, "workspace osd");
        self.osd_shown += 1;
    }
}

impl InputGrab for SceneHost {
    fn acquire_modal_grab(&mut self) -> bool {
        if !self.grab_available || self.grabbed {
            return false;
        }
        self.grabbed = true;
        true
    }

    fn release_modal_grab(&mut self) { self.grabbed = false; }

    fn modifiers(&self) -> Modifiers { self.modifiers.get() }
}

impl Activator for SceneHost {
    fn activate_window(&mut self, id: WindowId) -> Result<(), HostError> {
        let &i = self.index.get(&id).ok_or(HostError::WindowGone(id))?;
        let user_time = self.max_user_time() + 1;
        let window = &mut self.windows[i];
        window.user_time = user_time;
        window.showing = true;
        if let Some(ws) = window.workspace {
            self.active_workspace = ws;
            // Most recently used goes to the front of its tab list.
            if let Some(list) = self.workspaces.get_mut(ws) {
                list.windows.retain(|w| *w != id);
                list.windows.insert(0, id);
            }
        }
        self.activated.push(id);
        Ok(())
    }
}

impl ScreenSource for SceneHost {
    fn primary_screen(&self) -> Rect { self.screen }
}

/// Tile state as a compositor would hold it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTile {
    pub window: WindowId,
    pub size: Size,
    pub frame: Rect,
    pub painted: bool,
    pub highlighted: bool,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    next_id: u64,
    tiles: BTreeMap<TileId, RenderedTile>,
    pub popup_frame: Option<Rect>,
    pub title: Option<(String, bool)>,
    pub opacity: f64,
    pub fades: Vec<(f64, Duration)>,
    pub created: usize,
    pub destroyed: usize,
}

impl RecordingRenderer {
    pub fn live_tiles(&self) -> usize { self.tiles.len() }

    pub fn tile(&self, id: TileId) -> Option<&RenderedTile> { self.tiles.get(&id) }

    pub fn tiles(&self) -> impl Iterator<Item = (&TileId, &RenderedTile)> { self.tiles.iter() }

    pub fn highlighted(&self) -> Vec<TileId> {
        self.tiles.iter().filter(|(_, t)| t.highlighted).map(|(id, _)| *id).collect()
    }

    pub fn highlighted_window(&self) -> Option<WindowId> {
        self.tiles.values().find(|t| t.highlighted).map(|t| t.window)
    }

    pub fn title_text(&self) -> Option<&str> { self.title.as_ref().map(|(t, _)| t.as_str()) }

    fn tile_mut(&mut self, tile: TileId) -> Option<&mut RenderedTile> {
        let t = self.tiles.get_mut(&tile);
        if t.is_none() {
            warn!(?tile, "update for unknown tile");
        }
        t
    }
}

impl TileRenderer for RecordingRenderer {
    fn create_tile(&mut self, window: &WindowData, size: Size) -> Option<TileId> {
        self.next_id += 1;
        let id = TileId(self.next_id);
        self.tiles.insert(id, RenderedTile {
            window: window.id,
            size,
            frame: Rect::new(Point::default(), size),
            painted: true,
            highlighted: false,
        });
        self.created += 1;
        Some(id)
    }

    fn set_tile_frame(&mut self, tile: TileId, frame: Rect) {
        if let Some(t) = self.tile_mut(tile) {
            t.frame = frame;
        }
    }

    fn set_tile_painted(&mut self, tile: TileId, painted: bool) {
        if let Some(t) = self.tile_mut(tile) {
            t.painted = painted;
        }
    }

    fn set_tile_highlighted(&mut self, tile: TileId, highlighted: bool) {
        if let Some(t) = self.tile_mut(tile) {
            t.highlighted = highlighted;
        }
    }

    fn destroy_tile(&mut self, tile: TileId) {
        if self.tiles.remove(&tile).is_some() {
            self.destroyed += 1;
        }
    }

    fn set_popup_frame(&mut self, frame: Rect) { self.popup_frame = Some(frame); }

    fn set_title(&mut self, title: &str, urgent: bool) { self.title = Some((title.to_string(), urgent)); }

    fn set_opacity(&mut self, opacity: f64, fade: Duration) {
        self.opacity = opacity;
        self.fades.push((opacity, fade));
    }
}

/// Host keybinding table. Bindings without a custom handler fall through to
/// the host's own switcher, which the scene only counts.
#[derive(Default)]
pub struct SceneKeybindings {
    handlers: HashMap<Binding, BindingHandler>,
    pub fallthrough: usize,
}

impl SceneKeybindings {
    pub fn has_custom_handler(&self, binding: Binding) -> bool { self.handlers.contains_key(&binding) }

    /// Fires `binding`. Returns whether a custom handler took it.
    pub fn trigger(&mut self, binding: Binding, modifiers: Modifiers) -> bool {
        match self.handlers.get(&binding) {
            Some(handler) => {
                handler(modifiers);
                true
            }
            None => {
                debug!(%binding, "no custom handler, host default runs");
                self.fallthrough += 1;
                false
            }
        }
    }
}

impl KeybindingRegistry for SceneKeybindings {
    fn set_custom_handler(&mut self, binding: Binding, handler: BindingHandler) {
        self.handlers.insert(binding, handler);
    }

    fn restore_default_handler(&mut self, binding: Binding) { self.handlers.remove(&binding); }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        (
            active_workspace: 1,
            workspaces: [
                (index: 0, name: "one", windows: [1, 2]),
                (index: 1, name: "two", windows: [3]),
            ],
            windows: [
                (id: 1, title: "editor", app_id: Some("code"), workspace: Some(0), user_time: 5),
                (id: 2, title: "term", workspace: Some(0), user_time: 3,
                 texture: Some((width: 800.0, height: 600.0))),
                (id: 3, title: "", app_id: Some("code"), workspace: Some(1), urgent: true),
            ],
            applications: [(id: "code", name: "Code")],
            modifiers: "ALT",
            script: [
                Trigger(binding: r#switch-windows, modifiers: "ALT"),
                Press((sym: Tab, modifiers: "ALT", binding: Some(r#switch-windows))),
                Wait(ms: 20),
                Release(modifiers: ""),
            ],
        )
    "#;

    #[test]
    fn parses_ron_scene() {
        let scene = Scene::parse(SCENE).unwrap();
        assert_eq!(scene.workspaces.len(), 2);
        assert_eq!(scene.screen, default_screen());
        assert_eq!(scene.modifiers, Modifiers::ALT);
        assert!(scene.windows[0].showing);
        assert_eq!(scene.windows[1].texture, Some(Size::new(800.0, 600.0)));
        assert_eq!(scene.script.len(), 4);
        assert_eq!(scene.script[3], ScriptStep::Release { modifiers: Modifiers::empty() });
    }

    #[test]
    fn demo_scene_parses() {
        let scene = Scene::parse(include_str!("../../demos/scene.ron")).unwrap();
        assert_eq!(scene.windows.len(), 6);
        assert_eq!(scene.script[4], ScriptStep::Press(KeyEvent::new(
            crate::sys::event::KeySym::Right,
            Modifiers::ALT | Modifiers::CONTROL,
        )));
    }

    #[test]
    fn rejects_inconsistent_scenes() {
        let dangling = Scene::builder().windows(vec![]).tab_lists(vec![vec![7]]).build();
        assert!(dangling.check().is_err());
        let no_workspaces = Scene::builder().build();
        assert!(no_workspaces.check().is_err());
        let out_of_range = Scene::builder().tab_lists(vec![vec![]]).active_workspace(3).build();
        assert!(out_of_range.check().is_err());
    }

    #[test]
    fn host_answers_from_scene() {
        let (host, script) = Scene::parse(SCENE).unwrap().into_host();
        assert_eq!(script.len(), 4);
        assert_eq!(host.active_workspace(), 1);
        assert_eq!(host.workspace_count(), 2);
        let ids: Vec<_> = host.list_windows_in_workspace(0).iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![WindowId(1), WindowId(2)]);
        assert!(host.list_windows_in_workspace(9).is_empty());

        let code = AppId::new("code");
        assert_eq!(host.windows_of_application(&code).len(), 2);
        assert_eq!(host.application_name(&code).as_deref(), Some("Code"));
        assert_eq!(host.modifiers(), Modifiers::ALT);
    }

    #[test]
    fn activation_moves_to_window_workspace() {
        let (mut host, _) = Scene::parse(SCENE).unwrap().into_host();
        host.activate_window(WindowId(2)).unwrap();
        assert_eq!(host.active_workspace(), 0);
        assert_eq!(host.activated, vec![WindowId(2)]);
        assert_eq!(host.workspaces()[0].windows, vec![WindowId(2), WindowId(1)]);
        assert_eq!(host.activate_window(WindowId(9)), Err(HostError::WindowGone(WindowId(9))));
    }

    #[test]
    fn workspace_switch_and_grab() {
        let (mut host, _) = Scene::parse(SCENE).unwrap().into_host();
        assert_eq!(host.switch_to_workspace(5), Err(HostError::NoSuchWorkspace(5)));
        host.switch_to_workspace(0).unwrap();
        assert_eq!(host.active_workspace(), 0);

        assert!(host.acquire_modal_grab());
        assert!(!host.acquire_modal_grab());
        host.release_modal_grab();
        host.release_modal_grab();
        assert!(!host.is_grabbed());
    }

    #[test]
    fn closed_windows_disappear() {
        let (mut host, _) = Scene::parse(SCENE).unwrap().into_host();
        assert!(host.close_window(WindowId(1)));
        assert!(!host.close_window(WindowId(1)));
        assert!(host.window(WindowId(1)).is_none());
        assert_eq!(host.window(WindowId(2)).map(|w| w.id), Some(WindowId(2)));
        assert_eq!(host.workspaces()[0].windows, vec![WindowId(2)]);
    }

    #[test]
    fn keybindings_fall_through_without_handler() {
        let mut keys = SceneKeybindings::default();
        assert!(!keys.trigger(Binding::SwitchGroup, Modifiers::ALT));
        assert_eq!(keys.fallthrough, 1);

        let hits = Arc::new(AtomicU8::new(0));
        let counter = hits.clone();
        keys.set_custom_handler(
            Binding::SwitchGroup,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        assert!(keys.trigger(Binding::SwitchGroup, Modifiers::ALT));
        keys.restore_default_handler(Binding::SwitchGroup);
        assert!(!keys.trigger(Binding::SwitchGroup, Modifiers::ALT));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
