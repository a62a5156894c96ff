//! One modal switch interaction, from the binding press to commit or cancel.
//!
//! The session is synchronous. Anything that has to happen later (the
//! delayed reveal, re-enabling hover) is handed back to the owner as a
//! [`TimerRequest`]; the owner fires it through [`SwitcherSession::timer_fired`]
//! with the generation it was given, and stale generations are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::actor::broadcast::{BroadcastEvent, Outcome};
use crate::common::config::SwitcherSettings;
use crate::layout_engine::Direction;
use crate::model::{Binding, CandidateList, CollectRequest, WindowCollector, WindowId};
use crate::sys::event::{KeyEvent, KeySym, Modifiers, PointerEvent, ScrollDirection};
use crate::sys::host::{Host, TileRenderer};
use crate::ui::switcher::SwitcherOverlay;

/// Everything outside the session it may touch while handling one event.
pub struct SessionContext<'a> {
    pub host: &'a mut dyn Host,
    pub renderer: &'a mut dyn TileRenderer,
    pub settings: &'a SwitcherSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Ended(Outcome),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Reveal,
    HoverReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub generation: u64,
    pub delay: Duration,
}

pub struct SwitcherSession {
    status: Status,
    /// False when the session ended before it got the grab.
    started: bool,
    /// Modifier that must stay held for the session to stay open.
    primary_mask: Modifiers,
    binding: Binding,
    candidates: CandidateList,
    overlay: Option<SwitcherOverlay>,
    /// Index into the overlay's tiles.
    selected: Option<usize>,
    /// Last non-empty list and the binding that produced it.
    previous: Option<(CandidateList, Binding)>,
    /// Set by an in-overlay workspace switch, consumed by the next refresh.
    recall_pending: bool,
    rebind_pending: bool,
    anchor: Option<WindowId>,
    hover_enabled: bool,
    generation: u64,
    reveal_generation: Option<u64>,
    hover_generation: Option<u64>,
    revealed: bool,
    timers: Vec<TimerRequest>,
    broadcasts: Vec<BroadcastEvent>,
}

impl SwitcherSession {
    fn new(binding: Binding, modifiers: Modifiers) -> Self {
        Self {
            status: Status::Active,
            started: false,
            primary_mask: modifiers.primary(),
            binding,
            candidates: CandidateList::default(),
            overlay: None,
            selected: None,
            previous: None,
            recall_pending: false,
            rebind_pending: false,
            anchor: None,
            hover_enabled: true,
            generation: 0,
            reveal_generation: None,
            hover_generation: None,
            revealed: false,
            timers: Vec::new(),
            broadcasts: Vec::new(),
        }
    }

    /// Grabs input and shows the candidates for `binding`. The returned
    /// session may already have ended: nothing to switch to, the grab was
    /// refused, or the trigger modifiers were released before the grab.
    pub fn start(binding: Binding, modifiers: Modifiers, ctx: &mut SessionContext<'_>) -> Self {
        let mut session = Self::new(binding, modifiers);
        if !ctx.host.acquire_modal_grab() {
            info!(%binding, "could not grab input, not showing switcher");
            session.status = Status::Ended(Outcome::Cancelled);
            return session;
        }
        session.started = true;
        session.broadcasts.push(BroadcastEvent::SessionStarted { binding });
        let backward = modifiers.contains(Modifiers::SHIFT) || binding.is_backward();
        session.refresh(ctx, binding, backward);
        session
    }

    pub fn status(&self) -> Status { self.status }

    pub fn is_active(&self) -> bool { self.status == Status::Active }

    /// Whether the session ever took the grab. One that did not has nothing
    /// to report.
    pub fn was_started(&self) -> bool { self.started }

    pub fn binding(&self) -> Binding { self.binding }

    pub fn candidates(&self) -> &CandidateList { &self.candidates }

    pub fn selected(&self) -> Option<usize> { self.selected }

    pub fn overlay(&self) -> Option<&SwitcherOverlay> { self.overlay.as_ref() }

    pub fn is_revealed(&self) -> bool { self.revealed }

    pub fn hover_enabled(&self) -> bool { self.hover_enabled }

    /// Window behind the current selection.
    pub fn selected_window(&self) -> Option<WindowId> {
        let candidate = self.overlay.as_ref()?.candidate(self.selected?)?;
        self.candidates.get(candidate).map(|c| c.primary())
    }

    pub fn take_timers(&mut self) -> Vec<TimerRequest> { std::mem::take(&mut self.timers) }

    pub fn take_broadcasts(&mut self) -> Vec<BroadcastEvent> { std::mem::take(&mut self.broadcasts) }

    /// Rebuilds the candidate list and the overlay. Returns whether the
    /// session is still active afterwards.
    pub fn refresh(
        &mut self,
        ctx: &mut SessionContext<'_>,
        binding: Binding,
        backward: bool,
    ) -> bool {
        if !self.is_active() {
            return false;
        }
        if let Some(mut overlay) = self.overlay.take() {
            overlay.destroy(ctx.renderer);
        }
        self.selected = None;
        self.reveal_generation = None;

        let active_workspace = ctx.host.active_workspace();
        let collector = WindowCollector::new(&*ctx.host);
        let mut binding = binding;
        let mut candidates = collector.collect(&binding.collect_request(), active_workspace);

        let recalled = std::mem::take(&mut self.recall_pending);
        if recalled {
            if let Some((prev_list, prev_binding)) = &self.previous {
                binding = *prev_binding;
                if !prev_list.is_empty() && !binding.is_windows() {
                    trace!(%binding, "keeping previous list across workspace switch");
                    candidates = prev_list.clone();
                }
            }
        }
        if self.rebind_pending && binding.is_group() {
            let request = CollectRequest {
                anchor: self.anchor.take(),
                ..binding.collect_request()
            };
            debug!(anchor = ?request.anchor, "rebinding to application group");
            candidates = collector.collect(&request, active_workspace);
            self.rebind_pending = false;
        }
        if !candidates.is_empty() {
            self.previous = Some((candidates.clone(), binding));
        }
        self.binding = binding;
        self.candidates = candidates;

        let screen = ctx.host.primary_screen();
        let overlay =
            SwitcherOverlay::build(&self.candidates, &*ctx.host, ctx.renderer, screen, ctx.settings);
        let len = overlay.len();
        self.overlay = Some(overlay);
        if self.candidates.is_empty() || len == 0 {
            debug!(candidates = self.candidates.len(), "nothing to switch to");
            self.finish(ctx);
            return false;
        }

        let initial = if binding == Binding::NoSwitchWindows || recalled || len == 1 {
            0
        } else if backward {
            len - 1
        } else {
            1
        };
        self.select(ctx, initial);

        // The trigger modifiers may have come up before the grab was in place,
        // in which case no release event will ever arrive.
        if !ctx.host.modifiers().intersects(self.primary_mask) {
            debug!("modifiers released before grab, committing");
            self.finish(ctx);
            return false;
        }

        self.generation += 1;
        self.reveal_generation = Some(self.generation);
        self.timers.push(TimerRequest {
            kind: TimerKind::Reveal,
            generation: self.generation,
            delay: ctx.settings.reveal_delay(),
        });
        true
    }

    pub fn handle_key_press(&mut self, ctx: &mut SessionContext<'_>, event: KeyEvent) {
        if !self.is_active() {
            return;
        }
        self.suppress_hover(ctx);

        if let Some(binding) = event.binding.filter(|b| b.is_registrable()) {
            match event.sym {
                KeySym::Escape | KeySym::Return => {}
                _ => return self.handle_binding_press(ctx, binding, event.modifiers),
            }
        }

        match event.sym {
            KeySym::Escape => self.cancel(ctx),
            KeySym::Return => self.finish(ctx),
            KeySym::Left | KeySym::Right => {
                let direction =
                    if event.sym == KeySym::Left { Direction::Left } else { Direction::Right };
                if event.modifiers.contains(Modifiers::CONTROL) {
                    let delta = if direction == Direction::Left { -1 } else { 1 };
                    if self.switch_workspace(ctx, delta) {
                        return;
                    }
                }
                self.step(ctx, direction);
            }
            KeySym::Up => self.step(ctx, Direction::Up),
            KeySym::Down => self.step(ctx, Direction::Down),
            KeySym::Home => self.select(ctx, 0),
            KeySym::End => {
                let len = self.overlay.as_ref().map_or(0, SwitcherOverlay::len);
                if len > 0 {
                    self.select(ctx, len - 1);
                }
            }
            KeySym::Tab | KeySym::Other(_) => {}
        }
    }

    fn handle_binding_press(
        &mut self,
        ctx: &mut SessionContext<'_>,
        binding: Binding,
        modifiers: Modifiers,
    ) {
        let backward = modifiers.contains(Modifiers::SHIFT) || binding.is_backward();
        let previous_binding = self.previous.as_ref().map(|(_, b)| *b);
        let promotable =
            previous_binding.is_some_and(|b| b.is_windows() || b.is_panels());
        if promotable && binding.is_group() && !self.rebind_pending {
            self.rebind_pending = true;
            self.anchor = self.selected_window();
            debug!(anchor = ?self.anchor, "group binding pressed, promoting selection");
            self.refresh(ctx, Binding::SwitchGroup, backward);
            return;
        }
        self.step(ctx, if backward { Direction::Left } else { Direction::Right });
    }

    /// Moves to the workspace `delta` away. Returns false if the active
    /// workspace did not change, so the caller can fall back to a plain move.
    fn switch_workspace(&mut self, ctx: &mut SessionContext<'_>, delta: isize) -> bool {
        let count = ctx.host.workspace_count();
        if count < 2 {
            return false;
        }
        let current = ctx.host.active_workspace();
        let target = if ctx.settings.wrap_workspaces {
            (current as isize + delta).rem_euclid(count as isize) as usize
        } else {
            match current.checked_add_signed(delta).filter(|&t| t < count) {
                Some(t) => t,
                None => return false,
            }
        };
        if let Err(err) = ctx.host.switch_to_workspace(target) {
            warn!(%err, target, "workspace switch failed");
            return false;
        }
        let now = ctx.host.active_workspace();
        if now == current {
            return false;
        }
        ctx.host.show_workspace_osd();
        self.broadcasts.push(BroadcastEvent::WorkspaceSwitched { from: current, to: now });
        self.broadcasts.push(BroadcastEvent::WorkspaceOsd { workspace: now });
        self.recall_pending = true;
        self.refresh(ctx, Binding::NoSwitchWindows, false);
        true
    }

    /// `modifiers` are the ones still held after the release.
    pub fn handle_key_release(&mut self, ctx: &mut SessionContext<'_>, modifiers: Modifiers) {
        if self.is_active() && !modifiers.intersects(self.primary_mask) {
            self.finish(ctx);
        }
    }

    pub fn handle_pointer(&mut self, ctx: &mut SessionContext<'_>, event: PointerEvent) {
        if !self.is_active() {
            return;
        }
        let hit = |s: &Self, pt| s.overlay.as_ref().and_then(|o| o.tile_at(pt));
        match event {
            PointerEvent::Moved(pt) => {
                if !self.hover_enabled {
                    return;
                }
                match hit(self, pt) {
                    Some(idx) if self.selected != Some(idx) => self.select(ctx, idx),
                    _ => {}
                }
            }
            PointerEvent::Clicked(pt) => match hit(self, pt) {
                Some(idx) => {
                    self.select(ctx, idx);
                    self.finish(ctx);
                }
                None => self.cancel(ctx),
            },
            PointerEvent::Scrolled(ScrollDirection::Up) => self.step(ctx, Direction::Left),
            PointerEvent::Scrolled(ScrollDirection::Down) => self.step(ctx, Direction::Right),
        }
    }

    pub fn timer_fired(&mut self, ctx: &mut SessionContext<'_>, kind: TimerKind, generation: u64) {
        if !self.is_active() {
            return;
        }
        match kind {
            TimerKind::Reveal if self.reveal_generation == Some(generation) => {
                self.reveal_generation = None;
                if let Some(overlay) = &self.overlay {
                    overlay.reveal(ctx.renderer, ctx.settings.fade_duration());
                }
                self.revealed = true;
                self.broadcasts.push(BroadcastEvent::Revealed);
            }
            TimerKind::HoverReset if self.hover_generation == Some(generation) => {
                self.hover_generation = None;
                self.hover_enabled = true;
            }
            _ => trace!(?kind, generation, "ignoring stale timer"),
        }
    }

    pub fn grab_lost(&mut self, ctx: &mut SessionContext<'_>) {
        debug!("modal grab lost");
        self.finish(ctx);
    }

    pub fn workspaces_changed(&mut self, ctx: &mut SessionContext<'_>) {
        debug!("workspace list changed under the switcher");
        self.cancel(ctx);
    }

    /// Activates the selection and ends the session.
    pub fn finish(&mut self, ctx: &mut SessionContext<'_>) {
        if !self.is_active() {
            return;
        }
        let target = self.selected_window().and_then(|id| ctx.host.window(id));
        let active_workspace = ctx.host.active_workspace();
        let outcome = match target {
            Some(window) => {
                let workspace_changed = window.workspace.is_some_and(|ws| ws != active_workspace);
                match ctx.host.activate_window(window.id) {
                    Ok(()) => Outcome::Activated {
                        window: window.id,
                        workspace_changed,
                    },
                    Err(err) => {
                        warn!(%err, "could not activate selection");
                        Outcome::WindowGone { window: window.id }
                    }
                }
            }
            None => match self.selected_window() {
                Some(window) => Outcome::WindowGone { window },
                None => Outcome::NothingToSwitch,
            },
        };
        self.teardown(ctx);
        if let Outcome::Activated { workspace_changed: true, .. } = outcome {
            ctx.host.show_workspace_osd();
            self.broadcasts.push(BroadcastEvent::WorkspaceOsd {
                workspace: ctx.host.active_workspace(),
            });
        }
        info!(?outcome, "switcher finished");
        self.status = Status::Ended(outcome);
    }

    /// Ends the session without activating anything. Safe to call at any
    /// point, including after the session ended.
    pub fn cancel(&mut self, ctx: &mut SessionContext<'_>) {
        if !self.is_active() {
            return;
        }
        self.teardown(ctx);
        info!("switcher cancelled");
        self.status = Status::Ended(Outcome::Cancelled);
    }

    fn teardown(&mut self, ctx: &mut SessionContext<'_>) {
        if let Some(overlay) = &mut self.overlay {
            overlay.destroy(ctx.renderer);
        }
        ctx.host.release_modal_grab();
        self.reveal_generation = None;
        self.hover_generation = None;
        self.timers.clear();
    }

    fn select(&mut self, ctx: &mut SessionContext<'_>, idx: usize) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let Some(tile) = overlay.tile(idx).cloned() else {
            return;
        };
        overlay.highlight(ctx.renderer, Some(idx));
        overlay.show_title(ctx.renderer, idx);
        self.selected = Some(idx);
        let window_id = self.candidates.get(tile.candidate).map(|c| c.primary());
        if let Some(window_id) = window_id {
            self.broadcasts.push(BroadcastEvent::SelectionChanged {
                index: idx,
                window_id,
                title: tile.title,
                urgent: tile.urgent,
            });
        }
    }

    fn step(&mut self, ctx: &mut SessionContext<'_>, direction: Direction) {
        let Some(overlay) = &self.overlay else {
            return;
        };
        let current = self.selected.unwrap_or(0);
        if let Some(next) = direction.step(current, overlay.len(), overlay.columns(), overlay.rows())
        {
            self.select(ctx, next);
        }
    }

    fn suppress_hover(&mut self, ctx: &mut SessionContext<'_>) {
        self.hover_enabled = false;
        self.generation += 1;
        self.hover_generation = Some(self.generation);
        self.timers.push(TimerRequest {
            kind: TimerKind::HoverReset,
            generation: self.generation,
            delay: ctx.settings.hover_reset(),
        });
    }
}
