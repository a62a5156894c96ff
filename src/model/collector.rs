use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::common::collections::HashSet;
use crate::model::server::{WindowData, WindowId};
use crate::sys::host::WindowSource;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    CurrentWorkspace,
    AllWorkspaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectRequest {
    pub scope: Scope,
    pub grouped: bool,
    pub anchor: Option<WindowId>,
}

/// One switchable entry. `members[0]` is the window that gets activated.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub window: WindowData,
    pub members: Vec<WindowId>,
}

impl Candidate {
    fn new(window: WindowData) -> Self {
        let members = vec![window.id];
        Self { window, members }
    }

    pub fn primary(&self) -> WindowId { self.members[0] }
}

/// Ordered candidates with unique window ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateList(Vec<Candidate>);

impl CandidateList {
    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, idx: usize) -> Option<&Candidate> { self.0.get(idx) }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> { self.0.iter() }

    pub fn ids(&self) -> Vec<WindowId> { self.0.iter().map(Candidate::primary).collect() }

    pub fn position(&self, id: WindowId) -> Option<usize> {
        self.0.iter().position(|c| c.primary() == id)
    }
}

pub struct WindowCollector<'a, S: WindowSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: WindowSource + ?Sized> WindowCollector<'a, S> {
    pub fn new(source: &'a S) -> Self { Self { source } }

    /// Gathers, filters, deduplicates and orders the switchable windows.
    ///
    /// `active_workspace` is sampled by the caller so that a whole refresh
    /// sees one consistent value.
    pub fn collect(&self, request: &CollectRequest, active_workspace: usize) -> CandidateList {
        let raw = match request.scope {
            Scope::AllWorkspaces => (0..self.source.workspace_count())
                .flat_map(|ws| self.source.list_windows_in_workspace(ws))
                .collect(),
            Scope::CurrentWorkspace => {
                let raw = self.source.list_windows_in_workspace(active_workspace);
                if request.grouped {
                    self.restrict_to_group(raw, request.anchor)
                } else {
                    raw
                }
            }
        };
        trace!(raw = raw.len(), ?request, "collecting windows");

        let mut seen = HashSet::default();
        let mut windows: Vec<WindowData> = raw
            .into_iter()
            .filter(|w| self.source.is_interesting(w))
            .filter(|w| seen.insert(w.id))
            .collect();
        windows.sort_by(|a, b| compare_windows(a, b, active_workspace));

        debug!(count = windows.len(), "collected candidates");
        CandidateList(windows.into_iter().map(Candidate::new).collect())
    }

    fn restrict_to_group(&self, raw: Vec<WindowData>, anchor: Option<WindowId>) -> Vec<WindowData> {
        let anchor = anchor
            .and_then(|id| self.source.window(id))
            .filter(|w| self.source.is_interesting(w));
        let app = match &anchor {
            Some(window) => self.source.resolve_application(window),
            None => raw.first().and_then(|w| self.source.resolve_application(w)),
        };
        match app {
            Some(app) => {
                trace!(%app, "restricting to application");
                self.source.windows_of_application(&app)
            }
            None => anchor.or_else(|| raw.into_iter().next()).into_iter().collect(),
        }
    }
}

/// Active workspace first, then windows showing on their workspace, then most
/// recently used. Windows on every workspace count as on the active one.
fn compare_windows(a: &WindowData, b: &WindowData, active_workspace: usize) -> Ordering {
    let on_active = |w: &WindowData| w.workspace.is_none_or(|ws| ws == active_workspace);
    on_active(b)
        .cmp(&on_active(a))
        .then_with(|| b.showing.cmp(&a.showing))
        .then_with(|| b.user_time.cmp(&a.user_time))
}
