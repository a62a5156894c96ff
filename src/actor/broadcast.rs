use serde::{Deserialize, Serialize};

use crate::model::{Binding, WindowId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "kind")]
pub enum Outcome {
    /// The selected window was activated.
    Activated {
        window: WindowId,
        workspace_changed: bool,
    },
    /// The selected window disappeared before it could be activated.
    WindowGone { window: WindowId },
    /// Committed with nothing to activate.
    NothingToSwitch,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    SessionStarted {
        binding: Binding,
    },
    SelectionChanged {
        index: usize,
        window_id: WindowId,
        title: String,
        urgent: bool,
    },
    WorkspaceSwitched {
        from: usize,
        to: usize,
    },
    WorkspaceOsd {
        workspace: usize,
    },
    Revealed,
    SessionEnded {
        outcome: Outcome,
    },
}

pub type BroadcastSender = crate::actor::Sender<BroadcastEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<BroadcastEvent>;
