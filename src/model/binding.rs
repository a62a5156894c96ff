use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::model::collector::{CollectRequest, Scope};

/// The switcher key bindings, named the way the host names them.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Binding {
    SwitchWindows,
    SwitchWindowsBackward,
    SwitchGroup,
    SwitchGroupBackward,
    SwitchPanels,
    /// Synthetic binding used to refresh after an in-overlay workspace switch.
    /// Never registered with the host.
    NoSwitchWindows,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindingClass {
    Windows,
    Group,
    Panels,
}

impl Binding {
    /// Bindings installed by the activation glue.
    pub const REGISTERED: [Binding; 5] = [
        Binding::SwitchWindows,
        Binding::SwitchWindowsBackward,
        Binding::SwitchGroup,
        Binding::SwitchGroupBackward,
        Binding::SwitchPanels,
    ];

    pub fn class(self) -> Option<BindingClass> {
        use Binding::*;
        match self {
            SwitchWindows | SwitchWindowsBackward => Some(BindingClass::Windows),
            SwitchGroup | SwitchGroupBackward => Some(BindingClass::Group),
            SwitchPanels => Some(BindingClass::Panels),
            NoSwitchWindows => None,
        }
    }

    pub fn is_windows(self) -> bool { self.class() == Some(BindingClass::Windows) }

    pub fn is_group(self) -> bool { self.class() == Some(BindingClass::Group) }

    pub fn is_panels(self) -> bool { self.class() == Some(BindingClass::Panels) }

    pub fn is_backward(self) -> bool {
        matches!(self, Binding::SwitchWindowsBackward | Binding::SwitchGroupBackward)
    }

    pub fn is_registrable(self) -> bool { self.class().is_some() }

    /// What the collector should gather for this binding.
    pub fn collect_request(self) -> CollectRequest {
        CollectRequest {
            scope: if self.is_panels() {
                Scope::AllWorkspaces
            } else {
                Scope::CurrentWorkspace
            },
            grouped: self.is_group(),
            anchor: None,
        }
    }
}
