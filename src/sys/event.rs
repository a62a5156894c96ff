use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::model::Binding;
use crate::sys::geometry::Point;

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[serde(transparent)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

impl Modifiers {
    /// The modifier that has to stay held for the session to remain open.
    ///
    /// Shift only flips direction, so it never counts as the primary
    /// modifier unless nothing else is part of the binding.
    pub fn primary(self) -> Modifiers {
        for m in [Modifiers::ALT, Modifiers::SUPER, Modifiers::CONTROL, Modifiers::SHIFT] {
            if self.contains(m) {
                return m;
            }
        }
        Modifiers::empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySym {
    Escape,
    Return,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Other(u32),
}

/// A key event as delivered while the overlay holds the grab.
///
/// `binding` is the host's resolution of the keystroke to one of the switcher
/// bindings, if any.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub sym: KeySym,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub binding: Option<Binding>,
}

impl KeyEvent {
    pub fn new(sym: KeySym, modifiers: Modifiers) -> Self { Self { sym, modifiers, binding: None } }

    pub fn for_binding(binding: Binding, modifiers: Modifiers) -> Self {
        Self {
            sym: KeySym::Tab,
            modifiers,
            binding: Some(binding),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(Point),
    Clicked(Point),
    Scrolled(ScrollDirection),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_modifier_prefers_non_shift() {
        assert_eq!((Modifiers::ALT | Modifiers::SHIFT).primary(), Modifiers::ALT);
        assert_eq!(Modifiers::SHIFT.primary(), Modifiers::SHIFT);
        assert_eq!(Modifiers::empty().primary(), Modifiers::empty());
    }

    #[test]
    fn modifiers_read_as_flag_names() {
        let mods: Modifiers = ron::from_str(r#""ALT | CONTROL""#).unwrap();
        assert_eq!(mods, Modifiers::ALT | Modifiers::CONTROL);
        let none: Modifiers = ron::from_str(r#""""#).unwrap();
        assert_eq!(none, Modifiers::empty());

        let key: KeyEvent = ron::from_str(r#"(sym: End, modifiers: "SUPER")"#).unwrap();
        assert_eq!(key, KeyEvent::new(KeySym::End, Modifiers::SUPER));
        assert_eq!(serde_json::to_string(&Modifiers::SHIFT).unwrap(), r#""SHIFT""#);
    }
}
