//! Installs the switcher on the host's key bindings and takes it off again.

use tracing::{debug, info};

use crate::actor::switcher::{self, Event};
use crate::common::config::BindingSettings;
use crate::model::Binding;
use crate::sys::event::Modifiers;

pub type BindingHandler = Box<dyn Fn(Modifiers) + Send>;

/// The host's table of key binding handlers.
pub trait KeybindingRegistry {
    fn set_custom_handler(&mut self, binding: Binding, handler: BindingHandler);

    /// Puts the host's own handler back.
    fn restore_default_handler(&mut self, binding: Binding);
}

pub struct Activation {
    tx: switcher::Sender,
    bindings: Vec<Binding>,
    installed: Vec<Binding>,
}

impl Activation {
    pub fn new(tx: switcher::Sender, settings: &BindingSettings) -> Self {
        Self {
            tx,
            bindings: settings.installed(),
            installed: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool { !self.installed.is_empty() }

    pub fn installed(&self) -> &[Binding] { &self.installed }

    /// Points every configured binding at the switcher. Calling it again
    /// while enabled does nothing.
    pub fn enable(&mut self, registry: &mut dyn KeybindingRegistry) {
        if self.is_enabled() {
            return;
        }
        for &binding in &self.bindings {
            let tx = self.tx.clone();
            registry.set_custom_handler(
                binding,
                Box::new(move |modifiers| tx.send(Event::Start { binding, modifiers })),
            );
            debug!(%binding, "installed switcher handler");
            self.installed.push(binding);
        }
        info!(count = self.installed.len(), "switcher enabled");
    }

    /// Restores the host's handlers for everything `enable` installed.
    pub fn disable(&mut self, registry: &mut dyn KeybindingRegistry) {
        for binding in self.installed.drain(..) {
            registry.restore_default_handler(binding);
            debug!(%binding, "restored default handler");
        }
        info!("switcher disabled");
    }
}
