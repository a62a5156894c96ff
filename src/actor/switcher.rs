//! The actor that owns the host, the renderer and at most one live session.

mod session;

pub use session::{SessionContext, Status, SwitcherSession, TimerKind, TimerRequest};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::actor::broadcast::{BroadcastEvent, BroadcastSender, Outcome};
use crate::actor;
use crate::common::config::Config;
use crate::model::Binding;
use crate::sys::event::{KeyEvent, Modifiers, PointerEvent};
use crate::sys::host::{Host, TileRenderer};

#[derive(Debug)]
pub enum Event {
    /// A switcher binding fired with `modifiers` held.
    Start {
        binding: Binding,
        modifiers: Modifiers,
    },
    KeyPressed(KeyEvent),
    /// Keys came up; `modifiers` are the ones still held.
    KeyReleased {
        modifiers: Modifiers,
    },
    Pointer(PointerEvent),
    GrabLost,
    WorkspacesChanged,
    TimerFired {
        session: u64,
        kind: TimerKind,
        generation: u64,
    },
    UpdateConfig(Config),
    /// Answered once every event sent before it has been handled.
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

struct LiveSession {
    id: u64,
    session: SwitcherSession,
    /// Cancels the timer tasks scheduled for this session.
    timers: CancellationToken,
}

pub struct SwitcherActor<H, R> {
    config: Config,
    rx: Receiver,
    tx: Sender,
    broadcast_tx: BroadcastSender,
    host: H,
    renderer: R,
    live: Option<LiveSession>,
    next_session: u64,
}

impl<H: Host, R: TileRenderer> SwitcherActor<H, R> {
    pub fn new(config: Config, host: H, renderer: R, broadcast_tx: BroadcastSender) -> (Self, Sender) {
        let (tx, rx) = actor::channel();
        let actor = Self {
            config,
            rx,
            tx: tx.clone(),
            broadcast_tx,
            host,
            renderer,
            live: None,
            next_session: 0,
        };
        (actor, tx)
    }

    pub fn host(&self) -> &H { &self.host }

    pub fn renderer(&self) -> &R { &self.renderer }

    pub fn session(&self) -> Option<&SwitcherSession> { self.live.as_ref().map(|l| &l.session) }

    /// Runs until [`Event::Shutdown`] arrives. Returns the host and renderer
    /// so their final state can be inspected.
    pub async fn run(mut self) -> (H, R) {
        while let Some((span, event)) = self.rx.recv().await {
            let _guard = span.enter();
            if matches!(event, Event::Shutdown) {
                self.end_live(|s, ctx| s.cancel(ctx));
                break;
            }
            self.handle_event(event);
        }
        (self.host, self.renderer)
    }

    #[instrument(skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start { binding, modifiers } => self.start(binding, modifiers),
            Event::KeyPressed(key) => self.with_session(|s, ctx| s.handle_key_press(ctx, key)),
            Event::KeyReleased { modifiers } => {
                self.with_session(|s, ctx| s.handle_key_release(ctx, modifiers))
            }
            Event::Pointer(pointer) => self.with_session(|s, ctx| s.handle_pointer(ctx, pointer)),
            Event::GrabLost => self.with_session(|s, ctx| s.grab_lost(ctx)),
            Event::WorkspacesChanged => self.with_session(|s, ctx| s.workspaces_changed(ctx)),
            Event::TimerFired { session, kind, generation } => {
                if self.live.as_ref().is_some_and(|l| l.id == session) {
                    self.with_session(|s, ctx| s.timer_fired(ctx, kind, generation));
                } else {
                    trace!(session, ?kind, "timer for a finished session");
                }
            }
            Event::UpdateConfig(config) => {
                self.config = config;
                if !self.config.settings.switcher.enabled {
                    self.end_live(|s, ctx| s.cancel(ctx));
                }
            }
            Event::Barrier(done) => {
                // The waiter may have given up; nothing to do then.
                _ = done.send(());
            }
            Event::Shutdown => self.end_live(|s, ctx| s.cancel(ctx)),
        }
    }

    fn start(&mut self, binding: Binding, modifiers: Modifiers) {
        if !self.config.settings.switcher.enabled {
            debug!(%binding, "switcher disabled, ignoring binding");
            return;
        }
        if !binding.is_registrable() {
            warn!(%binding, "cannot start a session from this binding");
            return;
        }
        if self.live.is_some() {
            debug!("new binding while a session is live, cancelling it");
            self.end_live(|s, ctx| s.cancel(ctx));
        }

        let mut ctx = SessionContext {
            host: &mut self.host,
            renderer: &mut self.renderer,
            settings: &self.config.settings.switcher,
        };
        let session = SwitcherSession::start(binding, modifiers, &mut ctx);
        if !session.was_started() {
            debug!(%binding, "switcher did not start");
            return;
        }
        self.next_session += 1;
        self.live = Some(LiveSession {
            id: self.next_session,
            session,
            timers: CancellationToken::new(),
        });
        self.pump();
    }

    fn with_session(&mut self, f: impl FnOnce(&mut SwitcherSession, &mut SessionContext<'_>)) {
        let Some(live) = self.live.as_mut() else {
            trace!("no live session");
            return;
        };
        let mut ctx = SessionContext {
            host: &mut self.host,
            renderer: &mut self.renderer,
            settings: &self.config.settings.switcher,
        };
        f(&mut live.session, &mut ctx);
        self.pump();
    }

    fn end_live(&mut self, f: impl FnOnce(&mut SwitcherSession, &mut SessionContext<'_>)) {
        if self.live.is_some() {
            self.with_session(f);
        }
    }

    /// Forwards what the session produced and retires it once it has ended.
    fn pump(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        for event in live.session.take_broadcasts() {
            self.broadcast_tx.send(event);
        }
        for timer in live.session.take_timers() {
            schedule(&self.tx, live.id, live.timers.clone(), timer);
        }
        if let Status::Ended(outcome) = live.session.status() {
            live.timers.cancel();
            self.live = None;
            self.broadcast_tx.send(BroadcastEvent::SessionEnded { outcome });
            if let Outcome::Activated { window, .. } = outcome {
                debug!(%window, "activated");
            }
        }
    }
}

fn schedule(tx: &Sender, session: u64, token: CancellationToken, timer: TimerRequest) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(timer.delay) => tx.send(Event::TimerFired {
                session,
                kind: timer.kind,
                generation: timer.generation,
            }),
        }
    });
}
