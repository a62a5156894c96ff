//! Message plumbing shared by the actors.
//!
//! Every event travels with the span that was current when it was sent, so
//! the receiving actor can log it under the sender's context.

use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;
use tracing::Span;

pub mod activation;
pub mod broadcast;
pub mod switcher;

type Envelope<Event> = (Span, Event);

pub struct Sender<Event>(UnboundedSender<Envelope<Event>>);
pub type Receiver<Event> = UnboundedReceiver<Envelope<Event>>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    /// Fire and forget. A closed channel means the actor has shut down.
    pub fn send(&self, event: Event) { _ = self.try_send(event) }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<Envelope<Event>>> {
        self.0.send((Span::current(), event))
    }

    /// Sends the event built by `make` and waits for the actor's reply.
    /// `None` if the actor went away before answering.
    pub async fn request<R>(&self, make: impl FnOnce(oneshot::Sender<R>) -> Event) -> Option<R> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.try_send(make(reply_tx)).ok()?;
        reply_rx.await.ok()
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> std::fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("actor::Sender").field("closed", &self.is_closed()).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test(tokio::test)]
    async fn request_gets_reply_or_none() {
        let (tx, mut rx) = channel::<oneshot::Sender<u32>>();
        let answer = async {
            let (_, reply) = rx.recv().await.unwrap();
            reply.send(7).unwrap();
            drop(rx);
        };
        let (got, ()) = tokio::join!(tx.request(|reply| reply), answer);
        assert_eq!(got, Some(7));

        assert!(tx.is_closed());
        assert_eq!(tx.request(|reply| reply).await, None);
    }
}
