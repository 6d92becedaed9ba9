//! Change notifications emitted by the queue controller.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::catalog::Ticks;

use super::types::Track;

/// The track that was current before a change, and where it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub track: Track,
    pub position: Ticks,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A new queue replaced the previous one.
    QueueLoaded {
        index: usize,
        track: Track,
        outgoing: Option<Outgoing>,
    },
    /// The current index moved within the same queue (or wrapped onto itself).
    TrackChanged {
        index: usize,
        track: Track,
        outgoing: Option<Outgoing>,
    },
    PlayStateChanged { is_playing: bool },
    /// Position moved by request rather than by the clock.
    Seeked { position: Ticks },
    /// The queue was emptied.
    Cleared { outgoing: Option<Outgoing> },
}

/// Receiving end of a controller subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<PlaybackEvent>,
}

impl Subscription {
    /// Next pending event, if any. Never blocks.
    pub fn try_next(&self) -> Option<PlaybackEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// All pending events, oldest first.
    pub fn drain(&self) -> Vec<PlaybackEvent> {
        self.rx.try_iter().collect()
    }
}

#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        Subscription { rx }
    }

    /// Deliver to every live subscriber; dropped receivers are pruned here.
    pub(crate) fn emit(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
