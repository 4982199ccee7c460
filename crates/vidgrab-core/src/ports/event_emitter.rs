//! Event emitter trait for relaying progress out of long-running operations.
//!
//! Implementations handle transport details (channels, terminal rendering).
//! Operations take an emitter instead of a callback so the producer never
//! blocks on the consumer.

use tokio::sync::mpsc;

/// Trait for emitting events of type `E`.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - `ChannelEmitter` - Forwards into a tokio unbounded channel
pub trait EventEmitter<E>: Send + Sync {
    /// Emit an event. Must not block.
    fn emit(&self, event: E);
}

/// A no-op event emitter for tests and headless contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl<E> EventEmitter<E> for NoopEmitter {
    fn emit(&self, _event: E) {}
}

/// Emitter backed by an unbounded mpsc sender.
///
/// Events are delivered in emission order. A dropped receiver silently
/// discards further events.
#[derive(Debug)]
pub struct ChannelEmitter<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for ChannelEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> ChannelEmitter<E> {
    pub const fn new(tx: mpsc::UnboundedSender<E>) -> Self {
        Self { tx }
    }

    /// Create an emitter together with its receiving end.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<E: Send> EventEmitter<E> for ChannelEmitter<E> {
    fn emit(&self, event: E) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopEmitter::new();
        // Should not panic
        EventEmitter::<u32>::emit(&emitter, 1);
    }

    #[tokio::test]
    async fn test_channel_emitter_preserves_order() {
        let (emitter, mut rx) = ChannelEmitter::channel();
        for i in 0..5u32 {
            emitter.emit(i);
        }
        drop(emitter);

        let mut seen = Vec::new();
        while let Some(v) = rx.recv().await {
            seen.push(v);
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_channel_emitter_survives_closed_receiver() {
        let (emitter, rx) = ChannelEmitter::<&str>::channel();
        drop(rx);
        emitter.emit("ignored");
    }
}
