//! Completion signals for animated scrolls.

use std::cell::Cell;

use async_channel::{Receiver, Sender};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AnimationOutcome {
    /// Reached its target.
    Completed,
    /// Interrupted by a drag, a jump, another animation, or teardown.
    Cancelled,
}

/// Caller side of an animation. Resolves once, when the driving position
/// finishes or abandons the animation.
#[derive(Debug)]
pub struct AnimationHandle {
    receiver: Receiver<AnimationOutcome>,
    outcome: Cell<Option<AnimationOutcome>>,
}

impl AnimationHandle {
    /// A handle that is already resolved.
    pub fn completed(outcome: AnimationOutcome) -> Self {
        let (_, receiver) = async_channel::bounded(1);
        Self {
            receiver,
            outcome: Cell::new(Some(outcome)),
        }
    }

    /// The outcome, if the animation has ended.
    pub fn outcome(&self) -> Option<AnimationOutcome> {
        if let Some(outcome) = self.outcome.get() {
            return Some(outcome);
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(async_channel::TryRecvError::Closed) => AnimationOutcome::Cancelled,
            Err(async_channel::TryRecvError::Empty) => return None,
        };
        self.outcome.set(Some(outcome));
        Some(outcome)
    }

    pub fn is_pending(&self) -> bool {
        self.outcome().is_none()
    }

    /// Waits until the animation ends. The frames that drive it must keep
    /// ticking on the same thread for this to resolve.
    pub async fn finished(&self) -> AnimationOutcome {
        if let Some(outcome) = self.outcome() {
            return outcome;
        }
        let outcome = self
            .receiver
            .recv()
            .await
            .unwrap_or(AnimationOutcome::Cancelled);
        self.outcome.set(Some(outcome));
        outcome
    }
}

/// Position side of an animation.
#[derive(Debug)]
pub(crate) struct AnimationCompleter {
    sender: Option<Sender<AnimationOutcome>>,
}

impl AnimationCompleter {
    pub fn complete(&mut self) {
        self.resolve(AnimationOutcome::Completed);
    }

    pub fn cancel(&mut self) {
        self.resolve(AnimationOutcome::Cancelled);
    }

    fn resolve(&mut self, outcome: AnimationOutcome) {
        if let Some(sender) = self.sender.take() {
            // A dropped handle means nobody is listening.
            let _ = sender.try_send(outcome);
        }
    }
}

impl Drop for AnimationCompleter {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub(crate) fn animation_channel() -> (AnimationCompleter, AnimationHandle) {
    let (sender, receiver) = async_channel::bounded(1);
    (
        AnimationCompleter {
            sender: Some(sender),
        },
        AnimationHandle {
            receiver,
            outcome: Cell::new(None),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_resolves_once() {
        let (mut completer, handle) = animation_channel();
        assert!(handle.is_pending());
        completer.complete();
        completer.cancel();
        assert_eq!(handle.outcome(), Some(AnimationOutcome::Completed));
        assert_eq!(handle.outcome(), Some(AnimationOutcome::Completed));
    }

    #[test]
    fn test_dropped_completer_cancels() {
        let (completer, handle) = animation_channel();
        drop(completer);
        assert_eq!(handle.outcome(), Some(AnimationOutcome::Cancelled));
    }

    #[test]
    fn test_completed_handle() {
        let handle = AnimationHandle::completed(AnimationOutcome::Completed);
        assert!(!handle.is_pending());
        assert_eq!(AnimationOutcome::Cancelled.to_string(), "cancelled");
    }

    #[tokio::test]
    async fn test_finished_waits_for_completion() {
        let (mut completer, handle) = animation_channel();
        let waiter = async { handle.finished().await };
        let driver = async {
            tokio::task::yield_now().await;
            completer.complete();
        };
        let (outcome, ()) = tokio::join!(waiter, driver);
        assert_eq!(outcome, AnimationOutcome::Completed);
    }
}
