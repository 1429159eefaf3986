//! Completion futures
//!
//! Every animation request returns a [`Completion`]. It resolves when the
//! clock finishes the task, when its owner is destroyed, or immediately for
//! requests that have nothing to do. A dropped sender counts as resolved so
//! a torn-down clock never leaves a waiting transition hanging.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;

use crate::error::AnimationError;

pub type CompletionResult = Result<(), AnimationError>;

#[must_use = "a completion does nothing unless awaited"]
pub struct Completion {
    inner: Inner,
}

enum Inner {
    Pending(oneshot::Receiver<CompletionResult>),
    Ready(Option<CompletionResult>),
    Composite(LocalBoxFuture<'static, CompletionResult>),
}

impl Completion {
    /// A completion and the sender that settles it
    pub(crate) fn channel() -> (oneshot::Sender<CompletionResult>, Completion) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Completion {
                inner: Inner::Pending(rx),
            },
        )
    }

    pub fn resolved() -> Completion {
        Completion {
            inner: Inner::Ready(Some(Ok(()))),
        }
    }

    pub fn rejected(err: AnimationError) -> Completion {
        Completion {
            inner: Inner::Ready(Some(Err(err))),
        }
    }

    /// Resolves once every completion has; the first error wins
    pub fn all(completions: impl IntoIterator<Item = Completion>) -> Completion {
        let completions: Vec<Completion> = completions.into_iter().collect();
        if completions.is_empty() {
            return Completion::resolved();
        }
        let joined = join_all(completions)
            .map(|results| results.into_iter().collect::<CompletionResult>());
        Completion {
            inner: Inner::Composite(joined.boxed_local()),
        }
    }
}

impl Future for Completion {
    type Output = CompletionResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                // Sender dropped with its clock
                Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Ok(())),
                Poll::Pending => Poll::Pending,
            },
            Inner::Ready(result) => Poll::Ready(result.take().unwrap_or(Ok(()))),
            Inner::Composite(future) => future.as_mut().poll(cx),
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.inner {
            Inner::Pending(_) => "pending",
            Inner::Ready(_) => "ready",
            Inner::Composite(_) => "composite",
        };
        f.debug_tuple("Completion").field(&state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_ready_variants() {
        assert_eq!(block_on(Completion::resolved()), Ok(()));
        let err = AnimationError::NodeNotDrawn {
            entity: "x".to_string(),
        };
        assert_eq!(block_on(Completion::rejected(err.clone())), Err(err));
    }

    #[test]
    fn test_dropped_sender_resolves() {
        let (tx, completion) = Completion::channel();
        drop(tx);
        assert_eq!(block_on(completion), Ok(()));
    }

    #[test]
    fn test_all_waits_for_every_branch() {
        let (a_tx, a) = Completion::channel();
        let (b_tx, b) = Completion::channel();
        let all = Completion::all([a, b]);
        assert!(a_tx.send(Ok(())).is_ok());
        assert!(b_tx.send(Ok(())).is_ok());
        assert_eq!(block_on(all), Ok(()));
    }

    #[test]
    fn test_all_reports_error() {
        let err = AnimationError::NodeNotDrawn {
            entity: "y".to_string(),
        };
        let all = Completion::all([Completion::resolved(), Completion::rejected(err.clone())]);
        assert_eq!(block_on(all), Err(err));
        assert_eq!(block_on(Completion::all(Vec::new())), Ok(()));
    }
}
