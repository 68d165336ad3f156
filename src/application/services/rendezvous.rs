//! # Rendezvous
//!
//! Single-admission hand-off between fetch tasks and the race executor.
//!
//! Any number of tasks may [`offer`](Rendezvous::offer) a value; exactly one
//! is admitted and delivered to the receiver, the rest are rejected on the
//! spot. Offering never blocks or waits on the receiver, so a slow loser
//! always runs to completion.
//!
//! # Examples
//!
//! ```
//! use cep_race::application::services::rendezvous::{Admission, Rendezvous};
//!
//! let (rendezvous, mut receiver) = Rendezvous::channel();
//! assert_eq!(rendezvous.offer("first"), Admission::Admitted);
//! assert_eq!(rendezvous.offer("second"), Admission::Rejected);
//! assert_eq!(receiver.try_recv().unwrap(), "first");
//! ```

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Result of offering a value to a [`Rendezvous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The value was accepted and handed to the receiver.
    Admitted,
    /// Someone else won, the rendezvous was closed, or the receiver is gone.
    Rejected,
}

/// Single-slot hand-off that admits at most one value.
#[derive(Debug)]
pub struct Rendezvous<T> {
    slot: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Rendezvous<T> {
    /// Creates a rendezvous and the receiver the admitted value goes to.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                slot: Mutex::new(Some(sender)),
            },
            receiver,
        )
    }

    /// Offers a value. Only the first offer on an open rendezvous is admitted.
    pub fn offer(&self, value: T) -> Admission {
        // The lock is held only for the take; the send happens outside it.
        let sender = self.slot.lock().take();
        match sender.map(|sender| sender.send(value)) {
            Some(Ok(())) => Admission::Admitted,
            _ => Admission::Rejected,
        }
    }

    /// Stops admitting. Later offers are rejected.
    pub fn close(&self) {
        self.slot.lock().take();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    #[test]
    fn first_offer_wins() {
        let (rendezvous, mut receiver) = Rendezvous::channel();
        assert_eq!(rendezvous.offer(1), Admission::Admitted);
        assert_eq!(rendezvous.offer(2), Admission::Rejected);
        assert_eq!(receiver.try_recv().unwrap(), 1);
    }

    #[test]
    fn offer_returns_value_to_receiver_once() {
        let (rendezvous, mut receiver) = Rendezvous::channel();
        assert_eq!(rendezvous.offer(String::from("winner")), Admission::Admitted);
        assert_eq!(receiver.try_recv().unwrap(), "winner");
        assert_eq!(rendezvous.offer(String::from("late")), Admission::Rejected);
    }

    #[test]
    fn closed_rejects_offers() {
        let (rendezvous, mut receiver) = Rendezvous::channel();
        rendezvous.close();
        assert_eq!(rendezvous.offer(7), Admission::Rejected);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_rejects_without_blocking() {
        let (rendezvous, receiver) = Rendezvous::channel();
        drop(receiver);
        assert_eq!(rendezvous.offer(7), Admission::Rejected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn exactly_one_admission_under_contention() {
        const CONTENDERS: usize = 256;

        let (rendezvous, receiver) = Rendezvous::channel();
        let rendezvous = Arc::new(rendezvous);
        let barrier = Arc::new(Barrier::new(CONTENDERS));
        let admitted = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(CONTENDERS);
        for id in 0..CONTENDERS {
            let rendezvous = Arc::clone(&rendezvous);
            let barrier = Arc::clone(&barrier);
            let admitted = Arc::clone(&admitted);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                if rendezvous.offer(id) == Admission::Admitted {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        for handle in futures::future::join_all(handles).await {
            handle.unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        let winner = receiver.await.unwrap();
        assert!(winner < CONTENDERS);
    }
}
