use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::Notify;

/// Unbounded FIFO shared between one or more producers and a polling consumer.
///
/// Producers call [`EventQueue::post`] from any thread; the consumer removes events
/// from the front with [`EventQueue::poll`] or [`EventQueue::poll_with`]. Waiting is
/// optional: a consumer that cannot block may simply poll.
#[derive(Default)]
pub struct EventQueue<E> {
    q: Mutex<VecDeque<E>>,
    notify: Notify,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            q: Mutex::new(VecDeque::new()),
            notify: Notify::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<E>> {
        self.q.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn post(&self, ev: E) {
        {
            let mut q = self.lock();
            q.push_back(ev);
        }
        self.notify.notify_waiters();
    }

    pub fn poll(&self) -> Option<E> {
        self.lock().pop_front()
    }

    /// Hand the head event to `f` and remove it only if `f` succeeds.
    ///
    /// Returns `None` when the queue is empty. On `Err` the event stays at the head,
    /// so a consumer that fails to deliver it does not lose it.
    pub fn poll_with<T, X>(&self, f: impl FnOnce(&E) -> Result<T, X>) -> Option<Result<T, X>> {
        let mut q = self.lock();
        let head = q.front()?;
        let out = f(head);
        if out.is_ok() {
            q.pop_front();
        }
        Some(out)
    }

    pub fn drain(&self) -> Vec<E> {
        let mut q = self.lock();
        q.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub async fn wait_nonempty(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_empty() {
                return;
            }
            notified.await;
        }
    }

    pub async fn next(&self) -> E {
        loop {
            let notified = self.notify.notified();
            if let Some(ev) = self.poll() {
                return ev;
            }
            notified.await;
        }
    }

    /// Block until the queue is non-empty. Returns false if `timeout` ran out first;
    /// `None`, or a timeout past what an `Instant` can hold, waits forever. For
    /// consumers that run without an executor.
    pub fn wait_timeout(&self, timeout: Option<Duration>) -> bool {
        if !self.is_empty() {
            return true;
        }
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        loop {
            let since = self.notify.generation();
            if !self.is_empty() {
                return true;
            }
            let left = match deadline {
                None => None,
                Some(d) => match d.checked_duration_since(Instant::now()) {
                    Some(left) => Some(left),
                    None => return false,
                },
            };
            if !self.notify.wait_since(since, left) {
                return !self.is_empty();
            }
        }
    }

    pub fn notifier(&self) -> &Notify {
        &self.notify
    }
}
