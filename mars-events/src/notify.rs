use std::future::Future;
use std::pin::Pin;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Broadcast wake-up for both async and blocking waiters.
///
/// Every [`Notify::notify_waiters`] call advances a generation counter. A waiter
/// records the generation it started from and is released by any later one, so a
/// notification that lands between "check the condition" and "start waiting" is
/// never lost.
#[derive(Default)]
pub struct Notify {
    state: Mutex<State>,
    cond: Condvar,
}

#[derive(Default)]
struct State {
    generation: u64,
    parked: Vec<Waker>,
}

impl State {
    #[inline]
    fn passed(&self, since: u64) -> bool {
        self.generation != since
    }
}

impl Notify {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current generation, to pass to [`Notify::wait_since`].
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn notify_waiters(&self) {
        let parked = {
            let mut st = self.state();
            st.generation = st.generation.wrapping_add(1);
            std::mem::take(&mut st.parked)
        };
        self.cond.notify_all();
        parked.into_iter().for_each(Waker::wake);
    }

    /// Future that resolves on the first notification after this call.
    pub fn notified(&self) -> Notified<'_> {
        Notified { notify: self, since: self.generation() }
    }

    /// Block the calling thread until a notification newer than `since`.
    ///
    /// Returns false if `timeout` ran out first. `None`, or a timeout too long to
    /// represent as an `Instant`, waits forever.
    pub fn wait_since(&self, since: u64, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut st = self.state();
        while !st.passed(since) {
            st = match deadline {
                None => self.cond.wait(st).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.cond
                        .wait_timeout(st, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        true
    }
}

pub struct Notified<'a> {
    notify: &'a Notify,
    since: u64,
}

impl Future for Notified<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut st = self.notify.state();
        if st.passed(self.since) {
            return Poll::Ready(());
        }
        let waker = cx.waker();
        match st.parked.iter_mut().find(|w| w.will_wake(waker)) {
            Some(slot) => slot.clone_from(waker),
            None => st.parked.push(waker.clone()),
        }
        Poll::Pending
    }
}
