use crossbeam_channel::{Receiver, Sender};

/// Work the VM thread wants executed on the host (UI) thread.
pub type HostAction = Box<dyn FnOnce() + Send + 'static>;

/// Runs actions on the host thread on behalf of the VM thread.
///
/// `run_blocking` returns only after the action has finished. There is no timeout:
/// a host that never pumps blocks the VM thread for good.
pub trait HostDispatch: Send + Sync {
    fn run_blocking(&self, action: HostAction);
}

/// Runs the action on the calling thread. For hosts without a separate UI thread,
/// and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineHost;

impl HostDispatch for InlineHost {
    fn run_blocking(&self, action: HostAction) {
        action();
    }
}

struct Request {
    action: HostAction,
    done: Sender<()>,
}

/// Create a connected pair: the handle goes to the runtime, the pump stays on the
/// host thread and is driven from its event loop.
pub fn host_channel() -> (HostHandle, HostPump) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (HostHandle { tx }, HostPump { rx })
}

/// VM-side end of [`host_channel`].
#[derive(Clone)]
pub struct HostHandle {
    tx: Sender<Request>,
}

impl HostDispatch for HostHandle {
    fn run_blocking(&self, action: HostAction) {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        if self.tx.send(Request { action, done: done_tx }).is_err() {
            log::error!("host pump is gone, dropping host action");
            return;
        }
        // The pump drops the request without replying only when it is shut down.
        if done_rx.recv().is_err() {
            log::error!("host pump shut down before finishing an action");
        }
    }
}

/// Host-side end of [`host_channel`].
pub struct HostPump {
    rx: Receiver<Request>,
}

impl HostPump {
    fn execute(req: Request) {
        (req.action)();
        // The waiting side may have given up already.
        let _ = req.done.send(());
    }

    /// Run every action queued so far without blocking. Returns how many ran.
    pub fn pump(&self) -> usize {
        let mut count = 0;
        while let Ok(req) = self.rx.try_recv() {
            Self::execute(req);
            count += 1;
        }
        count
    }

    /// Serve actions until every [`HostHandle`] has been dropped.
    pub fn run(&self) {
        while let Ok(req) = self.rx.recv() {
            Self::execute(req);
        }
        log::debug!("host pump: all handles dropped");
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
