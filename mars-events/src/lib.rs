//! mars-events
//!
//! The handoff point between the host thread, which produces input events, and the
//! VM thread, which drains them by polling. Everything here is generic over the event
//! type so the runtime crate decides the wire shape.

mod notify;
mod queue;

pub use notify::{Notified, Notify};
pub use queue::EventQueue;
