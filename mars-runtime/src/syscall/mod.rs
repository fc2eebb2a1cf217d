//! The syscall table.
//!
//! Every native routine guest code can reach has a fixed [`SyscallId`]. Groups of
//! related routines bind their ids into a [`SyscallRegistry`] once at startup; after
//! that the table is only read. Calls arrive as raw 32-bit argument words and are
//! decoded according to the bound [`Syscall`]'s signature.

mod groups;
mod id;
mod registry;

pub use groups::{
    DoubleMath, EventSyscalls, ResourceSyscalls, SingleMath, SyscallGroup, SystemSyscalls,
    Transcendental, SYSCALL_GROUPS,
};
pub use id::SyscallId;
pub use registry::{EnvFn, Prim, Syscall, SyscallRegistry, SyscallReturn};

use mars_core::{MemoryBuffer, ResourceTable};
use mars_events::EventQueue;

use crate::event::Event;
use crate::host::HostDispatch;
use crate::runtime::PanicHook;

/// What the interpreter exposes to native code: its data memory.
pub trait GuestCore {
    fn data_memory(&mut self) -> &mut MemoryBuffer;
}

impl GuestCore for MemoryBuffer {
    fn data_memory(&mut self) -> &mut MemoryBuffer {
        self
    }
}

/// Everything a syscall may touch while it runs. Built by the runtime for the
/// duration of one call.
pub struct SyscallEnv<'a> {
    pub core: &'a mut dyn GuestCore,
    pub resources: &'a ResourceTable,
    pub events: &'a EventQueue<Event>,
    pub host: &'a dyn HostDispatch,
    pub panic_hook: &'a PanicHook,
}

impl SyscallEnv<'_> {
    #[inline]
    pub fn memory(&mut self) -> &mut MemoryBuffer {
        self.core.data_memory()
    }
}
