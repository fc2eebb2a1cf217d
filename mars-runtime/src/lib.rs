//! mars-runtime
//!
//! The native side of the MARS VM. A [`RuntimeCore`] owns the syscall table the
//! interpreter calls into, the resource table guest code addresses by handle, and the
//! queue through which host input reaches the VM thread.
//!
//! The interpreter itself lives elsewhere; it hands its data memory to the runtime on
//! every syscall through the [`GuestCore`] trait.

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod input;
pub mod logging;
pub mod runtime;
pub mod syscall;
pub mod trace;

pub use config::{LoggerConfig, RuntimeConfig, RuntimeConfigBuilder};
pub use error::{RegistryError, RuntimeError};
pub use event::{Event, EventType};
pub use host::{host_channel, HostAction, HostDispatch, HostHandle, HostPump, InlineHost};
pub use input::InputHub;
pub use runtime::{PanicHook, RuntimeBuilder, RuntimeCore};
pub use syscall::{
    GuestCore, Prim, Syscall, SyscallEnv, SyscallGroup, SyscallId, SyscallRegistry, SyscallReturn,
    SYSCALL_GROUPS,
};

pub use mars_core::{Handle, MemoryBuffer, Resource, ResourceTable, ResourceType};
