use super::SyscallGroup;
use crate::error::{RegistryError, RuntimeError};
use crate::event::poll_into;
use crate::syscall::{Prim, Syscall, SyscallEnv, SyscallId, SyscallRegistry};

/// `maGetEvent(ptr)`: 1 and the event written at `ptr`, or 0 when nothing is queued.
pub struct EventSyscalls;

fn ma_get_event(env: &mut SyscallEnv<'_>, args: &[i32]) -> Result<i32, RuntimeError> {
    let delivered = poll_into(env.events, env.core.data_memory(), args[0])?;
    Ok(delivered as i32)
}

impl SyscallGroup for EventSyscalls {
    fn name(&self) -> &'static str {
        "event"
    }

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError> {
        registry.bind(
            self.name(),
            SyscallId::GetEvent,
            Syscall::Env { params: &[Prim::Ptr], f: ma_get_event },
        )
    }
}
