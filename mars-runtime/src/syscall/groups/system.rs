use mars_core::MemoryBuffer;

use super::SyscallGroup;
use crate::error::{RegistryError, RuntimeError};
use crate::syscall::{Prim, Syscall, SyscallEnv, SyscallId, SyscallRegistry};

/// `maPanic(code, message)`. Runs the panic hook on the host thread, then stops the
/// interpreter with [`RuntimeError::GuestPanic`].
pub struct SystemSyscalls;

fn read_message(memory: &MemoryBuffer, addr: i32) -> String {
    let text = MemoryBuffer::guest_offset(addr).and_then(|offset| memory.read_cstr(offset));
    match text {
        Ok(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Err(e) => {
            log::warn!("maPanic: unreadable message at {:#x}: {}", addr, e);
            String::new()
        }
    }
}

fn ma_panic(env: &mut SyscallEnv<'_>, args: &[i32]) -> Result<i32, RuntimeError> {
    let code = args[0];
    let message = read_message(env.core.data_memory(), args[1]);
    log::error!("guest panic {}: {}", code, message);

    let hook = env.panic_hook.clone();
    let shown = message.clone();
    env.host.run_blocking(Box::new(move || hook(code, &shown)));

    Err(RuntimeError::GuestPanic { code, message })
}

impl SyscallGroup for SystemSyscalls {
    fn name(&self) -> &'static str {
        "system"
    }

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError> {
        registry.bind(
            self.name(),
            SyscallId::Panic,
            Syscall::Env { params: &[Prim::I32, Prim::Ptr], f: ma_panic },
        )
    }
}
