use super::SyscallGroup;
use crate::error::RegistryError;
use crate::syscall::{Syscall, SyscallId, SyscallRegistry};

pub struct Transcendental;

impl SyscallGroup for Transcendental {
    fn name(&self) -> &'static str {
        "trig"
    }

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError> {
        let g = self.name();
        registry.bind(g, SyscallId::Sin, Syscall::F64Unary(f64::sin))?;
        registry.bind(g, SyscallId::Cos, Syscall::F64Unary(f64::cos))?;
        registry.bind(g, SyscallId::Tan, Syscall::F64Unary(f64::tan))?;
        registry.bind(g, SyscallId::Sqrt, Syscall::F64Unary(f64::sqrt))?;
        Ok(())
    }
}
