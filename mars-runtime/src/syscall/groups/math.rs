use std::cmp::Ordering;

use super::SyscallGroup;
use crate::error::RegistryError;
use crate::syscall::{Syscall, SyscallId, SyscallRegistry};

/// Three-way compare; unordered operands (NaN) compare equal.
fn compare<T: PartialOrd>(a: T, b: T) -> i32 {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => -1,
        Some(Ordering::Greater) => 1,
        _ => 0,
    }
}

/// Double precision soft-float helpers.
///
/// Float to integer conversions truncate toward zero and saturate at the target
/// range; NaN converts to 0.
pub struct DoubleMath;

impl SyscallGroup for DoubleMath {
    fn name(&self) -> &'static str {
        "double"
    }

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError> {
        let g = self.name();
        registry.bind(g, SyscallId::AddF64, Syscall::F64Binary(|a, b| a + b))?;
        registry.bind(g, SyscallId::SubF64, Syscall::F64Binary(|a, b| a - b))?;
        registry.bind(g, SyscallId::MulF64, Syscall::F64Binary(|a, b| a * b))?;
        registry.bind(g, SyscallId::DivF64, Syscall::F64Binary(|a, b| a / b))?;
        registry.bind(g, SyscallId::NegF64, Syscall::F64Unary(|a| -a))?;
        registry.bind(g, SyscallId::F64ToI32, Syscall::F64ToI32(|a| a as i32))?;
        registry.bind(g, SyscallId::F64ToU32, Syscall::F64ToU32(|a| a as u32))?;
        registry.bind(g, SyscallId::I32ToF64, Syscall::I32ToF64(f64::from))?;
        registry.bind(g, SyscallId::F32ToF64, Syscall::F32ToF64(f64::from))?;
        registry.bind(g, SyscallId::CmpF64, Syscall::F64Compare(compare))?;
        Ok(())
    }
}

/// Single precision mirrors of [`DoubleMath`], plus the double to single narrowing.
pub struct SingleMath;

impl SyscallGroup for SingleMath {
    fn name(&self) -> &'static str {
        "single"
    }

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError> {
        let g = self.name();
        registry.bind(g, SyscallId::AddF32, Syscall::F32Binary(|a, b| a + b))?;
        registry.bind(g, SyscallId::SubF32, Syscall::F32Binary(|a, b| a - b))?;
        registry.bind(g, SyscallId::MulF32, Syscall::F32Binary(|a, b| a * b))?;
        registry.bind(g, SyscallId::DivF32, Syscall::F32Binary(|a, b| a / b))?;
        registry.bind(g, SyscallId::NegF32, Syscall::F32Unary(|a| -a))?;
        registry.bind(g, SyscallId::F32ToI32, Syscall::F32ToI32(|a| a as i32))?;
        registry.bind(g, SyscallId::F32ToU32, Syscall::F32ToU32(|a| a as u32))?;
        registry.bind(g, SyscallId::I32ToF32, Syscall::I32ToF32(|a| a as f32))?;
        registry.bind(g, SyscallId::F64ToF32, Syscall::F64ToF32(|a| a as f32))?;
        registry.bind(g, SyscallId::CmpF32, Syscall::F32Compare(compare))?;
        Ok(())
    }
}
