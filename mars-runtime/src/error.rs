use mars_core::{FormatError, MemoryError, ResourceType};

use crate::syscall::SyscallId;

/// Problems with the syscall table itself. All of them mean the build or the
/// interpreter is broken; none is something guest code can recover from.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("syscall {id} bound twice (by {first} and {second})")]
    DuplicateBinding {
        id: SyscallId,
        first: &'static str,
        second: &'static str,
    },

    #[error("syscall {id} has no implementation")]
    Unbound { id: SyscallId },

    #[error("unknown syscall name {0:?}")]
    UnknownName(String),

    #[error("syscall {id} takes {expected} argument words, got {got}")]
    Arity {
        id: SyscallId,
        expected: usize,
        got: usize,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("no {ty} resource at handle {handle}")]
    ResourceNotFound { ty: ResourceType, handle: i32 },

    #[error("guest panic {code}: {message}")]
    GuestPanic { code: i32, message: String },
}

impl RuntimeError {
    /// Whether the interpreter must stop instead of handing a result back to guest code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::Registry(_) | RuntimeError::GuestPanic { .. })
    }
}
