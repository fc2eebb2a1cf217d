use mars_core::{Handle, MemoryBuffer, ResourceTable, ResourceType};

use super::SyscallGroup;
use crate::error::{RegistryError, RuntimeError};
use crate::syscall::{Prim, Syscall, SyscallEnv, SyscallId, SyscallRegistry};
use crate::trace;

/// Read access to binary resources.
///
/// - `maGetDataSize(handle)`: payload size, or -1 when `handle` is not a BINARY or
///   UBIN resource.
/// - `maReadData(handle, dst, offset, size)`: copy `size` bytes starting at `offset`
///   of the resource into guest memory at `dst`. Returns 0.
pub struct ResourceSyscalls;

fn data_buffer(resources: &ResourceTable, raw: i32) -> Option<&MemoryBuffer> {
    let handle = Handle::from_guest(raw)?;
    [ResourceType::Binary, ResourceType::UBin]
        .into_iter()
        .find_map(|ty| resources.get(ty, handle))
        .and_then(|r| r.as_buffer())
}

fn ma_get_data_size(env: &mut SyscallEnv<'_>, args: &[i32]) -> Result<i32, RuntimeError> {
    Ok(match data_buffer(env.resources, args[0]) {
        Some(buf) => i32::try_from(buf.size()).unwrap_or(i32::MAX),
        None => -1,
    })
}

fn ma_read_data(env: &mut SyscallEnv<'_>, args: &[i32]) -> Result<i32, RuntimeError> {
    let handle = args[0];
    let src = data_buffer(env.resources, handle)
        .ok_or(RuntimeError::ResourceNotFound { ty: ResourceType::Binary, handle })?;
    let dst = MemoryBuffer::guest_offset(args[1])?;
    let offset = MemoryBuffer::guest_offset(args[2])?;
    let size = MemoryBuffer::guest_offset(args[3])?;

    src.copy_into(env.core.data_memory(), offset, dst, size)?;
    trace::resource(format_args!(
        "read {} bytes of #{} (+{}) to {:#x}",
        size, handle, offset, dst
    ));
    Ok(0)
}

impl SyscallGroup for ResourceSyscalls {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError> {
        let g = self.name();
        registry.bind(
            g,
            SyscallId::GetDataSize,
            Syscall::Env { params: &[Prim::I32], f: ma_get_data_size },
        )?;
        registry.bind(
            g,
            SyscallId::ReadData,
            Syscall::Env {
                params: &[Prim::I32, Prim::Ptr, Prim::I32, Prim::I32],
                f: ma_read_data,
            },
        )?;
        Ok(())
    }
}
