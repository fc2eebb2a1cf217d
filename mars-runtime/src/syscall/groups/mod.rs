mod event;
mod math;
mod resource;
mod system;
mod trig;

pub use event::EventSyscalls;
pub use math::{DoubleMath, SingleMath};
pub use resource::ResourceSyscalls;
pub use system::SystemSyscalls;
pub use trig::Transcendental;

use super::SyscallRegistry;
use crate::error::RegistryError;

/// A cohesive set of syscalls that binds itself into the registry at startup.
pub trait SyscallGroup: Sync {
    fn name(&self) -> &'static str;

    fn register(&self, registry: &mut SyscallRegistry) -> Result<(), RegistryError>;
}

/// Built-in groups, registered in this order.
pub static SYSCALL_GROUPS: &[&(dyn SyscallGroup + Sync)] = &[
    &DoubleMath,
    &SingleMath,
    &Transcendental,
    &EventSyscalls,
    &ResourceSyscalls,
    &SystemSyscalls,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_groups_cover_every_id() {
        let mut reg = SyscallRegistry::new();
        for group in SYSCALL_GROUPS {
            group.register(&mut reg).unwrap();
        }
        assert!(reg.unbound().is_empty(), "unbound: {:?}", reg.unbound());
    }

    #[test]
    fn registering_a_group_twice_fails() {
        let mut reg = SyscallRegistry::new();
        Transcendental.register(&mut reg).unwrap();
        let err = Transcendental.register(&mut reg).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateBinding { first: "trig", .. }));
    }
}
