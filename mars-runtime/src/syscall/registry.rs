use std::fmt;
use std::str::FromStr;

use enum_map::EnumMap;
use mars_core::bits::{double_from_words, float_from_word, word_from_float, words_from_double};

use super::{SyscallEnv, SyscallId};
use crate::error::{RegistryError, RuntimeError};
use crate::trace;

/// A primitive in a syscall signature. `F64` takes two argument words, low word first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prim {
    I32,
    U32,
    F32,
    F64,
    /// Guest address.
    Ptr,
}

impl Prim {
    #[inline]
    pub fn words(self) -> usize {
        match self {
            Prim::F64 => 2,
            _ => 1,
        }
    }
}

pub type EnvFn = fn(&mut SyscallEnv<'_>, &[i32]) -> Result<i32, RuntimeError>;

/// A bound syscall: a plain function pointer tagged with its signature.
///
/// Pure arithmetic gets one variant per shape. Anything that needs guest memory or
/// runtime state is an `Env` callable that receives the raw argument words.
#[derive(Clone, Copy)]
pub enum Syscall {
    F64Binary(fn(f64, f64) -> f64),
    F64Unary(fn(f64) -> f64),
    F64Compare(fn(f64, f64) -> i32),
    F64ToI32(fn(f64) -> i32),
    F64ToU32(fn(f64) -> u32),
    F64ToF32(fn(f64) -> f32),
    I32ToF64(fn(i32) -> f64),
    F32ToF64(fn(f32) -> f64),

    F32Binary(fn(f32, f32) -> f32),
    F32Unary(fn(f32) -> f32),
    F32Compare(fn(f32, f32) -> i32),
    F32ToI32(fn(f32) -> i32),
    F32ToU32(fn(f32) -> u32),
    I32ToF32(fn(i32) -> f32),

    Env { params: &'static [Prim], f: EnvFn },
}

impl Syscall {
    pub fn params(&self) -> &'static [Prim] {
        match self {
            Syscall::F64Binary(_) | Syscall::F64Compare(_) => &[Prim::F64, Prim::F64],
            Syscall::F64Unary(_)
            | Syscall::F64ToI32(_)
            | Syscall::F64ToU32(_)
            | Syscall::F64ToF32(_) => &[Prim::F64],
            Syscall::I32ToF64(_) | Syscall::I32ToF32(_) => &[Prim::I32],
            Syscall::F32ToF64(_)
            | Syscall::F32Unary(_)
            | Syscall::F32ToI32(_)
            | Syscall::F32ToU32(_) => &[Prim::F32],
            Syscall::F32Binary(_) | Syscall::F32Compare(_) => &[Prim::F32, Prim::F32],
            Syscall::Env { params, .. } => *params,
        }
    }

    pub fn ret(&self) -> Prim {
        match self {
            Syscall::F64Binary(_)
            | Syscall::F64Unary(_)
            | Syscall::I32ToF64(_)
            | Syscall::F32ToF64(_) => Prim::F64,
            Syscall::F32Binary(_)
            | Syscall::F32Unary(_)
            | Syscall::I32ToF32(_)
            | Syscall::F64ToF32(_) => Prim::F32,
            Syscall::F64ToU32(_) | Syscall::F32ToU32(_) => Prim::U32,
            Syscall::F64Compare(_)
            | Syscall::F64ToI32(_)
            | Syscall::F32Compare(_)
            | Syscall::F32ToI32(_)
            | Syscall::Env { .. } => Prim::I32,
        }
    }

    /// Number of argument words the interpreter must pass.
    pub fn arity(&self) -> usize {
        self.params().iter().map(|p| p.words()).sum()
    }

    /// Decode `w` by signature and run. `w.len()` must equal [`Syscall::arity`].
    fn call(&self, env: &mut SyscallEnv<'_>, w: &[i32]) -> Result<SyscallReturn, RuntimeError> {
        let d = |i: usize| double_from_words(w[i], w[i + 1]);
        let f = |i: usize| float_from_word(w[i]);

        let ret = match *self {
            Syscall::F64Binary(op) => SyscallReturn::F64(op(d(0), d(2))),
            Syscall::F64Unary(op) => SyscallReturn::F64(op(d(0))),
            Syscall::F64Compare(op) => SyscallReturn::I32(op(d(0), d(2))),
            Syscall::F64ToI32(op) => SyscallReturn::I32(op(d(0))),
            Syscall::F64ToU32(op) => SyscallReturn::U32(op(d(0))),
            Syscall::F64ToF32(op) => SyscallReturn::F32(op(d(0))),
            Syscall::I32ToF64(op) => SyscallReturn::F64(op(w[0])),
            Syscall::F32ToF64(op) => SyscallReturn::F64(op(f(0))),

            Syscall::F32Binary(op) => SyscallReturn::F32(op(f(0), f(1))),
            Syscall::F32Unary(op) => SyscallReturn::F32(op(f(0))),
            Syscall::F32Compare(op) => SyscallReturn::I32(op(f(0), f(1))),
            Syscall::F32ToI32(op) => SyscallReturn::I32(op(f(0))),
            Syscall::F32ToU32(op) => SyscallReturn::U32(op(f(0))),
            Syscall::I32ToF32(op) => SyscallReturn::F32(op(w[0])),

            Syscall::Env { f: op, .. } => SyscallReturn::I32(op(env, w)?),
        };
        Ok(ret)
    }
}

impl fmt::Debug for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syscall({:?} -> {:?})", self.params(), self.ret())
    }
}

/// Result of a syscall, before it is split back into words for the interpreter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyscallReturn {
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
}

impl SyscallReturn {
    /// Return words, low word first. Only `F64` uses the second word.
    pub fn words(self) -> (i32, Option<i32>) {
        match self {
            SyscallReturn::I32(v) => (v, None),
            SyscallReturn::U32(v) => (v as i32, None),
            SyscallReturn::F32(v) => (word_from_float(v), None),
            SyscallReturn::F64(v) => {
                let (low, high) = words_from_double(v);
                (low, Some(high))
            }
        }
    }
}

#[derive(Clone, Copy)]
struct Binding {
    group: &'static str,
    syscall: Syscall,
}

/// The dispatch table. One slot per [`SyscallId`]; each slot is bound at most once.
#[derive(Default)]
pub struct SyscallRegistry {
    table: EnumMap<SyscallId, Option<Binding>>,
}

impl SyscallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(
        &mut self,
        group: &'static str,
        id: SyscallId,
        syscall: Syscall,
    ) -> Result<(), RegistryError> {
        let slot = &mut self.table[id];
        if let Some(prev) = slot {
            return Err(RegistryError::DuplicateBinding { id, first: prev.group, second: group });
        }
        *slot = Some(Binding { group, syscall });
        Ok(())
    }

    pub fn get(&self, id: SyscallId) -> Option<&Syscall> {
        self.table[id].as_ref().map(|b| &b.syscall)
    }

    /// Name of the group that bound `id`.
    pub fn group_of(&self, id: SyscallId) -> Option<&'static str> {
        self.table[id].as_ref().map(|b| b.group)
    }

    pub fn is_bound(&self, id: SyscallId) -> bool {
        self.table[id].is_some()
    }

    pub fn lookup(name: &str) -> Result<SyscallId, RegistryError> {
        SyscallId::from_str(name).map_err(|_| RegistryError::UnknownName(name.to_string()))
    }

    pub fn bound(&self) -> impl Iterator<Item = (SyscallId, &Syscall)> {
        self.table.iter().filter_map(|(id, b)| b.as_ref().map(|b| (id, &b.syscall)))
    }

    pub fn unbound(&self) -> Vec<SyscallId> {
        self.table.iter().filter(|(_, b)| b.is_none()).map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.table.values().filter(|b| b.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run syscall `id` with the interpreter's argument words.
    ///
    /// An unbound id is fatal for the interpreter and is logged as such.
    pub fn invoke(
        &self,
        id: SyscallId,
        env: &mut SyscallEnv<'_>,
        args: &[i32],
    ) -> Result<SyscallReturn, RuntimeError> {
        let Some(binding) = &self.table[id] else {
            log::error!("syscall {} invoked but never bound", id);
            return Err(RegistryError::Unbound { id }.into());
        };

        let expected = binding.syscall.arity();
        if args.len() != expected {
            return Err(RegistryError::Arity { id, expected, got: args.len() }.into());
        }

        let ret = binding.syscall.call(env, args);
        trace::syscall(format_args!("{}{:?} -> {:?}", id, args, ret));
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::host::InlineHost;
    use crate::runtime::default_panic_hook;
    use mars_core::{MemoryBuffer, ResourceTable};
    use mars_events::EventQueue;

    fn with_env<T>(f: impl FnOnce(&mut SyscallEnv<'_>) -> T) -> T {
        let mut memory = MemoryBuffer::new(64);
        let resources = ResourceTable::new();
        let events = EventQueue::<Event>::new();
        let hook = default_panic_hook();
        let mut env = SyscallEnv {
            core: &mut memory,
            resources: &resources,
            events: &events,
            host: &InlineHost,
            panic_hook: &hook,
        };
        f(&mut env)
    }

    #[test]
    fn duplicate_binding_names_both_groups() {
        let mut reg = SyscallRegistry::new();
        reg.bind("a", SyscallId::Sin, Syscall::F64Unary(f64::sin)).unwrap();
        let err = reg.bind("b", SyscallId::Sin, Syscall::F64Unary(f64::cos)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateBinding { id: SyscallId::Sin, first: "a", second: "b" }
        ));
        assert_eq!(reg.group_of(SyscallId::Sin), Some("a"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unbound_and_arity_errors() {
        let mut reg = SyscallRegistry::new();
        reg.bind("m", SyscallId::AddF64, Syscall::F64Binary(|a, b| a + b)).unwrap();

        with_env(|env| {
            let err = reg.invoke(SyscallId::Cos, env, &[0, 0]).unwrap_err();
            assert!(err.is_fatal());
            assert!(matches!(err, RuntimeError::Registry(RegistryError::Unbound { .. })));

            let err = reg.invoke(SyscallId::AddF64, env, &[0, 0, 0]).unwrap_err();
            assert!(matches!(
                err,
                RuntimeError::Registry(RegistryError::Arity { expected: 4, got: 3, .. })
            ));
        });
    }

    #[test]
    fn doubles_are_low_word_first() {
        let mut reg = SyscallRegistry::new();
        reg.bind("m", SyscallId::AddF64, Syscall::F64Binary(|a, b| a + b)).unwrap();

        let (a_lo, a_hi) = words_from_double(1.25);
        let (b_lo, b_hi) = words_from_double(2.5);
        let ret = with_env(|env| reg.invoke(SyscallId::AddF64, env, &[a_lo, a_hi, b_lo, b_hi]))
            .unwrap();
        assert_eq!(ret, SyscallReturn::F64(3.75));

        let (lo, hi) = ret.words();
        assert_eq!(double_from_words(lo, hi.unwrap()), 3.75);
    }

    #[test]
    fn signatures() {
        assert_eq!(Syscall::F64Binary(|a, _| a).arity(), 4);
        assert_eq!(Syscall::F64ToF32(|a| a as f32).arity(), 2);
        assert_eq!(Syscall::F32Binary(|a, _| a).arity(), 2);
        assert_eq!(Syscall::I32ToF64(f64::from).ret(), Prim::F64);
        assert_eq!(SyscallReturn::U32(u32::MAX).words(), (-1, None));
        assert_eq!(SyscallReturn::F32(1.0).words(), (0x3F80_0000, None));
    }

    #[test]
    fn unbound_lists_everything_on_empty_table() {
        let reg = SyscallRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.unbound().len(), <SyscallId as enum_map::Enum>::LENGTH);
        assert!(SyscallRegistry::lookup("__muldf3").is_ok());
        assert!(matches!(
            SyscallRegistry::lookup("nope"),
            Err(RegistryError::UnknownName(_))
        ));
    }
}
