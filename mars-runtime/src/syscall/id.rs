use enum_map::Enum;

/// Every syscall the runtime knows about. The string form is the name the guest
/// toolchain links against.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Enum,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum SyscallId {
    // double precision soft-float
    #[strum(serialize = "__adddf3")]
    AddF64,
    #[strum(serialize = "__subdf3")]
    SubF64,
    #[strum(serialize = "__muldf3")]
    MulF64,
    #[strum(serialize = "__divdf3")]
    DivF64,
    #[strum(serialize = "__negdf2")]
    NegF64,
    #[strum(serialize = "__fixdfsi")]
    F64ToI32,
    #[strum(serialize = "__fixunsdfsi")]
    F64ToU32,
    #[strum(serialize = "__floatsidf")]
    I32ToF64,
    #[strum(serialize = "__extendsfdf2")]
    F32ToF64,
    #[strum(serialize = "dcmp")]
    CmpF64,

    // single precision soft-float
    #[strum(serialize = "__addsf3")]
    AddF32,
    #[strum(serialize = "__subsf3")]
    SubF32,
    #[strum(serialize = "__mulsf3")]
    MulF32,
    #[strum(serialize = "__divsf3")]
    DivF32,
    #[strum(serialize = "__negsf2")]
    NegF32,
    #[strum(serialize = "__fixsfsi")]
    F32ToI32,
    #[strum(serialize = "__fixunssfsi")]
    F32ToU32,
    #[strum(serialize = "__floatsisf")]
    I32ToF32,
    #[strum(serialize = "__truncdfsf2")]
    F64ToF32,
    #[strum(serialize = "fcmp")]
    CmpF32,

    #[strum(serialize = "sin")]
    Sin,
    #[strum(serialize = "cos")]
    Cos,
    #[strum(serialize = "tan")]
    Tan,
    #[strum(serialize = "sqrt")]
    Sqrt,

    #[strum(serialize = "maGetEvent")]
    GetEvent,
    #[strum(serialize = "maGetDataSize")]
    GetDataSize,
    #[strum(serialize = "maReadData")]
    ReadData,
    #[strum(serialize = "maPanic")]
    Panic,
}

impl SyscallId {
    #[inline]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn names_parse_back() {
        for i in 0..SyscallId::LENGTH {
            let id = SyscallId::from_usize(i);
            assert_eq!(SyscallId::from_str(id.name()).unwrap(), id);
        }
    }

    #[test]
    fn linker_names() {
        assert_eq!(SyscallId::AddF64.name(), "__adddf3");
        assert_eq!(SyscallId::CmpF32.to_string(), "fcmp");
        assert_eq!(SyscallId::from_str("maGetEvent").unwrap(), SyscallId::GetEvent);
        assert!(SyscallId::from_str("maGetEvents").is_err());
    }
}
