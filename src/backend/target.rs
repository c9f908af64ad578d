use std::fmt;

/// Register classes of the AM8 machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegClass {
    General,
    StackPointer,
    FramePointer,
    ProgramCounter,
    Flags,
}

/// A physical AM8 register. The set is fixed at machine-model
/// construction and immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    Sp,
    Fp,
    Pc,
    Flags,
}

impl Register {
    /// All general-purpose registers, in allocation order.
    pub const GP_REGS: [Register; 8] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    /// Call results travel in R0.
    pub const RETURN_REG: Register = Register::R0;

    pub fn class(&self) -> RegClass {
        match self {
            Register::R0
            | Register::R1
            | Register::R2
            | Register::R3
            | Register::R4
            | Register::R5
            | Register::R6
            | Register::R7 => RegClass::General,
            Register::Sp => RegClass::StackPointer,
            Register::Fp => RegClass::FramePointer,
            Register::Pc => RegClass::ProgramCounter,
            Register::Flags => RegClass::Flags,
        }
    }

    /// Register width in bits.
    pub fn width(&self) -> u32 {
        32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Register::R0 => "R0",
            Register::R1 => "R1",
            Register::R2 => "R2",
            Register::R3 => "R3",
            Register::R4 => "R4",
            Register::R5 => "R5",
            Register::R6 => "R6",
            Register::R7 => "R7",
            Register::Sp => "SP",
            Register::Fp => "FP",
            Register::Pc => "PC",
            Register::Flags => "FLAGS",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Machine word size in bytes. Call arguments and stack slots are all
/// word-sized.
pub const WORD_SIZE: i64 = 4;
