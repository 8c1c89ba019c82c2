//! Assembler for the dino virtual machine
//!
//! Translates register-based assembly text into the fixed-width binary
//! instruction encoding the VM executes. The opcode values below are the
//! shared enumeration between assembler and VM; byte offset 0 of the
//! emitted stream is the entry point.

pub mod assembler;
pub mod error;
pub mod lexer;
pub mod parser;

/// Reserved register id for the instruction pointer (`ip` in source).
pub const REG_IP: u8 = 0xA0;
/// Reserved register id for the stack pointer (`sp` in source).
pub const REG_SP: u8 = 0xA1;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Op {
    // Control
    HLT = 0x00,
    NOP = 0x01,
    DBG = 0x02,

    // Arithmetic / bitwise
    ADD = 0x10,
    ADDI = 0x11,
    SUB = 0x12,
    SUBI = 0x13,
    MUL = 0x14,
    MULI = 0x15,
    DIV = 0x16,
    DIVI = 0x17,
    AND = 0x18,
    ANDI = 0x19,
    OR = 0x1A,
    ORI = 0x1B,
    XOR = 0x1C,
    XORI = 0x1D,
    INC = 0x1E,
    DEC = 0x1F,

    // Data movement
    MOV = 0x20,
    MOVR = 0x21,
    PSH = 0x22,
    PSHI = 0x23,
    POP = 0x24,
    STR = 0x25,
    LOD = 0x26,

    // Comparison
    CMP = 0x30,
    CMPI = 0x31,

    // Control transfer
    JMP = 0x40,
    JEQ = 0x41,
    JNE = 0x42,
    JLT = 0x43,
    JLE = 0x44,
    JGT = 0x45,
    JGE = 0x46,
    CALL = 0x47,
    RET = 0x48,
}

/// Byte layout of the operands that follow an opcode.
///
/// All 16-bit fields are little-endian. `RegLit16` is `mov`'s layout: the
/// second operand is a bare literal rather than a register token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    None,
    Reg,
    RegReg,
    RegRegReg,
    RegRegImm16,
    RegImm16,
    RegLit16,
    Imm16,
    Addr16,
    Addr16Imm16,
    RegAddr16,
}

impl Op {
    /// Look up a mnemonic in the instruction table.
    ///
    /// Mnemonics are case-sensitive; `None` means the line does not name an
    /// instruction at all.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Op> {
        let op = match mnemonic {
            "hlt" => Op::HLT,
            "nop" => Op::NOP,
            "dbg" => Op::DBG,
            "add" => Op::ADD,
            "addi" => Op::ADDI,
            "sub" => Op::SUB,
            "subi" => Op::SUBI,
            "mul" => Op::MUL,
            "muli" => Op::MULI,
            "div" => Op::DIV,
            "divi" => Op::DIVI,
            "and" => Op::AND,
            "andi" => Op::ANDI,
            "or" => Op::OR,
            "ori" => Op::ORI,
            "xor" => Op::XOR,
            "xori" => Op::XORI,
            "inc" => Op::INC,
            "dec" => Op::DEC,
            "mov" => Op::MOV,
            "movr" => Op::MOVR,
            "psh" => Op::PSH,
            "pshi" => Op::PSHI,
            "pop" => Op::POP,
            "str" => Op::STR,
            "lod" => Op::LOD,
            "cmp" => Op::CMP,
            "cmpi" => Op::CMPI,
            "jmp" => Op::JMP,
            "jeq" => Op::JEQ,
            "jne" => Op::JNE,
            "jlt" => Op::JLT,
            "jle" => Op::JLE,
            "jgt" => Op::JGT,
            "jge" => Op::JGE,
            "call" => Op::CALL,
            "ret" => Op::RET,
            _ => return None,
        };
        Some(op)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::HLT => "hlt",
            Op::NOP => "nop",
            Op::DBG => "dbg",
            Op::ADD => "add",
            Op::ADDI => "addi",
            Op::SUB => "sub",
            Op::SUBI => "subi",
            Op::MUL => "mul",
            Op::MULI => "muli",
            Op::DIV => "div",
            Op::DIVI => "divi",
            Op::AND => "and",
            Op::ANDI => "andi",
            Op::OR => "or",
            Op::ORI => "ori",
            Op::XOR => "xor",
            Op::XORI => "xori",
            Op::INC => "inc",
            Op::DEC => "dec",
            Op::MOV => "mov",
            Op::MOVR => "movr",
            Op::PSH => "psh",
            Op::PSHI => "pshi",
            Op::POP => "pop",
            Op::STR => "str",
            Op::LOD => "lod",
            Op::CMP => "cmp",
            Op::CMPI => "cmpi",
            Op::JMP => "jmp",
            Op::JEQ => "jeq",
            Op::JNE => "jne",
            Op::JLT => "jlt",
            Op::JLE => "jle",
            Op::JGT => "jgt",
            Op::JGE => "jge",
            Op::CALL => "call",
            Op::RET => "ret",
        }
    }

    /// The operand layout that follows this opcode.
    pub fn shape(self) -> Shape {
        match self {
            Op::HLT | Op::NOP | Op::RET => Shape::None,
            Op::DBG | Op::INC | Op::DEC | Op::PSH | Op::POP => Shape::Reg,
            Op::MOVR | Op::CMP => Shape::RegReg,
            Op::ADD | Op::SUB | Op::MUL | Op::DIV | Op::AND | Op::OR | Op::XOR => Shape::RegRegReg,
            Op::ADDI | Op::SUBI | Op::MULI | Op::DIVI | Op::ANDI | Op::ORI | Op::XORI => {
                Shape::RegRegImm16
            }
            Op::CMPI => Shape::RegImm16,
            Op::MOV => Shape::RegLit16,
            Op::PSHI => Shape::Imm16,
            Op::JMP | Op::JEQ | Op::JNE | Op::JLT | Op::JLE | Op::JGT | Op::JGE | Op::CALL => {
                Shape::Addr16
            }
            Op::STR => Shape::Addr16Imm16,
            Op::LOD => Shape::RegAddr16,
        }
    }
}
