//! Assembler for the dino virtual machine
//!
//! Two-pass core: a single forward pass encodes every instruction into the
//! output buffer, recording label definitions and fixups for symbolic
//! branch targets, then a patch pass overwrites each fixup's placeholder
//! bytes with the resolved little-endian address.

use std::collections::HashMap;

use crate::error::AsmError;
use crate::parser::{Stmt, parse_source};
use crate::{Op, REG_IP, REG_SP, Shape};

/// One assembly run's worth of state.
///
/// `labels` maps a name to the buffer offset at its definition; `fixups`
/// maps the buffer offset of a branch/call opcode to the label its two
/// placeholder bytes must resolve to. Both are rebuilt from empty by `run`.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    program: String,
    bytecode: Vec<u8>,

    labels: HashMap<String, usize>,
    fixups: HashMap<usize, String>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a fresh run from source text.
    pub fn load(&mut self, program: &str) {
        self.program = program.to_string();
        self.bytecode.clear();
        self.labels.clear();
        self.fixups.clear();
    }

    /// Perform the full two-pass assembly of the loaded source.
    ///
    /// On error the buffer contents are unspecified and `output` must not
    /// be consumed.
    pub fn run(&mut self) -> Result<(), AsmError> {
        self.bytecode.clear();
        self.labels.clear();
        self.fixups.clear();

        let stmts = parse_source(&self.program)?;

        for stmt in &stmts {
            match stmt {
                Stmt::Label(name) => self.define_label(name)?,
                Stmt::Instr { op, operands } => self.encode(*op, operands)?,
            }
        }

        self.patch_fixups()
    }

    /// The finished byte stream. Empty before a successful `run`.
    pub fn output(&self) -> &[u8] {
        &self.bytecode
    }

    /// Shorthand for the load / run / output sequence.
    pub fn assemble(&mut self, program: &str) -> Result<Vec<u8>, AsmError> {
        self.load(program);
        self.run()?;
        Ok(self.bytecode.clone())
    }

    // Encoding pass
    // --------------------------------------

    fn define_label(&mut self, name: &str) -> Result<(), AsmError> {
        if self.labels.contains_key(name) {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), self.bytecode.len());
        Ok(())
    }

    fn encode(&mut self, op: Op, operands: &[String]) -> Result<(), AsmError> {
        match op.shape() {
            Shape::None => {
                self.bytecode.push(op as u8);
            }

            Shape::Reg => {
                let reg = parse_register(operand(op, operands, 0)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.push(reg);
            }

            Shape::RegReg => {
                let a = parse_register(operand(op, operands, 0)?)?;
                let b = parse_register(operand(op, operands, 1)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.push(a);
                self.bytecode.push(b);
            }

            Shape::RegRegReg => {
                let dest = parse_register(operand(op, operands, 0)?)?;
                let src1 = parse_register(operand(op, operands, 1)?)?;
                let src2 = parse_register(operand(op, operands, 2)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.push(dest);
                self.bytecode.push(src1);
                self.bytecode.push(src2);
            }

            Shape::RegRegImm16 => {
                let dest = parse_register(operand(op, operands, 0)?)?;
                let src = parse_register(operand(op, operands, 1)?)?;
                let imm = parse_imm16(operand(op, operands, 2)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.push(dest);
                self.bytecode.push(src);
                self.bytecode.extend_from_slice(&imm.to_le_bytes());
            }

            // cmpi's immediate and mov's bare literal share a layout
            Shape::RegImm16 | Shape::RegLit16 => {
                let reg = parse_register(operand(op, operands, 0)?)?;
                let value = parse_imm16(operand(op, operands, 1)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.push(reg);
                self.bytecode.extend_from_slice(&value.to_le_bytes());
            }

            Shape::Imm16 => {
                let imm = parse_imm16(operand(op, operands, 0)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.extend_from_slice(&imm.to_le_bytes());
            }

            Shape::Addr16 => {
                self.encode_branch(op, operand(op, operands, 0)?)?;
            }

            Shape::Addr16Imm16 => {
                let addr = parse_imm16(operand(op, operands, 0)?)?;
                let imm = parse_imm16(operand(op, operands, 1)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.extend_from_slice(&addr.to_le_bytes());
                self.bytecode.extend_from_slice(&imm.to_le_bytes());
            }

            Shape::RegAddr16 => {
                let reg = parse_register(operand(op, operands, 0)?)?;
                let addr = parse_imm16(operand(op, operands, 1)?)?;
                self.bytecode.push(op as u8);
                self.bytecode.push(reg);
                self.bytecode.extend_from_slice(&addr.to_le_bytes());
            }
        }

        Ok(())
    }

    /// Branch and call targets: a numeric token encodes directly, anything
    /// else is a label reference that gets a fixup and two placeholder
    /// bytes, patched once the full stream exists.
    fn encode_branch(&mut self, op: Op, target: &str) -> Result<(), AsmError> {
        match target.parse::<i64>() {
            Ok(value) => {
                let addr =
                    u16::try_from(value).map_err(|_| AsmError::ValueOutOfRange(value))?;
                self.bytecode.push(op as u8);
                self.bytecode.extend_from_slice(&addr.to_le_bytes());
            }
            Err(_) => {
                self.fixups.insert(self.bytecode.len(), target.to_string());
                self.bytecode.push(op as u8);
                self.bytecode.extend_from_slice(&[0x00, 0x00]);
            }
        }
        Ok(())
    }

    // Patch pass
    // --------------------------------------

    /// Overwrite the two bytes after each fixup's opcode with the resolved
    /// label address. Only previously reserved placeholder slots are ever
    /// written; the buffer never grows here.
    fn patch_fixups(&mut self) -> Result<(), AsmError> {
        for (&offset, name) in &self.fixups {
            let &target = self
                .labels
                .get(name)
                .ok_or_else(|| AsmError::UndefinedLabel(name.clone()))?;
            let addr = u16::try_from(target)
                .map_err(|_| AsmError::LabelOutOfRange(name.clone(), target))?;

            let [lo, hi] = addr.to_le_bytes();
            self.bytecode[offset + 1] = lo;
            self.bytecode[offset + 2] = hi;
        }
        Ok(())
    }
}

// Operand token decoding
// --------------------------------------

fn operand<'a>(op: Op, operands: &'a [String], index: usize) -> Result<&'a str, AsmError> {
    operands
        .get(index)
        .map(String::as_str)
        .ok_or(AsmError::MissingOperand(op.mnemonic()))
}

/// Decode a register token: `x<N>` for general-purpose register `N`, the
/// `ip`/`sp` aliases, or a plain register id. The id must fit in a byte.
fn parse_register(token: &str) -> Result<u8, AsmError> {
    if let Some(digits) = token.strip_prefix('x') {
        return digits
            .parse()
            .map_err(|_| AsmError::InvalidRegister(token.to_string()));
    }

    match token {
        "ip" => Ok(REG_IP),
        "sp" => Ok(REG_SP),
        _ => token
            .parse()
            .map_err(|_| AsmError::InvalidRegister(token.to_string())),
    }
}

/// Decode a 16-bit immediate or address literal, rejecting anything
/// outside `0..=65535` before it reaches the encoder.
fn parse_imm16(token: &str) -> Result<u16, AsmError> {
    let value: i64 = token
        .parse()
        .map_err(|_| AsmError::InvalidImmediate(token.to_string()))?;

    u16::try_from(value).map_err(|_| AsmError::ValueOutOfRange(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(src: &str) -> Vec<u8> {
        Assembler::new().assemble(src).unwrap()
    }

    fn assemble_err(src: &str) -> AsmError {
        Assembler::new().assemble(src).unwrap_err()
    }

    #[test]
    fn hlt_is_a_single_opcode_byte() {
        assert_eq!(assemble("hlt"), vec![Op::HLT as u8]);
    }

    #[test]
    fn forward_label_reference_is_patched() {
        // jmp occupies 3 bytes, so `end` resolves to offset 3
        let bytes = assemble("jmp end\nend:\nhlt");
        assert_eq!(bytes, vec![Op::JMP as u8, 3, 0, Op::HLT as u8]);
    }

    #[test]
    fn backward_label_reference_is_patched() {
        let bytes = assemble("start:\nnop\njmp start");
        assert_eq!(bytes, vec![Op::NOP as u8, Op::JMP as u8, 0, 0]);
    }

    #[test]
    fn numeric_branch_target_encodes_directly() {
        assert_eq!(assemble("jmp 513"), vec![Op::JMP as u8, 1, 2]);
    }

    #[test]
    fn call_uses_the_same_fixup_rule_as_jumps() {
        let bytes = assemble("call f\nhlt\nf:\nret");
        assert_eq!(
            bytes,
            vec![Op::CALL as u8, 4, 0, Op::HLT as u8, Op::RET as u8]
        );
    }

    #[test]
    fn register_immediate_form_is_five_bytes() {
        let bytes = assemble("addi x0 x1 10");
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes, vec![Op::ADDI as u8, 0, 1, 10, 0]);
        assert_eq!(bytes[3] as u16 + 256 * bytes[4] as u16, 10);
    }

    #[test]
    fn three_register_form() {
        assert_eq!(assemble("add x0 x1 x2"), vec![Op::ADD as u8, 0, 1, 2]);
        assert_eq!(assemble("xor x7 x7 x7"), vec![Op::XOR as u8, 7, 7, 7]);
    }

    #[test]
    fn comments_and_commas_do_not_change_the_encoding() {
        let plain = assemble("add x0 x1 x2");
        assert_eq!(assemble("add x0 x1 x2 ; comment"), plain);
        assert_eq!(assemble("add x0, x1, x2"), plain);
    }

    #[test]
    fn register_aliases_map_to_reserved_ids() {
        assert_eq!(assemble("dbg ip"), vec![Op::DBG as u8, 0xA0]);
        assert_eq!(assemble("dbg sp"), vec![Op::DBG as u8, 0xA1]);
        assert_eq!(assemble("dbg x5"), vec![Op::DBG as u8, 5]);
    }

    #[test]
    fn mov_takes_a_bare_literal_source() {
        assert_eq!(assemble("mov x3 300"), vec![Op::MOV as u8, 3, 44, 1]);
        assert!(matches!(
            assemble_err("mov x3 x1"),
            AsmError::InvalidImmediate(_)
        ));
    }

    #[test]
    fn stack_and_memory_forms() {
        assert_eq!(assemble("pshi 7"), vec![Op::PSHI as u8, 7, 0]);
        assert_eq!(assemble("psh x2"), vec![Op::PSH as u8, 2]);
        assert_eq!(assemble("pop x2"), vec![Op::POP as u8, 2]);
        assert_eq!(assemble("str 1024 9"), vec![Op::STR as u8, 0, 4, 9, 0]);
        assert_eq!(assemble("lod x1 1024"), vec![Op::LOD as u8, 1, 0, 4]);
    }

    #[test]
    fn comparison_forms() {
        assert_eq!(assemble("cmp x1 x2"), vec![Op::CMP as u8, 1, 2]);
        assert_eq!(assemble("cmpi x1 500"), vec![Op::CMPI as u8, 1, 244, 1]);
        assert_eq!(assemble("movr x4 x9"), vec![Op::MOVR as u8, 4, 9]);
    }

    #[test]
    fn undefined_label_is_fatal() {
        assert_eq!(
            assemble_err("jmp nowhere"),
            AsmError::UndefinedLabel("nowhere".to_string())
        );
    }

    #[test]
    fn duplicate_label_is_fatal() {
        assert_eq!(
            assemble_err("again:\nnop\nagain:\nhlt"),
            AsmError::DuplicateLabel("again".to_string())
        );
    }

    #[test]
    fn out_of_range_values_are_fatal() {
        assert_eq!(assemble_err("pshi 70000"), AsmError::ValueOutOfRange(70000));
        assert_eq!(assemble_err("pshi -1"), AsmError::ValueOutOfRange(-1));
        assert_eq!(assemble_err("jmp 70000"), AsmError::ValueOutOfRange(70000));
    }

    #[test]
    fn malformed_register_is_fatal() {
        assert!(matches!(
            assemble_err("dbg xq"),
            AsmError::InvalidRegister(_)
        ));
        assert!(matches!(
            assemble_err("inc banana"),
            AsmError::InvalidRegister(_)
        ));
    }

    #[test]
    fn missing_operand_is_fatal() {
        assert_eq!(assemble_err("addi x0 x1"), AsmError::MissingOperand("addi"));
        assert_eq!(assemble_err("jmp"), AsmError::MissingOperand("jmp"));
    }

    #[test]
    fn output_is_empty_before_run() {
        let mut asm = Assembler::new();
        asm.load("hlt");
        assert!(asm.output().is_empty());
    }

    #[test]
    fn state_resets_between_runs() {
        let mut asm = Assembler::new();
        assert_eq!(asm.assemble("one:\nhlt").unwrap(), vec![Op::HLT as u8]);
        // a second load must not see the first run's labels or bytes
        assert_eq!(asm.assemble("nop").unwrap(), vec![Op::NOP as u8]);
        assert_eq!(
            asm.assemble("jmp one").unwrap_err(),
            AsmError::UndefinedLabel("one".to_string())
        );
    }

    #[test]
    fn assembly_is_deterministic() {
        let src = "loop:\ninc x0\njne loop\nhlt";
        assert_eq!(assemble(src), assemble(src));
    }

    #[test]
    fn countdown_program_resolves_mixed_references() {
        let src = "\
; count down from 3
main:
  mov x0, 3
loop:
  dec x0
  cmpi x0, 0
  jne loop
  call done
  hlt
done:
  ret
";
        let bytes = assemble(src);
        assert_eq!(
            bytes,
            vec![
                Op::MOV as u8, 0, 3, 0, // main: mov x0 3
                Op::DEC as u8, 0, // loop: dec x0
                Op::CMPI as u8, 0, 0, 0, // cmpi x0 0
                Op::JNE as u8, 4, 0, // jne loop (loop == 4)
                Op::CALL as u8, 17, 0, // call done (done == 17)
                Op::HLT as u8,
                Op::RET as u8, // done: ret
            ]
        );
    }
}
