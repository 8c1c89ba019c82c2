//! Assembler for the dino virtual machine
//!
//! Classifies normalized source lines into statements.
//!
//! A line whose first token ends with `:` defines a label; anything else
//! must name an instruction in the opcode table. Operands stay as raw
//! tokens here; the encoder decides how to read them per operand shape.

use crate::Op;
use crate::error::AsmError;
use crate::lexer::normalize_line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Label(String),
    Instr { op: Op, operands: Vec<String> },
}

/// Parse the whole source in one left-to-right pass.
///
/// Tokens after a label marker on the same line are discarded. An
/// unrecognized mnemonic aborts the run.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, AsmError> {
    let mut stmts = Vec::new();

    for line in source.lines() {
        let Some(tokens) = normalize_line(line) else {
            continue;
        };

        if let Some(name) = tokens[0].strip_suffix(':') {
            stmts.push(Stmt::Label(name.to_string()));
            continue;
        }

        let op = Op::from_mnemonic(&tokens[0])
            .ok_or_else(|| AsmError::UnknownMnemonic(tokens[0].clone()))?;

        stmts.push(Stmt::Instr {
            op,
            operands: tokens[1..].to_vec(),
        });
    }

    Ok(stmts)
}
