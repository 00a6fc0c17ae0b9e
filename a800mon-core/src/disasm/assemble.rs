// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Single-statement 6502 assembler backing the interactive disassembly
//! editor and `mem write`. Operands are classified by lexical shape first,
//! then resolved against the mnemonic's addressing modes.

use std::collections::HashMap;
use std::result::Result;

use super::opcodes::{AddrMode, MODES_BY_MNEMONIC};
use crate::hex::parse_number as parse_value;

/// Operand shapes before mode resolution. `Mem`/`MemX`/`MemY` collapse to
/// zero-page or absolute (or relative) once the mnemonic is known.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OperandShape {
    Imp,
    Acc,
    Imm,
    Ind,
    Inx,
    Iny,
    Mem,
    MemX,
    MemY,
}

pub fn assemble_one(addr: u16, statement: &str) -> Result<Vec<u8>, String> {
    let text = statement.split(';').next().unwrap_or("").trim();
    if text.is_empty() {
        return Err("empty instruction".to_string());
    }
    let upper = text.to_uppercase();
    let (mnemonic, operand) = split_statement(&upper);
    if mnemonic.is_empty() {
        return Err("missing mnemonic".to_string());
    }
    if is_data_mnemonic(mnemonic) {
        return assemble_data_bytes(operand);
    }
    let modes = MODES_BY_MNEMONIC
        .get(mnemonic)
        .ok_or_else(|| format!("unknown mnemonic: {}", mnemonic))?;
    let (shape, value) = parse_operand(operand)?;
    let (mode, opcode) = resolve_opcode(modes, shape, value)?;
    encode_instruction(opcode, mode, value, addr)
}

fn split_statement(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim()),
        None => (text, ""),
    }
}

fn is_data_mnemonic(mnemonic: &str) -> bool {
    mnemonic == ".DB" || mnemonic == "DB" || mnemonic == ".BYTE" || mnemonic == "BYTE"
}

fn assemble_data_bytes(operand: &str) -> Result<Vec<u8>, String> {
    let parts: Vec<&str> = operand
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return Err("missing data byte".to_string());
    }
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        let value = parse_value(part)?;
        if value > 0xFF {
            return Err(format!("byte out of range: {}", part));
        }
        out.push(value as u8);
    }
    Ok(out)
}

fn parse_operand(operand: &str) -> Result<(OperandShape, u16), String> {
    let text = operand.trim();
    if text.is_empty() {
        return Ok((OperandShape::Imp, 0));
    }
    if text == "A" {
        return Ok((OperandShape::Acc, 0));
    }
    if let Some(rest) = text.strip_prefix('#') {
        let value = parse_value(rest)?;
        if value > 0xFF {
            return Err("immediate out of range".to_string());
        }
        return Ok((OperandShape::Imm, value));
    }
    if text.starts_with('(') {
        if text.len() > 4 && text.ends_with(",X)") {
            let value = parse_value(text[1..text.len() - 3].trim())?;
            if value > 0xFF {
                return Err("indexed indirect operand out of range".to_string());
            }
            return Ok((OperandShape::Inx, value));
        }
        if text.len() > 4 && text.ends_with("),Y") {
            let value = parse_value(text[1..text.len() - 3].trim())?;
            if value > 0xFF {
                return Err("indirect indexed operand out of range".to_string());
            }
            return Ok((OperandShape::Iny, value));
        }
        if text.len() > 2 && text.ends_with(')') {
            let value = parse_value(text[1..text.len() - 1].trim())?;
            return Ok((OperandShape::Ind, value));
        }
        return Err("invalid operand syntax".to_string());
    }
    if let Some(rest) = text.strip_suffix(",X") {
        return Ok((OperandShape::MemX, parse_value(rest.trim())?));
    }
    if let Some(rest) = text.strip_suffix(",Y") {
        return Ok((OperandShape::MemY, parse_value(rest.trim())?));
    }
    Ok((OperandShape::Mem, parse_value(text)?))
}

fn resolve_opcode(
    modes: &HashMap<AddrMode, u8>,
    shape: OperandShape,
    value: u16,
) -> Result<(AddrMode, u8), String> {
    let direct = |mode: AddrMode| -> Result<(AddrMode, u8), String> {
        modes
            .get(&mode)
            .map(|&opcode| (mode, opcode))
            .ok_or_else(|| "unsupported addressing mode".to_string())
    };
    match shape {
        OperandShape::Imp => direct(AddrMode::Imp),
        OperandShape::Acc => direct(AddrMode::Acc),
        OperandShape::Imm => direct(AddrMode::Imm),
        OperandShape::Ind => direct(AddrMode::Ind),
        OperandShape::Inx => direct(AddrMode::Inx),
        OperandShape::Iny => direct(AddrMode::Iny),
        OperandShape::Mem => {
            if modes.len() == 1 {
                if let Some(&opcode) = modes.get(&AddrMode::Rel) {
                    return Ok((AddrMode::Rel, opcode));
                }
            }
            if value <= 0xFF {
                if let Some(&opcode) = modes.get(&AddrMode::Zpg) {
                    return Ok((AddrMode::Zpg, opcode));
                }
            }
            if let Some(&opcode) = modes.get(&AddrMode::Abs) {
                return Ok((AddrMode::Abs, opcode));
            }
            if let Some(&opcode) = modes.get(&AddrMode::Rel) {
                return Ok((AddrMode::Rel, opcode));
            }
            Err("unsupported addressing mode".to_string())
        }
        OperandShape::MemX => {
            if value <= 0xFF {
                if let Some(&opcode) = modes.get(&AddrMode::Zpx) {
                    return Ok((AddrMode::Zpx, opcode));
                }
            }
            direct(AddrMode::Abx)
        }
        OperandShape::MemY => {
            if value <= 0xFF {
                if let Some(&opcode) = modes.get(&AddrMode::Zpy) {
                    return Ok((AddrMode::Zpy, opcode));
                }
            }
            direct(AddrMode::Aby)
        }
    }
}

fn encode_instruction(
    opcode: u8,
    mode: AddrMode,
    value: u16,
    addr: u16,
) -> Result<Vec<u8>, String> {
    match mode.size() {
        1 => Ok(vec![opcode]),
        2 => {
            if mode == AddrMode::Rel {
                let delta = i32::from(value) - i32::from(addr) - 2;
                if delta < -128 || delta > 127 {
                    return Err("branch target out of range".to_string());
                }
                return Ok(vec![opcode, (delta as i8) as u8]);
            }
            Ok(vec![opcode, (value & 0xFF) as u8])
        }
        3 => Ok(vec![opcode, (value & 0xFF) as u8, (value >> 8) as u8]),
        _ => Err("unsupported instruction size".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{decode, decode_one};
    use super::*;

    #[test]
    fn assembles_implied_and_accumulator() {
        assert_eq!(assemble_one(0x0600, "RTS"), Ok(vec![0x60]));
        assert_eq!(assemble_one(0x0600, "ASL A"), Ok(vec![0x0A]));
    }

    #[test]
    fn assembles_immediate_and_absolute() {
        assert_eq!(assemble_one(0x0600, "LDA #$2A"), Ok(vec![0xA9, 0x2A]));
        assert_eq!(assemble_one(0x0600, "LDA $D400"), Ok(vec![0xAD, 0x00, 0xD4]));
        assert_eq!(assemble_one(0x0600, "LDA $80"), Ok(vec![0xA5, 0x80]));
        assert_eq!(assemble_one(0x0600, "STA $0200,X"), Ok(vec![0x9D, 0x00, 0x02]));
        assert_eq!(assemble_one(0x0600, "LDA ($80),Y"), Ok(vec![0xB1, 0x80]));
        assert_eq!(assemble_one(0x0600, "JMP ($FFFC)"), Ok(vec![0x6C, 0xFC, 0xFF]));
    }

    #[test]
    fn assembles_backward_branch() {
        // delta = 0x06F0 - 0x0702 = -18 = 0xEE
        assert_eq!(assemble_one(0x0700, "BNE $06F0"), Ok(vec![0xD0, 0xEE]));
    }

    #[test]
    fn branch_target_range_is_checked() {
        for offset in 0..=255u8 {
            let target = 0x0700u16.wrapping_add(2).wrapping_add(offset as i8 as u16);
            let result = assemble_one(0x0700, &format!("BEQ ${:04X}", target));
            assert_eq!(result, Ok(vec![0xF0, offset]), "offset {:02X}", offset);
        }
        assert!(assemble_one(0x0700, "BEQ $0800").is_err());
        assert!(assemble_one(0x0700, "BEQ $0600").is_err());
    }

    #[test]
    fn data_bytes_accept_mixed_separators() {
        assert_eq!(assemble_one(0x0600, ".DB $01, 2 3"), Ok(vec![1, 2, 3]));
        assert_eq!(assemble_one(0x0600, "BYTE FF"), Ok(vec![0xFF]));
        assert!(assemble_one(0x0600, ".DB 100H, $100").is_err());
    }

    #[test]
    fn value_syntaxes_agree() {
        assert_eq!(assemble_one(0x0600, "LDA #$1A"), assemble_one(0x0600, "LDA #0X1A"));
        assert_eq!(assemble_one(0x0600, "LDA #26"), Ok(vec![0xA9, 26]));
        assert_eq!(assemble_one(0x0600, "LDA #%00011010"), Ok(vec![0xA9, 26]));
        assert_eq!(assemble_one(0x0600, "LDA #1AH"), Ok(vec![0xA9, 0x1A]));
        // a bare A-F digit forces hex
        assert_eq!(assemble_one(0x0600, "LDA #1A"), Ok(vec![0xA9, 0x1A]));
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(assemble_one(0x0600, "XYZ #$01").is_err());
        assert!(assemble_one(0x0600, "LDA (zz),Y").is_err());
        assert!(assemble_one(0x0600, "RTS $10").is_err());
        assert!(assemble_one(0x0600, "").is_err());
        assert!(assemble_one(0x0600, "; just a comment").is_err());
    }

    #[test]
    fn decode_format_assemble_round_trips() {
        let program: &[u8] = &[
            0xA9, 0x2A, // LDA #$2A
            0x8D, 0x00, 0xD4, // STA $D400
            0xA2, 0x00, // LDX #$00
            0xBD, 0x00, 0x06, // LDA $0600,X
            0x91, 0x80, // STA ($80),Y
            0xF0, 0xFE, // BEQ *
            0x4C, 0x00, 0x06, // JMP $0600
            0x60, // RTS
        ];
        for ins in decode(0x0600, program) {
            let statement = if ins.operand.is_empty() {
                ins.mnemonic.to_string()
            } else {
                format!("{} {}", ins.mnemonic, ins.operand)
            };
            let encoded = assemble_one(ins.addr, &statement).unwrap();
            let redecoded = decode_one(ins.addr, &encoded).unwrap();
            assert_eq!(redecoded.mnemonic, ins.mnemonic, "{}", statement);
            assert_eq!(redecoded.operand, ins.operand, "{}", statement);
        }
    }
}
