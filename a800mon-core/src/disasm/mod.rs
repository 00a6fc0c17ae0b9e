// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! 6502 disassembler. Decoding is table driven and never fails: undocumented
//! opcodes come back as `.DB $xx` rows so a window over arbitrary memory
//! still lines up.

mod assemble;
mod opcodes;

pub use self::assemble::assemble_one;
pub use self::opcodes::{AddrMode, MODES_BY_MNEMONIC, OP_MNEMONIC, OP_MODE};

use crate::symbols;

pub const FLOW_MNEMONICS: [&str; 11] = [
    "JMP", "JSR", "BCC", "BCS", "BEQ", "BMI", "BNE", "BPL", "BVC", "BVS", "BRA",
];

#[derive(Clone, Debug)]
pub struct DecodedInstruction {
    pub addr: u16,
    pub size: usize,
    pub raw: Vec<u8>,
    pub raw_text: String,
    pub mnemonic: &'static str,
    pub operand: String,
    pub comment: String,
    pub asm_text: String,
    pub mode: AddrMode,
    /// Branch/jump destination, for viewer-level highlighting.
    pub flow_target: Option<u16>,
    /// `[start, end)` character range of the address inside `operand`.
    pub operand_span: Option<(usize, usize)>,
}

pub fn decode(start_addr: u16, data: &[u8]) -> Vec<DecodedInstruction> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut pc = start_addr;
    let mut consumed = 0;
    while consumed < data.len() {
        let opcode = data[consumed];
        let mut mnemonic = OP_MNEMONIC[opcode as usize];
        let mode = OP_MODE[opcode as usize];
        let size = mode.size().min(data.len() - consumed);
        let raw = data[consumed..consumed + size].to_vec();
        let raw_text = format_bytes(&raw);
        let (mut operand, mut target, mut span) = format_operand(mode, pc, &raw);
        if mnemonic == "???" {
            mnemonic = ".DB";
            operand = format!("${:02X}", opcode);
            target = None;
            span = None;
        }
        let comment = match target {
            Some(addr) => {
                let symbol = symbols::lookup(addr);
                if symbol.is_empty() {
                    String::new()
                } else {
                    format!(";{}", symbol)
                }
            }
            None => String::new(),
        };
        let mut asm_text = if operand.is_empty() {
            mnemonic.to_string()
        } else {
            format!("{} {}", mnemonic, operand)
        };
        if !comment.is_empty() {
            if asm_text.len() < 18 {
                asm_text = format!("{:<18}", asm_text);
            }
            asm_text.push(' ');
            asm_text.push_str(&comment);
        }
        let flow_target = if FLOW_MNEMONICS.contains(&mnemonic) {
            target
        } else {
            None
        };
        out.push(DecodedInstruction {
            addr: pc,
            size,
            raw,
            raw_text,
            mnemonic,
            operand,
            comment,
            asm_text,
            mode,
            flow_target,
            operand_span: span,
        });
        consumed += size;
        pc = pc.wrapping_add(size as u16);
    }
    out
}

pub fn decode_one(start_addr: u16, data: &[u8]) -> Option<DecodedInstruction> {
    decode(start_addr, data).into_iter().next()
}

/// Decode and stop at the first address wrap-around, so a window ending at
/// the top of memory never folds back onto page zero.
pub fn decode_linear(start_addr: u16, data: &[u8]) -> Vec<DecodedInstruction> {
    let decoded = decode(start_addr, data);
    let mut out = Vec::with_capacity(decoded.len());
    let mut prev = 0u16;
    for (idx, ins) in decoded.into_iter().enumerate() {
        if idx > 0 && ins.addr < prev {
            break;
        }
        prev = ins.addr;
        out.push(ins);
    }
    out
}

pub fn disasm(start_addr: u16, data: &[u8]) -> Vec<String> {
    decode(start_addr, data)
        .iter()
        .map(|ins| format!("{:04X}: {:<8} {}", ins.addr, ins.raw_text, ins.asm_text))
        .collect()
}

pub fn disasm_one(start_addr: u16, data: &[u8]) -> String {
    match decode_one(start_addr, data) {
        Some(ins) => format!("{:<8} {}", ins.raw_text, ins.asm_text),
        None => String::new(),
    }
}

fn format_operand(
    mode: AddrMode,
    pc: u16,
    raw: &[u8],
) -> (String, Option<u16>, Option<(usize, usize)>) {
    if raw.is_empty() {
        return (String::new(), None, None);
    }
    let byte_at = |idx: usize| raw.get(idx).copied().unwrap_or(0);
    let word_at = |idx: usize| u16::from(byte_at(idx)) | (u16::from(byte_at(idx + 1)) << 8);
    match mode {
        AddrMode::Imp => (String::new(), None, None),
        AddrMode::Acc => ("A".to_string(), None, None),
        AddrMode::Imm => (format!("#${:02X}", byte_at(1)), None, None),
        AddrMode::Abs => {
            let addr = word_at(1);
            let text = format!("${:04X}", addr);
            let span = (0, text.len());
            (text, Some(addr), Some(span))
        }
        AddrMode::Abx => {
            let addr = word_at(1);
            let text = format!("${:04X}", addr);
            let span = (0, text.len());
            (format!("{},X", text), Some(addr), Some(span))
        }
        AddrMode::Aby => {
            let addr = word_at(1);
            let text = format!("${:04X}", addr);
            let span = (0, text.len());
            (format!("{},Y", text), Some(addr), Some(span))
        }
        AddrMode::Ind => {
            let addr = word_at(1);
            let text = format!("${:04X}", addr);
            let span = (1, 1 + text.len());
            (format!("({})", text), Some(addr), Some(span))
        }
        AddrMode::Inx => {
            let zp = u16::from(byte_at(1));
            let text = format!("${:02X}", byte_at(1));
            let span = (1, 1 + text.len());
            (format!("({},X)", text), Some(zp), Some(span))
        }
        AddrMode::Iny => {
            let zp = u16::from(byte_at(1));
            let text = format!("${:02X}", byte_at(1));
            let span = (1, 1 + text.len());
            (format!("({}),Y", text), Some(zp), Some(span))
        }
        AddrMode::Rel => {
            let offset = byte_at(1) as i8;
            let target = pc.wrapping_add(2).wrapping_add(offset as u16);
            let text = format!("${:04X}", target);
            let span = (0, text.len());
            (text, Some(target), Some(span))
        }
        AddrMode::Zpg => {
            let zp = u16::from(byte_at(1));
            let text = format!("${:02X}", byte_at(1));
            let span = (0, text.len());
            (text, Some(zp), Some(span))
        }
        AddrMode::Zpx => {
            let zp = u16::from(byte_at(1));
            let text = format!("${:02X}", byte_at(1));
            let span = (0, text.len());
            (format!("{},X", text), Some(zp), Some(span))
        }
        AddrMode::Zpy => {
            let zp = u16::from(byte_at(1));
            let text = format!("${:02X}", byte_at(1));
            let span = (0, text.len());
            (format!("{},Y", text), Some(zp), Some(span))
        }
    }
}

fn format_bytes(raw: &[u8]) -> String {
    raw.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_immediate_load() {
        let decoded = decode(0x0600, &[0xA9, 0x2A]);
        assert_eq!(decoded.len(), 1);
        let ins = &decoded[0];
        assert_eq!(ins.size, 2);
        assert_eq!(ins.mnemonic, "LDA");
        assert_eq!(ins.operand, "#$2A");
        assert_eq!(ins.flow_target, None);
        assert_eq!(ins.raw_text, "A9 2A");
    }

    #[test]
    fn decodes_branch_to_itself() {
        let ins = decode_one(0x0610, &[0xF0, 0xFE]).unwrap();
        assert_eq!(ins.mnemonic, "BEQ");
        assert_eq!(ins.operand, "$0610");
        assert_eq!(ins.flow_target, Some(0x0610));
        assert_eq!(ins.operand_span, Some((0, 5)));
    }

    #[test]
    fn unknown_opcode_becomes_data_byte() {
        let ins = decode_one(0x0600, &[0x02]).unwrap();
        assert_eq!(ins.mnemonic, ".DB");
        assert_eq!(ins.operand, "$02");
        assert_eq!(ins.size, 1);
        assert_eq!(ins.flow_target, None);
    }

    #[test]
    fn truncated_operand_is_clamped() {
        // JMP with only one operand byte available
        let decoded = decode(0x0600, &[0x4C, 0x34]);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].size, 2);
        assert_eq!(decoded[0].operand, "$0034");
    }

    #[test]
    fn every_size_matches_mode() {
        let data: Vec<u8> = (0..=255).collect();
        for ins in decode(0x1000, &data[..64]) {
            assert!(ins.size >= 1 && ins.size <= 3);
            assert_eq!(ins.raw.len(), ins.size);
        }
    }

    #[test]
    fn decode_consumes_all_bytes_contiguously() {
        let data = [0xA9, 0x00, 0x8D, 0x00, 0xD4, 0x60];
        let decoded = decode(0x0600, &data);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].addr, 0x0600);
        assert_eq!(decoded[1].addr, 0x0602);
        assert_eq!(decoded[2].addr, 0x0605);
        let total: usize = decoded.iter().map(|i| i.size).sum();
        assert_eq!(total, data.len());
    }

    #[test]
    fn absolute_store_picks_up_symbol_comment() {
        let ins = decode_one(0x0600, &[0x8D, 0x00, 0xD4]).unwrap();
        assert_eq!(ins.comment, ";DMACTL");
        assert!(ins.asm_text.ends_with(";DMACTL"));
    }

    #[test]
    fn linear_decode_stops_at_wrap() {
        let data = [0xEA, 0xEA, 0xEA, 0xEA];
        let decoded = decode_linear(0xFFFE, &data);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].addr, 0xFFFE);
        assert_eq!(decoded[1].addr, 0xFFFF);
    }

    #[test]
    fn jump_flow_target_is_published() {
        let ins = decode_one(0x2000, &[0x20, 0x56, 0xE4]).unwrap();
        assert_eq!(ins.mnemonic, "JSR");
        assert_eq!(ins.flow_target, Some(0xE456));
        // stores are not flow control
        let sta = decode_one(0x2000, &[0x8D, 0x56, 0xE4]).unwrap();
        assert_eq!(sta.flow_target, None);
    }
}
