// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! 6502 opcode tables. Undocumented opcodes decode as `???` and render as
//! `.DB` fallbacks; the assembler skips them when building its reverse map.

use std::collections::HashMap;

use self::AddrMode::{Abs, Abx, Aby, Acc, Imm, Imp, Ind, Inx, Iny, Rel, Zpg, Zpx, Zpy};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AddrMode {
    Imp,
    Acc,
    Imm,
    Zpg,
    Zpx,
    Zpy,
    Abs,
    Abx,
    Aby,
    Ind,
    Inx,
    Iny,
    Rel,
}

impl AddrMode {
    pub fn size(self) -> usize {
        match self {
            Imp | Acc => 1,
            Imm | Inx | Iny | Rel | Zpg | Zpx | Zpy => 2,
            Abs | Abx | Aby | Ind => 3,
        }
    }
}

pub const OP_MNEMONIC: [&str; 256] = [
    // 0x00
    "BRK", "ORA", "???", "???", "???", "ORA", "ASL", "???",
    "PHP", "ORA", "ASL", "???", "???", "ORA", "ASL", "???",
    // 0x10
    "BPL", "ORA", "???", "???", "???", "ORA", "ASL", "???",
    "CLC", "ORA", "???", "???", "???", "ORA", "ASL", "???",
    // 0x20
    "JSR", "AND", "???", "???", "BIT", "AND", "ROL", "???",
    "PLP", "AND", "ROL", "???", "BIT", "AND", "ROL", "???",
    // 0x30
    "BMI", "AND", "???", "???", "???", "AND", "ROL", "???",
    "SEC", "AND", "???", "???", "???", "AND", "ROL", "???",
    // 0x40
    "RTI", "EOR", "???", "???", "???", "EOR", "LSR", "???",
    "PHA", "EOR", "LSR", "???", "JMP", "EOR", "LSR", "???",
    // 0x50
    "BVC", "EOR", "???", "???", "???", "EOR", "LSR", "???",
    "CLI", "EOR", "???", "???", "???", "EOR", "LSR", "???",
    // 0x60
    "RTS", "ADC", "???", "???", "???", "ADC", "ROR", "???",
    "PLA", "ADC", "ROR", "???", "JMP", "ADC", "ROR", "???",
    // 0x70
    "BVS", "ADC", "???", "???", "???", "ADC", "ROR", "???",
    "SEI", "ADC", "???", "???", "???", "ADC", "ROR", "???",
    // 0x80
    "???", "STA", "???", "???", "STY", "STA", "STX", "???",
    "DEY", "???", "TXA", "???", "STY", "STA", "STX", "???",
    // 0x90
    "BCC", "STA", "???", "???", "STY", "STA", "STX", "???",
    "TYA", "STA", "TXS", "???", "???", "STA", "???", "???",
    // 0xA0
    "LDY", "LDA", "LDX", "???", "LDY", "LDA", "LDX", "???",
    "TAY", "LDA", "TAX", "???", "LDY", "LDA", "LDX", "???",
    // 0xB0
    "BCS", "LDA", "???", "???", "LDY", "LDA", "LDX", "???",
    "CLV", "LDA", "TSX", "???", "LDY", "LDA", "LDX", "???",
    // 0xC0
    "CPY", "CMP", "???", "???", "CPY", "CMP", "DEC", "???",
    "INY", "CMP", "DEX", "???", "CPY", "CMP", "DEC", "???",
    // 0xD0
    "BNE", "CMP", "???", "???", "???", "CMP", "DEC", "???",
    "CLD", "CMP", "???", "???", "???", "CMP", "DEC", "???",
    // 0xE0
    "CPX", "SBC", "???", "???", "CPX", "SBC", "INC", "???",
    "INX", "SBC", "NOP", "???", "CPX", "SBC", "INC", "???",
    // 0xF0
    "BEQ", "SBC", "???", "???", "???", "SBC", "INC", "???",
    "SED", "SBC", "???", "???", "???", "SBC", "INC", "???",
];

pub const OP_MODE: [AddrMode; 256] = [
    // 0x00
    Imp, Inx, Imp, Imp, Imp, Zpg, Zpg, Imp,
    Imp, Imm, Acc, Imp, Imp, Abs, Abs, Imp,
    // 0x10
    Rel, Iny, Imp, Imp, Imp, Zpx, Zpx, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Abx, Imp,
    // 0x20
    Abs, Inx, Imp, Imp, Zpg, Zpg, Zpg, Imp,
    Imp, Imm, Acc, Imp, Abs, Abs, Abs, Imp,
    // 0x30
    Rel, Iny, Imp, Imp, Imp, Zpx, Zpx, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Abx, Imp,
    // 0x40
    Imp, Inx, Imp, Imp, Imp, Zpg, Zpg, Imp,
    Imp, Imm, Acc, Imp, Abs, Abs, Abs, Imp,
    // 0x50
    Rel, Iny, Imp, Imp, Imp, Zpx, Zpx, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Abx, Imp,
    // 0x60
    Imp, Inx, Imp, Imp, Imp, Zpg, Zpg, Imp,
    Imp, Imm, Acc, Imp, Ind, Abs, Abs, Imp,
    // 0x70
    Rel, Iny, Imp, Imp, Imp, Zpx, Zpx, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Abx, Imp,
    // 0x80
    Imp, Inx, Imp, Imp, Zpg, Zpg, Zpg, Imp,
    Imp, Imp, Imp, Imp, Abs, Abs, Abs, Imp,
    // 0x90
    Rel, Iny, Imp, Imp, Zpx, Zpx, Zpy, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Imp, Imp,
    // 0xA0
    Imm, Inx, Imm, Imp, Zpg, Zpg, Zpg, Imp,
    Imp, Imm, Imp, Imp, Abs, Abs, Abs, Imp,
    // 0xB0
    Rel, Iny, Imp, Imp, Zpx, Zpx, Zpy, Imp,
    Imp, Aby, Imp, Imp, Abx, Abx, Aby, Imp,
    // 0xC0
    Imm, Inx, Imp, Imp, Zpg, Zpg, Zpg, Imp,
    Imp, Imm, Imp, Imp, Abs, Abs, Abs, Imp,
    // 0xD0
    Rel, Iny, Imp, Imp, Imp, Zpx, Zpx, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Abx, Imp,
    // 0xE0
    Imm, Inx, Imp, Imp, Zpg, Zpg, Zpg, Imp,
    Imp, Imm, Imp, Imp, Abs, Abs, Abs, Imp,
    // 0xF0
    Rel, Iny, Imp, Imp, Imp, Zpx, Zpx, Imp,
    Imp, Aby, Imp, Imp, Imp, Abx, Abx, Imp,
];

lazy_static! {
    /// Mnemonic -> first opcode per addressing mode, used by the assembler.
    pub static ref MODES_BY_MNEMONIC: HashMap<&'static str, HashMap<AddrMode, u8>> = {
        let mut map: HashMap<&'static str, HashMap<AddrMode, u8>> = HashMap::new();
        for opcode in 0..=255u8 {
            let mnemonic = OP_MNEMONIC[opcode as usize];
            if mnemonic == "???" {
                continue;
            }
            let mode = OP_MODE[opcode as usize];
            map.entry(mnemonic).or_default().entry(mode).or_insert(opcode);
        }
        map
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes_match_modes() {
        assert_eq!(OP_MNEMONIC[0xA9], "LDA");
        assert_eq!(OP_MODE[0xA9], AddrMode::Imm);
        assert_eq!(OP_MNEMONIC[0x4C], "JMP");
        assert_eq!(OP_MODE[0x4C], AddrMode::Abs);
        assert_eq!(OP_MNEMONIC[0x6C], "JMP");
        assert_eq!(OP_MODE[0x6C], AddrMode::Ind);
        assert_eq!(OP_MNEMONIC[0x02], "???");
    }

    #[test]
    fn documented_opcode_count() {
        let documented = OP_MNEMONIC.iter().filter(|&&m| m != "???").count();
        assert_eq!(documented, 151);
    }

    #[test]
    fn reverse_map_covers_branches() {
        let beq = MODES_BY_MNEMONIC.get("BEQ").unwrap();
        assert_eq!(beq.len(), 1);
        assert_eq!(beq.get(&AddrMode::Rel), Some(&0xF0));
        let lda = MODES_BY_MNEMONIC.get("LDA").unwrap();
        assert_eq!(lda.get(&AddrMode::Imm), Some(&0xA9));
        assert_eq!(lda.get(&AddrMode::Abx), Some(&0xBD));
        assert!(MODES_BY_MNEMONIC.get("???").is_none());
    }
}
