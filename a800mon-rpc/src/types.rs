// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Typed reply records. Every parser length-checks before indexing and
//! reports a short payload as a decode fault, which the client treats like
//! a transport error.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;

fn short(what: &str) -> Error {
    Error::Decode(format!("{} payload too short", what))
}

fn short_sized(what: &str, got: usize, expected: usize) -> Error {
    Error::Decode(format!(
        "{} payload too short: got={} expected={}",
        what, got, expected
    ))
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Status {
    pub paused: bool,
    pub crashed: bool,
    pub emu_ms: u64,
    pub reset_ms: u64,
    pub state_seq: u64,
    pub machine_type: u8,
}

impl Status {
    pub fn from_payload(data: &[u8]) -> Result<Status, Error> {
        if data.len() < 22 {
            return Err(short("status"));
        }
        let flags = data[0];
        Ok(Status {
            paused: flags & 0x01 != 0,
            crashed: flags & 0x80 != 0,
            emu_ms: LittleEndian::read_u64(&data[1..9]),
            reset_ms: LittleEndian::read_u64(&data[9..17]),
            state_seq: u64::from(LittleEndian::read_u32(&data[17..21])),
            machine_type: data[21],
        })
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Sysinfo {
    pub machine_family: u8,
    pub os_revision: u8,
    pub basic_revision: u8,
    pub builtin_game_revision: u8,
    pub basic_enabled: bool,
    pub tv_pal: bool,
}

impl Sysinfo {
    pub fn from_payload(data: &[u8]) -> Result<Sysinfo, Error> {
        if data.len() < 5 {
            return Err(short("sysinfo"));
        }
        let flags = data[0];
        Ok(Sysinfo {
            basic_enabled: flags & 0x01 != 0,
            tv_pal: flags & 0x02 != 0,
            machine_family: data[1],
            os_revision: data[2],
            basic_revision: data[3],
            builtin_game_revision: data[4],
        })
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct CpuState {
    pub ypos: u16,
    pub xpos: u16,
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: u8,
}

impl CpuState {
    pub fn from_payload(data: &[u8]) -> Result<CpuState, Error> {
        if data.len() < 11 {
            return Err(short("cpu_state"));
        }
        Ok(CpuState {
            ypos: LittleEndian::read_u16(&data[0..2]),
            xpos: LittleEndian::read_u16(&data[2..4]),
            pc: LittleEndian::read_u16(&data[4..6]),
            a: data[6],
            x: data[7],
            y: data[8],
            s: data[9],
            p: data[10],
        })
    }

    /// Processor status rendered as `NV-BDIZC` with cleared bits dimmed out.
    pub fn flags_text(&self) -> String {
        let names = ['N', 'V', '-', 'B', 'D', 'I', 'Z', 'C'];
        names
            .iter()
            .enumerate()
            .map(|(idx, &name)| {
                if self.p & (0x80 >> idx) != 0 {
                    name
                } else {
                    '.'
                }
            })
            .collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HistoryEntry {
    pub y: u8,
    pub x: u8,
    pub pc: u16,
    pub op: [u8; 3],
}

impl HistoryEntry {
    pub fn parse_list(data: &[u8]) -> Result<Vec<HistoryEntry>, Error> {
        if data.is_empty() {
            return Err(short("history"));
        }
        let count = data[0] as usize;
        let expected = 1 + count * 7;
        if data.len() < expected {
            return Err(short_sized("history", data.len(), expected));
        }
        let mut entries = Vec::with_capacity(count);
        let mut offset = 1;
        for _ in 0..count {
            entries.push(HistoryEntry {
                y: data[offset],
                x: data[offset + 1],
                pc: LittleEndian::read_u16(&data[offset + 2..offset + 4]),
                op: [data[offset + 4], data[offset + 5], data[offset + 6]],
            });
            offset += 7;
        }
        Ok(entries)
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct GtiaState {
    pub hposp: [u8; 4],
    pub hposm: [u8; 4],
    pub sizep: [u8; 4],
    pub sizem: u8,
    pub grafp: [u8; 4],
    pub grafm: u8,
    pub colpm: [u8; 4],
    pub colpf: [u8; 4],
    pub colbk: u8,
    pub prior: u8,
    pub vdelay: u8,
    pub gractl: u8,
}

impl GtiaState {
    pub fn from_payload(data: &[u8]) -> Result<GtiaState, Error> {
        if data.len() < 30 {
            return Err(short("GTIA_STATE"));
        }
        let mut out = GtiaState::default();
        out.hposp.copy_from_slice(&data[0..4]);
        out.hposm.copy_from_slice(&data[4..8]);
        out.sizep.copy_from_slice(&data[8..12]);
        out.sizem = data[12];
        out.grafp.copy_from_slice(&data[13..17]);
        out.grafm = data[17];
        out.colpm.copy_from_slice(&data[18..22]);
        out.colpf.copy_from_slice(&data[22..26]);
        out.colbk = data[26];
        out.prior = data[27];
        out.vdelay = data[28];
        out.gractl = data[29];
        Ok(out)
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct AnticState {
    pub dmactl: u8,
    pub chactl: u8,
    pub dlist: u16,
    pub hscrol: u8,
    pub vscrol: u8,
    pub pmbase: u8,
    pub chbase: u8,
    pub vcount: u8,
    pub nmien: u8,
    pub ypos: u16,
}

impl AnticState {
    pub fn from_payload(data: &[u8]) -> Result<AnticState, Error> {
        if data.len() < 12 {
            return Err(short("ANTIC_STATE"));
        }
        Ok(AnticState {
            dmactl: data[0],
            chactl: data[1],
            dlist: LittleEndian::read_u16(&data[2..4]),
            hscrol: data[4],
            vscrol: data[5],
            pmbase: data[6],
            chbase: data[7],
            vcount: data[8],
            nmien: data[9],
            ypos: LittleEndian::read_u16(&data[10..12]),
        })
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct CartSlotState {
    pub present: u8,
    pub cart_type: i16,
    pub state: u32,
    pub size_kb: u32,
    pub raw: u8,
}

impl CartSlotState {
    fn from_payload(data: &[u8]) -> CartSlotState {
        CartSlotState {
            present: data[0],
            cart_type: LittleEndian::read_u16(&data[1..3]) as i16,
            state: LittleEndian::read_u32(&data[3..7]),
            size_kb: LittleEndian::read_u32(&data[7..11]),
            raw: data[11],
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct CartState {
    pub autoreboot: u8,
    pub main: CartSlotState,
    pub piggy: CartSlotState,
}

impl CartState {
    pub fn from_payload(data: &[u8]) -> Result<CartState, Error> {
        if data.len() < 25 {
            return Err(short("CART_STATE"));
        }
        Ok(CartState {
            autoreboot: data[0],
            main: CartSlotState::from_payload(&data[1..13]),
            piggy: CartSlotState::from_payload(&data[13..25]),
        })
    }
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct JumpsState {
    pub pcs: Vec<u16>,
}

impl JumpsState {
    pub fn from_payload(data: &[u8]) -> Result<JumpsState, Error> {
        if data.is_empty() {
            return Err(short("JUMPS"));
        }
        let count = data[0] as usize;
        let expected = 1 + count * 2;
        if data.len() < expected {
            return Err(short_sized("JUMPS", data.len(), expected));
        }
        let mut pcs = Vec::with_capacity(count);
        for idx in 0..count {
            pcs.push(LittleEndian::read_u16(&data[1 + idx * 2..3 + idx * 2]));
        }
        Ok(JumpsState { pcs })
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct PiaState {
    pub pactl: u8,
    pub pbctl: u8,
    pub porta: u8,
    pub portb: u8,
}

impl PiaState {
    pub fn from_payload(data: &[u8]) -> Result<PiaState, Error> {
        if data.len() < 4 {
            return Err(short("PIA_STATE"));
        }
        Ok(PiaState {
            pactl: data[0],
            pbctl: data[1],
            porta: data[2],
            portb: data[3],
        })
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct PokeyState {
    pub stereo_enabled: u8,
    pub audf1: [u8; 4],
    pub audc1: [u8; 4],
    pub audctl1: u8,
    pub kbcode: u8,
    pub irqen: u8,
    pub irqst: u8,
    pub skstat: u8,
    pub skctl: u8,
    pub has_chip2: bool,
    pub audf2: [u8; 4],
    pub audc2: [u8; 4],
    pub audctl2: u8,
}

impl PokeyState {
    pub fn from_payload(data: &[u8]) -> Result<PokeyState, Error> {
        if data.len() < 15 {
            return Err(short("POKEY_STATE"));
        }
        let mut out = PokeyState::default();
        out.stereo_enabled = data[0];
        out.audf1.copy_from_slice(&data[1..5]);
        out.audc1.copy_from_slice(&data[5..9]);
        out.audctl1 = data[9];
        out.kbcode = data[10];
        out.irqen = data[11];
        out.irqst = data[12];
        out.skstat = data[13];
        out.skctl = data[14];
        if out.stereo_enabled != 0 {
            if data.len() < 24 {
                return Err(short("POKEY_STATE (chip2_data)"));
            }
            out.has_chip2 = true;
            out.audf2.copy_from_slice(&data[15..19]);
            out.audc2.copy_from_slice(&data[19..23]);
            out.audctl2 = data[23];
        }
        Ok(out)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StackEntry {
    pub stack_off: u8,
    pub value: u8,
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct StackState {
    pub s: u8,
    pub entries: Vec<StackEntry>,
}

impl StackState {
    pub fn from_payload(data: &[u8]) -> Result<StackState, Error> {
        if data.len() < 2 {
            return Err(short("STACK"));
        }
        let s = data[0];
        let count = data[1] as usize;
        let expected = 2 + count * 2;
        if data.len() < expected {
            return Err(short_sized("STACK", data.len(), expected));
        }
        let mut entries = Vec::with_capacity(count);
        for idx in 0..count {
            entries.push(StackEntry {
                stack_off: data[2 + idx * 2],
                value: data[3 + idx * 2],
            });
        }
        Ok(StackState { s, entries })
    }
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct SearchResult {
    pub total: u32,
    pub addrs: Vec<u16>,
}

impl SearchResult {
    pub fn from_payload(data: &[u8]) -> Result<SearchResult, Error> {
        if data.len() < 6 {
            return Err(short("SEARCH"));
        }
        let total = LittleEndian::read_u32(&data[0..4]);
        let returned = LittleEndian::read_u16(&data[4..6]) as usize;
        let expected = 6 + returned * 2;
        if data.len() < expected {
            return Err(short_sized("SEARCH", data.len(), expected));
        }
        let mut addrs = Vec::with_capacity(returned);
        for idx in 0..returned {
            addrs.push(LittleEndian::read_u16(&data[6 + idx * 2..8 + idx * 2]));
        }
        Ok(SearchResult { total, addrs })
    }
}

/// CPU register selector for SET_REG.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reg {
    A = 1,
    X = 2,
    Y = 3,
    S = 4,
    P = 5,
    Pc = 6,
}

pub(crate) fn parse_caps(data: &[u8]) -> Result<Vec<u16>, Error> {
    if data.len() < 2 {
        return Err(short("build_features"));
    }
    let count = LittleEndian::read_u16(&data[0..2]) as usize;
    let expected = 2 + count * 2;
    if data.len() < expected {
        return Err(short_sized("build_features", data.len(), expected));
    }
    let mut caps = Vec::with_capacity(count);
    for idx in 0..count {
        caps.push(LittleEndian::read_u16(&data[2 + idx * 2..4 + idx * 2]));
    }
    Ok(caps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_flags_and_counters() {
        let mut data = vec![0x81u8];
        data.extend_from_slice(&1234u64.to_le_bytes());
        data.extend_from_slice(&77u64.to_le_bytes());
        data.extend_from_slice(&42u32.to_le_bytes());
        data.push(4);
        let status = Status::from_payload(&data).unwrap();
        assert!(status.paused);
        assert!(status.crashed);
        assert_eq!(status.emu_ms, 1234);
        assert_eq!(status.reset_ms, 77);
        assert_eq!(status.state_seq, 42);
        assert_eq!(status.machine_type, 4);
        assert!(Status::from_payload(&data[..21]).is_err());
    }

    #[test]
    fn cpu_state_layout() {
        let data = [10, 0, 20, 0, 0x00, 0x06, 1, 2, 3, 4, 0b1000_0010];
        let cpu = CpuState::from_payload(&data).unwrap();
        assert_eq!(cpu.ypos, 10);
        assert_eq!(cpu.xpos, 20);
        assert_eq!(cpu.pc, 0x0600);
        assert_eq!(cpu.a, 1);
        assert_eq!(cpu.p, 0b1000_0010);
        assert_eq!(cpu.flags_text(), "N.....Z.");
        assert!(CpuState::from_payload(&data[..10]).is_err());
    }

    #[test]
    fn history_entries_are_seven_bytes_each() {
        let data = [2u8, 5, 6, 0x00, 0x06, 0xA9, 0x2A, 0x00, 7, 8, 0x02, 0x06, 0x60, 0, 0];
        let entries = HistoryEntry::parse_list(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pc, 0x0600);
        assert_eq!(entries[0].op, [0xA9, 0x2A, 0x00]);
        assert_eq!(entries[1].pc, 0x0602);
        assert!(HistoryEntry::parse_list(&data[..8]).is_err());
    }

    #[test]
    fn pokey_second_chip_is_conditional() {
        let mono = [0u8; 15];
        let parsed = PokeyState::from_payload(&mono).unwrap();
        assert!(!parsed.has_chip2);
        let mut stereo = vec![1u8];
        stereo.extend_from_slice(&[0u8; 14]);
        assert!(PokeyState::from_payload(&stereo).is_err());
        stereo.extend_from_slice(&[0u8; 9]);
        let parsed = PokeyState::from_payload(&stereo).unwrap();
        assert!(parsed.has_chip2);
    }

    #[test]
    fn caps_list_parses() {
        let data = [2u8, 0, 1, 0, 7, 0];
        assert_eq!(parse_caps(&data).unwrap(), vec![1, 7]);
        assert!(parse_caps(&data[..3]).is_err());
    }

    #[test]
    fn search_result_parses() {
        let mut data = Vec::new();
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&0x0600u16.to_le_bytes());
        data.extend_from_slice(&0x0700u16.to_le_bytes());
        let result = SearchResult::from_payload(&data).unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.addrs, vec![0x0600, 0x0700]);
    }

    #[test]
    fn stack_and_jumps_parse() {
        let stack = StackState::from_payload(&[0xFD, 2, 0xFE, 0x12, 0xFF, 0x34]).unwrap();
        assert_eq!(stack.s, 0xFD);
        assert_eq!(stack.entries.len(), 2);
        assert_eq!(stack.entries[1].value, 0x34);
        let jumps = JumpsState::from_payload(&[1, 0x00, 0x06]).unwrap();
        assert_eq!(jumps.pcs, vec![0x0600]);
    }
}
