// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! ANTIC display-list interpreter and screen-memory mapper. The decoder is
//! a plain iterator over the dumped bytes; the mapper turns the decoded
//! program plus DMACTL into row descriptors and a minimal fetch plan.

use bit_field::BitField;

pub const DMACTL_ADDR: u16 = 0x022F;
pub const DMACTL_HW_ADDR: u16 = 0xD400;
pub const DLPTRS_ADDR: u16 = 0x0230;

const MEMORY_SIZE: usize = 0x10000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Entry {
    pub addr: u16,
    pub command: u8,
    pub arg: u16,
}

impl Entry {
    pub fn mode(&self) -> u8 {
        self.command & 0x0F
    }

    pub fn is_dli(&self) -> bool {
        self.command.get_bit(7)
    }

    pub fn is_lms(&self) -> bool {
        self.command.get_bit(6)
    }

    pub fn is_jump(&self) -> bool {
        self.mode() == 1
    }

    pub fn is_jvb(&self) -> bool {
        self.is_jump() && self.command.get_bit(6)
    }

    pub fn command_name(&self) -> String {
        match self.mode() {
            0 => "BLANK".to_string(),
            1 if self.command.get_bit(6) => "JVB".to_string(),
            1 => "JMP".to_string(),
            mode => format!("MODE {}", mode),
        }
    }

    pub fn description(&self) -> String {
        let prefix = if self.is_dli() { "DLI " } else { "" };
        match self.mode() {
            0 => {
                let count = ((self.command >> 4) & 0x07) + 1;
                format!("{}{} {}", prefix, count, self.command_name())
            }
            1 => format!("{}{} {:04X}", prefix, self.command_name(), self.arg),
            _ => {
                let mut parts = Vec::with_capacity(4);
                if self.command.get_bit(6) {
                    parts.push(format!("LMS {:04X}", self.arg));
                }
                if self.command.get_bit(5) {
                    parts.push("VSCROL".to_string());
                }
                if self.command.get_bit(4) {
                    parts.push("HSCROL".to_string());
                }
                parts.push(self.command_name());
                format!("{}{}", prefix, parts.join(" "))
            }
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct DisplayList {
    pub start_addr: u16,
    pub entries: Vec<Entry>,
}

/// Walk the dumped bytes. Jump entries always consume a 16-bit argument,
/// LMS graphics entries consume one too, and a JVB terminates the walk.
pub fn decode(start_addr: u16, data: &[u8]) -> DisplayList {
    let mut entries = Vec::with_capacity(data.len() / 2);
    let mut pc = 0;
    while pc < data.len() {
        let addr = start_addr.wrapping_add(pc as u16);
        let command = data[pc];
        pc += 1;
        let mode = command & 0x0F;
        let mut arg = 0u16;
        if mode == 1 || (mode != 0 && command.get_bit(6)) {
            if pc + 1 >= data.len() {
                break;
            }
            arg = u16::from(data[pc]) | (u16::from(data[pc + 1]) << 8);
            pc += 2;
        }
        entries.push(Entry { addr, command, arg });
        if mode == 1 && command.get_bit(6) {
            break;
        }
    }
    DisplayList {
        start_addr,
        entries,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Compacted {
    pub count: usize,
    pub entry: Entry,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub mode: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RowRange {
    pub addr: Option<u16>,
    pub length: usize,
    pub mode: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FetchRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RowSlice {
    pub addr: u16,
    pub length: usize,
}

impl DisplayList {
    /// Runs of identical entries collapsed for the viewer.
    pub fn compacted(&self) -> Vec<Compacted> {
        let mut out = Vec::with_capacity(self.entries.len());
        let mut iter = self.entries.iter();
        let mut run = match iter.next() {
            Some(entry) => *entry,
            None => return out,
        };
        let mut count = 1;
        for &entry in iter {
            if entry.command == run.command && entry.arg == run.arg {
                count += 1;
                continue;
            }
            out.push(Compacted { count, entry: run });
            run = entry;
            count = 1;
        }
        out.push(Compacted { count, entry: run });
        out
    }

    /// Coalesced `[start, end)` runs of consecutive same-mode rows. Rows
    /// wrapping past the top of memory split into two half-segments first.
    pub fn screen_segments(&self, dmactl: u8) -> Vec<Segment> {
        let rows = MemoryMapper::new(self, dmactl, 4096).row_ranges_with_modes();
        let mut segments = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            let addr = match row.addr {
                Some(addr) if row.length > 0 => addr as usize,
                _ => continue,
            };
            let end = addr + row.length;
            if end <= MEMORY_SIZE {
                segments.push(Segment {
                    start: addr,
                    end,
                    mode: row.mode,
                });
            } else {
                segments.push(Segment {
                    start: addr,
                    end: MEMORY_SIZE,
                    mode: row.mode,
                });
                segments.push(Segment {
                    start: 0,
                    end: end & 0xFFFF,
                    mode: row.mode,
                });
            }
        }
        if segments.is_empty() {
            return segments;
        }
        let mut merged = Vec::with_capacity(segments.len());
        let mut cur = segments[0];
        for &seg in &segments[1..] {
            if seg.mode == cur.mode && cur.start <= seg.start && seg.start <= cur.end {
                cur.end = cur.end.max(seg.end);
                continue;
            }
            merged.push(cur);
            cur = seg;
        }
        merged.push(cur);
        merged
    }
}

pub struct MemoryMapper<'a> {
    dlist: &'a DisplayList,
    dmactl: u8,
    max_read: usize,
}

impl<'a> MemoryMapper<'a> {
    pub fn new(dlist: &'a DisplayList, dmactl: u8, max_read: usize) -> Self {
        Self {
            dlist,
            dmactl,
            max_read,
        }
    }

    fn width_bytes(&self) -> usize {
        match self.dmactl & 0x03 {
            1 => 32,
            3 => 48,
            _ => 40,
        }
    }

    fn hscrol_width_bytes(width: usize) -> usize {
        if width <= 32 {
            40
        } else {
            48
        }
    }

    fn bytes_per_line(mode: u8, width: usize) -> usize {
        match mode {
            0 | 1 => 0,
            2 | 3 | 4 | 5 | 0xD | 0xE | 0xF => width,
            6 | 7 | 0xA | 0xB | 0xC => width / 2,
            8 | 9 => width / 4,
            _ => width,
        }
    }

    pub fn row_bytes(&self, mode: u8) -> usize {
        Self::bytes_per_line(mode, self.width_bytes())
    }

    /// One descriptor per scan row: blank entries expand to their repeat
    /// count, jumps emit nothing, graphics rows track the running LMS
    /// address. Rows before the first LMS carry no address.
    pub fn row_ranges(&self) -> Vec<RowRange> {
        let width = self.width_bytes();
        let mut addr: Option<u16> = None;
        let mut rows = Vec::with_capacity(self.dlist.entries.len());
        for entry in &self.dlist.entries {
            let mode = entry.mode();
            if mode == 0 {
                let count = ((entry.command >> 4) & 0x07) + 1;
                for _ in 0..count {
                    rows.push(RowRange {
                        addr: None,
                        length: 0,
                        mode,
                    });
                }
                continue;
            }
            if mode == 1 {
                if entry.command.get_bit(6) {
                    break;
                }
                continue;
            }
            if entry.command.get_bit(6) {
                addr = Some(entry.arg);
            }
            let line_width = if entry.command.get_bit(4) {
                Self::hscrol_width_bytes(width)
            } else {
                width
            };
            let length = Self::bytes_per_line(mode, line_width);
            // before the first LMS the scan address is undefined
            match addr {
                Some(base) => {
                    rows.push(RowRange {
                        addr: Some(base),
                        length,
                        mode,
                    });
                    addr = Some(base.wrapping_add(length as u16));
                }
                None => rows.push(RowRange {
                    addr: None,
                    length,
                    mode,
                }),
            }
        }
        rows
    }

    pub fn row_ranges_with_modes(&self) -> Vec<RowRange> {
        self.row_ranges()
            .into_iter()
            .filter(|row| row.mode != 0)
            .collect()
    }

    /// The minimal set of non-overlapping fetch intervals covering every
    /// non-empty row, split at the chunk cap and at the memory wrap, plus
    /// the per-row slices to reassemble from the fetched buffer.
    pub fn plan(&self) -> (Vec<FetchRange>, Vec<RowSlice>) {
        let rows = self.row_ranges();
        let mut segments: Vec<(usize, usize)> = Vec::with_capacity(rows.len() * 2);
        let mut row_slices = Vec::with_capacity(rows.len());
        for row in &rows {
            let addr = match row.addr {
                Some(addr) if row.length > 0 => addr as usize,
                _ => continue,
            };
            let end = addr + row.length;
            if end <= MEMORY_SIZE {
                segments.push((addr, end));
            } else {
                segments.push((addr, MEMORY_SIZE));
                segments.push((0, end & 0xFFFF));
            }
            row_slices.push(RowSlice {
                addr: addr as u16,
                length: row.length,
            });
        }
        if segments.is_empty() {
            return (Vec::new(), row_slices);
        }
        segments.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(segments.len());
        let mut cur = segments[0];
        for &(start, end) in &segments[1..] {
            if start <= cur.1 {
                cur.1 = cur.1.max(end);
                continue;
            }
            merged.push(cur);
            cur = (start, end);
        }
        merged.push(cur);

        let mut fetch = Vec::with_capacity(merged.len());
        for (seg_start, seg_end) in merged {
            let mut start = seg_start;
            while start < seg_end {
                let end = if self.max_read > 0 && start + self.max_read < seg_end {
                    start + self.max_read
                } else {
                    seg_end
                };
                fetch.push(FetchRange { start, end });
                start = end;
            }
        }
        (fetch, row_slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Three 8-blank runs, LMS mode 2 at 9000, two mode-2 rows, JVB 8000.
    const BASIC_DL: [u8; 11] = [
        0x70, 0x70, 0x70, 0x42, 0x00, 0x90, 0x02, 0x02, 0x41, 0x00, 0x80,
    ];

    #[test]
    fn decodes_entries_and_stops_at_jvb() {
        let dl = decode(0x8000, &BASIC_DL);
        assert_eq!(dl.entries.len(), 7);
        assert_eq!(dl.entries[0].addr, 0x8000);
        assert_eq!(dl.entries[3].command, 0x42);
        assert_eq!(dl.entries[3].arg, 0x9000);
        let jvb = dl.entries[6];
        assert!(jvb.is_jvb());
        assert_eq!(jvb.arg, 0x8000);
    }

    #[test]
    fn jvb_terminates_before_trailing_bytes() {
        let mut data = BASIC_DL.to_vec();
        data.extend_from_slice(&[0x02, 0x02, 0x02]);
        let dl = decode(0x8000, &data);
        assert_eq!(dl.entries.len(), 7);
    }

    #[test]
    fn plain_jump_records_but_continues() {
        // JMP 9000, then one more mode 2 row
        let dl = decode(0x8000, &[0x01, 0x00, 0x90, 0x02]);
        assert_eq!(dl.entries.len(), 2);
        assert_eq!(dl.entries[0].command_name(), "JMP");
        assert_eq!(dl.entries[1].mode(), 2);
    }

    #[test]
    fn truncated_argument_stops_decode() {
        let dl = decode(0x8000, &[0x70, 0x42, 0x00]);
        assert_eq!(dl.entries.len(), 1);
    }

    #[test]
    fn row_ranges_follow_lms() {
        let dl = decode(0x8000, &BASIC_DL);
        let mapper = MemoryMapper::new(&dl, 0x22, 0x400);
        let rows = mapper.row_ranges();
        // 24 blank scan rows then 3 consumer rows
        assert_eq!(rows.len(), 27);
        assert!(rows[..24].iter().all(|r| r.length == 0 && r.addr.is_none()));
        assert_eq!(rows[24], RowRange { addr: Some(0x9000), length: 40, mode: 2 });
        assert_eq!(rows[25], RowRange { addr: Some(0x9028), length: 40, mode: 2 });
        assert_eq!(rows[26], RowRange { addr: Some(0x9050), length: 40, mode: 2 });
    }

    #[test]
    fn plan_merges_consecutive_rows() {
        let dl = decode(0x8000, &BASIC_DL);
        let mapper = MemoryMapper::new(&dl, 0x22, 0x400);
        let (fetch, slices) = mapper.plan();
        assert_eq!(fetch, vec![FetchRange { start: 0x9000, end: 0x9078 }]);
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0], RowSlice { addr: 0x9000, length: 40 });
    }

    #[test]
    fn plan_splits_at_chunk_cap() {
        let dl = decode(0x8000, &BASIC_DL);
        let mapper = MemoryMapper::new(&dl, 0x22, 0x40);
        let (fetch, _) = mapper.plan();
        assert_eq!(
            fetch,
            vec![
                FetchRange { start: 0x9000, end: 0x9040 },
                FetchRange { start: 0x9040, end: 0x9078 },
            ]
        );
    }

    #[test]
    fn every_row_slice_is_covered_by_the_plan() {
        let dl = decode(0x8000, &BASIC_DL);
        let mapper = MemoryMapper::new(&dl, 0x23, 0x100);
        let (fetch, slices) = mapper.plan();
        for slice in slices {
            for offset in 0..slice.length {
                let addr = (slice.addr as usize + offset) & 0xFFFF;
                let hits = fetch
                    .iter()
                    .filter(|r| r.start <= addr && addr < r.end)
                    .count();
                assert_eq!(hits, 1, "address {:04X} covered {} times", addr, hits);
            }
        }
    }

    #[test]
    fn width_depends_on_dmactl_and_hscrol() {
        // mode 2 with HSCROL set on a narrow playfield
        let data = [0x52, 0x00, 0x40, 0x41, 0x00, 0x80];
        let dl = decode(0x8000, &data);
        let narrow = MemoryMapper::new(&dl, 0x21, 0x400);
        assert_eq!(narrow.row_ranges()[0].length, 40);
        let normal = MemoryMapper::new(&dl, 0x22, 0x400);
        assert_eq!(normal.row_ranges()[0].length, 48);
        let wide = MemoryMapper::new(&dl, 0x23, 0x400);
        assert_eq!(wide.row_ranges()[0].length, 48);
    }

    #[test]
    fn mode_bit_depths_scale_row_bytes() {
        let dl = DisplayList::default();
        let mapper = MemoryMapper::new(&dl, 0x22, 0x400);
        assert_eq!(mapper.row_bytes(2), 40);
        assert_eq!(mapper.row_bytes(6), 20);
        assert_eq!(mapper.row_bytes(8), 10);
        assert_eq!(mapper.row_bytes(0xE), 40);
        assert_eq!(mapper.row_bytes(0), 0);
        assert_eq!(mapper.row_bytes(1), 0);
    }

    #[test]
    fn rows_before_first_lms_have_no_address() {
        let data = [0x02, 0x42, 0x00, 0x90, 0x41, 0x00, 0x80];
        let dl = decode(0x8000, &data);
        let mapper = MemoryMapper::new(&dl, 0x22, 0x400);
        let rows = mapper.row_ranges();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].addr, None);
        assert_eq!(rows[1].addr, Some(0x9000));
        let (fetch, slices) = mapper.plan();
        assert_eq!(slices.len(), 1);
        assert_eq!(fetch.len(), 1);
    }

    #[test]
    fn wrapping_row_splits_into_half_segments() {
        // LMS at FFF0 so a 40-byte row crosses the top of memory
        let data = [0x42, 0xF0, 0xFF, 0x41, 0x00, 0x80];
        let dl = decode(0x8000, &data);
        let segments = dl.screen_segments(0x22);
        assert_eq!(
            segments,
            vec![
                Segment { start: 0xFFF0, end: 0x10000, mode: 2 },
                Segment { start: 0, end: 0x18, mode: 2 },
            ]
        );
        let mapper = MemoryMapper::new(&dl, 0x22, 0x400);
        let (fetch, _) = mapper.plan();
        assert_eq!(
            fetch,
            vec![
                FetchRange { start: 0, end: 0x18 },
                FetchRange { start: 0xFFF0, end: 0x10000 },
            ]
        );
    }

    #[test]
    fn segments_merge_adjacent_same_mode_rows() {
        let dl = decode(0x8000, &BASIC_DL);
        let segments = dl.screen_segments(0x22);
        assert_eq!(
            segments,
            vec![Segment { start: 0x9000, end: 0x9078, mode: 2 }]
        );
    }

    #[test]
    fn segments_split_on_mode_change() {
        // LMS mode 2, then a mode 4 row continuing at the running address
        let data = [0x42, 0x00, 0x90, 0x04, 0x41, 0x00, 0x80];
        let dl = decode(0x8000, &data);
        let segments = dl.screen_segments(0x22);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].mode, 2);
        assert_eq!(segments[1].mode, 4);
        assert_eq!(segments[1].start, 0x9028);
    }

    #[test]
    fn compacted_collapses_runs() {
        let dl = decode(0x8000, &BASIC_DL);
        let compacted = dl.compacted();
        assert_eq!(compacted.len(), 5);
        assert_eq!(compacted[0].count, 3);
        assert_eq!(compacted[0].entry.command, 0x70);
        assert_eq!(compacted[1].count, 1);
    }

    #[test]
    fn descriptions_name_flags() {
        let lms = Entry { addr: 0, command: 0x42, arg: 0x9000 };
        assert_eq!(lms.description(), "LMS 9000 MODE 2");
        let blank = Entry { addr: 0, command: 0x70, arg: 0 };
        assert_eq!(blank.description(), "8 BLANK");
        let dli = Entry { addr: 0, command: 0x92, arg: 0 };
        assert_eq!(dli.description(), "DLI HSCROL MODE 2");
        let jvb = Entry { addr: 0, command: 0x41, arg: 0x8000 };
        assert_eq!(jvb.description(), "JVB 8000");
    }
}
