// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::collections::HashMap;

use a800mon_core::disasm;
use a800mon_core::hex::format_hex16;
use a800mon_rpc::HistoryEntry;

use super::{disasm_to_row, opcode_columns};
use crate::monitor::actions::Action;
use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::{AppState, DisasmRow};
use crate::monitor::ui::{Color, Grid, Screen, WindowId, KEY_END};

const DECODE_CACHE_LIMIT: usize = 4096;

/// Executed-instruction trace. Entries decode at their own recorded
/// address through a bounded cache; the next instruction at PC is appended
/// live at the bottom.
pub struct HistoryViewer {
    window: WindowId,
    grid: Grid,
    last_snapshot: String,
    next_row: Option<DisasmRow>,
    decode_cache: HashMap<(u16, [u8; 3]), DisasmRow>,
    follow_live: bool,
}

impl HistoryViewer {
    pub fn new(window: WindowId) -> HistoryViewer {
        let mut grid = Grid::new();
        grid.add_column(5, Color::Address.attr());
        grid.add_column(2, Color::Text.attr());
        grid.add_column(2, Color::Text.attr());
        grid.add_column(2, Color::Text.attr());
        grid.add_column(4, Color::Mnemonic.attr());
        grid.add_column(14, Color::Text.attr());
        grid.add_column(0, Color::Comment.attr());
        HistoryViewer {
            window,
            grid,
            last_snapshot: String::new(),
            next_row: None,
            decode_cache: HashMap::new(),
            follow_live: true,
        }
    }

    fn decode_entry(&mut self, entry: &HistoryEntry) -> DisasmRow {
        let key = (entry.pc, entry.op);
        if let Some(row) = self.decode_cache.get(&key) {
            return row.clone();
        }
        let row = match disasm::decode_one(entry.pc, &entry.op) {
            Some(ins) => disasm_to_row(&ins),
            None => DisasmRow {
                addr: entry.pc,
                ..DisasmRow::default()
            },
        };
        if self.decode_cache.len() >= DECODE_CACHE_LIMIT {
            self.decode_cache.clear();
        }
        self.decode_cache.insert(key, row.clone());
        row
    }

    fn row_cells(row: &DisasmRow) -> Vec<String> {
        let (op1, op2, op3) = opcode_columns(&row.raw_text);
        vec![
            format!("{}:", format_hex16(row.addr)),
            op1,
            op2,
            op3,
            row.mnemonic.clone(),
            row.operand.clone(),
            row.comment.clone(),
        ]
    }
}

impl Component for HistoryViewer {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let entries = match ctx.rpc.history() {
            Ok(entries) => entries,
            Err(_) => return false,
        };
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetHistory(entries.clone()));
        let state = ctx.store.snapshot();
        if let Ok(code) = ctx.rpc.read_memory(state.cpu.pc, 3) {
            if let Some(ins) = disasm::decode_one(state.cpu.pc, &code) {
                self.next_row = Some(disasm_to_row(&ins));
            }
        }
        let mut snapshot = format!("pc:{:04X}", state.cpu.pc);
        for entry in &entries {
            snapshot.push_str(&format!(
                "|{:04X}:{:02X}:{:02X}:{:02X}",
                entry.pc, entry.op[0], entry.op[1], entry.op[2]
            ));
        }
        if let Some(next) = &self.next_row {
            snapshot.push_str(&format!("|next:{:04X}:{}", next.addr, next.raw_text));
        }
        if snapshot == self.last_snapshot {
            return false;
        }
        self.last_snapshot = snapshot;
        true
    }

    fn handle_input(&mut self, _ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        if !self.grid.handle_input(key) {
            return false;
        }
        // scrolling away from the live row parks the selection
        self.follow_live = key == KEY_END;
        true
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let next = match &self.next_row {
            Some(next) => next.clone(),
            None => DisasmRow {
                addr: state.cpu.pc,
                comment: state.cpu_disasm.clone(),
                ..DisasmRow::default()
            },
        };
        // oldest first, live instruction last
        let mut rows: Vec<Vec<String>> = state
            .history
            .iter()
            .rev()
            .map(|entry| {
                let row = self.decode_entry(entry);
                Self::row_cells(&row)
            })
            .collect();
        rows.push(Self::row_cells(&next));
        let live = rows.len() - 1;
        self.grid.set_rows(rows);
        if self.follow_live || self.grid.selected().is_none() {
            self.grid.set_selected(Some(live));
        }
        self.grid.render(screen, self.window);
    }
}
