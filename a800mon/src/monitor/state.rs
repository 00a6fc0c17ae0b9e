// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Application state. Readers get a deep-copied snapshot so a held snapshot
//! never observes concurrent mutation; setters take the write lock, mutate
//! and return.

use std::sync::RwLock;

use a800mon_core::dlist::DisplayList;
use a800mon_rpc::{CpuState, HistoryEntry};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AppMode {
    Normal,
    Debug,
    Shutdown,
}

impl Default for AppMode {
    fn default() -> AppMode {
        AppMode::Normal
    }
}

#[derive(Clone, Default, Debug)]
pub struct DisasmRow {
    pub addr: u16,
    pub size: usize,
    pub raw_text: String,
    pub asm_text: String,
    pub mnemonic: String,
    pub operand: String,
    pub comment: String,
    pub flow_target: Option<u16>,
    pub operand_span: Option<(usize, usize)>,
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ScreenRow {
    pub addr: u16,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct WatcherRow {
    pub addr: u16,
    pub value: u8,
    pub next_value: u8,
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct BreakpointClauseRow {
    pub conditions: Vec<a800mon_core::bp::Condition>,
}

#[derive(Clone, Default, Debug)]
pub struct AppState {
    // Execution state
    pub paused: bool,
    pub emu_ms: u64,
    pub reset_ms: u64,
    pub crashed: bool,
    pub state_seq: u64,
    pub machine_type: u8,
    pub last_rpc_error: String,
    pub monitor_frame_time_ms: u64,
    pub ui_frozen: bool,
    // CPU
    pub cpu: CpuState,
    pub cpu_disasm: String,
    // Display list
    pub dlist: DisplayList,
    pub dmactl: u8,
    pub dlist_inspect: bool,
    pub dlist_selected_region: Option<usize>,
    pub screen_rows: Vec<ScreenRow>,
    pub use_atascii: bool,
    // Disassembly
    pub disassembly_enabled: bool,
    pub disassembly_follow: bool,
    pub disassembly_addr: Option<u16>,
    pub disassembly_rows: Vec<DisasmRow>,
    // History
    pub history: Vec<HistoryEntry>,
    // Watchers
    pub watchers: Vec<WatcherRow>,
    pub watcher_pending: Option<WatcherRow>,
    pub watcher_selected: Option<usize>,
    // Breakpoints
    pub breakpoints_supported: bool,
    pub breakpoints_enabled: bool,
    pub breakpoints: Vec<BreakpointClauseRow>,
    // UI
    pub active_mode: AppMode,
    pub input_focus: bool,
}

pub struct StateStore {
    inner: RwLock<AppState>,
}

impl StateStore {
    pub fn new() -> StateStore {
        let mut state = AppState::default();
        state.use_atascii = true;
        state.disassembly_follow = true;
        StateStore {
            inner: RwLock::new(state),
        }
    }

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.inner.read().unwrap().clone()
    }

    fn write<F: FnOnce(&mut AppState)>(&self, mutate: F) {
        let mut state = self.inner.write().unwrap();
        mutate(&mut state);
    }

    pub fn set_status(
        &self,
        paused: bool,
        emu_ms: u64,
        reset_ms: u64,
        crashed: bool,
        state_seq: u64,
        machine_type: u8,
    ) {
        self.write(|state| {
            state.paused = paused;
            state.emu_ms = emu_ms;
            state.reset_ms = reset_ms;
            state.crashed = crashed;
            // StateSeq never decreases within a connection
            if state_seq >= state.state_seq || state_seq == 0 {
                state.state_seq = state_seq;
            }
            state.machine_type = machine_type;
        });
    }

    pub fn set_last_rpc_error(&self, text: String) {
        self.write(|state| state.last_rpc_error = text);
    }

    pub fn set_cpu(&self, cpu: CpuState, cpu_disasm: String) {
        self.write(|state| {
            state.cpu = cpu;
            state.cpu_disasm = cpu_disasm;
        });
    }

    pub fn set_dlist(&self, dlist: DisplayList, dmactl: u8) {
        self.write(|state| {
            state.dlist = dlist;
            state.dmactl = dmactl;
        });
    }

    pub fn set_screen_rows(&self, rows: Vec<ScreenRow>) {
        self.write(|state| state.screen_rows = rows);
    }

    pub fn set_history(&self, rows: Vec<HistoryEntry>) {
        self.write(|state| state.history = rows);
    }

    pub fn set_disassembly_rows(&self, rows: Vec<DisasmRow>) {
        self.write(|state| state.disassembly_rows = rows);
    }

    pub fn set_frame_time_ms(&self, ms: u64) {
        self.write(|state| state.monitor_frame_time_ms = ms);
    }

    pub fn set_ui_frozen(&self, frozen: bool) {
        self.write(|state| state.ui_frozen = frozen);
    }

    pub fn set_dlist_inspect(&self, enabled: bool) {
        self.write(|state| {
            state.dlist_inspect = enabled;
            if !enabled {
                state.dlist_selected_region = None;
            } else if state.dlist_selected_region.is_none() {
                state.dlist_selected_region = Some(0);
            }
        });
    }

    pub fn set_dlist_selected_region(&self, region: Option<usize>) {
        self.write(|state| state.dlist_selected_region = region);
    }

    pub fn set_use_atascii(&self, enabled: bool) {
        self.write(|state| state.use_atascii = enabled);
    }

    pub fn set_disassembly_enabled(&self, enabled: bool) {
        self.write(|state| state.disassembly_enabled = enabled);
    }

    pub fn set_disassembly_follow(&self, enabled: bool) {
        self.write(|state| state.disassembly_follow = enabled);
    }

    pub fn set_disassembly_addr(&self, addr: Option<u16>) {
        self.write(|state| state.disassembly_addr = addr);
    }

    pub fn set_input_focus(&self, enabled: bool) {
        self.write(|state| state.input_focus = enabled);
    }

    pub fn set_watchers(&self, rows: Vec<WatcherRow>) {
        self.write(|state| {
            let len = rows.len();
            state.watchers = rows;
            state.watcher_selected = match state.watcher_selected {
                _ if len == 0 => None,
                Some(idx) => Some(idx.min(len - 1)),
                None => None,
            };
        });
    }

    pub fn set_watcher_pending(&self, row: Option<WatcherRow>) {
        self.write(|state| state.watcher_pending = row);
    }

    pub fn set_watcher_selected(&self, selected: Option<usize>) {
        self.write(|state| {
            state.watcher_selected = match selected {
                Some(_) if state.watchers.is_empty() => None,
                Some(idx) => Some(idx.min(state.watchers.len() - 1)),
                None => None,
            };
        });
    }

    pub fn set_active_mode(&self, mode: AppMode) {
        self.write(|state| state.active_mode = mode);
    }

    pub fn set_breakpoints(&self, enabled: bool, clauses: Vec<BreakpointClauseRow>) {
        self.write(|state| {
            state.breakpoints_enabled = enabled;
            state.breakpoints = clauses;
        });
    }

    pub fn set_breakpoints_supported(&self, supported: bool) {
        self.write(|state| state.breakpoints_supported = supported);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_are_deep_copies() {
        let store = StateStore::new();
        store.set_watchers(vec![WatcherRow {
            addr: 0x0600,
            value: 1,
            next_value: 2,
        }]);
        let snapshot = store.snapshot();
        store.set_watchers(Vec::new());
        assert_eq!(snapshot.watchers.len(), 1);
        assert_eq!(store.snapshot().watchers.len(), 0);
    }

    #[test]
    fn state_seq_never_decreases() {
        let store = StateStore::new();
        store.set_status(false, 1, 1, false, 10, 0);
        store.set_status(false, 2, 2, false, 7, 0);
        assert_eq!(store.snapshot().state_seq, 10);
        store.set_status(false, 3, 3, false, 11, 0);
        assert_eq!(store.snapshot().state_seq, 11);
    }

    #[test]
    fn watcher_selection_tracks_row_count() {
        let store = StateStore::new();
        let rows: Vec<WatcherRow> = (0..3)
            .map(|idx| WatcherRow {
                addr: idx,
                value: 0,
                next_value: 0,
            })
            .collect();
        store.set_watchers(rows.clone());
        store.set_watcher_selected(Some(7));
        assert_eq!(store.snapshot().watcher_selected, Some(2));
        store.set_watchers(rows[..1].to_vec());
        assert_eq!(store.snapshot().watcher_selected, Some(0));
        store.set_watchers(Vec::new());
        assert_eq!(store.snapshot().watcher_selected, None);
    }

    #[test]
    fn dlist_inspect_seeds_the_selection() {
        let store = StateStore::new();
        store.set_dlist_inspect(true);
        assert_eq!(store.snapshot().dlist_selected_region, Some(0));
        store.set_dlist_inspect(false);
        assert_eq!(store.snapshot().dlist_selected_region, None);
    }
}
