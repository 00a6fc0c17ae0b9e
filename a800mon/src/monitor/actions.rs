// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Typed action queue between input handling and the rest of the monitor.
//! Execution-control actions enqueue RPCs that are flushed after render;
//! everything else mutates the store directly.

use a800mon_core::dlist::DisplayList;
use a800mon_rpc::{Client, Command, CpuState, HistoryEntry, Status};

use super::state::{AppMode, BreakpointClauseRow, DisasmRow, ScreenRow, StateStore, WatcherRow};

#[derive(Clone, Debug)]
pub enum Action {
    // Execution control
    Step,
    StepVBlank,
    StepOver,
    Pause,
    Continue,
    ColdStart,
    WarmStart,
    Terminate,
    // Mode transitions
    SyncMode,
    EnterShutdown,
    ExitShutdown,
    // UI setters
    SetDListInspect(bool),
    SetAtascii(bool),
    SetDisassembly(bool),
    SetDisassemblyFollow(bool),
    SetDisassemblyAddr(u16),
    SetDisassemblyRows(Vec<DisasmRow>),
    SetInputFocus(bool),
    SetStatus(Status),
    SetCpu(CpuState, String),
    SetHistory(Vec<HistoryEntry>),
    SetDList(DisplayList, u8),
    SetScreenRows(Vec<ScreenRow>),
    SetFrameTimeMs(u64),
    SetLastRpcError(String),
    SetBreakpoints(bool, Vec<BreakpointClauseRow>),
    SetBreakpointsSupported(bool),
    SetWatchers(Vec<WatcherRow>),
    SetWatcherPendingAddr(Option<u16>),
    SetWatcherPendingRow(WatcherRow),
    CommitWatcherPending,
    RemoveSelectedWatcher,
    SetWatcherSelected(Option<usize>),
    DListNext,
    DListPrev,
    ToggleFreeze,
    // Termination
    Quit,
}

pub struct Dispatcher {
    rpc_queue: Vec<Command>,
    rpc_flushed: bool,
    stop_loop: bool,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher {
            rpc_queue: Vec::new(),
            rpc_flushed: false,
            stop_loop: false,
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_loop
    }

    /// True once after a queue drain; the main loop uses it to force an
    /// immediate status refresh.
    pub fn take_rpc_flushed(&mut self) -> bool {
        let flushed = self.rpc_flushed;
        self.rpc_flushed = false;
        flushed
    }

    fn enqueue(&mut self, command: Command) {
        self.rpc_queue.push(command);
    }

    pub fn dispatch(&mut self, store: &StateStore, action: Action) {
        let state = store.snapshot();
        match action {
            Action::Step => self.enqueue(Command::Step),
            Action::StepVBlank => self.enqueue(Command::StepVBlank),
            Action::StepOver => self.enqueue(Command::StepOver),
            Action::Pause => {
                self.enqueue(Command::Pause);
                store.set_active_mode(AppMode::Debug);
            }
            Action::Continue => {
                self.enqueue(Command::Continue);
                store.set_active_mode(AppMode::Normal);
            }
            Action::SyncMode => {
                if state.active_mode != AppMode::Shutdown {
                    store.set_active_mode(if state.paused {
                        AppMode::Debug
                    } else {
                        AppMode::Normal
                    });
                }
            }
            Action::EnterShutdown => store.set_active_mode(AppMode::Shutdown),
            Action::ExitShutdown => {
                store.set_active_mode(if state.paused {
                    AppMode::Debug
                } else {
                    AppMode::Normal
                });
            }
            Action::ColdStart => {
                self.enqueue(Command::Coldstart);
                self.dispatch(store, Action::ExitShutdown);
            }
            Action::WarmStart => {
                self.enqueue(Command::Warmstart);
                self.dispatch(store, Action::ExitShutdown);
            }
            Action::Terminate => {
                self.enqueue(Command::StopEmulator);
                self.dispatch(store, Action::ExitShutdown);
            }
            Action::SetDListInspect(enabled) => store.set_dlist_inspect(enabled),
            Action::SetAtascii(enabled) => store.set_use_atascii(enabled),
            Action::SetDisassembly(enabled) => store.set_disassembly_enabled(enabled),
            Action::SetDisassemblyFollow(enabled) => store.set_disassembly_follow(enabled),
            Action::SetDisassemblyAddr(addr) => store.set_disassembly_addr(Some(addr)),
            Action::SetDisassemblyRows(rows) => store.set_disassembly_rows(rows),
            Action::SetInputFocus(enabled) => store.set_input_focus(enabled),
            Action::SetStatus(status) => store.set_status(
                status.paused,
                status.emu_ms,
                status.reset_ms,
                status.crashed,
                status.state_seq,
                status.machine_type,
            ),
            Action::SetCpu(cpu, disasm) => store.set_cpu(cpu, disasm),
            Action::SetHistory(rows) => store.set_history(rows),
            Action::SetDList(dlist, dmactl) => store.set_dlist(dlist, dmactl),
            Action::SetScreenRows(rows) => store.set_screen_rows(rows),
            Action::SetFrameTimeMs(ms) => store.set_frame_time_ms(ms),
            Action::SetLastRpcError(text) => store.set_last_rpc_error(text),
            Action::SetBreakpoints(enabled, clauses) => store.set_breakpoints(enabled, clauses),
            Action::SetBreakpointsSupported(supported) => {
                store.set_breakpoints_supported(supported)
            }
            Action::SetWatchers(rows) => store.set_watchers(rows),
            Action::SetWatcherPendingRow(row) => store.set_watcher_pending(Some(row)),
            Action::SetWatcherPendingAddr(addr) => {
                store.set_watcher_pending(addr.map(|addr| WatcherRow {
                    addr,
                    value: 0,
                    next_value: 0,
                }));
            }
            Action::CommitWatcherPending => {
                let pending = match state.watcher_pending {
                    Some(pending) => pending,
                    None => return,
                };
                if let Some(idx) = state.watchers.iter().position(|row| row.addr == pending.addr)
                {
                    store.set_watcher_selected(Some(idx));
                    store.set_watcher_pending(None);
                    return;
                }
                let mut rows = Vec::with_capacity(state.watchers.len() + 1);
                rows.push(pending);
                rows.extend(state.watchers.iter().copied());
                store.set_watchers(rows);
                store.set_watcher_selected(None);
                store.set_watcher_pending(None);
            }
            Action::RemoveSelectedWatcher => {
                let idx = match state.watcher_selected {
                    Some(idx) if idx < state.watchers.len() => idx,
                    _ => return,
                };
                let mut rows = state.watchers.clone();
                rows.remove(idx);
                let len = rows.len();
                store.set_watchers(rows);
                store.set_watcher_selected(if len == 0 {
                    None
                } else {
                    Some(idx.min(len - 1))
                });
            }
            Action::SetWatcherSelected(selected) => store.set_watcher_selected(selected),
            Action::DListNext => {
                if state.dlist_inspect {
                    let next = state.dlist_selected_region.map_or(0, |idx| idx + 1);
                    store.set_dlist_selected_region(Some(next));
                }
            }
            Action::DListPrev => {
                if state.dlist_inspect {
                    let prev = state
                        .dlist_selected_region
                        .map_or(0, |idx| idx.saturating_sub(1));
                    store.set_dlist_selected_region(Some(prev));
                }
            }
            Action::ToggleFreeze => store.set_ui_frozen(!state.ui_frozen),
            Action::Quit => self.stop_loop = true,
        }
    }

    /// Drain the queued execution-control RPCs after render. Failures after
    /// the first are dropped; the next status tick surfaces the error.
    pub fn post_render(&mut self, rpc: &Client) {
        if self.rpc_queue.is_empty() {
            return;
        }
        let queue = std::mem::replace(&mut self.rpc_queue, Vec::new());
        for command in queue {
            if let Err(err) = rpc.call(command, &[]) {
                debug!(target: "monitor", "queued rpc {:?} failed: {}", command, err);
            }
        }
        self.rpc_flushed = true;
    }

    #[cfg(test)]
    pub fn queued(&self) -> &[Command] {
        &self.rpc_queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_actions_enqueue_rpcs() {
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(&store, Action::Step);
        dispatcher.dispatch(&store, Action::Pause);
        assert_eq!(dispatcher.queued(), &[Command::Step, Command::Pause]);
        assert_eq!(store.snapshot().active_mode, AppMode::Debug);
    }

    #[test]
    fn exit_shutdown_resolves_by_paused_flag() {
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        store.set_active_mode(AppMode::Shutdown);
        store.set_status(true, 0, 0, false, 1, 0);
        dispatcher.dispatch(&store, Action::ExitShutdown);
        assert_eq!(store.snapshot().active_mode, AppMode::Debug);
        store.set_status(false, 0, 0, false, 2, 0);
        store.set_active_mode(AppMode::Shutdown);
        dispatcher.dispatch(&store, Action::ExitShutdown);
        assert_eq!(store.snapshot().active_mode, AppMode::Normal);
    }

    #[test]
    fn coldstart_leaves_shutdown_mode() {
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        store.set_active_mode(AppMode::Shutdown);
        dispatcher.dispatch(&store, Action::ColdStart);
        assert_eq!(dispatcher.queued(), &[Command::Coldstart]);
        assert_eq!(store.snapshot().active_mode, AppMode::Normal);
    }

    #[test]
    fn committing_a_pending_watcher_prepends_once() {
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(&store, Action::SetWatcherPendingAddr(Some(0x0600)));
        dispatcher.dispatch(&store, Action::CommitWatcherPending);
        assert_eq!(store.snapshot().watchers.len(), 1);
        // committing an existing address selects it instead of duplicating
        dispatcher.dispatch(&store, Action::SetWatcherPendingAddr(Some(0x0600)));
        dispatcher.dispatch(&store, Action::CommitWatcherPending);
        let state = store.snapshot();
        assert_eq!(state.watchers.len(), 1);
        assert_eq!(state.watcher_selected, Some(0));
        assert_eq!(state.watcher_pending, None);
    }

    #[test]
    fn removing_a_watcher_keeps_a_valid_selection() {
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        for addr in &[3u16, 2, 1] {
            dispatcher.dispatch(&store, Action::SetWatcherPendingAddr(Some(*addr)));
            dispatcher.dispatch(&store, Action::CommitWatcherPending);
        }
        dispatcher.dispatch(&store, Action::SetWatcherSelected(Some(2)));
        dispatcher.dispatch(&store, Action::RemoveSelectedWatcher);
        let state = store.snapshot();
        assert_eq!(state.watchers.len(), 2);
        assert_eq!(state.watcher_selected, Some(1));
    }

    #[test]
    fn quit_marks_stop_loop() {
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.stop_requested());
        dispatcher.dispatch(&store, Action::Quit);
        assert!(dispatcher.stop_requested());
    }
}
