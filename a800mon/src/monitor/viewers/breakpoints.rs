// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::bp;

use crate::monitor::actions::Action;
use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::{AppState, BreakpointClauseRow};
use crate::monitor::ui::{
    Color, Grid, Screen, WindowId, ATTR_REVERSE, KEY_BACKSPACE, KEY_DELETE, KEY_ENTER, KEY_ESC,
};

/// Server-side breakpoint clause table. Mutations queue as pending
/// operations applied on the next update tick; the list is re-read when the
/// state sequence moves or a mutation went through.
pub struct BreakpointsViewer {
    window: WindowId,
    grid: Grid,
    last_snapshot: String,
    last_state_seq: Option<u64>,
    refresh_requested: bool,
    pending_add: Vec<bp::Clause>,
    pending_delete: Option<usize>,
    pending_enabled: Option<bool>,
    pending_clear: bool,
    clear_armed: bool,
    input_active: bool,
    input_buffer: String,
    input_invalid: bool,
}

impl BreakpointsViewer {
    pub fn new(window: WindowId) -> BreakpointsViewer {
        let mut grid = Grid::new();
        grid.set_gap(0);
        grid.add_column(4, Color::Address.attr());
        grid.add_column(0, Color::Text.attr());
        BreakpointsViewer {
            window,
            grid,
            last_snapshot: String::new(),
            last_state_seq: None,
            refresh_requested: false,
            pending_add: Vec::new(),
            pending_delete: None,
            pending_enabled: None,
            pending_clear: false,
            clear_armed: false,
            input_active: false,
            input_buffer: String::new(),
            input_invalid: false,
        }
    }

    fn apply_pending(&mut self, ctx: &mut Ctx) -> bool {
        let mut changed = false;
        if self.pending_clear {
            self.pending_clear = false;
            if ctx.rpc.bp_clear().is_ok() {
                self.grid.set_selected(None);
                self.refresh_requested = true;
                changed = true;
            }
        }
        if let Some(idx) = self.pending_delete.take() {
            if ctx.rpc.bp_delete_clause(idx as u16).is_ok() {
                self.refresh_requested = true;
                changed = true;
            }
        }
        if !self.pending_add.is_empty() {
            let clauses = std::mem::replace(&mut self.pending_add, Vec::new());
            for clause in clauses {
                if ctx.rpc.bp_add_clause(&clause).is_err() {
                    break;
                }
                self.refresh_requested = true;
                changed = true;
            }
        }
        if let Some(enabled) = self.pending_enabled.take() {
            if ctx.rpc.bp_set_enabled(enabled).is_ok() {
                self.refresh_requested = true;
                changed = true;
            }
        }
        changed
    }

    fn close_input(&mut self, ctx: &mut Ctx) {
        self.input_active = false;
        self.input_buffer.clear();
        self.input_invalid = false;
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetInputFocus(false));
    }
}

impl Component for BreakpointsViewer {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, screen: &mut Screen) -> bool {
        let state = ctx.store.snapshot();
        if !state.breakpoints_supported {
            return false;
        }
        let changed = self.apply_pending(ctx);
        if !self.refresh_requested
            && self.last_state_seq == Some(state.state_seq)
            && !self.last_snapshot.is_empty()
        {
            return changed;
        }
        self.last_state_seq = Some(state.state_seq);

        let (enabled, clauses) = match ctx.rpc.bp_list() {
            Ok(list) => list,
            Err(_) => return changed,
        };
        self.refresh_requested = false;
        let rows: Vec<BreakpointClauseRow> = clauses
            .into_iter()
            .map(|conditions| BreakpointClauseRow { conditions })
            .collect();
        let snapshot = build_snapshot(enabled, &rows);
        screen.set_tag_active(self.window, "bp_enabled", enabled);
        if snapshot == self.last_snapshot {
            return changed;
        }
        self.last_snapshot = snapshot;
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetBreakpoints(enabled, rows));
        true
    }

    fn handle_input(&mut self, ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        if self.clear_armed {
            self.clear_armed = false;
            if key == 'y' as i32 || key == 'Y' as i32 {
                self.pending_clear = true;
            }
            return true;
        }
        if key == '/' as i32 {
            self.input_active = true;
            self.input_buffer.clear();
            self.input_invalid = false;
            ctx.dispatcher
                .dispatch(ctx.store, Action::SetInputFocus(true));
            return true;
        }
        if self.grid.handle_input(key) {
            return true;
        }
        if key == KEY_DELETE {
            if let Some(idx) = self.grid.selected() {
                self.pending_delete = Some(idx);
            }
            return true;
        }
        if key == 'c' as i32 || key == 'C' as i32 {
            self.clear_armed = true;
            return true;
        }
        if key == ' ' as i32 || key == 'e' as i32 || key == 'E' as i32 {
            self.pending_enabled = Some(!ctx.store.snapshot().breakpoints_enabled);
            return true;
        }
        false
    }

    fn handle_focus_input(&mut self, ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        if key == KEY_ESC {
            self.close_input(ctx);
            return true;
        }
        if key == KEY_ENTER || key == 13 {
            let text = self.input_buffer.trim().to_string();
            if !text.is_empty() {
                match bp::parse_clauses(&text) {
                    Ok(clauses) => self.pending_add = clauses,
                    Err(_) => {
                        self.input_invalid = true;
                        return true;
                    }
                }
            }
            self.close_input(ctx);
            return true;
        }
        if key == KEY_BACKSPACE || key == 127 || key == 8 {
            self.input_buffer.pop();
        } else if (32..127).contains(&key) {
            self.input_buffer.push(key as u8 as char);
        } else {
            return true;
        }
        self.input_invalid = !self.input_buffer.trim().is_empty()
            && bp::parse_clauses(self.input_buffer.trim()).is_err();
        true
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let overlay_rows = if self.input_active || self.clear_armed {
            1
        } else {
            0
        };
        let height = screen.window(self.window).inner_height();
        self.grid
            .set_viewport(overlay_rows, height.saturating_sub(overlay_rows));
        if state.breakpoints.is_empty() {
            self.grid
                .set_rows(vec![vec![String::new(), "No breakpoint clauses.".to_string()]]);
            self.grid.set_selected(None);
        } else {
            let rows: Vec<Vec<String>> = state
                .breakpoints
                .iter()
                .enumerate()
                .map(|(idx, clause)| {
                    vec![format!("#{:02} ", idx + 1), bp::format_clause(&clause.conditions)]
                })
                .collect();
            self.grid.set_rows(rows);
        }
        self.grid.render(screen, self.window);

        if self.clear_armed {
            screen.print(
                self.window,
                0,
                0,
                "Clear all breakpoints? [y/N]",
                Color::Error.attr() | ATTR_REVERSE,
            );
            screen.clear_line(self.window, 0, 28);
        } else if self.input_active {
            let attr = if self.input_invalid {
                Color::Error.attr() | ATTR_REVERSE
            } else {
                Color::Text.attr() | ATTR_REVERSE
            };
            let text = format!("{:<24}", self.input_buffer);
            screen.print(self.window, 0, 0, &text, attr);
            screen.clear_line(self.window, 0, text.chars().count());
        }
    }
}

fn build_snapshot(enabled: bool, clauses: &[BreakpointClauseRow]) -> String {
    let mut parts = vec![format!("enabled:{}", enabled)];
    for clause in clauses {
        let items: Vec<String> = clause
            .conditions
            .iter()
            .map(|cond| {
                format!(
                    "{}:{}:{:04X}:{:04X}",
                    cond.cond_type, cond.op, cond.addr, cond.value
                )
            })
            .collect();
        parts.push(items.join(","));
    }
    parts.join("|")
}
