// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::hex::format_hex16;
use a800mon_core::symbols;

use crate::monitor::actions::Action;
use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::{AppState, WatcherRow};
use crate::monitor::ui::{
    Color, Grid, Screen, WindowId, ATTR_REVERSE, KEY_BACKSPACE, KEY_DELETE, KEY_ENTER, KEY_ESC,
};

const SEARCH_MAX_LEN: usize = 8;

/// Watched addresses with their current byte and the byte after it (word
/// view). New rows arrive through a symbol search or a plain hex address.
pub struct WatchersViewer {
    window: WindowId,
    grid: Grid,
    input_active: bool,
    search_buffer: String,
    last_snapshot: String,
}

impl WatchersViewer {
    pub fn new(window: WindowId) -> WatchersViewer {
        let mut grid = Grid::new();
        grid.set_gap(0);
        grid.add_column(6, Color::Address.attr());
        grid.add_column(4, Color::Text.attr());
        grid.add_column(4, Color::Address.attr());
        grid.add_column(14, Color::Text.attr());
        grid.add_column(1, Color::Text.attr());
        grid.add_column(0, Color::Comment.attr());
        WatchersViewer {
            window,
            grid,
            input_active: false,
            search_buffer: String::new(),
            last_snapshot: String::new(),
        }
    }

    fn row_cells(row: &WatcherRow) -> Vec<String> {
        let word = (u16::from(row.next_value) << 8) | u16::from(row.value);
        vec![
            format!("{}: ", format_hex16(row.addr)),
            format!(" {:02X} ", row.value),
            format_hex16(word),
            format!(" {:3} {:08b} ", row.value, row.value),
            ";".to_string(),
            symbols::lookup(row.addr).to_string(),
        ]
    }

    fn sync_pending(&self, ctx: &mut Ctx) {
        let query = self.search_buffer.trim();
        let addr = if query.is_empty() {
            None
        } else {
            symbols::find_symbol_or_address(query)
        };
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetWatcherPendingAddr(addr));
    }

    fn close_input(&mut self, ctx: &mut Ctx) {
        self.input_active = false;
        self.search_buffer.clear();
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetWatcherPendingAddr(None));
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetInputFocus(false));
    }
}

impl Component for WatchersViewer {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let state = ctx.store.snapshot();
        let mut rows = Vec::with_capacity(state.watchers.len());
        for row in &state.watchers {
            let data = match ctx.rpc.read_memory(row.addr, 2) {
                Ok(data) => data,
                Err(_) => return false,
            };
            rows.push(WatcherRow {
                addr: row.addr,
                value: data.get(0).copied().unwrap_or(row.value),
                next_value: data.get(1).copied().unwrap_or(row.next_value),
            });
        }
        let pending = match state.watcher_pending {
            Some(pending) => {
                let data = match ctx.rpc.read_memory(pending.addr, 2) {
                    Ok(data) => data,
                    Err(_) => return false,
                };
                Some(WatcherRow {
                    addr: pending.addr,
                    value: data.get(0).copied().unwrap_or(0),
                    next_value: data.get(1).copied().unwrap_or(0),
                })
            }
            None => None,
        };
        let snapshot = format!(
            "{:?}|{:?}|{:?}|{}|{}",
            rows, pending, state.watcher_selected, self.input_active, self.search_buffer,
        );
        ctx.dispatcher.dispatch(ctx.store, Action::SetWatchers(rows));
        if let Some(pending) = pending {
            if Some(pending) != state.watcher_pending {
                ctx.dispatcher
                    .dispatch(ctx.store, Action::SetWatcherPendingRow(pending));
            }
        }
        if snapshot == self.last_snapshot {
            return false;
        }
        self.last_snapshot = snapshot;
        true
    }

    fn handle_input(&mut self, ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        if key == '/' as i32 {
            self.input_active = true;
            self.search_buffer.clear();
            ctx.dispatcher
                .dispatch(ctx.store, Action::SetWatcherPendingAddr(None));
            ctx.dispatcher
                .dispatch(ctx.store, Action::SetInputFocus(true));
            return true;
        }
        if self.grid.handle_input(key) {
            ctx.dispatcher
                .dispatch(ctx.store, Action::SetWatcherSelected(self.grid.selected()));
            return true;
        }
        if key == KEY_DELETE {
            ctx.dispatcher
                .dispatch(ctx.store, Action::RemoveSelectedWatcher);
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
            if ctx.store.snapshot().watcher_pending.is_some() {
                ctx.dispatcher
                    .dispatch(ctx.store, Action::CommitWatcherPending);
            }
            self.input_active = false;
            self.search_buffer.clear();
            ctx.dispatcher
                .dispatch(ctx.store, Action::SetInputFocus(false));
            return true;
        }
        if key == KEY_BACKSPACE || key == 127 || key == 8 {
            self.search_buffer.pop();
            self.sync_pending(ctx);
            return true;
        }
        if (32..127).contains(&key) && self.search_buffer.chars().count() < SEARCH_MAX_LEN {
            self.search_buffer.push(key as u8 as char);
            self.sync_pending(ctx);
        }
        true
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let mut overlay_rows = 0;
        if self.input_active {
            overlay_rows += 1;
        }
        if state.watcher_pending.is_some() {
            overlay_rows += 1;
        }
        let height = screen.window(self.window).inner_height();
        self.grid
            .set_viewport(overlay_rows, height.saturating_sub(overlay_rows));
        let rows: Vec<Vec<String>> = state.watchers.iter().map(Self::row_cells).collect();
        self.grid.set_rows(rows);
        self.grid.set_selected(state.watcher_selected);

        let mut y = 0;
        if self.input_active {
            let text = format!("{:<width$}", self.search_buffer, width = SEARCH_MAX_LEN);
            screen.print(self.window, 0, y, &text, Color::Text.attr() | ATTR_REVERSE);
            screen.clear_line(self.window, y, SEARCH_MAX_LEN);
            y += 1;
        }
        if let Some(pending) = &state.watcher_pending {
            let cells = Self::row_cells(pending);
            let mut x = 0;
            let attrs = [
                Color::Address.attr(),
                Color::Text.attr(),
                Color::Address.attr(),
                Color::Text.attr(),
                Color::Text.attr(),
                Color::Comment.attr(),
            ];
            for (cell, &attr) in cells.iter().zip(attrs.iter()) {
                screen.print(self.window, x, y, cell, attr);
                x += cell.chars().count();
            }
            screen.clear_line(self.window, y, x);
        }
        self.grid.render(screen, self.window);
    }
}
