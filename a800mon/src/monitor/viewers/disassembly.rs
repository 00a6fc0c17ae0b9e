// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::disasm;
use a800mon_core::hex::{self, format_hex16};

use super::{disasm_to_row, opcode_columns};
use crate::monitor::actions::Action;
use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::{AppState, DisasmRow};
use crate::monitor::ui::{
    Color, Grid, Screen, WindowId, ATTR_BOLD, ATTR_REVERSE, KEY_BACKSPACE, KEY_DOWN, KEY_END,
    KEY_ENTER, KEY_ESC, KEY_HOME, KEY_PAGE_DOWN, KEY_PAGE_UP, KEY_UP,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Nav {
    Home,
    End,
    Down(usize),
    Up(usize),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum InputMode {
    None,
    Addr,
    Edit,
}

/// Scrolling disassembly window over live memory. In follow mode the window
/// recenters whenever PC leaves it; manual navigation probes backwards with
/// growing lookbacks since 6502 code has no fixed instruction width.
pub struct DisassemblyViewer {
    window: WindowId,
    grid: Grid,
    current_addr: Option<u16>,
    selected_addr: Option<u16>,
    selected_hint: Option<usize>,
    input_mode: InputMode,
    addr_buffer: String,
    replace_on_next: bool,
    edit_addr: u16,
    edit_text: String,
    edit_bytes: Vec<u8>,
    pending_nav: Option<Nav>,
    pending_write: Option<(u16, Vec<u8>)>,
    last_snapshot: String,
    synced_follow: Option<bool>,
}

impl DisassemblyViewer {
    pub fn new(window: WindowId) -> DisassemblyViewer {
        let mut grid = Grid::new();
        grid.add_column(1, Color::Mnemonic.attr());
        grid.add_column(5, Color::Address.attr());
        grid.add_column(2, Color::Text.attr());
        grid.add_column(2, Color::Text.attr());
        grid.add_column(2, Color::Text.attr());
        grid.add_column(4, Color::Mnemonic.attr());
        grid.add_column(14, Color::Text.attr());
        grid.add_column(0, Color::Comment.attr());
        DisassemblyViewer {
            window,
            grid,
            current_addr: None,
            selected_addr: None,
            selected_hint: None,
            input_mode: InputMode::None,
            addr_buffer: String::new(),
            replace_on_next: false,
            edit_addr: 0,
            edit_text: String::new(),
            edit_bytes: Vec::new(),
            pending_nav: None,
            pending_write: None,
            last_snapshot: String::new(),
            synced_follow: None,
        }
    }

    fn fetch_rows(
        &self,
        ctx: &Ctx,
        addr: u16,
        height: usize,
    ) -> Result<Vec<disasm::DecodedInstruction>, ()> {
        let read_len = (height * 3).max(3);
        let data = ctx
            .rpc
            .read_memory_chunked(addr, read_len, 0)
            .map_err(|_| ())?;
        Ok(disasm::decode_linear(addr, &data))
    }

    fn apply_pending_write(&mut self, ctx: &mut Ctx) {
        if let Some((addr, data)) = self.pending_write.take() {
            if data.is_empty() {
                return;
            }
            if ctx.rpc.write_memory(addr, &data).is_ok() {
                self.last_snapshot.clear();
            }
        }
    }

    fn apply_pending_nav(&mut self, ctx: &mut Ctx, height: usize) -> Result<(), ()> {
        let nav = match self.pending_nav.take() {
            Some(nav) => nav,
            None => return Ok(()),
        };
        let current = self.current_addr.unwrap_or(0);
        let next = match nav {
            Nav::Home => 0,
            Nav::End => self.find_end_start(ctx, height)?,
            Nav::Down(steps) => {
                let rows = ctx.store.snapshot().disassembly_rows;
                let mut addr = current;
                if !rows.is_empty() {
                    let idx = steps.min(rows.len() - 1);
                    addr = rows[idx].addr;
                }
                let end_start = self.find_end_start(ctx, height)?;
                addr.min(end_start)
            }
            Nav::Up(steps) => self.find_prev_start_n(ctx, current, steps)?,
        };
        self.current_addr = Some(next);
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyAddr(next));
        Ok(())
    }

    /// Start address for the last full window before the top of memory,
    /// probing ever-larger lookbacks until a decode yields enough rows.
    fn find_end_start(&self, ctx: &Ctx, height: usize) -> Result<u16, ()> {
        let target_row = height.saturating_sub(1);
        let lookbacks: [usize; 11] = [
            64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65535,
        ];
        for &back in &lookbacks {
            let low = 0xFFFFusize.saturating_sub(back);
            let length = (0xFFFF - low) + 3;
            let data = ctx
                .rpc
                .read_memory_chunked(low as u16, length, 0)
                .map_err(|_| ())?;
            let addrs: Vec<u16> = disasm::decode_linear(low as u16, &data)
                .iter()
                .map(|ins| ins.addr)
                .collect();
            if addrs.is_empty() {
                if low == 0 {
                    return Ok(0);
                }
                continue;
            }
            if addrs.len() > target_row {
                return Ok(addrs[addrs.len() - (target_row + 1)]);
            }
            if low == 0 {
                return Ok(addrs[0]);
            }
        }
        Ok(0xFFFF)
    }

    fn find_prev_start_n(&self, ctx: &Ctx, addr: u16, steps: usize) -> Result<u16, ()> {
        if addr == 0 || steps == 0 {
            return Ok(addr);
        }
        let lookbacks: [usize; 11] = [
            steps * 3 + 16,
            steps * 6 + 32,
            steps * 12 + 64,
            steps * 24 + 128,
            1024,
            2048,
            4096,
            8192,
            16384,
            32768,
            65535,
        ];
        for &back in &lookbacks {
            let low = usize::from(addr).saturating_sub(back);
            let length = usize::from(addr) - low + 3;
            let data = ctx
                .rpc
                .read_memory_chunked(low as u16, length, 0)
                .map_err(|_| ())?;
            let prev: Vec<u16> = disasm::decode_linear(low as u16, &data)
                .iter()
                .map(|ins| ins.addr)
                .filter(|&a| a < addr)
                .collect();
            if prev.is_empty() {
                if low == 0 {
                    return Ok(0);
                }
                continue;
            }
            if prev.len() >= steps {
                return Ok(prev[prev.len() - steps]);
            }
            if low == 0 {
                return Ok(prev[0]);
            }
        }
        Ok(addr)
    }

    fn visible_count(&self, state: &AppState, height: usize) -> usize {
        state.disassembly_rows.len().min(height)
    }

    fn current_selected_row(&self, state: &AppState, height: usize) -> Option<usize> {
        let visible = self.visible_count(state, height);
        if visible == 0 {
            return None;
        }
        if let Some(addr) = self.selected_addr {
            if let Some(idx) = state
                .disassembly_rows
                .iter()
                .position(|row| row.addr == addr)
            {
                return Some(idx.min(visible - 1));
            }
        }
        if let Some(hint) = self.selected_hint {
            return Some(hint.min(visible - 1));
        }
        Some(0)
    }

    /// Move the selection bar; false when the edge was hit and the window
    /// itself has to scroll.
    fn move_selected(&mut self, state: &AppState, height: usize, delta: isize) -> bool {
        let visible = self.visible_count(state, height);
        if visible == 0 {
            self.selected_addr = None;
            self.selected_hint = None;
            return false;
        }
        let current = match self.current_selected_row(state, height) {
            Some(current) => current,
            None => return false,
        };
        let next = (current as isize + delta).max(0).min(visible as isize - 1) as usize;
        if next != current {
            self.selected_hint = Some(next);
            self.selected_addr = Some(state.disassembly_rows[next].addr);
            return true;
        }
        self.selected_hint = Some(current);
        self.selected_addr = None;
        false
    }

    fn open_addr_input(&mut self, ctx: &mut Ctx) {
        let state = ctx.store.snapshot();
        let addr = self
            .current_addr
            .or(state.disassembly_addr)
            .unwrap_or(state.cpu.pc);
        self.addr_buffer = format_hex16(addr);
        self.replace_on_next = true;
        self.input_mode = InputMode::Addr;
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetInputFocus(true));
    }

    fn open_edit_input(&mut self, ctx: &mut Ctx, height: usize) -> bool {
        let state = ctx.store.snapshot();
        let row_idx = match self.current_selected_row(&state, height) {
            Some(idx) if idx < state.disassembly_rows.len() => idx,
            _ => return false,
        };
        let row = &state.disassembly_rows[row_idx];
        let text = if row.operand.is_empty() {
            row.mnemonic.clone()
        } else {
            format!("{} {}", row.mnemonic, row.operand)
        };
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyFollow(false));
        self.selected_hint = Some(row_idx);
        self.selected_addr = Some(row.addr);
        self.edit_addr = row.addr;
        self.edit_text = text;
        self.reassemble_edit();
        self.input_mode = InputMode::Edit;
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetInputFocus(true));
        true
    }

    fn reassemble_edit(&mut self) {
        let statement = self.edit_text.trim();
        self.edit_bytes = if statement.is_empty() {
            Vec::new()
        } else {
            disasm::assemble_one(self.edit_addr, &statement.to_uppercase()).unwrap_or_default()
        };
    }

    fn close_input(&mut self, ctx: &mut Ctx) {
        self.input_mode = InputMode::None;
        self.addr_buffer.clear();
        self.replace_on_next = false;
        self.edit_text.clear();
        self.edit_bytes.clear();
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetInputFocus(false));
    }

    fn follow_off(&mut self, ctx: &mut Ctx) {
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyFollow(false));
    }

    fn commit_addr_input(&mut self, ctx: &mut Ctx) {
        let text = self.addr_buffer.trim().to_string();
        if text.is_empty() {
            return;
        }
        let addr = match hex::parse_hex(&text) {
            Ok(addr) => addr,
            Err(_) => return,
        };
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyFollow(false));
        self.current_addr = Some(addr);
        self.selected_addr = Some(addr);
        self.selected_hint = Some(0);
        self.pending_nav = None;
        self.last_snapshot.clear();
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyAddr(addr));
    }
}

impl Component for DisassemblyViewer {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, screen: &mut Screen) -> bool {
        let state = ctx.store.snapshot();
        if self.synced_follow != Some(state.disassembly_follow) {
            self.synced_follow = Some(state.disassembly_follow);
            screen.set_tag_active(self.window, "follow", state.disassembly_follow);
        }
        if !state.disassembly_enabled {
            if !state.disassembly_rows.is_empty() {
                ctx.dispatcher
                    .dispatch(ctx.store, Action::SetDisassemblyRows(Vec::new()));
                return true;
            }
            return false;
        }
        let height = screen.window(self.window).inner_height();
        if height == 0 {
            return false;
        }
        self.apply_pending_write(ctx);

        if self.current_addr.is_none() {
            let addr = state.disassembly_addr.unwrap_or(state.cpu.pc);
            self.current_addr = Some(addr);
            self.selected_addr = Some(addr);
            self.selected_hint = Some(0);
        } else if !state.disassembly_follow {
            if let Some(addr) = state.disassembly_addr {
                if Some(addr) != self.current_addr {
                    self.current_addr = Some(addr);
                }
            }
        }
        if self.apply_pending_nav(ctx, height).is_err() {
            return false;
        }

        let mut addr = self.current_addr.unwrap_or(0);
        let mut decoded = match self.fetch_rows(ctx, addr, height) {
            Ok(decoded) => decoded,
            Err(_) => return false,
        };
        if state.disassembly_follow {
            let pc = state.cpu.pc;
            let row_idx = decoded.iter().position(|ins| ins.addr == pc);
            match row_idx {
                None => {
                    addr = pc;
                    decoded = match self.fetch_rows(ctx, addr, height) {
                        Ok(decoded) => decoded,
                        Err(_) => return false,
                    };
                }
                Some(idx) if idx >= height => {
                    let start = idx - (height - 1);
                    addr = decoded[start].addr;
                    decoded = match self.fetch_rows(ctx, addr, height) {
                        Ok(decoded) => decoded,
                        Err(_) => return false,
                    };
                }
                Some(_) => {}
            }
            self.current_addr = Some(addr);
            self.selected_addr = None;
            self.selected_hint = None;
        }

        let rows: Vec<DisasmRow> = decoded.iter().map(disasm_to_row).collect();
        let snapshot = build_snapshot(state.cpu.pc, addr, &rows);
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyRows(rows));
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDisassemblyAddr(addr));
        if snapshot == self.last_snapshot {
            return false;
        }
        self.last_snapshot = snapshot;
        true
    }

    fn handle_input(&mut self, ctx: &mut Ctx, screen: &mut Screen, key: i32) -> bool {
        let state = ctx.store.snapshot();
        let height = screen.window(self.window).inner_height();
        match key {
            key if key == ' ' as i32 || key == 'f' as i32 || key == 'F' as i32 => {
                ctx.dispatcher.dispatch(
                    ctx.store,
                    Action::SetDisassemblyFollow(!state.disassembly_follow),
                );
                true
            }
            KEY_HOME => {
                self.follow_off(ctx);
                self.selected_hint = Some(0);
                self.selected_addr = None;
                self.pending_nav = Some(Nav::Home);
                true
            }
            KEY_END => {
                self.follow_off(ctx);
                self.selected_hint = Some(height.saturating_sub(1));
                self.selected_addr = None;
                self.pending_nav = Some(Nav::End);
                true
            }
            KEY_DOWN => {
                self.follow_off(ctx);
                if !self.move_selected(&state, height, 1) {
                    self.pending_nav = Some(Nav::Down(1));
                }
                true
            }
            KEY_UP => {
                self.follow_off(ctx);
                if !self.move_selected(&state, height, -1) {
                    self.pending_nav = Some(Nav::Up(1));
                }
                true
            }
            KEY_PAGE_DOWN => {
                self.follow_off(ctx);
                let steps = height.saturating_sub(1).max(1);
                if !self.move_selected(&state, height, steps as isize) {
                    self.pending_nav = Some(Nav::Down(steps));
                }
                true
            }
            KEY_PAGE_UP => {
                self.follow_off(ctx);
                let steps = height.saturating_sub(1).max(1);
                if !self.move_selected(&state, height, -(steps as isize)) {
                    self.pending_nav = Some(Nav::Up(steps));
                }
                true
            }
            key if key == KEY_ENTER || key == 13 => self.open_edit_input(ctx, height),
            key if key == '/' as i32 => {
                self.open_addr_input(ctx);
                true
            }
            _ => false,
        }
    }

    fn handle_focus_input(&mut self, ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        match self.input_mode {
            InputMode::Addr => {
                if key == KEY_ESC {
                    self.close_input(ctx);
                    return true;
                }
                if key == KEY_ENTER || key == 13 {
                    self.commit_addr_input(ctx);
                    self.close_input(ctx);
                    return true;
                }
                if key == KEY_BACKSPACE || key == 127 || key == 8 {
                    self.replace_on_next = false;
                    self.addr_buffer.pop();
                    return true;
                }
                let ch = match char_of(key) {
                    Some(ch) if ch.is_ascii_hexdigit() => ch.to_ascii_uppercase(),
                    _ => return true,
                };
                if self.replace_on_next {
                    self.addr_buffer.clear();
                    self.replace_on_next = false;
                }
                if self.addr_buffer.chars().count() < 4 {
                    self.addr_buffer.push(ch);
                }
                true
            }
            InputMode::Edit => {
                if key == KEY_ESC {
                    self.close_input(ctx);
                    return true;
                }
                if key == KEY_ENTER || key == 13 {
                    if !self.edit_bytes.is_empty() {
                        self.pending_write = Some((self.edit_addr, self.edit_bytes.clone()));
                        self.selected_addr = Some(self.edit_addr);
                        self.selected_hint = None;
                    }
                    self.close_input(ctx);
                    return true;
                }
                if key == KEY_BACKSPACE || key == 127 || key == 8 {
                    self.edit_text.pop();
                    self.reassemble_edit();
                    return true;
                }
                if let Some(ch) = char_of(key) {
                    self.edit_text.push(ch);
                    self.reassemble_edit();
                }
                true
            }
            InputMode::None => false,
        }
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let height = screen.window(self.window).inner_height();
        let rows: Vec<Vec<String>> = state
            .disassembly_rows
            .iter()
            .map(|row| {
                let (op1, op2, op3) = opcode_columns(&row.raw_text);
                let marker = if row.addr == state.cpu.pc { "▶" } else { " " };
                vec![
                    marker.to_string(),
                    format!("{}:", format_hex16(row.addr)),
                    op1,
                    op2,
                    op3,
                    row.mnemonic.clone(),
                    row.operand.clone(),
                    row.comment.clone(),
                ]
            })
            .collect();
        self.grid.set_rows(rows);
        self.grid
            .set_selected(self.current_selected_row(state, height));
        self.grid.render(screen, self.window);

        match self.input_mode {
            InputMode::Addr => {
                let text = format!("{:0>4}", self.addr_buffer);
                screen.print(
                    self.window,
                    0,
                    0,
                    &format!("{}  ", text),
                    Color::Address.attr() | ATTR_REVERSE,
                );
            }
            InputMode::Edit => {
                let valid = if self.edit_bytes.is_empty() { "?" } else { " " };
                let line = format!("{}: {}{}", format_hex16(self.edit_addr), self.edit_text, valid);
                screen.print(
                    self.window,
                    0,
                    0,
                    &line,
                    Color::Mnemonic.attr() | ATTR_REVERSE | ATTR_BOLD,
                );
            }
            InputMode::None => {}
        }
    }
}

fn char_of(key: i32) -> Option<char> {
    if (32..127).contains(&key) {
        Some(key as u8 as char)
    } else {
        None
    }
}

fn build_snapshot(pc: u16, addr: u16, rows: &[DisasmRow]) -> String {
    let mut parts = vec![format_hex16(pc), format_hex16(addr)];
    for row in rows {
        let target = row
            .flow_target
            .map_or("-".to_string(), |target| format_hex16(target));
        parts.push(format!(
            "{}:{}:{}:{}",
            format_hex16(row.addr),
            row.raw_text,
            row.asm_text,
            target
        ));
    }
    parts.join("|")
}
