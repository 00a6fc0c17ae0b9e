// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::dlist::{self, DMACTL_ADDR, DMACTL_HW_ADDR, DLPTRS_ADDR};
use a800mon_core::hex::format_hex16;

use crate::monitor::actions::Action;
use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::AppState;
use crate::monitor::ui::{Color, Grid, Screen, WindowId, KEY_LEFT, KEY_RIGHT};

/// Fetches and decodes the ANTIC program each tick. Renders the compacted
/// list, or the coalesced screen segments when inspect mode is on.
pub struct DisplayListViewer {
    window: WindowId,
    grid: Grid,
    last_snapshot: String,
}

impl DisplayListViewer {
    pub fn new(window: WindowId) -> DisplayListViewer {
        let mut grid = Grid::new();
        grid.add_column(5, Color::Address.attr());
        grid.add_column(0, Color::Text.attr());
        DisplayListViewer {
            window,
            grid,
            last_snapshot: String::new(),
        }
    }
}

impl Component for DisplayListViewer {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let start_addr = match ctx.rpc.read_vector(DLPTRS_ADDR) {
            Ok(addr) => addr,
            Err(_) => return false,
        };
        let dump = match ctx.rpc.read_display_list() {
            Ok(dump) => dump,
            Err(_) => return false,
        };
        let mut dmactl = match ctx.rpc.read_byte(DMACTL_ADDR) {
            Ok(dmactl) => dmactl,
            Err(_) => return false,
        };
        if dmactl & 0x03 == 0 {
            if let Ok(hw) = ctx.rpc.read_byte(DMACTL_HW_ADDR) {
                dmactl = hw;
            }
        }
        let decoded = dlist::decode(start_addr, &dump);
        let mut snapshot = format!("{:04X}|{:02X}|{}", start_addr, dmactl, decoded.entries.len());
        if let (Some(first), Some(last)) = (decoded.entries.first(), decoded.entries.last()) {
            snapshot.push_str(&format!(
                "|{:02X}-{:04X}|{:02X}-{:04X}",
                first.command, first.arg, last.command, last.arg
            ));
        }
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetDList(decoded, dmactl));
        if snapshot == self.last_snapshot {
            return false;
        }
        self.last_snapshot = snapshot;
        true
    }

    fn handle_input(&mut self, ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        let state = ctx.store.snapshot();
        match key {
            key if key == 'i' as i32 || key == 'I' as i32 => {
                ctx.dispatcher
                    .dispatch(ctx.store, Action::SetDListInspect(!state.dlist_inspect));
                true
            }
            KEY_RIGHT if state.dlist_inspect => {
                ctx.dispatcher.dispatch(ctx.store, Action::DListNext);
                true
            }
            KEY_LEFT if state.dlist_inspect => {
                ctx.dispatcher.dispatch(ctx.store, Action::DListPrev);
                true
            }
            key => self.grid.handle_input(key),
        }
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        if state.dlist_inspect {
            self.render_segments(state, screen);
            return;
        }
        let rows: Vec<Vec<String>> = state
            .dlist
            .compacted()
            .iter()
            .map(|compacted| {
                let description = if compacted.count > 1 {
                    format!("{}x {}", compacted.count, compacted.entry.description())
                } else {
                    compacted.entry.description()
                };
                vec![
                    format!("{}:", format_hex16(compacted.entry.addr)),
                    description,
                ]
            })
            .collect();
        let row_count = rows.len();
        self.grid.set_rows(rows);
        if row_count > 0 && self.grid.selected().is_none() {
            self.grid.set_selected(Some(0));
        }
        self.grid.render(screen, self.window);
    }
}

impl DisplayListViewer {
    fn render_segments(&mut self, state: &AppState, screen: &mut Screen) {
        let segments = state.dlist.screen_segments(state.dmactl);
        let selected = state
            .dlist_selected_region
            .map(|idx| idx.min(segments.len().saturating_sub(1)));
        let rows: Vec<Vec<String>> = segments
            .iter()
            .map(|segment| {
                vec![
                    format!("{}:", format_hex16(segment.start as u16)),
                    format!(
                        "{}-{} MODE {} ({} bytes)",
                        format_hex16(segment.start as u16),
                        format_hex16(segment.end.saturating_sub(1) as u16),
                        segment.mode,
                        segment.end - segment.start,
                    ),
                ]
            })
            .collect();
        self.grid.set_rows(rows);
        self.grid.set_selected(selected);
        self.grid.render(screen, self.window);
    }
}
