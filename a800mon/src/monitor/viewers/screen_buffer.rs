// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::time::{Duration, Instant};

use a800mon_core::atascii;
use a800mon_core::dlist::MemoryMapper;
use a800mon_core::hex::format_hex16;

use crate::monitor::actions::Action;
use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::{AppState, ScreenRow};
use crate::monitor::ui::{Color, Screen, WindowId};

const RPC_THROTTLE: Duration = Duration::from_millis(100);
const FETCH_CHUNK: usize = 0x400;

struct RangeIndex {
    start: usize,
    end: usize,
    offset: usize,
}

/// Reassembles the visible framebuffer from the display list: one chunked
/// read per fetch range, then row slices out of the combined buffer.
/// Rate-limited so a busy display list does not flood the socket.
pub struct ScreenBufferInspector {
    window: WindowId,
    last_snapshot: u64,
    next_rpc_at: Option<Instant>,
    synced_atascii: Option<bool>,
}

impl ScreenBufferInspector {
    pub fn new(window: WindowId) -> ScreenBufferInspector {
        ScreenBufferInspector {
            window,
            last_snapshot: 0,
            next_rpc_at: None,
            synced_atascii: None,
        }
    }
}

impl Component for ScreenBufferInspector {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, screen: &mut Screen) -> bool {
        let state = ctx.store.snapshot();
        let mut changed = false;
        if self.synced_atascii != Some(state.use_atascii) {
            self.synced_atascii = Some(state.use_atascii);
            screen.set_tag_active(self.window, "atascii", state.use_atascii);
            screen.set_tag_active(self.window, "ascii", !state.use_atascii);
            changed = true;
        }
        let now = Instant::now();
        if let Some(next) = self.next_rpc_at {
            if now < next {
                return changed;
            }
        }
        self.next_rpc_at = Some(now + RPC_THROTTLE);

        let mapper = MemoryMapper::new(&state.dlist, state.dmactl, FETCH_CHUNK);
        let (fetch_ranges, row_slices) = mapper.plan();
        if fetch_ranges.is_empty() {
            if self.last_snapshot != 0 {
                self.last_snapshot = 0;
                ctx.dispatcher
                    .dispatch(ctx.store, Action::SetScreenRows(Vec::new()));
                return true;
            }
            return changed;
        }
        let mut buffer = Vec::with_capacity(8192);
        let mut index = Vec::with_capacity(fetch_ranges.len());
        for range in &fetch_ranges {
            let length = range.end - range.start;
            if length == 0 {
                continue;
            }
            let chunk = match ctx
                .rpc
                .read_memory_chunked((range.start & 0xFFFF) as u16, length, FETCH_CHUNK)
            {
                Ok(chunk) => chunk,
                Err(_) => return changed,
            };
            index.push(RangeIndex {
                start: range.start,
                end: range.end,
                offset: buffer.len(),
            });
            buffer.extend_from_slice(&chunk);
        }
        let mut rows = Vec::with_capacity(row_slices.len());
        for slice in &row_slices {
            if let Some(data) = read_row(&buffer, &index, usize::from(slice.addr), slice.length) {
                rows.push(ScreenRow {
                    addr: slice.addr,
                    data,
                });
            }
        }
        let snapshot = rows_fingerprint(&rows);
        if snapshot == self.last_snapshot {
            return changed;
        }
        self.last_snapshot = snapshot;
        ctx.dispatcher
            .dispatch(ctx.store, Action::SetScreenRows(rows));
        true
    }

    fn handle_input(&mut self, ctx: &mut Ctx, _screen: &mut Screen, key: i32) -> bool {
        if key == ' ' as i32 || key == 'a' as i32 || key == 'A' as i32 {
            let enabled = !ctx.store.snapshot().use_atascii;
            ctx.dispatcher
                .dispatch(ctx.store, Action::SetAtascii(enabled));
            return true;
        }
        false
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let content_width = screen.window(self.window).inner_width().saturating_sub(7);
        let height = screen.window(self.window).inner_height();
        let mut draw_width = 0;
        for row in state.screen_rows.iter().take(height) {
            draw_width = draw_width.max(row.data.len().min(content_width));
        }
        for (y, row) in state.screen_rows.iter().take(height).enumerate() {
            let row_len = row.data.len().min(draw_width);
            let left_pad = (draw_width - row_len) / 2;
            let right_pad = draw_width - row_len - left_pad;
            let mut content = "·".repeat(left_pad);
            content.push_str(&render_screen_text(&row.data[..row_len], state.use_atascii));
            content.push_str(&"·".repeat(right_pad));
            let addr = format!("{}: ", format_hex16(row.addr));
            screen.print(self.window, 0, y, &addr, Color::Address.attr());
            screen.print(self.window, 7, y, &content, Color::Text.attr());
            screen.clear_line(self.window, y, 7 + content.chars().count());
        }
        screen.clear_to_bottom(self.window, state.screen_rows.len().min(height));
    }
}

fn read_row(buffer: &[u8], index: &[RangeIndex], addr: usize, length: usize) -> Option<Vec<u8>> {
    if length == 0 {
        return None;
    }
    let mut out = Vec::with_capacity(length);
    let mut cur = addr;
    let mut remaining = length;
    while remaining > 0 {
        let range = index.iter().find(|it| it.start <= cur && cur < it.end)?;
        let take = (range.end - cur).min(remaining);
        let from = range.offset + (cur - range.start);
        let to = from + take;
        if to > buffer.len() {
            return None;
        }
        out.extend_from_slice(&buffer[from..to]);
        cur += take;
        remaining -= take;
    }
    Some(out)
}

fn render_screen_text(data: &[u8], use_atascii: bool) -> String {
    if !use_atascii {
        return data
            .iter()
            .map(|&byte| {
                let v = byte & 0x7F;
                if (32..=126).contains(&v) {
                    v as char
                } else {
                    '.'
                }
            })
            .collect();
    }
    data.iter()
        .map(|&byte| {
            let code = atascii::screen_to_atascii(byte);
            atascii::lookup_printable(code & 0x7F)
                .chars()
                .next()
                .unwrap_or('.')
        })
        .collect()
}

// FNV-1a over the row set; cheap change detection between ticks.
fn rows_fingerprint(rows: &[ScreenRow]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut eat = |byte: u8| {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    };
    for &byte in &(rows.len() as u16).to_le_bytes() {
        eat(byte);
    }
    for row in rows {
        for &byte in &row.addr.to_le_bytes() {
            eat(byte);
        }
        for &byte in &(row.data.len() as u16).to_le_bytes() {
            eat(byte);
        }
        for &byte in &row.data {
            eat(byte);
        }
    }
    hash.max(1)
}
