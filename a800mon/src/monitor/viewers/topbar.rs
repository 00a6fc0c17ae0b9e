// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::{AppMode, AppState};
use crate::monitor::ui::{Color, Screen, WindowId, ATTR_BOLD, ATTR_REVERSE};

/// Single-row header: app name, active mode, frame time and the most
/// recent RPC error.
pub struct TopBar {
    window: WindowId,
    last_snapshot: String,
}

impl TopBar {
    pub fn new(window: WindowId) -> TopBar {
        TopBar {
            window,
            last_snapshot: String::new(),
        }
    }
}

fn mode_badge(mode: AppMode) -> (&'static str, Color) {
    match mode {
        AppMode::Normal => (" NORMAL ", Color::ModeNormal),
        AppMode::Debug => (" DEBUG ", Color::ModeDebug),
        AppMode::Shutdown => (" SHUTDOWN ", Color::ModeShutdown),
    }
}

impl Component for TopBar {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let state = ctx.store.snapshot();
        let snapshot = format!(
            "{:?}|{}|{}|{}",
            state.active_mode, state.monitor_frame_time_ms, state.last_rpc_error, state.ui_frozen,
        );
        if snapshot == self.last_snapshot {
            return false;
        }
        self.last_snapshot = snapshot;
        true
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let (badge, color) = mode_badge(state.active_mode);
        let mut x = 0;
        screen.print(self.window, x, 0, " a800mon ", Color::Title.attr() | ATTR_BOLD);
        x += 9;
        screen.print(self.window, x, 0, badge, color.attr() | ATTR_REVERSE);
        x += badge.chars().count();
        if state.ui_frozen {
            screen.print(self.window, x, 0, " FROZEN ", Color::Error.attr() | ATTR_REVERSE);
            x += 8;
        }
        let frame = format!(" frame {}ms ", state.monitor_frame_time_ms);
        screen.print(self.window, x, 0, &frame, Color::Comment.attr());
        x += frame.chars().count();
        if !state.last_rpc_error.is_empty() {
            let error = format!(" {} ", state.last_rpc_error);
            screen.print(self.window, x, 0, &error, Color::Error.attr() | ATTR_REVERSE);
            x += error.chars().count();
        }
        screen.clear_line(self.window, 0, x);
    }
}
