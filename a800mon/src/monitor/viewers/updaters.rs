// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use crate::monitor::app::{Component, Ctx};
use crate::monitor::actions::Action;
use crate::monitor::ui::{Screen, WindowId};

/// Re-syncs the Normal/Debug mode whenever the paused flag flips.
pub struct AppModeUpdater {
    last_paused: Option<bool>,
}

impl AppModeUpdater {
    pub fn new() -> AppModeUpdater {
        AppModeUpdater { last_paused: None }
    }
}

impl Component for AppModeUpdater {
    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let paused = ctx.store.snapshot().paused;
        if self.last_paused == Some(paused) {
            return false;
        }
        self.last_paused = Some(paused);
        ctx.dispatcher.dispatch(ctx.store, Action::SyncMode);
        true
    }
}

/// Shows or hides the breakpoints window as the capability flag changes;
/// without MONITOR_BREAKPOINTS the window stays hidden and its viewer's
/// update is a no-op.
pub struct BreakpointsWindowUpdater {
    window: WindowId,
    last_visible: Option<bool>,
}

impl BreakpointsWindowUpdater {
    pub fn new(window: WindowId) -> BreakpointsWindowUpdater {
        BreakpointsWindowUpdater {
            window,
            last_visible: None,
        }
    }
}

impl Component for BreakpointsWindowUpdater {
    fn update(&mut self, ctx: &mut Ctx, screen: &mut Screen) -> bool {
        let visible = ctx.store.snapshot().breakpoints_supported;
        if self.last_visible == Some(visible) {
            return false;
        }
        self.last_visible = Some(visible);
        screen.set_visible(self.window, visible);
        screen.rebuild();
        true
    }
}
