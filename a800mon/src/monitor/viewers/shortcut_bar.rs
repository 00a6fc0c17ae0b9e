// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::rc::Rc;

use crate::monitor::app::{Component, Ctx};
use crate::monitor::shortcuts::ShortcutManager;
use crate::monitor::state::{AppMode, AppState};
use crate::monitor::ui::{Color, Screen, WindowId, ATTR_BOLD};

/// Bottom row listing the active mode layer's shortcuts plus the globals.
pub struct ShortcutBar {
    window: WindowId,
    shortcuts: Rc<ShortcutManager>,
    last_mode: Option<AppMode>,
}

impl ShortcutBar {
    pub fn new(window: WindowId, shortcuts: Rc<ShortcutManager>) -> ShortcutBar {
        ShortcutBar {
            window,
            shortcuts,
            last_mode: None,
        }
    }
}

impl Component for ShortcutBar {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let mode = ctx.store.snapshot().active_mode;
        if self.last_mode == Some(mode) {
            return false;
        }
        self.last_mode = Some(mode);
        true
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        let mut x = 0;
        if let Some(layer) = self.shortcuts.layer(state.active_mode) {
            let name = format!(" {} ", layer.name);
            screen.print(self.window, x, 0, &name, layer.color.attr() | ATTR_BOLD);
            x += name.chars().count() + 1;
            for shortcut in layer.list() {
                let text = format!("{} {}  ", shortcut.key_as_text(), shortcut.label);
                screen.print(self.window, x, 0, &text, Color::Text.attr());
                x += text.chars().count();
            }
        }
        for shortcut in self.shortcuts.globals() {
            let text = format!("{} {}  ", shortcut.key_as_text(), shortcut.label);
            screen.print(self.window, x, 0, &text, Color::Comment.attr());
            x += text.chars().count();
        }
        screen.clear_line(self.window, 0, x);
    }
}
