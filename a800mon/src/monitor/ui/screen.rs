// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use super::{Attr, Canvas, Color, ATTR_BOLD, ATTR_REVERSE};

pub type WindowId = usize;

struct Tag {
    label: String,
    key: String,
    active: bool,
}

/// A rectangle on the screen. Bordered windows lose one cell on each side;
/// the top and bottom bars are borderless single-row windows.
pub struct Window {
    title: String,
    tags: Vec<Tag>,
    hotkey: Option<char>,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    bordered: bool,
    visible: bool,
}

impl Window {
    fn new(title: &str, bordered: bool) -> Window {
        Window {
            title: title.to_string(),
            tags: Vec::new(),
            hotkey: None,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            bordered,
            visible: true,
        }
    }

    pub fn inner_width(&self) -> usize {
        let border = if self.bordered { 2 } else { 0 };
        usize::from(self.width.saturating_sub(border))
    }

    pub fn inner_height(&self) -> usize {
        let border = if self.bordered { 2 } else { 0 };
        usize::from(self.height.saturating_sub(border))
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn reshape(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
    }
}

pub type LayoutFn = Box<dyn Fn(&mut Screen, u16, u16)>;

/// Owns every window and the canvas. Components address windows by id and
/// draw in window-local cells; the screen adds borders, titles, tags and
/// the focus highlight.
pub struct Screen {
    canvas: Box<dyn Canvas>,
    windows: Vec<Window>,
    focus_order: Vec<WindowId>,
    focused: Option<WindowId>,
    layout: Option<LayoutFn>,
}

impl Screen {
    pub fn new(canvas: Box<dyn Canvas>) -> Screen {
        Screen {
            canvas,
            windows: Vec::new(),
            focus_order: Vec::new(),
            focused: None,
            layout: None,
        }
    }

    pub fn add_window(&mut self, title: &str, bordered: bool) -> WindowId {
        self.windows.push(Window::new(title, bordered));
        self.windows.len() - 1
    }

    pub fn window(&self, id: WindowId) -> &Window {
        &self.windows[id]
    }

    pub fn window_mut(&mut self, id: WindowId) -> &mut Window {
        &mut self.windows[id]
    }

    pub fn add_tag(&mut self, id: WindowId, label: &str, key: &str, active: bool) {
        self.windows[id].tags.push(Tag {
            label: label.to_string(),
            key: key.to_string(),
            active,
        });
    }

    pub fn set_tag_active(&mut self, id: WindowId, key: &str, active: bool) {
        for tag in &mut self.windows[id].tags {
            if tag.key == key {
                tag.active = active;
            }
        }
    }

    pub fn set_hotkey(&mut self, id: WindowId, key: char) {
        self.windows[id].hotkey = Some(key.to_ascii_lowercase());
    }

    /// The window whose hotkey letter matches, for focus jumps.
    pub fn window_by_hotkey(&self, key: i32) -> Option<WindowId> {
        if !(32..127).contains(&key) {
            return None;
        }
        let ch = (key as u8 as char).to_ascii_lowercase();
        self.windows
            .iter()
            .position(|window| window.visible && window.hotkey == Some(ch))
    }

    pub fn set_visible(&mut self, id: WindowId, visible: bool) {
        self.windows[id].visible = visible;
        if !visible && self.focused == Some(id) {
            self.focused = None;
        }
    }

    pub fn set_focus_order(&mut self, order: Vec<WindowId>) {
        self.focus_order = order;
    }

    pub fn set_layout(&mut self, layout: LayoutFn) {
        self.layout = Some(layout);
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn focus(&mut self, id: Option<WindowId>) {
        self.focused = id;
    }

    pub fn focus_next(&mut self) {
        self.cycle_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.cycle_focus(-1);
    }

    fn cycle_focus(&mut self, step: isize) {
        let order: Vec<WindowId> = self
            .focus_order
            .iter()
            .copied()
            .filter(|&id| self.windows[id].visible)
            .collect();
        if order.is_empty() {
            self.focused = None;
            return;
        }
        let current = self
            .focused
            .and_then(|id| order.iter().position(|&o| o == id));
        let next = match current {
            Some(idx) => {
                (idx as isize + step).rem_euclid(order.len() as isize) as usize
            }
            None => {
                if step > 0 {
                    0
                } else {
                    order.len() - 1
                }
            }
        };
        self.focused = Some(order[next]);
    }

    pub fn size(&self) -> (u16, u16) {
        self.canvas.size()
    }

    pub fn poll_key(&mut self, timeout: std::time::Duration) -> i32 {
        self.canvas.poll_key(timeout)
    }

    /// Re-run the layout and redraw all chrome; called on startup and on
    /// every resize or visibility change.
    pub fn rebuild(&mut self) {
        let (width, height) = self.canvas.size();
        if let Some(layout) = self.layout.take() {
            layout(self, width, height);
            self.layout = Some(layout);
        }
        self.canvas.clear();
        for id in 0..self.windows.len() {
            if self.windows[id].visible {
                self.draw_chrome(id);
            }
        }
    }

    pub fn update(&mut self) {
        for id in 0..self.windows.len() {
            if self.windows[id].visible && self.windows[id].bordered {
                self.draw_chrome(id);
            }
        }
        if let Err(err) = self.canvas.present() {
            warn!(target: "ui", "present failed: {}", err);
        }
    }

    fn draw_chrome(&mut self, id: WindowId) {
        let window = &self.windows[id];
        if !window.bordered || window.width < 2 || window.height < 2 {
            return;
        }
        let (x, y, width, height) = (window.x, window.y, window.width, window.height);
        let focused = self.focused == Some(id);
        let border_attr = if focused {
            Color::Title.attr() | ATTR_BOLD
        } else {
            Color::Border.attr()
        };
        let horizontal = "─".repeat(usize::from(width) - 2);
        self.canvas
            .print(x, y, &format!("┌{}┐", horizontal), border_attr);
        for row in 1..height - 1 {
            self.canvas.print(x, y + row, "│", border_attr);
            self.canvas.print(x + width - 1, y + row, "│", border_attr);
        }
        self.canvas
            .print(x, y + height - 1, &format!("└{}┘", horizontal), border_attr);

        let window = &self.windows[id];
        let mut title = window.title.clone();
        if let Some(hotkey) = window.hotkey {
            title = format!("{} [{}]", title, hotkey.to_ascii_uppercase());
        }
        let title_attr = if focused {
            Color::Title.attr() | ATTR_BOLD | ATTR_REVERSE
        } else {
            Color::Title.attr()
        };
        self.canvas.print(x + 2, y, &format!(" {} ", title), title_attr);

        let tags: Vec<(String, bool)> = window
            .tags
            .iter()
            .map(|tag| (tag.label.clone(), tag.active))
            .collect();
        let mut tag_x = x + width;
        for (label, active) in tags.iter().rev() {
            let text = format!(" {} ", label);
            let len = text.chars().count() as u16 + 1;
            if tag_x < x + len + 2 {
                break;
            }
            tag_x -= len;
            let attr = if *active {
                Color::Tag.attr() | ATTR_REVERSE
            } else {
                Color::Tag.attr() | super::ATTR_DIM
            };
            self.canvas.print(tag_x, y, &text, attr);
        }
    }

    // -- Window-local drawing used by viewers

    pub fn print(&mut self, id: WindowId, x: usize, y: usize, text: &str, attr: Attr) {
        let window = &self.windows[id];
        if !window.visible || y >= window.inner_height() || x >= window.inner_width() {
            return;
        }
        let border = if window.bordered { 1 } else { 0 };
        let max = window.inner_width() - x;
        let clipped: String = text.chars().take(max).collect();
        let (cx, cy) = (window.x + border + x as u16, window.y + border + y as u16);
        self.canvas.print(cx, cy, &clipped, attr);
    }

    pub fn clear_line(&mut self, id: WindowId, y: usize, from_x: usize) {
        let window = &self.windows[id];
        if !window.visible || y >= window.inner_height() || from_x >= window.inner_width() {
            return;
        }
        let blanks = " ".repeat(window.inner_width() - from_x);
        self.print(id, from_x, y, &blanks, Color::Text.attr());
    }

    pub fn clear_to_bottom(&mut self, id: WindowId, from_y: usize) {
        for y in from_y..self.windows[id].inner_height() {
            self.clear_line(id, y, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeState {
        cells: Vec<(u16, u16, String)>,
    }

    struct FakeCanvas {
        state: Rc<RefCell<FakeState>>,
        size: (u16, u16),
    }

    impl Canvas for FakeCanvas {
        fn size(&self) -> (u16, u16) {
            self.size
        }
        fn print(&mut self, x: u16, y: u16, text: &str, _attr: Attr) {
            self.state.borrow_mut().cells.push((x, y, text.to_string()));
        }
        fn clear(&mut self) {
            self.state.borrow_mut().cells.clear();
        }
        fn present(&mut self) -> Result<(), String> {
            Ok(())
        }
        fn poll_key(&mut self, _timeout: Duration) -> i32 {
            super::super::KEY_NONE
        }
    }

    fn screen_with_fake() -> (Screen, Rc<RefCell<FakeState>>) {
        let state = Rc::new(RefCell::new(FakeState::default()));
        let canvas = FakeCanvas {
            state: state.clone(),
            size: (80, 24),
        };
        (Screen::new(Box::new(canvas)), state)
    }

    #[test]
    fn focus_cycles_over_visible_windows() {
        let (mut screen, _) = screen_with_fake();
        let a = screen.add_window("A", true);
        let b = screen.add_window("B", true);
        let c = screen.add_window("C", true);
        screen.set_focus_order(vec![a, b, c]);
        screen.focus_next();
        assert_eq!(screen.focused(), Some(a));
        screen.focus_next();
        assert_eq!(screen.focused(), Some(b));
        screen.set_visible(c, false);
        screen.focus_next();
        assert_eq!(screen.focused(), Some(a));
        screen.focus_prev();
        assert_eq!(screen.focused(), Some(b));
    }

    #[test]
    fn hiding_the_focused_window_drops_focus() {
        let (mut screen, _) = screen_with_fake();
        let a = screen.add_window("A", true);
        screen.set_focus_order(vec![a]);
        screen.focus(Some(a));
        screen.set_visible(a, false);
        assert_eq!(screen.focused(), None);
    }

    #[test]
    fn window_prints_are_clipped_to_the_inner_area() {
        let (mut screen, state) = screen_with_fake();
        let a = screen.add_window("A", true);
        screen.window_mut(a).reshape(0, 0, 10, 4);
        screen.print(a, 0, 0, "0123456789ABC", Color::Text.attr());
        {
            let cells = &state.borrow().cells;
            let (x, y, text) = &cells[0];
            assert_eq!((*x, *y), (1, 1));
            assert_eq!(text, "01234567");
        }
        // out-of-range rows draw nothing
        state.borrow_mut().cells.clear();
        screen.print(a, 0, 2, "below", Color::Text.attr());
        assert!(state.borrow().cells.is_empty());
    }

    #[test]
    fn hotkeys_resolve_to_visible_windows() {
        let (mut screen, _) = screen_with_fake();
        let a = screen.add_window("Watchers", true);
        screen.set_hotkey(a, 'w');
        assert_eq!(screen.window_by_hotkey('w' as i32), Some(a));
        assert_eq!(screen.window_by_hotkey('W' as i32), Some(a));
        screen.set_visible(a, false);
        assert_eq!(screen.window_by_hotkey('w' as i32), None);
    }
}
