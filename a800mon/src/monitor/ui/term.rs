// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Attribute, Color as TermColor, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, event, execute, queue};

use super::{
    Attr, Canvas, ATTR_BOLD, ATTR_DIM, ATTR_REVERSE, KEY_BACKSPACE, KEY_BACK_TAB, KEY_DELETE,
    KEY_DOWN, KEY_END, KEY_ENTER, KEY_ESC, KEY_F0, KEY_HOME, KEY_LEFT, KEY_NONE, KEY_PAGE_DOWN,
    KEY_PAGE_UP, KEY_RESIZE, KEY_RIGHT, KEY_TAB, KEY_UP,
};

/// Crossterm-backed canvas: raw mode plus the alternate screen for the
/// lifetime of the monitor.
pub struct TermCanvas {
    out: Stdout,
    size: (u16, u16),
}

impl TermCanvas {
    pub fn init() -> Result<TermCanvas, String> {
        terminal::enable_raw_mode().map_err(stringify)?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide).map_err(stringify)?;
        let size = terminal::size().map_err(stringify)?;
        Ok(TermCanvas { out, size })
    }

    fn apply_attr(&mut self, attr: Attr) {
        let color = match attr & 0xFF {
            1 => TermColor::Yellow,        // Address
            2 => TermColor::Cyan,          // Mnemonic
            3 => TermColor::DarkGreen,     // Comment
            4 => TermColor::DarkGrey,      // Border
            5 => TermColor::White,         // Title
            6 => TermColor::Red,           // Error
            7 => TermColor::DarkCyan,      // Tag
            8 => TermColor::Green,         // ModeNormal
            9 => TermColor::Magenta,       // ModeDebug
            10 => TermColor::Red,          // ModeShutdown
            _ => TermColor::Reset,
        };
        let _ = queue!(self.out, SetAttribute(Attribute::Reset), SetForegroundColor(color));
        if attr & ATTR_REVERSE != 0 {
            let _ = queue!(self.out, SetAttribute(Attribute::Reverse));
        }
        if attr & ATTR_BOLD != 0 {
            let _ = queue!(self.out, SetAttribute(Attribute::Bold));
        }
        if attr & ATTR_DIM != 0 {
            let _ = queue!(self.out, SetAttribute(Attribute::Dim));
        }
    }
}

impl Canvas for TermCanvas {
    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn print(&mut self, x: u16, y: u16, text: &str, attr: Attr) {
        let (width, height) = self.size;
        if y >= height || x >= width {
            return;
        }
        let available = (width - x) as usize;
        let clipped: String = text.chars().take(available).collect();
        self.apply_attr(attr);
        let _ = queue!(self.out, cursor::MoveTo(x, y), Print(clipped));
    }

    fn clear(&mut self) {
        let _ = queue!(self.out, SetAttribute(Attribute::Reset), Clear(ClearType::All));
    }

    fn present(&mut self) -> Result<(), String> {
        self.out.flush().map_err(stringify)
    }

    fn poll_key(&mut self, timeout: Duration) -> i32 {
        match event::poll(timeout) {
            Ok(true) => {}
            _ => return KEY_NONE,
        }
        match event::read() {
            Ok(Event::Key(key)) => translate_key(key),
            Ok(Event::Resize(width, height)) => {
                self.size = (width, height);
                KEY_RESIZE
            }
            _ => KEY_NONE,
        }
    }
}

impl Drop for TermCanvas {
    fn drop(&mut self) {
        let _ = execute!(self.out, LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

fn translate_key(key: KeyEvent) -> i32 {
    match key.code {
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                let folded = ch.to_ascii_lowercase();
                if folded.is_ascii_alphabetic() {
                    return folded as i32 - 'a' as i32 + 1;
                }
            }
            ch as i32
        }
        KeyCode::Enter => KEY_ENTER,
        KeyCode::Esc => KEY_ESC,
        KeyCode::Backspace => KEY_BACKSPACE,
        KeyCode::Delete => KEY_DELETE,
        KeyCode::Up => KEY_UP,
        KeyCode::Down => KEY_DOWN,
        KeyCode::Left => KEY_LEFT,
        KeyCode::Right => KEY_RIGHT,
        KeyCode::Home => KEY_HOME,
        KeyCode::End => KEY_END,
        KeyCode::PageUp => KEY_PAGE_UP,
        KeyCode::PageDown => KEY_PAGE_DOWN,
        KeyCode::Tab => KEY_TAB,
        KeyCode::BackTab => KEY_BACK_TAB,
        KeyCode::F(n) => KEY_F0 + i32::from(n),
        _ => KEY_NONE,
    }
}

fn stringify(err: impl std::fmt::Display) -> String {
    err.to_string()
}
