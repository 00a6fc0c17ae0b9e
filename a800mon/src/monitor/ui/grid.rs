// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use super::{Attr, Screen, WindowId, ATTR_REVERSE, KEY_DOWN, KEY_END, KEY_HOME, KEY_UP};

struct Column {
    width: usize,
    attr: Attr,
}

/// Row-of-cells widget shared by the viewers: fixed or auto-sized columns,
/// an optional selection bar, and a viewport that follows it.
pub struct Grid {
    columns: Vec<Column>,
    gap: usize,
    rows: Vec<Vec<String>>,
    selected: Option<usize>,
    selection_enabled: bool,
    offset: usize,
    viewport_top: usize,
    viewport_rows: usize,
}

impl Grid {
    pub fn new() -> Grid {
        Grid {
            columns: Vec::new(),
            gap: 1,
            rows: Vec::new(),
            selected: None,
            selection_enabled: true,
            offset: 0,
            viewport_top: 0,
            viewport_rows: 0,
        }
    }

    pub fn set_gap(&mut self, gap: usize) {
        self.gap = gap;
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
        if !enabled {
            self.selected = None;
        }
    }

    pub fn add_column(&mut self, width: usize, attr: Attr) {
        self.columns.push(Column { width, attr });
    }

    pub fn set_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows = rows;
        if let Some(selected) = self.selected {
            if self.rows.is_empty() {
                self.selected = None;
            } else if selected >= self.rows.len() {
                self.selected = Some(self.rows.len() - 1);
            }
        }
    }

    pub fn rows_len(&self) -> usize {
        self.rows.len()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_selected(&mut self, selected: Option<usize>) {
        self.selected = match selected {
            Some(_) if self.rows.is_empty() => None,
            Some(idx) => Some(idx.min(self.rows.len() - 1)),
            None => None,
        };
    }

    /// Reserve `top` rows of the window for overlays (input lines).
    pub fn set_viewport(&mut self, top: usize, rows: usize) {
        self.viewport_top = top;
        self.viewport_rows = rows;
    }

    pub fn handle_input(&mut self, key: i32) -> bool {
        if !self.selection_enabled || self.rows.is_empty() {
            return false;
        }
        let last = self.rows.len() - 1;
        let current = self.selected;
        let next = match key {
            KEY_UP => Some(current.map_or(0, |idx| idx.saturating_sub(1))),
            KEY_DOWN => Some(current.map_or(0, |idx| (idx + 1).min(last))),
            KEY_HOME => Some(0),
            KEY_END => Some(last),
            _ => return false,
        };
        self.selected = next;
        true
    }

    pub fn render(&mut self, screen: &mut Screen, window: WindowId) {
        let inner_height = screen.window(window).inner_height();
        let height = if self.viewport_rows > 0 {
            self.viewport_rows.min(inner_height.saturating_sub(self.viewport_top))
        } else {
            inner_height.saturating_sub(self.viewport_top)
        };
        if height == 0 {
            return;
        }
        // keep the selection inside the visible band
        if let Some(selected) = self.selected {
            if selected < self.offset {
                self.offset = selected;
            } else if selected >= self.offset + height {
                self.offset = selected + 1 - height;
            }
        }
        if self.offset > self.rows.len().saturating_sub(1) {
            self.offset = self.rows.len().saturating_sub(1);
        }

        let widths = self.effective_widths();
        for line in 0..height {
            let y = self.viewport_top + line;
            let row_idx = self.offset + line;
            if row_idx >= self.rows.len() {
                screen.clear_line(window, y, 0);
                continue;
            }
            let selected = self.selected == Some(row_idx);
            let mut x = 0;
            for (col, column) in self.columns.iter().enumerate() {
                let empty = String::new();
                let cell = self.rows[row_idx].get(col).unwrap_or(&empty);
                let width = widths[col];
                let text = format!("{:<width$}", cell, width = width);
                let attr = if selected {
                    column.attr | ATTR_REVERSE
                } else {
                    column.attr
                };
                screen.print(window, x, y, &text, attr);
                x += width + self.gap;
            }
            screen.clear_line(window, y, x.saturating_sub(self.gap));
        }
    }

    fn effective_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, column)| {
                if column.width > 0 {
                    column.width
                } else {
                    self.rows
                        .iter()
                        .filter_map(|row| row.get(col))
                        .map(|cell| cell.chars().count())
                        .max()
                        .unwrap_or(0)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_rows(count: usize) -> Grid {
        let mut grid = Grid::new();
        grid.add_column(0, 0);
        grid.set_rows((0..count).map(|idx| vec![format!("row{}", idx)]).collect());
        grid
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut grid = grid_with_rows(3);
        assert!(grid.handle_input(KEY_DOWN));
        assert_eq!(grid.selected(), Some(0));
        assert!(grid.handle_input(KEY_DOWN));
        assert!(grid.handle_input(KEY_DOWN));
        assert!(grid.handle_input(KEY_DOWN));
        assert_eq!(grid.selected(), Some(2));
        assert!(grid.handle_input(KEY_HOME));
        assert_eq!(grid.selected(), Some(0));
        assert!(grid.handle_input(KEY_UP));
        assert_eq!(grid.selected(), Some(0));
    }

    #[test]
    fn shrinking_data_clamps_selection() {
        let mut grid = grid_with_rows(5);
        grid.set_selected(Some(4));
        grid.set_rows((0..2).map(|idx| vec![format!("row{}", idx)]).collect());
        assert_eq!(grid.selected(), Some(1));
        grid.set_rows(Vec::new());
        assert_eq!(grid.selected(), None);
        assert!(!grid.handle_input(KEY_DOWN));
    }

    #[test]
    fn disabled_selection_ignores_keys() {
        let mut grid = grid_with_rows(3);
        grid.set_selection_enabled(false);
        assert!(!grid.handle_input(KEY_DOWN));
        assert_eq!(grid.selected(), None);
    }
}
