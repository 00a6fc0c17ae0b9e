// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Three-tier shortcut registry: per-window hotkeys live on the screen,
//! per-mode layers and the always-active global layer live here. Keys are
//! normalized (uppercase letters fold to lowercase) and duplicates within a
//! layer are rejected.

use std::collections::HashMap;

use super::actions::Action;
use super::state::AppMode;
use super::ui::{key_as_text, Color};

/// What a shortcut does when it fires. Focus moves are resolved by the app
/// against the screen; everything else goes through the dispatcher.
#[derive(Clone, Debug)]
pub enum ShortcutOp {
    Dispatch(Action),
    StepFollow(Action),
    FocusNext,
    FocusPrev,
    ToggleDisassembly,
}

#[derive(Clone, Debug)]
pub struct Shortcut {
    pub key: i32,
    pub label: String,
    pub op: ShortcutOp,
    pub visible_in_global_bar: bool,
}

impl Shortcut {
    pub fn new(key: i32, label: &str, op: ShortcutOp) -> Shortcut {
        Shortcut {
            key: normalize_key(key),
            label: label.to_string(),
            op,
            visible_in_global_bar: true,
        }
    }

    pub fn key_as_text(&self) -> String {
        key_as_text(self.key)
    }
}

pub struct ShortcutLayer {
    pub name: String,
    pub color: Color,
    shortcuts: HashMap<i32, Shortcut>,
    order: Vec<i32>,
}

impl ShortcutLayer {
    pub fn new(name: &str, color: Color) -> ShortcutLayer {
        ShortcutLayer {
            name: name.to_string(),
            color,
            shortcuts: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn add(&mut self, shortcut: Shortcut) -> Result<(), String> {
        let key = shortcut.key;
        if self.shortcuts.contains_key(&key) {
            return Err(format!("shortcut already registered: {}", key));
        }
        self.shortcuts.insert(key, shortcut);
        self.order.push(key);
        Ok(())
    }

    pub fn get(&self, key: i32) -> Option<&Shortcut> {
        self.shortcuts.get(&normalize_key(key))
    }

    pub fn list(&self) -> Vec<&Shortcut> {
        self.order
            .iter()
            .filter_map(|key| self.shortcuts.get(key))
            .collect()
    }
}

pub struct ShortcutManager {
    globals: HashMap<i32, Shortcut>,
    globals_order: Vec<i32>,
    layers: HashMap<AppMode, ShortcutLayer>,
}

impl ShortcutManager {
    pub fn new() -> ShortcutManager {
        ShortcutManager {
            globals: HashMap::new(),
            globals_order: Vec::new(),
            layers: HashMap::new(),
        }
    }

    pub fn add_global(&mut self, shortcut: Shortcut) -> Result<(), String> {
        let key = shortcut.key;
        if self.globals.contains_key(&key) {
            return Err(format!("shortcut already registered: {}", key));
        }
        self.globals.insert(key, shortcut);
        self.globals_order.push(key);
        Ok(())
    }

    pub fn add_layer(&mut self, mode: AppMode, layer: ShortcutLayer) -> Result<(), String> {
        if self.layers.contains_key(&mode) {
            return Err(format!("layer already registered: {:?}", mode));
        }
        self.layers.insert(mode, layer);
        Ok(())
    }

    pub fn layer(&self, mode: AppMode) -> Option<&ShortcutLayer> {
        self.layers.get(&mode)
    }

    /// Mode layer first, then the global layer.
    pub fn resolve(&self, mode: AppMode, key: i32) -> Option<&Shortcut> {
        self.resolve_layer(mode, key)
            .or_else(|| self.resolve_global(key))
    }

    pub fn resolve_layer(&self, mode: AppMode, key: i32) -> Option<&Shortcut> {
        self.layers.get(&mode).and_then(|layer| layer.get(key))
    }

    pub fn resolve_global(&self, key: i32) -> Option<&Shortcut> {
        self.globals.get(&normalize_key(key))
    }

    pub fn globals(&self) -> Vec<&Shortcut> {
        self.globals_order
            .iter()
            .filter_map(|key| self.globals.get(key))
            .filter(|shortcut| shortcut.visible_in_global_bar)
            .collect()
    }
}

pub fn normalize_key(key: i32) -> i32 {
    if key >= 'A' as i32 && key <= 'Z' as i32 {
        key + 32
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quit() -> Shortcut {
        Shortcut::new('Q' as i32, "Quit", ShortcutOp::Dispatch(Action::Quit))
    }

    #[test]
    fn keys_are_normalized_on_registration() {
        let mut manager = ShortcutManager::new();
        manager.add_global(quit()).unwrap();
        assert!(manager.resolve(AppMode::Normal, 'q' as i32).is_some());
        assert!(manager.resolve(AppMode::Normal, 'Q' as i32).is_some());
    }

    #[test]
    fn duplicates_are_rejected_per_layer() {
        let mut layer = ShortcutLayer::new("NORMAL", Color::ModeNormal);
        layer.add(quit()).unwrap();
        assert!(layer.add(quit()).is_err());
        let mut manager = ShortcutManager::new();
        manager.add_global(quit()).unwrap();
        assert!(manager.add_global(quit()).is_err());
    }

    #[test]
    fn mode_layer_shadows_globals() {
        let mut manager = ShortcutManager::new();
        manager.add_global(quit()).unwrap();
        let mut debug = ShortcutLayer::new("DEBUG", Color::ModeDebug);
        debug
            .add(Shortcut::new(
                'q' as i32,
                "Quiet",
                ShortcutOp::Dispatch(Action::Pause),
            ))
            .unwrap();
        manager.add_layer(AppMode::Debug, debug).unwrap();
        let resolved = manager.resolve(AppMode::Debug, 'q' as i32).unwrap();
        assert_eq!(resolved.label, "Quiet");
        let resolved = manager.resolve(AppMode::Normal, 'q' as i32).unwrap();
        assert_eq!(resolved.label, "Quit");
    }
}
