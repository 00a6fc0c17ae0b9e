// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Cooperative main loop: read one key with a bounded timeout, dispatch
//! input, tick the status poller, update every component in registration
//! order, render, flush queued RPCs. Components never block outside the
//! RPC layer.

use std::rc::Rc;
use std::time::{Duration, Instant};

use a800mon_rpc::Client;

use super::actions::{Action, Dispatcher};
use super::shortcuts::{ShortcutManager, ShortcutOp};
use super::state::{AppState, StateStore};
use super::status::StatusUpdater;
use super::ui::{Screen, WindowId, KEY_CTRL_C, KEY_NONE, KEY_RESIZE};

pub struct Ctx<'a> {
    pub rpc: &'a Client,
    pub store: &'a StateStore,
    pub dispatcher: &'a mut Dispatcher,
}

pub trait Component {
    fn window(&self) -> Option<WindowId> {
        None
    }

    fn update(&mut self, ctx: &mut Ctx, screen: &mut Screen) -> bool {
        let _ = (ctx, screen);
        false
    }

    /// Key routed to the focused window.
    fn handle_input(&mut self, ctx: &mut Ctx, screen: &mut Screen, key: i32) -> bool {
        let _ = (ctx, screen, key);
        false
    }

    /// Key routed while this component holds the text-input focus; the
    /// three shortcut tiers are bypassed until the focus is released.
    fn handle_focus_input(&mut self, ctx: &mut Ctx, screen: &mut Screen, key: i32) -> bool {
        let _ = (ctx, screen, key);
        false
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, force: bool) {
        let _ = (state, screen, force);
    }
}

pub struct App {
    // Dependencies
    rpc: Client,
    store: StateStore,
    dispatcher: Dispatcher,
    status_updater: StatusUpdater,
    shortcuts: Rc<ShortcutManager>,
    screen: Screen,
    // Components
    components: Vec<Box<dyn Component>>,
    // Runtime State
    focus_owner: Option<usize>,
    disassembly_window: Option<WindowId>,
    input_timeout: Duration,
}

impl App {
    pub fn new(
        rpc: Client,
        store: StateStore,
        dispatcher: Dispatcher,
        status_updater: StatusUpdater,
        shortcuts: Rc<ShortcutManager>,
        screen: Screen,
        input_timeout_ms: u64,
    ) -> App {
        App {
            rpc,
            store,
            dispatcher,
            status_updater,
            shortcuts,
            screen,
            components: Vec::new(),
            focus_owner: None,
            disassembly_window: None,
            input_timeout: Duration::from_millis(input_timeout_ms),
        }
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    pub fn set_disassembly_window(&mut self, window: WindowId) {
        self.disassembly_window = Some(window);
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn run(&mut self) -> Result<(), String> {
        self.screen.rebuild();
        self.render_components(true);
        loop {
            let start = Instant::now();
            let was_frozen = self.store.snapshot().ui_frozen;
            let key = self.screen.poll_key(self.input_timeout);
            if key == KEY_CTRL_C {
                return Ok(());
            }
            let mut had_input = false;
            if key == KEY_RESIZE {
                self.screen.rebuild();
                self.render_components(true);
                self.store
                    .set_frame_time_ms(start.elapsed().as_millis() as u64);
                continue;
            } else if key != KEY_NONE {
                had_input = self.handle_input(key);
            }
            if self.store.snapshot().ui_frozen {
                if had_input && !was_frozen {
                    self.screen.rebuild();
                    self.render_components(true);
                }
                self.store
                    .set_frame_time_ms(start.elapsed().as_millis() as u64);
                continue;
            }
            let ticked = self.status_updater.tick(
                &self.rpc,
                &self.store,
                &mut self.dispatcher,
                Instant::now(),
            );
            if had_input || ticked {
                let had_updates = self.update_components();
                if had_input || had_updates {
                    self.render_components(false);
                }
            }
            self.dispatcher.post_render(&self.rpc);
            if self.dispatcher.take_rpc_flushed() {
                self.status_updater.request_refresh();
            }
            if self.dispatcher.stop_requested() {
                return Ok(());
            }
            self.store
                .set_frame_time_ms(start.elapsed().as_millis() as u64);
        }
    }

    fn update_components(&mut self) -> bool {
        let mut components = std::mem::replace(&mut self.components, Vec::new());
        let mut changed = false;
        for component in components.iter_mut() {
            let mut ctx = Ctx {
                rpc: &self.rpc,
                store: &self.store,
                dispatcher: &mut self.dispatcher,
            };
            changed |= component.update(&mut ctx, &mut self.screen);
        }
        self.components = components;
        changed
    }

    fn render_components(&mut self, force: bool) {
        let state = self.store.snapshot();
        let mut components = std::mem::replace(&mut self.components, Vec::new());
        for component in components.iter_mut() {
            if let Some(window) = component.window() {
                if !self.screen.window(window).visible() {
                    continue;
                }
            }
            component.render(&state, &mut self.screen, force);
        }
        self.components = components;
        self.screen.update();
    }

    /// Input tiers: an installed text-input focus handler swallows every
    /// key; otherwise window hotkeys, the focused window, the mode layer
    /// and the global layer get a shot, in that order.
    fn handle_input(&mut self, key: i32) -> bool {
        if let Some(owner) = self.focus_owner {
            let mut components = std::mem::replace(&mut self.components, Vec::new());
            let mut ctx = Ctx {
                rpc: &self.rpc,
                store: &self.store,
                dispatcher: &mut self.dispatcher,
            };
            let handled = components[owner].handle_focus_input(&mut ctx, &mut self.screen, key);
            self.components = components;
            if !self.store.snapshot().input_focus {
                self.focus_owner = None;
            }
            return handled;
        }

        let mode = self.store.snapshot().active_mode;
        if let Some(op) = self
            .shortcuts
            .resolve_layer(mode, key)
            .map(|shortcut| shortcut.op.clone())
        {
            self.execute_shortcut(op);
            return true;
        }

        if let Some(window) = self.screen.window_by_hotkey(key) {
            if self.screen.focused() != Some(window) {
                self.screen.focus(Some(window));
                self.screen.rebuild();
                self.render_components(true);
                return true;
            }
        }

        if let Some(focused) = self.screen.focused() {
            if let Some(idx) = self
                .components
                .iter()
                .position(|component| component.window() == Some(focused))
            {
                let mut components = std::mem::replace(&mut self.components, Vec::new());
                let mut ctx = Ctx {
                    rpc: &self.rpc,
                    store: &self.store,
                    dispatcher: &mut self.dispatcher,
                };
                let handled = components[idx].handle_input(&mut ctx, &mut self.screen, key);
                self.components = components;
                if self.store.snapshot().input_focus {
                    self.focus_owner = Some(idx);
                }
                if handled {
                    return true;
                }
            }
        }

        let op = self
            .shortcuts
            .resolve_global(key)
            .map(|shortcut| shortcut.op.clone());
        match op {
            Some(op) => {
                self.execute_shortcut(op);
                true
            }
            None => false,
        }
    }

    fn execute_shortcut(&mut self, op: ShortcutOp) {
        match op {
            ShortcutOp::Dispatch(action) => self.dispatcher.dispatch(&self.store, action),
            ShortcutOp::StepFollow(action) => {
                self.dispatcher
                    .dispatch(&self.store, Action::SetDisassemblyFollow(true));
                self.dispatcher.dispatch(&self.store, action);
            }
            ShortcutOp::FocusNext => {
                self.screen.focus_next();
                self.screen.rebuild();
                self.render_components(true);
            }
            ShortcutOp::FocusPrev => {
                self.screen.focus_prev();
                self.screen.rebuild();
                self.render_components(true);
            }
            ShortcutOp::ToggleDisassembly => {
                let window = match self.disassembly_window {
                    Some(window) => window,
                    None => return,
                };
                if !self.screen.window(window).visible() {
                    let state = self.store.snapshot();
                    if state.disassembly_addr.is_none() {
                        self.dispatcher
                            .dispatch(&self.store, Action::SetDisassemblyAddr(state.cpu.pc));
                    }
                    self.dispatcher
                        .dispatch(&self.store, Action::SetDisassembly(true));
                    self.screen.set_visible(window, true);
                }
                self.screen.focus(Some(window));
                self.screen.rebuild();
                self.render_components(true);
            }
        }
    }
}
