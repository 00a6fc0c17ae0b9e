// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Interactive monitor: window layout, shortcut tables and the component
//! wiring around the cooperative main loop.

pub mod actions;
pub mod app;
pub mod shortcuts;
pub mod state;
pub mod status;
pub mod ui;
pub mod viewers;

use std::path::Path;
use std::rc::Rc;

use a800mon_rpc::{Client, CAP_MONITOR_BREAKPOINTS};

use self::actions::{Action, Dispatcher};
use self::app::App;
use self::shortcuts::{Shortcut, ShortcutLayer, ShortcutManager, ShortcutOp};
use self::state::{AppMode, StateStore};
use self::status::StatusUpdater;
use self::ui::{key_f, Color, Screen, TermCanvas, WindowId, KEY_BACK_TAB, KEY_ESC, KEY_TAB};

const INPUT_TIMEOUT_MS: u64 = 20;

#[derive(Clone, Copy)]
struct Windows {
    top: WindowId,
    bottom: WindowId,
    cpu: WindowId,
    dlist: WindowId,
    watchers: WindowId,
    screen_buffer: WindowId,
    disassembly: WindowId,
    history: WindowId,
    breakpoints: WindowId,
}

pub fn run(socket: &Path) -> Result<(), String> {
    let canvas = TermCanvas::init()?;
    let mut screen = Screen::new(Box::new(canvas));
    let windows = build_windows(&mut screen);
    install_layout(&mut screen, &windows);

    let rpc = Client::new(socket);
    let store = StateStore::new();
    let mut dispatcher = Dispatcher::new();
    let supported = match rpc.capabilities() {
        Ok(caps) => caps.contains(&CAP_MONITOR_BREAKPOINTS),
        Err(_) => false,
    };
    dispatcher.dispatch(&store, Action::SetBreakpointsSupported(supported));
    screen.set_visible(windows.breakpoints, supported);
    screen.set_visible(windows.disassembly, false);

    let shortcuts = Rc::new(build_shortcuts());
    let status_updater = StatusUpdater::new();

    let mut app = App::new(
        rpc,
        store,
        dispatcher,
        status_updater,
        shortcuts.clone(),
        screen,
        INPUT_TIMEOUT_MS,
    );
    app.set_disassembly_window(windows.disassembly);

    app.add_component(Box::new(viewers::CpuStateViewer::new(windows.cpu)));
    app.add_component(Box::new(viewers::DisassemblyViewer::new(
        windows.disassembly,
    )));
    app.add_component(Box::new(viewers::WatchersViewer::new(windows.watchers)));
    app.add_component(Box::new(viewers::BreakpointsViewer::new(
        windows.breakpoints,
    )));
    app.add_component(Box::new(viewers::TopBar::new(windows.top)));
    app.add_component(Box::new(viewers::AppModeUpdater::new()));
    app.add_component(Box::new(viewers::BreakpointsWindowUpdater::new(
        windows.breakpoints,
    )));
    app.add_component(Box::new(viewers::ShortcutBar::new(
        windows.bottom,
        shortcuts,
    )));
    app.add_component(Box::new(viewers::DisplayListViewer::new(windows.dlist)));
    app.add_component(Box::new(viewers::ScreenBufferInspector::new(
        windows.screen_buffer,
    )));
    app.add_component(Box::new(viewers::HistoryViewer::new(windows.history)));

    app.run()
}

fn build_windows(screen: &mut Screen) -> Windows {
    let top = screen.add_window("", false);
    let cpu = screen.add_window("CPU State", true);
    let dlist = screen.add_window("DisplayList", true);
    let watchers = screen.add_window("Watchers", true);
    let screen_buffer = screen.add_window("Screen Buffer", true);
    let disassembly = screen.add_window("Disassembler", true);
    let history = screen.add_window("History", true);
    let breakpoints = screen.add_window("Breakpoints", true);
    let bottom = screen.add_window("", false);

    screen.set_hotkey(dlist, 'l');
    screen.set_hotkey(watchers, 'w');
    screen.set_hotkey(screen_buffer, 's');
    screen.set_hotkey(history, 'h');
    screen.set_hotkey(breakpoints, 'b');
    screen.add_tag(screen_buffer, "ATASCII", "atascii", true);
    screen.add_tag(screen_buffer, "ASCII", "ascii", false);
    screen.add_tag(disassembly, "FOLLOW", "follow", true);
    screen.add_tag(breakpoints, "ENABLED", "bp_enabled", false);
    screen.set_focus_order(vec![
        dlist,
        watchers,
        screen_buffer,
        disassembly,
        history,
        breakpoints,
    ]);
    Windows {
        top,
        bottom,
        cpu,
        dlist,
        watchers,
        screen_buffer,
        disassembly,
        history,
        breakpoints,
    }
}

fn install_layout(screen: &mut Screen, windows: &Windows) {
    let Windows {
        top,
        bottom,
        cpu,
        dlist,
        watchers,
        screen_buffer,
        disassembly,
        history,
        breakpoints,
        ..
    } = *windows;
    screen.set_layout(Box::new(move |screen, width, height| {
        let top_y = 1u16;
        let bar_h = 1u16;
        let cpu_h = 5u16;
        let cpu_y = height.saturating_sub(cpu_h + bar_h);
        screen.window_mut(top).reshape(0, 0, width, bar_h);
        screen
            .window_mut(bottom)
            .reshape(0, height.saturating_sub(bar_h), width, bar_h);
        screen.window_mut(cpu).reshape(0, cpu_y, width, cpu_h);

        let body_h = cpu_y.saturating_sub(top_y).max(2);
        let left_w = 40u16.min((width / 3).max(20));
        let dlist_h = (body_h / 2 + 2).min(body_h.saturating_sub(1)).max(1);
        let watch_h = body_h.saturating_sub(dlist_h).max(1);
        screen.window_mut(dlist).reshape(0, top_y, left_w, dlist_h);
        screen
            .window_mut(watchers)
            .reshape(0, top_y + dlist_h, left_w, watch_h);

        let right_x = left_w + 1;
        let right_w = width.saturating_sub(right_x);
        let disasm_visible = screen.window(disassembly).visible();
        let bp_visible = screen.window(breakpoints).visible();
        let columns = if disasm_visible { 3 } else { 2 };
        let column_w = (right_w / columns).max(1);
        let mut x = right_x;
        screen
            .window_mut(screen_buffer)
            .reshape(x, top_y, column_w, body_h);
        x += column_w;
        if disasm_visible {
            screen
                .window_mut(disassembly)
                .reshape(x, top_y, column_w, body_h);
            x += column_w;
        }
        let last_w = width.saturating_sub(x).max(1);
        if bp_visible {
            let bp_h = 13u16.min(body_h.saturating_sub(1)).max(1);
            let hist_h = body_h.saturating_sub(bp_h).max(1);
            screen.window_mut(history).reshape(x, top_y, last_w, hist_h);
            screen
                .window_mut(breakpoints)
                .reshape(x, top_y + hist_h, last_w, bp_h);
        } else {
            screen.window_mut(history).reshape(x, top_y, last_w, body_h);
        }
    }));
}

fn build_shortcuts() -> ShortcutManager {
    let mut manager = ShortcutManager::new();
    let step = Shortcut::new(key_f(5), "Step", ShortcutOp::StepFollow(Action::Step));
    let step_vblank = Shortcut::new(
        key_f(6),
        "Step VBLANK",
        ShortcutOp::StepFollow(Action::StepVBlank),
    );
    let step_over = Shortcut::new(
        key_f(7),
        "Step over",
        ShortcutOp::StepFollow(Action::StepOver),
    );
    let pause = Shortcut::new(key_f(8), "Pause", ShortcutOp::Dispatch(Action::Pause));
    let cont = Shortcut::new(key_f(8), "Continue", ShortcutOp::Dispatch(Action::Continue));
    let enter_shutdown = Shortcut::new(
        KEY_ESC,
        "Shutdown",
        ShortcutOp::Dispatch(Action::EnterShutdown),
    );
    let exit_shutdown = Shortcut::new(KEY_ESC, "Back", ShortcutOp::Dispatch(Action::ExitShutdown));

    let mut normal = ShortcutLayer::new("NORMAL", Color::ModeNormal);
    let _ = normal.add(step.clone());
    let _ = normal.add(step_vblank.clone());
    let _ = normal.add(step_over.clone());
    let _ = normal.add(pause);
    let _ = normal.add(enter_shutdown);

    let mut debug = ShortcutLayer::new("DEBUG", Color::ModeDebug);
    let _ = debug.add(step);
    let _ = debug.add(step_vblank);
    let _ = debug.add(step_over);
    let _ = debug.add(cont);
    let _ = debug.add(Shortcut::new(
        KEY_ESC,
        "Shutdown",
        ShortcutOp::Dispatch(Action::EnterShutdown),
    ));

    let mut shutdown = ShortcutLayer::new("SHUTDOWN", Color::ModeShutdown);
    let _ = shutdown.add(Shortcut::new(
        'c' as i32,
        "Cold start",
        ShortcutOp::Dispatch(Action::ColdStart),
    ));
    let _ = shutdown.add(Shortcut::new(
        'w' as i32,
        "Warm start",
        ShortcutOp::Dispatch(Action::WarmStart),
    ));
    let _ = shutdown.add(Shortcut::new(
        't' as i32,
        "Terminate",
        ShortcutOp::Dispatch(Action::Terminate),
    ));
    let _ = shutdown.add(exit_shutdown);

    let _ = manager.add_layer(AppMode::Normal, normal);
    let _ = manager.add_layer(AppMode::Debug, debug);
    let _ = manager.add_layer(AppMode::Shutdown, shutdown);

    let mut next_window = Shortcut::new(KEY_TAB, "Next window", ShortcutOp::FocusNext);
    next_window.visible_in_global_bar = false;
    let _ = manager.add_global(next_window);
    let mut prev_window = Shortcut::new(KEY_BACK_TAB, "Previous window", ShortcutOp::FocusPrev);
    prev_window.visible_in_global_bar = false;
    let _ = manager.add_global(prev_window);
    let _ = manager.add_global(Shortcut::new(
        'd' as i32,
        "Disassembly",
        ShortcutOp::ToggleDisassembly,
    ));
    let _ = manager.add_global(Shortcut::new(
        key_f(9),
        "Freeze",
        ShortcutOp::Dispatch(Action::ToggleFreeze),
    ));
    let _ = manager.add_global(Shortcut::new(
        'q' as i32,
        "Quit",
        ShortcutOp::Dispatch(Action::Quit),
    ));
    manager
}
