// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_rpc::machine_name;

use crate::monitor::app::{Component, Ctx};
use crate::monitor::state::AppState;
use crate::monitor::ui::{Color, Screen, WindowId};

pub struct CpuStateViewer {
    window: WindowId,
    last_snapshot: String,
}

impl CpuStateViewer {
    pub fn new(window: WindowId) -> CpuStateViewer {
        CpuStateViewer {
            window,
            last_snapshot: String::new(),
        }
    }
}

pub fn format_cpu(state: &AppState) -> String {
    let cpu = &state.cpu;
    format!(
        "Y={:3} X={:3}  PC={:04X} A={:02X} X={:02X} Y={:02X} S={:02X} P={}",
        cpu.ypos,
        cpu.xpos,
        cpu.pc,
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.s,
        cpu.flags_text(),
    )
}

impl Component for CpuStateViewer {
    fn window(&self) -> Option<WindowId> {
        Some(self.window)
    }

    fn update(&mut self, ctx: &mut Ctx, _screen: &mut Screen) -> bool {
        let state = ctx.store.snapshot();
        let snapshot = format!(
            "{}|{}|{}|{}|{}|{}",
            format_cpu(&state),
            state.cpu_disasm,
            state.paused,
            state.crashed,
            state.emu_ms,
            state.state_seq,
        );
        if snapshot == self.last_snapshot {
            return false;
        }
        self.last_snapshot = snapshot;
        true
    }

    fn render(&mut self, state: &AppState, screen: &mut Screen, _force: bool) {
        screen.print(self.window, 0, 0, &format_cpu(state), Color::Text.attr());
        screen.clear_line(self.window, 0, format_cpu(state).chars().count());
        let next = format!("next: {}", state.cpu_disasm);
        screen.print(self.window, 0, 1, &next, Color::Mnemonic.attr());
        screen.clear_line(self.window, 1, next.chars().count());
        let run_state = if state.crashed {
            "CRASHED"
        } else if state.paused {
            "paused"
        } else {
            "running"
        };
        let info = format!(
            "{}  emu={}ms reset={}ms seq={} machine={}",
            run_state,
            state.emu_ms,
            state.reset_ms,
            state.state_seq,
            machine_name(state.machine_type),
        );
        let attr = if state.crashed {
            Color::Error.attr()
        } else {
            Color::Comment.attr()
        };
        screen.print(self.window, 0, 2, &info, attr);
        screen.clear_line(self.window, 2, info.chars().count());
    }
}
