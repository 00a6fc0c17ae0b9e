// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! One-shot CLI commands. Every command returns a process exit code:
//! 0 on success, 1 on runtime failure (argument errors exit 2 before any
//! command runs).

mod breakpoints;
mod cpu;
mod debugger;
mod dump;
mod emulator;
mod memory;
mod screen;
mod trainer;

use std::env;

use a800mon_rpc::{Client, Command, Error};

use crate::cli::{MemCommand, Opt, SubCommand};

pub fn execute(opt: Opt) -> i32 {
    let socket = opt.socket.clone();
    let command = match opt.command {
        Some(command) => command,
        None => return cmd_monitor(&socket),
    };
    match command {
        SubCommand::Monitor => cmd_monitor(&socket),
        SubCommand::Run(args) => run_rpc(&socket, |rpc| {
            rpc.run(&args.path)?;
            Ok(())
        }),
        SubCommand::Pause => cmd_simple(&socket, Command::Pause),
        SubCommand::Step => cmd_simple(&socket, Command::Step),
        SubCommand::StepVbl => cmd_simple(&socket, Command::StepVBlank),
        SubCommand::Continue => cmd_simple(&socket, Command::Continue),
        SubCommand::Coldstart => cmd_simple(&socket, Command::Coldstart),
        SubCommand::Warmstart => cmd_simple(&socket, Command::Warmstart),
        SubCommand::Bp(args) => breakpoints::execute(&socket, args),
        SubCommand::Mem(args) => match args {
            MemCommand::Read(args) => memory::cmd_read(&socket, args),
            MemCommand::Write(args) => memory::cmd_write(&socket, args),
            MemCommand::Search(args) => memory::cmd_search(&socket, args),
            MemCommand::Disasm(args) => memory::cmd_disasm(&socket, args),
        },
        SubCommand::Cpu(args) => cpu::execute(&socket, args),
        SubCommand::Dump(args) => dump::execute(&socket, args),
        SubCommand::Cart(args) => emulator::execute_cart(&socket, args),
        SubCommand::Tape(args) => emulator::execute_tape(&socket, args),
        SubCommand::Disk(args) => emulator::execute_disk(&socket, args),
        SubCommand::Emulator(args) => emulator::execute(&socket, args),
        SubCommand::Debug(args) => debugger::execute(&socket, args),
        SubCommand::Rpc(args) => emulator::execute_rpc(&socket, args),
        SubCommand::Screen(args) => screen::execute(&socket, args),
        SubCommand::Trainer(args) => trainer::execute(&socket, args),
    }
}

fn cmd_monitor(socket: &std::path::Path) -> i32 {
    match crate::monitor::run(socket) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", format_badge("ERR", &err));
            1
        }
    }
}

pub(crate) fn cmd_simple(socket: &std::path::Path, command: Command) -> i32 {
    run_rpc(socket, |rpc| {
        rpc.call(command, &[])?;
        Ok(())
    })
}

pub(crate) fn run_rpc<F>(socket: &std::path::Path, body: F) -> i32
where
    F: FnOnce(&Client) -> Result<(), Error>,
{
    let rpc = Client::new(socket);
    match body(&rpc) {
        Ok(()) => 0,
        Err(err) => fail(&err),
    }
}

pub(crate) fn fail(err: &Error) -> i32 {
    eprintln!("{}", format_cli_error(err));
    1
}

pub(crate) fn fail_msg(msg: &str) -> i32 {
    eprintln!("{}", format_badge("ERR", msg));
    1
}

pub(crate) fn format_cli_error(err: &Error) -> String {
    if let Error::Command { status, data } = err {
        let msg = String::from_utf8_lossy(data);
        let msg = msg.trim();
        let msg = if msg.is_empty() {
            err.to_string()
        } else {
            msg.to_string()
        };
        return format_badge(&status.to_string(), &msg);
    }
    format_badge("ERR", &err.to_string())
}

pub(crate) fn format_badge(code: &str, msg: &str) -> String {
    if color_enabled() {
        format!("\x1b[41;97;1m {} \x1b[0m {}", code, msg)
    } else {
        format!("[{}] {}", code, msg)
    }
}

pub(crate) fn format_on_off_badge(enabled: bool) -> String {
    let text = if enabled { " ON " } else { " OFF " };
    if color_enabled() {
        if enabled {
            format!("\x1b[42;30;1m{}\x1b[0m", text)
        } else {
            format!("\x1b[41;97;1m{}\x1b[0m", text)
        }
    } else {
        format!("[{}]", text.trim())
    }
}

pub(crate) fn color_enabled() -> bool {
    match env::var("A800MON_COLOR")
        .unwrap_or_default()
        .trim()
        .to_lowercase()
        .as_str()
    {
        "always" => return true,
        "never" => return false,
        _ => {}
    }
    help_color_enabled()
}

pub(crate) fn help_color_enabled() -> bool {
    match env::var("A800MON_HELP_COLOR")
        .unwrap_or_default()
        .trim()
        .to_lowercase()
        .as_str()
    {
        "always" => return true,
        "never" => return false,
        _ => {}
    }
    match env::var("TERM") {
        Ok(term) => !term.is_empty() && term != "dumb",
        Err(_) => false,
    }
}
