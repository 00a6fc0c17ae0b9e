// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io::{self, BufRead, Write};

use a800mon_core::disasm;
use a800mon_rpc::Client;

use super::fail;
use crate::cli::{DebugCommand, HistoryCmd};

pub fn execute(socket: &std::path::Path, command: DebugCommand) -> i32 {
    let rpc = Client::new(socket);
    match command {
        DebugCommand::Shell => cmd_shell(&rpc),
        DebugCommand::History(args) => cmd_history(&rpc, args),
        DebugCommand::Jumps => cmd_jumps(&rpc),
        DebugCommand::Stack => cmd_stack(&rpc),
    }
}

fn cmd_shell(rpc: &Client) -> i32 {
    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return 0;
            }
            Ok(_) => {}
            Err(_) => return 1,
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "q" || line == "quit" || line == "exit" {
            return 0;
        }
        match rpc.builtin_monitor(line) {
            Ok(reply) => {
                let _ = io::stdout().write_all(&reply);
                if !reply.ends_with(b"\n") {
                    println!();
                }
            }
            Err(err) => {
                eprintln!("{}", super::format_cli_error(&err));
            }
        }
    }
}

fn cmd_history(rpc: &Client, args: HistoryCmd) -> i32 {
    let entries = match rpc.history() {
        Ok(entries) => entries,
        Err(err) => return fail(&err),
    };
    for entry in entries.iter().take(args.count) {
        let text = match disasm::decode_one(entry.pc, &entry.op) {
            Some(ins) => format!("{:<8} {}", ins.raw_text, ins.asm_text),
            None => String::new(),
        };
        println!("Y={:3} X={:3}  {:04X}: {}", entry.y, entry.x, entry.pc, text);
    }
    0
}

fn cmd_jumps(rpc: &Client) -> i32 {
    let jumps = match rpc.jumps() {
        Ok(jumps) => jumps,
        Err(err) => return fail(&err),
    };
    if jumps.pcs.is_empty() {
        println!("No recorded jumps.");
        return 0;
    }
    for pc in jumps.pcs {
        println!("{:04X}", pc);
    }
    0
}

fn cmd_stack(rpc: &Client) -> i32 {
    let stack = match rpc.stack() {
        Ok(stack) => stack,
        Err(err) => return fail(&err),
    };
    println!("S={:02X}", stack.s);
    for entry in stack.entries {
        println!("01{:02X}: {:02X}", entry.stack_off, entry.value);
    }
    0
}
