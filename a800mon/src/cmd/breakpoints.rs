// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::{bp, hex};
use a800mon_rpc::Client;

use super::{fail, fail_msg, format_on_off_badge};
use crate::cli::{BLineCmd, BpAddCmd, BpCommand, BpDelCmd};

pub fn execute(socket: &std::path::Path, command: BpCommand) -> i32 {
    let rpc = Client::new(socket);
    match command {
        BpCommand::Ls => cmd_list(&rpc),
        BpCommand::Add(args) => cmd_add(&rpc, args),
        BpCommand::Del(args) => cmd_delete(&rpc, args),
        BpCommand::Clear => match rpc.bp_clear() {
            Ok(()) => cmd_list(&rpc),
            Err(err) => fail(&err),
        },
        BpCommand::On => cmd_set_enabled(&rpc, true),
        BpCommand::Off => cmd_set_enabled(&rpc, false),
        BpCommand::Scanline(args) => cmd_scanline(&rpc, args),
    }
}

fn cmd_list(rpc: &Client) -> i32 {
    let (enabled, clauses) = match rpc.bp_list() {
        Ok(list) => list,
        Err(err) => return fail(&err),
    };
    println!("Enabled: {}", format_on_off_badge(enabled));
    if clauses.is_empty() {
        println!("No breakpoint clauses.");
        return 0;
    }
    for (idx, clause) in clauses.iter().enumerate() {
        println!("#{:02} {}", idx + 1, bp::format_clause(clause));
    }
    0
}

fn cmd_add(rpc: &Client, args: BpAddCmd) -> i32 {
    if args.conditions.is_empty() {
        return fail_msg("Specify at least one condition.");
    }
    let clauses = match bp::parse_clauses(&args.conditions.join(" ")) {
        Ok(clauses) => clauses,
        Err(err) => return fail_msg(&err),
    };
    let mut added = Vec::with_capacity(clauses.len());
    for clause in &clauses {
        match rpc.bp_add_clause(clause) {
            Ok(idx) => added.push(usize::from(idx) + 1),
            Err(err) => return fail(&err),
        }
    }
    if added.len() == 1 {
        println!("Added clause #{}", added[0]);
    } else {
        let parts: Vec<String> = added.iter().map(|idx| format!("#{}", idx)).collect();
        println!("Added clauses: {}", parts.join(", "));
    }
    0
}

fn cmd_delete(rpc: &Client, args: BpDelCmd) -> i32 {
    if args.index == 0 {
        return fail_msg("Clause index must be >= 1.");
    }
    if let Err(err) = rpc.bp_delete_clause((args.index - 1) as u16) {
        return fail(&err);
    }
    cmd_list(rpc)
}

fn cmd_set_enabled(rpc: &Client, enabled: bool) -> i32 {
    if let Err(err) = rpc.bp_set_enabled(enabled) {
        return fail(&err);
    }
    cmd_list(rpc)
}

fn bline_mode_name(mode: u8) -> String {
    match mode {
        0 => "disabled".to_string(),
        1 => "break".to_string(),
        2 => "blink".to_string(),
        other => format!("mode{}", other),
    }
}

fn cmd_scanline(rpc: &Client, args: BLineCmd) -> i32 {
    let scanline = match args.scanline {
        Some(text) => match hex::parse_hex(&text) {
            Ok(scanline) => Some(scanline),
            Err(err) => return fail_msg(&err),
        },
        None => None,
    };
    match rpc.bline(scanline) {
        Ok((scanline, mode)) => {
            println!("scanline={} mode={}", scanline, bline_mode_name(mode));
            0
        }
        Err(err) => fail(&err),
    }
}
