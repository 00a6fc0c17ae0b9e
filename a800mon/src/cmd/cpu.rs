// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::{disasm, hex};
use a800mon_rpc::{Client, Reg};

use super::{fail, fail_msg, format_on_off_badge};
use crate::cli::{BbrkCmd, CpuCommand, SetRegCmd};

pub fn execute(socket: &std::path::Path, command: CpuCommand) -> i32 {
    let rpc = Client::new(socket);
    match command {
        CpuCommand::Get => cmd_get(&rpc),
        CpuCommand::Set(args) => cmd_set(&rpc, args),
        CpuCommand::Bbrk(args) => cmd_bbrk(&rpc, args),
    }
}

fn cmd_get(rpc: &Client) -> i32 {
    let cpu = match rpc.cpu_state() {
        Ok(cpu) => cpu,
        Err(err) => return fail(&err),
    };
    println!(
        "Y={:3} X={:3}  PC={:04X} A={:02X} X={:02X} Y={:02X} S={:02X} P={}",
        cpu.ypos,
        cpu.xpos,
        cpu.pc,
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.s,
        cpu.flags_text(),
    );
    if let Ok(code) = rpc.read_memory(cpu.pc, 3) {
        println!("next: {}", disasm::disasm_one(cpu.pc, &code));
    }
    0
}

fn cmd_set(rpc: &Client, args: SetRegCmd) -> i32 {
    let reg = match args.reg.to_lowercase().as_str() {
        "a" => Reg::A,
        "x" => Reg::X,
        "y" => Reg::Y,
        "s" => Reg::S,
        "p" => Reg::P,
        "pc" => Reg::Pc,
        other => return fail_msg(&format!("Unknown register: {}", other)),
    };
    let value = match hex::parse_hex(&args.value) {
        Ok(value) => value,
        Err(err) => return fail_msg(&err),
    };
    if !matches!(reg, Reg::Pc) && value > 0xFF {
        return fail_msg(&format!("Register value out of range: {}", args.value));
    }
    match rpc.set_reg(reg, value) {
        Ok(()) => cmd_get(rpc),
        Err(err) => fail(&err),
    }
}

fn cmd_bbrk(rpc: &Client, args: BbrkCmd) -> i32 {
    let enabled = match args.enabled.as_deref().map(str::to_lowercase) {
        Some(ref text) if text == "on" || text == "1" => Some(true),
        Some(ref text) if text == "off" || text == "0" => Some(false),
        Some(other) => return fail_msg(&format!("Expected on or off, got: {}", other)),
        None => None,
    };
    match rpc.bbrk(enabled) {
        Ok(enabled) => {
            println!("break on BRK: {}", format_on_off_badge(enabled));
            0
        }
        Err(err) => fail(&err),
    }
}
