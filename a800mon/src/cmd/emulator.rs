// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_rpc::{machine_name, Client, Command};

use super::{cmd_simple, fail, format_on_off_badge};
use crate::cli::{CartCommand, DiskCommand, EmulatorCommand, RpcCommand, TapeCommand};

/// Capability descriptions per the emulator's build-feature table.
const CAPABILITIES: [(u16, &str); 32] = [
    (0x0001, "SDL2 video backend (VIDEO_SDL2)"),
    (0x0002, "SDL1 video backend (VIDEO_SDL)"),
    (0x0003, "Sound support (SOUND)"),
    (0x0004, "Callback sound backend (SOUND_CALLBACK)"),
    (0x0005, "Audio recording (AUDIO_RECORDING)"),
    (0x0006, "Video recording (VIDEO_RECORDING)"),
    (0x0007, "Code breakpoints/history (MONITOR_BREAK)"),
    (0x0008, "User breakpoint table (MONITOR_BREAKPOINTS)"),
    (0x0009, "Readline monitor support (MONITOR_READLINE)"),
    (0x000A, "Disassembler label hints (MONITOR_HINTS)"),
    (0x000B, "UTF-8 monitor output (MONITOR_UTF8)"),
    (0x000C, "ANSI monitor output (MONITOR_ANSI)"),
    (0x000D, "Monitor assembler command (MONITOR_ASSEMBLER)"),
    (0x000E, "Monitor profiling/coverage (MONITOR_PROFILE)"),
    (0x000F, "Monitor TRACE command (MONITOR_TRACE)"),
    (0x0010, "NetSIO/FujiNet emulation (NETSIO)"),
    (0x0011, "IDE emulation (IDE)"),
    (0x0012, "R: device support (R_IO_DEVICE)"),
    (0x0013, "Black Box emulation (PBI_BB)"),
    (0x0014, "MIO emulation (PBI_MIO)"),
    (0x0015, "Prototype80 emulation (PBI_PROTO80)"),
    (0x0016, "1400XL/1450XLD emulation (PBI_XLD)"),
    (0x0017, "VoiceBox emulation (VOICEBOX)"),
    (0x0018, "AF80 card emulation (AF80)"),
    (0x0019, "BIT3 card emulation (BIT3)"),
    (0x001A, "XEP80 emulation (XEP80_EMULATION)"),
    (0x001B, "NTSC filter (NTSC_FILTER)"),
    (0x001C, "PAL blending (PAL_BLENDING)"),
    (0x001D, "Crash menu support (CRASH_MENU)"),
    (0x001E, "New cycle-exact core (NEW_CYCLE_EXACT)"),
    (0x001F, "libpng support (HAVE_LIBPNG)"),
    (0x0020, "zlib support (HAVE_LIBZ)"),
];

pub fn execute(socket: &std::path::Path, command: EmulatorCommand) -> i32 {
    match command {
        EmulatorCommand::Status => cmd_status(socket),
        EmulatorCommand::Reboot(args) => {
            if args.cold {
                cmd_simple(socket, Command::Coldstart)
            } else {
                cmd_simple(socket, Command::Warmstart)
            }
        }
        EmulatorCommand::Stop => cmd_simple(socket, Command::StopEmulator),
        EmulatorCommand::Restart => cmd_simple(socket, Command::RestartEmulator),
        EmulatorCommand::Features => cmd_features(socket),
    }
}

pub fn execute_cart(socket: &std::path::Path, command: CartCommand) -> i32 {
    match command {
        CartCommand::Status => cmd_cart_status(socket),
        CartCommand::Remove => cmd_simple(socket, Command::RemoveCartridge),
    }
}

pub fn execute_tape(socket: &std::path::Path, command: TapeCommand) -> i32 {
    match command {
        TapeCommand::Remove => cmd_simple(socket, Command::RemoveTape),
    }
}

pub fn execute_disk(socket: &std::path::Path, command: DiskCommand) -> i32 {
    match command {
        DiskCommand::Remove => cmd_simple(socket, Command::RemoveDisks),
    }
}

pub fn execute_rpc(socket: &std::path::Path, command: RpcCommand) -> i32 {
    match command {
        RpcCommand::Ping => {
            let rpc = Client::new(socket);
            match rpc.call(Command::Ping, &[]) {
                Ok(data) => {
                    if !data.is_empty() {
                        let _ = std::io::Write::write_all(&mut std::io::stdout(), &data);
                        println!();
                    }
                    0
                }
                Err(err) => fail(&err),
            }
        }
    }
}

fn cmd_status(socket: &std::path::Path) -> i32 {
    let rpc = Client::new(socket);
    let status = match rpc.status() {
        Ok(status) => status,
        Err(err) => return fail(&err),
    };
    println!(
        "paused={} crashed={} machine={} emu_ms={} reset_ms={} state_seq={}",
        yes_no(status.paused),
        yes_no(status.crashed),
        machine_name(status.machine_type),
        status.emu_ms,
        status.reset_ms,
        status.state_seq,
    );
    if let Ok(sysinfo) = rpc.sysinfo() {
        println!(
            "family={} os_rev={} basic_rev={} builtin_game_rev={} basic={} tv={}",
            sysinfo.machine_family,
            sysinfo.os_revision,
            sysinfo.basic_revision,
            sysinfo.builtin_game_revision,
            yes_no(sysinfo.basic_enabled),
            if sysinfo.tv_pal { "pal" } else { "ntsc" },
        );
    }
    0
}

fn cmd_features(socket: &std::path::Path) -> i32 {
    let rpc = Client::new(socket);
    let caps = match rpc.capabilities() {
        Ok(caps) => caps,
        Err(err) => return fail(&err),
    };
    for (id, description) in &CAPABILITIES {
        println!("{} {}", format_on_off_badge(caps.contains(id)), description);
    }
    for id in caps {
        if !CAPABILITIES.iter().any(|(known, _)| *known == id) {
            println!(
                "{} Unknown capability 0x{:04X}",
                format_on_off_badge(true),
                id
            );
        }
    }
    0
}

fn cmd_cart_status(socket: &std::path::Path) -> i32 {
    let rpc = Client::new(socket);
    let cart = match rpc.cart_state() {
        Ok(cart) => cart,
        Err(err) => return fail(&err),
    };
    println!("autoreboot={}", yes_no(cart.autoreboot != 0));
    for (name, slot) in &[("main", cart.main), ("piggy", cart.piggy)] {
        println!(
            "{}: present={} type={} state={} size={}K",
            name,
            yes_no(slot.present != 0),
            slot.cart_type,
            slot.state,
            slot.size_kb,
        );
    }
    0
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
