// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::path::PathBuf;

use structopt::StructOpt;

/// Numeric arguments accept `$HH`, `0xHH`, or bare hex.
#[derive(StructOpt, Debug)]
#[structopt(name = "a800mon", about = "Atari800 monitor UI and CLI.")]
pub struct Opt {
    /// emulator socket path
    #[structopt(
        short = "s",
        long = "socket",
        default_value = "/tmp/atari.sock",
        parse(from_os_str),
        global = true
    )]
    pub socket: PathBuf,

    /// set log level (off, error, warn, info, debug, trace)
    #[structopt(long = "loglevel", default_value = "warn", global = true)]
    pub loglevel: String,

    /// set log level for a target (target=level)
    #[structopt(long = "log", number_of_values = 1, global = true)]
    pub log: Vec<String>,

    #[structopt(subcommand)]
    pub command: Option<SubCommand>,
}

#[derive(StructOpt, Debug)]
pub enum SubCommand {
    /// run the interactive monitor (default)
    Monitor,
    /// boot the emulator with the given image
    Run(RunCmd),
    /// pause emulation
    Pause,
    /// execute one instruction
    Step,
    /// run until the next vertical blank
    #[structopt(name = "stepvbl")]
    StepVbl,
    /// resume emulation
    Continue,
    /// cold start the machine
    Coldstart,
    /// warm start the machine
    Warmstart,
    /// breakpoint management
    Bp(BpCommand),
    /// memory access
    Mem(MemCommand),
    /// CPU state
    Cpu(CpuCommand),
    /// hardware state dumps
    Dump(DumpCommand),
    /// cartridge slot
    Cart(CartCommand),
    /// cassette
    Tape(TapeCommand),
    /// disk drives
    Disk(DiskCommand),
    /// emulator process control
    Emulator(EmulatorCommand),
    /// debugger data
    Debug(DebugCommand),
    /// raw protocol helpers
    Rpc(RpcCommand),
    /// render the current screen to stdout
    Screen(ScreenCmd),
    /// interactive value trainer
    Trainer(TrainerCmd),
}

#[derive(StructOpt, Debug)]
pub struct RunCmd {
    /// image path, as seen by the emulator
    pub path: String,
}

#[derive(StructOpt, Debug)]
pub enum BpCommand {
    /// list breakpoint clauses
    Ls,
    /// add clauses: conditions joined by AND / OR
    Add(BpAddCmd),
    /// delete clause by index (1-based)
    Del(BpDelCmd),
    /// remove all clauses
    Clear,
    /// enable the breakpoint table
    On,
    /// disable the breakpoint table
    Off,
    /// query or set the scanline breakpoint
    Scanline(BLineCmd),
}

#[derive(StructOpt, Debug)]
pub struct BpAddCmd {
    /// e.g. "PC == $600 AND mem[D40A] >= $70"
    pub conditions: Vec<String>,
}

#[derive(StructOpt, Debug)]
pub struct BpDelCmd {
    pub index: usize,
}

#[derive(StructOpt, Debug)]
pub struct BLineCmd {
    pub scanline: Option<String>,
}

#[derive(StructOpt, Debug)]
pub enum MemCommand {
    /// read memory
    Read(ReadMemCmd),
    /// write memory
    Write(WriteMemCmd),
    /// search memory for a byte pattern
    Search(SearchCmd),
    /// disassemble a memory window
    Disasm(DisasmCmd),
}

#[derive(StructOpt, Debug)]
pub struct ReadMemCmd {
    pub addr: String,
    pub length: String,
    /// write raw bytes to stdout
    #[structopt(long)]
    pub raw: bool,
    /// JSON output
    #[structopt(long)]
    pub json: bool,
    /// render text column as ATASCII
    #[structopt(long)]
    pub atascii: bool,
    /// bytes per dump row
    #[structopt(long)]
    pub columns: Option<usize>,
    /// omit the hex column
    #[structopt(long = "no-hex")]
    pub no_hex: bool,
    /// omit the text column
    #[structopt(long = "no-ascii")]
    pub no_ascii: bool,
}

#[derive(StructOpt, Debug)]
pub struct WriteMemCmd {
    pub addr: String,
    /// byte values; 16-bit values emit two little-endian bytes
    pub bytes: Vec<String>,
    /// hex payload ("-" reads stdin)
    #[structopt(long)]
    pub hex: Option<String>,
    /// text payload ("-" reads stdin)
    #[structopt(long)]
    pub text: Option<String>,
    /// encode --text as ATASCII
    #[structopt(long)]
    pub atascii: bool,
    /// translate payload to screen codes
    #[structopt(long)]
    pub screen: bool,
}

#[derive(StructOpt, Debug)]
pub struct SearchCmd {
    pub start: String,
    pub end: String,
    /// hex payload, or text with --atascii/--screen
    pub pattern: Vec<String>,
    /// pattern is ATASCII text
    #[structopt(long)]
    pub atascii: bool,
    /// pattern is screen-code text
    #[structopt(long = "screen")]
    pub search_screen: bool,
}

#[derive(StructOpt, Debug)]
pub struct DisasmCmd {
    pub addr: String,
    pub length: String,
}

#[derive(StructOpt, Debug)]
pub enum CpuCommand {
    /// print CPU registers
    Get,
    /// set one register
    Set(SetRegCmd),
    /// query or toggle break-on-BRK
    Bbrk(BbrkCmd),
}

#[derive(StructOpt, Debug)]
pub struct SetRegCmd {
    /// one of a, x, y, s, p, pc
    pub reg: String,
    pub value: String,
}

#[derive(StructOpt, Debug)]
pub struct BbrkCmd {
    /// on or off; prints the current setting when omitted
    pub enabled: Option<String>,
}

#[derive(StructOpt, Debug)]
pub enum DumpCommand {
    /// decode the display list
    Dlist(DumpDlistCmd),
    Gtia,
    Antic,
    Pia,
    Pokey,
}

#[derive(StructOpt, Debug)]
pub struct DumpDlistCmd {
    /// explicit display-list address
    pub addr: Option<String>,
}

#[derive(StructOpt, Debug)]
pub enum CartCommand {
    /// show cartridge slots
    Status,
    /// eject the cartridge
    Remove,
}

#[derive(StructOpt, Debug)]
pub enum TapeCommand {
    /// eject the cassette
    Remove,
}

#[derive(StructOpt, Debug)]
pub enum DiskCommand {
    /// unmount all disks
    Remove,
}

#[derive(StructOpt, Debug)]
pub enum EmulatorCommand {
    /// status and system info
    Status,
    /// reboot the machine
    Reboot(RebootCmd),
    /// shut the emulator down
    Stop,
    /// restart the emulator process
    Restart,
    /// list build capabilities
    Features,
}

#[derive(StructOpt, Debug)]
pub struct RebootCmd {
    /// cold start instead of warm start
    #[structopt(long)]
    pub cold: bool,
}

#[derive(StructOpt, Debug)]
pub enum DebugCommand {
    /// line-oriented shell into the emulator's built-in monitor
    Shell,
    /// recent instruction trace
    History(HistoryCmd),
    /// recent jump targets
    Jumps,
    /// hardware stack contents
    Stack,
}

#[derive(StructOpt, Debug)]
pub struct HistoryCmd {
    #[structopt(long, default_value = "20")]
    pub count: usize,
}

#[derive(StructOpt, Debug)]
pub enum RpcCommand {
    /// round-trip a PING frame
    Ping,
}

#[derive(StructOpt, Debug)]
pub struct ScreenCmd {
    /// plain ASCII instead of ATASCII glyphs
    #[structopt(long)]
    pub plain: bool,
}

#[derive(StructOpt, Debug)]
pub struct TrainerCmd {
    pub start: String,
    pub stop: String,
    pub value: String,
}
