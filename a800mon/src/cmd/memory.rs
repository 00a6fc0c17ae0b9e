// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io::{self, Read, Write};

use a800mon_core::{atascii, disasm, hex};
use a800mon_rpc::{Client, SEARCH_MODE_BYTES};

use super::{fail, fail_msg};
use crate::cli::{DisasmCmd, ReadMemCmd, SearchCmd, WriteMemCmd};

const DEFAULT_COLUMNS: usize = 16;

pub fn cmd_read(socket: &std::path::Path, args: ReadMemCmd) -> i32 {
    let addr = match hex::parse_hex(&args.addr) {
        Ok(addr) => addr,
        Err(err) => return fail_msg(&err),
    };
    let length = match hex::parse_hex(&args.length) {
        Ok(length) => usize::from(length),
        Err(err) => return fail_msg(&err),
    };
    let rpc = Client::new(socket);
    let data = match rpc.read_memory_chunked(addr, length, 0) {
        Ok(data) => data,
        Err(err) => return fail(&err),
    };
    if args.raw {
        let _ = io::stdout().write_all(&data);
        return 0;
    }
    if args.json {
        let bytes: Vec<String> = data.iter().map(|byte| byte.to_string()).collect();
        println!(
            "{{\"addr\":{},\"length\":{},\"bytes\":[{}]}}",
            addr,
            length,
            bytes.join(",")
        );
        return 0;
    }
    dump_memory(
        addr,
        &data,
        args.columns.unwrap_or(DEFAULT_COLUMNS),
        !args.no_hex,
        !args.no_ascii,
        args.atascii,
    );
    0
}

/// Classic hex dump: address column, hex bytes, text column.
fn dump_memory(addr: u16, data: &[u8], columns: usize, with_hex: bool, with_text: bool, use_atascii: bool) {
    let columns = columns.max(1);
    for (row_idx, chunk) in data.chunks(columns).enumerate() {
        let row_addr = addr.wrapping_add((row_idx * columns) as u16);
        let mut line = format!("{:04X}: ", row_addr);
        if with_hex {
            for idx in 0..columns {
                match chunk.get(idx) {
                    Some(byte) => line.push_str(&format!("{:02X} ", byte)),
                    None => line.push_str("   "),
                }
            }
        }
        if with_text {
            line.push(' ');
            for &byte in chunk {
                if use_atascii {
                    line.push_str(atascii::lookup_printable(byte & 0x7F));
                } else {
                    let v = byte & 0x7F;
                    line.push(if (32..=126).contains(&v) {
                        v as char
                    } else {
                        '.'
                    });
                }
            }
        }
        println!("{}", line.trim_end());
    }
}

pub fn cmd_write(socket: &std::path::Path, args: WriteMemCmd) -> i32 {
    let addr = match hex::parse_hex(&args.addr) {
        Ok(addr) => addr,
        Err(err) => return fail_msg(&err),
    };
    let has_bytes = !args.bytes.is_empty();
    let has_hex = args.hex.is_some();
    let has_text = args.text.is_some();
    if [has_bytes, has_hex, has_text].iter().filter(|&&v| v).count() != 1 {
        return fail_msg("Specify exactly one payload: <bytes...>, --hex, or --text.");
    }
    if args.atascii && !has_text {
        return fail_msg("--atascii is only valid with --text.");
    }
    let mut data = match resolve_payload(&args, has_bytes, has_hex) {
        Ok(data) => data,
        Err(err) => return fail_msg(&err),
    };
    if data.is_empty() {
        return fail_msg("No data to write.");
    }
    if data.len() > 0xFFFF {
        return fail_msg(&format!("Data too long: {} bytes (max 65535).", data.len()));
    }
    if args.screen {
        for byte in data.iter_mut() {
            *byte = atascii::atascii_to_screen(*byte);
        }
    }
    let rpc = Client::new(socket);
    match rpc.write_memory(addr, &data) {
        Ok(()) => 0,
        Err(err) => fail(&err),
    }
}

fn resolve_payload(args: &WriteMemCmd, has_bytes: bool, has_hex: bool) -> Result<Vec<u8>, String> {
    if has_bytes {
        return hex::parse_hex_values(&args.bytes);
    }
    if has_hex {
        if let Some(hex_arg) = &args.hex {
            let text = read_arg_or_stdin(hex_arg)?;
            return hex::parse_hex_payload(&text);
        }
    }
    if let Some(text_arg) = &args.text {
        let text = read_arg_or_stdin(text_arg)?;
        if args.atascii {
            return atascii::encode_text(&text);
        }
        return Ok(text.into_bytes());
    }
    Err("No data to write.".to_string())
}

fn read_arg_or_stdin(value: &str) -> Result<String, String> {
    if value.trim() != "-" {
        return Ok(value.to_string());
    }
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| err.to_string())?;
    Ok(text)
}

pub fn cmd_search(socket: &std::path::Path, args: SearchCmd) -> i32 {
    let start = match hex::parse_hex(&args.start) {
        Ok(start) => start,
        Err(err) => return fail_msg(&err),
    };
    let end = match hex::parse_hex(&args.end) {
        Ok(end) => end,
        Err(err) => return fail_msg(&err),
    };
    let raw = args.pattern.join(" ");
    let pattern = if args.atascii || args.search_screen {
        let mut pattern = match atascii::encode_text(&raw) {
            Ok(pattern) => pattern,
            Err(err) => return fail_msg(&err),
        };
        if args.search_screen {
            for byte in pattern.iter_mut() {
                *byte = atascii::atascii_to_screen(*byte);
            }
        }
        pattern
    } else {
        match hex::parse_hex_payload(&raw) {
            Ok(pattern) => pattern,
            Err(err) => return fail_msg(&err),
        }
    };
    if pattern.is_empty() || pattern.len() > 0xFF {
        return fail_msg("Pattern length must be in range 1..255.");
    }
    let rpc = Client::new(socket);
    let result = match rpc.search(SEARCH_MODE_BYTES, start, end, &pattern) {
        Ok(result) => result,
        Err(err) => return fail(&err),
    };
    println!("matches={} returned={}", result.total, result.addrs.len());
    for addr in result.addrs {
        println!("{:04X}", addr);
    }
    0
}

pub fn cmd_disasm(socket: &std::path::Path, args: DisasmCmd) -> i32 {
    let addr = match hex::parse_hex(&args.addr) {
        Ok(addr) => addr,
        Err(err) => return fail_msg(&err),
    };
    let length = match hex::parse_hex(&args.length) {
        Ok(length) => usize::from(length),
        Err(err) => return fail_msg(&err),
    };
    let rpc = Client::new(socket);
    let data = match rpc.read_memory_chunked(addr, length, 0) {
        Ok(data) => data,
        Err(err) => return fail(&err),
    };
    for line in disasm::disasm(addr, &data) {
        println!("{}", line);
    }
    0
}
