// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io::{self, BufRead, Write};

use a800mon_core::hex;
use a800mon_rpc::Client;

use super::fail_msg;
use crate::cli::TrainerCmd;
use crate::trainer::Trainer;

/// Interactive candidate-set search: `c <value>` keeps bytes that changed
/// to the value, `nc` keeps unchanged bytes, `p [limit]` prints the
/// remaining candidates, `q` quits.
pub fn execute(socket: &std::path::Path, args: TrainerCmd) -> i32 {
    let start = match hex::parse_hex(&args.start) {
        Ok(start) => start,
        Err(err) => return fail_msg(&err),
    };
    let stop = match hex::parse_hex(&args.stop) {
        Ok(stop) => stop,
        Err(err) => return fail_msg(&err),
    };
    let initial = match hex::parse_hex_byte(&args.value) {
        Ok(initial) => initial,
        Err(err) => return fail_msg(&err),
    };
    let mut trainer = match Trainer::new(start, stop) {
        Ok(trainer) => trainer,
        Err(err) => return fail_msg(&err),
    };
    let rpc = Client::new(socket);
    let mut reader = |addr: u16, length: usize| {
        rpc.read_memory_chunked(addr, length, 0)
            .map_err(|err| err.to_string())
    };

    let matches = match trainer.start(&mut reader, initial) {
        Ok(matches) => matches,
        Err(err) => return fail_msg(&err),
    };
    println!(
        "range={:04X}-{:04X} initial={:02X} matches={}",
        start, stop, initial, matches
    );
    println!("commands: c <value>, nc, p [limit], q");
    if matches == 0 {
        return 0;
    }
    if matches == 1 {
        print_matches(&trainer, 1);
    }

    let stdin = io::stdin();
    loop {
        print!("trainer> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return 0;
            }
            Ok(_) => {}
            Err(err) => return fail_msg(&err.to_string()),
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0].to_lowercase().as_str() {
            "q" => return 0,
            "p" => {
                if parts.len() > 2 {
                    println!("Usage: p [limit]");
                    continue;
                }
                let limit = if parts.len() == 2 {
                    match hex::parse_positive_int(parts[1]) {
                        Ok(limit) => limit,
                        Err(err) => {
                            println!("{}", err);
                            continue;
                        }
                    }
                } else {
                    20
                };
                println!("matches={}", trainer.match_count());
                print_matches(&trainer, limit);
            }
            "nc" => {
                if parts.len() != 1 {
                    println!("Usage: nc");
                    continue;
                }
                let matches = match trainer.not_changed(&mut reader) {
                    Ok(matches) => matches,
                    Err(err) => return fail_msg(&err),
                };
                println!("matches={}", matches);
                if matches == 0 {
                    return 0;
                }
                if matches == 1 {
                    print_matches(&trainer, 1);
                }
            }
            "c" => {
                if parts.len() != 2 {
                    println!("Usage: c <value>");
                    continue;
                }
                let value = match hex::parse_hex_byte(parts[1]) {
                    Ok(value) => value,
                    Err(err) => {
                        println!("{}", err);
                        continue;
                    }
                };
                let matches = match trainer.changed(&mut reader, value) {
                    Ok(matches) => matches,
                    Err(err) => return fail_msg(&err),
                };
                println!("matches={}", matches);
                if matches == 0 {
                    return 0;
                }
                if matches == 1 {
                    print_matches(&trainer, 1);
                }
            }
            _ => println!("Unknown command. Use: c <value>, nc, p [limit], q"),
        }
    }
}

fn print_matches(trainer: &Trainer, limit: usize) {
    let total = trainer.match_count();
    if total == 0 {
        return;
    }
    let rows = trainer.rows(limit);
    println!("idx  addr  val");
    for (idx, row) in rows.iter().enumerate() {
        println!("{:03}  {:04X}  {:02X}", idx + 1, row.addr, row.value);
    }
    if rows.len() < total {
        println!("... {} more", total - rows.len());
    }
}
