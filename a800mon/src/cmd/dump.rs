// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::dlist::{self, DLPTRS_ADDR};
use a800mon_core::hex;
use a800mon_rpc::Client;

use super::{fail, fail_msg};
use crate::cli::{DumpCommand, DumpDlistCmd};

pub fn execute(socket: &std::path::Path, command: DumpCommand) -> i32 {
    let rpc = Client::new(socket);
    match command {
        DumpCommand::Dlist(args) => cmd_dlist(&rpc, args),
        DumpCommand::Gtia => cmd_gtia(&rpc),
        DumpCommand::Antic => cmd_antic(&rpc),
        DumpCommand::Pia => cmd_pia(&rpc),
        DumpCommand::Pokey => cmd_pokey(&rpc),
    }
}

fn cmd_dlist(rpc: &Client, args: DumpDlistCmd) -> i32 {
    let (start_addr, dump) = match args.addr {
        Some(text) => {
            let addr = match hex::parse_hex(&text) {
                Ok(addr) => addr,
                Err(err) => return fail_msg(&err),
            };
            match rpc.read_display_list_at(addr) {
                Ok(dump) => (addr, dump),
                Err(err) => return fail(&err),
            }
        }
        None => {
            let addr = match rpc.read_vector(DLPTRS_ADDR) {
                Ok(addr) => addr,
                Err(err) => return fail(&err),
            };
            match rpc.read_display_list() {
                Ok(dump) => (addr, dump),
                Err(err) => return fail(&err),
            }
        }
    };
    let decoded = dlist::decode(start_addr, &dump);
    for compacted in decoded.compacted() {
        let description = if compacted.count > 1 {
            format!("{}x {}", compacted.count, compacted.entry.description())
        } else {
            compacted.entry.description()
        };
        println!("{:04X}: {}", compacted.entry.addr, description);
    }
    0
}

fn cmd_gtia(rpc: &Client) -> i32 {
    let gtia = match rpc.gtia_state() {
        Ok(gtia) => gtia,
        Err(err) => return fail(&err),
    };
    println!(
        "HPOSP={:02X} {:02X} {:02X} {:02X}  HPOSM={:02X} {:02X} {:02X} {:02X}",
        gtia.hposp[0], gtia.hposp[1], gtia.hposp[2], gtia.hposp[3],
        gtia.hposm[0], gtia.hposm[1], gtia.hposm[2], gtia.hposm[3],
    );
    println!(
        "SIZEP={:02X} {:02X} {:02X} {:02X}  SIZEM={:02X}",
        gtia.sizep[0], gtia.sizep[1], gtia.sizep[2], gtia.sizep[3], gtia.sizem,
    );
    println!(
        "GRAFP={:02X} {:02X} {:02X} {:02X}  GRAFM={:02X}",
        gtia.grafp[0], gtia.grafp[1], gtia.grafp[2], gtia.grafp[3], gtia.grafm,
    );
    println!(
        "COLPM={:02X} {:02X} {:02X} {:02X}  COLPF={:02X} {:02X} {:02X} {:02X}  COLBK={:02X}",
        gtia.colpm[0], gtia.colpm[1], gtia.colpm[2], gtia.colpm[3],
        gtia.colpf[0], gtia.colpf[1], gtia.colpf[2], gtia.colpf[3], gtia.colbk,
    );
    println!(
        "PRIOR={:02X} VDELAY={:02X} GRACTL={:02X}",
        gtia.prior, gtia.vdelay, gtia.gractl,
    );
    0
}

fn cmd_antic(rpc: &Client) -> i32 {
    let antic = match rpc.antic_state() {
        Ok(antic) => antic,
        Err(err) => return fail(&err),
    };
    println!(
        "DMACTL={:02X} CHACTL={:02X} DLIST={:04X} HSCROL={:02X} VSCROL={:02X}",
        antic.dmactl, antic.chactl, antic.dlist, antic.hscrol, antic.vscrol,
    );
    println!(
        "PMBASE={:02X} CHBASE={:02X} VCOUNT={:02X} NMIEN={:02X} YPOS={}",
        antic.pmbase, antic.chbase, antic.vcount, antic.nmien, antic.ypos,
    );
    0
}

fn cmd_pia(rpc: &Client) -> i32 {
    let pia = match rpc.pia_state() {
        Ok(pia) => pia,
        Err(err) => return fail(&err),
    };
    println!(
        "PACTL={:02X} PBCTL={:02X} PORTA={:02X} PORTB={:02X}",
        pia.pactl, pia.pbctl, pia.porta, pia.portb,
    );
    0
}

fn cmd_pokey(rpc: &Client) -> i32 {
    let pokey = match rpc.pokey_state() {
        Ok(pokey) => pokey,
        Err(err) => return fail(&err),
    };
    println!(
        "AUDF={:02X} {:02X} {:02X} {:02X}  AUDC={:02X} {:02X} {:02X} {:02X}  AUDCTL={:02X}",
        pokey.audf1[0], pokey.audf1[1], pokey.audf1[2], pokey.audf1[3],
        pokey.audc1[0], pokey.audc1[1], pokey.audc1[2], pokey.audc1[3], pokey.audctl1,
    );
    println!(
        "KBCODE={:02X} IRQEN={:02X} IRQST={:02X} SKSTAT={:02X} SKCTL={:02X}",
        pokey.kbcode, pokey.irqen, pokey.irqst, pokey.skstat, pokey.skctl,
    );
    if pokey.has_chip2 {
        println!(
            "AUDF2={:02X} {:02X} {:02X} {:02X}  AUDC2={:02X} {:02X} {:02X} {:02X}  AUDCTL2={:02X}",
            pokey.audf2[0], pokey.audf2[1], pokey.audf2[2], pokey.audf2[3],
            pokey.audc2[0], pokey.audc2[1], pokey.audc2[2], pokey.audc2[3], pokey.audctl2,
        );
    }
    0
}
