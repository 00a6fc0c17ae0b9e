// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use a800mon_core::atascii;
use a800mon_core::dlist::{self, MemoryMapper, DLPTRS_ADDR, DMACTL_ADDR, DMACTL_HW_ADDR};
use a800mon_rpc::Client;

use super::fail;
use crate::cli::ScreenCmd;

const FETCH_CHUNK: usize = 0x400;

/// Walk the display list and print the text rows the machine is showing.
pub fn execute(socket: &std::path::Path, args: ScreenCmd) -> i32 {
    let rpc = Client::new(socket);
    let start_addr = match rpc.read_vector(DLPTRS_ADDR) {
        Ok(addr) => addr,
        Err(err) => return fail(&err),
    };
    let dump = match rpc.read_display_list() {
        Ok(dump) => dump,
        Err(err) => return fail(&err),
    };
    let mut dmactl = match rpc.read_byte(DMACTL_ADDR) {
        Ok(dmactl) => dmactl,
        Err(err) => return fail(&err),
    };
    if dmactl & 0x03 == 0 {
        if let Ok(hw) = rpc.read_byte(DMACTL_HW_ADDR) {
            dmactl = hw;
        }
    }
    let decoded = dlist::decode(start_addr, &dump);
    let mapper = MemoryMapper::new(&decoded, dmactl, FETCH_CHUNK);
    let (_, row_slices) = mapper.plan();
    for slice in row_slices {
        let data = match rpc.read_memory_chunked(slice.addr, slice.length, FETCH_CHUNK) {
            Ok(data) => data,
            Err(err) => return fail(&err),
        };
        let text: String = data
            .iter()
            .map(|&byte| {
                if args.plain {
                    let v = atascii::screen_to_atascii(byte) & 0x7F;
                    if (32..=126).contains(&v) {
                        v as char
                    } else {
                        '.'
                    }
                } else {
                    let code = atascii::screen_to_atascii(byte);
                    atascii::lookup_printable(code & 0x7F)
                        .chars()
                        .next()
                        .unwrap_or('.')
                }
            })
            .collect();
        println!("{:04X}: {}", slice.addr, text);
    }
    0
}
