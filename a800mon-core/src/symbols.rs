// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Static Atari800 memory map. Sorted by address so lookups can binary
//! search; reverse lookups rank exact over prefix over substring matches.

use crate::hex;

static SYMBOLS: &[(u16, &str)] = &[
    (0x0008, "WARMST"),
    (0x0009, "BOOT"),
    (0x000A, "DOSVEC"),
    (0x000C, "DOSINI"),
    (0x000E, "APPMHI"),
    (0x0010, "POKMSK"),
    (0x0011, "BRKKEY"),
    (0x0012, "RTCLOK"),
    (0x004D, "ATRACT"),
    (0x0052, "LMARGN"),
    (0x0053, "RMARGN"),
    (0x0054, "ROWCRS"),
    (0x0055, "COLCRS"),
    (0x0058, "SAVMSC"),
    (0x005B, "OLDROW"),
    (0x005C, "OLDCOL"),
    (0x006A, "RAMTOP"),
    (0x0200, "VDSLST"),
    (0x0202, "VPRCED"),
    (0x0204, "VINTER"),
    (0x0206, "VBREAK"),
    (0x0208, "VKEYBD"),
    (0x020A, "VSERIN"),
    (0x020C, "VSEROR"),
    (0x020E, "VSEROC"),
    (0x0210, "VTIMR1"),
    (0x0212, "VTIMR2"),
    (0x0214, "VTIMR4"),
    (0x0216, "VIMIRQ"),
    (0x0218, "CDTMV1"),
    (0x0222, "VVBLKI"),
    (0x0224, "VVBLKD"),
    (0x0226, "CDTMA1"),
    (0x022F, "SDMCTL"),
    (0x0230, "SDLSTL"),
    (0x0231, "SDLSTH"),
    (0x0232, "SSKCTL"),
    (0x0234, "LPENH"),
    (0x0235, "LPENV"),
    (0x0244, "COLDST"),
    (0x026F, "GPRIOR"),
    (0x0270, "PADDL0"),
    (0x0271, "PADDL1"),
    (0x0278, "STICK0"),
    (0x0279, "STICK1"),
    (0x027C, "PTRIG0"),
    (0x0284, "STRIG0"),
    (0x02C0, "PCOLR0"),
    (0x02C1, "PCOLR1"),
    (0x02C2, "PCOLR2"),
    (0x02C3, "PCOLR3"),
    (0x02C4, "COLOR0"),
    (0x02C5, "COLOR1"),
    (0x02C6, "COLOR2"),
    (0x02C7, "COLOR3"),
    (0x02C8, "COLOR4"),
    (0x02E5, "MEMTOP"),
    (0x02E7, "MEMLO"),
    (0x02F0, "CRSINH"),
    (0x02F3, "CHACT"),
    (0x02F4, "CHBAS"),
    (0x02FB, "ATACHR"),
    (0x02FC, "CH"),
    (0x02FD, "FILDAT"),
    (0x02FE, "DSPFLG"),
    (0x02FF, "SSFLAG"),
    (0xD000, "HPOSP0"),
    (0xD001, "HPOSP1"),
    (0xD002, "HPOSP2"),
    (0xD003, "HPOSP3"),
    (0xD004, "HPOSM0"),
    (0xD005, "HPOSM1"),
    (0xD006, "HPOSM2"),
    (0xD007, "HPOSM3"),
    (0xD008, "SIZEP0"),
    (0xD009, "SIZEP1"),
    (0xD00A, "SIZEP2"),
    (0xD00B, "SIZEP3"),
    (0xD00C, "SIZEM"),
    (0xD00D, "GRAFP0"),
    (0xD00E, "GRAFP1"),
    (0xD00F, "GRAFP2"),
    (0xD010, "GRAFP3"),
    (0xD011, "GRAFM"),
    (0xD012, "COLPM0"),
    (0xD013, "COLPM1"),
    (0xD014, "COLPM2"),
    (0xD015, "COLPM3"),
    (0xD016, "COLPF0"),
    (0xD017, "COLPF1"),
    (0xD018, "COLPF2"),
    (0xD019, "COLPF3"),
    (0xD01A, "COLBK"),
    (0xD01B, "PRIOR"),
    (0xD01C, "VDELAY"),
    (0xD01D, "GRACTL"),
    (0xD01E, "HITCLR"),
    (0xD01F, "CONSOL"),
    (0xD200, "AUDF1"),
    (0xD201, "AUDC1"),
    (0xD202, "AUDF2"),
    (0xD203, "AUDC2"),
    (0xD204, "AUDF3"),
    (0xD205, "AUDC3"),
    (0xD206, "AUDF4"),
    (0xD207, "AUDC4"),
    (0xD208, "AUDCTL"),
    (0xD209, "KBCODE"),
    (0xD20A, "SKRES"),
    (0xD20B, "POTGO"),
    (0xD20D, "SEROUT"),
    (0xD20E, "IRQEN"),
    (0xD20F, "SKCTL"),
    (0xD300, "PORTA"),
    (0xD301, "PORTB"),
    (0xD302, "PACTL"),
    (0xD303, "PBCTL"),
    (0xD400, "DMACTL"),
    (0xD401, "CHACTL"),
    (0xD402, "DLISTL"),
    (0xD403, "DLISTH"),
    (0xD404, "HSCROL"),
    (0xD405, "VSCROL"),
    (0xD407, "PMBASE"),
    (0xD409, "CHBASE"),
    (0xD40A, "WSYNC"),
    (0xD40B, "VCOUNT"),
    (0xD40C, "PENH"),
    (0xD40D, "PENV"),
    (0xD40E, "NMIEN"),
    (0xD40F, "NMIRES"),
    (0xE400, "EDITRV"),
    (0xE410, "SCRENV"),
    (0xE420, "KEYBDV"),
    (0xE430, "PRINTV"),
    (0xE440, "CASETV"),
    (0xE450, "DISKIV"),
    (0xE453, "DSKINV"),
    (0xE456, "CIOV"),
    (0xE459, "SIOV"),
    (0xE45C, "SETVBV"),
    (0xE45F, "SYSVBV"),
    (0xE462, "XITVBV"),
    (0xE465, "SIOINV"),
    (0xE468, "SENDEV"),
    (0xE46B, "INTINV"),
    (0xE46E, "CIOINV"),
    (0xE471, "BLKBDV"),
    (0xE474, "WARMSV"),
    (0xE477, "COLDSV"),
];

pub fn lookup(addr: u16) -> &'static str {
    match SYMBOLS.binary_search_by_key(&addr, |&(a, _)| a) {
        Ok(idx) => SYMBOLS[idx].1,
        Err(_) => "",
    }
}

/// Reverse lookup over the symbol names. A single-word query prefers exact,
/// then prefix, then substring matches; a multi-word query matches names
/// containing every word. Ties resolve to the lowest address.
pub fn find_by_name(query: &str) -> Option<u16> {
    let q = query.trim().trim_start_matches(';').trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    let terms: Vec<&str> = q.split_whitespace().collect();
    if terms.len() > 1 {
        return SYMBOLS
            .iter()
            .find(|&&(_, name)| {
                let lower = name.to_lowercase();
                terms.iter().all(|term| lower.contains(term))
            })
            .map(|&(addr, _)| addr);
    }

    let mut exact = None;
    let mut prefix = None;
    let mut contains = None;
    for &(addr, name) in SYMBOLS {
        let lower = name.to_lowercase();
        if lower == q {
            if exact.is_none() {
                exact = Some(addr);
            }
        } else if lower.starts_with(&q) {
            if prefix.is_none() {
                prefix = Some(addr);
            }
        } else if lower.contains(&q) && contains.is_none() {
            contains = Some(addr);
        }
    }
    exact.or(prefix).or(contains)
}

/// Symbol search falling back to a plain 1-4 digit hex address.
pub fn find_symbol_or_address(query: &str) -> Option<u16> {
    if let Some(addr) = find_by_name(query) {
        return Some(addr);
    }
    let q = query.trim().trim_start_matches(';').trim();
    if q.is_empty() || q.len() > 4 || !q.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    hex::parse_hex(q).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_by_address() {
        for pair in SYMBOLS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{:04X} out of order", pair[1].0);
        }
    }

    #[test]
    fn lookup_finds_hardware_registers() {
        assert_eq!(lookup(0xD400), "DMACTL");
        assert_eq!(lookup(0xD40A), "WSYNC");
        assert_eq!(lookup(0x1234), "");
    }

    #[test]
    fn find_prefers_exact_then_prefix_then_substring() {
        assert_eq!(find_by_name("color0"), Some(0x02C4));
        // prefix beats substring, lowest address wins
        assert_eq!(find_by_name("col"), Some(0x0244));
        assert_eq!(find_by_name("dmactl"), Some(0xD400));
        // substring only
        assert_eq!(find_by_name("sync"), Some(0xD40A));
        assert_eq!(find_by_name("zzz"), None);
    }

    #[test]
    fn multi_term_query_requires_all_terms() {
        assert_eq!(find_by_name("aud ctl"), Some(0xD208));
        assert_eq!(find_by_name("aud zzz"), None);
    }

    #[test]
    fn falls_back_to_plain_hex_address() {
        assert_eq!(find_symbol_or_address("d400"), Some(0xD400));
        assert_eq!(find_symbol_or_address("0600"), Some(0x0600));
        assert_eq!(find_symbol_or_address("not a symbol"), None);
    }
}
