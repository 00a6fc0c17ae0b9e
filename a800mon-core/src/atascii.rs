// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! ATASCII character handling. The low 7 bits select a glyph, bit 7 selects
//! inverse video. Screen codes reorder the three 32-character groups.

pub const TABLE: [&str; 128] = [
    "♥", "┣", "┃", "┛", "┫", "┓", "╱", "╲", "◢", "◗", "◣", "◝", "◘", "◔", "▁", "◖",
    "♣", "┏", "━", "╋", "⬤", "▄", "▎", "┳", "┻", "▌", "┗", "␛", "↑", "↓", "←", "→",
    " ", "!", "\"", "#", "$", "%", "&", "'", "(", ")", "*", "+", ",", "-", ".", "/",
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", ":", ";", "<", "=", ">", "?",
    "@", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O",
    "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "[", "\\", "]", "^", "_",
    "◆", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "♠", "|", "↰", "◀", "▶",
];

pub fn screen_to_atascii(byte: u8) -> u8 {
    let mut code = byte & 0x7F;
    if code < 64 {
        code += 32;
    } else if code < 96 {
        code -= 64;
    }
    code | (byte & 0x80)
}

pub fn atascii_to_screen(byte: u8) -> u8 {
    let mut code = byte & 0x7F;
    if code < 32 {
        code += 64;
    } else if code < 96 {
        code -= 32;
    }
    code | (byte & 0x80)
}

pub fn lookup_printable(byte: u8) -> &'static str {
    TABLE[(byte & 0x7F) as usize]
}

pub fn encode_text(text: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let mut buf = [0u8; 4];
        let glyph: &str = ch.encode_utf8(&mut buf);
        match TABLE.iter().position(|&entry| entry == glyph) {
            Some(code) => out.push(code as u8),
            None => return Err(format!("cannot encode character to ATASCII: {:?}", ch)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_code_groups_swap() {
        // screen 0 is ATASCII space, screen 64 is ATASCII heart
        assert_eq!(screen_to_atascii(0), 32);
        assert_eq!(screen_to_atascii(64), 0);
        assert_eq!(screen_to_atascii(97), 97);
        assert_eq!(atascii_to_screen(32), 0);
        assert_eq!(atascii_to_screen(0), 64);
    }

    #[test]
    fn conversion_round_trips_with_inverse_bit() {
        for byte in 0..=255u8 {
            assert_eq!(atascii_to_screen(screen_to_atascii(byte)), byte);
            assert_eq!(screen_to_atascii(atascii_to_screen(byte)), byte);
        }
    }

    #[test]
    fn encode_text_maps_ascii() {
        assert_eq!(encode_text("HELLO"), Ok(vec![72, 69, 76, 76, 79]));
        assert!(encode_text("\u{1F600}").is_err());
    }
}
