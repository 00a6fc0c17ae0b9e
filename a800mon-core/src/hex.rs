// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Hex literal parsing shared by the CLI and the monitor widgets. All
//! address-like arguments accept `$HH`, `0xHH` and bare hex.

use std::result::Result;

pub fn parse_hex(value: &str) -> Result<u16, String> {
    let text = value.trim().to_lowercase();
    let text = text
        .trim_start_matches('$')
        .trim_start_matches("0x");
    u16::from_str_radix(text, 16).map_err(|_| format!("Invalid hex value: {}", value))
}

pub fn parse_hex_byte(value: &str) -> Result<u8, String> {
    let parsed = parse_hex(value).map_err(|_| format!("Invalid hex byte: {}", value))?;
    if parsed > 0xFF {
        return Err(format!("Hex byte out of range: {}", value));
    }
    Ok(parsed as u8)
}

/// Each token becomes one byte, or two little-endian bytes when it exceeds
/// 0xFF. Used by `mem write <bytes...>`.
pub fn parse_hex_values(tokens: &[String]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let parsed = parse_hex(token).map_err(|_| format!("Invalid hex value: {}", token))?;
        if parsed <= 0xFF {
            out.push(parsed as u8);
        } else {
            out.push((parsed & 0xFF) as u8);
            out.push((parsed >> 8) as u8);
        }
    }
    Ok(out)
}

/// A payload is either a list of byte tokens or a single run of hex digits
/// with an even length.
pub fn parse_hex_payload(text: &str) -> Result<Vec<u8>, String> {
    let normalized = text.replace(',', " ");
    let fields: Vec<&str> = normalized.split_whitespace().collect();
    if fields.is_empty() {
        return Err("Hex payload is empty.".to_string());
    }
    if fields.len() > 1 {
        let mut out = Vec::with_capacity(fields.len());
        for token in &fields {
            out.push(parse_hex_byte(token)?);
        }
        return Ok(out);
    }
    let value = fields[0].trim().to_lowercase();
    let value = value
        .trim_start_matches('$')
        .trim_start_matches("0x");
    if value.is_empty() {
        return Err("Hex payload is empty.".to_string());
    }
    if value.len() % 2 != 0 {
        return Err("Hex payload must have an even number of digits.".to_string());
    }
    let mut out = Vec::with_capacity(value.len() / 2);
    for i in (0..value.len()).step_by(2) {
        let byte = u8::from_str_radix(&value[i..i + 2], 16)
            .map_err(|_| "Invalid hex payload.".to_string())?;
        out.push(byte);
    }
    Ok(out)
}

/// Flexible numeric literal: `$HH`, `0xHH`, `%BB` binary, `HHH` with a
/// trailing `H`, bare hex when any A-F digit appears, decimal otherwise.
/// Shared by the assembler and the breakpoint value grammar.
pub fn parse_number(token: &str) -> Result<u16, String> {
    let text = token.trim().to_uppercase();
    if text.is_empty() {
        return Err("missing operand".to_string());
    }
    let parse = |base: u32, value: &str| -> Result<u16, String> {
        if value.is_empty() {
            return Err(format!("invalid operand: {}", token));
        }
        u32::from_str_radix(value, base)
            .ok()
            .filter(|&v| v <= 0xFFFF)
            .map(|v| v as u16)
            .ok_or_else(|| format!("operand out of range: {}", token))
    };
    if let Some(rest) = text.strip_prefix('$') {
        return parse(16, rest.trim());
    }
    if let Some(rest) = text.strip_prefix("0X") {
        return parse(16, rest.trim());
    }
    if let Some(rest) = text.strip_prefix('%') {
        return parse(2, rest.trim());
    }
    if let Some(rest) = text.strip_suffix('H') {
        return parse(16, rest.trim());
    }
    if text.chars().any(|c| ('A'..='F').contains(&c)) {
        return parse(16, &text);
    }
    parse(10, &text)
}

pub fn parse_positive_int(value: &str) -> Result<usize, String> {
    let text = value.trim().to_lowercase();
    let parsed = if let Some(hex) = text.strip_prefix('$') {
        usize::from_str_radix(hex, 16)
    } else if let Some(hex) = text.strip_prefix("0x") {
        usize::from_str_radix(hex, 16)
    } else {
        text.parse::<usize>()
    };
    match parsed {
        Ok(v) if v > 0 => Ok(v),
        Ok(_) => Err("Limit must be > 0.".to_string()),
        Err(_) => Err("Invalid limit.".to_string()),
    }
}

pub fn format_hex16(value: u16) -> String {
    format!("{:04X}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_all_prefixes() {
        assert_eq!(parse_hex("$1A"), Ok(26));
        assert_eq!(parse_hex("0x1A"), Ok(26));
        assert_eq!(parse_hex("1A"), Ok(26));
        assert_eq!(parse_hex("$D400"), Ok(0xD400));
    }

    #[test]
    fn parse_hex_rejects_junk() {
        assert!(parse_hex("").is_err());
        assert!(parse_hex("G1").is_err());
        assert!(parse_hex("12345").is_err());
    }

    #[test]
    fn parse_hex_byte_checks_range() {
        assert_eq!(parse_hex_byte("FF"), Ok(0xFF));
        assert!(parse_hex_byte("100").is_err());
    }

    #[test]
    fn parse_hex_values_splits_words() {
        let tokens = vec!["12".to_string(), "D400".to_string()];
        assert_eq!(parse_hex_values(&tokens), Ok(vec![0x12, 0x00, 0xD4]));
    }

    #[test]
    fn parse_hex_payload_accepts_run_and_tokens() {
        assert_eq!(parse_hex_payload("a9 2a"), Ok(vec![0xA9, 0x2A]));
        assert_eq!(parse_hex_payload("a92a"), Ok(vec![0xA9, 0x2A]));
        assert!(parse_hex_payload("a92").is_err());
        assert!(parse_hex_payload("").is_err());
    }

    #[test]
    fn parse_number_picks_base_by_shape() {
        assert_eq!(parse_number("$1A"), Ok(0x1A));
        assert_eq!(parse_number("0x1A"), Ok(0x1A));
        assert_eq!(parse_number("%00011010"), Ok(26));
        assert_eq!(parse_number("1AH"), Ok(0x1A));
        assert_eq!(parse_number("1A"), Ok(0x1A));
        assert_eq!(parse_number("10"), Ok(10));
        assert_eq!(parse_number("26"), Ok(26));
        assert!(parse_number("").is_err());
        assert!(parse_number("$").is_err());
        assert!(parse_number("70000").is_err());
        assert!(parse_number("FFFF1").is_err());
    }

    #[test]
    fn parse_positive_int_accepts_hex() {
        assert_eq!(parse_positive_int("20"), Ok(20));
        assert_eq!(parse_positive_int("$20"), Ok(32));
        assert!(parse_positive_int("0").is_err());
    }
}
