// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use a800mon_core::bp;
use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::types::{
    parse_caps, AnticState, CartState, CpuState, GtiaState, HistoryEntry, JumpsState, PiaState,
    PokeyState, Reg, SearchResult, StackState, Status, Sysinfo,
};
use crate::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_CHUNK: usize = 0x400;

/// Socket connection plus everything that dies with it.
struct Slot {
    conn: Option<UnixStream>,
    caps: Vec<u16>,
    last_error: Option<String>,
}

/// Client for the emulator's monitor socket. The connection is dialed
/// lazily on the first call and cached; any transport fault drops it so the
/// next call reconnects. One request is in flight at a time.
pub struct Client {
    // Dependencies
    path: PathBuf,
    timeout: Duration,
    // Runtime State
    slot: Mutex<Slot>,
}

impl Client {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
            slot: Mutex::new(Slot {
                conn: None,
                caps: Vec::new(),
                last_error: None,
            }),
        }
    }

    pub fn with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Self {
        let mut client = Self::new(path);
        if timeout > Duration::from_millis(0) {
            client.timeout = timeout;
        }
        client
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The most recent transport or command error, if the last call failed.
    pub fn last_error(&self) -> Option<String> {
        self.slot.lock().unwrap().last_error.clone()
    }

    /// Capability set cached by the connect-time handshake.
    pub fn cached_capabilities(&self) -> Vec<u16> {
        self.slot.lock().unwrap().caps.clone()
    }

    pub fn close(&self) {
        // tolerate a poisoned lock; close also runs from Drop
        if let Ok(mut slot) = self.slot.lock() {
            disconnect(&mut slot);
        }
    }

    pub fn call(&self, command: Command, payload: &[u8]) -> Result<Vec<u8>, Error> {
        self.call_deadline(command, payload, None)
    }

    /// One request/reply round trip. The effective I/O deadline is the
    /// default timeout tightened by `deadline` when given.
    pub fn call_deadline(
        &self,
        command: Command,
        payload: &[u8],
        deadline: Option<Instant>,
    ) -> Result<Vec<u8>, Error> {
        if payload.len() > 0xFFFF {
            return Err(Error::Decode(format!(
                "payload too large: {}",
                payload.len()
            )));
        }
        let mut slot = self.slot.lock().unwrap();
        if let Err(err) = self.ensure_connected(&mut slot, deadline) {
            slot.last_error = Some(err.to_string());
            return Err(err);
        }
        match exchange(
            slot.conn.as_mut().expect("connection after connect"),
            self.io_timeout(deadline),
            command.code(),
            payload,
        ) {
            Ok(data) => {
                slot.last_error = None;
                Ok(data)
            }
            Err(err) => {
                if err.disconnects() {
                    disconnect(&mut slot);
                }
                slot.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Decode faults on a well-framed reply recover like transport faults:
    /// drop the connection so the next call redials and re-handshakes.
    fn checked<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(ref err) = result {
            if err.disconnects() {
                let mut slot = self.slot.lock().unwrap();
                disconnect(&mut slot);
                slot.last_error = Some(err.to_string());
            }
        }
        result
    }

    fn io_timeout(&self, deadline: Option<Instant>) -> Duration {
        let mut timeout = self.timeout;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < timeout {
                timeout = remaining;
            }
        }
        // a zero timeout would disable the deadline entirely
        timeout.max(Duration::from_millis(1))
    }

    fn ensure_connected(&self, slot: &mut Slot, deadline: Option<Instant>) -> Result<(), Error> {
        if slot.conn.is_some() {
            return Ok(());
        }
        let conn = UnixStream::connect(&self.path).map_err(|source| Error::Connect {
            path: self.path.display().to_string(),
            source,
        })?;
        slot.conn = Some(conn);
        debug!(target: "rpc", "connected to {}", self.path.display());
        // Capability handshake. A command error leaves the cache empty but
        // keeps the connection; a transport fault tears it down.
        match exchange(
            slot.conn.as_mut().expect("connection just stored"),
            self.io_timeout(deadline),
            Command::BuildFeatures.code(),
            &[],
        ) {
            Ok(data) => {
                slot.caps = parse_caps(&data).unwrap_or_default();
                debug!(target: "rpc", "handshake: {} capabilities", slot.caps.len());
            }
            Err(err) => {
                slot.caps = Vec::new();
                if err.disconnects() {
                    disconnect(slot);
                    slot.last_error = Some(err.to_string());
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    // -- Memory

    pub fn read_memory(&self, addr: u16, length: u16) -> Result<Vec<u8>, Error> {
        self.read_memory_deadline(addr, length, None)
    }

    pub fn read_memory_deadline(
        &self,
        addr: u16,
        length: u16,
        deadline: Option<Instant>,
    ) -> Result<Vec<u8>, Error> {
        if length == 0 {
            return Ok(Vec::new());
        }
        let mut payload = [0u8; 4];
        LittleEndian::write_u16(&mut payload[0..2], addr);
        LittleEndian::write_u16(&mut payload[2..4], length);
        self.call_deadline(Command::MemRead, &payload, deadline)
    }

    /// Split a long read into back-to-back calls whose addresses wrap at
    /// 0x10000; the deadline applies to each sub-call independently.
    pub fn read_memory_chunked(
        &self,
        addr: u16,
        length: usize,
        max_chunk: usize,
    ) -> Result<Vec<u8>, Error> {
        self.read_memory_chunked_deadline(addr, length, max_chunk, None)
    }

    pub fn read_memory_chunked_deadline(
        &self,
        addr: u16,
        length: usize,
        max_chunk: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<u8>, Error> {
        if length == 0 {
            return Ok(Vec::new());
        }
        let max_chunk = if max_chunk == 0 {
            DEFAULT_MAX_CHUNK
        } else {
            max_chunk
        };
        if length <= max_chunk {
            return self.read_memory_deadline(addr, length as u16, deadline);
        }
        let mut out = Vec::with_capacity(length);
        let mut remaining = length;
        let mut cur = addr;
        while remaining > 0 {
            let take = remaining.min(max_chunk);
            let chunk = self.read_memory_deadline(cur, take as u16, deadline)?;
            out.extend_from_slice(&chunk);
            cur = ((cur as usize + take) & 0xFFFF) as u16;
            remaining -= take;
        }
        Ok(out)
    }

    pub fn read_memory_video(&self, addr: u16, length: u16) -> Result<Vec<u8>, Error> {
        let mut payload = [0u8; 4];
        LittleEndian::write_u16(&mut payload[0..2], addr);
        LittleEndian::write_u16(&mut payload[2..4], length);
        self.call(Command::MemReadVideo, &payload)
    }

    pub fn write_memory(&self, addr: u16, data: &[u8]) -> Result<(), Error> {
        if data.len() > 0xFFFF {
            return Err(Error::Decode(format!(
                "write_memory payload too long: {} bytes (max 65535)",
                data.len()
            )));
        }
        let mut payload = Vec::with_capacity(4 + data.len());
        payload.extend_from_slice(&addr.to_le_bytes());
        payload.extend_from_slice(&(data.len() as u16).to_le_bytes());
        payload.extend_from_slice(data);
        self.call(Command::WriteMemory, &payload)?;
        Ok(())
    }

    pub fn read_vector(&self, addr: u16) -> Result<u16, Error> {
        let data = self.read_memory(addr, 2)?;
        if data.len() < 2 {
            return self.checked(Err(Error::Decode(
                "mem_read vector payload too short".to_string(),
            )));
        }
        Ok(u16::from(data[0]) | (u16::from(data[1]) << 8))
    }

    pub fn read_byte(&self, addr: u16) -> Result<u8, Error> {
        let data = self.read_memory(addr, 1)?;
        if data.is_empty() {
            return self.checked(Err(Error::Decode(
                "mem_read byte payload too short".to_string(),
            )));
        }
        Ok(data[0])
    }

    // -- Machine state

    pub fn status(&self) -> Result<Status, Error> {
        let data = self.call(Command::Status, &[])?;
        self.checked(Status::from_payload(&data))
    }

    pub fn sysinfo(&self) -> Result<Sysinfo, Error> {
        let data = self.call(Command::Sysinfo, &[])?;
        self.checked(Sysinfo::from_payload(&data))
    }

    pub fn cpu_state(&self) -> Result<CpuState, Error> {
        let data = self.call(Command::CpuState, &[])?;
        self.checked(CpuState::from_payload(&data))
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>, Error> {
        let data = self.call(Command::History, &[])?;
        self.checked(HistoryEntry::parse_list(&data))
    }

    pub fn gtia_state(&self) -> Result<GtiaState, Error> {
        let data = self.call(Command::GtiaState, &[])?;
        self.checked(GtiaState::from_payload(&data))
    }

    pub fn antic_state(&self) -> Result<AnticState, Error> {
        let data = self.call(Command::AnticState, &[])?;
        self.checked(AnticState::from_payload(&data))
    }

    pub fn pia_state(&self) -> Result<PiaState, Error> {
        let data = self.call(Command::PiaState, &[])?;
        self.checked(PiaState::from_payload(&data))
    }

    pub fn pokey_state(&self) -> Result<PokeyState, Error> {
        let data = self.call(Command::PokeyState, &[])?;
        self.checked(PokeyState::from_payload(&data))
    }

    pub fn cart_state(&self) -> Result<CartState, Error> {
        let data = self.call(Command::CartState, &[])?;
        self.checked(CartState::from_payload(&data))
    }

    pub fn jumps(&self) -> Result<JumpsState, Error> {
        let data = self.call(Command::Jumps, &[])?;
        self.checked(JumpsState::from_payload(&data))
    }

    pub fn stack(&self) -> Result<StackState, Error> {
        let data = self.call(Command::Stack, &[])?;
        self.checked(StackState::from_payload(&data))
    }

    pub fn display_list_addr(&self) -> Result<u16, Error> {
        let data = self.call(Command::DlistAddr, &[])?;
        if data.len() < 2 {
            return self.checked(Err(Error::Decode(
                "dlist_addr payload too short".to_string(),
            )));
        }
        Ok(LittleEndian::read_u16(&data[0..2]))
    }

    pub fn read_display_list(&self) -> Result<Vec<u8>, Error> {
        self.call(Command::DlistDump, &[])
    }

    pub fn read_display_list_at(&self, start_addr: u16) -> Result<Vec<u8>, Error> {
        self.call(Command::DlistDump, &start_addr.to_le_bytes())
    }

    // -- Execution control

    pub fn run(&self, path: &str) -> Result<(), Error> {
        self.call(Command::Run, path.as_bytes())?;
        Ok(())
    }

    pub fn set_reg(&self, reg: Reg, value: u16) -> Result<(), Error> {
        let mut payload = [0u8; 3];
        payload[0] = reg as u8;
        LittleEndian::write_u16(&mut payload[1..3], value);
        self.call(Command::SetReg, &payload)?;
        Ok(())
    }

    /// Break-on-BRK. With no argument the current setting is returned.
    pub fn bbrk(&self, enabled: Option<bool>) -> Result<bool, Error> {
        let payload: &[u8] = match enabled {
            Some(true) => &[1],
            Some(false) => &[0],
            None => &[],
        };
        let data = self.call(Command::Bbrk, payload)?;
        if data.is_empty() {
            return self.checked(Err(Error::Decode("BBRK payload too short".to_string())));
        }
        Ok(data[0] != 0)
    }

    /// Scanline breakpoint. Returns the active scanline and mode byte.
    pub fn bline(&self, scanline: Option<u16>) -> Result<(u16, u8), Error> {
        let payload = match scanline {
            Some(line) => line.to_le_bytes().to_vec(),
            None => Vec::new(),
        };
        let data = self.call(Command::BLine, &payload)?;
        if data.len() < 3 {
            return self.checked(Err(Error::Decode("BLINE payload too short".to_string())));
        }
        Ok((LittleEndian::read_u16(&data[0..2]), data[2]))
    }

    pub fn search(
        &self,
        mode: u8,
        start: u16,
        end: u16,
        pattern: &[u8],
    ) -> Result<SearchResult, Error> {
        if pattern.is_empty() || pattern.len() > 0xFF {
            return Err(Error::Decode(
                "Pattern length must be in range 1..255.".to_string(),
            ));
        }
        let mut payload = Vec::with_capacity(6 + pattern.len());
        payload.push(mode);
        payload.extend_from_slice(&start.to_le_bytes());
        payload.extend_from_slice(&end.to_le_bytes());
        payload.push(pattern.len() as u8);
        payload.extend_from_slice(pattern);
        let data = self.call(Command::Search, &payload)?;
        self.checked(SearchResult::from_payload(&data))
    }

    pub fn builtin_monitor(&self, input: &str) -> Result<Vec<u8>, Error> {
        self.call(Command::BuiltinMonitor, input.as_bytes())
    }

    // -- Capabilities

    /// Re-read the capability list from the server and refresh the cache.
    pub fn build_features(&self) -> Result<Vec<u16>, Error> {
        let data = self.call(Command::BuildFeatures, &[])?;
        let caps = self.checked(parse_caps(&data))?;
        self.slot.lock().unwrap().caps = caps.clone();
        Ok(caps)
    }

    pub fn capabilities(&self) -> Result<Vec<u16>, Error> {
        self.build_features()
    }

    // -- Breakpoints

    pub fn bp_clear(&self) -> Result<(), Error> {
        self.call(Command::BpClear, &[])?;
        Ok(())
    }

    /// Returns the server-assigned clause index.
    pub fn bp_add_clause(&self, conditions: &[bp::Condition]) -> Result<u16, Error> {
        let payload = bp::encode_clause(conditions).map_err(Error::Decode)?;
        let data = self.call(Command::BpAddClause, &payload)?;
        if data.len() < 2 {
            return self.checked(Err(Error::Decode(
                "bp_add_clause payload too short".to_string(),
            )));
        }
        Ok(LittleEndian::read_u16(&data[0..2]))
    }

    pub fn bp_delete_clause(&self, clause_index: u16) -> Result<(), Error> {
        self.call(Command::BpDeleteClause, &clause_index.to_le_bytes())?;
        Ok(())
    }

    pub fn bp_set_enabled(&self, enabled: bool) -> Result<bool, Error> {
        let data = self.call(Command::BpSetEnabled, &[enabled as u8])?;
        if data.is_empty() {
            return self.checked(Err(Error::Decode(
                "bp_set_enabled payload too short".to_string(),
            )));
        }
        Ok(data[0] != 0)
    }

    /// Enabled flag plus the clause table currently held by the server.
    pub fn bp_list(&self) -> Result<(bool, Vec<bp::Clause>), Error> {
        let data = self.call(Command::BpList, &[])?;
        self.checked(bp::decode_list(&data).map_err(Error::Decode))
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

fn disconnect(slot: &mut Slot) {
    if let Some(conn) = slot.conn.take() {
        let _ = conn.shutdown(std::net::Shutdown::Both);
        debug!(target: "rpc", "disconnected");
    }
    slot.caps = Vec::new();
}

/// Write one request frame and read one reply frame.
fn exchange(
    conn: &mut UnixStream,
    timeout: Duration,
    command: u8,
    payload: &[u8],
) -> Result<Vec<u8>, Error> {
    let _ = conn.set_read_timeout(Some(timeout));
    let _ = conn.set_write_timeout(Some(timeout));

    let mut packet = Vec::with_capacity(3 + payload.len());
    packet.push(command);
    packet.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    packet.extend_from_slice(payload);
    conn.write_all(&packet)?;

    let mut header = [0u8; 3];
    conn.read_exact(&mut header)?;
    let status = header[0];
    let length = LittleEndian::read_u16(&header[1..3]) as usize;
    let mut data = vec![0u8; length];
    if length > 0 {
        conn.read_exact(&mut data)?;
    }
    if status != 0 {
        return Err(Error::Command { status, data });
    }
    Ok(data)
}
