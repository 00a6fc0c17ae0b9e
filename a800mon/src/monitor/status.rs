// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Adaptive-cadence status poller. Runs once per main-loop iteration and
//! decides whether to issue a STATUS round trip this tick.

use std::time::{Duration, Instant};

use a800mon_core::disasm;
use a800mon_rpc::{Client, CAP_MONITOR_BREAKPOINTS};

use super::actions::{Action, Dispatcher};
use super::state::StateStore;

pub const RUNNING_INTERVAL: Duration = Duration::from_millis(50);
pub const PAUSED_INTERVAL: Duration = Duration::from_millis(200);
pub const ERROR_INTERVAL: Duration = Duration::from_millis(1000);

const CAPS_RETRY_INTERVAL: Duration = Duration::from_secs(1);

pub struct StatusUpdater {
    paused_interval: Duration,
    running_interval: Duration,
    error_interval: Duration,
    last_poll: Option<Instant>,
    force_refresh: bool,
    caps_synced: bool,
    last_caps_attempt: Option<Instant>,
}

impl StatusUpdater {
    pub fn new() -> StatusUpdater {
        StatusUpdater::with_intervals(PAUSED_INTERVAL, RUNNING_INTERVAL)
    }

    pub fn with_intervals(paused: Duration, running: Duration) -> StatusUpdater {
        StatusUpdater {
            paused_interval: paused,
            running_interval: running,
            error_interval: ERROR_INTERVAL,
            last_poll: None,
            force_refresh: false,
            caps_synced: false,
            last_caps_attempt: None,
        }
    }

    /// Bypass the interval check exactly once on the next tick.
    pub fn request_refresh(&mut self) {
        self.force_refresh = true;
    }

    /// Whether a poll is due at `now` given the current error/run state.
    pub fn poll_due(&self, paused: bool, had_error: bool, now: Instant) -> bool {
        if self.force_refresh {
            return true;
        }
        let interval = if had_error {
            self.error_interval
        } else if paused {
            self.paused_interval
        } else {
            self.running_interval
        };
        match self.last_poll {
            Some(last) => now.duration_since(last) >= interval,
            None => true,
        }
    }

    pub fn tick(
        &mut self,
        rpc: &Client,
        store: &StateStore,
        dispatcher: &mut Dispatcher,
        now: Instant,
    ) -> bool {
        let state = store.snapshot();
        let had_error = !state.last_rpc_error.is_empty();
        if !self.poll_due(state.paused, had_error, now) {
            return false;
        }
        let forced = self.force_refresh;
        self.force_refresh = false;
        self.last_poll = Some(now);

        let status = match rpc.status() {
            Ok(status) => status,
            Err(_) => {
                self.sync_rpc_error(rpc, store, dispatcher);
                return true;
            }
        };
        let changed = state.paused != status.paused
            || state.emu_ms != status.emu_ms
            || state.reset_ms != status.reset_ms
            || state.crashed != status.crashed
            || state.state_seq != status.state_seq;
        if changed {
            dispatcher.dispatch(store, Action::SetStatus(status));
        }
        if changed || forced {
            self.update_cpu(rpc, store, dispatcher);
        }
        if had_error || !self.caps_synced {
            let due = had_error
                || self
                    .last_caps_attempt
                    .map_or(true, |last| now.duration_since(last) >= CAPS_RETRY_INTERVAL);
            if due {
                self.last_caps_attempt = Some(now);
                if self.update_capabilities(rpc, store, dispatcher) {
                    self.caps_synced = true;
                }
            }
        }
        self.sync_rpc_error(rpc, store, dispatcher);
        true
    }

    fn update_cpu(&mut self, rpc: &Client, store: &StateStore, dispatcher: &mut Dispatcher) {
        let cpu = match rpc.cpu_state() {
            Ok(cpu) => cpu,
            Err(_) => return,
        };
        let cpu_disasm = match rpc.read_memory(cpu.pc, 3) {
            Ok(code) => disasm::disasm_one(cpu.pc, &code),
            Err(_) => String::new(),
        };
        dispatcher.dispatch(store, Action::SetCpu(cpu, cpu_disasm));
    }

    fn update_capabilities(
        &mut self,
        rpc: &Client,
        store: &StateStore,
        dispatcher: &mut Dispatcher,
    ) -> bool {
        let caps = match rpc.capabilities() {
            Ok(caps) => caps,
            Err(_) => return false,
        };
        let supported = caps.contains(&CAP_MONITOR_BREAKPOINTS);
        if store.snapshot().breakpoints_supported != supported {
            dispatcher.dispatch(store, Action::SetBreakpointsSupported(supported));
        }
        true
    }

    fn sync_rpc_error(&self, rpc: &Client, store: &StateStore, dispatcher: &mut Dispatcher) {
        let text = rpc.last_error().unwrap_or_default();
        if store.snapshot().last_rpc_error != text {
            dispatcher.dispatch(store, Action::SetLastRpcError(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Minimal emulator endpoint: STATUS with a bumping sequence number,
    /// CPU_STATE, MEM_READ and a configurable capability list.
    fn fake_emulator(name: &str, caps: Vec<u16>) -> (PathBuf, Arc<AtomicU32>) {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "a800mon-status-{}-{}-{}.sock",
            name,
            std::process::id(),
            SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).expect("bind test socket");
        let state_seq = Arc::new(AtomicU32::new(1));
        let thread_seq = state_seq.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => break,
                };
                loop {
                    let mut header = [0u8; 3];
                    if stream.read_exact(&mut header).is_err() {
                        break;
                    }
                    let length = u16::from_le_bytes([header[1], header[2]]) as usize;
                    let mut payload = vec![0u8; length];
                    if length > 0 && stream.read_exact(&mut payload).is_err() {
                        break;
                    }
                    let reply: Vec<u8> = match header[0] {
                        10 => {
                            let mut out = vec![1u8];
                            out.extend_from_slice(&100u64.to_le_bytes());
                            out.extend_from_slice(&50u64.to_le_bytes());
                            out.extend_from_slice(
                                &thread_seq.load(Ordering::SeqCst).to_le_bytes(),
                            );
                            out.push(1);
                            out
                        }
                        5 => vec![0, 0, 0, 0, 0x00, 0x06, 0x2A, 0, 0, 0xFD, 0x30],
                        3 => vec![0xA9, 0x2A, 0x60],
                        27 => {
                            let mut out = (caps.len() as u16).to_le_bytes().to_vec();
                            for cap in &caps {
                                out.extend_from_slice(&cap.to_le_bytes());
                            }
                            out
                        }
                        _ => Vec::new(),
                    };
                    let mut frame = vec![0u8];
                    frame.extend_from_slice(&(reply.len() as u16).to_le_bytes());
                    frame.extend_from_slice(&reply);
                    if stream.write_all(&frame).is_err() {
                        break;
                    }
                }
            }
        });
        (path, state_seq)
    }

    #[test]
    fn tick_refreshes_status_cpu_and_capability_gate() {
        let (path, state_seq) = fake_emulator("tick", vec![1, 3]);
        let rpc = Client::new(&path);
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        let mut updater = StatusUpdater::new();
        let now = Instant::now();
        assert!(updater.tick(&rpc, &store, &mut dispatcher, now));
        let state = store.snapshot();
        assert!(state.paused);
        assert_eq!(state.emu_ms, 100);
        assert_eq!(state.state_seq, 1);
        assert_eq!(state.cpu.pc, 0x0600);
        assert_eq!(state.cpu.a, 0x2A);
        assert_eq!(state.cpu_disasm, "A9 2A    LDA #$2A");
        // capability 2 missing: the breakpoints window stays gated off
        assert!(!state.breakpoints_supported);
        assert!(state.last_rpc_error.is_empty());

        // within the paused interval nothing happens
        assert!(!updater.tick(&rpc, &store, &mut dispatcher, now + Duration::from_millis(100)));
        // a status change re-fetches the CPU on the next due poll
        state_seq.store(2, std::sync::atomic::Ordering::SeqCst);
        assert!(updater.tick(&rpc, &store, &mut dispatcher, now + Duration::from_millis(200)));
        assert_eq!(store.snapshot().state_seq, 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn tick_reports_breakpoint_support_when_advertised() {
        let (path, _) = fake_emulator("caps", vec![1, 2, 3]);
        let rpc = Client::new(&path);
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        let mut updater = StatusUpdater::new();
        assert!(updater.tick(&rpc, &store, &mut dispatcher, Instant::now()));
        assert!(store.snapshot().breakpoints_supported);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn failed_status_surfaces_the_error_and_backs_off() {
        let path = std::env::temp_dir().join(format!(
            "a800mon-status-missing-{}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let rpc = Client::new(&path);
        let store = StateStore::new();
        let mut dispatcher = Dispatcher::new();
        let mut updater = StatusUpdater::new();
        let now = Instant::now();
        assert!(updater.tick(&rpc, &store, &mut dispatcher, now));
        assert!(!store.snapshot().last_rpc_error.is_empty());
        // the error interval stretches the cadence to a second
        assert!(!updater.poll_due(false, true, now + Duration::from_millis(500)));
        assert!(updater.poll_due(false, true, now + Duration::from_millis(1000)));
    }

    #[test]
    fn cadence_picks_interval_by_state() {
        let mut updater = StatusUpdater::new();
        let start = Instant::now();
        // first tick is always due
        assert!(updater.poll_due(false, false, start));
        updater.last_poll = Some(start);
        let almost = start + Duration::from_millis(49);
        let after = start + Duration::from_millis(50);
        assert!(!updater.poll_due(false, false, almost));
        assert!(updater.poll_due(false, false, after));
        // paused stretches to 200 ms
        assert!(!updater.poll_due(true, false, start + Duration::from_millis(199)));
        assert!(updater.poll_due(true, false, start + Duration::from_millis(200)));
        // errors stretch to 1 s regardless of paused
        assert!(!updater.poll_due(false, true, start + Duration::from_millis(999)));
        assert!(updater.poll_due(true, true, start + Duration::from_millis(1000)));
    }

    #[test]
    fn forced_refresh_bypasses_the_interval_once() {
        let mut updater = StatusUpdater::new();
        let start = Instant::now();
        updater.last_poll = Some(start);
        assert!(!updater.poll_due(false, false, start));
        updater.request_refresh();
        assert!(updater.poll_due(false, false, start));
    }
}
