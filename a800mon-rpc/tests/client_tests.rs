// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use a800mon_core::bp;
use a800mon_rpc::{Client, Command, Error, CAP_MONITOR_BREAKPOINTS};

type Handler = dyn Fn(u8, &[u8]) -> (u8, Vec<u8>) + Send + Sync;

/// In-process stand-in for the emulator's monitor socket. Records every
/// request frame and answers through the supplied handler.
struct FakeServer {
    path: PathBuf,
    log: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    connections: Arc<AtomicUsize>,
}

impl FakeServer {
    fn start(name: &str, handler: Arc<Handler>) -> FakeServer {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "a800mon-test-{}-{}-{}.sock",
            name,
            process::id(),
            SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).expect("bind test socket");
        let log: Arc<Mutex<Vec<(u8, Vec<u8>)>>> = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let thread_log = log.clone();
        let thread_connections = connections.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => break,
                };
                thread_connections.fetch_add(1, Ordering::SeqCst);
                serve_connection(stream, &handler, &thread_log);
            }
        });
        FakeServer {
            path,
            log,
            connections,
        }
    }

    fn requests(&self) -> Vec<(u8, Vec<u8>)> {
        self.log.lock().unwrap().clone()
    }

    fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn serve_connection(
    mut stream: UnixStream,
    handler: &Arc<Handler>,
    log: &Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
) {
    loop {
        let mut header = [0u8; 3];
        if stream.read_exact(&mut header).is_err() {
            return;
        }
        let length = u16::from_le_bytes([header[1], header[2]]) as usize;
        let mut payload = vec![0u8; length];
        if length > 0 && stream.read_exact(&mut payload).is_err() {
            return;
        }
        log.lock().unwrap().push((header[0], payload.clone()));
        let (status, reply) = handler(header[0], &payload);
        let mut frame = Vec::with_capacity(3 + reply.len());
        frame.push(status);
        frame.extend_from_slice(&(reply.len() as u16).to_le_bytes());
        frame.extend_from_slice(&reply);
        if stream.write_all(&frame).is_err() {
            return;
        }
    }
}

fn caps_payload(caps: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + caps.len() * 2);
    out.extend_from_slice(&(caps.len() as u16).to_le_bytes());
    for &cap in caps {
        out.extend_from_slice(&cap.to_le_bytes());
    }
    out
}

fn default_handler(caps: Vec<u16>) -> Arc<Handler> {
    Arc::new(move |cmd, payload| match cmd {
        27 => (0, caps_payload(&caps)),
        1 => (0, b"pong".to_vec()),
        3 => {
            // answer a memory read with bytes derived from the address
            let addr = u16::from_le_bytes([payload[0], payload[1]]);
            let length = u16::from_le_bytes([payload[2], payload[3]]) as usize;
            let data = (0..length)
                .map(|idx| (addr as usize + idx) as u8)
                .collect();
            (0, data)
        }
        _ => (0, Vec::new()),
    })
}

#[test]
fn first_call_performs_capability_handshake() {
    let server = FakeServer::start("handshake", default_handler(vec![1, 2, 3]));
    let client = Client::new(&server.path);
    assert_eq!(client.cached_capabilities(), Vec::<u16>::new());
    let reply = client.call(Command::Ping, &[]).unwrap();
    assert_eq!(reply, b"pong");
    assert_eq!(client.cached_capabilities(), vec![1, 2, 3]);
    let requests = server.requests();
    assert_eq!(requests[0].0, Command::BuildFeatures.code());
    assert_eq!(requests[1].0, Command::Ping.code());
    assert_eq!(server.connection_count(), 1);
}

#[test]
fn capability_gate_reflects_missing_breakpoints() {
    let server = FakeServer::start("caps", default_handler(vec![1, 3]));
    let client = Client::new(&server.path);
    let caps = client.capabilities().unwrap();
    assert!(!caps.contains(&CAP_MONITOR_BREAKPOINTS));
}

#[test]
fn command_error_keeps_the_connection() {
    let handler: Arc<Handler> = Arc::new(|cmd, _payload| match cmd {
        27 => (0, caps_payload(&[1])),
        8 => (4, b"cannot step".to_vec()),
        _ => (0, Vec::new()),
    });
    let server = FakeServer::start("cmderr", handler);
    let client = Client::new(&server.path);
    let err = client.call(Command::Step, &[]).unwrap_err();
    match err {
        Error::Command { status, ref data } => {
            assert_eq!(status, 4);
            assert_eq!(data, b"cannot step");
        }
        other => panic!("expected command error, got {:?}", other),
    }
    assert_eq!(
        client.last_error().unwrap(),
        "remote command error: status=4 msg=cannot step"
    );
    // next call goes out over the same connection and clears the error
    client.call(Command::Pause, &[]).unwrap();
    assert_eq!(server.connection_count(), 1);
    assert_eq!(client.last_error(), None);
}

#[test]
fn chunked_read_wraps_at_top_of_memory() {
    let server = FakeServer::start("chunked", default_handler(vec![]));
    let client = Client::new(&server.path);
    let data = client.read_memory_chunked(0xFFFE, 4, 2).unwrap();
    assert_eq!(data, vec![0xFE, 0xFF, 0x00, 0x01]);
    let reads: Vec<(u16, u16)> = server
        .requests()
        .iter()
        .filter(|(cmd, _)| *cmd == Command::MemRead.code())
        .map(|(_, payload)| {
            (
                u16::from_le_bytes([payload[0], payload[1]]),
                u16::from_le_bytes([payload[2], payload[3]]),
            )
        })
        .collect();
    assert_eq!(reads, vec![(0xFFFE, 2), (0x0000, 2)]);
}

#[test]
fn chunked_read_issues_ceil_div_subcalls() {
    let server = FakeServer::start("chunkcount", default_handler(vec![]));
    let client = Client::new(&server.path);
    let data = client.read_memory_chunked(0x1000, 2500, 1024).unwrap();
    assert_eq!(data.len(), 2500);
    let reads = server
        .requests()
        .iter()
        .filter(|(cmd, _)| *cmd == Command::MemRead.code())
        .count();
    assert_eq!(reads, 3);
}

#[test]
fn short_reply_disconnects_and_next_call_redials() {
    let handler: Arc<Handler> = Arc::new(|cmd, _payload| match cmd {
        27 => (0, caps_payload(&[1, 2])),
        10 => (0, vec![0u8; 3]),
        _ => (0, Vec::new()),
    });
    let server = FakeServer::start("shortreply", handler);
    let client = Client::new(&server.path);
    let err = client.status().unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert!(client.last_error().is_some());
    // decode faults clear the capability cache with the connection
    assert_eq!(client.cached_capabilities(), Vec::<u16>::new());
    client.call(Command::Ping, &[]).unwrap();
    assert_eq!(server.connection_count(), 2);
    assert_eq!(client.cached_capabilities(), vec![1, 2]);
}

#[test]
fn write_memory_frames_address_length_and_bytes() {
    let server = FakeServer::start("write", default_handler(vec![]));
    let client = Client::new(&server.path);
    client.write_memory(0x0600, &[0xA9, 0x2A, 0x60]).unwrap();
    let requests = server.requests();
    let (cmd, payload) = &requests[1];
    assert_eq!(*cmd, Command::WriteMemory.code());
    assert_eq!(payload, &vec![0x00, 0x06, 0x03, 0x00, 0xA9, 0x2A, 0x60]);
}

#[test]
fn bp_add_clause_sends_wire_encoding() {
    let handler: Arc<Handler> = Arc::new(|cmd, _payload| match cmd {
        27 => (0, caps_payload(&[2])),
        23 => (0, vec![5, 0]),
        _ => (0, Vec::new()),
    });
    let server = FakeServer::start("bpadd", handler);
    let client = Client::new(&server.path);
    let clause = vec![bp::Condition {
        cond_type: bp::COND_PC,
        op: bp::OP_EQ,
        addr: 0,
        value: 0x0600,
    }];
    let index = client.bp_add_clause(&clause).unwrap();
    assert_eq!(index, 5);
    let requests = server.requests();
    let (_, payload) = &requests[1];
    assert_eq!(&payload[..4], &[0xFF, 0xFF, 1, 0]);
    assert_eq!(&payload[4..], &[1, 3, 0, 0, 0x00, 0x06]);
}

#[test]
fn bp_list_round_trips_clauses() {
    let clauses = vec![vec![
        bp::Condition {
            cond_type: bp::COND_MEM,
            op: bp::OP_GE,
            addr: 0xD40A,
            value: 0x70,
        },
        bp::Condition {
            cond_type: bp::COND_A,
            op: bp::OP_LT,
            addr: 0,
            value: 0x0A,
        },
    ]];
    let reply = {
        let mut out = vec![1u8, 1, 0];
        out.push(2);
        out.push(0);
        for cond in &clauses[0] {
            out.push(cond.cond_type);
            out.push(cond.op);
            out.extend_from_slice(&cond.addr.to_le_bytes());
            out.extend_from_slice(&cond.value.to_le_bytes());
        }
        out
    };
    let handler: Arc<Handler> = Arc::new(move |cmd, _payload| match cmd {
        27 => (0, caps_payload(&[2])),
        26 => (0, reply.clone()),
        _ => (0, Vec::new()),
    });
    let server = FakeServer::start("bplist", handler);
    let client = Client::new(&server.path);
    let (enabled, listed) = client.bp_list().unwrap();
    assert!(enabled);
    assert_eq!(listed, clauses);
}

#[test]
fn connect_failure_is_reported_and_retried() {
    let path = std::env::temp_dir().join(format!("a800mon-test-noent-{}.sock", process::id()));
    let _ = std::fs::remove_file(&path);
    let client = Client::new(&path);
    let err = client.call(Command::Ping, &[]).unwrap_err();
    assert!(matches!(err, Error::Connect { .. }));
    assert!(client
        .last_error()
        .unwrap()
        .starts_with("Cannot connect to socket"));
    // bring the server up; the next call dials fresh
    let server = FakeServer::start("lateboot", default_handler(vec![1]));
    std::fs::remove_file(&path).ok();
    let client = Client::new(&server.path);
    assert_eq!(client.call(Command::Ping, &[]).unwrap(), b"pong");
}
