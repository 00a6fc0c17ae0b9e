// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::io;

use thiserror::Error;

/// Transport faults (and decode faults, which recover the same way) tear
/// the connection down; command errors are the server talking and leave the
/// connection alone.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot connect to socket {path}: {source}")]
    Connect { path: String, source: io::Error },
    #[error("socket i/o error: {0}")]
    Transport(#[from] io::Error),
    #[error("{}", command_message(.status, .data))]
    Command { status: u8, data: Vec<u8> },
    #[error("{0}")]
    Decode(String),
}

impl Error {
    pub fn is_command(&self) -> bool {
        match self {
            Error::Command { .. } => true,
            _ => false,
        }
    }

    /// True when the fault must tear down the cached connection.
    pub fn disconnects(&self) -> bool {
        !self.is_command()
    }
}

fn command_message(status: &u8, data: &[u8]) -> String {
    let msg = String::from_utf8_lossy(data);
    let msg = msg.trim();
    if msg.is_empty() {
        format!("remote command error: status={}", status)
    } else {
        format!("remote command error: status={} msg={}", status, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_errors_render_their_message() {
        let err = Error::Command {
            status: 3,
            data: b"bad address\n".to_vec(),
        };
        assert_eq!(err.to_string(), "remote command error: status=3 msg=bad address");
        let bare = Error::Command {
            status: 7,
            data: Vec::new(),
        };
        assert_eq!(bare.to_string(), "remote command error: status=7");
        assert!(bare.is_command());
        assert!(!bare.disconnects());
    }

    #[test]
    fn transport_errors_disconnect() {
        let err = Error::Transport(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(err.disconnects());
        let err = Error::Decode("status payload too short".to_string());
        assert!(err.disconnects());
    }
}
