// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Appender for relaying log records to a remote syslog collector.
//!
//! # Examples
//!
//!```rust, no_run
//! use fanlog::append::Append;
//! use fanlog::append::syslog::Protocol;
//! use fanlog::append::syslog::Syslog;
//! use fanlog::record::Record;
//! use fanlog::Level;
//!
//! let syslog = Syslog::dial(Protocol::Udp, "logs.internal", 514, "billing").unwrap();
//! syslog.append(&Record::new(Level::Info, "info: relayed")).unwrap();
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;

use fasyslog::Severity;
use fasyslog::format::SyslogContext;
use fasyslog::sender::SyslogSender;

use crate::Error;
use crate::ErrorKind;
use crate::Level;
use crate::append::Append;
use crate::record::Record;

/// The transport used to reach the syslog collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    fn as_str(&self) -> &'static str {
        match self {
            Protocol::Udp => "udp",
            Protocol::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(Protocol::Udp),
            "tcp" => Ok(Protocol::Tcp),
            _ => Err(Error::config_invalid(format!(
                "invalid syslog protocol: {s} (must be udp or tcp)"
            ))),
        }
    }
}

fn level_to_severity(level: Level) -> Severity {
    match level {
        Level::Error => Severity::ERROR,
        Level::Info => Severity::INFORMATIONAL,
        Level::Debug => Severity::DEBUG,
    }
}

/// An appender that sends RFC 3164 formatted records to a syslog collector.
#[derive(Debug)]
pub struct Syslog {
    sender: Mutex<Option<SyslogSender>>,
    context: SyslogContext,
}

impl Syslog {
    /// Connect to the collector at `host:port`, tagging every message with `appname`.
    ///
    /// For UDP the local socket is bound to an ephemeral port of the remote's address family.
    ///
    /// # Errors
    ///
    /// Return an [`Initialization`](ErrorKind::Initialization) error if the address cannot be
    /// resolved or the connection cannot be established.
    pub fn dial(
        protocol: Protocol,
        host: &str,
        port: u16,
        appname: &str,
    ) -> Result<Syslog, Error> {
        let dial_error = |err: std::io::Error| {
            Error::new(ErrorKind::Initialization, "failed to connect to syslog")
                .with_context("protocol", protocol)
                .with_context("addr", format!("{host}:{port}"))
                .with_source(err)
        };

        let sender = match protocol {
            Protocol::Tcp => fasyslog::sender::tcp((host, port))
                .map(SyslogSender::Tcp)
                .map_err(dial_error)?,
            Protocol::Udp => {
                let remote = (host, port)
                    .to_socket_addrs()
                    .map_err(dial_error)?
                    .next()
                    .ok_or_else(|| {
                        Error::new(ErrorKind::Initialization, "syslog host has no address")
                            .with_context("addr", format!("{host}:{port}"))
                    })?;
                let local = if remote.is_ipv4() {
                    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
                } else {
                    SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
                };
                fasyslog::sender::udp(local, remote)
                    .map(SyslogSender::Udp)
                    .map_err(dial_error)?
            }
        };

        let mut context = SyslogContext::default();
        context.appname(appname);
        Ok(Syslog {
            sender: Mutex::new(Some(sender)),
            context,
        })
    }

    fn sender(&self) -> MutexGuard<'_, Option<SyslogSender>> {
        self.sender.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Close the connection. Failures are ignored and calling it again is a no-op.
    pub fn close(&self) {
        if let Some(mut sender) = self.sender().take() {
            let _ = sender.flush();
        }
    }

    /// Whether [`Syslog::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }
}

impl Append for Syslog {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let severity = level_to_severity(record.level());
        let message = format!(
            "{}",
            self.context
                .format_rfc3164(severity, Some(record.payload()))
        );

        let mut sender = self.sender();
        let sender = sender
            .as_mut()
            .ok_or_else(|| Error::closed("syslog connection is closed"))?;
        sender
            .send_formatted(message.as_bytes())
            .and_then(|()| sender.flush())
            .map_err(|err| {
                Error::new(ErrorKind::Unexpected, "failed to send to syslog").with_source(err)
            })
    }

    fn flush(&self) -> Result<(), Error> {
        if let Some(sender) = self.sender().as_mut() {
            sender.flush().map_err(Error::from_io_error)?;
        }
        Ok(())
    }
}
