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

//! The severity-gated logger facade and the factory that builds it.

use std::ffi::OsStr;
use std::fmt;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::ErrorKind;
use crate::Level;
use crate::Trap;
use crate::append::Append;
use crate::append::RotatingFile;
use crate::append::Syslog;
use crate::record::Record;

mod factory;
mod log_impl;

pub use self::factory::LoggerFactory;
pub use self::factory::LoggerFactoryBuilder;

/// The sinks shared by every view spawned from one factory.
#[derive(Debug)]
struct Backend {
    level: Level,
    file: RotatingFile,
    syslog: Option<Syslog>,
    trap: Arc<dyn Trap>,
    destroyed: AtomicBool,
}

impl Backend {
    fn new(level: Level, file: RotatingFile, syslog: Option<Syslog>, trap: Arc<dyn Trap>) -> Self {
        Self {
            level,
            file,
            syslog,
            trap,
            destroyed: AtomicBool::new(false),
        }
    }

    fn shutdown(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.file.close();
        if let Some(syslog) = &self.syslog {
            syslog.close();
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A lightweight, prefixed view of a set of sinks.
///
/// Cloning a logger or calling [`Logger::with_prefix`] is cheap: every view produced by one
/// [`LoggerFactory`] shares a single log file, a single rotation thread and a single syslog
/// connection. [`Logger::destroy`] on any of them shuts the shared sinks down for all.
///
/// Each accepted event is composed as `<prefix>: <file:line>: <level>: <text>` and written to
/// the file sink and to syslog independently. The call site is only included when the
/// threshold is `debug`, for every level.
///
/// # Examples
///
/// ```
/// use fanlog::LoggerConfig;
/// use fanlog::LoggerFactory;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut config = LoggerConfig::new("billing");
/// config.output_folder = dir.path().to_path_buf();
///
/// let factory = LoggerFactory::new(config).unwrap();
/// let logger = factory.logger("invoices");
/// fanlog::info!(logger, "sent {} invoices", 12);
/// fanlog::debug!(logger, "suppressed below the debug threshold");
/// factory.destroy();
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    backend: Arc<Backend>,
    prefix: String,
}

impl Logger {
    fn new(backend: Arc<Backend>, prefix: &str) -> Self {
        Self {
            backend,
            prefix: prefix.to_string(),
        }
    }

    /// Create another view sharing this logger's sinks, with its own prefix.
    pub fn with_prefix(&self, prefix: &str) -> Logger {
        Logger::new(self.backend.clone(), prefix)
    }

    /// The prefix of this view, empty if none.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The severity threshold.
    pub fn level(&self) -> Level {
        self.backend.level
    }

    /// Whether events of `level` pass the threshold.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.backend.level
    }

    /// The path of the main log file.
    pub fn log_path(&self) -> &Path {
        self.backend.file.path()
    }

    /// Log an event, returning the first sink failure.
    ///
    /// Every sink is attempted even if an earlier one failed; if several fail, the later errors
    /// are attached as sources of the first.
    ///
    /// # Errors
    ///
    /// Return a [`Closed`](ErrorKind::Closed) error after [`Logger::destroy`].
    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) -> Result<(), Error> {
        let location = Location::caller();
        self.dispatch(level, Some((location.file(), location.line())), args)
    }

    /// Log a debug event. Sink failures go to the trap; writes after shutdown are no-ops.
    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.report(self.log(Level::Debug, args));
    }

    /// Log an info event. Sink failures go to the trap; writes after shutdown are no-ops.
    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.report(self.log(Level::Info, args));
    }

    /// Log an error event, which is never suppressed. Sink failures go to the trap; writes
    /// after shutdown are no-ops.
    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.report(self.log(Level::Error, args));
    }

    /// Flush every sink.
    pub fn flush(&self) -> Result<(), Error> {
        let mut result = self.backend.file.flush();
        if let Some(syslog) = &self.backend.syslog {
            result = merge(result, syslog.flush());
        }
        result
    }

    /// Stop the rotation thread, close the log file and the syslog connection.
    ///
    /// This is the shutdown hook shared by all views of the same factory. Calling it more than
    /// once, from any view or thread, is a no-op.
    pub fn destroy(&self) {
        self.backend.shutdown();
    }

    /// Whether the shared shutdown hook has run.
    pub fn is_destroyed(&self) -> bool {
        self.backend.is_destroyed()
    }

    fn dispatch(
        &self,
        level: Level,
        caller: Option<(&str, u32)>,
        args: fmt::Arguments<'_>,
    ) -> Result<(), Error> {
        if !self.enabled(level) {
            return Ok(());
        }

        let caller = match caller {
            Some((file, line)) if self.backend.level >= Level::Debug => {
                format!("{}:{line}: ", filename(file))
            }
            _ => String::new(),
        };
        let prefix = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}: ", self.prefix)
        };
        let message = format!("{prefix}{caller}{level}: {args}");
        let record = Record::new(level, &message);

        let mut result = self.backend.file.append(&record);
        if let Some(syslog) = &self.backend.syslog {
            result = merge(result, syslog.append(&record));
        }
        result
    }

    fn report(&self, result: Result<(), Error>) {
        if let Err(err) = result {
            if err.kind() != ErrorKind::Closed {
                self.backend.trap.trap(&err);
            }
        }
    }
}

fn merge(first: Result<(), Error>, second: Result<(), Error>) -> Result<(), Error> {
    match (first, second) {
        (Ok(()), second) => second,
        (Err(first), Ok(())) => Err(first),
        (Err(first), Err(second)) => Err(first.with_source(second)),
    }
}

// obtain filename only from the full path of the call site
fn filename(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or(file)
}
