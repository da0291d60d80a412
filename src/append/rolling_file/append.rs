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

use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::append::Append;
use crate::append::rolling_file::Rotation;
use crate::append::rolling_file::clock::Clock;
use crate::append::rolling_file::console::Console;
use crate::append::rolling_file::rolling::LogFile;
use crate::append::rolling_file::worker::Worker;
use crate::layout::TextLayout;
use crate::record::Record;
use crate::trap::DefaultTrap;

const DEFAULT_MAX_SIZE: NonZeroU64 = match NonZeroU64::new(10 * 1024 * 1024) {
    Some(n) => n,
    None => unreachable!(),
};

const DEFAULT_MAX_FILES: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

/// A builder to configure and create a [`RotatingFile`] appender.
#[derive(Debug)]
pub struct RotatingFileBuilder {
    // required
    basedir: PathBuf,
    name: String,

    // has default
    rotation: Rotation,
    max_files: NonZeroUsize,
    console: bool,
    poll_interval: Option<Duration>,
    clock: Clock,
    trap: Arc<dyn Trap>,
}

impl RotatingFileBuilder {
    /// Create a new builder for `<basedir>/<name>.log`.
    #[must_use]
    pub fn new(basedir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            basedir: basedir.into(),
            name: name.into(),
            rotation: Rotation::BySize(DEFAULT_MAX_SIZE),
            max_files: DEFAULT_MAX_FILES,
            console: false,
            poll_interval: None,
            clock: Clock::DefaultClock,
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Set the rotation policy.
    ///
    /// Default to rotating once the file reaches 10 MiB.
    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the maximum number of rotated files to keep. Default to 3.
    #[must_use]
    pub fn max_log_files(mut self, n: NonZeroUsize) -> Self {
        self.max_files = n;
        self
    }

    /// Mirror every line to standard output.
    #[must_use]
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Set how often the background thread checks the rotation policy.
    ///
    /// Default to [`Rotation::default_poll_interval`].
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the trap for errors of the background thread and the retention passes.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    pub(crate) fn shared_trap(mut self, trap: Arc<dyn Trap>) -> Self {
        self.trap = trap;
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build the [`RotatingFile`] and start its rotation thread.
    ///
    /// # Errors
    ///
    /// Return an [`Initialization`](ErrorKind::Initialization) error if either:
    ///
    /// * The log directory cannot be created.
    /// * The main log file cannot be opened.
    /// * The rotation thread cannot be spawned.
    ///
    /// Return a [`ConfigInvalid`](ErrorKind::ConfigInvalid) error if the name is empty.
    pub fn build(self) -> Result<RotatingFile, Error> {
        let Self {
            basedir,
            name,
            rotation,
            max_files,
            console,
            poll_interval,
            clock,
            trap,
        } = self;

        if name.is_empty() {
            return Err(Error::config_invalid("logger name must not be empty"));
        }

        let layout = TextLayout::new(&name);
        let console = Console::new(console);
        let file = Arc::new(LogFile::open(
            basedir, &name, max_files, console, clock, trap,
        )?);
        file.prune();

        let poll_interval = poll_interval.unwrap_or_else(|| rotation.default_poll_interval());
        let (shutdown, receiver) = crossbeam_channel::bounded(1);
        let handle = Worker::new(file.clone(), rotation, poll_interval, receiver)
            .make_thread("fanlog-rotation".to_string())
            .map_err(|err| {
                Error::new(ErrorKind::Initialization, "failed to spawn rotation thread")
                    .with_source(err)
            })?;

        Ok(RotatingFile {
            file,
            layout,
            worker: Mutex::new(Some(WorkerHandle { shutdown, handle })),
        })
    }
}

#[derive(Debug)]
struct WorkerHandle {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// An appender that writes log records to `<dir>/<name>.log` and rotates it in the background.
///
/// Every line is written with a single write under the handle lock, so a rotation happens
/// either entirely before or entirely after any given line.
#[derive(Debug)]
pub struct RotatingFile {
    file: Arc<LogFile>,
    layout: TextLayout,
    worker: Mutex<Option<WorkerHandle>>,
}

impl RotatingFile {
    /// The path of the main log file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Rotate the main log file now, then run a retention pass.
    ///
    /// # Errors
    ///
    /// Return an error if the file is closed, or it cannot be renamed or reopened. Retention
    /// failures are sent to the trap.
    pub fn rotate(&self) -> Result<(), Error> {
        self.file.rotate_and_prune()
    }

    /// Whether [`RotatingFile::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.file.is_closed()
    }

    /// Stop the rotation thread and close the file.
    ///
    /// Calling it again is a no-op. Appends afterwards fail with
    /// [`Closed`](ErrorKind::Closed).
    pub fn close(&self) {
        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(WorkerHandle { shutdown, handle }) = worker {
            // disconnecting wakes the worker up immediately
            drop(shutdown);
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                self.file
                    .trap(&Error::new(ErrorKind::Unexpected, "rotation thread panicked"));
            }
        }
        self.file.close();
    }
}

impl Append for RotatingFile {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let now = self.file.now();
        let bytes = self.layout.format(record, &now);
        self.file.write(&bytes)
    }

    fn flush(&self) -> Result<(), Error> {
        self.file.flush()
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        self.close();
    }
}
