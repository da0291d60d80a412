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

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;

use crate::append::rolling_file::Rotation;
use crate::append::rolling_file::rolling::LogFile;

/// The background task that rotates and prunes one [`LogFile`].
pub(crate) struct Worker {
    file: Arc<LogFile>,
    rotation: Rotation,
    poll_interval: Duration,
    last_hour: i8,
    shutdown: Receiver<()>,
}

impl Worker {
    pub(crate) fn new(
        file: Arc<LogFile>,
        rotation: Rotation,
        poll_interval: Duration,
        shutdown: Receiver<()>,
    ) -> Worker {
        let last_hour = file.now().hour();
        Self {
            file,
            rotation,
            poll_interval,
            last_hour,
            shutdown,
        }
    }

    /// Checks the rotation policy once and rotates if it says so.
    pub(crate) fn tick(&mut self) {
        let should_rotate = match self.rotation {
            Rotation::BySize(max_size) => match self.file.size() {
                Ok(size) => size.is_some_and(|n| n >= max_size.get()),
                Err(err) => {
                    self.file.trap(&err);
                    false
                }
            },
            Rotation::ByTime(_) => {
                let current_hour = self.file.now().hour();
                let crossed = self.rotation.crosses_boundary(self.last_hour, current_hour);
                self.last_hour = current_hour;
                crossed
            }
        };

        if should_rotate {
            if let Err(err) = self.file.rotate_and_prune() {
                self.file.trap(&err);
            }
        }
    }

    pub(crate) fn make_thread(mut self, name: String) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new().name(name).spawn(move || {
            loop {
                match self.shutdown.recv_timeout(self.poll_interval) {
                    Err(RecvTimeoutError::Timeout) => self.tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
    }
}
