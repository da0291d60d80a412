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
use std::io::Write;

/// Where lines written to the log file are mirrored.
#[derive(Debug)]
pub enum Console {
    Off,
    Stdout,
    #[cfg(test)]
    Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>),
    #[cfg(test)]
    Broken,
}

impl Console {
    pub fn new(enabled: bool) -> Console {
        if enabled {
            Console::Stdout
        } else {
            Console::Off
        }
    }

    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Console::Off => Ok(()),
            Console::Stdout => io::stdout().lock().write_all(buf),
            #[cfg(test)]
            Console::Capture(sink) => {
                sink.lock().unwrap().extend_from_slice(buf);
                Ok(())
            }
            #[cfg(test)]
            Console::Broken => Err(io::Error::new(io::ErrorKind::BrokenPipe, "console is gone")),
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        match self {
            Console::Stdout => io::stdout().flush(),
            _ => Ok(()),
        }
    }
}
