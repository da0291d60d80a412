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

//! Sinks for composed log records.

use std::fmt;

use crate::Error;
use crate::record::Record;

pub mod rolling_file;
pub mod syslog;

pub use self::rolling_file::RotatingFile;
pub use self::rolling_file::RotatingFileBuilder;
pub use self::syslog::Syslog;

/// A sink that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Write a log record to the sink.
    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
