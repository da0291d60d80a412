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

//! Appender for writing log records to a local file that is rotated in the background.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroU64;
//! use std::num::NonZeroUsize;
//!
//! use fanlog::append::rolling_file::RotatingFileBuilder;
//! use fanlog::append::rolling_file::Rotation;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = RotatingFileBuilder::new(dir.path(), "billing")
//!     .rotation(Rotation::BySize(NonZeroU64::new(10 * 1024 * 1024).unwrap()))
//!     .max_log_files(NonZeroUsize::new(5).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(file.path(), dir.path().join("billing.log"));
//! file.close();
//! ```

pub use self::append::RotatingFile;
pub use self::append::RotatingFileBuilder;
pub use self::rotation::Rotation;

mod append;
mod clock;
mod console;
mod rolling;
mod rotation;
mod worker;
