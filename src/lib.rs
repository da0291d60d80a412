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

//! Fanlog fans every log event out to a rotating local file, an optional console mirror and an
//! optional remote syslog relay, under a severity filter.
//!
//! # Overview
//!
//! A [`LoggerFactory`] validates a [`LoggerConfig`] once, opens the sinks and starts a
//! background thread that rotates `<output_folder>/<logger_name>.log` by size or on hour
//! boundaries and prunes old rotated files. It then hands out cheap [`Logger`] views that
//! share those sinks and differ only in their text prefix.
//!
//! # Examples
//!
//! ```
//! use fanlog::LoggerConfig;
//! use fanlog::LoggerFactory;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = LoggerConfig {
//!     logger_name: "billing".to_string(),
//!     level: "debug".to_string(),
//!     output_folder: dir.path().to_path_buf(),
//!     rotation_by_size: false,
//!     rotation_interval_hour: 6,
//!     max_log_files: 4,
//!     ..Default::default()
//! };
//!
//! let new_logger = LoggerFactory::new(config).unwrap().into_fn();
//! let invoices = new_logger("invoices");
//! let payments = new_logger("payments");
//!
//! fanlog::info!(invoices, "sent {} invoices", 12);
//! fanlog::error!(payments, "card declined: {}", "insufficient funds");
//!
//! // shuts down the rotation thread and closes the file for every view
//! payments.destroy();
//! assert!(invoices.is_destroyed());
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod record;

mod config;
mod error;
mod layout;
mod level;
mod logger;
mod trap;

pub use self::config::LoggerConfig;
pub use self::config::validate;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::layout::TextLayout;
pub use self::level::Level;
pub use self::logger::Logger;
pub use self::logger::LoggerFactory;
pub use self::logger::LoggerFactoryBuilder;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;

/// Log a debug event through a [`Logger`].
///
/// ```
/// # let dir = tempfile::tempdir().unwrap();
/// # let mut config = fanlog::LoggerConfig::new("app");
/// # config.output_folder = dir.path().to_path_buf();
/// # let logger = fanlog::LoggerFactory::new(config).unwrap().logger("");
/// fanlog::debug!(logger, "cache size {}", 42);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(::std::format_args!($($arg)+))
    };
}

/// Log an info event through a [`Logger`].
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info(::std::format_args!($($arg)+))
    };
}

/// Log an error event through a [`Logger`].
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.error(::std::format_args!($($arg)+))
    };
}
