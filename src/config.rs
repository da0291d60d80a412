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

//! Logger configuration and its validation.

use std::num::NonZeroU32;
use std::num::NonZeroU64;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::Error;
use crate::Level;
use crate::append::rolling_file::Rotation;
use crate::append::syslog::Protocol;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// The configuration of a logger factory.
///
/// The struct is consumed by [`validate`] before any sink is opened. Numeric fields are signed so
/// that out-of-range input is reported as a configuration error instead of being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase", default))]
pub struct LoggerConfig {
    /// Name of the logger; the main log file is `<output_folder>/<logger_name>.log`.
    pub logger_name: String,
    /// Minimum severity, one of `error`, `info` or `debug`.
    pub level: String,
    /// Mirror file output to standard output.
    pub enable_console_log: bool,
    /// Relay every event to a remote syslog collector.
    pub enable_syslog: bool,
    /// Host name or address of the syslog collector.
    pub syslog_host: String,
    /// Port of the syslog collector, within `1..=65535`.
    pub syslog_port: i64,
    /// `udp` or `tcp`.
    pub syslog_protocol: String,
    /// Directory holding the main log file and its rotated copies.
    pub output_folder: PathBuf,
    /// Rotate by file size if `true`, by wall-clock hour otherwise.
    pub rotation_by_size: bool,
    /// Size threshold in mebibytes, used iff `rotation_by_size`.
    ///
    /// The value is scaled by `1024 * 1024` before comparing with the file length, so `10`
    /// rotates at 10 MiB and not at 10 bytes.
    #[cfg_attr(feature = "serde", serde(rename = "MaxFileSizeMB"))]
    pub max_file_size_mb: i64,
    /// Maximum number of rotated files to keep.
    pub max_log_files: i64,
    /// Rotation interval in hours, used iff not `rotation_by_size`.
    pub rotation_interval_hour: i64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            logger_name: String::new(),
            level: "info".to_string(),
            enable_console_log: false,
            enable_syslog: false,
            syslog_host: String::new(),
            syslog_port: 514,
            syslog_protocol: "udp".to_string(),
            output_folder: PathBuf::from("logs"),
            rotation_by_size: true,
            max_file_size_mb: 10,
            max_log_files: 3,
            rotation_interval_hour: 1,
        }
    }
}

impl LoggerConfig {
    /// Creates a configuration with the given logger name and default values otherwise.
    pub fn new(logger_name: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            ..Default::default()
        }
    }

    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigInvalid`](crate::ErrorKind::ConfigInvalid) error describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.logger_name.is_empty() {
            return Err(Error::config_invalid("logger name cannot be empty"));
        }

        self.level()?;

        if self.enable_syslog {
            if self.syslog_host.is_empty() {
                return Err(Error::config_invalid(
                    "syslog host cannot be empty when syslog is enabled",
                ));
            }
            self.syslog_port()?;
            self.syslog_protocol()?;
        }

        self.rotation()?;
        self.max_log_files()?;

        Ok(())
    }

    /// The parsed severity threshold.
    pub fn level(&self) -> Result<Level, Error> {
        self.level.parse()
    }

    /// The parsed syslog transport.
    pub fn syslog_protocol(&self) -> Result<Protocol, Error> {
        self.syslog_protocol.parse()
    }

    /// The syslog port, checked to be within `1..=65535`.
    pub fn syslog_port(&self) -> Result<u16, Error> {
        match u16::try_from(self.syslog_port) {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(Error::config_invalid(format!(
                "invalid syslog port: {} (must be between 1 and 65535)",
                self.syslog_port
            ))),
        }
    }

    /// The rotation policy selected by `rotation_by_size`.
    pub fn rotation(&self) -> Result<Rotation, Error> {
        if self.rotation_by_size {
            u64::try_from(self.max_file_size_mb)
                .ok()
                .and_then(|mb| mb.checked_mul(BYTES_PER_MB))
                .and_then(NonZeroU64::new)
                .map(Rotation::BySize)
                .ok_or_else(|| {
                    Error::config_invalid(
                        "log max file size must be greater than 0 when size-based rotation is enabled",
                    )
                    .with_context("max_file_size_mb", self.max_file_size_mb)
                })
        } else {
            u32::try_from(self.rotation_interval_hour)
                .ok()
                .and_then(NonZeroU32::new)
                .map(Rotation::ByTime)
                .ok_or_else(|| {
                    Error::config_invalid(
                        "log rotation interval must be greater than 0 when time-based rotation is enabled",
                    )
                    .with_context("rotation_interval_hour", self.rotation_interval_hour)
                })
        }
    }

    /// The retention count.
    pub fn max_log_files(&self) -> Result<NonZeroUsize, Error> {
        usize::try_from(self.max_log_files)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                Error::config_invalid("maximum number of log files must be greater than 0")
                    .with_context("max_log_files", self.max_log_files)
            })
    }
}

/// Checks `config` for internal consistency; see [`LoggerConfig::validate`].
pub fn validate(config: &LoggerConfig) -> Result<(), Error> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn minimal() -> LoggerConfig {
        LoggerConfig {
            logger_name: "app".to_string(),
            level: "info".to_string(),
            enable_syslog: false,
            rotation_by_size: true,
            max_file_size_mb: 10,
            max_log_files: 3,
            ..Default::default()
        }
    }

    fn assert_rejected(config: LoggerConfig) {
        let err = validate(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "{config:?}");
    }

    #[test]
    fn test_accepts_minimal_config() {
        validate(&minimal()).unwrap();
    }

    #[test]
    fn test_rejects_inconsistent_configs() {
        assert_rejected(LoggerConfig {
            logger_name: String::new(),
            ..minimal()
        });
        assert_rejected(LoggerConfig {
            level: "warn".to_string(),
            ..minimal()
        });

        let syslog = LoggerConfig {
            enable_syslog: true,
            syslog_host: "127.0.0.1".to_string(),
            syslog_port: 514,
            syslog_protocol: "udp".to_string(),
            ..minimal()
        };
        validate(&syslog).unwrap();
        assert_rejected(LoggerConfig {
            syslog_host: String::new(),
            ..syslog.clone()
        });
        assert_rejected(LoggerConfig {
            syslog_port: 0,
            ..syslog.clone()
        });
        assert_rejected(LoggerConfig {
            syslog_port: 70000,
            ..syslog.clone()
        });
        assert_rejected(LoggerConfig {
            syslog_protocol: "http".to_string(),
            ..syslog.clone()
        });

        assert_rejected(LoggerConfig {
            rotation_by_size: true,
            max_file_size_mb: 0,
            ..minimal()
        });
        assert_rejected(LoggerConfig {
            rotation_by_size: false,
            rotation_interval_hour: 0,
            ..minimal()
        });
        assert_rejected(LoggerConfig {
            max_log_files: 0,
            ..minimal()
        });
    }

    #[test]
    fn test_syslog_fields_ignored_when_disabled() {
        validate(&LoggerConfig {
            enable_syslog: false,
            syslog_port: 0,
            syslog_protocol: "http".to_string(),
            ..minimal()
        })
        .unwrap();
    }

    #[test]
    fn test_unused_rotation_field_is_not_checked() {
        validate(&LoggerConfig {
            rotation_by_size: true,
            rotation_interval_hour: 0,
            ..minimal()
        })
        .unwrap();
        validate(&LoggerConfig {
            rotation_by_size: false,
            max_file_size_mb: 0,
            rotation_interval_hour: 6,
            ..minimal()
        })
        .unwrap();
    }

    #[test]
    fn test_size_is_measured_in_mebibytes() {
        let rotation = minimal().rotation().unwrap();
        assert_eq!(
            rotation,
            Rotation::BySize(NonZeroU64::new(10 * 1024 * 1024).unwrap())
        );
    }
}
