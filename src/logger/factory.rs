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

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::Error;
use crate::LoggerConfig;
use crate::Trap;
use crate::append::RotatingFileBuilder;
use crate::append::Syslog;
use crate::logger::Backend;
use crate::logger::Logger;
use crate::trap::DefaultTrap;

/// A builder to configure and create a [`LoggerFactory`].
#[derive(Debug)]
pub struct LoggerFactoryBuilder {
    config: LoggerConfig,
    trap: Arc<dyn Trap>,
    poll_interval: Option<Duration>,
}

impl LoggerFactoryBuilder {
    /// Create a new builder from a configuration.
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            trap: Arc::new(DefaultTrap::default()),
            poll_interval: None,
        }
    }

    /// Set the trap receiving background and best-effort errors of all sinks.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    /// Set how often the rotation thread checks the rotation policy.
    ///
    /// Default to 10 seconds for size-based and 1 second for time-based rotation.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Validate the configuration and open the sinks.
    ///
    /// A syslog connection that cannot be established is reported to the trap and syslog is
    /// left disabled.
    ///
    /// # Errors
    ///
    /// Return a [`ConfigInvalid`](crate::ErrorKind::ConfigInvalid) error if the configuration
    /// is rejected, before any resource is opened. Return an
    /// [`Initialization`](crate::ErrorKind::Initialization) error if the log directory or the
    /// main log file cannot be opened.
    pub fn build(self) -> Result<LoggerFactory, Error> {
        let LoggerFactoryBuilder {
            config,
            trap,
            poll_interval,
        } = self;

        config.validate()?;
        let level = config.level()?;

        let mut builder =
            RotatingFileBuilder::new(config.output_folder.clone(), config.logger_name.clone())
                .rotation(config.rotation()?)
                .max_log_files(config.max_log_files()?)
                .console(config.enable_console_log)
                .shared_trap(trap.clone());
        if let Some(interval) = poll_interval {
            builder = builder.poll_interval(interval);
        }
        let file = builder.build()?;

        let syslog = if config.enable_syslog {
            dial_syslog(&config, trap.as_ref())
        } else {
            None
        };

        let backend = Backend::new(level, file, syslog, trap);
        Ok(LoggerFactory {
            backend: Arc::new(backend),
        })
    }
}

fn dial_syslog(config: &LoggerConfig, trap: &dyn Trap) -> Option<Syslog> {
    let dialed = config.syslog_protocol().and_then(|protocol| {
        let port = config.syslog_port()?;
        Syslog::dial(protocol, &config.syslog_host, port, &config.logger_name)
    });

    match dialed {
        Ok(syslog) => Some(syslog),
        Err(err) => {
            trap.trap(&err);
            None
        }
    }
}

/// Builds the shared sinks once and hands out prefixed [`Logger`] views of them.
#[derive(Debug, Clone)]
pub struct LoggerFactory {
    backend: Arc<Backend>,
}

impl LoggerFactory {
    /// Validate `config` and open the sinks with default settings.
    ///
    /// See [`LoggerFactoryBuilder::build`] for the errors.
    pub fn new(config: LoggerConfig) -> Result<LoggerFactory, Error> {
        LoggerFactoryBuilder::new(config).build()
    }

    /// Create a [`LoggerFactoryBuilder`].
    #[must_use]
    pub fn builder(config: LoggerConfig) -> LoggerFactoryBuilder {
        LoggerFactoryBuilder::new(config)
    }

    /// Create a view with the given prefix. An empty prefix adds no text.
    pub fn logger(&self, prefix: &str) -> Logger {
        Logger::new(self.backend.clone(), prefix)
    }

    /// Turn the factory into a plain constructor of views.
    pub fn into_fn(self) -> impl Fn(&str) -> Logger + Send + Sync + 'static {
        move |prefix: &str| self.logger(prefix)
    }

    /// The path of the main log file.
    pub fn log_path(&self) -> &Path {
        self.backend.file.path()
    }

    /// Whether a syslog connection was established.
    pub fn has_syslog(&self) -> bool {
        self.backend.syslog.is_some()
    }

    /// Run the shutdown hook shared by every view; see [`Logger::destroy`].
    pub fn destroy(&self) {
        self.backend.shutdown();
    }
}
