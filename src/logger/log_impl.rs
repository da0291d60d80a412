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

use crate::Level;
use crate::logger::Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Logger::enabled(self, Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let caller = record
            .file()
            .map(|file| (file, record.line().unwrap_or_default()));
        let result = self.dispatch(record.level().into(), caller, *record.args());
        self.report(result);
    }

    fn flush(&self) {
        let result = Logger::flush(self);
        self.report(result);
    }
}

impl Logger {
    /// Set up the global logger of the `log` crate with this view.
    ///
    /// `log::Level::Warn` maps to `error` and `log::Level::Trace` to `debug`.
    ///
    /// # Errors
    ///
    /// An error is returned if the global logger has already been set.
    pub fn apply(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.level();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level.into());
        Ok(())
    }
}
