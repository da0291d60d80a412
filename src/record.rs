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

//! Log record.

use crate::Level;

/// A composed log event, ready to be written to a sink.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    level: Level,
    payload: &'a str,
}

impl<'a> Record<'a> {
    /// Creates a record from a level and the fully composed message.
    pub fn new(level: Level, payload: &'a str) -> Self {
        Self { level, payload }
    }

    /// The severity of the event.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message body.
    pub fn payload(&self) -> &'a str {
        self.payload
    }
}
