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

use std::num::NonZeroU32;
use std::num::NonZeroU64;
use std::time::Duration;

/// Defines when the main log file is rotated.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Rotation {
    /// Rotate once the main log file holds at least this many bytes.
    BySize(NonZeroU64),
    /// Rotate when the wall-clock hour changes to a multiple of this many hours.
    ///
    /// Boundaries are aligned to the hour of day, not to the elapsed time since start. An
    /// interval of 5 rotates at 00:00, 05:00, 10:00, 15:00 and 20:00, so the last file of a day
    /// spans only four hours.
    ByTime(NonZeroU32),
}

impl Rotation {
    /// How often the background thread checks whether to rotate.
    pub fn default_poll_interval(&self) -> Duration {
        match self {
            Rotation::BySize(_) => Duration::from_secs(10),
            Rotation::ByTime(_) => Duration::from_secs(1),
        }
    }

    /// Whether moving from `last_hour` to `current_hour` crosses a time-based boundary.
    ///
    /// Always `false` for size-based rotation.
    pub fn crosses_boundary(&self, last_hour: i8, current_hour: i8) -> bool {
        match self {
            Rotation::BySize(_) => false,
            Rotation::ByTime(interval) => {
                current_hour != last_hour
                    && u32::try_from(current_hour).is_ok_and(|hour| hour % interval.get() == 0)
            }
        }
    }
}
