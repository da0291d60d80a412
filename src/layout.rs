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

use jiff::Zoned;

use crate::record::Record;

/// A layout that formats a record as one line of the local log file.
///
/// Output format:
///
/// ```text
/// billing: 2024/08/10 17:12:52 invoices: info: sent 12 invoices
/// billing: 2024/08/10 17:12:53 invoices: error: smtp relay refused connection
/// ```
#[derive(Debug, Clone)]
pub struct TextLayout {
    name: String,
}

impl TextLayout {
    /// Creates a layout that prefixes every line with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Formats `record` as observed at `now`, including the trailing newline.
    pub fn format(&self, record: &Record, now: &Zoned) -> Vec<u8> {
        let time = now.strftime("%Y/%m/%d %H:%M:%S");
        format!("{}: {time} {}\n", self.name, record.payload()).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::Level;

    #[test]
    fn test_format_line() {
        let layout = TextLayout::new("billing");
        let now = Zoned::from_str("2024-08-10T17:12:52+08[+08]").unwrap();
        let record = Record::new(Level::Info, "invoices: info: sent 12 invoices");

        let line = String::from_utf8(layout.format(&record, &now)).unwrap();
        assert!(line.ends_with('\n'));
        insta::assert_snapshot!(line.trim_end(), @"billing: 2024/08/10 17:12:52 invoices: info: sent 12 invoices");
    }
}
