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

use std::fs;

use fanlog::LoggerConfig;
use fanlog::LoggerFactory;
use tempfile::TempDir;

#[test]
fn test_log_macros_are_routed_to_the_factory() {
    let temp_dir = TempDir::new().unwrap();
    let config = LoggerConfig {
        logger_name: "app".to_string(),
        level: "info".to_string(),
        output_folder: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let factory = LoggerFactory::new(config).unwrap();
    factory.logger("bridge").apply().unwrap();

    log::trace!("dropped");
    log::debug!("dropped");
    log::info!("hello {}", 42);
    log::warn!("low disk");
    log::logger().flush();
    factory.destroy();

    let messages = fs::read_to_string(factory.log_path())
        .unwrap()
        .lines()
        .map(|line| line["app: ".len() + 20..].to_string())
        .collect::<Vec<_>>();
    assert_eq!(messages, ["bridge: info: hello 42", "bridge: error: low disk"]);
}
