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

use logward::record::FieldValue;
use logward::DEBUG;
use logward::INFO;

// the log crate global logger can only be installed once per process
#[test]
fn test_log_crate_records_flow_into_named_loggers() {
    logward::initialize(DEBUG);
    logward::bridge::setup_log_crate();

    log::info!(target: "bridged.api", "served {} requests", 11);

    let logger = logward::get("bridged.api").unwrap();
    let record = logger.get_record().unwrap();
    assert_eq!(record.message(), "served 11 requests");
    assert_eq!(record.severity(), INFO);
    assert_eq!(record.level_name(), "INFO");
    assert_eq!(record.logger_name(), "bridged.api");

    // key-values become structured fields
    log::warn!(target: "bridged.kv", user = "bob"; "rejected");
    let record = logward::get("bridged.kv").unwrap().get_record().unwrap();
    assert_eq!(record.fields().len(), 1);
    assert_eq!(record.fields()[0].0, "user");
    assert_eq!(record.fields()[0].1, FieldValue::Str("bob".to_string()));

    // severity resolution still applies on the logward side
    let gated = logward::get_with_severity("bridged.quiet", logward::ERROR).unwrap();
    log::debug!(target: "bridged.quiet", "dropped");
    assert!(gated.get_record().is_none());

    // installing the bridge twice is an error surfaced by the log crate
    assert!(logward::bridge::try_setup_log_crate().is_err());
}
