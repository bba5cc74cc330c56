/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fs;
use std::time::Duration;

use acton_relay::prelude::*;
use tempfile::TempDir;

use crate::setup::actors::Silent;
use crate::setup::initialize_tracing;

mod setup;

/// A configuration file under `$XDG_CONFIG_HOME/acton-relay` is picked up
/// by `launch`, and missing keys keep their defaults.
///
/// This is the only test in this binary touching `XDG_CONFIG_HOME`.
#[tokio::test]
async fn launch_reads_the_xdg_configuration() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new()?;
    let config_dir = temp_dir.path().join("acton-relay");
    fs::create_dir_all(&config_dir)?;
    fs::write(
        config_dir.join("config.toml"),
        r#"
        [timeouts]
        actor_shutdown_timeout_ms = 1500
        default_request_timeout_ms = 250

        [limits]
        read_chunk_size = 1024

        [defaults]
        actor_name = "configured"
        "#,
    )?;
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let runtime = ActonApp::launch_async().await;
    let config = runtime.config();
    assert_eq!(config.actor_shutdown_timeout(), Duration::from_millis(1500));
    assert_eq!(config.default_request_timeout(), Duration::from_millis(250));
    assert_eq!(config.limits.read_chunk_size, 1024);
    assert_eq!(config.limits.max_frame_size, LimitsConfig::default().max_frame_size);
    assert_eq!(config.timeouts.system_shutdown_timeout_ms, 30_000);

    let actor = runtime.new_actor::<Silent>();
    assert!(actor.name().starts_with("configured"));
    let handle = actor.start(|_| Ok(Behavior::new()));
    assert_eq!(handle.wait_for_exit().await, ExitReason::Normal);
    Ok(())
}

/// `load_from` reports unreadable and malformed files.
#[tokio::test]
async fn load_from_reports_errors() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        ActonConfig::load_from(&missing),
        Err(ConfigError::Io { .. })
    ));

    let malformed = temp_dir.path().join("malformed.toml");
    fs::write(&malformed, "[limits]\nread_chunk_size = \"large\"\n")?;
    assert!(matches!(
        ActonConfig::load_from(&malformed),
        Err(ConfigError::Parse(_))
    ));

    let valid = temp_dir.path().join("valid.toml");
    fs::write(&valid, "[behavior]\nunexpected_message = \"terminate\"\nlog_unexpected = false\n")?;
    let config = ActonConfig::load_from(&valid)?;
    assert_eq!(config.behavior.unexpected_message, UnexpectedMessageMode::Terminate);
    assert!(!config.behavior.log_unexpected);
    Ok(())
}
