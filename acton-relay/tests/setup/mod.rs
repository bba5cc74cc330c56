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
#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use acton_relay::prelude::*;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod actors;
pub mod messages;

/// How long tests wait for a message that should arrive.
pub const PATIENCE: Duration = Duration::from_secs(2);
/// How long tests wait to be reasonably sure a message will not arrive.
pub const QUIET: Duration = Duration::from_millis(150);

static INIT: Once = Once::new();

/// Installs the global tracing subscriber once per test binary, writing to
/// `logs/relay_tests.txt`.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        std::fs::create_dir_all("logs").expect("could not create logs dir");

        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "relay_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leak the guard so the non-blocking writer outlives every test
        Box::leak(Box::new(guard));

        let filter = EnvFilter::new("info")
            .add_directive(
                "acton_relay::actor::managed_actor::started=trace"
                    .parse()
                    .unwrap(),
            )
            .add_directive("acton_relay::actor::supervision=trace".parse().unwrap())
            .add_directive("acton_relay::io=trace".parse().unwrap())
            .add_directive("acton_relay::common=debug".parse().unwrap())
            .add_directive("broker_tests=trace".parse().unwrap())
            .add_directive("supervision_tests=trace".parse().unwrap())
            .add_directive("tokio=info".parse().unwrap());

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// A runtime with the built-in defaults, independent of any configuration file.
pub fn runtime() -> ActorRuntime {
    initialize_tracing();
    ActonApp::launch_with_config(ActonConfig::default())
}

/// Receives the next message and extracts it as `P`. `None` on timeout or
/// when the next message has a different shape.
pub async fn next_as<P: FromMessage>(scoped: &mut ScopedActor, timeout: Duration) -> Option<P> {
    scoped
        .receive_message(timeout)
        .await
        .and_then(|message| message.extract::<P>())
}
