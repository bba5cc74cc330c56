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

use tracing::trace;

use crate::common::{ActonConfig, ActorRuntime};

/// Entry point for starting the actor system.
///
/// - [`ActonApp::launch_async()`] from async code
/// - [`ActonApp::launch()`] from synchronous code; actors still need a Tokio
///   runtime to be spawned on
/// - [`ActonApp::launch_with_config()`] to bypass the configuration file
#[derive(Default, Debug, Clone)]
pub struct ActonApp;

impl ActonApp {
    /// Starts a runtime configured from the XDG configuration file.
    ///
    /// ```rust,ignore
    /// use acton_relay::prelude::*;
    ///
    /// #[relay_main]
    /// async fn main() {
    ///     let runtime = ActonApp::launch_async().await;
    ///     // spawn actors...
    ///     runtime.shutdown_all().await.ok();
    /// }
    /// ```
    pub async fn launch_async() -> ActorRuntime {
        Self::launch()
    }

    /// Starts a runtime configured from the XDG configuration file.
    #[must_use]
    pub fn launch() -> ActorRuntime {
        trace!("Starting Acton Relay runtime");
        let config = ActonConfig::load();
        trace!("Configuration loaded: {:?}", config);
        ActorRuntime::new(config)
    }

    /// Starts a runtime with an explicit configuration.
    #[must_use]
    pub fn launch_with_config(config: ActonConfig) -> ActorRuntime {
        trace!("Starting Acton Relay runtime with explicit configuration");
        ActorRuntime::new(config)
    }
}
