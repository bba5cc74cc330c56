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

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::actor::MonitorRegistry;
use crate::common::{ActonConfig, ActorHandle};
use crate::message::ActorId;

/// Shared state of one runtime.
#[derive(Debug)]
pub(crate) struct ActonInner {
    /// Monitor and link relations between actors.
    pub(crate) registry: MonitorRegistry,

    /// Every actor that has started and not yet terminated.
    pub(crate) actors: DashMap<ActorId, ActorHandle>,

    /// Tracks actor tasks.
    pub(crate) tracker: TaskTracker,

    /// Cancelled when the runtime shuts down; stops actors and I/O tasks.
    pub(crate) cancellation_token: CancellationToken,

    pub(crate) config: ActonConfig,
}

impl ActonInner {
    pub(crate) fn new(config: ActonConfig) -> Self {
        Self {
            registry: MonitorRegistry::default(),
            actors: DashMap::new(),
            tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
            config,
        }
    }
}
