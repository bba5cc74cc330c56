//! Runtime entry points and the pieces shared across the crate.
//!
//! # Key Re-exported Components:
//!
//! *   [`ActonApp`]: starts a runtime.
//! *   [`ActorRuntime`]: the running system; creates actors, brokers and scoped actors,
//!     and shuts everything down.
//! *   [`ActorHandle`]: external handle to a started actor.
//! *   [`ScopedActor`]: an actor driven from plain async code.
//! *   [`Reply`] and [`ResponsePromise`]: handler return values and deferred responses.
//! *   [`ActonConfig`]: configuration loaded from XDG directories.

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

// --- Public Re-exports ---
pub use acton::ActonApp;
pub use actor_handle::ActorHandle;
pub use actor_reply::{HandlerResult, Reply, ResponsePromise};
pub use actor_runtime::ActorRuntime;
pub use config::{ActonConfig, ConfigError, CONFIG};
pub use scoped_actor::ScopedActor;
pub use types::*;

// --- Crate-Internal Re-exports ---
pub(crate) use actor_reply::deliver_reply;

// --- Submodules ---

/// Defines common type aliases.
mod types;

/// Defines the `ActonApp` entry point.
mod acton;
/// Defines the shared state of a runtime.
mod acton_inner;
/// Defines `ActorHandle`.
mod actor_handle;
/// Defines `Reply` and `ResponsePromise`.
mod actor_reply;
/// Defines `ActorRuntime`.
mod actor_runtime;
/// Defines the configuration system.
pub mod config;
/// Defines `ScopedActor`.
mod scoped_actor;
