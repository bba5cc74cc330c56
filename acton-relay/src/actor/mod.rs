//! The actor state machine and its supporting parts.
//!
//! # Key Components
//!
//! *   [`ManagedActor`]: an actor's model plus runtime machinery, in the [`Idle`]
//!     or [`Started`] type-state.
//! *   [`Mailbox`]: the two-lane (high/normal priority) FIFO queue feeding an actor.
//! *   [`Behavior`]: the ordered, shape-matched handlers an actor dispatches against.
//! *   [`UnexpectedPolicy`]: what happens to messages no behavior case matches.

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
pub use behavior::Behavior;
pub use mailbox::Mailbox;
pub use managed_actor::{Idle, ManagedActor, Started};
pub use unexpected::{UnexpectedAction, UnexpectedCallback, UnexpectedPolicy};

// --- Crate-Internal Re-exports ---
pub(crate) use supervision::MonitorRegistry;

// --- Submodules ---

/// Defines `Behavior` and shape-based dispatch.
pub(crate) mod behavior;
/// Defines the actor mailbox.
mod mailbox;
/// Defines `ManagedActor` and its lifecycle states.
mod managed_actor;
/// Tracks outstanding requests.
pub(crate) mod pending;
/// Monitor and link bookkeeping.
pub(crate) mod supervision;
/// Defines the unexpected-message policy.
mod unexpected;
