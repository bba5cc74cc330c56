//! Messages and everything needed to deliver them.
//!
//! # Key Components
//!
//! *   [`Message`]: an immutable, ordered sequence of typed elements, with its [`Shape`].
//! *   [`Address`]: an opaque, cloneable reference to an actor's mailbox.
//! *   [`Envelope`]: a message plus sender, [`CorrelationId`], [`Priority`] and timestamp.
//! *   [`ExitReason`], [`DownMsg`], [`ExitMsg`]: the supervision signals.
//! *   [`send`], [`send_anonymous`], [`send_exit`]: fire-and-forget delivery.

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
pub use address::{ActorId, Address};
pub use correlation::CorrelationId;
pub use envelope::{Envelope, Priority};
pub use message_error::RequestError;
pub use payload::{Element, ElementType, FromMessage, IntoMessage, Message, Shape};
pub use send::{send, send_anonymous, send_exit};
pub use signal::{DownMsg, ExitMsg, ExitReason};

// --- Crate-Internal Re-exports ---
pub(crate) use signal::RequestDeadline;

// --- Submodules ---

/// Defines `Address` and `ActorId`.
mod address;
/// Defines `CorrelationId`.
mod correlation;
/// Defines `Envelope` and `Priority`.
mod envelope;
/// Defines `RequestError`.
mod message_error;
/// Defines `Message`, `Shape` and the tuple conversions.
mod payload;
/// Defines the free send functions.
mod send;
/// Defines exit reasons and the supervision messages.
mod signal;
