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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Acton Relay
//!
//! A message-passing actor runtime built on Tokio. Actors own private state,
//! communicate only through immutable messages delivered to prioritized
//! mailboxes, and react to each message according to a replaceable behavior.
//!
//! ## Key Concepts
//!
//! - **Messages (`Message`)**: ordered, immutable sequences of typed elements.
//!   A message's [`Shape`](prelude::Shape) is the ordered list of its element types.
//! - **Addresses (`Address`)**: opaque, copyable references to mailboxes. Sending
//!   to an invalid or dead address silently does nothing.
//! - **Behaviors (`Behavior`)**: ordered lists of shape-matched handlers. Actors
//!   can replace their behavior ("become") or keep a stack of them.
//! - **Supervision**: monitors deliver exactly one `DownMsg` per watcher;
//!   `ExitMsg` carries soft and hard termination requests; links propagate failures.
//! - **Requests**: correlated request/response exchanges with deadlines.
//! - **Typed contracts**: addresses restricted to a declared set of message shapes.
//! - **Brokers**: actors whose I/O events arrive as ordinary messages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acton_relay::prelude::*;
//!
//! #[relay_message]
//! struct Ping;
//!
//! #[relay_actor]
//! struct Counter {
//!     seen: u32,
//! }
//!
//! let runtime = ActonApp::launch();
//! let counter = runtime.spawn(Counter::default(), |_actor| {
//!     Ok(Behavior::new().on::<(Ping,), _>(|actor, _| {
//!         actor.model.seen += 1;
//!         Reply::ready()
//!     }))
//! });
//! counter.send((Ping,));
//! ```

/// Runtime entry points, configuration and shared types.
pub(crate) mod common;

/// Actor state machine, mailbox, behaviors and supervision bookkeeping.
pub(crate) mod actor;

/// Messages, addresses, envelopes and system signals.
pub(crate) mod message;

/// Core traits.
pub(crate) mod traits;

/// Typed actor contracts.
pub(crate) mod typed;

/// Brokers: I/O events as actor messages.
pub(crate) mod io;

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros
/// *   [`acton_relay_macro::relay_message`]: declares a message element type.
/// *   [`acton_relay_macro::relay_actor`]: declares an actor model type.
/// *   [`acton_relay_macro::relay_main`]: async entry point.
/// *   [`crate::payload`]: builds a [`Message`] from values.
///
/// ## External Crates
/// *   [`acton_ern`](https://docs.rs/acton-ern): actor names.
/// *   [`tokio`](https://docs.rs/tokio): the async runtime the actors run on.
pub mod prelude {
    pub use acton_ern::*;
    pub use acton_relay_macro::*;
    pub use tokio;

    pub use crate::actor::{
        Behavior, Idle, ManagedActor, Mailbox, Started, UnexpectedAction, UnexpectedCallback,
        UnexpectedPolicy,
    };
    pub use crate::common::config::{
        BehaviorConfig, DefaultsConfig, LimitsConfig, TimeoutConfig, UnexpectedMessageMode,
    };
    pub use crate::common::{
        ActonApp, ActonConfig, ActorContext, ActorHandle, ActorRuntime, ConfigError,
        HandlerResult, Reply, ResponsePromise, ScopedActor, CONFIG,
    };
    pub use crate::io::{
        AcceptHandle, AcceptorClosed, BrokerError, ConnectionBackend, ConnectionClosed,
        ConnectionHandle, ConnectionLifecycle, ConnectionSink, FrameAssembler,
        LoopbackConnection, NewConnection, NewData, ReceivePolicy, TcpConnection,
    };
    pub use crate::message::{
        send, send_anonymous, send_exit, Address, ActorId, CorrelationId, DownMsg, Element,
        ElementType, Envelope, ExitMsg, ExitReason, FromMessage, IntoMessage, Message, Priority,
        RequestError, Shape,
    };
    pub use crate::payload;
    pub use crate::traits::RelayMessage;
    pub use crate::typed::{typed_send, Contract, ContractViolation, Signature, TypedAddress};
}
