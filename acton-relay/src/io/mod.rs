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

//! Brokers: actors whose mailbox is also fed by I/O.
//!
//! A reactor drives each connection and pushes [`NewConnection`], [`NewData`]
//! and [`ConnectionClosed`] messages into the owning broker's mailbox. The
//! broker's behavior handles them like any other message and answers through
//! `write`/`flush`, which hand bytes back to the reactor without blocking.
//!
//! Two reactors are provided: [`TcpConnection`] on Tokio sockets and the
//! in-memory [`LoopbackConnection`]. Others plug in through
//! [`ConnectionBackend`].

pub use backend::{ConnectionBackend, ConnectionSink};
pub use broker::ConnectionLifecycle;
pub(crate) use broker::BrokerIo;
pub use error::BrokerError;
pub use handle::{AcceptHandle, ConnectionHandle};
pub use loopback::LoopbackConnection;
pub use messages::{AcceptorClosed, ConnectionClosed, NewConnection, NewData};
pub use policy::{FrameAssembler, ReceivePolicy};
pub use tcp::TcpConnection;

mod backend;
mod broker;
mod error;
mod handle;
mod loopback;
mod messages;
mod policy;
mod tcp;
