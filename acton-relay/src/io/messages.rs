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

use std::sync::Arc;

use crate::io::{AcceptHandle, ConnectionBackend, ConnectionHandle};

/// A connection now belongs to the receiving broker.
///
/// Sent by an acceptor opened with `add_tcp_doorman`. The broker may keep the
/// connection or `fork` a child broker to own it.
#[derive(Debug, Clone)]
pub struct NewConnection {
    /// The acceptor that accepted the connection.
    pub source: AcceptHandle,
    /// The new connection.
    pub handle: ConnectionHandle,
    pub(crate) link: Arc<dyn ConnectionBackend>,
}

/// A frame of received bytes, cut according to the connection's read policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewData {
    /// The connection the bytes arrived on.
    pub handle: ConnectionHandle,
    /// The frame.
    pub buf: Vec<u8>,
}

/// The connection is closed. No further `NewData` arrives for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionClosed {
    /// The closed connection.
    pub handle: ConnectionHandle,
}

/// The acceptor stopped accepting connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptorClosed {
    /// The closed acceptor.
    pub handle: AcceptHandle,
}
