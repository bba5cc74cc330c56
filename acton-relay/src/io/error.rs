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

use std::fmt;

use crate::io::{AcceptHandle, ConnectionHandle};

/// Errors returned by broker operations.
#[derive(Debug)]
pub enum BrokerError {
    /// The broker owns no connection with this handle.
    UnknownHandle(ConnectionHandle),
    /// The broker owns no acceptor with this handle.
    UnknownAcceptor(AcceptHandle),
    /// The connection is closing or closed and accepts no more output.
    ConnectionClosed(ConnectionHandle),
    /// The read policy asks for frames larger than `limits.max_frame_size`.
    FrameTooLarge {
        /// The connection the policy was meant for.
        handle: ConnectionHandle,
        /// Bytes the policy needs for one frame.
        requested: usize,
        /// The configured limit.
        limit: usize,
    },
    /// The actor was not created as a broker.
    NotABroker,
    /// An I/O operation failed.
    Io(std::io::Error),
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle(handle) => write!(f, "unknown {handle}"),
            Self::UnknownAcceptor(handle) => write!(f, "unknown {handle}"),
            Self::ConnectionClosed(handle) => write!(f, "{handle} is closed"),
            Self::FrameTooLarge {
                handle,
                requested,
                limit,
            } => write!(f, "{handle}: frames of {requested} bytes exceed the limit of {limit}"),
            Self::NotABroker => f.write_str("actor is not a broker"),
            Self::Io(error) => write!(f, "I/O error: {error}"),
        }
    }
}

impl std::error::Error for BrokerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BrokerError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}
