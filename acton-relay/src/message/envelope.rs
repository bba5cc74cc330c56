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

use std::time::SystemTime;

use static_assertions::assert_impl_all;

use crate::message::{Address, CorrelationId, Message, Shape};

/// Delivery class of an envelope. High-priority envelopes are dequeued before
/// any normal-priority envelope already waiting in the same mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Priority {
    /// Ordinary delivery.
    #[default]
    Normal,
    /// Jumps ahead of waiting normal-priority envelopes.
    High,
}

/// A message together with its delivery metadata.
///
/// Envelopes are immutable once created.
#[derive(Debug, Clone)]
pub struct Envelope {
    sender: Address,
    correlation: CorrelationId,
    priority: Priority,
    payload: Message,
    timestamp: SystemTime,
}

impl Envelope {
    /// Creates an envelope stamped with the current time.
    #[must_use]
    pub fn new(
        sender: Address,
        correlation: CorrelationId,
        priority: Priority,
        payload: Message,
    ) -> Self {
        Self {
            sender,
            correlation,
            priority,
            payload,
            timestamp: SystemTime::now(),
        }
    }

    /// An uncorrelated envelope without a sender.
    #[must_use]
    pub fn anonymous(priority: Priority, payload: Message) -> Self {
        Self::new(Address::invalid(), CorrelationId::NONE, priority, payload)
    }

    /// Who sent the message; invalid for anonymous sends.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// The request/response correlation of the message.
    #[inline]
    #[must_use]
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    /// The delivery class.
    #[inline]
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The message itself.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Message {
        &self.payload
    }

    /// When the envelope was created.
    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Shape of the carried message.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.payload.shape()
    }
}

assert_impl_all!(Envelope: Send, Sync, Clone);
