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

//! Handler return values and deferred responses.
//!
//! A handler returns [`HandlerResult`]. [`Reply::ready()`] means "nothing to send
//! back"; [`Reply::with`] carries a value that is delivered to the sender of the
//! message being handled: as the response when the message was a request, as
//! an ordinary message otherwise. An `Err` terminates the actor with
//! [`ExitReason::Failure`](crate::message::ExitReason::Failure).
//!
//! ```ignore
//! Behavior::new()
//!     .on::<(Ping, u32), _>(|_actor, (_, n)| Reply::with((Pong, n)))
//!     .on::<(Reset,), _>(|actor, _| {
//!         actor.model.count = 0;
//!         Reply::ready()
//!     })
//! ```

use tracing::trace;

use crate::message::{Address, CorrelationId, Envelope, IntoMessage, Message, Priority};

/// What a handler sends back, if anything.
#[derive(Debug, Clone, Default)]
pub enum Reply {
    /// No reply.
    #[default]
    Empty,
    /// Deliver this message to the sender of the handled message.
    Message(Message),
}

/// The return type of every message handler and request continuation.
pub type HandlerResult = anyhow::Result<Reply>;

impl Reply {
    /// A successful handler result without a reply.
    #[inline]
    pub fn ready() -> HandlerResult {
        Ok(Self::Empty)
    }

    /// A successful handler result replying with `payload`.
    #[inline]
    pub fn with(payload: impl IntoMessage) -> HandlerResult {
        Ok(Self::Message(payload.into_message()))
    }

    /// The reply message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Empty => None,
            Self::Message(message) => Some(message),
        }
    }
}

/// Delivers a message to `to` as the answer to `correlation`.
///
/// Requests get a response envelope at the priority the requester asked for;
/// anything else becomes an ordinary normal-priority message.
pub(crate) fn deliver_reply(from: &Address, to: &Address, correlation: CorrelationId, payload: Message) {
    let envelope = if correlation.is_request() {
        Envelope::new(
            from.clone(),
            correlation.response_id(),
            correlation.reply_priority(),
            payload,
        )
    } else {
        Envelope::new(from.clone(), CorrelationId::NONE, Priority::Normal, payload)
    };
    if !to.enqueue(envelope) {
        trace!(receiver = %to, "reply dropped");
    }
}

/// A response owed to a requester, to be delivered later.
///
/// Obtained from [`ManagedActor::make_response_promise`](crate::actor::ManagedActor::make_response_promise)
/// while handling a message. Creating the promise suppresses the automatic
/// reply of the current handler. Delivering consumes the promise, so a response
/// is sent at most once.
#[derive(Debug)]
pub struct ResponsePromise {
    responder: Address,
    requester: Address,
    correlation: CorrelationId,
}

impl ResponsePromise {
    pub(crate) fn new(responder: Address, requester: Address, correlation: CorrelationId) -> Self {
        Self {
            responder,
            requester,
            correlation,
        }
    }

    /// Who is waiting for the response.
    #[must_use]
    pub fn requester(&self) -> &Address {
        &self.requester
    }

    /// The correlation the response will carry.
    #[must_use]
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    /// Sends the response.
    pub fn deliver(self, payload: impl IntoMessage) {
        deliver_reply(
            &self.responder,
            &self.requester,
            self.correlation,
            payload.into_message(),
        );
    }
}
