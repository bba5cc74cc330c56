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
use std::sync::atomic::{AtomicU64, Ordering};

use crate::message::Priority;

const RESPONSE_FLAG: u64 = 1 << 63;
const HIGH_PRIORITY_FLAG: u64 = 1 << 62;
const REQUEST_ID_MASK: u64 = HIGH_PRIORITY_FLAG - 1;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a request/response exchange.
///
/// The low bits hold the request number, shared by a request and its response.
/// Two flag bits mark a response and ask for the answer to travel with high priority.
/// [`CorrelationId::NONE`] marks a plain asynchronous message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// No correlation: an asynchronous message that expects no reply.
    pub const NONE: Self = Self(0);

    /// Allocates a fresh request id, unique within the process.
    #[must_use]
    pub fn next_request() -> Self {
        loop {
            let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed) & REQUEST_ID_MASK;
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// True for [`CorrelationId::NONE`].
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.request_id() == 0
    }

    /// True when the sender awaits a response.
    #[must_use]
    pub const fn is_request(self) -> bool {
        !self.is_response() && !self.is_none()
    }

    /// True when this id answers an earlier request.
    #[must_use]
    pub const fn is_response(self) -> bool {
        self.0 & RESPONSE_FLAG != 0 && !self.is_none()
    }

    /// True when the answer should be delivered with high priority.
    #[must_use]
    pub const fn is_high_priority(self) -> bool {
        self.0 & HIGH_PRIORITY_FLAG != 0
    }

    /// The same id, asking for a high-priority answer.
    #[must_use]
    pub const fn with_high_priority(self) -> Self {
        Self(self.0 | HIGH_PRIORITY_FLAG)
    }

    /// The same id, asking for a normal-priority answer.
    #[must_use]
    pub const fn with_normal_priority(self) -> Self {
        Self(self.0 & !HIGH_PRIORITY_FLAG)
    }

    /// The id a response to this request carries.
    #[must_use]
    pub const fn response_id(self) -> Self {
        Self(self.0 | RESPONSE_FLAG)
    }

    /// The request number shared by a request and its response.
    #[must_use]
    pub const fn request_id(self) -> u64 {
        self.0 & REQUEST_ID_MASK
    }

    /// The priority a response to this request travels with.
    #[must_use]
    pub const fn reply_priority(self) -> Priority {
        if self.is_high_priority() {
            Priority::High
        } else {
            Priority::Normal
        }
    }

    /// The raw integer, flags included.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("async")
        } else if self.is_response() {
            write!(f, "resp#{}", self.request_id())
        } else {
            write!(f, "req#{}", self.request_id())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_keeps_the_request_number() {
        let request = CorrelationId::next_request();
        let response = request.response_id();
        assert!(request.is_request());
        assert!(!request.is_response());
        assert!(response.is_response());
        assert!(!response.is_request());
        assert_eq!(request.request_id(), response.request_id());
    }

    #[test]
    fn request_ids_are_unique() {
        let first = CorrelationId::next_request();
        let second = CorrelationId::next_request();
        assert_ne!(first.request_id(), second.request_id());
    }

    #[test]
    fn priority_flag_survives_the_response() {
        let request = CorrelationId::next_request().with_high_priority();
        assert_eq!(request.response_id().reply_priority(), Priority::High);
        assert_eq!(
            request.with_normal_priority().reply_priority(),
            Priority::Normal
        );
    }

    #[test]
    fn none_is_neither_request_nor_response() {
        assert!(CorrelationId::NONE.is_none());
        assert!(!CorrelationId::NONE.is_request());
        assert!(!CorrelationId::NONE.response_id().is_response());
        assert_eq!(CorrelationId::NONE.to_string(), "async");
    }
}
