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

use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;

use tokio::task::AbortHandle;

use crate::common::Continuation;
use crate::message::Shape;

/// An outstanding request awaiting its response or its deadline.
pub(crate) struct PendingRequest<Model: Default + Send + Debug + 'static> {
    continuation: Option<Box<Continuation<Model>>>,
    /// Reply shape promised by a typed contract, checked on arrival.
    expected: Option<Shape>,
    deadline: Option<AbortHandle>,
}

impl<Model: Default + Send + Debug + 'static> PendingRequest<Model> {
    pub(crate) fn new(
        continuation: Box<Continuation<Model>>,
        expected: Option<Shape>,
        deadline: AbortHandle,
    ) -> Self {
        Self {
            continuation: Some(continuation),
            expected,
            deadline: Some(deadline),
        }
    }

    /// Cancels the deadline timer and hands out the continuation.
    pub(crate) fn resolve(mut self) -> Option<(Box<Continuation<Model>>, Option<Shape>)> {
        if let Some(timer) = self.deadline.take() {
            timer.abort();
        }
        let continuation = self.continuation.take()?;
        Some((continuation, self.expected.take()))
    }
}

impl<Model: Default + Send + Debug + 'static> Drop for PendingRequest<Model> {
    fn drop(&mut self) {
        if let Some(timer) = self.deadline.take() {
            timer.abort();
        }
    }
}

/// Requests issued by one actor, keyed by request number.
///
/// Removing an entry is what makes a response (or timeout) count: whichever
/// arrives first takes the entry, anything later finds nothing and is dropped.
pub(crate) struct PendingRequests<Model: Default + Send + Debug + 'static> {
    entries: HashMap<u64, PendingRequest<Model>>,
}

impl<Model: Default + Send + Debug + 'static> PendingRequests<Model> {
    pub(crate) fn insert(&mut self, request_id: u64, request: PendingRequest<Model>) {
        self.entries.insert(request_id, request);
    }

    pub(crate) fn take(&mut self, request_id: u64) -> Option<PendingRequest<Model>> {
        self.entries.remove(&request_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every entry, cancelling the deadline timers.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<Model: Default + Send + Debug + 'static> Default for PendingRequests<Model> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<Model: Default + Send + Debug + 'static> Debug for PendingRequests<Model> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequests")
            .field("outstanding", &self.entries.len())
            .finish()
    }
}
