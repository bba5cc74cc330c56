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

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::message::{Envelope, Priority};

#[derive(Debug, Default)]
struct Queues {
    high: VecDeque<Envelope>,
    normal: VecDeque<Envelope>,
    closed: bool,
}

/// An actor's incoming queue.
///
/// Two FIFO lanes: high-priority envelopes are always dequeued before normal
/// ones. Any number of producers may enqueue concurrently; the owning actor is
/// the only consumer. Once closed, the mailbox rejects every envelope.
#[derive(Debug, Default)]
pub struct Mailbox {
    queues: Mutex<Queues>,
    ready: Notify,
}

impl Mailbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends an envelope to the lane of its priority.
    ///
    /// Returns `false`, dropping the envelope, when the mailbox is closed.
    pub(crate) fn enqueue(&self, envelope: Envelope) -> bool {
        {
            let mut queues = self.queues.lock();
            if queues.closed {
                return false;
            }
            match envelope.priority() {
                Priority::High => queues.high.push_back(envelope),
                Priority::Normal => queues.normal.push_back(envelope),
            }
        }
        self.ready.notify_one();
        true
    }

    /// Takes the next envelope without waiting.
    pub(crate) fn try_dequeue(&self) -> Option<Envelope> {
        let mut queues = self.queues.lock();
        queues.high.pop_front().or_else(|| queues.normal.pop_front())
    }

    /// Waits for the next envelope. Returns `None` once the mailbox is closed and drained.
    pub(crate) async fn dequeue(&self) -> Option<Envelope> {
        loop {
            let notified = self.ready.notified();
            {
                let mut queues = self.queues.lock();
                if let Some(envelope) = queues.high.pop_front().or_else(|| queues.normal.pop_front()) {
                    return Some(envelope);
                }
                if queues.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Closes the mailbox and returns whatever was still waiting in it.
    pub(crate) fn close(&self) -> Vec<Envelope> {
        let discarded = {
            let mut queues = self.queues.lock();
            queues.closed = true;
            let high = std::mem::take(&mut queues.high);
            let normal = std::mem::take(&mut queues.normal);
            high.into_iter().chain(normal).collect()
        };
        self.ready.notify_waiters();
        self.ready.notify_one();
        discarded
    }

    /// True once the mailbox has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queues.lock().closed
    }

    /// Number of waiting envelopes across both lanes.
    #[must_use]
    pub fn len(&self) -> usize {
        let queues = self.queues.lock();
        queues.high.len() + queues.normal.len()
    }

    /// True when no envelope is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::payload;

    fn numbered(priority: Priority, n: u32) -> Envelope {
        Envelope::anonymous(priority, payload!(n))
    }

    fn number(envelope: &Envelope) -> u32 {
        *envelope.payload().get::<u32>(0).unwrap()
    }

    #[test]
    fn lanes_are_fifo() {
        let mailbox = Mailbox::new();
        for n in 0..5 {
            assert!(mailbox.enqueue(numbered(Priority::Normal, n)));
        }
        let order: Vec<u32> = std::iter::from_fn(|| mailbox.try_dequeue())
            .map(|envelope| number(&envelope))
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn high_priority_overtakes_waiting_normal_envelopes() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(numbered(Priority::Normal, 1));
        mailbox.enqueue(numbered(Priority::Normal, 2));
        mailbox.enqueue(numbered(Priority::High, 10));
        mailbox.enqueue(numbered(Priority::High, 11));
        let order: Vec<u32> = std::iter::from_fn(|| mailbox.try_dequeue())
            .map(|envelope| number(&envelope))
            .collect();
        assert_eq!(order, vec![10, 11, 1, 2]);
    }

    #[test]
    fn closed_mailbox_rejects_and_discards() {
        let mailbox = Mailbox::new();
        mailbox.enqueue(numbered(Priority::Normal, 1));
        mailbox.enqueue(numbered(Priority::High, 2));
        let discarded = mailbox.close();
        assert_eq!(discarded.len(), 2);
        assert!(mailbox.is_closed());
        assert!(mailbox.is_empty());
        assert!(!mailbox.enqueue(numbered(Priority::Normal, 3)));
    }

    #[tokio::test]
    async fn dequeue_wakes_on_enqueue() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = Arc::clone(&mailbox);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.enqueue(numbered(Priority::Normal, 42));
        });
        let envelope = tokio::time::timeout(Duration::from_secs(2), mailbox.dequeue())
            .await
            .expect("dequeue timed out")
            .expect("mailbox closed");
        assert_eq!(number(&envelope), 42);
    }

    #[tokio::test]
    async fn dequeue_returns_none_after_close() {
        let mailbox = Arc::new(Mailbox::new());
        let closer = Arc::clone(&mailbox);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            closer.close();
        });
        let next = tokio::time::timeout(Duration::from_secs(2), mailbox.dequeue())
            .await
            .expect("dequeue timed out");
        assert!(next.is_none());
    }
}
