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

/// Size of `AtMost` frames when nothing else is configured.
const DEFAULT_CHUNK: usize = 4096;

/// How received bytes are cut into [`NewData`](crate::io::NewData) frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceivePolicy {
    /// Frames of exactly `n` bytes. Fewer bytes stay buffered.
    Exactly(usize),
    /// Whatever is buffered, at most `n` bytes per frame.
    AtMost(usize),
    /// Everything buffered, once at least `n` bytes are available.
    AtLeast(usize),
}

impl ReceivePolicy {
    /// Frames of exactly `n` bytes.
    #[must_use]
    pub const fn exactly(n: usize) -> Self {
        Self::Exactly(n)
    }

    /// Frames of up to `n` bytes.
    #[must_use]
    pub const fn at_most(n: usize) -> Self {
        Self::AtMost(n)
    }

    /// Frames of `n` bytes or more.
    #[must_use]
    pub const fn at_least(n: usize) -> Self {
        Self::AtLeast(n)
    }

    /// Bytes that must be buffered before a frame can be cut.
    #[must_use]
    pub const fn required_bytes(&self) -> usize {
        match *self {
            Self::Exactly(n) | Self::AtLeast(n) => n,
            Self::AtMost(_) => 1,
        }
    }
}

impl Default for ReceivePolicy {
    fn default() -> Self {
        Self::AtMost(DEFAULT_CHUNK)
    }
}

/// Cuts a byte stream, arriving in arbitrary chunks, into frames.
///
/// The assembler only buffers; whoever owns it decides when the next frame
/// is taken, so a policy change applies to every frame not yet taken.
///
/// ```rust,ignore
/// let mut assembler = FrameAssembler::new(ReceivePolicy::exactly(6));
/// assembler.push(b"abc");
/// assert_eq!(assembler.next_frame(), None);
/// assembler.push(b"def");
/// assert_eq!(assembler.next_frame(), Some(b"abcdef".to_vec()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler {
    policy: ReceivePolicy,
    buffer: Vec<u8>,
}

impl FrameAssembler {
    /// An empty assembler using `policy`.
    #[must_use]
    pub fn new(policy: ReceivePolicy) -> Self {
        Self {
            policy,
            buffer: Vec::new(),
        }
    }

    /// The current policy.
    #[must_use]
    pub const fn policy(&self) -> ReceivePolicy {
        self.policy
    }

    /// Replaces the policy for every frame not yet taken.
    pub fn set_policy(&mut self, policy: ReceivePolicy) {
        self.policy = policy;
    }

    /// Appends a received chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet part of a frame.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Takes the next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            return None;
        }
        let take = match self.policy {
            ReceivePolicy::Exactly(n) => {
                let n = n.max(1);
                (self.buffer.len() >= n).then_some(n)?
            }
            ReceivePolicy::AtMost(n) => self.buffer.len().min(n.max(1)),
            ReceivePolicy::AtLeast(n) => (self.buffer.len() >= n).then_some(self.buffer.len())?,
        };
        let rest = self.buffer.split_off(take);
        Some(std::mem::replace(&mut self.buffer, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_frames_wait_for_all_bytes() {
        let mut assembler = FrameAssembler::new(ReceivePolicy::exactly(6));
        assembler.push(b"abc");
        assert_eq!(assembler.next_frame(), None);
        assembler.push(b"def");
        assert_eq!(assembler.next_frame(), Some(b"abcdef".to_vec()));
        assert_eq!(assembler.next_frame(), None);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn exact_frames_split_large_chunks() {
        let mut assembler = FrameAssembler::new(ReceivePolicy::exactly(2));
        assembler.push(b"abcde");
        assert_eq!(assembler.next_frame(), Some(b"ab".to_vec()));
        assert_eq!(assembler.next_frame(), Some(b"cd".to_vec()));
        assert_eq!(assembler.next_frame(), None);
        assert_eq!(assembler.buffered(), 1);
    }

    #[test]
    fn policy_change_applies_to_the_remaining_bytes() {
        let mut assembler = FrameAssembler::new(ReceivePolicy::exactly(4));
        assembler.push(&[0, 0, 0, 3, b'x', b'y', b'z']);
        assert_eq!(assembler.next_frame(), Some(vec![0, 0, 0, 3]));
        assembler.set_policy(ReceivePolicy::exactly(3));
        assert_eq!(assembler.next_frame(), Some(b"xyz".to_vec()));
    }

    #[test]
    fn at_most_caps_the_frame_size() {
        let mut assembler = FrameAssembler::new(ReceivePolicy::at_most(4));
        assembler.push(b"abcdef");
        assert_eq!(assembler.next_frame(), Some(b"abcd".to_vec()));
        assert_eq!(assembler.next_frame(), Some(b"ef".to_vec()));
    }

    #[test]
    fn at_least_delivers_everything_once_satisfied() {
        let mut assembler = FrameAssembler::new(ReceivePolicy::at_least(4));
        assembler.push(b"ab");
        assert_eq!(assembler.next_frame(), None);
        assembler.push(b"cdef");
        assert_eq!(assembler.next_frame(), Some(b"abcdef".to_vec()));
    }
}
