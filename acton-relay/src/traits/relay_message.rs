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
use std::any::Any;
use std::fmt::Debug;

/// A value that can travel as an element of a [`Message`](crate::message::Message).
///
/// A blanket implementation covers every `Any + Send + Sync + Debug` type, so
/// user types only need `#[relay_message]` (or the equivalent derives).
/// Dispatch uses [`as_any`](RelayMessage::as_any) to recover the concrete type.
pub trait RelayMessage: Any + Send + Sync + Debug {
    /// Returns the element as a dynamic [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// The Rust type name of the element, used in diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T> RelayMessage for T
where
    T: Any + Send + Sync + Debug,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
