//! Core traits shared by every part of the runtime.
//!
//! # Key Traits
//!
//! *   [`RelayMessage`]: required of every value carried as a message element.
//!     Elements must be `Send`, `Sync`, `Debug` and support downcasting via `Any`.

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

pub use relay_message::RelayMessage;

/// Defines the `RelayMessage` element trait.
mod relay_message;
