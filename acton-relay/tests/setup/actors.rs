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
#![allow(unused)]

use acton_relay::prelude::*;

/// Remembers the numbers it was sent, in arrival order.
#[relay_actor]
pub struct Recorder {
    pub seen: Vec<u32>,
}

#[relay_actor]
pub struct Counter {
    pub count: u32,
}

/// Holds an address to report to.
#[relay_actor]
pub struct Observer {
    pub observer: Option<Address>,
    pub rounds: u32,
}

impl Observer {
    pub fn reporting_to(address: &Address) -> Self {
        Self {
            observer: Some(address.clone()),
            rounds: 0,
        }
    }

    pub fn notify(&self, payload: impl IntoMessage) {
        if let Some(observer) = &self.observer {
            send_anonymous(observer, Priority::Normal, payload);
        }
    }
}

/// A stateless actor.
#[relay_actor]
pub struct Silent;
