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

use acton_relay::prelude::*;
use tracing::debug;

use crate::setup::actors::{Counter, Observer};
use crate::setup::messages::{Num, Ping, Pong};
use crate::setup::{next_as, runtime, PATIENCE, QUIET};

mod setup;

const ROUNDS: u32 = 10;

/// A pinger and a ponger exchange ten rounds; the pinger then quits, the
/// ponger learns about it through its monitor and no further traffic follows.
#[tokio::test]
async fn ten_rounds_then_down() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();

    let pinger = runtime.new_actor_with_name::<Counter>("pinger");
    let pinger_address = pinger.address().clone();

    let ponger = runtime.spawn(Observer::reporting_to(scoped.address()), move |actor| {
        actor.monitor(&pinger_address);
        Ok(Behavior::<Observer>::new()
            .on::<(Ping,), _>(|actor, (Ping(n),)| {
                actor.model.rounds += 1;
                Reply::with((Pong(n),))
            })
            .on_down(|actor, down| {
                debug!(rounds = actor.model.rounds, "pinger is down");
                actor.model.notify((Num(actor.model.rounds), down));
                actor.quit(ExitReason::Normal);
                Reply::ready()
            }))
    });
    let ponger_address = ponger.address().clone();

    let pinger = pinger.start(move |actor| {
        actor.send(&ponger_address, (Ping(1),));
        Ok(Behavior::<Counter>::new().on::<(Pong,), _>(|actor, (Pong(n),)| {
            actor.model.count += 1;
            if n == ROUNDS {
                actor.quit(ExitReason::Normal);
                Reply::ready()
            } else {
                Reply::with((Ping(n + 1),))
            }
        }))
    });

    let (Num(rounds), down) = next_as::<(Num, DownMsg)>(&mut scoped, PATIENCE)
        .await
        .ok_or_else(|| anyhow::anyhow!("ponger did not report"))?;
    assert_eq!(rounds, ROUNDS);
    assert_eq!(down.source, *pinger.address());
    assert_eq!(down.reason, ExitReason::Normal);

    assert_eq!(pinger.wait_for_exit().await, ExitReason::Normal);
    assert_eq!(ponger.wait_for_exit().await, ExitReason::Normal);
    assert!(scoped.receive(QUIET).await.is_none());
    Ok(())
}
