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

use std::time::Duration;

use acton_relay::prelude::*;
use tokio::time::Instant;

use crate::setup::actors::{Observer, Silent};
use crate::setup::messages::{Outcome, Ping, Pong};
use crate::setup::{initialize_tracing, next_as, runtime, PATIENCE};

mod setup;

const DEADLINE: Duration = Duration::from_millis(100);
const LATE: Duration = Duration::from_millis(300);

/// Answers every ping, but only after `delay`.
fn sluggish(runtime: &ActorRuntime, delay: Duration) -> ActorHandle {
    runtime.spawn(Silent, move |_| {
        Ok(Behavior::new().on::<(Ping,), _>(move |actor, (Ping(n),)| {
            let promise = actor.make_response_promise();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                promise.deliver((Pong(n),));
            });
            Reply::ready()
        }))
    })
}

fn requesting(
    target: Address,
    timeout: Duration,
) -> impl FnOnce(&mut ActorContext<Observer>) -> anyhow::Result<Behavior<Observer>> + Send + 'static {
    move |actor| {
        actor.request(&target, (Ping(5),), timeout, |actor, result| {
            let outcome = match result {
                Ok(message) => match message.extract::<(Pong,)>() {
                    Some((Pong(n),)) => Outcome::Answered(n),
                    None => Outcome::Mismatched,
                },
                Err(RequestError::Timeout) => Outcome::TimedOut,
                Err(RequestError::ContractViolation(_)) => Outcome::Mismatched,
            };
            actor.model.notify((outcome,));
            Reply::ready()
        });
        assert_eq!(actor.pending_requests(), 1);
        Ok(Behavior::new().on::<(Ping,), _>(|_, _| Reply::ready()))
    }
}

/// A request with a deadline to a target that answers too late yields exactly
/// one timeout, no earlier than the deadline, and the late answer is dropped.
#[tokio::test]
async fn late_answers_are_dropped_after_one_timeout() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();
    let target = sluggish(&runtime, LATE);

    let started = Instant::now();
    let requester = runtime.spawn(
        Observer::reporting_to(scoped.address()),
        requesting(target.address().clone(), DEADLINE),
    );

    let first = next_as::<(Outcome,)>(&mut scoped, PATIENCE).await;
    assert_eq!(first, Some((Outcome::TimedOut,)));
    assert!(started.elapsed() >= DEADLINE);

    tokio::time::sleep(LATE + DEADLINE).await;
    assert!(scoped.receive(Duration::from_millis(50)).await.is_none());
    assert!(requester.is_alive());
    runtime.shutdown_all().await?;
    Ok(())
}

/// An answer in time reaches the continuation, and the timer never fires.
#[tokio::test]
async fn timely_answers_reach_the_continuation() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();
    let target = sluggish(&runtime, Duration::from_millis(10));

    let _requester = runtime.spawn(
        Observer::reporting_to(scoped.address()),
        requesting(target.address().clone(), Duration::from_millis(200)),
    );

    let first = next_as::<(Outcome,)>(&mut scoped, PATIENCE).await;
    assert_eq!(first, Some((Outcome::Answered(5),)));
    assert!(scoped.receive(Duration::from_millis(300)).await.is_none());
    runtime.shutdown_all().await?;
    Ok(())
}

/// A request to a dead actor times out instead of failing.
#[tokio::test]
async fn requests_to_dead_actors_time_out() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();
    let target = sluggish(&runtime, Duration::ZERO);
    target.stop().await?;

    let _requester = runtime.spawn(
        Observer::reporting_to(scoped.address()),
        requesting(target.address().clone(), DEADLINE),
    );
    let first = next_as::<(Outcome,)>(&mut scoped, PATIENCE).await;
    assert_eq!(first, Some((Outcome::TimedOut,)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// The scoped caller waits for its answer and drops answers that come late.
#[tokio::test]
async fn scoped_requests_time_out_and_drop_late_answers() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();
    let target = sluggish(&runtime, LATE);

    let started = Instant::now();
    let result = scoped.request(target.address(), (Ping(1),), DEADLINE).await;
    assert_eq!(result.unwrap_err(), RequestError::Timeout);
    assert!(started.elapsed() >= DEADLINE);

    assert!(scoped.receive(LATE).await.is_none());

    let quick = sluggish(&runtime, Duration::ZERO);
    let answer = scoped.request(quick.address(), (Ping(2),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(2),)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// Messages arriving while the scoped caller waits are kept for `receive`.
#[tokio::test]
async fn scoped_requests_keep_other_messages() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();
    let target = sluggish(&runtime, Duration::from_millis(50));
    send_anonymous(scoped.address(), Priority::Normal, (Outcome::Mismatched,));

    let answer = scoped.request(target.address(), (Ping(3),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(3),)));
    let kept = next_as::<(Outcome,)>(&mut scoped, PATIENCE).await;
    assert_eq!(kept, Some((Outcome::Mismatched,)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// Requests without an explicit deadline use the configured default timeout.
#[tokio::test]
async fn ask_uses_the_configured_timeout() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = ActonConfig::default();
    config.timeouts.default_request_timeout_ms = 100;
    let runtime = ActonApp::launch_with_config(config);
    let mut scoped = runtime.scoped();
    let slow = sluggish(&runtime, LATE);
    let quick = sluggish(&runtime, Duration::ZERO);

    let started = Instant::now();
    assert_eq!(scoped.ask(slow.address(), (Ping(1),)).await.unwrap_err(), RequestError::Timeout);
    assert!(started.elapsed() >= DEADLINE);
    assert!(started.elapsed() < LATE);

    let answer = scoped.ask(quick.address(), (Ping(2),)).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(2),)));

    let slow_address = slow.address().clone();
    let _requester = runtime.spawn(Observer::reporting_to(scoped.address()), move |actor| {
        actor.ask(&slow_address, (Ping(3),), |actor, result| {
            let outcome = match result {
                Err(RequestError::Timeout) => Outcome::TimedOut,
                _ => Outcome::Mismatched,
            };
            actor.model.notify((outcome,));
            Reply::ready()
        });
        Ok(Behavior::new().on::<(Ping,), _>(|_, _| Reply::ready()))
    });
    let started = Instant::now();
    let outcome = next_as::<(Outcome,)>(&mut scoped, PATIENCE).await;
    assert_eq!(outcome, Some((Outcome::TimedOut,)));
    assert!(started.elapsed() < LATE);
    runtime.shutdown_all().await?;
    Ok(())
}
