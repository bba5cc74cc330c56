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

use crate::setup::actors::{Counter, Recorder, Silent};
use crate::setup::messages::{Fail, Num, Panic, Ping, Pong, Recorded, Report, Revert, Stray, Switch};
use crate::setup::{next_as, runtime, PATIENCE, QUIET};

mod setup;

fn loud() -> Behavior<Counter> {
    Behavior::<Counter>::new()
        .on::<(Ping,), _>(|actor, (Ping(n),)| {
            actor.model.count += 1;
            Reply::with((Pong(n),))
        })
        .on::<(Switch,), _>(|actor, _| {
            actor.push_behavior(quiet());
            Reply::ready()
        })
}

fn quiet() -> Behavior<Counter> {
    Behavior::new()
        .on::<(Ping,), _>(|_, (Ping(n),)| Reply::with((Pong(n + 1000),)))
        .on::<(Revert,), _>(|actor, _| {
            actor.pop_behavior();
            Reply::ready()
        })
}

/// A behavior installed while handling message k governs message k+1, while
/// message k itself completes under the old behavior.
#[tokio::test]
async fn become_applies_from_the_next_message() -> anyhow::Result<()> {
    let runtime = runtime();
    let actor = runtime.spawn(Counter::default(), |_| {
        Ok(Behavior::new().on::<(Ping,), _>(|actor, (Ping(n),)| {
            actor.set_behavior(
                Behavior::new().on::<(Ping,), _>(|_, (Ping(n),)| Reply::with((Pong(n * 10),))),
            );
            Reply::with((Pong(n),))
        }))
    });
    let mut scoped = runtime.scoped();

    let first = scoped.request(actor.address(), (Ping(1),), PATIENCE).await?;
    let second = scoped.request(actor.address(), (Ping(2),), PATIENCE).await?;
    assert_eq!(first.extract::<(Pong,)>(), Some((Pong(1),)));
    assert_eq!(second.extract::<(Pong,)>(), Some((Pong(20),)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// `push_behavior` keeps the previous behavior for `pop_behavior`.
#[tokio::test]
async fn pushed_behaviors_can_be_popped() -> anyhow::Result<()> {
    let runtime = runtime();
    let actor = runtime.spawn(Counter::default(), |_| Ok(loud()));
    let mut scoped = runtime.scoped();

    let answer = scoped.request(actor.address(), (Ping(1),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(1),)));

    scoped.send(actor.address(), (Switch,));
    let answer = scoped.request(actor.address(), (Ping(1),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(1001),)));

    scoped.send(actor.address(), (Revert,));
    let answer = scoped.request(actor.address(), (Ping(2),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(2),)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// Popping the last behavior terminates the actor normally.
#[tokio::test]
async fn empty_behavior_stack_terminates_normally() -> anyhow::Result<()> {
    let runtime = runtime();
    let actor = runtime.spawn(Silent, |_| {
        Ok(Behavior::new().on::<(Revert,), _>(|actor, _| {
            assert_eq!(actor.behavior_depth(), 1);
            actor.pop_behavior();
            Reply::ready()
        }))
    });
    actor.send((Revert,));
    let reason = tokio::time::timeout(PATIENCE, actor.wait_for_exit()).await?;
    assert_eq!(reason, ExitReason::Normal);
    Ok(())
}

/// A handler returning an error, or panicking, terminates the actor with a
/// failure; pending messages are discarded.
#[tokio::test]
async fn handler_failures_terminate_the_actor() -> anyhow::Result<()> {
    let runtime = runtime();
    let behavior = || {
        Behavior::<Recorder>::new()
            .on::<(Fail,), _>(|_, _| Err(anyhow::anyhow!("refused")))
            .on::<(Panic,), _>(|_, _| panic!("boom"))
            .on::<(Num,), _>(|actor, (Num(n),)| {
                actor.model.seen.push(n);
                Reply::ready()
            })
    };

    let failing = runtime.spawn(Recorder::default(), move |_| Ok(behavior()));
    let panicking = runtime.spawn(Recorder::default(), move |_| Ok(behavior()));
    let mut scoped = runtime.scoped();
    scoped.monitor(failing.address());

    failing.send((Fail,));
    failing.send((Num(1),));
    panicking.send((Panic,));

    let failed = tokio::time::timeout(PATIENCE, failing.wait_for_exit()).await?;
    assert!(matches!(failed, ExitReason::Failure(ref description) if description.contains("refused")));
    let panicked = tokio::time::timeout(PATIENCE, panicking.wait_for_exit()).await?;
    assert!(matches!(panicked, ExitReason::Failure(ref description) if description.contains("boom")));

    let (down,) = next_as::<(DownMsg,)>(&mut scoped, PATIENCE)
        .await
        .ok_or_else(|| anyhow::anyhow!("no down message"))?;
    assert_eq!(down.source, *failing.address());
    assert_eq!(down.reason, failed);
    Ok(())
}

/// Failing to build the initial behavior terminates the actor before it
/// handles anything.
#[tokio::test]
async fn failed_initialisation_terminates_the_actor() -> anyhow::Result<()> {
    let runtime = runtime();
    let actor = runtime.spawn(Silent, |_| Err(anyhow::anyhow!("no behavior today")));
    let reason = tokio::time::timeout(PATIENCE, actor.wait_for_exit()).await?;
    assert_eq!(reason, ExitReason::Failure("no behavior today".to_string()));
    assert!(!actor.is_alive());
    Ok(())
}

/// Cases are tried in order; the catch-all sees everything else.
#[tokio::test]
async fn catch_all_handles_unmatched_shapes() -> anyhow::Result<()> {
    let runtime = runtime();
    let actor = runtime.spawn(Recorder::default(), |_| {
        Ok(Behavior::<Recorder>::new()
            .on::<(Num,), _>(|actor, (Num(n),)| {
                actor.model.seen.push(n);
                Reply::ready()
            })
            .on::<(Num,), _>(|actor, (Num(n),)| {
                actor.model.seen.push(n * 100);
                Reply::ready()
            })
            .on::<(Report,), _>(|actor, _| Reply::with((Recorded(actor.model.seen.clone()),)))
            .others(|actor, message| {
                actor.model.seen.push(message.len() as u32);
                Reply::ready()
            }))
    });
    let mut scoped = runtime.scoped();
    scoped.send(actor.address(), (Num(1),));
    scoped.send(actor.address(), (Stray, Stray, Stray));
    scoped.send(actor.address(), (Num(2), Num(3)));

    let answer = scoped.request(actor.address(), (Report,), PATIENCE).await?;
    assert_eq!(answer.extract::<(Recorded,)>(), Some((Recorded(vec![1, 3, 2]),)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// A response promise answers the original requester later.
#[tokio::test]
async fn response_promises_answer_later() -> anyhow::Result<()> {
    let runtime = runtime();
    let actor = runtime.spawn(Silent, |_| {
        Ok(Behavior::new().on::<(Ping,), _>(|actor, (Ping(n),)| {
            let promise = actor.make_response_promise();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                promise.deliver((Pong(n),));
            });
            Reply::with((Pong(0),))
        }))
    });
    let mut scoped = runtime.scoped();
    let answer = scoped.request(actor.address(), (Ping(9),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(9),)));
    assert!(scoped.receive(QUIET).await.is_none());
    runtime.shutdown_all().await?;
    Ok(())
}

/// A forwarded request is answered by the delegate, directly to the requester.
#[tokio::test]
async fn forwarded_requests_are_answered_by_the_delegate() -> anyhow::Result<()> {
    let runtime = runtime();
    let worker = runtime.spawn(Silent, |_| {
        Ok(Behavior::new().on::<(Ping,), _>(|_, (Ping(n),)| Reply::with((Pong(n * 2),))))
    });
    let worker_address = worker.address().clone();
    let front = runtime.spawn(Silent, move |_| {
        Ok(Behavior::new().on::<(Ping,), _>(move |actor, _| {
            actor.forward_to(&worker_address);
            Reply::with((Pong(0),))
        }))
    });
    let mut scoped = runtime.scoped();
    let answer = scoped.request(front.address(), (Ping(21),), PATIENCE).await?;
    assert_eq!(answer.extract::<(Pong,)>(), Some((Pong(42),)));
    runtime.shutdown_all().await?;
    Ok(())
}

/// `delayed_send` delivers after the delay, not before.
#[tokio::test]
async fn delayed_send_waits() -> anyhow::Result<()> {
    let runtime = runtime();
    let mut scoped = runtime.scoped();
    let observer = scoped.address().clone();
    let _actor = runtime.spawn(Silent, move |actor| {
        actor.delayed_send(&observer, Duration::from_millis(200), (Num(5),));
        Ok(Behavior::new().on::<(Stray,), _>(|_, _| Reply::ready()))
    });

    assert!(scoped.receive(Duration::from_millis(100)).await.is_none());
    let delayed = next_as::<(Num,)>(&mut scoped, PATIENCE).await;
    assert_eq!(delayed, Some((Num(5),)));
    runtime.shutdown_all().await?;
    Ok(())
}
