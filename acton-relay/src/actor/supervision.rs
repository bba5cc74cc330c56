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

//! Process-wide bookkeeping of monitor and link relations.
//!
//! A monitor is one-way: the watcher gets exactly one [`DownMsg`](crate::message::DownMsg)
//! when the target terminates. A link is symmetric: when either side terminates,
//! the other receives an [`ExitMsg`](crate::message::ExitMsg).
//!
//! Exactly-once delivery rests on an ordering: a terminating actor records its
//! exit reason on its address *before* removing its watcher list, and a new
//! watch checks that reason while holding the list's shard lock. A watch either
//! lands in the list that termination drains, or sees the recorded reason.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::message::{ActorId, Address, ExitReason};

/// Result of registering a monitor or link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Registration {
    /// The relation was recorded.
    Added,
    /// The relation already existed; nothing changed.
    AlreadyPresent,
    /// The target had already terminated; the caller delivers the notification.
    TargetDown(ExitReason),
    /// One side is the invalid address.
    Ignored,
}

#[derive(Debug, Default)]
pub(crate) struct MonitorRegistry {
    /// target -> watchers
    monitors: DashMap<ActorId, Vec<Address>>,
    /// actor -> linked peers
    links: DashMap<ActorId, Vec<Address>>,
}

impl MonitorRegistry {
    pub(crate) fn monitor(&self, watcher: &Address, target: &Address) -> Registration {
        if !watcher.is_valid() || !target.is_valid() {
            return Registration::Ignored;
        }
        Self::attach(&self.monitors, target, watcher)
    }

    pub(crate) fn demonitor(&self, watcher: &Address, target: &Address) -> bool {
        Self::detach(&self.monitors, target, watcher)
    }

    /// Removes and returns the watchers of `target`. The caller must already have
    /// recorded the exit reason on `target`.
    pub(crate) fn take_watchers(&self, target: &Address) -> Vec<Address> {
        self.monitors
            .remove(&target.id())
            .map(|(_, watchers)| watchers)
            .unwrap_or_default()
    }

    pub(crate) fn watcher_count(&self, target: &Address) -> usize {
        self.monitors
            .get(&target.id())
            .map_or(0, |watchers| watchers.len())
    }

    pub(crate) fn link(&self, actor: &Address, peer: &Address) -> Registration {
        if !actor.is_valid() || !peer.is_valid() || actor == peer {
            return Registration::Ignored;
        }
        match Self::attach(&self.links, peer, actor) {
            Registration::Added => {
                Self::attach(&self.links, actor, peer);
                Registration::Added
            }
            other => other,
        }
    }

    pub(crate) fn unlink(&self, actor: &Address, peer: &Address) -> bool {
        let removed = Self::detach(&self.links, peer, actor);
        Self::detach(&self.links, actor, peer) || removed
    }

    /// Removes every link of `actor` and returns the peers it was linked to.
    pub(crate) fn take_links(&self, actor: &Address) -> Vec<Address> {
        let peers = self
            .links
            .remove(&actor.id())
            .map(|(_, peers)| peers)
            .unwrap_or_default();
        for peer in &peers {
            Self::detach(&self.links, peer, actor);
        }
        peers
    }

    pub(crate) fn is_linked(&self, actor: &Address, peer: &Address) -> bool {
        self.links
            .get(&actor.id())
            .is_some_and(|peers| peers.contains(peer))
    }

    /// Adds `member` to the list kept under `owner`, unless `owner` is gone.
    fn attach(table: &DashMap<ActorId, Vec<Address>>, owner: &Address, member: &Address) -> Registration {
        match table.entry(owner.id()) {
            Entry::Occupied(mut entry) => {
                // A member already listed is notified by the drain, never here.
                if entry.get().contains(member) {
                    return Registration::AlreadyPresent;
                }
                if let Some(reason) = owner.termination() {
                    return Registration::TargetDown(reason);
                }
                entry.get_mut().push(member.clone());
                Registration::Added
            }
            Entry::Vacant(entry) => {
                if let Some(reason) = owner.termination() {
                    return Registration::TargetDown(reason);
                }
                entry.insert(vec![member.clone()]);
                Registration::Added
            }
        }
    }

    fn detach(table: &DashMap<ActorId, Vec<Address>>, owner: &Address, member: &Address) -> bool {
        let removed = table.get_mut(&owner.id()).is_some_and(|mut members| {
            let before = members.len();
            members.retain(|candidate| candidate != member);
            members.len() != before
        });
        table.remove_if(&owner.id(), |_, members| members.is_empty());
        removed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use acton_ern::Ern;

    use super::*;
    use crate::actor::Mailbox;

    fn live() -> (Arc<Mailbox>, Address) {
        let mailbox = Arc::new(Mailbox::new());
        let address = Address::new(Ern::default(), &mailbox);
        (mailbox, address)
    }

    #[test]
    fn monitoring_twice_keeps_one_entry() {
        let registry = MonitorRegistry::default();
        let (_w, watcher) = live();
        let (_t, target) = live();
        assert_eq!(registry.monitor(&watcher, &target), Registration::Added);
        assert_eq!(registry.monitor(&watcher, &target), Registration::AlreadyPresent);
        assert_eq!(registry.watcher_count(&target), 1);
    }

    #[test]
    fn monitoring_a_terminated_actor_reports_its_reason() {
        let registry = MonitorRegistry::default();
        let (_w, watcher) = live();
        let (_t, target) = live();
        target.mark_terminated(ExitReason::User(3));
        assert_eq!(
            registry.monitor(&watcher, &target),
            Registration::TargetDown(ExitReason::User(3))
        );
        assert_eq!(registry.watcher_count(&target), 0);
    }

    #[test]
    fn monitoring_again_during_termination_yields_one_down() {
        let registry = MonitorRegistry::default();
        let (_w, watcher) = live();
        let (_t, target) = live();
        assert_eq!(registry.monitor(&watcher, &target), Registration::Added);
        target.mark_terminated(ExitReason::User(1));
        assert_eq!(registry.monitor(&watcher, &target), Registration::AlreadyPresent);
        assert_eq!(registry.take_watchers(&target), vec![watcher.clone()]);
    }

    #[test]
    fn monitoring_the_invalid_address_is_ignored() {
        let registry = MonitorRegistry::default();
        let (_w, watcher) = live();
        assert_eq!(
            registry.monitor(&watcher, &Address::invalid()),
            Registration::Ignored
        );
    }

    #[test]
    fn take_watchers_drains_once() {
        let registry = MonitorRegistry::default();
        let (_a, first) = live();
        let (_b, second) = live();
        let (_t, target) = live();
        registry.monitor(&first, &target);
        registry.monitor(&second, &target);
        target.mark_terminated(ExitReason::Normal);
        assert_eq!(registry.take_watchers(&target).len(), 2);
        assert!(registry.take_watchers(&target).is_empty());
    }

    #[test]
    fn demonitor_removes_the_relation() {
        let registry = MonitorRegistry::default();
        let (_w, watcher) = live();
        let (_t, target) = live();
        registry.monitor(&watcher, &target);
        assert!(registry.demonitor(&watcher, &target));
        assert!(!registry.demonitor(&watcher, &target));
        assert_eq!(registry.watcher_count(&target), 0);
    }

    #[test]
    fn links_are_symmetric() {
        let registry = MonitorRegistry::default();
        let (_a, left) = live();
        let (_b, right) = live();
        assert_eq!(registry.link(&left, &right), Registration::Added);
        assert!(registry.is_linked(&left, &right));
        assert!(registry.is_linked(&right, &left));
        let peers = registry.take_links(&left);
        assert_eq!(peers, vec![right.clone()]);
        assert!(!registry.is_linked(&right, &left));
    }
}
