//! Callback group: the concurrency-partitioning registry
//!
//! A `CallbackGroup` owns no endpoints. It records weak references to the
//! schedulable endpoints assigned to it and declares, through its mode,
//! how an external executor may overlap their callbacks. The executor
//! talks to the group through the lock-free association flags and the
//! predicate lookups; only the node wiring layer (same crate) may mutate
//! the registry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::entity::{Client, Publisher, Service, Subscription, Timer, Waitable};
use crate::mode::GroupMode;
use crate::spinlock::SpinLock;

/// Weak references to every endpoint assigned to a group, one vector
/// per kind, all guarded by a single spinlock.
#[derive(Default)]
struct Registry {
    publishers: Vec<Weak<dyn Publisher>>,
    subscriptions: Vec<Weak<dyn Subscription>>,
    timers: Vec<Weak<dyn Timer>>,
    services: Vec<Weak<dyn Service>>,
    clients: Vec<Weak<dyn Client>>,
    waitables: Vec<Weak<dyn Waitable>>,
}

impl Registry {
    fn len(&self) -> usize {
        self.publishers.len()
            + self.subscriptions.len()
            + self.timers.len()
            + self.services.len()
            + self.clients.len()
            + self.waitables.len()
    }
}

/// Unit of concurrency partitioning for an executor
///
/// The two atomic flags live outside the registry lock on purpose: the
/// executor reads them on its hot polling path and must never wait on a
/// registry scan. The flip side is that flag state and registry contents
/// are independent synchronization domains; never assume they are
/// consistent with each other at a single instant.
pub struct CallbackGroup {
    mode: GroupMode,
    auto_add: bool,
    registry: SpinLock<Registry>,
    /// True while the executor may select callbacks from this group.
    /// For exclusive groups the executor clears this before dispatching
    /// a callback and restores it after the callback finishes, success
    /// or not. For reentrant groups it stays true.
    dispatchable: AtomicBool,
    /// True while some executor holds this group. At most one executor
    /// may hold a group; claiming goes through `try_claim`.
    claimed: AtomicBool,
}

impl CallbackGroup {
    /// Create a group that is automatically placed under executor
    /// management when its node is attached to an executor
    pub fn new(mode: GroupMode) -> Self {
        Self::with_auto_add(mode, true)
    }

    /// Create a group with an explicit auto-add policy
    ///
    /// With `auto_add` false the group is skipped by executor attachment
    /// and must be handed to an executor manually.
    pub fn with_auto_add(mode: GroupMode, auto_add: bool) -> Self {
        CallbackGroup {
            mode,
            auto_add,
            registry: SpinLock::new(Registry::default()),
            dispatchable: AtomicBool::new(true),
            claimed: AtomicBool::new(false),
        }
    }

    /// The concurrency mode fixed at construction
    #[inline]
    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    /// The auto-add policy fixed at construction
    #[inline]
    pub fn auto_add(&self) -> bool {
        self.auto_add
    }

    /// Whether the executor may currently select callbacks from this group
    #[inline]
    pub fn is_dispatchable(&self) -> bool {
        self.dispatchable.load(Ordering::Acquire)
    }

    /// Set dispatch eligibility
    ///
    /// Executor-side contract for exclusive groups: clear before running
    /// a callback, restore in a guaranteed cleanup step afterwards even
    /// when the callback fails.
    #[inline]
    pub fn set_dispatchable(&self, eligible: bool) {
        self.dispatchable.store(eligible, Ordering::Release);
    }

    /// Whether some executor currently holds this group
    ///
    /// Advisory read only; taking ownership must go through `try_claim`.
    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Atomically claim this group for an executor
    ///
    /// Returns true if this caller transitioned the flag false→true and
    /// now owns the group. Returns false if another executor already
    /// holds it. The losing caller must not touch the group's entities.
    #[inline]
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release an executor claim
    ///
    /// Only the executor that won `try_claim` may call this; the flag is
    /// a protocol, not an OS-enforced lock.
    #[inline]
    pub fn release_claim(&self) {
        self.claimed.store(false, Ordering::Release);
    }

    /// Total number of registry entries, dead ones included
    ///
    /// Dead weak references are not purged outside `remove_waitable`, so
    /// this counts everything ever registered and not yet removed.
    pub fn size(&self) -> usize {
        self.registry.lock().len()
    }

    /// Find the first live subscription matching `pred`, insertion order
    pub fn find_subscription_if<F>(&self, pred: F) -> Option<Arc<dyn Subscription>>
    where
        F: FnMut(&Arc<dyn Subscription>) -> bool,
    {
        find_entity_if(&self.registry.lock().subscriptions, pred)
    }

    /// Find the first live timer matching `pred`, insertion order
    pub fn find_timer_if<F>(&self, pred: F) -> Option<Arc<dyn Timer>>
    where
        F: FnMut(&Arc<dyn Timer>) -> bool,
    {
        find_entity_if(&self.registry.lock().timers, pred)
    }

    /// Find the first live service matching `pred`, insertion order
    pub fn find_service_if<F>(&self, pred: F) -> Option<Arc<dyn Service>>
    where
        F: FnMut(&Arc<dyn Service>) -> bool,
    {
        find_entity_if(&self.registry.lock().services, pred)
    }

    /// Find the first live client matching `pred`, insertion order
    pub fn find_client_if<F>(&self, pred: F) -> Option<Arc<dyn Client>>
    where
        F: FnMut(&Arc<dyn Client>) -> bool,
    {
        find_entity_if(&self.registry.lock().clients, pred)
    }

    /// Find the first live waitable matching `pred`, insertion order
    pub fn find_waitable_if<F>(&self, pred: F) -> Option<Arc<dyn Waitable>>
    where
        F: FnMut(&Arc<dyn Waitable>) -> bool,
    {
        find_entity_if(&self.registry.lock().waitables, pred)
    }

    // ------------------------------------------------------------------
    // Restricted mutation surface. Crate-private: only the node wiring
    // layer registers endpoints. Duplicates are permitted, nothing is
    // validated, and none of these can fail.
    // ------------------------------------------------------------------

    pub(crate) fn add_publisher(&self, publisher: &Arc<dyn Publisher>) {
        self.registry
            .lock()
            .publishers
            .push(Arc::downgrade(publisher));
    }

    pub(crate) fn add_subscription(&self, subscription: &Arc<dyn Subscription>) {
        self.registry
            .lock()
            .subscriptions
            .push(Arc::downgrade(subscription));
    }

    pub(crate) fn add_timer(&self, timer: &Arc<dyn Timer>) {
        self.registry.lock().timers.push(Arc::downgrade(timer));
    }

    pub(crate) fn add_service(&self, service: &Arc<dyn Service>) {
        self.registry.lock().services.push(Arc::downgrade(service));
    }

    pub(crate) fn add_client(&self, client: &Arc<dyn Client>) {
        self.registry.lock().clients.push(Arc::downgrade(client));
    }

    pub(crate) fn add_waitable(&self, waitable: &Arc<dyn Waitable>) {
        self.registry
            .lock()
            .waitables
            .push(Arc::downgrade(waitable));
    }

    /// Remove the first registry entry referring to this waitable
    ///
    /// Matching is allocation identity, not handle equality. Removing a
    /// waitable that was never added is a silent no-op. Waitables are
    /// the only kind with explicit removal; the other kinds just go dead
    /// when their owner drops them and get skipped by lookups.
    pub(crate) fn remove_waitable(&self, waitable: &Arc<dyn Waitable>) {
        let target = Arc::downgrade(waitable);
        let mut registry = self.registry.lock();
        if let Some(pos) = registry.waitables.iter().position(|w| w.ptr_eq(&target)) {
            registry.waitables.remove(pos);
        }
    }
}

impl fmt::Debug for CallbackGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackGroup")
            .field("mode", &self.mode)
            .field("auto_add", &self.auto_add)
            .field("dispatchable", &self.is_dispatchable())
            .field("claimed", &self.is_claimed())
            .field("size", &self.size())
            .finish()
    }
}

/// Shared scan-and-upgrade for all five lookup kinds
///
/// Runs entirely under the registry lock held by the caller's guard so
/// the upgrade cannot race a concurrent registration. Dead entries are
/// skipped, never removed. First live match wins.
fn find_entity_if<T, F>(entries: &[Weak<T>], mut pred: F) -> Option<Arc<T>>
where
    T: ?Sized,
    F: FnMut(&Arc<T>) -> bool,
{
    for weak in entries {
        if let Some(entity) = weak.upgrade() {
            if pred(&entity) {
                return Some(entity);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityHandle, Schedulable};
    use std::thread;

    struct TestEndpoint {
        handle: EntityHandle,
    }

    impl TestEndpoint {
        fn new() -> Arc<Self> {
            Arc::new(TestEndpoint {
                handle: EntityHandle::next(),
            })
        }
    }

    impl Schedulable for TestEndpoint {
        fn handle(&self) -> EntityHandle {
            self.handle
        }
    }

    impl Subscription for TestEndpoint {}
    impl Timer for TestEndpoint {}
    impl Waitable for TestEndpoint {}

    fn as_timer(e: &Arc<TestEndpoint>) -> Arc<dyn Timer> {
        e.clone()
    }

    fn as_subscription(e: &Arc<TestEndpoint>) -> Arc<dyn Subscription> {
        e.clone()
    }

    fn as_waitable(e: &Arc<TestEndpoint>) -> Arc<dyn Waitable> {
        e.clone()
    }

    #[test]
    fn test_construction_state() {
        let group = CallbackGroup::new(GroupMode::Reentrant);
        assert_eq!(group.mode(), GroupMode::Reentrant);
        assert!(group.auto_add());
        assert!(group.is_dispatchable());
        assert!(!group.is_claimed());
        assert_eq!(group.size(), 0);

        let manual = CallbackGroup::with_auto_add(GroupMode::Exclusive, false);
        assert_eq!(manual.mode(), GroupMode::Exclusive);
        assert!(!manual.auto_add());
    }

    #[test]
    fn test_find_timer_by_handle() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let t1 = TestEndpoint::new();
        let t2 = TestEndpoint::new();
        group.add_timer(&as_timer(&t1));
        group.add_timer(&as_timer(&t2));

        let found = group.find_timer_if(|t| t.handle() == t2.handle());
        assert_eq!(found.unwrap().handle(), t2.handle());

        // No registered timer carries the sentinel handle
        assert!(group
            .find_timer_if(|t| t.handle() == EntityHandle::NONE)
            .is_none());
    }

    #[test]
    fn test_first_match_wins_insertion_order() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let first = TestEndpoint::new();
        let second = TestEndpoint::new();
        group.add_timer(&as_timer(&first));
        group.add_timer(&as_timer(&second));

        let found = group.find_timer_if(|_| true).unwrap();
        assert_eq!(found.handle(), first.handle());
    }

    #[test]
    fn test_dead_entity_skipped() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let dead = TestEndpoint::new();
        let dead_handle = dead.handle();
        let alive = TestEndpoint::new();
        group.add_timer(&as_timer(&dead));
        group.add_timer(&as_timer(&alive));

        drop(dead);

        assert!(group.find_timer_if(|t| t.handle() == dead_handle).is_none());
        let found = group.find_timer_if(|_| true).unwrap();
        assert_eq!(found.handle(), alive.handle());

        // Dead entries stay in the registry until the group goes away
        assert_eq!(group.size(), 2);
    }

    #[test]
    fn test_duplicate_registration_kept() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let sub = TestEndpoint::new();
        group.add_subscription(&as_subscription(&sub));
        group.add_subscription(&as_subscription(&sub));
        assert_eq!(group.size(), 2);
    }

    #[test]
    fn test_remove_waitable_idempotent() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let w = TestEndpoint::new();
        let other = TestEndpoint::new();
        group.add_waitable(&as_waitable(&w));

        // Removing an endpoint that was never added is a no-op
        group.remove_waitable(&as_waitable(&other));
        assert_eq!(group.size(), 1);

        group.remove_waitable(&as_waitable(&w));
        assert_eq!(group.size(), 0);

        // Second removal finds nothing and must not fail
        group.remove_waitable(&as_waitable(&w));
        assert_eq!(group.size(), 0);
    }

    #[test]
    fn test_remove_waitable_first_duplicate_only() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let w = TestEndpoint::new();
        group.add_waitable(&as_waitable(&w));
        group.add_waitable(&as_waitable(&w));

        group.remove_waitable(&as_waitable(&w));
        assert_eq!(group.size(), 1);
        assert!(group.find_waitable_if(|_| true).is_some());
    }

    #[test]
    fn test_concurrent_adds_lose_nothing() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 100;

        let group = Arc::new(CallbackGroup::new(GroupMode::Reentrant));
        let mut handles = Vec::new();

        for _ in 0..THREADS {
            let group = group.clone();
            handles.push(thread::spawn(move || {
                let mut owned = Vec::with_capacity(PER_THREAD);
                for _ in 0..PER_THREAD {
                    let sub = TestEndpoint::new();
                    group.add_subscription(&as_subscription(&sub));
                    owned.push(sub);
                }
                owned
            }));
        }

        let mut all: Vec<Arc<TestEndpoint>> = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }

        assert_eq!(group.size(), THREADS * PER_THREAD);
        for sub in &all {
            let found = group.find_subscription_if(|s| s.handle() == sub.handle());
            assert_eq!(found.unwrap().handle(), sub.handle());
        }
    }

    #[test]
    fn test_claim_race_single_winner() {
        let group = Arc::new(CallbackGroup::new(GroupMode::Exclusive));

        let a = {
            let group = group.clone();
            thread::spawn(move || group.try_claim())
        };
        let b = {
            let group = group.clone();
            thread::spawn(move || group.try_claim())
        };

        let won_a = a.join().unwrap();
        let won_b = b.join().unwrap();

        assert!(won_a ^ won_b);
        assert!(group.is_claimed());

        group.release_claim();
        assert!(!group.is_claimed());
        assert!(group.try_claim());
    }

    #[test]
    fn test_dispatchable_toggle() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        assert!(group.is_dispatchable());
        group.set_dispatchable(false);
        assert!(!group.is_dispatchable());
        group.set_dispatchable(true);
        assert!(group.is_dispatchable());
    }

    #[test]
    fn test_lookup_does_not_extend_lifetime() {
        let group = CallbackGroup::new(GroupMode::Exclusive);
        let w = TestEndpoint::new();
        group.add_waitable(&as_waitable(&w));
        assert_eq!(Arc::strong_count(&w), 1);

        drop(w);
        assert!(group.find_waitable_if(|_| true).is_none());
    }
}
