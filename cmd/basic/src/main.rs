//! Basic callgroup example
//!
//! Builds a node with an exclusive and a reentrant group, registers
//! timers through the wiring layer, then drives a miniature executor
//! loop against the group protocol: claim via `try_claim`, resolve ready
//! handles with predicate lookup, and gate exclusive dispatch through
//! the dispatchability flag.
//!
//! # Environment Variables
//!
//! - `CBG_FLUSH_EPRINT=1` - Flush debug output immediately
//! - `CBG_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)

use callgroup_core::{
    kdebug, kinfo, CallbackGroup, EntityHandle, GroupMode, Node, Schedulable, Timer,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// CBG_LOG_LEVEL=debug cargo run -p callgroup-basic

/// A demo timer: fires every `period` rounds of the executor loop
struct DemoTimer {
    handle: EntityHandle,
    period: u64,
    fired: AtomicU64,
}

impl DemoTimer {
    fn new(period: u64) -> Arc<Self> {
        Arc::new(DemoTimer {
            handle: EntityHandle::next(),
            period,
            fired: AtomicU64::new(0),
        })
    }

    fn is_due(&self, round: u64) -> bool {
        round % self.period == 0
    }

    fn fire(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }
}

impl Schedulable for DemoTimer {
    fn handle(&self) -> EntityHandle {
        self.handle
    }
}

impl Timer for DemoTimer {}

/// Dispatch one ready handle against a claimed group
///
/// For exclusive groups, eligibility is cleared before the callback and
/// restored afterwards no matter what - the cleanup step the protocol
/// expects from every executor.
fn dispatch(group: &Arc<CallbackGroup>, ready: EntityHandle, timers: &[Arc<DemoTimer>]) {
    if !group.is_dispatchable() {
        kdebug!("group {} busy, skipping handle {}", group.mode(), ready);
        return;
    }

    let Some(found) = group.find_timer_if(|t| t.handle() == ready) else {
        return; // Ready handle belongs to another group
    };

    if group.mode().is_exclusive() {
        group.set_dispatchable(false);
    }

    // "Run the callback": locate the concrete timer and fire it
    if let Some(timer) = timers.iter().find(|t| t.handle() == found.handle()) {
        timer.fire();
        kdebug!("fired timer {} in {} group", timer.handle(), group.mode());
    }

    if group.mode().is_exclusive() {
        group.set_dispatchable(true);
    }
}

fn main() {
    println!("=== callgroup Basic Example ===\n");

    let node = Node::new("demo");
    let exclusive = node.default_group();
    let reentrant = node.create_group(GroupMode::Reentrant);
    // Opted out of auto-add: the executor below never sees it
    let manual = node.create_group_with_auto_add(GroupMode::Exclusive, false);

    let fast = DemoTimer::new(1);
    let slow = DemoTimer::new(4);
    let lonely = DemoTimer::new(2);

    let wiring = node.timers();
    wiring
        .register_timer(&exclusive, &(fast.clone() as Arc<dyn Timer>))
        .expect("default group belongs to the node");
    wiring
        .register_timer(&reentrant, &(slow.clone() as Arc<dyn Timer>))
        .expect("reentrant group belongs to the node");
    wiring
        .register_timer(&manual, &(lonely.clone() as Arc<dyn Timer>))
        .expect("manual group belongs to the node");

    // Executor attachment: pick up auto-add groups and claim them
    let mut claimed: Vec<Arc<CallbackGroup>> = Vec::new();
    for group in node.auto_add_groups() {
        if group.try_claim() {
            kinfo!("claimed {} group ({:?})", group.mode(), group);
            claimed.push(group);
        }
    }
    println!("Claimed {} of 3 groups (manual group opted out)", claimed.len());

    // A second executor loses every claim race, and claimed groups no
    // longer show up for attachment at all
    assert!(node.auto_add_groups().is_empty());
    for group in &claimed {
        assert!(!group.try_claim());
    }

    let timers = [fast.clone(), slow.clone(), lonely.clone()];

    // Miniature dispatch loop: each round, every due timer produces a
    // "ready event" carrying its handle, and every claimed group gets a
    // chance to resolve it.
    for round in 1..=12u64 {
        for timer in &timers {
            if !timer.is_due(round) {
                continue;
            }
            for group in &claimed {
                dispatch(group, timer.handle(), &timers);
            }
        }
    }

    println!("\nResults after 12 rounds:");
    println!(
        "  fast   (exclusive, period 1): fired {} times",
        fast.fired.load(Ordering::Relaxed)
    );
    println!(
        "  slow   (reentrant, period 4): fired {} times",
        slow.fired.load(Ordering::Relaxed)
    );
    println!(
        "  lonely (manual,    period 2): fired {} times (group never claimed)",
        lonely.fired.load(Ordering::Relaxed)
    );

    // Executor detachment releases the groups
    for group in &claimed {
        group.release_claim();
    }
    assert!(node.auto_add_groups().len() == claimed.len());

    println!("\nDone.");
}
