//! Stress test - concurrent registration, lookup and claim races
//!
//! Hammers a shared callback group from many threads: writers register
//! subscriptions through the wiring layer while readers run predicate
//! lookups against handles already published, and a pack of fake
//! executors fight over the claim flag. Verifies at the end that no
//! registration was lost and that every claim round had exactly one
//! winner.
//!
//! # Environment Variables
//!
//! - `CBG_STRESS_THREADS` - writer/reader thread count (default 8)
//! - `CBG_STRESS_PER_THREAD` - registrations per writer (default 1000)

use callgroup_core::env::env_get;
use callgroup_core::{EntityHandle, GroupMode, Node, Schedulable, Subscription};
use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

struct StressSub {
    handle: EntityHandle,
}

impl StressSub {
    fn new() -> Arc<Self> {
        Arc::new(StressSub {
            handle: EntityHandle::next(),
        })
    }
}

impl Schedulable for StressSub {
    fn handle(&self) -> EntityHandle {
        self.handle
    }
}

impl Subscription for StressSub {}

fn main() {
    println!("=== callgroup Stress Test ===\n");

    let threads: usize = env_get("CBG_STRESS_THREADS", 8);
    let per_thread: usize = env_get("CBG_STRESS_PER_THREAD", 1000);

    println!(
        "{} writer threads x {} registrations, {} readers, {} claimers\n",
        threads, per_thread, threads, threads
    );

    let node = Arc::new(Node::new("stress"));
    let group = node.create_group(GroupMode::Reentrant);

    // Registered subscriptions must stay alive; the group only holds
    // weak references. SegQueue doubles as the published-handle feed
    // for reader threads.
    let live: Arc<SegQueue<Arc<StressSub>>> = Arc::new(SegQueue::new());
    let published: Arc<SegQueue<EntityHandle>> = Arc::new(SegQueue::new());
    let done = Arc::new(AtomicBool::new(false));
    let hits = Arc::new(AtomicU64::new(0));

    let start = Instant::now();
    let mut handles = Vec::new();

    // Writers: register through the wiring layer
    for _ in 0..threads {
        let node = node.clone();
        let group = group.clone();
        let live = live.clone();
        let published = published.clone();
        handles.push(thread::spawn(move || {
            let wiring = node.topics();
            for _ in 0..per_thread {
                let sub = StressSub::new();
                let handle = sub.handle();
                wiring
                    .register_subscription(&group, &(sub.clone() as Arc<dyn Subscription>))
                    .expect("group belongs to the stress node");
                live.push(sub);
                published.push(handle);
            }
        }));
    }

    // Readers: look up handles the writers have already published
    for _ in 0..threads {
        let group = group.clone();
        let published = published.clone();
        let done = done.clone();
        let hits = hits.clone();
        handles.push(thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                let Some(handle) = published.pop() else {
                    thread::yield_now();
                    continue;
                };
                let found = group
                    .find_subscription_if(|s| s.handle() == handle)
                    .expect("published handle must resolve to a live subscription");
                assert_eq!(found.handle(), handle);
                hits.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    // Claimers: repeated rounds of the claim race
    let rounds = 1000u64;
    let wins = Arc::new(AtomicU64::new(0));
    let mut claimers = Vec::new();
    for _ in 0..threads {
        let group = group.clone();
        let wins = wins.clone();
        claimers.push(thread::spawn(move || {
            for _ in 0..rounds {
                if group.try_claim() {
                    wins.fetch_add(1, Ordering::Relaxed);
                    group.release_claim();
                }
                thread::yield_now();
            }
        }));
    }

    // Wait for writers (the first `threads` handles)
    for h in handles.drain(..threads) {
        h.join().unwrap();
    }
    let write_time = start.elapsed();

    // Let readers drain the remaining published handles
    while published.pop().is_some() {}
    done.store(true, Ordering::Release);
    for h in handles {
        h.join().unwrap();
    }
    for h in claimers {
        h.join().unwrap();
    }

    let expected = threads * per_thread;
    assert_eq!(group.size(), expected, "registry lost or duplicated entries");

    println!("Registered:     {} subscriptions in {:?}", expected, write_time);
    println!(
        "Register rate:  {:.0} entities/sec",
        expected as f64 / write_time.as_secs_f64()
    );
    println!("Lookup hits:    {}", hits.load(Ordering::Relaxed));
    println!(
        "Claim wins:     {} (claim flag now {})",
        wins.load(Ordering::Relaxed),
        if group.is_claimed() { "held" } else { "free" }
    );
    assert!(!group.is_claimed());

    println!("\nAll entries accounted for. Done.");
}
