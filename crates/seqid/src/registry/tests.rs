use crate::{Error, IdAssigner, NodeId, Registry, SequenceId, TimeSource, entity_key};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread::scope;

/// Settable clock shared by every generator of a registry.
#[derive(Default)]
struct AtomicTime {
    millis: AtomicU64,
}

impl TimeSource for AtomicTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }
}

fn node(node_id: i64) -> NodeId {
    NodeId::new(node_id).unwrap()
}

#[test]
fn creates_one_generator_per_key() {
    let registry = Registry::new(node(4));
    assert!(registry.is_empty());

    let a1 = registry.generator("A").unwrap();
    let a2 = registry.generator("A").unwrap();
    let b = registry.generator("B").unwrap();

    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b));
    assert_eq!(a1.node_id(), node(4));
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("A"));
    assert!(!registry.contains("C"));
}

#[test]
fn keys_do_not_share_sequence_state() {
    let time = Arc::new(AtomicTime::default());
    time.millis.store(500, Ordering::Relaxed);
    let registry = Registry::with_time(node(1), Arc::clone(&time));

    let mut stream_a = Vec::with_capacity(1000);
    let mut stream_b = Vec::with_capacity(1000);
    for i in 0..1000 {
        // Advance the clock every 256 calls so both streams roll over
        time.millis.store(500 + i / 256, Ordering::Relaxed);
        stream_a.push(SequenceId::from_raw(registry.generate("A").unwrap()));
        stream_b.push(SequenceId::from_raw(registry.generate("B").unwrap()));
    }

    for stream in [&stream_a, &stream_b] {
        assert!(stream.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stream[0].sequence(), 0);
    }

    // Same clock, same node, independent counters: both streams are identical,
    // so IDs are only unique within one key
    assert_eq!(stream_a, stream_b);
    let a: HashSet<_> = stream_a.iter().map(|id| (id.timestamp(), id.sequence())).collect();
    assert_eq!(a.len(), 1000);
}

#[test]
fn each_key_starts_at_zero_and_is_strictly_ordered() {
    let registry = Registry::new(node(2));
    let a: Vec<_> = (0..1000).map(|_| registry.generate("A").unwrap()).collect();
    let b: Vec<_> = (0..1000).map(|_| registry.generate("B").unwrap()).collect();

    assert!(a.windows(2).all(|w| w[0] < w[1]));
    assert!(b.windows(2).all(|w| w[0] < w[1]));
    // Each key starts its own sequence at zero
    assert_eq!(SequenceId::from_raw(a[0]).sequence(), 0);
    assert_eq!(SequenceId::from_raw(b[0]).sequence(), 0);
}

#[test]
fn regression_in_one_key_is_reported_to_its_caller() {
    let time = Arc::new(AtomicTime::default());
    time.millis.store(10, Ordering::Relaxed);
    let registry = Registry::with_time(node(1), Arc::clone(&time));

    registry.generate("A").unwrap();
    time.millis.store(9, Ordering::Relaxed);
    assert_eq!(
        registry.generate("A").unwrap_err(),
        Error::ClockMovedBackwards { now: 9, last: 10 }
    );
    // A key with no history is unaffected
    assert_eq!(SequenceId::from_raw(registry.generate("B").unwrap()).timestamp(), 9);
}

#[test]
fn concurrent_first_access_converges() {
    const THREADS: usize = 16;

    let registry = Registry::new(node(1));
    let barrier = Barrier::new(THREADS);
    let seen = Mutex::new(Vec::with_capacity(THREADS));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                let generator = registry.generator("fresh").unwrap();
                seen.lock().unwrap().push(generator);
            });
        }
    });

    let seen = seen.into_inner().unwrap();
    assert!(seen.iter().all(|g| Arc::ptr_eq(g, &seen[0])));
    assert_eq!(registry.len(), 1);
}

#[test]
fn concurrent_generate_is_unique() {
    const IDS_PER_THREAD: usize = 20_000;
    let threads = num_cpus::get().clamp(2, 16);

    let registry = Registry::new(node(1));
    let seen = Mutex::new(HashSet::with_capacity(threads * IDS_PER_THREAD));

    scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                let ids: Vec<u64> = (0..IDS_PER_THREAD)
                    .map(|_| registry.generate("x").unwrap())
                    .collect();
                seen.lock().unwrap().extend(ids);
            });
        }
    });

    assert_eq!(seen.into_inner().unwrap().len(), threads * IDS_PER_THREAD);
    assert_eq!(registry.len(), 1);
}

#[test]
fn assigner_and_type_keys() {
    mod model {
        pub struct Member;
    }

    let registry = Arc::new(Registry::new(node(6)));
    let assigner: Arc<dyn IdAssigner> = registry.clone();

    let id = SequenceId::from_raw(assigner.assign_id("Member").unwrap());
    assert_eq!(id.node_id(), 6);

    let next = SequenceId::from_raw(registry.generate_for::<model::Member>().unwrap());
    assert!(next > id);
    assert_eq!(entity_key::<model::Member>(), "Member");
    assert_eq!(registry.len(), 1);
}

#[cfg(not(feature = "parking-lot"))]
#[test]
fn inspection_reads_through_poisoned_lock() {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    let registry = Registry::new(node(1));
    registry.generate("A").unwrap();

    let poisoned = catch_unwind(AssertUnwindSafe(|| {
        let _guard = registry.generators.write().unwrap();
        panic!("writer died holding the map");
    }));
    assert!(poisoned.is_err());

    assert!(registry.contains("A"));
    assert!(!registry.contains("B"));
    assert_eq!(registry.len(), 1);
    assert!(!registry.is_empty());
    // Generation still reports the poisoning
    assert_eq!(registry.generate("A").unwrap_err(), Error::LockPoisoned);
}
