use action_throttle::{
    ActionType, CounterKey, CounterStore, DecisionEngine, MemoryCounterStore, Outcome, Policy,
    PolicyRegistry, Subject, SubjectId,
};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const THREADS: usize = 32;

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_parallel_increments_reach_exactly_n() {
    let store = Arc::new(MemoryCounterStore::new());
    let key = CounterKey::new(SubjectId::new("hot"), ActionType::SEND_MESSAGE);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .increment_and_get(&key, Duration::from_secs(300), at(0))
                    .unwrap()
                    .count
            })
        })
        .collect();

    let mut counts: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    counts.sort_unstable();

    assert_eq!(counts, (1..=THREADS as u64).collect::<Vec<_>>());
    assert_eq!(store.peek(&key).unwrap().count, THREADS as u64);
}

#[test]
fn test_parallel_evaluations_admit_exactly_the_ceiling() {
    let registry = PolicyRegistry::new([(
        ActionType::CREATE_POST,
        Policy::new(Duration::from_secs(60), 10, 4).unwrap(),
    )])
    .unwrap();
    let engine = DecisionEngine::builder()
        .with_registry(registry)
        .build()
        .unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine
                    .evaluate(&Subject::unverified("swarm"), &ActionType::CREATE_POST, at(0))
                    .unwrap()
                    .outcome()
            })
        })
        .collect();

    let outcomes: Vec<Outcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let count = |o: Outcome| outcomes.iter().filter(|x| **x == o).count();

    assert_eq!(count(Outcome::Allowed), 4);
    assert_eq!(count(Outcome::RequiresVerification), 6);
    assert_eq!(count(Outcome::Exceeded), THREADS - 10);

    let snapshot = engine.metrics().snapshot();
    assert_eq!(snapshot.total_decisions(), THREADS as u64);
}

#[test]
fn test_independent_subjects_in_parallel() {
    let engine = DecisionEngine::builder()
        .with_standard_policies()
        .build()
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let engine = engine.clone();
            thread::spawn(move || {
                let subject = Subject::verified(format!("user-{i}"));
                (0..40)
                    .map(|_| {
                        engine
                            .evaluate(&subject, &ActionType::SEND_MESSAGE, at(0))
                            .unwrap()
                            .outcome()
                    })
                    .all(|o| o == Outcome::Allowed)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(engine.store().len(), THREADS);
}
