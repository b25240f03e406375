//! concurrent voting against one tracker

use std::thread;

use keygate::{QuorumConfig, QuorumTracker, RequestId, VoteOutcome};

fn authorities(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("authority-{}", i)).collect()
}

#[test]
fn test_same_voter_many_threads_counts_once() {
    let tracker = QuorumTracker::new(&QuorumConfig::new(4, authorities(7))).unwrap();
    let rid = RequestId::new("r1");

    let outcomes: Vec<VoteOutcome> = thread::scope(|s| {
        let handles: Vec<_> = (0..32)
            .map(|_| s.spawn(|| tracker.cast_vote(&rid, "authority-3").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, VoteOutcome::Recorded { .. }))
        .count();
    assert_eq!(recorded, 1);
    assert!(outcomes.iter().all(|o| o.count() == 1));
    assert_eq!(tracker.status(&rid).unwrap().count, 1);
}

#[test]
fn test_distinct_voters_all_counted() {
    let ids = authorities(16);
    let tracker = QuorumTracker::new(&QuorumConfig::new(10, ids.clone())).unwrap();
    let rid = RequestId::new("r1");

    thread::scope(|s| {
        for id in &ids {
            // every voter hammers its own vote a few times
            for _ in 0..4 {
                let tracker = &tracker;
                let rid = &rid;
                s.spawn(move || tracker.cast_vote(rid, id).unwrap());
            }
        }
    });

    let state = tracker.status(&rid).unwrap();
    assert_eq!(state.count, 16);
    assert!(state.reached);
    assert_eq!(tracker.approvers(&rid).unwrap().len(), 16);
}

#[test]
fn test_exactly_one_vote_crosses_threshold() {
    let ids = authorities(7);
    let tracker = QuorumTracker::new(&QuorumConfig::new(4, ids.clone())).unwrap();
    let rid = RequestId::new("r1");

    let outcomes: Vec<VoteOutcome> = thread::scope(|s| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let tracker = &tracker;
                let rid = &rid;
                s.spawn(move || tracker.cast_vote(rid, id).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let crossing = outcomes
        .iter()
        .filter(|o| matches!(o, VoteOutcome::Recorded { count: 4, .. }))
        .count();
    assert_eq!(crossing, 1);
    let mut counts: Vec<usize> = outcomes.iter().map(|o| o.count()).collect();
    counts.sort_unstable();
    assert_eq!(counts, (1..=7).collect::<Vec<_>>());
}

#[test]
fn test_concurrent_requests_are_isolated() {
    let ids = authorities(5);
    let tracker = QuorumTracker::new(&QuorumConfig::new(3, ids.clone())).unwrap();
    let requests: Vec<RequestId> = (0..8).map(|i| RequestId::new(format!("r{}", i))).collect();

    thread::scope(|s| {
        for (i, rid) in requests.iter().enumerate() {
            let voters = &ids[..(i % 5) + 1];
            let tracker = &tracker;
            s.spawn(move || {
                for v in voters {
                    tracker.cast_vote(rid, v).unwrap();
                }
            });
        }
    });

    for (i, rid) in requests.iter().enumerate() {
        assert_eq!(tracker.status(rid).unwrap().count, (i % 5) + 1);
    }
}
