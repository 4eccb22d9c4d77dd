//! Property-based tests for wkpool using proptest

use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wkpool::prelude::*;

// ============================================================================
// PoolConfig Tests
// ============================================================================

proptest! {
    /// Any size is accepted as-is, including zero
    #[test]
    fn test_config_keeps_size(size in 0usize..64) {
        prop_assert_eq!(PoolConfig::new(size).size, size);
    }

    /// Worker threads are named after the prefix and their id
    #[test]
    fn test_config_thread_name_prefix(prefix in "[a-z]{3,10}", size in 1usize..4) {
        let config = PoolConfig::new(size).with_thread_name_prefix(prefix.clone());
        prop_assert_eq!(&config.thread_name_prefix, &prefix);
    }
}

// ============================================================================
// Pool Lifecycle Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Construction yields exactly `size` listening workers with dense ids
    #[test]
    fn test_pool_has_fixed_size(size in 1usize..12) {
        let pool = WkPool::new(size).expect("Failed to create pool");

        prop_assert_eq!(pool.size(), size);
        let states = pool.worker_states();
        prop_assert_eq!(states.len(), size);
        prop_assert!(states.iter().all(|s| *s == WorkerState::Listening));

        let ids: Vec<usize> = pool.stats_snapshot().iter().map(|s| s.worker_id).collect();
        prop_assert_eq!(ids, (0..size).collect::<Vec<_>>());

        pool.stop().expect("Failed to stop pool");
        prop_assert_eq!(pool.worker_states(), vec![WorkerState::Terminated; size]);
    }

    /// Every accepted job runs once, whatever mix of panicking jobs is submitted
    #[test]
    fn test_all_jobs_accounted_for(
        size in 1usize..6,
        jobs in proptest::collection::vec(any::<bool>(), 0..64)
    ) {
        let pool = WkPool::new(size).expect("Failed to create pool");
        let completed = Arc::new(AtomicUsize::new(0));

        for &panics in &jobs {
            let completed = Arc::clone(&completed);
            pool.execute(move || {
                if panics {
                    panic!("generated failure");
                }
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .expect("Failed to submit job");
        }

        pool.stop().expect("Failed to stop pool");

        let expected_panics = jobs.iter().filter(|p| **p).count();
        prop_assert_eq!(completed.load(Ordering::SeqCst), jobs.len() - expected_panics);
        prop_assert_eq!(pool.total_jobs_panicked(), expected_panics as u64);
        prop_assert_eq!(pool.total_jobs_processed(), (jobs.len() - expected_panics) as u64);
        prop_assert_eq!(pool.total_jobs_submitted(), jobs.len() as u64);
    }
}
