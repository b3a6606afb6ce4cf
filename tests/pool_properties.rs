//! Property-based tests for the chromosome-parallel operation pool

use metagenome_sync::core::{OperationContext, OperationError, OperationPool, StopToken};
use proptest::prelude::*;
use std::thread;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Results come back in unit order whatever order units finish in
    #[test]
    fn prop_results_in_submission_order(
        delays in prop::collection::vec(0u64..3, 0..24),
        workers in 1usize..6,
    ) {
        let pool = OperationPool::with_workers(workers).unwrap();
        let ctx = OperationContext::new();

        let results = pool
            .submit(&delays, &ctx, |index, delay, _| {
                thread::sleep(Duration::from_millis(*delay));
                Ok::<_, String>(index * 10)
            })
            .unwrap();

        prop_assert_eq!(results, (0..delays.len()).map(|i| i * 10).collect::<Vec<_>>());
        prop_assert_eq!(ctx.progress().completed(), delays.len());
    }

    /// The failure with the lowest index is reported
    #[test]
    fn prop_lowest_failure_reported(count in 1usize..30, failing in prop::collection::btree_set(0usize..30, 1..5)) {
        let failing: Vec<usize> = failing.into_iter().filter(|i| *i < count).collect();
        prop_assume!(!failing.is_empty());

        let pool = OperationPool::with_workers(4).unwrap();
        let err = pool
            .run(count, &OperationContext::new(), |index, _| {
                if failing.contains(&index) {
                    Err(format!("unit {} failed", index))
                } else {
                    Ok(index)
                }
            })
            .unwrap_err();

        match err {
            OperationError::Failed { index, .. } => prop_assert_eq!(index, failing[0]),
            other => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}

#[test]
fn test_stopped_context_cancels() {
    let pool = OperationPool::with_workers(2).unwrap();
    let ctx = OperationContext::new();
    ctx.stop();

    let result = pool.run(8, &ctx, |index, _| Ok::<_, String>(index));
    assert!(matches!(result, Err(OperationError::Cancelled)));
}

#[test]
fn test_unit_can_stop_the_operation() {
    let pool = OperationPool::with_workers(2).unwrap();
    let ctx = OperationContext::new();

    let result = pool.run(64, &ctx, |index, token: &StopToken| {
        if index == 3 {
            token.stop();
        }
        token.check()?;
        Ok::<_, OperationError>(index)
    });
    assert!(matches!(result, Err(OperationError::Cancelled)));
}

#[test]
fn test_panicking_unit_becomes_failure() {
    let pool = OperationPool::with_workers(2).unwrap();
    let result = pool.run(4, &OperationContext::new(), |index, _| {
        if index == 2 {
            panic!("boom");
        }
        Ok::<_, String>(index)
    });

    match result {
        Err(OperationError::Failed { index, message }) => {
            assert_eq!(index, 2);
            assert!(message.contains("boom"));
        }
        other => panic!("unexpected result {:?}", other),
    }
}
