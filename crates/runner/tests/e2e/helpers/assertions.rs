//! Call log assertion helpers.

use stackrun_runner::CloudCall;

/// Position of the first call matching the predicate.
///
/// # Panics
///
/// Panics if no call matches.
#[allow(dead_code)]
pub fn position(calls: &[CloudCall], what: &str, pred: impl Fn(&CloudCall) -> bool) -> usize {
    calls
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("expected a {what} call in {calls:?}"))
}

/// Position of the last call matching the predicate.
#[allow(dead_code)]
pub fn last_position(calls: &[CloudCall], what: &str, pred: impl Fn(&CloudCall) -> bool) -> usize {
    calls
        .iter()
        .rposition(pred)
        .unwrap_or_else(|| panic!("expected a {what} call in {calls:?}"))
}

/// Number of calls matching the predicate.
#[allow(dead_code)]
pub fn count(calls: &[CloudCall], pred: impl Fn(&CloudCall) -> bool) -> usize {
    calls.iter().filter(|&c| pred(c)).count()
}

/// Names of deleted buckets in call order.
#[allow(dead_code)]
pub fn deleted_buckets(calls: &[CloudCall]) -> Vec<String> {
    calls
        .iter()
        .filter_map(|c| match c {
            CloudCall::DeleteBucket { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Assert that no stack delete call was issued.
#[allow(dead_code)]
pub fn assert_no_stack_delete(calls: &[CloudCall]) {
    assert!(
        !calls.iter().any(|c| matches!(c, CloudCall::Delete(_))),
        "expected no stack delete call in {calls:?}"
    );
}
