//! crates/flashdecks_core/src/id_alloc.rs
//!
//! The retry loop that coordinates public-ID generation with the storage
//! layer's uniqueness constraint. Uniqueness is the database's invariant, not
//! something the generator can prove up front; the bounded retry here only
//! covers the astronomically rare collision.

use std::future::Future;

use crate::ports::{PortError, PortResult};
use crate::public_id::{generate_distinct_public_ids, generate_public_id};

/// Maximum number of insert attempts before giving up on ID allocation.
pub const MAX_ID_ALLOC_ATTEMPTS: u32 = 5;

/// Inserts one record under a freshly generated public ID.
///
/// `insert` receives a candidate ID and performs the actual storage insert.
/// On [`PortError::UniqueViolation`] a new candidate is drawn and the insert
/// retried, up to [`MAX_ID_ALLOC_ATTEMPTS`] times; any other error propagates
/// immediately. Exhausting every attempt fails with
/// [`PortError::IdSpaceExhausted`].
pub async fn insert_with_unique_id<T, F, Fut>(mut insert: F) -> PortResult<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    for _ in 0..MAX_ID_ALLOC_ATTEMPTS {
        let public_id = generate_public_id();
        match insert(public_id).await {
            Err(PortError::UniqueViolation(_)) => continue,
            other => return other,
        }
    }
    Err(PortError::IdSpaceExhausted {
        attempts: MAX_ID_ALLOC_ATTEMPTS,
    })
}

/// Inserts a batch of records under freshly generated public IDs.
///
/// The candidates passed to `insert` are pairwise distinct within the batch.
/// A uniqueness violation from storage discards the whole batch of candidates
/// and retries with new ones, under the same attempt bound and terminal
/// behavior as [`insert_with_unique_id`].
pub async fn insert_batch_with_unique_ids<T, F, Fut>(
    batch_len: usize,
    mut insert: F,
) -> PortResult<Vec<T>>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = PortResult<Vec<T>>>,
{
    for _ in 0..MAX_ID_ALLOC_ATTEMPTS {
        let public_ids = generate_distinct_public_ids(batch_len);
        match insert(public_ids).await {
            Err(PortError::UniqueViolation(_)) => continue,
            other => return other,
        }
    }
    Err(PortError::IdSpaceExhausted {
        attempts: MAX_ID_ALLOC_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::public_id::PUBLIC_ID_LENGTH;

    #[tokio::test]
    async fn first_attempt_success_returns_the_inserted_value() {
        let attempts = AtomicU32::new(0);
        let result = insert_with_unique_id(|public_id| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move { Ok(public_id) }
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(result.len(), PUBLIC_ID_LENGTH);
    }

    #[tokio::test]
    async fn retries_with_a_fresh_candidate_after_a_collision() {
        let attempts = AtomicU32::new(0);
        let result = insert_with_unique_id(|public_id| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PortError::UniqueViolation("cards_public_id_key".into()))
                } else {
                    Ok(public_id)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(result.len(), PUBLIC_ID_LENGTH);
    }

    #[tokio::test]
    async fn persistent_collisions_exhaust_after_exactly_five_attempts() {
        let attempts = AtomicU32::new(0);
        let result = insert_with_unique_id(|_public_id| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(PortError::UniqueViolation("cards_public_id_key".into())) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ID_ALLOC_ATTEMPTS);
        assert!(matches!(
            result,
            Err(PortError::IdSpaceExhausted { attempts: 5 })
        ));
    }

    #[tokio::test]
    async fn non_uniqueness_errors_short_circuit_without_retry() {
        let attempts = AtomicU32::new(0);
        let result = insert_with_unique_id(|_public_id| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(PortError::Unexpected("connection reset".into())) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }

    #[tokio::test]
    async fn batch_candidates_are_distinct_before_any_insert() {
        let result = insert_batch_with_unique_ids(25, |public_ids| async move {
            let unique: HashSet<&String> = public_ids.iter().collect();
            assert_eq!(unique.len(), public_ids.len());
            Ok(public_ids)
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 25);
    }

    #[tokio::test]
    async fn batch_is_regenerated_wholesale_on_collision() {
        let attempts = AtomicU32::new(0);
        let result = insert_batch_with_unique_ids(3, |public_ids| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(PortError::UniqueViolation("cards_public_id_key".into()))
                } else {
                    Ok(public_ids)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn batch_exhaustion_is_fatal_after_five_attempts() {
        let attempts = AtomicU32::new(0);
        let result = insert_batch_with_unique_ids(2, |_public_ids| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<Vec<()>, _>(PortError::UniqueViolation("cards_public_id_key".into())) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ID_ALLOC_ATTEMPTS);
        assert!(matches!(result, Err(PortError::IdSpaceExhausted { .. })));
    }
}
