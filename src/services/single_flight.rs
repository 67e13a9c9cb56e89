//! Per-key in-flight operation sharing
//!
//! The first caller for a key starts the operation; callers arriving while it
//! runs await the same shared future and receive a clone of its outcome,
//! success or failure alike. The operation runs as its own task, so it
//! finishes and forgets its key even if every caller goes away.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

type Flight<T> = Shared<BoxFuture<'static, Option<T>>>;
type FlightMap<T> = Arc<Mutex<HashMap<String, (u64, Flight<T>)>>>;

pub struct SingleFlight<T> {
    in_flight: FlightMap<T>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: self.in_flight.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` under `key`, or join the run already in progress.
    ///
    /// `operation` is dropped unstarted when a run is joined. `None` means
    /// the run panicked.
    pub async fn run<F>(&self, key: &str, operation: F) -> Option<T>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(key) {
                Some((_, flight)) => {
                    debug!("Joining in-flight operation: {}", key);
                    flight.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let map = self.in_flight.clone();
                    let owned_key = key.to_string();
                    // The map lock is held until the entry is inserted, so
                    // the task cannot remove it before it exists
                    let task = tokio::spawn(async move {
                        let _forget = ForgetOnDrop {
                            map,
                            key: owned_key,
                            id,
                        };
                        operation.await
                    });

                    let flight = task
                        .map(|joined| match joined {
                            Ok(outcome) => Some(outcome),
                            Err(e) => {
                                warn!("In-flight operation failed to complete: {}", e);
                                None
                            }
                        })
                        .boxed()
                        .shared();
                    in_flight.insert(key.to_string(), (id, flight.clone()));
                    flight
                }
            }
        };

        flight.await
    }

    /// Number of keys with an operation in progress
    #[cfg(test)]
    pub(crate) fn active_keys(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Removes a flight's entry when its task ends, panics included
struct ForgetOnDrop<T> {
    map: FlightMap<T>,
    key: String,
    id: u64,
}

impl<T> Drop for ForgetOnDrop<T> {
    fn drop(&mut self) {
        let mut in_flight = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(&self.key)
            .is_some_and(|(current, _)| *current == self.id)
        {
            in_flight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counted(
        runs: &Arc<AtomicUsize>,
        delay: Duration,
        outcome: Result<u32, String>,
    ) -> impl Future<Output = Result<u32, String>> + Send + 'static {
        let runs = runs.clone();
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            outcome
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let flights = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let outcomes = futures::future::join_all((0..8).map(|_| {
            flights.run("logo_abc", counted(&runs, Duration::from_millis(20), Ok(7)))
        }))
        .await;

        assert!(outcomes.iter().all(|o| *o == Some(Ok(7))));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flights.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_shared_not_retried_in_turn() {
        let flights = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let delay = Duration::from_millis(100);

        let started = std::time::Instant::now();
        let outcomes = futures::future::join_all((0..5).map(|_| {
            flights.run("desc_rA_USD", counted(&runs, delay, Err("timeout".to_string())))
        }))
        .await;

        assert!(outcomes
            .iter()
            .all(|o| *o == Some(Err("timeout".to_string()))));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < delay * 3);

        // Finished runs are forgotten, so the next caller starts afresh
        flights
            .run("desc_rA_USD", counted(&runs, Duration::ZERO, Ok(1)))
            .await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_different_keys_run_independently() {
        let flights = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            flights.run("a", counted(&runs, Duration::from_millis(10), Ok(1))),
            flights.run("b", counted(&runs, Duration::from_millis(10), Ok(2))),
        );

        assert_eq!((a, b), (Some(Ok(1)), Some(Ok(2))));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_abandoned_run_still_clears_its_key() {
        let flights = SingleFlight::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            flights.run("logo_abc", counted(&runs, Duration::from_millis(50), Ok(3))),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(flights.active_keys(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(flights.active_keys(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
