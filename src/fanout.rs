use futures::future::join_all;
use serde::Serialize;
use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::timeout;
use tracing::warn;

/// A key whose fetch failed, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedKey {
    pub key: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct FanOutResult<T> {
    pub successes: Vec<T>,
    pub failures: Vec<FailedKey>,
}

impl<T> FanOutResult<T> {
    pub fn attempted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Runs one fetch per key concurrently, each under its own `limit`.
///
/// A failed or timed-out fetch is recorded in `failures` and never cancels
/// the others. Successes keep the order of `keys`.
pub async fn fan_out_with_partial_tolerance<T, E, F, Fut>(
    keys: &[String],
    limit: Duration,
    fetch: F,
) -> FanOutResult<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let pending = keys.iter().map(|key| {
        let call = fetch(key.clone());
        async move {
            let outcome = match timeout(limit, call).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(err.to_string()),
                Err(_) => Err(format!("timed out after {}s", limit.as_secs_f64())),
            };
            (key, outcome)
        }
    });

    let mut result = FanOutResult {
        successes: Vec::with_capacity(keys.len()),
        failures: Vec::new(),
    };
    for (key, outcome) in join_all(pending).await {
        match outcome {
            Ok(value) => result.successes.push(value),
            Err(reason) => {
                warn!(account = %key, %reason, "fetch failed, excluding from aggregate");
                result.failures.push(FailedKey {
                    key: key.clone(),
                    reason,
                });
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn second_of_three_fails() {
        let result = fan_out_with_partial_tolerance(
            &keys(&["one", "two", "three"]),
            Duration::from_secs(1),
            |key| async move {
                if key == "two" {
                    Err(format!("{key} is broken"))
                } else {
                    Ok(key.len())
                }
            },
        )
        .await;

        assert_eq!(result.successes, vec![3, 5]);
        assert_eq!(
            result.failures,
            vec![FailedKey {
                key: "two".into(),
                reason: "two is broken".into(),
            }]
        );
        assert_eq!(result.attempted(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out_without_blocking_others() {
        let result = fan_out_with_partial_tolerance(
            &keys(&["fast", "slow"]),
            Duration::from_secs(30),
            |key| async move {
                if key == "slow" {
                    tokio::time::sleep(Duration::from_secs(120)).await;
                }
                Ok::<_, String>(key)
            },
        )
        .await;

        assert_eq!(result.successes, vec!["fast".to_string()]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].key, "slow");
        assert!(result.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn fetches_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        fan_out_with_partial_tolerance(&keys(&["a", "b", "c"]), Duration::from_secs(5), |_| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(())
            }
        })
        .await;

        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_keys_yields_empty_result() {
        let result =
            fan_out_with_partial_tolerance(&[], Duration::from_secs(1), |_| async { Ok::<u8, String>(1) }).await;
        assert!(result.successes.is_empty());
        assert!(result.failures.is_empty());
    }
}
