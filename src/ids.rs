use std::future::Future;

use tracing::warn;

/// Runs `insert` with freshly generated ids until it stops colliding.
///
/// `collided` decides whether an insert error was a clash on the generated
/// id (and not, say, on another unique column); any other outcome is returned
/// as is.
pub async fn insert_with_fresh_id<T, G, F, Fut, C>(
    attempts: usize,
    mut generate: G,
    mut insert: F,
    collided: C,
) -> anyhow::Result<T>
where
    G: FnMut() -> String,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    C: Fn(&anyhow::Error) -> bool,
{
    for attempt in 1..=attempts {
        match insert(generate()).await {
            Err(e) if collided(&e) => warn!(attempt, "generated id already taken"),
            other => return other,
        }
    }
    anyhow::bail!("no free id after {attempts} attempts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("id-{n}")
        }
    }

    #[tokio::test]
    async fn retries_collisions_with_new_ids() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let out = insert_with_fresh_id(
            10,
            counter(),
            move |id| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(id.clone());
                    if id == "id-3" {
                        Ok(id)
                    } else {
                        Err(anyhow::anyhow!("duplicate key"))
                    }
                }
            },
            |e| e.to_string() == "duplicate key",
        )
        .await
        .unwrap();
        assert_eq!(out, "id-3");
        assert_eq!(*seen.lock().unwrap(), vec!["id-1", "id-2", "id-3"]);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Arc::new(Mutex::new(0));
        let c = calls.clone();
        let err = insert_with_fresh_id(
            10,
            counter(),
            move |_id| {
                let c = c.clone();
                async move {
                    *c.lock().unwrap() += 1;
                    Err::<String, _>(anyhow::anyhow!("email taken"))
                }
            },
            |e| e.to_string() == "duplicate key",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "email taken");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_budget() {
        let err = insert_with_fresh_id(
            3,
            counter(),
            |_id| async { Err::<String, _>(anyhow::anyhow!("duplicate key")) },
            |e| e.to_string() == "duplicate key",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("3 attempts"));
    }
}
