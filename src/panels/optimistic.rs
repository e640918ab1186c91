use std::future::Future;

/// Applies `tentative` to `state` right away, then awaits `remote`.
/// If the remote call fails, `state` is put back to the snapshot taken
/// before the change and the error is returned.
pub async fn apply_with_rollback<S, E, F, Fut>(state: &mut S, tentative: F, remote: Fut) -> Result<(), E>
where
    S: Clone,
    F: FnOnce(&mut S),
    Fut: Future<Output = Result<(), E>>,
{
    let snapshot = state.clone();
    tentative(state);

    if let Err(e) = remote.await {
        *state = snapshot;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_change_on_success() {
        let mut items = vec![1, 2, 3];
        let result: Result<(), ()> =
            apply_with_rollback(&mut items, |v| v.retain(|&x| x != 2), async { Ok(()) }).await;
        assert!(result.is_ok());
        assert_eq!(items, vec![1, 3]);
    }

    #[tokio::test]
    async fn restores_whole_snapshot_on_failure() {
        let mut items = vec![1, 2, 3];
        let result = apply_with_rollback(&mut items, |v| v.clear(), async { Err("offline") }).await;
        assert_eq!(result, Err("offline"));
        assert_eq!(items, vec![1, 2, 3]);
    }
}
