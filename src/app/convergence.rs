use crate::app::report::Report;
use crate::app::wait::{Shutdown, WaitPolicy};
use crate::error::Result;
use crate::provisioner::{state, Installation, Provisioner};
use std::collections::HashMap;

enum Observation {
    Settled(Report),
    Pending(Installation),
}

fn observe(current: Installation) -> Observation {
    if state::is_failed(&current.state) {
        let message = format!("installation entered state {}", current.state);
        Observation::Settled(Report::failed(current, message))
    } else if current.state == state::STABLE {
        Observation::Settled(Report::completed(current))
    } else {
        Observation::Pending(current)
    }
}

/// Polls every in-flight installation until it is stable, failed or gone, yielding
/// exactly one report per installation. Lookup errors leave the installation in
/// flight for the next pass.
pub async fn await_convergence<P>(
    provisioner: &P,
    mut in_flight: HashMap<String, Installation>,
    policy: &WaitPolicy,
    shutdown: &Shutdown,
) -> Result<Vec<Report>>
where
    P: Provisioner + ?Sized,
{
    let mut reports = Vec::with_capacity(in_flight.len());
    let mut waiter = policy.start("waiting for installations to stabilize", shutdown);
    info!("Waiting for {} installations to stabilize", in_flight.len());
    while !in_flight.is_empty() {
        waiter.check()?;
        let ids: Vec<String> = in_flight.keys().cloned().collect();
        for id in ids {
            match provisioner.get_installation(&id).await {
                Err(err) => warn!("Failed to fetch installation {}: {}", id, err),
                Ok(None) => {
                    if let Some(last_seen) = in_flight.remove(&id) {
                        error!("Installation {} disappeared while in {}", id, last_seen.state);
                        reports.push(Report::failed(last_seen, "installation not found"));
                    }
                }
                Ok(Some(current)) => match observe(current) {
                    Observation::Settled(report) => {
                        in_flight.remove(&id);
                        match &report {
                            Report::Completed { .. } => info!("Installation {} is stable", id),
                            Report::Failed { message, .. } => {
                                error!("Installation {} failed: {}", id, message)
                            }
                        }
                        reports.push(report);
                    }
                    Observation::Pending(current) => {
                        trace!("Installation {} is {}", id, current.state);
                        in_flight.insert(id, current);
                    }
                },
            }
        }
        if !in_flight.is_empty() {
            debug!(
                "Pass {}: {} installations still converging",
                waiter.passes(),
                in_flight.len()
            );
            waiter.pause().await;
        }
    }
    info!("All installations settled after {} passes", waiter.passes());
    Ok(reports)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::provisioner::fake::{FakeProvisioner, Step};
    use std::time::Duration;

    async fn seed(provisioner: &FakeProvisioner, ids: &[&str]) -> HashMap<String, Installation> {
        let mut in_flight = HashMap::new();
        for id in ids {
            let installation = provisioner.insert(id, state::CREATION_REQUESTED).await;
            in_flight.insert(id.to_string(), installation);
        }
        in_flight
    }

    #[tokio::test]
    async fn test_stable_after_k_polls() {
        let provisioner = FakeProvisioner::new(3);
        let in_flight = seed(&provisioner, &["a", "b", "c"]).await;

        let reports = await_convergence(
            &provisioner,
            in_flight,
            &WaitPolicy::default(),
            &Shutdown::new(),
        )
        .await
        .unwrap();

        assert_eq!(reports.len(), 3);
        for report in &reports {
            match report {
                Report::Completed {
                    installation,
                    created_at,
                    completed_at,
                } => {
                    assert!(completed_at >= created_at);
                    assert_eq!(provisioner.get_calls(&installation.id).await, 3);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_missing_installation_fails_once() {
        let provisioner = FakeProvisioner::new(2);
        let in_flight = seed(&provisioner, &["gone", "ok"]).await;
        provisioner.script("gone", vec![Step::Missing]).await;

        let reports = await_convergence(
            &provisioner,
            in_flight,
            &WaitPolicy::default(),
            &Shutdown::new(),
        )
        .await
        .unwrap();

        let failed: Vec<_> = reports
            .iter()
            .filter(|r| matches!(r, Report::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].installation().id, "gone");
        assert_eq!(provisioner.get_calls("gone").await, 1);
        assert_eq!(provisioner.get_calls("ok").await, 2);
    }

    #[tokio::test]
    async fn test_failed_state_is_terminal() {
        let provisioner = FakeProvisioner::new(5);
        let in_flight = seed(&provisioner, &["broken"]).await;
        provisioner
            .script(
                "broken",
                vec![
                    Step::State(state::CREATION_IN_PROGRESS),
                    Step::State("creation-failed"),
                ],
            )
            .await;

        let reports = await_convergence(
            &provisioner,
            in_flight,
            &WaitPolicy::default(),
            &Shutdown::new(),
        )
        .await
        .unwrap();

        assert_eq!(reports.len(), 1);
        match &reports[0] {
            Report::Failed {
                installation,
                message,
                ..
            } => {
                assert_eq!(installation.state, "creation-failed");
                assert!(message.contains("creation-failed"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(provisioner.get_calls("broken").await, 2);
    }

    #[tokio::test]
    async fn test_lookup_errors_are_retried() {
        let provisioner = FakeProvisioner::new(1);
        let in_flight = seed(&provisioner, &["flaky"]).await;
        provisioner.script("flaky", vec![Step::Fail, Step::Fail]).await;

        let reports = await_convergence(
            &provisioner,
            in_flight,
            &WaitPolicy::default(),
            &Shutdown::new(),
        )
        .await
        .unwrap();

        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0], Report::Completed { .. }));
        assert_eq!(provisioner.get_calls("flaky").await, 3);
    }

    #[tokio::test]
    async fn test_bounded_wait_gives_up() {
        let provisioner = FakeProvisioner::new(usize::MAX);
        let in_flight = seed(&provisioner, &["slow"]).await;
        let policy = WaitPolicy::new(Duration::from_millis(2), Some(Duration::from_millis(20)));

        let result = await_convergence(&provisioner, in_flight, &policy, &Shutdown::new()).await;

        match result {
            Err(Error::DeadlineExceeded(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
