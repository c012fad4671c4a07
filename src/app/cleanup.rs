use crate::app::wait::{Shutdown, WaitPolicy};
use crate::error::Result;
use crate::provisioner::{state, Installation, Provisioner};
use serde_derive::Serialize;
use std::collections::HashMap;

/// Outcome of one cleanup sweep. `vanished` counts installations that were already
/// gone when the sweep looked them up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Sweep {
    pub deleted: usize,
    pub vanished: usize,
    pub passes: usize,
}

/// Drives every installation to `deleted`. A delete call is only issued while the
/// installation is outside the deletion states, so each pass is idempotent.
pub async fn sweep<P>(
    provisioner: &P,
    mut remaining: HashMap<String, Installation>,
    policy: &WaitPolicy,
    shutdown: &Shutdown,
) -> Result<Sweep>
where
    P: Provisioner + ?Sized,
{
    let mut outcome = Sweep::default();
    let mut waiter = policy.start("deleting installations", shutdown);
    info!("Deleting {} installations", remaining.len());
    while !remaining.is_empty() {
        waiter.check()?;
        let ids: Vec<String> = remaining.keys().cloned().collect();
        for id in ids {
            let current = match provisioner.get_installation(&id).await {
                Ok(Some(current)) => current,
                Ok(None) => {
                    warn!("Installation {} not found, treating it as removed", id);
                    remaining.remove(&id);
                    outcome.vanished += 1;
                    continue;
                }
                Err(err) => {
                    warn!("Failed to fetch installation {}: {}", id, err);
                    continue;
                }
            };
            if current.state == state::DELETED {
                debug!("Installation {} deleted", id);
                remaining.remove(&id);
                outcome.deleted += 1;
            } else if state::is_deleting(&current.state) {
                trace!("Installation {} is {}", id, current.state);
            } else {
                match provisioner.delete_installation(&id).await {
                    Ok(()) => debug!("Requested deletion of installation {}", id),
                    Err(err) => warn!("Failed to delete installation {}: {}", id, err),
                }
            }
        }
        if !remaining.is_empty() {
            waiter.pause().await;
        }
    }
    outcome.passes = waiter.passes();
    info!(
        "Deleted {} installations ({} already gone) in {} passes",
        outcome.deleted, outcome.vanished, outcome.passes
    );
    Ok(outcome)
}
