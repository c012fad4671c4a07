use crate::app::wait::{Shutdown, WaitPolicy};
use crate::error::Error;
use crate::provisioner::{CreateInstallationRequest, Group, Installation, Provisioner};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Fixed attributes of every installation a run submits.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationTemplate {
    pub owner: String,
    pub database: String,
    pub filestore: String,
    pub size: String,
    pub affinity: String,
    pub dns_domain: String,
}

impl InstallationTemplate {
    /// Builds a submission with a DNS name unique to this attempt.
    pub fn request(&self, group: &Group) -> CreateInstallationRequest {
        let suffix = uuid::Uuid::new_v4().to_simple().to_string();
        CreateInstallationRequest {
            owner_id: self.owner.clone(),
            group_id: group.id.clone(),
            database: self.database.clone(),
            filestore: self.filestore.clone(),
            size: self.size.clone(),
            affinity: self.affinity.clone(),
            dns: format!("{}-{}.{}", group.name, &suffix[..8], self.dns_domain),
        }
    }
}

/// Splits `total` into batches of `batch_size`, the last one carrying the remainder.
pub fn batch_sizes(total: usize, batch_size: usize) -> Vec<usize> {
    if batch_size == 0 {
        return Vec::new();
    }
    let mut sizes = vec![batch_size; total / batch_size];
    if total % batch_size > 0 {
        sizes.push(total % batch_size);
    }
    sizes
}

/// Everything the batch workers created, plus the first error any of them hit.
/// Installations created before a failure are kept so they can be deleted.
#[derive(Debug, Default)]
pub struct Submitted {
    pub installations: HashMap<String, Installation>,
    pub failure: Option<Error>,
}

/// Submits `total` installations from one concurrent worker per batch and merges
/// what the workers send back into a map keyed by installation ID.
pub async fn install_batches<P>(
    provisioner: Arc<P>,
    template: &InstallationTemplate,
    group: &Group,
    total: usize,
    batch_size: usize,
    retry: &WaitPolicy,
    shutdown: &Shutdown,
) -> Submitted
where
    P: Provisioner + 'static,
{
    let sizes = batch_sizes(total, batch_size);
    info!(
        "Creating {} installations in {} batches of up to {}",
        total,
        sizes.len(),
        batch_size
    );
    let (tx, mut rx) = mpsc::channel(sizes.len().max(1));
    let mut workers = Vec::with_capacity(sizes.len());
    for (index, size) in sizes.iter().copied().enumerate() {
        let mut tx = tx.clone();
        let provisioner = provisioner.clone();
        let template = template.clone();
        let group = group.clone();
        let retry = *retry;
        let shutdown = shutdown.clone();
        workers.push(tokio::spawn(async move {
            let batch =
                submit_batch(&*provisioner, &template, &group, index, size, &retry, &shutdown)
                    .await;
            if tx.send(batch).await.is_err() {
                warn!("Batch {} finished after the collector went away", index);
            }
        }));
    }
    drop(tx);

    let mut submitted = Submitted {
        installations: HashMap::with_capacity(total),
        failure: None,
    };
    for _ in 0..sizes.len() {
        match rx.recv().await {
            Some((batch, error)) => {
                for installation in batch {
                    submitted
                        .installations
                        .insert(installation.id.clone(), installation);
                }
                if let Some(err) = error {
                    submitted.failure.get_or_insert(err);
                }
            }
            None => break,
        }
    }
    for joined in futures::future::join_all(workers).await {
        if let Err(err) = joined {
            error!("Batch worker aborted: {}", err);
            submitted
                .failure
                .get_or_insert(Error::Worker(err.to_string()));
        }
    }
    match &submitted.failure {
        Some(err) => warn!(
            "Submitted {} of {} installations before failing: {}",
            submitted.installations.len(),
            total,
            err
        ),
        None => info!("Submitted {} installations", submitted.installations.len()),
    }
    submitted
}

/// Creates `size` installations one after another. Rejected submissions are retried
/// and do not count toward the batch. On cancellation or deadline the installations
/// created so far are returned together with the error.
async fn submit_batch<P>(
    provisioner: &P,
    template: &InstallationTemplate,
    group: &Group,
    index: usize,
    size: usize,
    retry: &WaitPolicy,
    shutdown: &Shutdown,
) -> (Vec<Installation>, Option<Error>)
where
    P: Provisioner + ?Sized,
{
    let mut batch = Vec::with_capacity(size);
    let mut waiter = retry.start(&format!("submitting batch {}", index), shutdown);
    while batch.len() < size {
        if let Err(err) = waiter.check() {
            return (batch, Some(err));
        }
        match provisioner.create_installation(&template.request(group)).await {
            Ok(installation) => {
                debug!(
                    "Batch {}: created installation {} ({}/{})",
                    index,
                    installation.id,
                    batch.len() + 1,
                    size
                );
                batch.push(installation);
            }
            Err(err) => {
                warn!("Batch {}: installation creation rejected, retrying: {}", index, err);
                waiter.pause().await;
            }
        }
    }
    (batch, None)
}
