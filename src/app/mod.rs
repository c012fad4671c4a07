pub(crate) mod aggregate;
pub(crate) mod batch;
pub(crate) mod cleanup;
pub(crate) mod convergence;
pub(crate) mod report;
pub(crate) mod wait;

use crate::app::aggregate::{aggregate, Results};
use crate::app::batch::InstallationTemplate;
use crate::app::cleanup::Sweep;
use crate::app::report::Report;
use crate::app::wait::{Shutdown, WaitPolicy};
use crate::error::{Error, Result};
use crate::provisioner::{CreateGroupRequest, Group, Installation, Provisioner};
use crate::reporter;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RunPlan {
    pub total: usize,
    pub batch_size: usize,
    #[builder(default = "1")]
    pub runs: usize,
    pub template: InstallationTemplate,
    #[builder(default)]
    pub poll: WaitPolicy,
    #[builder(default)]
    pub cleanup: WaitPolicy,
    #[builder(default)]
    pub group_wait: WaitPolicy,
    #[builder(default)]
    pub submit_retry: WaitPolicy,
}

impl RunPlanBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        match (self.total, self.batch_size, self.runs) {
            (Some(0), _, _) => Err("total must be greater than zero".to_owned()),
            (_, Some(0), _) => Err("batch size must be greater than zero".to_owned()),
            (_, _, Some(0)) => Err("runs must be greater than zero".to_owned()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub results: Results,
    pub runs: Vec<Results>,
    pub sweeps: Vec<Sweep>,
    pub reports: Vec<Report>,
}

pub struct App<P: Provisioner + 'static> {
    provisioner: Arc<P>,
    plan: RunPlan,
    shutdown: Shutdown,
}

impl<P: Provisioner + 'static> App<P> {
    pub fn new(provisioner: Arc<P>, plan: RunPlan, shutdown: Shutdown) -> Self {
        App {
            provisioner,
            plan,
            shutdown,
        }
    }

    /// Creates the group, performs every run inside it and deletes it again. The
    /// group is deleted even when a run is interrupted.
    pub async fn run(&self) -> Result<Summary> {
        info!(
            "Starting {} run(s) of {} installations in batches of {}",
            self.plan.runs, self.plan.total, self.plan.batch_size
        );
        let group = self.create_group().await?;
        let outcome = self.run_in_group(&group).await;
        let teardown = self.provisioner.delete_group(&group.id).await;
        match (outcome, teardown) {
            (Ok(summary), Ok(())) => {
                info!("Deleted group {}", group.id);
                Ok(summary)
            }
            (Ok(_), Err(err)) => {
                error!("Failed to delete group {}: {}", group.id, err);
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown_err)) => {
                error!("Failed to delete group {}: {}", group.id, teardown_err);
                Err(err)
            }
        }
    }

    async fn create_group(&self) -> Result<Group> {
        let suffix = uuid::Uuid::new_v4().to_simple().to_string();
        let request = CreateGroupRequest {
            name: format!("cloudsoak-{}", &suffix[..8]),
            description: format!(
                "Soak test of {} installations x {} runs",
                self.plan.total, self.plan.runs
            ),
        };
        let group = self.provisioner.create_group(&request).await.map_err(|err| {
            error!("Failed to create group {}: {}", request.name, err);
            err
        })?;
        info!("Created group {} ({})", group.name, group.id);
        Ok(group)
    }

    /// Lookup errors and a missing group are both retried; only the wait policy ends
    /// the wait early.
    async fn wait_for_group(&self, id: &str) -> Result<Group> {
        let mut waiter = self
            .plan
            .group_wait
            .start(&format!("waiting for group {}", id), &self.shutdown);
        loop {
            waiter.check()?;
            match self.provisioner.get_group(id).await {
                Ok(Some(group)) => {
                    debug!("Group {} visible after {} lookups", id, waiter.passes());
                    return Ok(group);
                }
                Ok(None) => trace!("Group {} not visible yet", id),
                Err(err) => warn!("Failed to fetch group {}: {}", id, err),
            }
            waiter.pause().await;
        }
    }

    async fn run_in_group(&self, group: &Group) -> Result<Summary> {
        let group = self.wait_for_group(&group.id).await?;
        let mut reports = Vec::with_capacity(self.plan.total * self.plan.runs);
        let mut runs = Vec::with_capacity(self.plan.runs);
        let mut sweeps = Vec::with_capacity(self.plan.runs);
        for run in 1..=self.plan.runs {
            info!("Run {}/{}", run, self.plan.runs);
            let label = format!("Run {}", run);
            let submitted = batch::install_batches(
                self.provisioner.clone(),
                &self.plan.template,
                &group,
                self.plan.total,
                self.plan.batch_size,
                &self.plan.submit_retry,
                &self.shutdown,
            )
            .await;
            let installations = submitted.installations;
            if let Some(err) = submitted.failure {
                return Err(self.abandon(installations, err).await);
            }
            let run_reports = match convergence::await_convergence(
                &*self.provisioner,
                installations.clone(),
                &self.plan.poll,
                &self.shutdown,
            )
            .await
            {
                Ok(run_reports) => run_reports,
                Err(err) => return Err(self.abandon(installations, err).await),
            };
            let swept = match cleanup::sweep(
                &*self.provisioner,
                installations.clone(),
                &self.plan.cleanup,
                &self.shutdown,
            )
            .await
            {
                Ok(swept) => swept,
                Err(err) => return Err(self.abandon(installations, err).await),
            };
            let results = aggregate(&run_reports);
            reporter::log_results(&label, &results);
            reporter::log_sweep(&label, &swept);
            runs.push(results);
            sweeps.push(swept);
            reports.extend(run_reports);
        }
        Ok(Summary {
            results: aggregate(&reports),
            runs,
            sweeps,
            reports,
        })
    }

    /// Deletes what an interrupted run created, then hands back the run's error.
    /// The sweep ignores the shutdown flag; only the cleanup deadline ends it.
    async fn abandon(&self, installations: HashMap<String, Installation>, err: Error) -> Error {
        if installations.is_empty() {
            return err;
        }
        warn!(
            "Run failed ({}), deleting the {} installations it created",
            err,
            installations.len()
        );
        let detached = Shutdown::new();
        match cleanup::sweep(
            &*self.provisioner,
            installations,
            &self.plan.cleanup,
            &detached,
        )
        .await
        {
            Ok(swept) => reporter::log_sweep("Teardown", &swept),
            Err(sweep_err) => error!("Failed to delete leftover installations: {}", sweep_err),
        }
        err
    }
}
