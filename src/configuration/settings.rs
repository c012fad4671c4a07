use crate::app::batch::InstallationTemplate;
use crate::app::wait::WaitPolicy;
use crate::app::{RunPlan, RunPlanBuilder};
use crate::configuration::command_line::Opt;
use crate::configuration::constants::defaults;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: String,
    pub batch_size: usize,
    pub total: usize,
    pub runs: usize,
    pub database: String,
    pub filestore: String,
    pub size: String,
    pub affinity: String,
    pub owner: String,
    pub dns_domain: String,
    #[serde(deserialize_with = "crate::configuration::deserialize::duration::deserialize")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "crate::configuration::deserialize::duration::deserialize")]
    pub cleanup_interval: Duration,
    #[serde(deserialize_with = "crate::configuration::deserialize::duration::deserialize")]
    pub group_interval: Duration,
    #[serde(deserialize_with = "crate::configuration::deserialize::optional_duration::deserialize")]
    pub timeout: Option<Duration>,
    #[serde(deserialize_with = "crate::configuration::deserialize::duration::deserialize")]
    pub request_timeout: Duration,
    pub report_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: defaults::SERVER.to_owned(),
            batch_size: defaults::BATCH_SIZE,
            total: defaults::TOTAL,
            runs: defaults::RUNS,
            database: defaults::DATABASE.to_owned(),
            filestore: defaults::FILESTORE.to_owned(),
            size: defaults::SIZE.to_owned(),
            affinity: defaults::AFFINITY.to_owned(),
            owner: defaults::OWNER.to_owned(),
            dns_domain: defaults::DNS_DOMAIN.to_owned(),
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            cleanup_interval: Duration::from_secs(0),
            group_interval: Duration::from_secs(0),
            timeout: None,
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            report_file: None,
        }
    }
}

impl Settings {
    /// Defaults, overlaid by the optional settings file, then `CLOUDSOAK_*`
    /// environment variables, then explicit command line flags.
    pub fn load(options: &Opt) -> Result<Self> {
        let mut settings = Self::from_sources(options.config.as_deref())?;
        settings.apply(options);
        Ok(settings)
    }

    fn from_sources(file: Option<&Path>) -> Result<Self> {
        let mut config = Config::new();
        if let Some(file) = file {
            config.merge(File::from(file))?;
        }
        config.merge(Environment::with_prefix(defaults::ENV_PREFIX))?;
        Ok(config.try_into()?)
    }

    fn apply(&mut self, options: &Opt) {
        fn overlay<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        overlay(&mut self.server, &options.server);
        overlay(&mut self.batch_size, &options.batch_size);
        overlay(&mut self.total, &options.total);
        overlay(&mut self.runs, &options.runs);
        overlay(&mut self.database, &options.database);
        overlay(&mut self.filestore, &options.filestore);
        overlay(&mut self.size, &options.size);
        overlay(&mut self.affinity, &options.affinity);
        overlay(&mut self.owner, &options.owner);
        overlay(&mut self.dns_domain, &options.dns_domain);
        overlay(&mut self.poll_interval, &options.poll_interval);
        overlay(&mut self.cleanup_interval, &options.cleanup_interval);
        overlay(&mut self.group_interval, &options.group_interval);
        overlay(&mut self.request_timeout, &options.request_timeout);
        if options.timeout.is_some() {
            self.timeout = options.timeout;
        }
        if options.report_file.is_some() {
            self.report_file = options.report_file.clone();
        }
    }

    pub fn plan(&self) -> Result<RunPlan> {
        RunPlanBuilder::default()
            .total(self.total)
            .batch_size(self.batch_size)
            .runs(self.runs)
            .template(InstallationTemplate {
                owner: self.owner.clone(),
                database: self.database.clone(),
                filestore: self.filestore.clone(),
                size: self.size.clone(),
                affinity: self.affinity.clone(),
                dns_domain: self.dns_domain.clone(),
            })
            .poll(WaitPolicy::new(self.poll_interval, self.timeout))
            .cleanup(WaitPolicy::new(self.cleanup_interval, self.timeout))
            .group_wait(WaitPolicy::new(self.group_interval, self.timeout))
            .submit_retry(WaitPolicy::new(Duration::from_secs(0), self.timeout))
            .build()
            .map_err(Error::Config)
    }
}
