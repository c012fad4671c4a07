use crate::provisioner::Installation;
use crate::time::now_millis;
use serde_derive::Serialize;

/// Outcome of one installation's creation and convergence, recorded once per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Report {
    Completed {
        installation: Installation,
        created_at: i64,
        completed_at: i64,
    },
    /// `installation` is the last copy observed before the failure.
    Failed {
        installation: Installation,
        observed_at: i64,
        message: String,
    },
}

impl Report {
    pub fn completed(installation: Installation) -> Self {
        Report::Completed {
            created_at: installation.create_at,
            completed_at: now_millis(),
            installation,
        }
    }

    pub fn failed<S: Into<String>>(installation: Installation, message: S) -> Self {
        Report::Failed {
            installation,
            observed_at: now_millis(),
            message: message.into(),
        }
    }

    pub fn installation(&self) -> &Installation {
        match self {
            Report::Completed { installation, .. } | Report::Failed { installation, .. } => {
                installation
            }
        }
    }

    pub fn duration_millis(&self) -> Option<i64> {
        match self {
            Report::Completed {
                created_at,
                completed_at,
                ..
            } => Some(completed_at - created_at),
            Report::Failed { .. } => None,
        }
    }
}
