use crate::error::{Error, Result};
use crate::provisioner::{
    state, CreateGroupRequest, CreateInstallationRequest, Group, Installation, Provisioner,
};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

/// One scripted answer to a `get_installation` call.
#[derive(Debug, Clone)]
pub enum Step {
    State(&'static str),
    Missing,
    Fail,
}

struct Entry {
    installation: Installation,
    script: VecDeque<Step>,
    gets: usize,
    deletes: usize,
}

#[derive(Default)]
struct Inner {
    next_id: usize,
    groups: HashMap<String, Group>,
    group_gets: usize,
    group_visible_after: usize,
    group_lookup_failures: usize,
    group_create_fails: bool,
    group_delete_fails: bool,
    group_deleted: bool,
    create_calls: usize,
    create_failures: usize,
    create_limit: Option<usize>,
    create_delay: Duration,
    creates_in_flight: usize,
    peak_creates: usize,
    created: Vec<String>,
    stable_after: usize,
    created_at: Option<i64>,
    installations: HashMap<String, Entry>,
}

/// In-memory provisioner. Installations become stable on their `stable_after`-th
/// lookup and walk through the deletion states one lookup at a time once deleted,
/// unless a script is queued for them.
pub struct FakeProvisioner {
    inner: Mutex<Inner>,
}

impl FakeProvisioner {
    pub fn new(stable_after: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                stable_after,
                ..Inner::default()
            }),
        }
    }

    pub async fn fail_next_creates(&self, count: usize) {
        self.inner.lock().await.create_failures = count;
    }

    /// Rejects every create once `count` installations exist.
    pub async fn reject_creates_after(&self, count: usize) {
        self.inner.lock().await.create_limit = Some(count);
    }

    /// Holds each create call for `delay` without blocking other callers.
    pub async fn delay_creates(&self, delay: Duration) {
        self.inner.lock().await.create_delay = delay;
    }

    pub async fn group_visible_after(&self, gets: usize) {
        self.inner.lock().await.group_visible_after = gets;
    }

    pub async fn fail_group_create(&self) {
        self.inner.lock().await.group_create_fails = true;
    }

    pub async fn fail_next_group_lookups(&self, count: usize) {
        self.inner.lock().await.group_lookup_failures = count;
    }

    pub async fn fail_group_delete(&self) {
        self.inner.lock().await.group_delete_fails = true;
    }

    pub async fn stamp_created_at(&self, millis: i64) {
        self.inner.lock().await.created_at = Some(millis);
    }

    /// Registers an installation directly, as if created earlier.
    pub async fn insert(&self, id: &str, current: &str) -> Installation {
        let mut inner = self.inner.lock().await;
        let installation = Installation {
            id: id.to_owned(),
            owner_id: "cloudsoak".to_owned(),
            group_id: None,
            dns: format!("{}.example.com", id),
            database: String::new(),
            filestore: String::new(),
            size: String::new(),
            affinity: String::new(),
            state: current.to_owned(),
            create_at: crate::time::now_millis(),
        };
        inner.installations.insert(
            id.to_owned(),
            Entry {
                installation: installation.clone(),
                script: VecDeque::new(),
                gets: 0,
                deletes: 0,
            },
        );
        installation
    }

    pub async fn script(&self, id: &str, steps: Vec<Step>) {
        if let Some(entry) = self.inner.lock().await.installations.get_mut(id) {
            entry.script.extend(steps);
        }
    }

    pub async fn create_calls(&self) -> usize {
        self.inner.lock().await.create_calls
    }

    /// Most create calls observed in flight at the same time.
    pub async fn peak_concurrent_creates(&self) -> usize {
        self.inner.lock().await.peak_creates
    }

    /// IDs of every installation created through the trait, in creation order.
    pub async fn created_ids(&self) -> Vec<String> {
        self.inner.lock().await.created.clone()
    }

    pub async fn group_lookups(&self) -> usize {
        self.inner.lock().await.group_gets
    }

    pub async fn get_calls(&self, id: &str) -> usize {
        self.inner.lock().await.installations.get(id).map_or(0, |e| e.gets)
    }

    pub async fn delete_calls(&self, id: &str) -> usize {
        self.inner.lock().await.installations.get(id).map_or(0, |e| e.deletes)
    }

    pub async fn state_of(&self, id: &str) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.installations.get(id).map(|e| e.installation.state.clone())
    }

    pub async fn group_deleted(&self) -> bool {
        self.inner.lock().await.group_deleted
    }
}

fn advance(entry: &mut Entry, stable_after: usize) {
    let next = match entry.installation.state.as_str() {
        state::CREATION_REQUESTED | state::CREATION_IN_PROGRESS if entry.gets >= stable_after => {
            state::STABLE
        }
        state::CREATION_REQUESTED => state::CREATION_IN_PROGRESS,
        state::DELETION_REQUESTED => state::DELETION_IN_PROGRESS,
        state::DELETION_IN_PROGRESS | state::DELETION_FINAL_CLEANUP => state::DELETED,
        _ => return,
    };
    entry.installation.state = next.to_owned();
}

#[async_trait::async_trait]
impl Provisioner for FakeProvisioner {
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<Group> {
        let mut inner = self.inner.lock().await;
        if inner.group_create_fails {
            return Err(Error::Api {
                status: 500,
                message: "group rejected".to_owned(),
            });
        }
        let group = Group {
            id: format!("group-{}", inner.groups.len() + 1),
            name: request.name.clone(),
            description: request.description.clone(),
            create_at: crate::time::now_millis(),
        };
        inner.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>> {
        let mut inner = self.inner.lock().await;
        inner.group_gets += 1;
        if inner.group_lookup_failures > 0 {
            inner.group_lookup_failures -= 1;
            return Err(Error::Connection("connection reset".to_owned()));
        }
        if inner.group_gets <= inner.group_visible_after {
            return Ok(None);
        }
        Ok(inner.groups.get(id).cloned())
    }

    async fn delete_group(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.group_delete_fails {
            return Err(Error::Api {
                status: 503,
                message: format!("group {} is busy", id),
            });
        }
        match inner.groups.remove(id) {
            Some(_) => {
                inner.group_deleted = true;
                Ok(())
            }
            None => Err(Error::Api {
                status: 404,
                message: format!("group {} not found", id),
            }),
        }
    }

    async fn create_installation(
        &self,
        request: &CreateInstallationRequest,
    ) -> Result<Installation> {
        let delay = {
            let mut inner = self.inner.lock().await;
            inner.create_calls += 1;
            inner.creates_in_flight += 1;
            inner.peak_creates = inner.peak_creates.max(inner.creates_in_flight);
            inner.create_delay
        };
        if delay > Duration::from_secs(0) {
            tokio::time::delay_for(delay).await;
        }
        let mut inner = self.inner.lock().await;
        inner.creates_in_flight -= 1;
        let existing = inner.next_id;
        let over_limit = inner.create_limit.map_or(false, |limit| existing >= limit);
        if inner.create_failures > 0 || over_limit {
            inner.create_failures = inner.create_failures.saturating_sub(1);
            return Err(Error::Api {
                status: 500,
                message: "rejected".to_owned(),
            });
        }
        inner.next_id += 1;
        let installation = Installation {
            id: format!("inst-{:04}", inner.next_id),
            owner_id: request.owner_id.clone(),
            group_id: Some(request.group_id.clone()),
            dns: request.dns.clone(),
            database: request.database.clone(),
            filestore: request.filestore.clone(),
            size: request.size.clone(),
            affinity: request.affinity.clone(),
            state: state::CREATION_REQUESTED.to_owned(),
            create_at: inner.created_at.unwrap_or_else(crate::time::now_millis),
        };
        inner.installations.insert(
            installation.id.clone(),
            Entry {
                installation: installation.clone(),
                script: VecDeque::new(),
                gets: 0,
                deletes: 0,
            },
        );
        inner.created.push(installation.id.clone());
        Ok(installation)
    }

    async fn get_installation(&self, id: &str) -> Result<Option<Installation>> {
        let mut inner = self.inner.lock().await;
        let stable_after = inner.stable_after;
        let entry = match inner.installations.get_mut(id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        entry.gets += 1;
        match entry.script.pop_front() {
            Some(Step::State(label)) => entry.installation.state = label.to_owned(),
            Some(Step::Missing) => return Ok(None),
            Some(Step::Fail) => return Err(Error::Connection("connection reset".to_owned())),
            None => advance(entry, stable_after),
        }
        Ok(Some(entry.installation.clone()))
    }

    async fn delete_installation(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match inner.installations.get_mut(id) {
            Some(entry) => {
                entry.deletes += 1;
                entry.installation.state = state::DELETION_REQUESTED.to_owned();
                Ok(())
            }
            None => Err(Error::Api {
                status: 404,
                message: format!("installation {} not found", id),
            }),
        }
    }
}
