//! Testing utilities for the cxfer workspace
//!
//! Shared fakes, fixtures, and builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use cxfer_core::{
    DestinationRegistry, RegistryError, Resource, ResourceId, ResourceType, SourceRegistry,
    TransferStatus,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::time::Instant;

pub fn entry_group(id: &str, deps: &[&str]) -> Resource {
    Resource::new(id, ResourceType::EntryGroup).with_dependencies(deps.iter().copied())
}

pub fn tag_template(id: &str, deps: &[&str]) -> Resource {
    Resource::new(id, ResourceType::TagTemplate).with_dependencies(deps.iter().copied())
}

/// Source serving a fixed batch, or failing
#[derive(Debug, Default)]
pub struct StaticSource {
    resources: Vec<Resource>,
    failure: Option<RegistryError>,
}

impl StaticSource {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            failure: None,
        }
    }

    pub fn failing(error: RegistryError) -> Self {
        Self {
            resources: Vec::new(),
            failure: Some(error),
        }
    }
}

#[async_trait]
impl SourceRegistry for StaticSource {
    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<Resource>, RegistryError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self
            .resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .cloned()
            .collect())
    }
}

/// How the scripted destination treats one resource
#[derive(Debug, Clone)]
enum Completion {
    /// Finished on the n-th status fetch (1-based)
    AfterPolls(u32),
    Never,
}

#[derive(Debug, Clone)]
struct Script {
    submits: VecDeque<Result<(), RegistryError>>,
    polls: VecDeque<Result<TransferStatus, RegistryError>>,
    completion: Completion,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            submits: VecDeque::new(),
            polls: VecDeque::new(),
            completion: Completion::AfterPolls(1),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    scripts: HashMap<ResourceId, Script>,
    submissions: Vec<(ResourceId, Instant)>,
    polls: Vec<(ResourceId, Instant)>,
    completed: Vec<ResourceId>,
}

/// Destination whose responses are scripted per resource
///
/// Unscripted resources are accepted and report finished on the first poll.
/// Every call is recorded with its (virtual) timestamp.
#[derive(Debug, Default)]
pub struct ScriptedDestination {
    state: Mutex<State>,
}

impl ScriptedDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report finished on the `polls`-th status fetch
    pub fn finish_after(self, id: &str, polls: u32) -> Self {
        self.script(id, |s| s.completion = Completion::AfterPolls(polls));
        self
    }

    /// Never report finished
    pub fn never_finish(self, id: &str) -> Self {
        self.script(id, |s| s.completion = Completion::Never);
        self
    }

    /// Reject the submission with a validation error
    pub fn reject(self, id: &str, message: &str) -> Self {
        let error = RegistryError::Validation(message.to_string());
        self.script(id, |s| s.submits.push_back(Err(error)));
        self
    }

    /// Fail the next `times` submissions with a server error
    pub fn fail_submissions(self, id: &str, times: usize, message: &str) -> Self {
        self.script(id, |s| {
            for _ in 0..times {
                s.submits
                    .push_back(Err(RegistryError::Server(message.to_string())));
            }
        });
        self
    }

    /// Answer the next status fetches with these results before normal completion logic
    pub fn queue_polls(
        self,
        id: &str,
        responses: impl IntoIterator<Item = Result<TransferStatus, RegistryError>>,
    ) -> Self {
        self.script(id, |s| s.polls.extend(responses));
        self
    }

    fn script(&self, id: &str, f: impl FnOnce(&mut Script)) {
        let mut state = self.state.lock();
        f(state.scripts.entry(ResourceId::from(id)).or_default());
    }

    /// Identifiers in submission order, including rejected attempts
    pub fn submissions(&self) -> Vec<ResourceId> {
        self.state
            .lock()
            .submissions
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether the resource was ever submitted
    pub fn was_submitted(&self, id: &str) -> bool {
        self.state
            .lock()
            .submissions
            .iter()
            .any(|(submitted, _)| submitted.as_str() == id)
    }

    /// Submission timestamp of the first attempt for `id`
    pub fn submitted_at(&self, id: &str) -> Option<Instant> {
        self.state
            .lock()
            .submissions
            .iter()
            .find(|(submitted, _)| submitted.as_str() == id)
            .map(|(_, at)| *at)
    }

    /// Timestamps of every status fetch for `id`
    pub fn poll_times(&self, id: &str) -> Vec<Instant> {
        self.state
            .lock()
            .polls
            .iter()
            .filter(|(polled, _)| polled.as_str() == id)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Whether a status fetch for `id` reported finished
    pub fn observed_complete(&self, id: &str) -> bool {
        self.state
            .lock()
            .completed
            .iter()
            .any(|done| done.as_str() == id)
    }
}

#[async_trait]
impl DestinationRegistry for ScriptedDestination {
    async fn submit_transfer(&self, resource: &Resource) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        state.submissions.push((resource.id.clone(), Instant::now()));
        state
            .scripts
            .get_mut(&resource.id)
            .and_then(|s| s.submits.pop_front())
            .unwrap_or(Ok(()))
    }

    async fn fetch_status(
        &self,
        _resource_type: ResourceType,
        id: &ResourceId,
    ) -> Result<TransferStatus, RegistryError> {
        let mut state = self.state.lock();
        state.polls.push((id.clone(), Instant::now()));
        let fetches = u32::try_from(state.polls.iter().filter(|(p, _)| p == id).count())
            .unwrap_or(u32::MAX);

        let script = state.scripts.entry(id.clone()).or_default();
        if let Some(queued) = script.polls.pop_front() {
            return queued;
        }

        let finished = match script.completion {
            Completion::AfterPolls(n) => fetches >= n,
            Completion::Never => false,
        };
        if finished {
            state.completed.push(id.clone());
            Ok(TransferStatus::COMPLETED)
        } else {
            Ok(TransferStatus::PENDING)
        }
    }
}
