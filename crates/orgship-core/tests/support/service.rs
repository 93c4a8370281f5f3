use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use orgship_core::deploy::{DeployOptions, DeployService, DeployStatus};
use orgship_core::{Error, Result};

/// Deploy service replaying scripted statuses.
///
/// Once the script runs out the last status repeats.
pub struct ScriptedService {
    async_id: String,
    script: Mutex<VecDeque<DeployStatus>>,
    last: Mutex<Option<DeployStatus>>,
    fail_submit: bool,
    pub submitted: Mutex<Vec<(Vec<u8>, DeployOptions)>>,
    pub checks: Mutex<Vec<bool>>,
}

impl ScriptedService {
    pub fn new(statuses: impl IntoIterator<Item = DeployStatus>) -> Self {
        Self {
            async_id: "0Af000000000001".to_string(),
            script: Mutex::new(statuses.into_iter().collect()),
            last: Mutex::new(None),
            fail_submit: false,
            submitted: Mutex::new(Vec::new()),
            checks: Mutex::new(Vec::new()),
        }
    }

    /// A service whose deployments never finish.
    pub fn never_done() -> Self {
        Self::new([in_progress()])
    }

    pub fn failing_submit() -> Self {
        let mut service = Self::new([]);
        service.fail_submit = true;
        service
    }

    pub fn async_id(&self) -> &str {
        &self.async_id
    }

    /// `include_details` flag of every status query, in order.
    pub fn detail_flags(&self) -> Vec<bool> {
        self.checks.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<DeployOptions> {
        self.submitted.lock().unwrap().last().map(|(_, o)| o.clone())
    }

    pub fn last_archive(&self) -> Option<Vec<u8>> {
        self.submitted.lock().unwrap().last().map(|(a, _)| a.clone())
    }
}

#[async_trait]
impl DeployService for ScriptedService {
    async fn submit(&self, archive: &[u8], options: &DeployOptions) -> Result<String> {
        if self.fail_submit {
            return Err(Error::service("INVALID_SESSION_ID", "Session expired or invalid"));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((archive.to_vec(), options.clone()));
        Ok(self.async_id.clone())
    }

    async fn check_status(&self, async_id: &str, include_details: bool) -> Result<DeployStatus> {
        self.checks.lock().unwrap().push(include_details);
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(status) = next {
            *last = Some(status);
        }
        let mut status = last.clone().unwrap_or_else(in_progress);
        status.id = async_id.to_string();
        if !include_details {
            status.details = None;
        }
        Ok(status)
    }
}

pub fn in_progress() -> DeployStatus {
    DeployStatus {
        status: Some("InProgress".to_string()),
        ..DeployStatus::default()
    }
}

pub fn done(success: bool) -> DeployStatus {
    DeployStatus {
        done: true,
        success,
        status: Some(if success { "Succeeded" } else { "Failed" }.to_string()),
        details: Some(Default::default()),
        ..DeployStatus::default()
    }
}
