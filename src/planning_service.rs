//! HTTP adapter for a remote planning service.
//!
//! Posts the task as JSON `{"domain": ..., "problem": ...}` to `<base_url>/solve`
//! and reads the plan from `result.plan[].name`.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::PlannerError;
use crate::traits::{PlannerBackend, PlanningTask};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlanningServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PlanningServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanningServiceClient {
    config: PlanningServiceConfig,
    client: reqwest::blocking::Client,
}

impl PlanningServiceClient {
    pub fn new(config: PlanningServiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn classify(&self, err: reqwest::Error) -> PlannerError {
        if err.is_timeout() {
            PlannerError::Timeout(std::time::Duration::from_secs(self.config.timeout_secs))
        } else {
            PlannerError::InvocationFailed(err.to_string())
        }
    }
}

impl PlannerBackend for PlanningServiceClient {
    fn solve(&self, task: &PlanningTask) -> Result<String, PlannerError> {
        let url = format!("{}/solve", self.config.base_url.trim_end_matches('/'));
        info!(%url, "submitting task to planning service");

        let body = self
            .client
            .post(&url)
            .json(task)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<SolveResponse>())
            .map_err(|err| self.classify(err))?;

        match (body.status.as_str(), body.result) {
            ("ok", SolveResult::Solved { plan }) if !plan.is_empty() => {
                debug!(steps = plan.len(), "planning service returned a plan");
                Ok(plan
                    .into_iter()
                    .map(|step| step.name)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            ("ok", _) => Err(PlannerError::NoPlanFound(
                "service returned an empty plan".to_string(),
            )),
            (_, SolveResult::Message(message)) => Err(PlannerError::NoPlanFound(message)),
            (status, _) => Err(PlannerError::NoPlanFound(format!("service status {status:?}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SolveResponse {
    status: String,
    result: SolveResult,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SolveResult {
    Solved {
        #[serde(default)]
        plan: Vec<PlanStep>,
    },
    Message(String),
}

#[derive(Debug, Deserialize)]
struct PlanStep {
    name: String,
}
