//! Fast Downward process adapter.
//!
//! Writes the task to a work directory, runs the planner there (a local
//! `fast-downward.py` checkout or the `aibasel/downward` Docker image), and
//! returns the newest plan artifact it produced.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::PlannerError;
use crate::plan::{PLAN_FILE_PREFIX, latest_plan_artifact};
use crate::traits::{PlannerBackend, PlanningTask};

const DOMAIN_FILE: &str = "domain.pddl";
const PROBLEM_FILE: &str = "problem.pddl";
const LOG_FILE: &str = "planner.log";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How the planner process is started.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Launcher {
    /// `<python> <script> ...` run inside the work directory.
    Local { python: String, script: PathBuf },
    /// `docker run --rm --name <container> -v <work_dir>:/data -w /data <image> ...`.
    /// The container is killed by name when the run times out.
    Docker {
        image: String,
        #[serde(default = "default_docker")]
        docker: String,
    },
}

fn default_docker() -> String {
    "docker".to_string()
}

impl Default for Launcher {
    fn default() -> Self {
        Launcher::Local {
            python: "python".to_string(),
            script: PathBuf::from("fast-downward.py"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FastDownwardConfig {
    pub launcher: Launcher,
    /// Planner configuration alias, e.g. `seq-sat-lama-2011`.
    pub alias: String,
    pub work_dir: PathBuf,
    pub timeout_secs: u64,
    /// Plan files are `<prefix>` or `<prefix>.<n>` for anytime aliases.
    pub plan_prefix: String,
}

impl Default for FastDownwardConfig {
    fn default() -> Self {
        Self {
            launcher: Launcher::default(),
            alias: "seq-sat-lama-2011".to_string(),
            work_dir: PathBuf::from("."),
            timeout_secs: 300,
            plan_prefix: PLAN_FILE_PREFIX.to_string(),
        }
    }
}

/// What a Fast Downward exit code says about the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    PlanFound,
    Unsolvable,
    OutOfTime,
    Failed,
}

/// Maps driver exit codes: 0-3 found a plan (possibly hitting a limit
/// afterwards), 10-12 proved or gave up on unsolvability, 21/23/24 ran out of
/// time, everything else is a failure.
pub fn classify_exit(code: Option<i32>) -> ExitOutcome {
    match code {
        Some(0..=3) => ExitOutcome::PlanFound,
        Some(10..=12) => ExitOutcome::Unsolvable,
        Some(21 | 23 | 24) => ExitOutcome::OutOfTime,
        _ => ExitOutcome::Failed,
    }
}

#[derive(Debug, Clone)]
pub struct FastDownward {
    config: FastDownwardConfig,
    work_dir: PathBuf,
}

impl FastDownward {
    /// Resolves the work directory against the current directory.
    pub fn new(config: FastDownwardConfig) -> Result<Self, PlannerError> {
        let work_dir = absolute(&config.work_dir)?;
        Ok(Self { config, work_dir })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn command(&self, container: &str) -> Result<Command, PlannerError> {
        let planner_args = [
            "--alias",
            self.config.alias.as_str(),
            "--plan-file",
            self.config.plan_prefix.as_str(),
            DOMAIN_FILE,
            PROBLEM_FILE,
        ];
        let command = match &self.config.launcher {
            Launcher::Local { python, script } => {
                let mut command = Command::new(python);
                command
                    .arg(absolute(script)?)
                    .args(planner_args)
                    .current_dir(&self.work_dir);
                command
            }
            Launcher::Docker { image, docker } => {
                let mut command = Command::new(docker);
                command
                    .arg("run")
                    .arg("--rm")
                    .arg("--name")
                    .arg(container)
                    .arg("-v")
                    .arg(format!("{}:/data", self.work_dir.display()))
                    .arg("-w")
                    .arg("/data")
                    .arg(image)
                    .args(planner_args);
                command
            }
        };
        Ok(command)
    }

    fn write_task(&self, task: &PlanningTask) -> Result<(), PlannerError> {
        fs::create_dir_all(&self.work_dir)?;
        fs::write(self.work_dir.join(DOMAIN_FILE), &task.domain)?;
        fs::write(self.work_dir.join(PROBLEM_FILE), &task.problem)?;
        Ok(())
    }

    /// Removes plan files left over from earlier runs.
    fn clear_stale_plans(&self) -> Result<(), PlannerError> {
        for entry in fs::read_dir(&self.work_dir)? {
            let entry = entry?;
            let stale = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&self.config.plan_prefix));
            if stale && entry.file_type()?.is_file() {
                debug!(path = %entry.path().display(), "removing stale plan");
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn run(&self, mut command: Command, container: &str) -> Result<ExitStatus, PlannerError> {
        let log = File::create(self.work_dir.join(LOG_FILE))?;
        command
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log));

        let mut child = command.spawn().map_err(|err| {
            PlannerError::InvocationFailed(format!("could not start planner: {err}"))
        })?;
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= self.timeout() {
                warn!(timeout = ?self.timeout(), "planner timed out, killing it");
                // The docker client exits on its own once the container is gone.
                self.kill_container(container);
                if let Err(err) = child.kill() {
                    warn!(%err, "could not kill planner process");
                }
                if let Err(err) = child.wait() {
                    warn!(%err, "could not reap planner process");
                }
                return Err(PlannerError::Timeout(self.timeout()));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Stops a Docker run by container name. Killing the `docker run` client
    /// alone leaves the container writing into the work directory.
    fn kill_container(&self, container: &str) {
        let Launcher::Docker { docker, .. } = &self.config.launcher else {
            return;
        };
        match Command::new(docker)
            .arg("kill")
            .arg(container)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) if output.status.success() => {
                debug!(container, "killed planner container");
            }
            Ok(output) => warn!(
                container,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "docker kill failed"
            ),
            Err(err) => warn!(container, %err, "could not run docker kill"),
        }
    }
}

impl PlannerBackend for FastDownward {
    fn solve(&self, task: &PlanningTask) -> Result<String, PlannerError> {
        self.write_task(task)?;
        self.clear_stale_plans()?;

        let container = container_name();
        let command = self.command(&container)?;
        info!(
            alias = %self.config.alias,
            work_dir = %self.work_dir.display(),
            "running fast downward"
        );
        let status = self.run(command, &container)?;

        match classify_exit(status.code()) {
            ExitOutcome::PlanFound => {}
            ExitOutcome::Unsolvable => {
                return Err(PlannerError::NoPlanFound(format!(
                    "fast downward reported no solution ({status})"
                )));
            }
            ExitOutcome::OutOfTime => return Err(PlannerError::Timeout(self.timeout())),
            ExitOutcome::Failed => {
                return Err(PlannerError::InvocationFailed(format!(
                    "fast downward exited with {status}, see {}",
                    self.work_dir.join(LOG_FILE).display()
                )));
            }
        }

        let path = latest_plan_artifact(&self.work_dir, &self.config.plan_prefix)?;
        info!(plan = %path.display(), "using plan");
        Ok(fs::read_to_string(path)?)
    }
}

static RUNS: AtomicU64 = AtomicU64::new(0);

/// Unique per run: process id, wall-clock stamp and a run counter.
fn container_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let run = RUNS.fetch_add(1, Ordering::Relaxed);
    format!("trip-planner-{}-{nanos}-{run}", std::process::id())
}

fn absolute(path: &Path) -> Result<PathBuf, PlannerError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
