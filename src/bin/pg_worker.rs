//! Runs one embedded `PostgreSQL` lifecycle step as an unprivileged user.
//!
//! ```text
//! pg_worker <setup|start|stop> <payload-path>
//! ```
//!
//! The integration suite runs as root in CI containers, where `initdb`
//! refuses to run. `pg-embed-setup-unpriv` then delegates each step to this
//! binary with a JSON [`WorkerPayload`] describing the cluster settings and
//! the environment the step needs. The worker switches to `nobody` before
//! touching the cluster. A started cluster outlives the worker.

#[cfg(unix)]
use camino::{Utf8Path, Utf8PathBuf};
#[cfg(unix)]
use nix::unistd::{Uid, User, initgroups, setgid, setuid};
#[cfg(unix)]
use pg_embedded_setup_unpriv::ambient_dir_and_path;
#[cfg(unix)]
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
#[cfg(unix)]
use postgresql_embedded::{PostgreSQL, Status};
#[cfg(unix)]
use std::{env, ffi::CString, io::Read, str::FromStr};
#[cfg(unix)]
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Account the cluster runs under when the worker starts as root.
#[cfg(unix)]
const UNPRIVILEGED_USER: &str = "nobody";

#[cfg(unix)]
#[derive(Debug, Error)]
enum WorkerError {
    #[error("usage: pg_worker <setup|start|stop> <payload-path> ({0})")]
    Usage(String),
    #[error("failed to read payload {path}: {source}")]
    ReadPayload {
        path: Utf8PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to parse payload: {0}")]
    ParsePayload(#[from] serde_json::Error),
    #[error("invalid cluster settings: {0}")]
    Settings(String),
    #[error("failed to switch to user '{UNPRIVILEGED_USER}': {0}")]
    Demote(String),
    #[error("failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("{step} failed: {message}")]
    Cluster {
        step: &'static str,
        message: String,
    },
}

#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Setup,
    Start,
    Stop,
}

#[cfg(unix)]
impl Step {
    const fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

#[cfg(unix)]
impl FromStr for Step {
    type Err = WorkerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(WorkerError::Usage(format!("unknown step '{other}'"))),
        }
    }
}

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    let (step, payload_path) = parse_args(env::args().skip(1))?;
    let payload = read_payload(&payload_path)?;
    demote_if_root()?;
    apply_environment(&payload.environment);
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| WorkerError::Settings(err.to_string()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::Runtime)?;
    runtime.block_on(run_step(step, PostgreSQL::new(settings)))?;
    Ok(())
}

#[cfg(unix)]
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(Step, Utf8PathBuf), WorkerError> {
    let step = args
        .next()
        .ok_or_else(|| WorkerError::Usage("missing step".to_owned()))?
        .parse::<Step>()?;
    let path = args
        .next()
        .map(Utf8PathBuf::from)
        .ok_or_else(|| WorkerError::Usage("missing payload path".to_owned()))?;
    if let Some(extra) = args.next() {
        return Err(WorkerError::Usage(format!("unexpected argument '{extra}'")));
    }
    Ok((step, path))
}

#[cfg(unix)]
fn read_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
    let read = || -> Result<Vec<u8>, BoxError> {
        let (dir, relative) = ambient_dir_and_path(path)?;
        let mut bytes = Vec::new();
        dir.open(relative.as_std_path())?.read_to_end(&mut bytes)?;
        Ok(bytes)
    };
    let bytes = read().map_err(|source| WorkerError::ReadPayload {
        path: path.to_owned(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(unix)]
fn demote_if_root() -> Result<(), WorkerError> {
    if !Uid::effective().is_root() {
        return Ok(());
    }
    let demote = |err: nix::Error| WorkerError::Demote(err.to_string());
    let user = User::from_name(UNPRIVILEGED_USER)
        .map_err(demote)?
        .ok_or_else(|| WorkerError::Demote("no such user".to_owned()))?;
    let name = CString::new(user.name.clone()).map_err(|err| WorkerError::Demote(err.to_string()))?;
    initgroups(&name, user.gid).map_err(demote)?;
    setgid(user.gid).map_err(demote)?;
    setuid(user.uid).map_err(demote)?;

    // SAFETY: single-threaded; the runtime has not been built yet.
    unsafe {
        env::set_var("HOME", &user.dir);
        env::set_var("USER", &user.name);
        env::set_var("LOGNAME", &user.name);
    }
    Ok(())
}

#[cfg(unix)]
fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
    for (key, value) in environment {
        // SAFETY: single-threaded; the runtime has not been built yet.
        unsafe {
            match value {
                Some(secret) => env::set_var(key, secret.expose()),
                None => env::remove_var(key),
            }
        }
    }
}

#[cfg(unix)]
async fn run_step(step: Step, mut postgres: PostgreSQL) -> Result<(), WorkerError> {
    let failed = |err: postgresql_embedded::Error| WorkerError::Cluster {
        step: step.name(),
        message: err.to_string(),
    };
    match step {
        Step::Setup => {
            postgres.setup().await.map_err(failed)?;
            start_unless_running(&mut postgres).await.map_err(failed)
        }
        Step::Start => {
            start_unless_running(&mut postgres).await.map_err(failed)?;
            // Dropping the handle would stop the server.
            std::mem::forget(postgres);
            Ok(())
        }
        Step::Stop => postgres.stop().await.map_err(failed),
    }
}

#[cfg(unix)]
async fn start_unless_running(postgres: &mut PostgreSQL) -> postgresql_embedded::Result<()> {
    if matches!(postgres.status(), Status::Started) {
        return Ok(());
    }
    postgres.start().await
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker only runs on Unix".into())
}
