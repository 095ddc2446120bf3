//! Embedded `PostgreSQL` cluster shared by every test in the binary.
//!
//! Unprivileged runners start the cluster in-process. Root runners delegate
//! each lifecycle step to the `pg_worker` binary, which drops to `nobody`.

use super::helpers::test_runtime;
use crate::test_helpers::EnvVarGuard;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, Permissions, PermissionsExt};
use diesel::prelude::*;
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{
    ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests, detect_execution_privileges,
};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use rstest::fixture;
use std::ffi::{OsStr, OsString};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared cluster handle injected by the [`postgres_cluster`] fixture.
pub type PostgresCluster = &'static ManagedCluster;

static SHARED_CLUSTER: OnceLock<ManagedCluster> = OnceLock::new();
static TEMPLATE_LOCK: Mutex<()> = Mutex::new(());

fn boxed(err: impl std::error::Error + Send + Sync + 'static) -> BoxError {
    Box::new(err)
}

/// Running cluster plus what is needed to stop it again.
pub struct ManagedCluster {
    bootstrap: TestBootstrapSettings,
    env_vars: Vec<(String, Option<String>)>,
    in_process: Option<(Runtime, PostgreSQL)>,
}

impl ManagedCluster {
    fn start() -> Result<Self, BoxError> {
        let worker_env = worker_env_changes()?;
        let guard = EnvVarGuard::set_many(&worker_env);
        let mut bootstrap = bootstrap_for_tests().map_err(boxed)?;
        drop(guard);
        sync_password_from_file(&mut bootstrap.settings)?;
        let env_vars = bootstrap.environment.to_env();
        let mut cluster = Self {
            bootstrap,
            env_vars,
            in_process: None,
        };
        match cluster.bootstrap.privileges {
            ExecutionPrivileges::Root => {
                cluster.run_worker_step(WorkerOperation::Setup, cluster.bootstrap.setup_timeout)?;
                cluster.run_worker_step(WorkerOperation::Start, cluster.bootstrap.start_timeout)?;
            }
            ExecutionPrivileges::Unprivileged => cluster.start_in_process()?,
        }
        sync_port_from_pid(&mut cluster.bootstrap.settings)?;
        Ok(cluster)
    }

    /// Returns the connection URL of `database`.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.bootstrap.settings.url(database)
    }

    /// Creates the migrated template database once per test binary.
    pub fn ensure_template<F>(&self, template: &str, migrate: F) -> Result<(), BoxError>
    where
        F: FnOnce(&str) -> Result<(), BoxError>,
    {
        let _serialised = TEMPLATE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        if self.database_exists(template)? {
            return Ok(());
        }
        self.admin_sql(&format!("CREATE DATABASE {}", quote_identifier(template)))?;
        if let Err(err) = migrate(&self.database_url(template)) {
            self.drop_database(template)?;
            return Err(err);
        }
        Ok(())
    }

    /// Clones `template` into a fresh database.
    pub fn create_from_template(&self, database: &str, template: &str) -> Result<(), BoxError> {
        self.admin_sql(&format!(
            "CREATE DATABASE {} TEMPLATE {}",
            quote_identifier(database),
            quote_identifier(template),
        ))
    }

    /// Drops `database`, disconnecting any remaining sessions.
    pub fn drop_database(&self, database: &str) -> Result<(), BoxError> {
        self.admin_sql(&format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_identifier(database)
        ))
    }

    fn start_in_process(&mut self) -> Result<(), BoxError> {
        let runtime = test_runtime()?;
        let guard = EnvVarGuard::set_many(&to_os_pairs(&self.env_vars));
        let mut postgres = PostgreSQL::new(self.bootstrap.settings.clone());
        runtime.block_on(async {
            postgres.setup().await.map_err(boxed)?;
            if !matches!(postgres.status(), Status::Started) {
                postgres.start().await.map_err(boxed)?;
            }
            Ok::<(), BoxError>(())
        })?;
        drop(guard);
        self.bootstrap.settings = postgres.settings().clone();
        self.in_process = Some((runtime, postgres));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        match self.in_process.take() {
            Some((runtime, postgres)) => runtime.block_on(postgres.stop()).map_err(boxed),
            None if matches!(self.bootstrap.privileges, ExecutionPrivileges::Root) => {
                self.run_worker_step(WorkerOperation::Stop, self.bootstrap.shutdown_timeout)
            }
            None => Ok(()),
        }
    }

    fn run_worker_step(&self, operation: WorkerOperation, timeout: Duration) -> Result<(), BoxError> {
        let worker = self.bootstrap.worker_binary.as_ref().ok_or_else(|| {
            boxed(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "PG_EMBEDDED_WORKER is not set",
            ))
        })?;
        let request = WorkerRequest::new(WorkerRequestArgs {
            worker: worker.as_path(),
            settings: &self.bootstrap.settings,
            env_vars: &self.env_vars,
            operation,
            timeout,
        });
        run_worker(&request).map_err(boxed)
    }

    fn admin_sql(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = PgConnection::establish(&self.database_url("postgres")).map_err(boxed)?;
        diesel::sql_query(sql).execute(&mut conn).map_err(boxed)?;
        Ok(())
    }

    fn database_exists(&self, database: &str) -> Result<bool, BoxError> {
        #[derive(QueryableByName)]
        struct Exists {
            #[diesel(sql_type = diesel::sql_types::Bool)]
            exists: bool,
        }

        let mut conn = PgConnection::establish(&self.database_url("postgres")).map_err(boxed)?;
        let row = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS exists",
        )
        .bind::<diesel::sql_types::Text, _>(database)
        .get_result::<Exists>(&mut conn)
        .map_err(boxed)?;
        Ok(row.exists)
    }
}

impl Drop for ManagedCluster {
    fn drop(&mut self) {
        drop(self.stop());
    }
}

/// Starts the shared cluster on first use.
#[fixture]
pub fn postgres_cluster() -> PostgresCluster {
    SHARED_CLUSTER.get_or_init(|| match ManagedCluster::start() {
        Ok(cluster) => cluster,
        Err(err) => panic!("SKIP-TEST-CLUSTER: failed to start PostgreSQL: {err}"),
    })
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_os_pairs(pairs: &[(String, Option<String>)]) -> Vec<(OsString, Option<OsString>)> {
    pairs
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

fn worker_env_changes() -> Result<Vec<(OsString, Option<OsString>)>, BoxError> {
    let mut changes = Vec::new();
    if std::env::var_os("PG_PORT").is_none() {
        changes.push((OsString::from("PG_PORT"), Some(free_port()?.into())));
    }
    if matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        && std::env::var_os("PG_EMBEDDED_WORKER").is_none()
    {
        let worker = locate_worker().ok_or_else(|| {
            boxed(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "pg_worker binary not found; set PG_EMBEDDED_WORKER",
            ))
        })?;
        changes.push((
            OsString::from("PG_EMBEDDED_WORKER"),
            Some(stage_worker(&worker)?.into_os_string()),
        ));
    }
    Ok(changes)
}

fn free_port() -> Result<String, BoxError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(boxed)?;
    let port = listener.local_addr().map_err(boxed)?.port();
    Ok(port.to_string())
}

fn locate_worker() -> Option<PathBuf> {
    let built = option_env!("CARGO_BIN_EXE_pg_worker").map(PathBuf::from);
    let beside_tests = std::env::current_exe()
        .ok()
        .and_then(|exe| Some(exe.parent()?.parent()?.join("pg_worker")));
    [built, beside_tests]
        .into_iter()
        .flatten()
        .find(|path| path.is_file())
}

/// Copies the worker somewhere `nobody` can execute it; build directories
/// under `/root` are not traversable once privileges are dropped.
fn stage_worker(worker: &Path) -> Result<PathBuf, BoxError> {
    static STAGED: OnceLock<PathBuf> = OnceLock::new();
    if let Some(staged) = STAGED.get() {
        return Ok(staged.clone());
    }
    let staged = std::env::temp_dir().join(format!("atelier_pg_worker_{}", std::process::id()));
    let (source_dir, source_name) = open_parent_dir(worker)?;
    let (target_dir, target_name) = open_parent_dir(&staged)?;
    if target_dir.exists(target_name) {
        target_dir.remove_file(target_name).map_err(boxed)?;
    }
    source_dir
        .copy(source_name, &target_dir, target_name)
        .map_err(boxed)?;
    target_dir
        .set_permissions(target_name, Permissions::from_mode(0o755))
        .map_err(boxed)?;
    Ok(STAGED.get_or_init(|| staged).clone())
}

fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let (dir, name) = open_parent_dir(&settings.password_file)?;
    match dir.read_to_string(name) {
        Ok(contents) if !contents.trim_end().is_empty() => {
            contents.trim_end().clone_into(&mut settings.password);
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(boxed(err)),
    }
}

/// The postmaster records its port on the fourth line of `postmaster.pid`.
fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir = Dir::open_ambient_dir(&settings.data_dir, ambient_authority()).map_err(boxed)?;
    let contents = match data_dir.read_to_string("postmaster.pid") {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(boxed(err)),
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}

fn open_parent_dir(path: &Path) -> Result<(Dir, &OsStr), BoxError> {
    let name = path
        .file_name()
        .ok_or_else(|| boxed(std::io::Error::other("path has no file name")))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(boxed)?;
    Ok((dir, name))
}
