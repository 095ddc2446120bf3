//! Per-test databases cloned from a migrated template.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster};
use atelier::identity::domain::UserId;
use atelier::invitation::domain::{Invitation, InvitationMessage, NewInvitation};
use atelier::project::adapters::postgres::ProjectPgPool;
use atelier::project::domain::{Project, ProjectName};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use rstest::fixture;
use tokio::runtime::Runtime;

/// Schema applied to the template database.
pub const SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-03-01-000000_create_collaboration/up.sql");

/// Template database holding the migrated schema.
pub const TEMPLATE_DB: &str = "atelier_test_template";

/// Connections per test pool; enough for the racing tests to overlap.
const POOL_SIZE: u32 = 8;

/// Builds the runtime that drives the async repositories from sync tests.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| Box::new(err) as BoxError)
}

#[fixture]
pub fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
pub fn rt() -> Runtime {
    test_runtime().expect("tokio runtime")
}

/// Fresh database cloned from the template, dropped with the value.
pub struct TestDatabase {
    cluster: PostgresCluster,
    name: String,
    pool: ProjectPgPool,
}

impl TestDatabase {
    fn create(cluster: PostgresCluster) -> Result<Self, BoxError> {
        cluster.ensure_template(TEMPLATE_DB, |url| {
            let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
            conn.batch_execute(SCHEMA_SQL)
                .map_err(|err| Box::new(err) as BoxError)
        })?;
        let name = format!("atelier_test_{}", uuid::Uuid::new_v4().simple());
        cluster.create_from_template(&name, TEMPLATE_DB)?;
        let manager = ConnectionManager::<PgConnection>::new(cluster.database_url(&name));
        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .build(manager)
            .map_err(|err| Box::new(err) as BoxError)?;
        Ok(Self {
            cluster,
            name,
            pool,
        })
    }

    /// Returns a handle on the shared pool.
    pub fn pool(&self) -> ProjectPgPool {
        self.pool.clone()
    }

    /// Runs raw SQL against the database.
    pub fn execute(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = self.pool.get().map_err(|err| Box::new(err) as BoxError)?;
        conn.batch_execute(sql)
            .map_err(|err| Box::new(err) as BoxError)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(&self.name));
    }
}

#[fixture]
pub fn database(postgres_cluster: PostgresCluster) -> TestDatabase {
    TestDatabase::create(postgres_cluster).expect("test database")
}

/// Builds an unsaved project owned by `owner`.
pub fn new_project(owner: UserId, clock: &DefaultClock) -> Project {
    Project::new(
        owner,
        ProjectName::new("Roadmap").expect("valid name"),
        None,
        clock,
    )
}

/// Builds an unsaved pending invitation to `project`.
pub fn new_invitation(project: &Project, invitee: UserId, clock: &DefaultClock) -> Invitation {
    Invitation::new(
        NewInvitation {
            project_id: project.id(),
            inviter: project.owner(),
            invitee,
            message: InvitationMessage::new("Join us").expect("valid message"),
        },
        clock,
    )
}
