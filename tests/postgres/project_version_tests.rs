//! Optimistic version checks and atomic set changes on projects.

use std::sync::Arc;

use crate::postgres::helpers::{TestDatabase, clock, database, new_project, rt};
use atelier::identity::{adapters::memory::InMemoryIdentityDirectory, domain::UserId};
use atelier::notification::adapters::RecordingNotificationSink;
use atelier::project::{
    adapters::postgres::PostgresProjectRepository,
    domain::{ProjectChange, ProjectName},
    ports::{ProjectRepository, ProjectRepositoryError},
    services::ProjectRegistryService,
};
use atelier::task::domain::TaskId;
use diesel::prelude::*;
use mockable::{Clock, DefaultClock};
use rstest::rstest;
use tokio::runtime::Runtime;

#[derive(QueryableByName)]
struct VersionRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    version: i64,
}

#[rstest]
fn version_column_defaults_to_zero(database: TestDatabase) {
    let mut conn = database.pool().get().expect("connection");
    let row = diesel::sql_query(concat!(
        "INSERT INTO projects (id, name, owner_id, created_at, updated_at) ",
        "VALUES (gen_random_uuid(), 'Bare', gen_random_uuid(), NOW(), NOW()) ",
        "RETURNING version",
    ))
    .get_result::<VersionRow>(&mut conn)
    .expect("insert without version");

    assert_eq!(row.version, 0);
}

#[rstest]
fn stored_project_starts_at_zero_and_update_increments(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let repository = PostgresProjectRepository::new(database.pool());
    let mut project = new_project(UserId::new(), &clock);
    rt.block_on(repository.store(&project)).expect("store");
    let loaded = rt
        .block_on(repository.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(loaded.version(), 0);

    project.rename(
        Some(ProjectName::new("Renamed").expect("valid name")),
        None,
        &clock,
    );
    let version = rt.block_on(repository.update(&project)).expect("update");

    assert_eq!(version, 1);
    let stored = rt
        .block_on(repository.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(stored.name().as_str(), "Renamed");
    assert_eq!(stored.version(), 1);
}

#[rstest]
fn stale_update_reports_version_conflict(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let repository = PostgresProjectRepository::new(database.pool());
    let project = new_project(UserId::new(), &clock);
    rt.block_on(repository.store(&project)).expect("store");
    let mut first = project.clone();
    let mut second = project.clone();
    first.rename(Some(ProjectName::new("First").expect("valid")), None, &clock);
    second.rename(Some(ProjectName::new("Second").expect("valid")), None, &clock);

    rt.block_on(repository.update(&first)).expect("first writer wins");
    let result = rt.block_on(repository.update(&second));

    assert!(
        matches!(
            result,
            Err(ProjectRepositoryError::VersionConflict {
                expected: 0,
                actual: 1,
                ..
            })
        ),
        "expected version conflict, got: {result:?}"
    );
    let stored = rt
        .block_on(repository.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(stored.name().as_str(), "First");
}

#[rstest]
fn update_of_missing_project_is_not_found(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let repository = PostgresProjectRepository::new(database.pool());
    let project = new_project(UserId::new(), &clock);

    let result = rt.block_on(repository.update(&project));

    assert!(matches!(result, Err(ProjectRepositoryError::NotFound(id)) if id == project.id()));
}

#[rstest]
fn set_changes_write_deltas_and_bump_only_on_effect(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let repository = PostgresProjectRepository::new(database.pool());
    let owner = UserId::new();
    let project = new_project(owner, &clock);
    rt.block_on(repository.store(&project)).expect("store");
    let member = UserId::new();
    let task_id = TaskId::new();
    let apply = |change| {
        rt.block_on(repository.apply_change(project.id(), change, clock.utc()))
            .expect("apply change")
    };

    assert!(apply(ProjectChange::AddMember(member)).changed);
    assert!(!apply(ProjectChange::AddMember(member)).changed);
    assert!(apply(ProjectChange::AddTaskRef(task_id)).changed);
    assert!(!apply(ProjectChange::RemoveMember(owner)).changed);
    let last = apply(ProjectChange::RemoveTaskRef(task_id));

    assert!(last.changed);
    assert_eq!(last.project.version(), 3);
    assert_eq!(last.project.members(), &[owner, member]);
    let stored = rt
        .block_on(repository.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(stored.members(), &[owner, member]);
    assert!(stored.tasks().is_empty());
    assert_eq!(stored.version(), 3);
}

#[rstest]
fn set_change_on_missing_project_is_not_found(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let repository = PostgresProjectRepository::new(database.pool());
    let project = new_project(UserId::new(), &clock);

    let result = rt.block_on(repository.apply_change(
        project.id(),
        ProjectChange::AddMember(UserId::new()),
        clock.utc(),
    ));

    assert!(matches!(result, Err(ProjectRepositoryError::NotFound(id)) if id == project.id()));
}

#[rstest]
fn concurrent_member_additions_all_succeed(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let repository = Arc::new(PostgresProjectRepository::new(database.pool()));
    let registry = Arc::new(ProjectRegistryService::new(
        Arc::clone(&repository),
        Arc::new(InMemoryIdentityDirectory::new()),
        Arc::new(RecordingNotificationSink::new()),
        Arc::new(DefaultClock),
    ));
    let project = new_project(UserId::new(), &clock);
    rt.block_on(repository.store(&project)).expect("store");

    let outcomes = rt.block_on(async {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = Arc::clone(&registry);
                let project_id = project.id();
                tokio::spawn(async move { service.add_member(project_id, UserId::new()).await })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.expect("join"));
        }
        results
    });

    assert!(outcomes.iter().all(Result::is_ok), "{outcomes:?}");
    let stored = rt
        .block_on(repository.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(stored.member_count(), 17);
    assert_eq!(stored.version(), 16);
}
