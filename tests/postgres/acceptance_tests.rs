//! Acceptance commits spanning the invitation and membership tables.

use crate::postgres::helpers::{
    TestDatabase, clock, database, new_invitation, new_project, rt,
};
use atelier::identity::domain::UserId;
use atelier::invitation::{
    adapters::postgres::PostgresInvitationRepository, domain::InvitationStatus,
    ports::InvitationRepository,
};
use atelier::membership::{
    adapters::PostgresAcceptanceStore,
    ports::{AcceptanceStore, AcceptanceStoreError},
};
use atelier::project::{adapters::postgres::PostgresProjectRepository, ports::ProjectRepository};
use mockable::DefaultClock;
use rstest::rstest;
use tokio::runtime::Runtime;

struct Stores {
    projects: PostgresProjectRepository,
    invitations: PostgresInvitationRepository,
    acceptance: PostgresAcceptanceStore,
}

fn stores(database: &TestDatabase) -> Stores {
    Stores {
        projects: PostgresProjectRepository::new(database.pool()),
        invitations: PostgresInvitationRepository::new(database.pool()),
        acceptance: PostgresAcceptanceStore::new(database.pool()),
    }
}

/// Makes every insert into `project_members` fail inside the database.
const BREAK_MEMBERSHIP_WRITES: &str = r"
CREATE FUNCTION refuse_member_insert() RETURNS trigger AS $$
BEGIN
    RAISE EXCEPTION 'membership writes disabled';
END
$$ LANGUAGE plpgsql;

CREATE TRIGGER refuse_member_insert
    BEFORE INSERT ON project_members
    FOR EACH ROW EXECUTE FUNCTION refuse_member_insert();
";

#[rstest]
fn commit_marks_invitation_accepted_and_adds_member(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let stores = stores(&database);
    let project = new_project(UserId::new(), &clock);
    let invitee = UserId::new();
    let mut invitation = new_invitation(&project, invitee, &clock);
    rt.block_on(stores.projects.store(&project)).expect("store project");
    rt.block_on(stores.invitations.store(&invitation))
        .expect("store invitation");

    invitation.accept(&clock).expect("accept");
    let committed = rt
        .block_on(stores.acceptance.commit_acceptance(&invitation))
        .expect("commit");

    assert_eq!(committed.members(), &[project.owner(), invitee]);
    assert_eq!(committed.version(), 1);
    let stored = rt
        .block_on(stores.invitations.find_by_id(invitation.id()))
        .expect("lookup")
        .expect("invitation present");
    assert_eq!(stored.status(), InvitationStatus::Accepted);
}

#[rstest]
fn failed_membership_write_rolls_back_status(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let stores = stores(&database);
    let project = new_project(UserId::new(), &clock);
    let mut invitation = new_invitation(&project, UserId::new(), &clock);
    rt.block_on(stores.projects.store(&project)).expect("store project");
    rt.block_on(stores.invitations.store(&invitation))
        .expect("store invitation");
    database
        .execute(BREAK_MEMBERSHIP_WRITES)
        .expect("install trigger");

    invitation.accept(&clock).expect("accept");
    let result = rt.block_on(stores.acceptance.commit_acceptance(&invitation));

    assert!(
        matches!(result, Err(AcceptanceStoreError::Persistence(_))),
        "expected persistence failure, got: {result:?}"
    );
    let stored = rt
        .block_on(stores.invitations.find_by_id(invitation.id()))
        .expect("lookup")
        .expect("invitation present");
    assert_eq!(stored.status(), InvitationStatus::Pending);
    let unchanged = rt
        .block_on(stores.projects.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(unchanged.members(), &[project.owner()]);
    assert_eq!(unchanged.version(), 0);
}

#[rstest]
fn second_commit_is_refused_without_duplicate_membership(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let stores = stores(&database);
    let project = new_project(UserId::new(), &clock);
    let invitee = UserId::new();
    let mut invitation = new_invitation(&project, invitee, &clock);
    rt.block_on(stores.projects.store(&project)).expect("store project");
    rt.block_on(stores.invitations.store(&invitation))
        .expect("store invitation");
    invitation.accept(&clock).expect("accept");
    rt.block_on(stores.acceptance.commit_acceptance(&invitation))
        .expect("first commit");

    let result = rt.block_on(stores.acceptance.commit_acceptance(&invitation));

    assert!(
        matches!(
            result,
            Err(AcceptanceStoreError::InvitationNotPending {
                status: InvitationStatus::Accepted,
                ..
            })
        ),
        "expected not-pending refusal, got: {result:?}"
    );
    let stored = rt
        .block_on(stores.projects.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(stored.members(), &[project.owner(), invitee]);
    assert_eq!(stored.version(), 1);
}

#[rstest]
fn commits_for_different_invitees_all_land(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let stores = stores(&database);
    let project = new_project(UserId::new(), &clock);
    rt.block_on(stores.projects.store(&project)).expect("store project");
    let mut accepted = Vec::new();
    for _ in 0..6 {
        let mut invitation = new_invitation(&project, UserId::new(), &clock);
        rt.block_on(stores.invitations.store(&invitation))
            .expect("store invitation");
        invitation.accept(&clock).expect("accept");
        accepted.push(invitation);
    }

    let outcomes = rt.block_on(async {
        let handles: Vec<_> = accepted
            .iter()
            .cloned()
            .map(|invitation| {
                let store = stores.acceptance.clone();
                tokio::spawn(async move { store.commit_acceptance(&invitation).await })
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
        .block_on(stores.projects.find_by_id(project.id()))
        .expect("lookup")
        .expect("project present");
    assert_eq!(stored.member_count(), 7);
    assert_eq!(stored.version(), 6);
}
