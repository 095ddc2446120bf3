//! The partial unique index on pending invitations.

use crate::postgres::helpers::{
    TestDatabase, clock, database, new_invitation, new_project, rt,
};
use atelier::identity::domain::UserId;
use atelier::invitation::{
    adapters::postgres::PostgresInvitationRepository,
    ports::{InvitationRepository, InvitationRepositoryError},
};
use atelier::project::{adapters::postgres::PostgresProjectRepository, ports::ProjectRepository};
use mockable::DefaultClock;
use rstest::rstest;
use tokio::runtime::Runtime;

#[rstest]
fn racing_duplicate_invitations_store_exactly_one(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let projects = PostgresProjectRepository::new(database.pool());
    let invitations = PostgresInvitationRepository::new(database.pool());
    let project = new_project(UserId::new(), &clock);
    let invitee = UserId::new();
    rt.block_on(projects.store(&project)).expect("store project");

    let outcomes = rt.block_on(async {
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let repository = invitations.clone();
                let invitation = new_invitation(&project, invitee, &clock);
                tokio::spawn(async move { repository.store(&invitation).await })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.expect("join"));
        }
        results
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().filter_map(|outcome| outcome.as_ref().err()).all(|err| matches!(
        err,
        InvitationRepositoryError::DuplicatePending { project_id, invitee: user }
            if *project_id == project.id() && *user == invitee
    )));
    let pending = rt
        .block_on(invitations.list_pending_for_project(project.id()))
        .expect("list");
    assert_eq!(pending.len(), 1);
}

#[rstest]
fn resolved_invitation_frees_the_pending_slot(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let projects = PostgresProjectRepository::new(database.pool());
    let invitations = PostgresInvitationRepository::new(database.pool());
    let project = new_project(UserId::new(), &clock);
    let invitee = UserId::new();
    rt.block_on(projects.store(&project)).expect("store project");
    let mut first = new_invitation(&project, invitee, &clock);
    rt.block_on(invitations.store(&first)).expect("first invitation");

    first.reject(&clock).expect("reject");
    rt.block_on(invitations.resolve(&first)).expect("resolve");

    rt.block_on(invitations.store(&new_invitation(&project, invitee, &clock)))
        .expect("re-invite after rejection");
}

#[rstest]
fn reused_identifier_is_a_duplicate_invitation(
    database: TestDatabase,
    rt: Runtime,
    clock: DefaultClock,
) {
    let projects = PostgresProjectRepository::new(database.pool());
    let invitations = PostgresInvitationRepository::new(database.pool());
    let project = new_project(UserId::new(), &clock);
    rt.block_on(projects.store(&project)).expect("store project");
    let mut invitation = new_invitation(&project, UserId::new(), &clock);
    rt.block_on(invitations.store(&invitation)).expect("store");
    invitation.reject(&clock).expect("reject");
    rt.block_on(invitations.resolve(&invitation)).expect("resolve");

    let result = rt.block_on(invitations.store(&invitation));

    assert!(
        matches!(result, Err(InvitationRepositoryError::DuplicateInvitation(id)) if id == invitation.id()),
        "expected duplicate identifier, got: {result:?}"
    );
}
