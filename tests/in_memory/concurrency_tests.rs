//! Racing operations against shared in-memory state.

use std::sync::Arc;

use crate::test_helpers::TestApp;
use atelier::error::ErrorKind;
use atelier::invitation::services::CreateInvitationRequest;
use atelier::project::services::CreateProjectRequest;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acceptances_of_different_invitations_keep_every_member() {
    let app = Arc::new(TestApp::new());
    let owner = app.register("owner");
    let project = app
        .state
        .projects
        .create_project(owner, CreateProjectRequest::new("Roadmap"))
        .await
        .expect("create project");

    let mut invited = Vec::new();
    for index in 0..8 {
        let user = app.register(&format!("user{index}"));
        let invitation = app
            .state
            .invitations
            .create(project.id(), owner, CreateInvitationRequest::new(user))
            .await
            .expect("invite");
        invited.push((user, invitation.id()));
    }

    let mut joins = JoinSet::new();
    for (user, invitation_id) in invited.iter().copied() {
        let shared = Arc::clone(&app);
        joins.spawn(async move { shared.state.membership.accept(invitation_id, user).await });
    }
    while let Some(joined) = joins.join_next().await {
        joined.expect("task completes").expect("accept succeeds");
    }

    let stored = app
        .state
        .projects
        .get_project(project.id(), owner)
        .await
        .expect("load project");
    assert_eq!(stored.member_count(), 9);
    for (user, _) in &invited {
        assert!(stored.is_member(user));
    }
    assert_eq!(stored.version(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn accept_racing_cancel_has_a_single_winner() {
    let app = Arc::new(TestApp::new());
    let owner = app.register("owner");
    let alice = app.register("alice");
    let project = app
        .state
        .projects
        .create_project(owner, CreateProjectRequest::new("Roadmap"))
        .await
        .expect("create project");
    let invitation = app
        .state
        .invitations
        .create(project.id(), owner, CreateInvitationRequest::new(alice))
        .await
        .expect("invite");
    let invitation_id = invitation.id();

    let accepting = Arc::clone(&app);
    let accept = tokio::spawn(async move {
        accepting
            .state
            .membership
            .accept(invitation_id, alice)
            .await
    });
    let cancelling = Arc::clone(&app);
    let cancel = tokio::spawn(async move {
        cancelling
            .state
            .invitations
            .cancel(invitation_id, owner)
            .await
    });
    let accepted = accept.await.expect("accept task");
    let cancelled = cancel.await.expect("cancel task");

    let stored = app
        .state
        .projects
        .get_project(project.id(), owner)
        .await
        .expect("load project");
    match (accepted, cancelled) {
        (Ok(_), Err(err)) => {
            assert!(matches!(err.kind(), ErrorKind::Conflict | ErrorKind::NotFound));
            assert!(stored.is_member(&alice));
        }
        (Err(err), Ok(_)) => {
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert!(!stored.is_member(&alice));
        }
        (accepted, cancelled) => {
            panic!("expected exactly one winner, got {accepted:?} and {cancelled:?}")
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_duplicate_invitations_store_exactly_one() {
    let app = Arc::new(TestApp::new());
    let owner = app.register("owner");
    let alice = app.register("alice");
    let project = app
        .state
        .projects
        .create_project(owner, CreateProjectRequest::new("Roadmap"))
        .await
        .expect("create project");

    let mut joins = JoinSet::new();
    for _ in 0..6 {
        let shared = Arc::clone(&app);
        let project_id = project.id();
        joins.spawn(async move {
            shared
                .state
                .invitations
                .create(project_id, owner, CreateInvitationRequest::new(alice))
                .await
        });
    }
    let mut successes = 0;
    while let Some(joined) = joins.join_next().await {
        match joined.expect("task completes") {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
        }
    }
    assert_eq!(successes, 1);
    let pending = app
        .state
        .invitations
        .list_for_project(project.id(), owner)
        .await
        .expect("list");
    assert_eq!(pending.len(), 1);
}
