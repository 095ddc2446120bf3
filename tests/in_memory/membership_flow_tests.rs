//! Invitation lifecycle across the ledger, coordinator and registry.

use crate::test_helpers::TestApp;
use atelier::error::ErrorKind;
use atelier::identity::domain::UserId;
use atelier::invitation::{domain::InvitationStatus, services::CreateInvitationRequest};
use atelier::notification::domain::{MembershipChange, ProjectEvent};
use atelier::project::{
    domain::{Project, ProjectId},
    services::CreateProjectRequest,
};
use atelier::task::services::CreateTaskRequest;
use chrono::TimeDelta;
use rstest::{fixture, rstest};

struct Setup {
    app: TestApp,
    owner: UserId,
    alice: UserId,
    project_id: ProjectId,
}

#[fixture]
async fn setup() -> Setup {
    let app = TestApp::new();
    let owner = app.register("owner");
    let alice = app.register("alice");
    let project = app
        .state
        .projects
        .create_project(owner, CreateProjectRequest::new("Roadmap"))
        .await
        .expect("create project");
    Setup {
        app,
        owner,
        alice,
        project_id: project.id(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_invitee_can_work_on_project_tasks(#[future] setup: Setup) {
    let Setup {
        app,
        owner,
        alice,
        project_id,
    } = setup.await;

    let invitation = app
        .state
        .invitations
        .create(project_id, owner, CreateInvitationRequest::new(alice))
        .await
        .expect("invite");
    assert!(
        app.state
            .tasks
            .list(project_id, alice)
            .await
            .is_err_and(|err| err.kind() == ErrorKind::Permission)
    );

    app.clock.advance(TimeDelta::hours(3));
    let accepted = app
        .state
        .membership
        .accept(invitation.id(), alice)
        .await
        .expect("accept");
    assert_eq!(accepted.invitation.status(), InvitationStatus::Accepted);
    assert_eq!(accepted.project.members(), &[owner, alice]);

    let task = app
        .state
        .tasks
        .create(
            project_id,
            alice,
            CreateTaskRequest::new("Draft milestones").with_assignee(owner),
        )
        .await
        .expect("member creates task");
    assert_eq!(task.created_by(), alice);

    let projects = app
        .state
        .projects
        .list_for_member(alice)
        .await
        .expect("list projects");
    assert_eq!(projects.len(), 1);
    assert_eq!(
        projects.first().map(Project::task_count),
        Some(1)
    );
    assert!(app.events.events().contains(&ProjectEvent::MembershipChanged {
        project_id,
        user_id: alice,
        change: MembershipChange::Joined {
            invitation_id: invitation.id(),
        },
    }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_invitation_allows_a_fresh_invite(#[future] setup: Setup) {
    let Setup {
        app,
        owner,
        alice,
        project_id,
    } = setup.await;

    let first = app
        .state
        .invitations
        .create(project_id, owner, CreateInvitationRequest::new(alice))
        .await
        .expect("invite");
    app.state
        .membership
        .reject(first.id(), alice)
        .await
        .expect("reject");

    let second = app
        .state
        .invitations
        .create(
            project_id,
            owner,
            CreateInvitationRequest::new(alice).with_message("Second try?"),
        )
        .await
        .expect("re-invite after rejection");
    assert_ne!(first.id(), second.id());
    assert_eq!(second.message().as_str(), "Second try?");

    let pending = app
        .state
        .invitations
        .list_for_invitee(alice)
        .await
        .expect("list");
    assert_eq!(
        pending.iter().map(|invitation| invitation.id()).collect::<Vec<_>>(),
        vec![second.id()]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_invitations_are_refused_then_swept(#[future] setup: Setup) {
    let Setup {
        app,
        owner,
        alice,
        project_id,
    } = setup.await;

    let invitation = app
        .state
        .invitations
        .create(project_id, owner, CreateInvitationRequest::new(alice))
        .await
        .expect("invite");
    app.clock.advance(TimeDelta::days(7) + TimeDelta::seconds(1));

    let err = app
        .state
        .membership
        .accept(invitation.id(), alice)
        .await
        .expect_err("expired");
    assert_eq!(err.kind(), ErrorKind::Expired);

    let pending = app
        .state
        .invitations
        .list_for_invitee(alice)
        .await
        .expect("list");
    assert_eq!(pending.len(), 1, "expired invitation stays until swept");

    let removed = app
        .state
        .invitations
        .purge_expired()
        .await
        .expect("sweep");
    assert_eq!(removed, 1);

    let err = app
        .state
        .membership
        .accept(invitation.id(), alice)
        .await
        .expect_err("swept");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    app.state
        .invitations
        .create(project_id, owner, CreateInvitationRequest::new(alice))
        .await
        .expect("invite again once swept");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn direct_add_supersedes_pending_invitation(#[future] setup: Setup) {
    let Setup {
        app,
        owner,
        alice,
        project_id,
    } = setup.await;

    let invitation = app
        .state
        .invitations
        .create(project_id, owner, CreateInvitationRequest::new(alice))
        .await
        .expect("invite");
    app.state
        .projects
        .add_member_by_username(project_id, owner, "alice")
        .await
        .expect("direct add");

    let accepted = app
        .state
        .membership
        .accept(invitation.id(), alice)
        .await
        .expect("accepting is still allowed");
    assert_eq!(
        accepted
            .project
            .members()
            .iter()
            .filter(|member| **member == alice)
            .count(),
        1
    );
}
