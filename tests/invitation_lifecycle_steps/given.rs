//! Given steps for invitation lifecycle BDD scenarios.

use atelier::invitation::services::CreateInvitationRequest;
use atelier::project::services::CreateProjectRequest;
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::given;

use super::world::{InvitationWorld, run_async};

#[given(r#"a project "{name}" owned by "{owner}""#)]
fn a_project_owned_by(
    world: &mut InvitationWorld,
    name: String,
    owner: String,
) -> Result<(), eyre::Report> {
    let owner_id = world.ensure_user(&owner);
    let project = run_async(
        world
            .app
            .state
            .projects
            .create_project(owner_id, CreateProjectRequest::new(name)),
    )
    .wrap_err("create scenario project")?;
    world.project_id = Some(project.id());
    Ok(())
}

#[given(r#"a registered user "{username}""#)]
fn a_registered_user(world: &mut InvitationWorld, username: String) {
    world.ensure_user(&username);
}

#[given(r#""{inviter}" has invited "{invitee}""#)]
fn has_invited(
    world: &mut InvitationWorld,
    inviter: String,
    invitee: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project_id()?;
    let inviter_id = world.user(&inviter)?;
    let invitee_id = world.user(&invitee)?;
    let invitation = run_async(world.app.state.invitations.create(
        project_id,
        inviter_id,
        CreateInvitationRequest::new(invitee_id),
    ))
    .wrap_err("create scenario invitation")?;
    world.invitation_id = Some(invitation.id());
    Ok(())
}

#[given(r#""{invitee}" has accepted the invitation"#)]
fn has_accepted(world: &mut InvitationWorld, invitee: String) -> Result<(), eyre::Report> {
    let invitee_id = world.user(&invitee)?;
    let invitation_id = world.invitation_id()?;
    run_async(world.app.state.membership.accept(invitation_id, invitee_id))
        .wrap_err("accept scenario invitation")?;
    Ok(())
}

#[given("{days} days have passed")]
fn days_have_passed(world: &mut InvitationWorld, days: i64) {
    world.app.clock.advance(TimeDelta::days(days));
}
