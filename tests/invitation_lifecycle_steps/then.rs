//! Then steps for invitation lifecycle BDD scenarios.

use rstest_bdd_macros::then;

use super::world::{InvitationWorld, run_async};

#[then(r#"the request fails with "{kind}""#)]
fn the_request_fails_with(world: &InvitationWorld, kind: String) -> Result<(), eyre::Report> {
    let actual = world
        .last_error
        .ok_or_else(|| eyre::eyre!("expected the request to fail with {kind}, but it succeeded"))?;
    if actual.as_str() != kind {
        return Err(eyre::eyre!("expected {kind}, got {}", actual.as_str()));
    }
    Ok(())
}

#[then(r#"the invitation is "{status}""#)]
fn the_invitation_is(world: &InvitationWorld, status: String) -> Result<(), eyre::Report> {
    let invitation_id = world.invitation_id()?;
    let invitation = run_async(world.app.state.invitations.find(invitation_id))
        .map_err(|err| eyre::eyre!("invitation lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("invitation {invitation_id} is missing"))?;
    if invitation.status().as_str() != status {
        return Err(eyre::eyre!(
            "expected status {status}, got {}",
            invitation.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#""{username}" is a member of the project"#)]
fn is_a_member(world: &InvitationWorld, username: String) -> Result<(), eyre::Report> {
    let user = world.user(&username)?;
    if !world.stored_project()?.is_member(&user) {
        return Err(eyre::eyre!("expected {username} to be a member"));
    }
    Ok(())
}

#[then(r#""{username}" is not a member of the project"#)]
fn is_not_a_member(world: &InvitationWorld, username: String) -> Result<(), eyre::Report> {
    let user = world.user(&username)?;
    if world.stored_project()?.is_member(&user) {
        return Err(eyre::eyre!("expected {username} not to be a member"));
    }
    Ok(())
}

#[then("the project has {count:usize} members")]
fn the_project_has_members(world: &InvitationWorld, count: usize) -> Result<(), eyre::Report> {
    let members = world.stored_project()?.member_count();
    if members != count {
        return Err(eyre::eyre!("expected {count} members, found {members}"));
    }
    Ok(())
}

#[then("the project has {count:usize} pending invitations")]
fn the_project_has_pending_invitations(
    world: &InvitationWorld,
    count: usize,
) -> Result<(), eyre::Report> {
    let project = world.stored_project()?;
    let pending = run_async(
        world
            .app
            .state
            .invitations
            .list_for_project(project.id(), project.owner()),
    )
    .map_err(|err| eyre::eyre!("listing invitations failed: {err}"))?;
    if pending.len() != count {
        return Err(eyre::eyre!(
            "expected {count} pending invitations, found {}",
            pending.len()
        ));
    }
    Ok(())
}
