//! When steps for invitation lifecycle BDD scenarios.

use atelier::invitation::services::CreateInvitationRequest;
use rstest_bdd_macros::when;

use super::world::{InvitationWorld, run_async};

#[when(r#""{username}" accepts the invitation"#)]
fn accepts_the_invitation(
    world: &mut InvitationWorld,
    username: String,
) -> Result<(), eyre::Report> {
    let user = world.user(&username)?;
    let invitation_id = world.invitation_id()?;
    world.last_error = run_async(world.app.state.membership.accept(invitation_id, user))
        .err()
        .map(|err| err.kind());
    Ok(())
}

#[when(r#""{username}" rejects the invitation"#)]
fn rejects_the_invitation(
    world: &mut InvitationWorld,
    username: String,
) -> Result<(), eyre::Report> {
    let user = world.user(&username)?;
    let invitation_id = world.invitation_id()?;
    world.last_error = run_async(world.app.state.membership.reject(invitation_id, user))
        .err()
        .map(|err| err.kind());
    Ok(())
}

#[when(r#""{inviter}" invites "{invitee}" again"#)]
fn invites_again(
    world: &mut InvitationWorld,
    inviter: String,
    invitee: String,
) -> Result<(), eyre::Report> {
    let project_id = world.project_id()?;
    let inviter_id = world.user(&inviter)?;
    let invitee_id = world.user(&invitee)?;
    world.last_error = run_async(world.app.state.invitations.create(
        project_id,
        inviter_id,
        CreateInvitationRequest::new(invitee_id),
    ))
    .err()
    .map(|err| err.kind());
    Ok(())
}

#[when(r#""{inviter}" cancels the invitation"#)]
fn cancels_the_invitation(
    world: &mut InvitationWorld,
    inviter: String,
) -> Result<(), eyre::Report> {
    let inviter_id = world.user(&inviter)?;
    let invitation_id = world.invitation_id()?;
    run_async(world.app.state.invitations.cancel(invitation_id, inviter_id))
        .map_err(|err| eyre::eyre!("cancel failed: {err}"))?;
    Ok(())
}
