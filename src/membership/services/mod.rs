//! Application services for invitation resolution.

mod coordinator;

pub use coordinator::{
    AcceptedInvitation, MembershipCoordinator, MembershipServiceError, MembershipServiceResult,
};
