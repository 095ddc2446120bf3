//! Application services for the invitation ledger.

mod ledger;

pub use ledger::{
    CreateInvitationRequest, InvitationLedgerService, InvitationServiceError,
    InvitationServiceResult,
};
