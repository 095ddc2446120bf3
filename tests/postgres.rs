//! `PostgreSQL` integration tests for the Diesel adapters.
//!
//! - `cluster`: embedded cluster lifecycle
//! - `helpers`: template-cloned databases and seed builders
//! - `acceptance_tests`: invitation acceptance committed in one transaction
//! - `invitation_uniqueness_tests`: one pending invitation per project and
//!   invitee
//! - `project_version_tests`: version checks and atomic set changes

mod test_helpers;

mod postgres {
    pub mod cluster;
    pub mod helpers;

    mod acceptance_tests;
    mod invitation_uniqueness_tests;
    mod project_version_tests;
}
