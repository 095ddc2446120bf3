//! Shared application state for the HTTP handlers.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::identity::{ports::IdentityDirectory, services::UserSearchService};
use crate::invitation::{
    adapters::{memory::InMemoryInvitationRepository, postgres::PostgresInvitationRepository},
    ports::InvitationRepository,
    services::InvitationLedgerService,
};
use crate::membership::{
    adapters::{InMemoryAcceptanceStore, PostgresAcceptanceStore},
    ports::AcceptanceStore,
    services::MembershipCoordinator,
};
use crate::notification::ports::NotificationSink;
use crate::project::{
    adapters::{
        memory::InMemoryProjectRepository,
        postgres::{PostgresProjectRepository, ProjectPgPool},
    },
    ports::ProjectRepository,
    services::ProjectRegistryService,
};
use crate::task::{
    adapters::{memory::InMemoryTaskRepository, postgres::PostgresTaskRepository},
    ports::TaskRepository,
    services::TaskService,
};

/// Project registry over trait-object ports.
pub type AppProjects<C> =
    ProjectRegistryService<dyn ProjectRepository, dyn IdentityDirectory, dyn NotificationSink, C>;
/// Invitation ledger over trait-object ports.
pub type AppInvitations<C> = InvitationLedgerService<
    dyn InvitationRepository,
    dyn ProjectRepository,
    dyn IdentityDirectory,
    C,
>;
/// Membership coordinator over trait-object ports.
pub type AppMembership<C> =
    MembershipCoordinator<dyn InvitationRepository, dyn AcceptanceStore, dyn NotificationSink, C>;
/// Task service over trait-object ports.
pub type AppTasks<C> = TaskService<
    dyn TaskRepository,
    dyn ProjectRepository,
    dyn IdentityDirectory,
    dyn NotificationSink,
    C,
>;

/// Adapter set the services are wired over.
///
/// The acceptance store must share storage with the project and invitation
/// repositories; use [`Self::in_memory`] or [`Self::postgres`] to get a
/// consistent set.
#[derive(Clone)]
pub struct AppPorts {
    /// Project persistence.
    pub projects: Arc<dyn ProjectRepository>,
    /// Invitation persistence.
    pub invitations: Arc<dyn InvitationRepository>,
    /// Atomic acceptance commits.
    pub acceptance: Arc<dyn AcceptanceStore>,
    /// Task persistence.
    pub tasks: Arc<dyn TaskRepository>,
    /// Identity provider lookups.
    pub directory: Arc<dyn IdentityDirectory>,
    /// Project event transport.
    pub notifications: Arc<dyn NotificationSink>,
}

impl AppPorts {
    /// Wires in-memory persistence.
    #[must_use]
    pub fn in_memory(
        directory: Arc<dyn IdentityDirectory>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        let projects = InMemoryProjectRepository::new();
        let invitations = InMemoryInvitationRepository::new();
        let acceptance = InMemoryAcceptanceStore::new(projects.clone(), invitations.clone());
        Self {
            projects: Arc::new(projects),
            invitations: Arc::new(invitations),
            acceptance: Arc::new(acceptance),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            directory,
            notifications,
        }
    }

    /// Wires `PostgreSQL` persistence over a shared pool.
    #[must_use]
    pub fn postgres(
        pool: &ProjectPgPool,
        directory: Arc<dyn IdentityDirectory>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            projects: Arc::new(PostgresProjectRepository::new(pool.clone())),
            invitations: Arc::new(PostgresInvitationRepository::new(pool.clone())),
            acceptance: Arc::new(PostgresAcceptanceStore::new(pool.clone())),
            tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
            directory,
            notifications,
        }
    }
}

/// Services shared by every handler.
pub struct AppState<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    /// Project registry.
    pub projects: AppProjects<C>,
    /// Invitation ledger.
    pub invitations: AppInvitations<C>,
    /// Invitation acceptance and rejection.
    pub membership: AppMembership<C>,
    /// Tasks and analytics.
    pub tasks: AppTasks<C>,
    /// User search.
    pub users: UserSearchService<dyn IdentityDirectory>,
}

impl<C> AppState<C>
where
    C: Clock + Send + Sync,
{
    /// Builds every service over `ports`, sharing one clock.
    #[must_use]
    pub fn new(ports: AppPorts, clock: Arc<C>) -> Self {
        let AppPorts {
            projects,
            invitations,
            acceptance,
            tasks,
            directory,
            notifications,
        } = ports;
        let registry = ProjectRegistryService::new(
            Arc::clone(&projects),
            Arc::clone(&directory),
            Arc::clone(&notifications),
            Arc::clone(&clock),
        );
        Self {
            invitations: InvitationLedgerService::new(
                Arc::clone(&invitations),
                projects,
                Arc::clone(&directory),
                Arc::clone(&clock),
            ),
            membership: MembershipCoordinator::new(
                invitations,
                acceptance,
                Arc::clone(&notifications),
                Arc::clone(&clock),
            ),
            tasks: TaskService::new(
                tasks,
                registry.clone(),
                Arc::clone(&directory),
                notifications,
                clock,
            ),
            users: UserSearchService::new(directory),
            projects: registry,
        }
    }
}
