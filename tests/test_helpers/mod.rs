//! Shared fixtures and environment guards for integration tests.

use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use atelier::api::{AppPorts, AppState};
use atelier::identity::{
    adapters::memory::InMemoryIdentityDirectory,
    domain::{UserId, UserProfile, Username},
    ports::IdentityDirectory,
};
use atelier::notification::{adapters::RecordingNotificationSink, ports::NotificationSink};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Starts the clock at a fixed instant.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid start");
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        *self.now.lock().expect("clock lock") += delta;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Application wired over in-memory adapters and a manual clock.
pub struct TestApp {
    /// Services under test.
    pub state: Arc<AppState<ManualClock>>,
    /// Identity directory backing the services.
    pub directory: Arc<InMemoryIdentityDirectory>,
    /// Events published by the services.
    pub events: Arc<RecordingNotificationSink>,
    /// Clock shared by every service.
    pub clock: ManualClock,
}

impl TestApp {
    /// Builds a fresh application.
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryIdentityDirectory::new());
        let events = Arc::new(RecordingNotificationSink::new());
        let clock = ManualClock::new();
        let directory_port: Arc<dyn IdentityDirectory> = directory.clone();
        let events_port: Arc<dyn NotificationSink> = events.clone();
        let ports = AppPorts::in_memory(directory_port, events_port);
        Self {
            state: Arc::new(AppState::new(ports, Arc::new(clock.clone()))),
            directory,
            events,
            clock,
        }
    }

    /// Registers a user with the directory.
    pub fn register(&self, username: &str) -> UserId {
        let id = UserId::new();
        self.directory
            .register(UserProfile::new(
                id,
                Username::new(username).expect("valid username"),
                username,
            ))
            .expect("register user");
        id
    }
}

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Applies environment variable changes until dropped.
///
/// Holds a process-wide lock so concurrent tests never observe each
/// other's changes.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets (`Some`) or removes (`None`) each variable.
    pub fn set_many(changes: &[(OsString, Option<OsString>)]) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = changes
            .iter()
            .map(|(key, value)| {
                let old = env::var_os(key);
                apply_env(key, value.as_deref());
                (key.clone(), old)
            })
            .collect();
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..).rev() {
            apply_env(&key, value.as_deref());
        }
    }
}

fn apply_env(key: &OsStr, value: Option<&OsStr>) {
    // SAFETY: every mutation happens under `ENV_MUTEX`.
    unsafe {
        match value {
            Some(new_value) => env::set_var(key, new_value),
            None => env::remove_var(key),
        }
    }
}
