//! Domain model for project tasks.

mod analytics;
mod error;
mod ids;
mod status;
mod task;
mod text;

pub use analytics::{PriorityBreakdown, ProjectAnalytics, RECENT_WINDOW_DAYS, StatusBreakdown};
pub use error::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use status::{TaskPriority, TaskStatus};
pub use task::{NewTask, PersistedTaskData, Task, TaskChanges};
pub use text::{TaskDescription, TaskTitle};
