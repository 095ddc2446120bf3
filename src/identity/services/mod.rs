//! Application services for identity lookups.

mod search;

pub use search::{MAX_SEARCH_RESULTS, MIN_SEARCH_FRAGMENT, UserSearchError, UserSearchService};
