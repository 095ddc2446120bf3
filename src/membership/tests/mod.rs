//! Unit tests for invitation resolution.
