//! Tests for the HTTP surface, driving handlers directly.
