//! Property-based tests for the symlink document
