//! Property test suite entry point.
