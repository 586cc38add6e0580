//! Cross-module test scenarios and shared fixtures.

mod end_to_end;
pub mod support;
