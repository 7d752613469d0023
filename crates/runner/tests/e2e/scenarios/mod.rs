//! E2E test scenarios, one module per lifecycle phase.

mod preflight;
mod reporting;
mod teardown;
