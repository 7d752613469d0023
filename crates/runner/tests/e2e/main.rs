//! E2E lifecycle tests for stackrun-runner.
//!
//! These tests drive `TestRun` against the in-process simulated cloud and
//! check phase ordering, teardown policy, bucket dedup and failure judgement
//! through the recorded call log.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (config fixtures, run builders, call log assertions)
//! - `scenarios/` -- Test files organized by lifecycle phase
//!
//! # Running
//!
//! ```bash
//! cargo test -p stackrun-runner --test e2e
//! ```

mod scenarios;
