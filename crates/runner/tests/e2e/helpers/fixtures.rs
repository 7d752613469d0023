//! Config fixtures and run builders.

use std::sync::Arc;

use stackrun_core::StackrunConfig;
use stackrun_core::types::{Bucket, BucketRegistry};
use stackrun_runner::{EndOptions, SimulatedCloud, StartOptions, TestRun};

/// One test deployed to two regions.
pub const SINGLE_TEST: &str = r#"
[project]
name = "demo"
regions = ["us-east-1"]
template = "templates/main.yaml"

[[tests]]
name = "one"
regions = ["us-east-1", "eu-west-1"]
"#;

/// Three tests inheriting two project regions.
#[allow(dead_code)]
pub const THREE_TESTS: &str = r#"
[project]
name = "demo"
regions = ["us-east-1", "eu-west-1"]
template = "templates/main.yaml"

[[tests]]
name = "alpha"

[[tests]]
name = "beta"

[[tests]]
name = "gamma"
"#;

/// Parse a fixture, panicking on malformed input.
pub fn config(toml_str: &str) -> StackrunConfig {
    StackrunConfig::parse(toml_str).expect("fixture config should parse")
}

/// Build a run over the given cloud with explicit options.
pub fn build_run(
    cloud: &Arc<SimulatedCloud>,
    config: StackrunConfig,
    start: StartOptions,
    end: EndOptions,
) -> TestRun {
    TestRun::builder()
        .config(config)
        .project_root("/work/project")
        .toolchain(cloud.toolchain())
        .start_options(start)
        .end_options(end)
        .build()
        .expect("run should build")
}

/// Build a run with default options.
pub fn default_run(cloud: &Arc<SimulatedCloud>, toml_str: &str) -> TestRun {
    build_run(
        cloud,
        config(toml_str),
        StartOptions::default(),
        EndOptions::default(),
    )
}

/// A registry in which every test/region entry points at the same bucket.
#[allow(dead_code)]
pub fn shared_bucket(tests: &[&str], regions: &[&str], name: &str, alias: bool) -> BucketRegistry {
    let mut registry = BucketRegistry::new();
    for test in tests {
        for region in regions {
            registry.insert(
                *test,
                *region,
                Bucket {
                    name: name.to_owned(),
                    region: (*region).to_owned(),
                    regional_buckets: alias,
                },
            );
        }
    }
    registry
}
