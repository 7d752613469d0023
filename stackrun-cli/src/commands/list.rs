//! `stackrun list` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use stackrun_core::client::ClientCache;
use stackrun_core::config::StackrunConfig;
use stackrun_core::filter::Selection;
use stackrun_core::resolve::RunConfig;

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub async fn execute(
    args: ListArgs,
    project_root: &Path,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = StackrunConfig::load(config_path).await?;
    let report = build_list_report(config, project_root, &args);
    info!(tests = report.tests.len(), "listed tests");
    writer.render(&report)?;
    Ok(())
}

/// Apply the name filters and resolve each surviving test.
fn build_list_report(config: StackrunConfig, project_root: &Path, args: &ListArgs) -> ListReport {
    let mut run_config = RunConfig::new(config, project_root);
    run_config.filter(&Selection::parse(&args.tests), &Selection::parse(&args.regions));

    let clients = ClientCache::new();
    let regions = run_config.regions(&clients);
    let tests = run_config
        .templates()
        .into_iter()
        .map(|template| TestEntry {
            regions: regions
                .get(&template.test)
                .map(|targets| {
                    targets
                        .iter()
                        .map(|t| RegionEntry {
                            name: t.name.clone(),
                            profile: t.profile.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            name: template.test,
            template: template.path.display().to_string(),
        })
        .collect();

    ListReport {
        project: run_config.project_name().to_owned(),
        tests,
    }
}

/// Filtered test registry.
#[derive(Serialize)]
pub struct ListReport {
    pub project: String,
    pub tests: Vec<TestEntry>,
}

#[derive(Serialize)]
pub struct TestEntry {
    pub name: String,
    pub template: String,
    pub regions: Vec<RegionEntry>,
}

#[derive(Serialize)]
pub struct RegionEntry {
    pub name: String,
    pub profile: String,
}

impl Render for ListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Project: {}", self.project.bold())?;
        if self.tests.is_empty() {
            writeln!(w, "  (no tests selected)")?;
            return Ok(());
        }

        writeln!(w)?;
        writeln!(w, "{:<20} {:<14} {:<12} Template", "Test", "Region", "Profile")?;
        writeln!(w, "{}", "-".repeat(72))?;
        for test in &self.tests {
            if test.regions.is_empty() {
                writeln!(w, "{:<20} {:<14} {:<12} {}", test.name, "-", "-", test.template)?;
            }
            for region in &test.regions {
                writeln!(
                    w,
                    "{:<20} {:<14} {:<12} {}",
                    test.name, region.name, region.profile, test.template
                )?;
            }
        }

        Ok(())
    }
}
