use crate::cmd::open_store;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use erk_core::{
    config::Config,
    issue_store::IssueStore,
    objective::{self, UpdateOptions},
    paths,
    roadmap::{self, RoadmapSummary},
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ObjectiveSubcommand {
    /// Store an objective body from a markdown file
    Create {
        /// Issue number, '#N', or issue URL
        issue: String,
        /// Markdown file holding the body
        #[arg(long)]
        file: PathBuf,
        /// Overwrite an existing body
        #[arg(long)]
        force: bool,
    },
    /// Show the roadmap of an objective
    Show { issue: String },
    /// Validate the roadmap structure (always exits 0; see `passed`)
    Check { issue: String },
    /// Show the next pending step
    Next { issue: String },
    /// Point one or more steps at a PR or plan reference (always prints JSON)
    UpdateStep {
        issue: String,
        /// Step id to update; repeat for a batch
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
        /// Reference: '#123' (landed PR), 'plan #456' (plan in flight), or '' to clear
        #[arg(long)]
        pr: String,
        /// Post an action-log comment on the issue
        #[arg(long)]
        comment: bool,
    },
}

pub fn run(root: &Path, subcmd: ObjectiveSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ObjectiveSubcommand::Create { issue, file, force } => {
            create(root, &issue, &file, force, json)
        }
        ObjectiveSubcommand::Show { issue } => show(root, &issue, json),
        ObjectiveSubcommand::Check { issue } => check(root, &issue, json),
        ObjectiveSubcommand::Next { issue } => next(root, &issue, json),
        ObjectiveSubcommand::UpdateStep {
            issue,
            steps,
            pr,
            comment,
        } => {
            update_step(root, &issue, &steps, &pr, comment);
            Ok(())
        }
    }
}

fn parse_issue(issue: &str) -> anyhow::Result<u64> {
    paths::parse_issue_ref(issue).with_context(|| format!("bad issue argument '{issue}'"))
}

fn create(root: &Path, issue: &str, file: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let id = parse_issue(issue)?;
    let store = open_store(root)?;
    if !force && store.get_issue_body(id).is_ok() {
        anyhow::bail!("objective #{id} already exists (use --force to overwrite)");
    }
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    store
        .create_issue(id, &body)
        .with_context(|| format!("failed to store objective #{id}"))?;

    let steps = roadmap::parse_roadmap(&body)
        .map(|r| r.step_count())
        .unwrap_or(0);
    if json {
        print_json(&serde_json::json!({ "issue": id, "steps": steps }))?;
    } else {
        println!("Stored objective #{id} ({steps} roadmap steps)");
    }
    Ok(())
}

fn show(root: &Path, issue: &str, json: bool) -> anyhow::Result<()> {
    let id = parse_issue(issue)?;
    let store = open_store(root)?;
    let roadmap = objective::load_roadmap(&store, id)
        .with_context(|| format!("failed to load roadmap for #{id}"))?;
    let summary = roadmap::summarize(&roadmap);

    if json {
        print_json(&serde_json::json!({
            "issue": id,
            "phases": roadmap.phases,
            "summary": summary,
        }))?;
        return Ok(());
    }

    for phase in &roadmap.phases {
        println!("Phase {}: {}", phase.label(), phase.name);
        let rows: Vec<Vec<String>> = phase
            .steps
            .iter()
            .map(|s| {
                vec![
                    s.step_id.clone(),
                    s.resolved_status.to_string(),
                    s.pr_ref.clone(),
                    s.description.clone(),
                ]
            })
            .collect();
        print_table(&["STEP", "STATUS", "REF", "DESCRIPTION"], rows);
        println!();
    }
    println!("{}", summary_line(&summary));
    Ok(())
}

fn summary_line(summary: &RoadmapSummary) -> String {
    format!(
        "{}/{} done, {} in progress, {} pending, {} blocked, {} skipped",
        summary.done,
        summary.total,
        summary.in_progress,
        summary.pending,
        summary.blocked,
        summary.skipped
    )
}

fn check(root: &Path, issue: &str, json: bool) -> anyhow::Result<()> {
    let id = parse_issue(issue)?;
    let store = open_store(root)?;
    let report =
        objective::check(&store, id).with_context(|| format!("failed to check #{id}"))?;

    if json {
        print_json(&report)?;
        return Ok(());
    }

    println!("Objective #{id}");
    for c in &report.checks {
        let mark = if c.passed { "[PASS]" } else { "[FAIL]" };
        println!("  {mark} {}", c.message);
    }
    if let Some(summary) = &report.summary {
        println!();
        println!("{}", summary_line(summary));
    }
    let failed = report.checks.iter().filter(|c| !c.passed).count();
    if report.passed {
        println!("All checks passed.");
    } else {
        println!("{failed} check(s) failed.");
    }
    Ok(())
}

fn next(root: &Path, issue: &str, json: bool) -> anyhow::Result<()> {
    let id = parse_issue(issue)?;
    let store = open_store(root)?;
    let roadmap = objective::load_roadmap(&store, id)
        .with_context(|| format!("failed to load roadmap for #{id}"))?;
    let summary = roadmap::summarize(&roadmap);

    if json {
        print_json(&serde_json::json!({
            "issue": id,
            "next_step": summary.next_step,
            "all_done": summary.all_done,
        }))?;
        return Ok(());
    }

    match summary.next_step {
        Some(step) => println!(
            "Next: {} (phase {}: {}) {}",
            step.step_id, step.phase, step.phase_name, step.description
        ),
        None if summary.all_done => println!("All steps are done."),
        None => println!("No pending steps."),
    }
    Ok(())
}

/// Machine-facing: the outcome, including failures, is always a JSON object
/// on stdout and the exit code is always 0.
fn update_step(root: &Path, issue: &str, steps: &[String], pr: &str, comment: bool) {
    let outcome =
        run_update(root, issue, steps, pr, comment).and_then(|report| print_json(&report));
    if let Err(e) = outcome {
        tracing::warn!(error = %format!("{e:#}"), "update-step failed");
        let failure = serde_json::json!({
            "success": false,
            "issue": paths::parse_issue_ref(issue).ok(),
            "pr_ref": pr,
            "steps": [],
            "error_type": "error",
            "error": format!("{e:#}"),
        });
        if let Ok(text) = serde_json::to_string_pretty(&failure) {
            println!("{text}");
        }
    }
}

fn run_update(
    root: &Path,
    issue: &str,
    steps: &[String],
    pr: &str,
    comment: bool,
) -> anyhow::Result<objective::UpdateReport> {
    let id = parse_issue(issue)?;
    let config = Config::load_or_default(root).context("failed to load config")?;
    let store = open_store(root)?;
    let opts = UpdateOptions {
        post_comment: comment || config.post_comments,
    };
    objective::update_roadmap_steps(&store, id, steps, pr, &opts)
        .with_context(|| format!("failed to update roadmap for #{id}"))
}
