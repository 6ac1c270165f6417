//! check command - Verify a weave

use std::path::Path;

use anyhow::{bail, Result};

use super::open_read;
use crate::cli::Context;
use crate::ui::output;
use crate::weave::CheckFailure;

/// Verify structure and checksums; fails when any check fails.
pub fn check(ctx: &Context, file: &Path, json: bool) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let report = weave.check_report();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for failure in &report.failures {
            output::error(describe(failure));
        }
        if report.ok {
            output::success(
                format!("{} versions ok", report.versions),
                ctx.verbosity,
            );
        }
    }

    if !report.ok {
        bail!(
            "check failed: {} problem(s) in {} versions",
            report.failures.len(),
            report.versions
        );
    }
    Ok(())
}

fn describe(failure: &CheckFailure) -> String {
    match failure {
        CheckFailure::InvalidParent { version, parent } => {
            format!("{}: parent index {} is not older", version, parent)
        }
        CheckFailure::AncestryMismatch {
            version,
            structural,
            computed,
        } => format!(
            "{}: ancestry {} disagrees with inclusions {}",
            version,
            structural.join(" "),
            computed.join(" ")
        ),
        CheckFailure::Format { message } => format!("stream: {}", message),
        CheckFailure::Checksum {
            version,
            expected,
            measured,
        } => format!(
            "{}: checksum {} but text hashes to {}",
            version, expected, measured
        ),
    }
}
