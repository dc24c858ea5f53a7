use super::{print_json, read_json, render, CommandContext};
use noura_availability::components::availability::grouping::{
    exceptions_by_date, localize_exception, wire_exception,
};
use noura_availability::components::availability::{
    diff_exceptions, ensure_unique_dates, validate_exceptions, ExceptionEntry,
};
use noura_availability::components::sync::executor::plan_exception_operations;
use noura_availability::error::AppResult;
use std::path::Path;
use tracing::info;

pub async fn list(ctx: &CommandContext, json: bool) -> AppResult<()> {
    let exceptions = ctx.sync.fetch_exceptions().await?;

    if json {
        let local: Vec<ExceptionEntry> = exceptions
            .iter()
            .map(|entry| localize_exception(entry, &ctx.codec))
            .collect();
        return print_json(&local);
    }

    if exceptions.is_empty() {
        println!("{}", t!("no_exceptions"));
        return Ok(());
    }
    for (date, entries) in exceptions_by_date(&exceptions, &ctx.codec) {
        for entry in entries {
            println!("{} {}", date, render::exception(&entry));
        }
    }
    Ok(())
}

/// Sync the exception list in `file` (local times) against the server state
pub async fn apply(ctx: &CommandContext, file: &Path, dry_run: bool) -> AppResult<()> {
    let edited: Vec<ExceptionEntry> = read_json(file)?;
    // Checked as typed here, and again in UTC before sending
    validate_exceptions(&edited)?;
    let current: Vec<ExceptionEntry> = edited
        .iter()
        .map(|entry| wire_exception(entry, &ctx.codec))
        .collect();
    info!("Loaded {} exceptions from {}", current.len(), file.display());

    let snapshot = ctx.sync.snapshot().await?;

    if dry_run {
        ensure_unique_dates(&current)?;
        validate_exceptions(&current)?;
        let diff = diff_exceptions(&snapshot.exceptions, &current);
        render::print_plan(&plan_exception_operations(&diff));
        return Ok(());
    }

    let report = ctx.sync.apply_exceptions(&snapshot, current).await?;
    render::finish_report(report)
}
