use super::{print_json, read_json, render, CommandContext};
use noura_availability::components::availability::grouping::{
    localize_exception, localize_weekly_entries, weekly_local_view,
};
use noura_availability::components::availability::{
    format_partial_time, is_valid_time, reduce, resolve_effective_availability, resolve_week,
    DraftAction, WeeklyDraft, WeeklySchedule,
};
use noura_availability::components::sync::executor::plan_weekly_operations;
use noura_availability::components::sync::SyncedSnapshot;
use noura_availability::error::{other_error, AppResult};
use noura_availability::utils::time::{
    day_of_week, format_date, get_weekly_date_range, parse_date, today_in,
};
use std::path::Path;
use tracing::info;

/// Print the weekly pattern in local time
pub async fn weekly(ctx: &CommandContext, json: bool) -> AppResult<()> {
    let entries = ctx.sync.fetch_weekly().await?;

    if json {
        let draft = WeeklyDraft::from_entries(&localize_weekly_entries(&entries, &ctx.codec));
        return print_json(&draft.days());
    }

    for (day, intervals) in weekly_local_view(&entries, &ctx.codec) {
        println!("{:<10} {}", render::day_name(day), render::intervals(&intervals));
    }
    Ok(())
}

/// Both lists shifted into the display zone
fn local_snapshot(ctx: &CommandContext, snapshot: &SyncedSnapshot) -> SyncedSnapshot {
    SyncedSnapshot {
        weekly: localize_weekly_entries(&snapshot.weekly, &ctx.codec),
        exceptions: snapshot
            .exceptions
            .iter()
            .map(|entry| localize_exception(entry, &ctx.codec))
            .collect(),
    }
}

fn parse_date_arg(value: &str) -> AppResult<chrono::NaiveDate> {
    parse_date(value)
        .ok_or_else(|| other_error(&format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

pub async fn resolve(ctx: &CommandContext, date: &str) -> AppResult<()> {
    let date = parse_date_arg(date)?;
    let local = local_snapshot(ctx, &ctx.sync.snapshot().await?);

    let availability = resolve_effective_availability(&local.weekly, &local.exceptions, date);
    println!("{} {}", format_date(date), render::effective(&availability));
    Ok(())
}

pub async fn week(ctx: &CommandContext, date: Option<&str>) -> AppResult<()> {
    let date = match date {
        Some(value) => parse_date_arg(value)?,
        None => today_in(ctx.codec.zone()),
    };
    let local = local_snapshot(ctx, &ctx.sync.snapshot().await?);

    let (start, end) = get_weekly_date_range(date);
    println!("{}", t!("week_header", start = start, end = end));
    for (day, availability) in resolve_week(&local.weekly, &local.exceptions, date) {
        println!(
            "{} {:<10} {}",
            format_date(day),
            render::day_name(day_of_week(day)),
            render::effective(&availability)
        );
    }
    Ok(())
}

/// Build a draft from a schedule file or by folding actions over the current pattern
pub async fn set_weekly(
    ctx: &CommandContext,
    file: Option<&Path>,
    actions: Option<&Path>,
    dry_run: bool,
) -> AppResult<()> {
    let weekly = ctx.sync.fetch_weekly().await?;
    let baseline = WeeklyDraft::from_entries(&localize_weekly_entries(&weekly, &ctx.codec));

    let draft = match (file, actions) {
        (Some(path), _) => {
            let schedule: Vec<WeeklySchedule> = read_json(path)?;
            WeeklyDraft::from_schedule(schedule)
        }
        (None, Some(path)) => {
            let actions: Vec<DraftAction> = read_json(path)?;
            info!("Applying {} draft actions", actions.len());
            actions.into_iter().fold(baseline.clone(), |state, action| reduce(&state, action))
        }
        (None, None) => return Err(other_error("either --file or --actions is required")),
    };

    if dry_run {
        draft.validate()?;
        render::print_plan(&plan_weekly_operations(&baseline, &draft, &ctx.codec));
        return Ok(());
    }

    let report = ctx.sync.save_weekly(baseline, draft).await?;
    render::finish_report(report)
}

/// Reformat typed digits and say whether they form a full time
pub fn check_time(value: &str) {
    let formatted = format_partial_time(value);
    if is_valid_time(&formatted) {
        println!("{}", t!("time_valid", value = formatted));
    } else {
        println!("{}", t!("time_incomplete", value = formatted));
    }
}
