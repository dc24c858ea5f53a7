use noura_availability::components::availability::{
    EffectiveAvailability, ExceptionEntry, TimeInterval,
};
use noura_availability::components::sync::{SyncOperation, SyncOutcome, SyncReport};
use noura_availability::error::{AppResult, Error};

/// Localized weekday name, 0 = Sunday
pub fn day_name(day: u8) -> String {
    match day {
        0 => t!("weekday_0").to_string(),
        1 => t!("weekday_1").to_string(),
        2 => t!("weekday_2").to_string(),
        3 => t!("weekday_3").to_string(),
        4 => t!("weekday_4").to_string(),
        5 => t!("weekday_5").to_string(),
        6 => t!("weekday_6").to_string(),
        _ => day.to_string(),
    }
}

pub fn interval(interval: &TimeInterval) -> String {
    format!("{}-{}", interval.start_time, interval.end_time)
}

pub fn intervals(intervals: &[TimeInterval]) -> String {
    if intervals.is_empty() {
        return t!("unavailable").to_string();
    }
    intervals.iter().map(interval).collect::<Vec<_>>().join(", ")
}

pub fn effective(availability: &EffectiveAvailability) -> String {
    if availability.is_available {
        intervals(&availability.intervals)
    } else {
        t!("unavailable").to_string()
    }
}

pub fn exception(entry: &ExceptionEntry) -> String {
    let status = match (entry.window(), entry.is_available) {
        (None, true) => t!("available_all_day").to_string(),
        (None, false) => t!("unavailable_all_day").to_string(),
        (Some(window), true) => t!("available_window", window = interval(&window)).to_string(),
        (Some(window), false) => {
            t!("unavailable_window", window = interval(&window)).to_string()
        }
    };

    if entry.is_synced() {
        status
    } else {
        format!("{} {}", status, t!("not_synced"))
    }
}

pub fn print_plan(operations: &[SyncOperation]) {
    if operations.is_empty() {
        println!("{}", t!("nothing_to_sync"));
        return;
    }
    println!("{}", t!("dry_run_header"));
    for operation in operations {
        println!("  {}", operation);
    }
}

/// Print a sync report and turn a partial run into an error
pub fn finish_report(report: SyncReport) -> AppResult<()> {
    if report.completed.is_empty() && report.is_complete() {
        println!("{}", t!("nothing_to_sync"));
        return Ok(());
    }

    println!("{}", t!("sync_completed", count = report.completed.len()));
    for completed in report.neutralized() {
        if let SyncOutcome::Neutralized { exception, .. } = &completed.outcome {
            println!("  {}", t!("sync_neutralized", date = exception.date));
        }
    }
    for operation in &report.pending {
        println!("  {}", t!("sync_pending", operation = operation.to_string()));
    }
    if report.cancelled {
        println!("{}", t!("sync_cancelled"));
        return Err(Error::Cancelled);
    }

    match report.failed {
        Some(failed) => {
            println!(
                "{}",
                t!(
                    "sync_failed",
                    operation = failed.operation.to_string(),
                    error = failed.error.to_string()
                )
            );
            Err(failed.error)
        }
        None => Ok(()),
    }
}
