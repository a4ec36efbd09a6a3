use chrono::{IsoWeek, NaiveDate};
use serde::Serialize;

use crate::domain::{ActivitySummary, MinuteSlot, TodayProjection};

#[derive(Debug, Serialize)]
pub struct TableRow {
    pub key: String,
    pub active_hours: f64,
}

/// Renders the fixed status template from today's projection.
pub fn format_report(summary: &ActivitySummary) -> String {
    let today = &summary.today;
    let active = today.active_minutes();
    let (hours_active, minutes_active) = (active / 60, active % 60);
    let (hours_remaining, minutes_remaining) =
        (today.remaining_minutes / 60, today.remaining_minutes % 60);

    format!(
        "### Today's status:\n\
         **Current state**: {state}\n\
         **Active time today**: {hours_active} hours {minutes_active} minutes\n\
         **To complete 8 hour work day**:\n\
         * remaining time: {hours_remaining} hours {minutes_remaining} minutes\n\
         * expected completion time: {completion}\n",
        state = if today.currently_active { "ACTIVE" } else { "IDLE" },
        completion = today.expected_completion.format("%H:%M:%S"),
    )
}

pub fn week_label(week: IsoWeek) -> String {
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn daily_rows(daily: &[(NaiveDate, f64)]) -> Vec<TableRow> {
    daily
        .iter()
        .map(|(date, hours)| TableRow {
            key: date.format("%Y-%m-%d").to_string(),
            active_hours: *hours,
        })
        .collect()
}

pub fn weekly_rows(weekly: &[(IsoWeek, f64)]) -> Vec<TableRow> {
    weekly
        .iter()
        .map(|(week, hours)| TableRow {
            key: week_label(*week),
            active_hours: *hours,
        })
        .collect()
}

pub fn print_rows(rows: &[TableRow]) {
    for row in rows {
        println!("{} | {:>6.2}", row.key, row.active_hours);
    }
}

pub fn rows_json(rows: &[TableRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

pub fn print_today(projection: &TodayProjection) {
    for slot in &projection.slots {
        println!(
            "{} | {} | {:>3} | {:>6.2}",
            slot.timestamp.format("%H:%M"),
            if slot.is_active { "active" } else { "idle  " },
            slot.cumulative_activity,
            slot.remaining_hours,
        );
    }
}

pub fn today_json(projection: &TodayProjection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&projection.slots)
}

pub fn print_timeline(timeline: &[MinuteSlot]) {
    for slot in timeline {
        println!(
            "{} {} | {}",
            slot.date().format("%Y-%m-%d"),
            slot.time_of_day().format("%H:%M"),
            if slot.is_active { "active" } else { "idle" },
        );
    }
}

pub fn timeline_json(timeline: &[MinuteSlot]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(timeline)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, NaiveDate};

    use crate::domain::{IdleSample, activity_instants, analyze, floor_to_minute};

    use super::{format_report, week_label, weekly_rows};

    #[test]
    fn report_follows_the_fixed_template() {
        let samples = [IdleSample {
            timestamp: 1_700_000_000,
            idle_time_ms: 0,
        }];
        let instant = activity_instants(&samples)[0];
        let now = floor_to_minute(instant) + Duration::minutes(5);
        let summary = analyze(&samples, &[], now).expect("analysis should succeed");

        // All 5 minutes smoothed to active.
        let report = format_report(&summary);
        let expected_completion = summary.today.expected_completion.format("%H:%M:%S");
        assert!(report.starts_with("### Today's status:\n"));
        assert!(report.contains("**Current state**: ACTIVE\n"));
        assert!(report.contains(&format!(
            "* expected completion time: {expected_completion}\n"
        )));
        assert!(report.contains("**To complete 8 hour work day**:\n"));
    }

    #[test]
    fn active_and_remaining_minutes_use_divmod() {
        let samples = [IdleSample {
            timestamp: 1_700_000_000,
            idle_time_ms: 0,
        }];
        let instant = activity_instants(&samples)[0];
        let now = floor_to_minute(instant) + Duration::minutes(5);
        let mut summary = analyze(&samples, &[], now).expect("analysis should succeed");

        summary.today.slots.last_mut().unwrap().cumulative_activity = 125;
        summary.today.remaining_minutes = 480 - 125;
        let report = format_report(&summary);
        assert!(report.contains("**Active time today**: 2 hours 5 minutes\n"));
        assert!(report.contains("* remaining time: 5 hours 55 minutes\n"));
    }

    #[test]
    fn negative_remaining_time_keeps_its_sign() {
        let samples = [IdleSample {
            timestamp: 1_700_000_000,
            idle_time_ms: 0,
        }];
        let instant = activity_instants(&samples)[0];
        let now = floor_to_minute(instant) + Duration::minutes(5);
        let mut summary = analyze(&samples, &[], now).expect("analysis should succeed");

        summary.today.remaining_minutes = -30;
        let report = format_report(&summary);
        assert!(report.contains("* remaining time: 0 hours -30 minutes\n"));
    }

    #[test]
    fn week_labels_use_the_iso_week_year() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_label(date.iso_week()), "2024-W01");

        // 2023-01-01 is a Sunday and belongs to ISO week 52 of 2022.
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(week_label(date.iso_week()), "2022-W52");
    }

    #[test]
    fn weekly_rows_carry_labels_and_hours() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let rows = weekly_rows(&[(date.iso_week(), 7.5)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "2026-W32");
        assert!((rows[0].active_hours - 7.5).abs() < 1e-9);
    }
}
