use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{
    Datelike, Duration, IsoWeek, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike,
};
use serde::Serialize;

pub const WORK_DAY_MINUTES: i64 = 8 * 60;
pub const SMOOTHING_THRESHOLD_MINUTES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSample {
    pub timestamp: i64,
    pub idle_time_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinuteSlot {
    pub timestamp: NaiveDateTime,
    pub is_active: bool,
}

impl MinuteSlot {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.timestamp.time()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideInterval {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TodaySlot {
    pub timestamp: NaiveDateTime,
    pub is_active: bool,
    pub cumulative_activity: i64,
    pub remaining_hours: f64,
}

#[derive(Debug, Clone)]
pub struct TodayProjection {
    pub slots: Vec<TodaySlot>,
    pub currently_active: bool,
    pub remaining_minutes: i64,
    pub expected_completion: NaiveTime,
}

impl TodayProjection {
    pub fn active_minutes(&self) -> i64 {
        self.slots
            .last()
            .map(|slot| slot.cumulative_activity)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct ActivitySummary {
    pub timeline: Vec<MinuteSlot>,
    pub today: TodayProjection,
    pub daily: Vec<(NaiveDate, f64)>,
    pub weekly: Vec<(IsoWeek, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityError {
    NoActivity,
    NothingToday,
}

impl Display for ActivityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityError::NoActivity => {
                write!(f, "idle log contains no activity samples")
            }
            ActivityError::NothingToday => {
                write!(f, "timeline has no slots after today's midnight")
            }
        }
    }
}

impl std::error::Error for ActivityError {}

/// One activity instant per sample: the sample time minus the reported idle
/// duration, rounded to the nearest second. Deduplicated, ascending.
pub fn activity_instants(samples: &[IdleSample]) -> Vec<NaiveDateTime> {
    let mut instants = Vec::with_capacity(samples.len());
    for sample in samples {
        let millis = sample.timestamp * 1000 - sample.idle_time_ms;
        let epoch = (millis + 500).div_euclid(1000);
        instants.push(local_from_epoch(epoch));
    }
    instants.sort();
    instants.dedup();
    instants
}

pub fn build_timeline(
    instants: &[NaiveDateTime],
    now: NaiveDateTime,
) -> Result<Vec<MinuteSlot>, ActivityError> {
    let earliest = instants
        .iter()
        .min()
        .copied()
        .ok_or(ActivityError::NoActivity)?;

    let mut slots = Vec::new();
    let mut cursor = floor_to_minute(earliest);
    while cursor < now {
        slots.push(MinuteSlot {
            timestamp: cursor,
            is_active: false,
        });
        cursor += Duration::minutes(1);
    }

    Ok(slots)
}

pub fn mark_instants(timeline: &mut [MinuteSlot], instants: &[NaiveDateTime]) {
    for instant in instants {
        set_active(timeline, floor_to_minute(*instant));
    }
}

pub fn mark_overrides(timeline: &mut [MinuteSlot], overrides: &[OverrideInterval]) {
    for interval in overrides {
        let mut minute = floor_to_minute(interval.start);
        while minute < interval.stop {
            set_active(timeline, minute);
            minute += Duration::minutes(1);
        }
    }
}

// Only ever flips false -> true, so the two marking passes commute and
// repeating either changes nothing. Minutes outside the timeline are ignored.
fn set_active(timeline: &mut [MinuteSlot], minute: NaiveDateTime) {
    let Some(first) = timeline.first() else {
        return;
    };
    let offset = (minute - first.timestamp).num_minutes();
    if offset >= 0 && (offset as usize) < timeline.len() {
        timeline[offset as usize].is_active = true;
    }
}

/// Forces every run of fewer than ten equal-valued minutes to active, in one
/// pass over the original run boundaries. Short idle runs are treated as
/// measurement noise; runs of ten minutes or more are genuine breaks.
pub fn smooth_gaps(mut timeline: Vec<MinuteSlot>) -> Vec<MinuteSlot> {
    let mut run_start = 0;
    while run_start < timeline.len() {
        let value = timeline[run_start].is_active;
        let mut run_end = run_start + 1;
        while run_end < timeline.len() && timeline[run_end].is_active == value {
            run_end += 1;
        }
        if run_end - run_start < SMOOTHING_THRESHOLD_MINUTES {
            for slot in &mut timeline[run_start..run_end] {
                slot.is_active = true;
            }
        }
        run_start = run_end;
    }
    timeline
}

pub fn daily_activity(timeline: &[MinuteSlot]) -> Vec<(NaiveDate, f64)> {
    let mut totals: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for slot in timeline {
        let active_minutes = totals.entry(slot.date()).or_insert(0);
        if slot.is_active {
            *active_minutes += 1;
        }
    }
    totals
        .into_iter()
        .map(|(date, active)| (date, f64::from(active) / 60.0))
        .collect()
}

pub fn weekly_activity(timeline: &[MinuteSlot]) -> Vec<(IsoWeek, f64)> {
    let mut totals: BTreeMap<IsoWeek, u32> = BTreeMap::new();
    for slot in timeline {
        let active_minutes = totals.entry(slot.date().iso_week()).or_insert(0);
        if slot.is_active {
            *active_minutes += 1;
        }
    }
    totals
        .into_iter()
        .map(|(week, active)| (week, f64::from(active) / 60.0))
        .collect()
}

pub fn today_projection(
    timeline: &[MinuteSlot],
    now: NaiveDateTime,
) -> Result<TodayProjection, ActivityError> {
    let midnight = midnight_of(now);
    let currently_active = timeline
        .last()
        .map(|slot| slot.is_active)
        .unwrap_or(false);

    let mut slots = Vec::new();
    let mut cumulative = 0i64;
    for slot in timeline.iter().filter(|slot| slot.timestamp > midnight) {
        if slot.is_active {
            cumulative += 1;
        }
        slots.push(TodaySlot {
            timestamp: slot.timestamp,
            is_active: slot.is_active,
            cumulative_activity: cumulative,
            remaining_hours: (WORK_DAY_MINUTES - cumulative) as f64 / 60.0,
        });
    }

    let last = slots.last().ok_or(ActivityError::NothingToday)?;
    let remaining_minutes = WORK_DAY_MINUTES - last.cumulative_activity;
    let expected_completion = (last.timestamp + Duration::minutes(remaining_minutes)).time();

    Ok(TodayProjection {
        slots,
        currently_active,
        remaining_minutes,
        expected_completion,
    })
}

/// Runs the whole pipeline: reconstruct activity instants, build the minute
/// grid up to `now`, mark sensor and override activity, smooth short gaps,
/// then derive the daily, weekly and today views.
pub fn analyze(
    samples: &[IdleSample],
    overrides: &[OverrideInterval],
    now: NaiveDateTime,
) -> Result<ActivitySummary, ActivityError> {
    let instants = activity_instants(samples);
    let mut timeline = build_timeline(&instants, now)?;
    mark_instants(&mut timeline, &instants);
    mark_overrides(&mut timeline, overrides);
    let timeline = smooth_gaps(timeline);

    let daily = daily_activity(&timeline);
    let weekly = weekly_activity(&timeline);
    let today = today_projection(&timeline, now)?;

    Ok(ActivitySummary {
        timeline,
        today,
        daily,
        weekly,
    })
}

pub fn midnight_of(now: NaiveDateTime) -> NaiveDateTime {
    now.date()
        .and_hms_opt(0, 0, 0)
        .expect("midnight must be valid")
}

pub fn floor_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    let time = timestamp.time();
    let floored = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
        .expect("minute floor must be valid");
    NaiveDateTime::new(timestamp.date(), floored)
}

fn local_from_epoch(epoch_seconds: i64) -> NaiveDateTime {
    match Local.timestamp_opt(epoch_seconds, 0) {
        LocalResult::Single(datetime) => datetime.naive_local(),
        LocalResult::Ambiguous(first, second) => first.min(second).naive_local(),
        LocalResult::None => chrono::DateTime::from_timestamp(epoch_seconds, 0)
            .map(|datetime| datetime.naive_utc())
            .unwrap_or_default(),
    }
}
