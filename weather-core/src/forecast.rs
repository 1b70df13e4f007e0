//! Day-bucketed forecast aggregation and chronological rendering.

use chrono::TimeZone;
use std::collections::HashMap;

use crate::model::{DayKey, DaySummary, ForecastSample, UnitSystem};

/// Label format for a forecast day, e.g. `Mon Jan 02`.
pub const DAY_LABEL_FORMAT: &str = "%a %b %d";

/// Reduce forecast samples to one summary per calendar day in `tz`.
///
/// Bounds are tracked independently: `min_temp` is the lowest `temp_min`
/// and `max_temp` the highest `temp_max` seen for the day. The condition is
/// taken from the first sample of each day and never replaced.
pub fn aggregate<Tz: TimeZone>(
    samples: &[ForecastSample],
    tz: &Tz,
) -> HashMap<DayKey, DaySummary> {
    let mut days: HashMap<DayKey, DaySummary> = HashMap::new();

    for sample in samples {
        let day = sample.timestamp.with_timezone(tz).date_naive();

        days.entry(day)
            .and_modify(|summary| {
                summary.min_temp = summary.min_temp.min(sample.temp_min);
                summary.max_temp = summary.max_temp.max(sample.temp_max);
            })
            .or_insert_with(|| DaySummary {
                day,
                min_temp: sample.temp_min,
                max_temp: sample.temp_max,
                condition: sample.condition.clone(),
            });
    }

    days
}

/// Render one line per day, ordered by date.
pub fn render(summaries: &HashMap<DayKey, DaySummary>, unit: UnitSystem) -> Vec<String> {
    let mut days: Vec<&DayKey> = summaries.keys().collect();
    days.sort_unstable();

    let symbol = unit.temperature_symbol();

    days.into_iter()
        .map(|day| {
            let summary = &summaries[day];
            format!(
                "{} - High: {:.1}°{symbol}, Low: {:.1}°{symbol}, {}",
                day.format(DAY_LABEL_FORMAT),
                summary.max_temp,
                summary.min_temp,
                summary.condition,
            )
        })
        .collect()
}
