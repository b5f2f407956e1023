use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::model::{ForecastDay, ForecastSample};

/// Number of days the dashboard forecast shows.
pub const FORECAST_DAYS: usize = 5;

/// Fold 3-hour samples into one summary per UTC calendar day.
///
/// The first sample seen for a date provides every representative field;
/// later samples of the same date only widen the temperature range. At most
/// [`FORECAST_DAYS`] days are returned, earliest first.
pub fn aggregate_daily(samples: &[ForecastSample]) -> Vec<ForecastDay> {
    let mut days: BTreeMap<NaiveDate, ForecastDay> = BTreeMap::new();

    for sample in samples {
        let Some(date) = utc_date(sample.timestamp) else {
            tracing::debug!(
                timestamp = sample.timestamp,
                "skipping forecast sample with invalid timestamp"
            );
            continue;
        };

        days.entry(date)
            .and_modify(|day| {
                day.temp_min_c = day.temp_min_c.min(sample.temp_min_c);
                day.temp_max_c = day.temp_max_c.max(sample.temp_max_c);
            })
            .or_insert_with(|| ForecastDay::from(sample));
    }

    days.into_values().take(FORECAST_DAYS).collect()
}

fn utc_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-04 00:00:00 UTC
    const DAY0: i64 = 1_709_510_400;
    const HOUR: i64 = 3_600;
    const DAY: i64 = 24 * HOUR;

    fn sample(timestamp: i64, min: i32, max: i32, condition: &str) -> ForecastSample {
        ForecastSample {
            timestamp,
            temp_min_c: min,
            temp_max_c: max,
            condition: condition.to_string(),
            description: condition.to_lowercase(),
            icon: "01d".to_string(),
            humidity_pct: 50,
            wind_speed_kmh: 10,
            precipitation_chance_pct: 20,
        }
    }

    #[test]
    fn empty_input_yields_no_days() {
        assert!(aggregate_daily(&[]).is_empty());
    }

    #[test]
    fn single_sample_becomes_one_day() {
        let s = sample(DAY0 + 9 * HOUR, 14, 14, "Clear");
        let days = aggregate_daily(std::slice::from_ref(&s));

        assert_eq!(days.len(), 1);
        assert_eq!(days[0], ForecastDay::from(&s));
        assert_eq!(days[0].temp_min_c, 14);
        assert_eq!(days[0].temp_max_c, 14);
    }

    #[test]
    fn same_day_samples_widen_range_and_keep_first_fields() {
        let samples = vec![
            sample(DAY0 + 6 * HOUR, 8, 10, "Clear"),
            sample(DAY0 + 12 * HOUR, 13, 17, "Rain"),
            sample(DAY0 + 21 * HOUR, 5, 7, "Clouds"),
        ];

        let days = aggregate_daily(&samples);
        assert_eq!(days.len(), 1);

        let day = &days[0];
        assert_eq!(day.date, DAY0 + 6 * HOUR);
        assert_eq!(day.temp_min_c, 5);
        assert_eq!(day.temp_max_c, 17);
        assert_eq!(day.condition, "Clear");
        assert_eq!(day.precipitation_chance_pct, 20);
    }

    #[test]
    fn reordering_within_a_day_keeps_range() {
        let first = sample(DAY0 + 3 * HOUR, 9, 11, "Clouds");
        let a = sample(DAY0 + 9 * HOUR, 4, 6, "Rain");
        let b = sample(DAY0 + 15 * HOUR, 12, 19, "Clear");

        let forward = aggregate_daily(&[first.clone(), a.clone(), b.clone()]);
        let shuffled = aggregate_daily(&[first, b, a]);

        assert_eq!(forward, shuffled);
        assert_eq!(forward[0].temp_min_c, 4);
        assert_eq!(forward[0].temp_max_c, 19);
        assert_eq!(forward[0].condition, "Clouds");
    }

    #[test]
    fn groups_by_utc_date_and_caps_at_five_days() {
        let samples: Vec<_> = (0..7)
            .flat_map(|d| {
                let base = DAY0 + d * DAY;
                [
                    sample(base + 3 * HOUR, d as i32, d as i32 + 2, "Clear"),
                    sample(base + 15 * HOUR, d as i32 - 1, d as i32 + 5, "Rain"),
                ]
            })
            .collect();

        let days = aggregate_daily(&samples);
        assert_eq!(days.len(), FORECAST_DAYS);

        for (i, day) in days.iter().enumerate() {
            let d = i as i64;
            assert_eq!(day.date, DAY0 + d * DAY + 3 * HOUR);
            assert_eq!(day.temp_min_c, i as i32 - 1);
            assert_eq!(day.temp_max_c, i as i32 + 5);
        }
    }

    #[test]
    fn output_is_chronological_even_if_input_is_not() {
        let samples = vec![
            sample(DAY0 + DAY + HOUR, 1, 2, "Rain"),
            sample(DAY0 + HOUR, 3, 4, "Clear"),
        ];

        let days = aggregate_daily(&samples);
        assert_eq!(days.len(), 2);
        assert!(days[0].date < days[1].date);
        assert_eq!(days[0].condition, "Clear");
    }
}
