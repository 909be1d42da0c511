//! Change frequency and priority estimates for records without explicit
//! overrides.

use chrono::{DateTime, Utc};
use sitemapr_core::{ChangeFreq, Record};

/// Priority used when nothing else applies.
pub const DEFAULT_PRIORITY: f32 = 0.5;

/// Lowest priority the depth-based strategy hands out.
pub const MIN_DEPTH_PRIORITY: f32 = 0.1;

const HOUR: f64 = 60.0 * 60.0;
const DAY: f64 = HOUR * 24.0;

/// How a class's items get their `<priority>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorityStrategy {
    /// Fixed value registered for the class.
    Override(f32),
    /// `max(0.1, 1.0 - depth / 10)`; root records get 1.0.
    DepthBased,
    /// [`DEFAULT_PRIORITY`].
    Default,
}

impl PriorityStrategy {
    pub fn compute(&self, record: &Record) -> f32 {
        match self {
            Self::Override(priority) => priority.clamp(0.0, 1.0),
            Self::DepthBased => depth_priority(record.depth),
            Self::Default => DEFAULT_PRIORITY,
        }
    }
}

/// Priority for a record `depth` levels below the root.
pub fn depth_priority(depth: usize) -> f32 {
    let priority = 1.0 - depth as f64 / 10.0;
    // Round to one decimal so 1.0 - 3/10 reads 0.7, not 0.7000000000000001.
    let priority = (priority.max(f64::from(MIN_DEPTH_PRIORITY)) * 10.0).round() / 10.0;
    priority as f32
}

/// Change frequency for a record.
///
/// A registered override wins. Otherwise the record's lifetime is divided by
/// its version count plus one (an unversioned record divides by one), and the
/// resulting average edit period is mapped onto the sitemap vocabulary.
/// Records without a creation time count as created `now`, so they come out
/// as `always`.
pub fn change_frequency(
    override_freq: Option<ChangeFreq>,
    record: &Record,
    now: DateTime<Utc>,
) -> ChangeFreq {
    if let Some(freq) = override_freq {
        return freq;
    }

    let created = record.created.unwrap_or(now);
    let age = (now - created).num_milliseconds() as f64 / 1000.0;
    let versions = record.version.unwrap_or(0);
    let period = age / (f64::from(versions) + 1.0);

    frequency_for_period(period)
}

/// Map an average edit period in seconds onto a change frequency.
/// `never` is not produced.
pub fn frequency_for_period(period_secs: f64) -> ChangeFreq {
    if period_secs > DAY * 365.0 {
        ChangeFreq::Yearly
    } else if period_secs > DAY * 30.0 {
        ChangeFreq::Monthly
    } else if period_secs > DAY * 7.0 {
        ChangeFreq::Weekly
    } else if period_secs > DAY {
        ChangeFreq::Daily
    } else if period_secs > HOUR {
        ChangeFreq::Hourly
    } else {
        ChangeFreq::Always
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn created_ago(age: Duration, version: Option<u32>) -> Record {
        let mut record = Record::new("SiteTree", 1, now());
        record.created = Some(now() - age);
        record.version = version;
        record
    }

    #[test]
    fn test_override_wins() {
        let record = created_ago(Duration::days(900), None);
        assert_eq!(
            change_frequency(Some(ChangeFreq::Never), &record, now()),
            ChangeFreq::Never
        );
    }

    #[test]
    fn test_period_boundaries() {
        let cases = [
            (Duration::days(366), ChangeFreq::Yearly),
            (Duration::days(365), ChangeFreq::Monthly),
            (Duration::days(31), ChangeFreq::Monthly),
            (Duration::days(30), ChangeFreq::Weekly),
            (Duration::days(8), ChangeFreq::Weekly),
            (Duration::days(7), ChangeFreq::Daily),
            (Duration::days(2), ChangeFreq::Daily),
            (Duration::days(1), ChangeFreq::Hourly),
            (Duration::seconds(3601), ChangeFreq::Hourly),
            (Duration::hours(1), ChangeFreq::Always),
            (Duration::seconds(30), ChangeFreq::Always),
        ];
        for (age, expected) in cases {
            let record = created_ago(age, None);
            assert_eq!(change_frequency(None, &record, now()), expected, "age {age}");
        }
    }

    #[test]
    fn test_versions_shorten_period() {
        // 100 days over 9 versions: 10 days per edit.
        let record = created_ago(Duration::days(100), Some(9));
        assert_eq!(change_frequency(None, &record, now()), ChangeFreq::Weekly);

        let record = created_ago(Duration::days(3), Some(1));
        assert_eq!(change_frequency(None, &record, now()), ChangeFreq::Daily);

        let record = created_ago(Duration::days(366), Some(0));
        assert_eq!(change_frequency(None, &record, now()), ChangeFreq::Yearly);
    }

    #[test]
    fn test_missing_created_is_always() {
        let record = Record::new("SiteTree", 1, now());
        assert_eq!(change_frequency(None, &record, now()), ChangeFreq::Always);
    }

    #[test]
    fn test_period_thresholds_are_exclusive() {
        assert_eq!(frequency_for_period(DAY * 365.0 + 1.0), ChangeFreq::Yearly);
        assert_eq!(frequency_for_period(DAY * 365.0), ChangeFreq::Monthly);
        assert_eq!(frequency_for_period(HOUR + 1.0), ChangeFreq::Hourly);
        assert_eq!(frequency_for_period(HOUR), ChangeFreq::Always);
        assert_eq!(frequency_for_period(30.0), ChangeFreq::Always);
    }

    #[test]
    fn test_depth_priority() {
        assert_eq!(depth_priority(0), 1.0);
        assert_eq!(depth_priority(3), 0.7);
        assert_eq!(depth_priority(5), 0.5);
        assert_eq!(depth_priority(9), 0.1);
        assert_eq!(depth_priority(15), 0.1);
    }

    #[test]
    fn test_strategies() {
        let mut record = Record::new("SiteTree", 1, now());
        record.depth = 2;

        assert_eq!(PriorityStrategy::Override(0.3).compute(&record), 0.3);
        assert_eq!(PriorityStrategy::DepthBased.compute(&record), 0.8);
        assert_eq!(PriorityStrategy::Default.compute(&record), DEFAULT_PRIORITY);
    }
}
