//! Reference timezone resolution.
//!
//! # Responsibility
//! - Resolve the configured IANA zone that governs exam deadlines.
//! - Fall back to a fixed CET/CEST offset when the zone cannot be loaded.
//!
//! # Invariants
//! - Resolution never fails; a usable zone is always returned.
//! - The fallback follows the European summer time rule evaluated in UTC.
//!   It is an approximation: zones that do not follow that rule, or
//!   instants right at a transition, may get the wrong offset.

use crate::time::clock::Clock;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use log::warn;
use std::fmt::{Display, Formatter};

/// Zone used when no zone is configured.
pub const DEFAULT_ZONE_NAME: &str = "Europe/Berlin";

const CET_OFFSET_SECS: i32 = 3600;
const CEST_OFFSET_SECS: i32 = 2 * 3600;

/// Timezone every "now" and every exam date is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceZone {
    /// Zone loaded from the tz database.
    Named(Tz),
    /// Fixed-offset fallback with its abbreviation.
    Fixed {
        label: &'static str,
        offset: FixedOffset,
    },
}

impl ReferenceZone {
    /// Expresses `instant` as local time in this zone.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Named(tz) => {
                let local = instant.with_timezone(tz);
                local.with_timezone(&local.offset().fix())
            }
            Self::Fixed { offset, .. } => instant.with_timezone(offset),
        }
    }

    /// Returns the first instant of `date` in this zone.
    ///
    /// Midnight inside a DST gap resolves to the first valid hour after it.
    pub fn midnight(&self, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        match self {
            Self::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
                .map(|local| local.with_timezone(&local.offset().fix())),
            Self::Fixed { offset, .. } => offset.from_local_datetime(&naive).single(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }
}

impl Display for ReferenceZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(tz) => write!(f, "{}", tz.name()),
            Self::Fixed { label, offset } => write!(f, "{label}({offset})"),
        }
    }
}

/// Resolves the reference zone by name, with a fixed-offset fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneResolver {
    zone_name: String,
}

impl Default for ZoneResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE_NAME)
    }
}

impl ZoneResolver {
    pub fn new(zone_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
        }
    }

    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Returns the current instant in the reference zone plus the zone itself.
    ///
    /// # Side effects
    /// - Emits a `zone_resolve` warning when the fallback offset is used.
    pub fn resolve<C: Clock + ?Sized>(&self, clock: &C) -> (DateTime<FixedOffset>, ReferenceZone) {
        let now = clock.now();
        let zone = self.zone_at(now);
        (zone.localize(now), zone)
    }

    /// Resolves the zone as it applies at `now`.
    pub fn zone_at(&self, now: DateTime<Utc>) -> ReferenceZone {
        match self.zone_name.trim().parse::<Tz>() {
            Ok(tz) => ReferenceZone::Named(tz),
            Err(err) => {
                let zone = fallback_zone(now);
                warn!(
                    "event=zone_resolve module=time status=fallback zone={} fallback={} error={}",
                    self.zone_name, zone, err
                );
                zone
            }
        }
    }
}

/// Picks CEST or CET for `now` by the European summer time rule.
pub fn fallback_zone(now: DateTime<Utc>) -> ReferenceZone {
    let (label, secs) = if is_european_summer_time(now) {
        ("CEST", CEST_OFFSET_SECS)
    } else {
        ("CET", CET_OFFSET_SECS)
    };
    let offset = FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix());
    ReferenceZone::Fixed { label, offset }
}

/// Summer time runs from 01:00 UTC on the last Sunday of March until
/// 01:00 UTC on the last Sunday of October.
fn is_european_summer_time(now: DateTime<Utc>) -> bool {
    let year = now.year();
    match (transition_instant(year, 3), transition_instant(year, 10)) {
        (Some(start), Some(end)) => now >= start && now < end,
        _ => false,
    }
}

fn transition_instant(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let sunday = last_sunday_of(year, month)?;
    Some(Utc.from_utc_datetime(&sunday.and_hms_opt(1, 0, 0)?))
}

fn last_sunday_of(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last_day = first_of_next.pred_opt()?;
    let back = i64::from(last_day.weekday().num_days_from_sunday());
    let sunday = last_day - Duration::days(back);
    debug_assert_eq!(sunday.weekday(), Weekday::Sun);
    Some(sunday)
}

#[cfg(test)]
mod tests {
    use super::{fallback_zone, last_sunday_of, ReferenceZone, ZoneResolver};
    use crate::time::clock::FixedClock;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn resolves_named_zone_with_its_current_offset() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2027, 7, 1, 10, 0, 0).unwrap());
        let (now, zone) = ZoneResolver::new("Europe/Berlin").resolve(&clock);

        assert!(matches!(zone, ReferenceZone::Named(_)));
        assert_eq!(now.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(now.to_rfc3339(), "2027-07-01T12:00:00+02:00");
    }

    #[test]
    fn unknown_zone_falls_back_to_cet_in_winter_and_cest_in_summer() {
        let resolver = ZoneResolver::new("Mars/Olympus_Mons");

        let winter = FixedClock::new(Utc.with_ymd_and_hms(2027, 1, 15, 12, 0, 0).unwrap());
        let (now, zone) = resolver.resolve(&winter);
        assert!(zone.is_fallback());
        assert_eq!(now.offset().local_minus_utc(), 3600);

        let summer = FixedClock::new(Utc.with_ymd_and_hms(2027, 8, 15, 12, 0, 0).unwrap());
        let (now, zone) = resolver.resolve(&summer);
        assert!(zone.is_fallback());
        assert_eq!(now.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn fallback_switches_at_european_transition_instants() {
        // 2027: last Sunday of March is the 28th, of October the 31st.
        let before = Utc.with_ymd_and_hms(2027, 3, 28, 0, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2027, 3, 28, 1, 0, 0).unwrap();
        assert_eq!(fallback_zone(before).to_string(), "CET(+01:00)");
        assert_eq!(fallback_zone(after).to_string(), "CEST(+02:00)");

        let autumn = Utc.with_ymd_and_hms(2027, 10, 31, 1, 0, 0).unwrap();
        assert_eq!(fallback_zone(autumn).to_string(), "CET(+01:00)");
    }

    #[test]
    fn last_sunday_handles_december() {
        assert_eq!(
            last_sunday_of(2027, 12),
            NaiveDate::from_ymd_opt(2027, 12, 26)
        );
    }

    #[test]
    fn midnight_is_start_of_local_day() {
        let zone = ZoneResolver::default().zone_at(Utc::now());
        let date = NaiveDate::from_ymd_opt(2027, 1, 10).unwrap();
        let midnight = zone.midnight(date).expect("midnight should exist");
        assert_eq!(midnight.to_rfc3339(), "2027-01-10T00:00:00+01:00");
    }

    #[test]
    fn midnight_in_dst_gap_moves_to_first_valid_hour() {
        // Santiago switches to summer time at local midnight.
        let zone = ZoneResolver::new("America/Santiago").zone_at(Utc::now());
        let date = NaiveDate::from_ymd_opt(2026, 9, 6).unwrap();
        let start = zone.midnight(date).expect("day start should exist");
        assert_eq!(start.date_naive(), date);
        assert_eq!(start.to_rfc3339(), "2026-09-06T01:00:00-03:00");
    }
}
