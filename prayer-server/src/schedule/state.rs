//! Current and next prayer relative to an instant.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use tracing::debug;

use crate::domain::Prayer;
use crate::solar::{SolveError, solve};

use super::DailySchedule;

/// An event with its time, possibly from the following day's schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledPrayer {
    pub prayer: Prayer,
    pub time: DateTime<FixedOffset>,
    /// True when taken from the schedule of the day after.
    pub tomorrow: bool,
}

/// Where `now` falls within a day's events.
///
/// Both fields are `None` when `now` lies outside the schedule's day and
/// the day after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrayerState {
    /// Latest event at or before `now`; `None` before fajr.
    pub current: Option<ScheduledPrayer>,
    /// First event after `now`.
    pub next: Option<ScheduledPrayer>,
}

impl PrayerState {
    pub const OUT_OF_RANGE: PrayerState = PrayerState {
        current: None,
        next: None,
    };

    pub fn is_out_of_range(&self) -> bool {
        self.current.is_none() && self.next.is_none()
    }

    /// "Next: Fajr at 04:12", or "Next: Fajr (tomorrow) at 04:12".
    pub fn next_label(&self) -> Option<String> {
        self.next.map(|next| {
            let when = if next.tomorrow { " (tomorrow)" } else { "" };
            format!(
                "Next: {}{} at {}",
                next.prayer,
                when,
                next.time.format("%H:%M")
            )
        })
    }
}

/// The current event's name, the next-event label when there is none, or
/// "None" out of range.
impl fmt::Display for PrayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.current, self.next_label()) {
            (Some(current), _) => write!(f, "{}", current.prayer),
            (None, Some(label)) => f.write_str(&label),
            (None, None) => f.write_str("None"),
        }
    }
}

/// Derive the current and next event for `now`.
///
/// Once isha has begun, the following day is solved with the same
/// location and parameters. Its events that have already started take
/// over `current`, and its first event after `now` (normally fajr) becomes
/// `next`. Instants before the schedule's day starts, or after the
/// following day's isha, give [`PrayerState::OUT_OF_RANGE`].
pub fn current_and_next(
    schedule: &DailySchedule,
    now: DateTime<Utc>,
) -> Result<PrayerState, SolveError> {
    let fajr = schedule.fajr();
    let day_start = schedule
        .date()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(*fajr.offset())
        .single()
        .map_or(fajr, |midnight| midnight.min(fajr));
    if now < day_start {
        debug!(%now, date = %schedule.date(), "instant precedes the schedule's day");
        return Ok(PrayerState::OUT_OF_RANGE);
    }

    let current = latest_at_or_before(schedule, now, false);
    if let Some(next) = first_after(schedule, now, false) {
        return Ok(PrayerState {
            current,
            next: Some(next),
        });
    }

    let date = schedule.date();
    let tomorrow_date = date.succ_opt().ok_or(SolveError::DateOutOfRange(date))?;
    let tomorrow = solve(tomorrow_date, schedule.location(), schedule.params())?;

    let Some(next) = first_after(&tomorrow, now, true) else {
        debug!(%now, %date, "instant is past the following day's schedule");
        return Ok(PrayerState::OUT_OF_RANGE);
    };
    debug!(prayer = %next.prayer, time = %next.time, "next event is from tomorrow's schedule");

    // An uncapped isha can run past the next fajr
    Ok(PrayerState {
        current: latest_at_or_before(&tomorrow, now, true).or(current),
        next: Some(next),
    })
}

fn latest_at_or_before(
    schedule: &DailySchedule,
    now: DateTime<Utc>,
    tomorrow: bool,
) -> Option<ScheduledPrayer> {
    schedule
        .events()
        .take_while(|(_, time)| *time <= now)
        .last()
        .map(|(prayer, time)| ScheduledPrayer {
            prayer,
            time,
            tomorrow,
        })
}

fn first_after(
    schedule: &DailySchedule,
    now: DateTime<Utc>,
    tomorrow: bool,
) -> Option<ScheduledPrayer> {
    schedule
        .events()
        .find(|(_, time)| *time > now)
        .map(|(prayer, time)| ScheduledPrayer {
            prayer,
            time,
            tomorrow,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    use crate::domain::{
        CalculationMethod, Coordinate, HighLatitudeRule, Location, MethodParams, offset_from_minutes,
    };

    fn mecca_schedule() -> DailySchedule {
        let location = Location::new(Coordinate::new(21.4225, 39.8262).unwrap())
            .with_utc_offset(offset_from_minutes(180).unwrap());
        solve(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &location,
            &CalculationMethod::UmmAlQura.params(),
        )
        .unwrap()
    }

    fn london_midsummer(params: &MethodParams) -> DailySchedule {
        let location = Location::new(Coordinate::new(51.5074, -0.1278).unwrap())
            .with_utc_offset(offset_from_minutes(60).unwrap());
        solve(NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(), &location, params).unwrap()
    }

    fn utc(t: DateTime<FixedOffset>) -> DateTime<Utc> {
        t.with_timezone(&Utc)
    }

    #[test]
    fn before_fajr_has_no_current() {
        let s = mecca_schedule();
        let state = current_and_next(&s, utc(s.fajr()) - Duration::minutes(30)).unwrap();

        assert_eq!(state.current, None);
        let next = state.next.unwrap();
        assert_eq!(next.prayer, Prayer::Fajr);
        assert_eq!(next.time, s.fajr());
        assert!(!next.tomorrow);

        let expected = format!("Next: Fajr at {}", s.fajr().format("%H:%M"));
        assert_eq!(state.to_string(), expected);
        assert_eq!(state.next_label(), Some(expected));
    }

    #[test]
    fn between_events() {
        let s = mecca_schedule();
        let state = current_and_next(&s, utc(s.dhuhr()) + Duration::minutes(5)).unwrap();

        assert_eq!(state.current.unwrap().prayer, Prayer::Dhuhr);
        assert_eq!(state.next.unwrap().prayer, Prayer::Asr);
        assert_eq!(state.to_string(), "Dhuhr");
    }

    #[test]
    fn tie_makes_event_current() {
        let s = mecca_schedule();
        let state = current_and_next(&s, utc(s.asr())).unwrap();

        assert_eq!(state.current.unwrap().prayer, Prayer::Asr);
        assert_eq!(state.next.unwrap().prayer, Prayer::Maghrib);
    }

    #[test]
    fn after_isha_rolls_over_to_tomorrow() {
        let s = mecca_schedule();
        let now = utc(s.isha()) + Duration::minutes(1);
        let state = current_and_next(&s, now).unwrap();

        assert_eq!(state.current.unwrap().prayer, Prayer::Isha);
        let next = state.next.unwrap();
        assert_eq!(next.prayer, Prayer::Fajr);
        assert!(next.tomorrow);
        assert_eq!(next.time.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert!(next.time - s.isha() > Duration::hours(6));

        let label = state.next_label().unwrap();
        assert!(label.starts_with("Next: Fajr (tomorrow) at "), "{label}");
        assert_eq!(state.to_string(), "Isha");
    }

    #[test]
    fn london_midsummer_isha_rolls_over_to_fajr() {
        let s = london_midsummer(&CalculationMethod::MuslimWorldLeague.params());
        let now = utc(s.isha()) + Duration::minutes(1);
        let state = current_and_next(&s, now).unwrap();

        let current = state.current.unwrap();
        assert_eq!(current.prayer, Prayer::Isha);
        assert!(!current.tomorrow);

        let next = state.next.unwrap();
        assert_eq!(next.prayer, Prayer::Fajr);
        assert!(next.tomorrow);
        assert!(next.time - s.isha() > Duration::hours(2));

        let label = state.next_label().unwrap();
        assert!(label.starts_with("Next: Fajr (tomorrow) at 02:"), "{label}");
    }

    #[test]
    fn half_night_caps_hand_over_to_tomorrows_events() {
        // Isha and the next fajr both land near 01:00 here
        let params = CalculationMethod::MuslimWorldLeague
            .params()
            .with_high_latitude_rule(HighLatitudeRule::MiddleOfTheNight);
        let s = london_midsummer(&params);
        let now = utc(s.isha()) + Duration::minutes(1);
        let state = current_and_next(&s, now).unwrap();

        let current = state.current.unwrap();
        let next = state.next.unwrap();
        assert!(current.time <= now);
        assert!(next.time > now);
        assert!(next.tomorrow);
        if next.prayer != Prayer::Fajr {
            assert_eq!(current.prayer, Prayer::Fajr);
            assert!(current.tomorrow);
            assert_eq!(next.prayer, Prayer::Sunrise);
        }
    }

    #[test]
    fn during_the_following_day() {
        let s = mecca_schedule();
        let tomorrow_dhuhr = utc(s.dhuhr()) + Duration::days(1);
        let state = current_and_next(&s, tomorrow_dhuhr + Duration::minutes(5)).unwrap();

        let current = state.current.unwrap();
        assert_eq!(current.prayer, Prayer::Dhuhr);
        assert!(current.tomorrow);
        let next = state.next.unwrap();
        assert_eq!(next.prayer, Prayer::Asr);
        assert!(next.tomorrow);
    }

    #[test]
    fn days_after_the_schedule_is_out_of_range() {
        let s = mecca_schedule();
        let state = current_and_next(&s, utc(s.isha()) + Duration::days(3)).unwrap();

        assert!(state.is_out_of_range());
        assert_eq!(state, PrayerState::OUT_OF_RANGE);
        assert_eq!(state.next_label(), None);
        assert_eq!(state.to_string(), "None");
    }

    #[test]
    fn before_the_schedule_is_out_of_range() {
        let s = mecca_schedule();
        let state = current_and_next(&s, utc(s.fajr()) - Duration::days(1)).unwrap();
        assert_eq!(state, PrayerState::OUT_OF_RANGE);
    }

    #[test]
    fn idempotent() {
        let s = mecca_schedule();
        let now = utc(s.maghrib()) + Duration::minutes(10);
        assert_eq!(
            current_and_next(&s, now).unwrap(),
            current_and_next(&s, now).unwrap()
        );
    }
}
