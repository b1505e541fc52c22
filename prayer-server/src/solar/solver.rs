//! Daily prayer-time solver.
//!
//! Times are computed in fractional UT hours relative to midnight of the
//! "astronomical date": the UT date on which the location's solar transit
//! falls within the requested local day. Each crossing is found by
//! starting from a guess and re-evaluating the sun's position at the
//! previous estimate twice.

use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::domain::{Coordinate, IshaRule, Location, MethodParams};
use crate::schedule::DailySchedule;

use super::error::SolveError;
use super::position::{asr_altitude, hour_angle, julian_day, solar_coordinates};

/// Altitude of the sun's centre at apparent sunrise/sunset: refraction plus
/// the solar semi-diameter.
const HORIZON_ALTITUDE: f64 = -0.833;

/// Extra horizon dip per square-root metre of observer elevation.
const ELEVATION_DIP: f64 = 0.0347;

/// Accepted observer elevations, in metres.
const ELEVATION_RANGE: RangeInclusive<f64> = -500.0..=9000.0;

/// Step toward the equator when the observer's latitude has no usable day.
const LATITUDE_STEP: f64 = 0.5;

/// Shortest night (sunset to next sunrise) that is still usable.
const MIN_NIGHT_HOURS: f64 = 1.0;

/// Asr must fall at least this far after transit and before sunset.
const MIN_ASR_GAP_HOURS: f64 = 10.0 / 60.0;

/// Where a twilight event's time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    /// The sun reached the method's depression angle.
    TwilightAngle,
    /// The angle was never reached, or too late; the night-portion cap was used.
    NightPortion,
    /// A fixed interval after maghrib.
    FixedInterval,
}

/// How the solver arrived at a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    /// Latitude actually used when the observer's own had no usable day.
    pub nearest_latitude: Option<f64>,
    pub fajr: TimeSource,
    pub isha: TimeSource,
}

impl Resolution {
    /// Whether any high-latitude policy engaged.
    pub fn is_adjusted(&self) -> bool {
        self.nearest_latitude.is_some()
            || self.fajr == TimeSource::NightPortion
            || self.isha == TimeSource::NightPortion
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Rising,
    Setting,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Rising => -1.0,
            Side::Setting => 1.0,
        }
    }
}

/// The sun's path over one UT date at one latitude/longitude.
#[derive(Debug, Clone, Copy)]
struct SolarDay {
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
}

impl SolarDay {
    fn mean_noon(&self) -> f64 {
        12.0 - self.longitude / 15.0
    }

    fn transit_at(&self, hours: f64) -> f64 {
        let sun = solar_coordinates(julian_day(self.date, hours));
        self.mean_noon() - sun.equation_of_time / 60.0
    }

    fn transit(&self) -> f64 {
        self.transit_at(self.transit_at(self.mean_noon()))
    }

    /// Time the sun passes `altitude` (a function of declination) on the
    /// given side of transit, or `None` if it never does.
    fn crossing(&self, side: Side, altitude: impl Fn(f64) -> f64) -> Option<f64> {
        let mut t = self.transit() + side.sign() * 6.0;
        for _ in 0..2 {
            let sun = solar_coordinates(julian_day(self.date, t));
            let transit = self.mean_noon() - sun.equation_of_time / 60.0;
            let h = hour_angle(self.latitude, sun.declination, altitude(sun.declination))?;
            t = transit + side.sign() * h / 15.0;
        }
        Some(t)
    }
}

/// Sunrise, sunset and asr of a usable day, plus the next sunrise.
#[derive(Debug, Clone, Copy)]
struct DayBounds {
    sunrise: f64,
    sunset: f64,
    next_sunrise: f64,
    asr: f64,
}

impl DayBounds {
    fn night(&self) -> f64 {
        self.next_sunrise - self.sunset
    }
}

fn day_bounds(today: &SolarDay, tomorrow: &SolarDay, horizon: f64, shadow: f64) -> Option<DayBounds> {
    let sunrise = today.crossing(Side::Rising, |_| horizon)?;
    let sunset = today.crossing(Side::Setting, |_| horizon)?;
    let next_sunrise = tomorrow.crossing(Side::Rising, |_| horizon)? + 24.0;
    let asr = today.crossing(Side::Setting, |dec| {
        asr_altitude(shadow, today.latitude, dec)
    })?;

    let usable = asr - today.transit() >= MIN_ASR_GAP_HOURS
        && sunset - asr >= MIN_ASR_GAP_HOURS
        && next_sunrise - sunset >= MIN_NIGHT_HOURS;

    usable.then_some(DayBounds {
        sunrise,
        sunset,
        next_sunrise,
        asr,
    })
}

fn horizon_altitude(elevation_m: f64) -> Result<f64, SolveError> {
    if !elevation_m.is_finite() || !ELEVATION_RANGE.contains(&elevation_m) {
        return Err(SolveError::InvalidElevation(elevation_m));
    }
    Ok(HORIZON_ALTITUDE - ELEVATION_DIP * elevation_m.max(0.0).sqrt())
}

/// UT date whose transit lands on `date` in the given offset.
fn astronomical_date(
    date: NaiveDate,
    longitude: f64,
    offset: FixedOffset,
) -> Result<NaiveDate, SolveError> {
    let local_noon = 12.0 - longitude / 15.0 + offset.local_minus_utc() as f64 / 3600.0;

    let shifted = if local_noon >= 24.0 {
        date.pred_opt()
    } else if local_noon < 0.0 {
        date.succ_opt()
    } else {
        Some(date)
    };
    shifted.ok_or(SolveError::DateOutOfRange(date))
}

/// Walk toward the equator until the sun gives a usable day.
fn resolve_latitude(
    coordinate: Coordinate,
    date: NaiveDate,
    next_date: NaiveDate,
    horizon: f64,
    shadow: f64,
) -> Result<(Coordinate, DayBounds), SolveError> {
    let mut candidate = coordinate;
    loop {
        let today = SolarDay {
            date,
            latitude: candidate.latitude(),
            longitude: candidate.longitude(),
        };
        let tomorrow = SolarDay {
            date: next_date,
            ..today
        };
        if let Some(bounds) = day_bounds(&today, &tomorrow, horizon, shadow) {
            return Ok((candidate, bounds));
        }

        let latitude = candidate.latitude();
        if latitude == 0.0 {
            return Err(SolveError::Unresolvable {
                latitude: coordinate.latitude(),
            });
        }
        let next = if latitude.abs() <= LATITUDE_STEP {
            0.0
        } else {
            latitude - LATITUDE_STEP.copysign(latitude)
        };
        candidate = candidate.with_latitude(next)?;
    }
}

/// Compute the six daily events for `date` (a local calendar date in the
/// location's UTC offset).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use prayer_server::domain::{CalculationMethod, Coordinate, Location, Prayer};
/// use prayer_server::solar::solve;
///
/// let mecca = Location::new(Coordinate::new(21.4225, 39.8262).unwrap());
/// let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let schedule = solve(date, &mecca, &CalculationMethod::UmmAlQura.params()).unwrap();
///
/// assert!(schedule.time(Prayer::Fajr) < schedule.time(Prayer::Sunrise));
/// assert!(schedule.time(Prayer::Sunrise) < schedule.time(Prayer::Dhuhr));
/// ```
pub fn solve(
    date: NaiveDate,
    location: &Location,
    params: &MethodParams,
) -> Result<DailySchedule, SolveError> {
    let coordinate = location.coordinate();
    let offset = location.utc_offset();
    let horizon = horizon_altitude(location.elevation_m())?;

    let astro_date = astronomical_date(date, coordinate.longitude(), offset)?;
    let next_date = astro_date
        .succ_opt()
        .ok_or(SolveError::DateOutOfRange(date))?;

    let (used, bounds) = resolve_latitude(
        coordinate,
        astro_date,
        next_date,
        horizon,
        params.madhab.shadow_length(),
    )?;
    let nearest_latitude = (used != coordinate).then(|| used.latitude());
    if let Some(latitude) = nearest_latitude {
        debug!(
            requested = coordinate.latitude(),
            used = latitude,
            %date,
            "no usable day at observer latitude"
        );
    }

    let day = SolarDay {
        date: astro_date,
        latitude: used.latitude(),
        longitude: used.longitude(),
    };
    let night = bounds.night();
    let rule = params.high_latitude_rule;

    let fajr_cap = bounds.sunrise - rule.night_portion(params.fajr_angle) * night;
    let (fajr, fajr_source) = match day.crossing(Side::Rising, |_| -params.fajr_angle) {
        Some(t) if t >= fajr_cap => (t, TimeSource::TwilightAngle),
        _ => (fajr_cap, TimeSource::NightPortion),
    };

    let (isha, isha_source) = match params.isha {
        IshaRule::MinutesAfterMaghrib(minutes) => (
            bounds.sunset + f64::from(minutes) / 60.0,
            TimeSource::FixedInterval,
        ),
        IshaRule::Angle(angle) => {
            let cap = bounds.sunset + rule.night_portion(angle) * night;
            match day.crossing(Side::Setting, |_| -angle) {
                Some(t) if t <= cap => (t, TimeSource::TwilightAngle),
                _ => (cap, TimeSource::NightPortion),
            }
        }
    };

    let dhuhr = day.transit() + params.dhuhr_offset_minutes as f64 / 60.0;

    let resolution = Resolution {
        nearest_latitude,
        fajr: fajr_source,
        isha: isha_source,
    };
    if resolution.fajr == TimeSource::NightPortion || resolution.isha == TimeSource::NightPortion {
        debug!(?resolution, %date, "twilight capped by night portion");
    }

    let midnight = astro_date.and_time(NaiveTime::MIN).and_utc();
    let to_local = |hours: f64| -> DateTime<FixedOffset> {
        let minutes = (hours * 60.0).round() as i64;
        (midnight + Duration::minutes(minutes)).with_timezone(&offset)
    };

    let times = [
        fajr,
        bounds.sunrise,
        dhuhr,
        bounds.asr,
        bounds.sunset,
        isha,
    ]
    .map(to_local);

    DailySchedule::new(date, *location, *params, times, resolution)
}
