//! Low-precision solar coordinates.
//!
//! NOAA/Meeus series for declination and the equation of time, accurate to
//! well under a minute of time for dates within a few centuries of J2000.

use chrono::{Datelike, NaiveDate};

const DEG: f64 = std::f64::consts::PI / 180.0;

/// Julian day of the J2000.0 epoch.
const J2000: f64 = 2_451_545.0;

/// Sun's apparent declination and the equation of time at an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarCoordinates {
    /// Degrees, positive north.
    pub declination: f64,
    /// Apparent minus mean solar time, in minutes.
    pub equation_of_time: f64,
}

/// Julian day for `hours` UT after midnight of `date`.
///
/// `hours` may fall outside 0..24; the result is linear in it.
pub fn julian_day(date: NaiveDate, hours: f64) -> f64 {
    let (mut y, mut m) = (date.year() as f64, date.month() as f64);
    let d = date.day() as f64;

    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    }

    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + d + b - 1524.5
        + hours / 24.0
}

fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Solar declination and equation of time at Julian day `jd`.
pub fn solar_coordinates(jd: f64) -> SolarCoordinates {
    let t = (jd - J2000) / 36525.0;

    let mean_longitude = normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032));
    let mean_anomaly = normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537));
    let eccentricity = 0.016708634 - t * (0.000042037 + t * 0.0000001267);

    let m = mean_anomaly * DEG;
    let center = m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289;

    let omega = (125.04 - 1934.136 * t) * DEG;
    let apparent_longitude = (mean_longitude + center - 0.00569 - 0.00478 * omega.sin()) * DEG;

    let mean_obliquity =
        23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    let obliquity = (mean_obliquity + 0.00256 * omega.cos()) * DEG;

    let declination = (obliquity.sin() * apparent_longitude.sin()).asin() / DEG;

    let y = (obliquity / 2.0).tan().powi(2);
    let l0 = mean_longitude * DEG;
    let eq = y * (2.0 * l0).sin() - 2.0 * eccentricity * m.sin()
        + 4.0 * eccentricity * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * eccentricity * eccentricity * (2.0 * m).sin();

    SolarCoordinates {
        declination,
        equation_of_time: 4.0 * eq / DEG,
    }
}

/// Hour angle (degrees, ≥ 0) at which the sun stands at `altitude`.
///
/// Returns `None` when the sun never reaches that altitude on this day at
/// this latitude (polar day/night, or twilight that never ends).
pub fn hour_angle(latitude: f64, declination: f64, altitude: f64) -> Option<f64> {
    let (phi, delta) = (latitude * DEG, declination * DEG);
    let cos_h = ((altitude * DEG).sin() - phi.sin() * delta.sin()) / (phi.cos() * delta.cos());

    if !cos_h.is_finite() || !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }
    Some(cos_h.acos() / DEG)
}

/// Solar altitude (degrees) at which a shadow reaches `shadow_length`
/// times the object's height plus its length at noon.
pub fn asr_altitude(shadow_length: f64, latitude: f64, declination: f64) -> f64 {
    let noon_shadow = ((latitude - declination).abs() * DEG).tan();
    (1.0 / (shadow_length + noon_shadow)).atan() / DEG
}
