//! Data transfer objects for web requests and responses.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CalculationMethod, Coordinate, HighLatitudeRule, Madhab, Prayer};
use crate::qibla::QiblaDirection;
use crate::schedule::{DailySchedule, PrayerState, ScheduledPrayer};
use crate::solar::TimeSource;

/// Request to compute prayer times.
#[derive(Debug, Default, Deserialize)]
pub struct PrayerTimesRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Calculation method key; unknown keys fall back to the default
    pub method: Option<String>,

    /// `YYYY-MM-DD` or an RFC 3339 timestamp (defaults to today)
    pub date: Option<String>,

    /// Minutes east of UTC (defaults to the longitude's solar zone)
    pub utc_offset_minutes: Option<i32>,

    pub elevation_m: Option<f64>,

    pub madhab: Option<Madhab>,

    pub high_latitude_rule: Option<HighLatitudeRule>,
}

/// Request to compute the qibla direction.
#[derive(Debug, Default, Deserialize)]
pub struct QiblaRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Query string for the nearby-places search.
#[derive(Debug, Default, Deserialize)]
pub struct NearbyPlacesRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    /// Search radius in metres (defaults to 5000)
    pub radius: Option<u32>,

    /// Place type (defaults to "mosque")
    #[serde(rename = "type")]
    pub place_type: Option<String>,

    /// Continuation token from a previous page
    pub page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocationResult {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for LocationResult {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude(),
            longitude: c.longitude(),
        }
    }
}

/// The six events, one string each.
#[derive(Debug, Serialize)]
pub struct PrayerTimeStrings {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

impl PrayerTimeStrings {
    fn from_schedule(
        schedule: &DailySchedule,
        format: impl Fn(DateTime<FixedOffset>) -> String,
    ) -> Self {
        Self {
            fajr: format(schedule.fajr()),
            sunrise: format(schedule.sunrise()),
            dhuhr: format(schedule.dhuhr()),
            asr: format(schedule.asr()),
            maghrib: format(schedule.maghrib()),
            isha: format(schedule.isha()),
        }
    }
}

/// The next event relative to the request time.
#[derive(Debug, Serialize)]
pub struct NextPrayerResult {
    pub prayer: Prayer,
    pub time: String,
    pub timestamp: String,
    pub tomorrow: bool,
}

impl From<ScheduledPrayer> for NextPrayerResult {
    fn from(next: ScheduledPrayer) -> Self {
        Self {
            prayer: next.prayer,
            time: clock_time(next.time),
            timestamp: next.time.to_rfc3339(),
            tomorrow: next.tomorrow,
        }
    }
}

/// What the high-latitude policies did, if anything.
#[derive(Debug, Serialize)]
pub struct HighLatitudeResult {
    pub adjusted: bool,
    pub rule: HighLatitudeRule,
    pub nearest_latitude: Option<f64>,
    pub fajr: TimeSource,
    pub isha: TimeSource,
}

/// Response with a day's prayer times.
#[derive(Debug, Serialize)]
pub struct PrayerTimesResponse {
    pub location: LocationResult,
    pub date: String,
    pub method: CalculationMethod,
    pub madhab: Madhab,
    pub utc_offset: String,
    /// Times as `hh:mm AM`
    pub prayer_times: PrayerTimeStrings,
    /// Times as RFC 3339
    pub timestamps: PrayerTimeStrings,
    pub current_prayer: Option<Prayer>,
    /// `null` when the request time is outside the requested day and the
    /// day after it
    pub next_prayer: Option<NextPrayerResult>,
    /// Current event name, the next-event label before fajr, or "None"
    pub label: String,
    pub next_label: Option<String>,
    pub high_latitude: HighLatitudeResult,
    pub timestamp: String,
}

impl PrayerTimesResponse {
    pub fn new(schedule: &DailySchedule, state: &PrayerState, now: DateTime<Utc>) -> Self {
        let params = schedule.params();
        let resolution = schedule.resolution();

        Self {
            location: schedule.location().coordinate().into(),
            date: schedule.date().format("%Y-%m-%d").to_string(),
            method: params.method,
            madhab: params.madhab,
            utc_offset: schedule.location().utc_offset().to_string(),
            prayer_times: PrayerTimeStrings::from_schedule(schedule, clock_time),
            timestamps: PrayerTimeStrings::from_schedule(schedule, |t| t.to_rfc3339()),
            current_prayer: state.current.map(|c| c.prayer),
            next_prayer: state.next.map(NextPrayerResult::from),
            label: state.to_string(),
            next_label: state.next_label(),
            high_latitude: HighLatitudeResult {
                adjusted: resolution.is_adjusted(),
                rule: params.high_latitude_rule,
                nearest_latitude: resolution.nearest_latitude,
                fajr: resolution.fajr,
                isha: resolution.isha,
            },
            timestamp: iso_timestamp(now),
        }
    }
}

/// A calculation method in the listing.
#[derive(Debug, Serialize)]
pub struct MethodInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl From<CalculationMethod> for MethodInfo {
    fn from(m: CalculationMethod) -> Self {
        Self {
            key: m.key(),
            name: m.name(),
            description: m.description(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MethodsResponse {
    pub methods: Vec<MethodInfo>,
    pub default: &'static str,
}

impl MethodsResponse {
    pub fn all() -> Self {
        Self {
            methods: CalculationMethod::ALL.into_iter().map(MethodInfo::from).collect(),
            default: CalculationMethod::default().key(),
        }
    }
}

/// Response with the qibla direction.
#[derive(Debug, Serialize)]
pub struct QiblaResponse {
    pub location: LocationResult,
    /// Degrees clockwise from true north
    pub qibla_direction: f64,
    /// e.g. "118.9°"
    pub direction_from_north: String,
    pub distance_km: f64,
    pub degenerate: bool,
    pub timestamp: String,
}

impl QiblaResponse {
    pub fn new(coordinate: Coordinate, direction: &QiblaDirection, now: DateTime<Utc>) -> Self {
        Self {
            location: coordinate.into(),
            qibla_direction: direction.bearing,
            direction_from_north: direction.formatted(),
            distance_km: direction.distance_km,
            degenerate: direction.degenerate,
            timestamp: iso_timestamp(now),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub health: &'static str,
    pub prayer_times: &'static str,
    pub prayer_methods: &'static str,
    pub qibla: &'static str,
    pub nearby_places: &'static str,
}

/// Service description at the root path.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short error title
    pub error: String,
    /// Human-readable detail
    pub message: String,
}

/// "04:11 AM"
pub fn clock_time(t: DateTime<FixedOffset>) -> String {
    t.format("%I:%M %p").to_string()
}

/// RFC 3339 with milliseconds and a `Z` suffix.
pub fn iso_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Location, offset_from_minutes};
    use crate::qibla::qibla;
    use crate::schedule::current_and_next;
    use crate::solar::solve;
    use chrono::{Duration, NaiveDate};

    fn mecca() -> Coordinate {
        Coordinate::new(21.4225, 39.8262).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn time_formats() {
        let t = DateTime::parse_from_rfc3339("2024-06-01T16:05:00+03:00").unwrap();
        assert_eq!(clock_time(t), "04:05 PM");
        assert_eq!(iso_timestamp(at("2024-06-01T13:05:00Z")), "2024-06-01T13:05:00.000Z");
    }

    #[test]
    fn prayer_times_response_fields() {
        let location = Location::new(mecca()).with_utc_offset(offset_from_minutes(180).unwrap());
        let schedule = solve(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &location,
            &CalculationMethod::UmmAlQura.params(),
        )
        .unwrap();
        let now = schedule.dhuhr().with_timezone(&Utc) + Duration::minutes(1);
        let state = current_and_next(&schedule, now).unwrap();

        let response = PrayerTimesResponse::new(&schedule, &state, now);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["date"], "2024-06-01");
        assert_eq!(json["method"], "UmmAlQura");
        assert_eq!(json["madhab"], "Shafi");
        assert_eq!(json["utc_offset"], "+03:00");
        assert_eq!(json["location"]["latitude"], 21.4225);
        assert_eq!(json["current_prayer"], "dhuhr");
        assert_eq!(json["next_prayer"]["prayer"], "asr");
        assert_eq!(json["next_prayer"]["tomorrow"], false);
        assert_eq!(json["label"], "Dhuhr");
        assert_eq!(json["high_latitude"]["adjusted"], false);
        assert_eq!(json["high_latitude"]["isha"], "fixed_interval");
        assert_eq!(json["high_latitude"]["rule"], "TwilightAngle");

        let fajr = json["prayer_times"]["fajr"].as_str().unwrap();
        assert!(fajr.ends_with(" AM"), "{fajr}");
        let isha = json["prayer_times"]["isha"].as_str().unwrap();
        assert!(isha.ends_with(" PM"), "{isha}");
        assert!(
            json["timestamps"]["dhuhr"]
                .as_str()
                .unwrap()
                .ends_with("+03:00")
        );
    }

    #[test]
    fn out_of_range_state_serializes_as_null() {
        let location = Location::new(mecca()).with_utc_offset(offset_from_minutes(180).unwrap());
        let schedule = solve(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &location,
            &CalculationMethod::UmmAlQura.params(),
        )
        .unwrap();
        let now = schedule.isha().with_timezone(&Utc) + Duration::days(3);
        let state = current_and_next(&schedule, now).unwrap();

        let json = serde_json::to_value(PrayerTimesResponse::new(&schedule, &state, now)).unwrap();
        assert!(json["current_prayer"].is_null());
        assert!(json["next_prayer"].is_null());
        assert!(json["next_label"].is_null());
        assert_eq!(json["label"], "None");
        assert_eq!(json["date"], "2024-06-01");
    }

    #[test]
    fn methods_listing() {
        let json = serde_json::to_value(MethodsResponse::all()).unwrap();
        assert_eq!(json["default"], "MuslimWorldLeague");
        assert_eq!(json["methods"].as_array().unwrap().len(), 5);
        assert_eq!(json["methods"][1]["key"], "NorthAmerica");
        assert_eq!(
            json["methods"][1]["name"],
            "Islamic Society of North America (ISNA)"
        );
    }

    #[test]
    fn qibla_response_fields() {
        let london = Coordinate::new(51.5074, -0.1278).unwrap();
        let response = QiblaResponse::new(london, &qibla(&london), at("2024-06-01T12:00:00Z"));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["direction_from_north"], "119.0°");
        assert_eq!(json["degenerate"], false);
        assert_eq!(json["timestamp"], "2024-06-01T12:00:00.000Z");
    }

    #[test]
    fn nearby_request_renames_type() {
        let req: NearbyPlacesRequest =
            serde_json::from_str(r#"{"lat": 1.0, "lng": 2.0, "type": "restaurant"}"#).unwrap();
        assert_eq!(req.place_type.as_deref(), Some("restaurant"));
        assert_eq!(req.radius, None);
    }
}
