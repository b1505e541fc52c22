//! Calculation method presets.
//!
//! Each preset fixes the twilight angles used for fajr and isha, plus a
//! small dhuhr adjustment. The asr shadow factor (madhab) and the
//! high-latitude rule default per preset but can be overridden.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named calculation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalculationMethod {
    /// Muslim World League.
    #[default]
    MuslimWorldLeague,
    /// Islamic Society of North America.
    NorthAmerica,
    /// Egyptian General Authority of Survey.
    Egypt,
    /// University of Islamic Sciences, Karachi.
    Karachi,
    /// Umm al-Qura University, Makkah.
    UmmAlQura,
}

impl CalculationMethod {
    /// Every preset, in listing order.
    pub const ALL: [CalculationMethod; 5] = [
        CalculationMethod::MuslimWorldLeague,
        CalculationMethod::NorthAmerica,
        CalculationMethod::Egypt,
        CalculationMethod::Karachi,
        CalculationMethod::UmmAlQura,
    ];

    /// Look up a preset by its key. Keys are case-sensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Look up a preset, falling back to the default for unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use prayer_server::domain::CalculationMethod;
    ///
    /// assert_eq!(CalculationMethod::from_key_or_default("Egypt"), CalculationMethod::Egypt);
    /// assert_eq!(
    ///     CalculationMethod::from_key_or_default("Tehran"),
    ///     CalculationMethod::MuslimWorldLeague
    /// );
    /// ```
    pub fn from_key_or_default(key: &str) -> Self {
        Self::from_key(key).unwrap_or_else(|| {
            tracing::warn!(key, fallback = Self::default().key(), "unknown calculation method");
            Self::default()
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "MuslimWorldLeague",
            CalculationMethod::NorthAmerica => "NorthAmerica",
            CalculationMethod::Egypt => "Egypt",
            CalculationMethod::Karachi => "Karachi",
            CalculationMethod::UmmAlQura => "UmmAlQura",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Muslim World League",
            CalculationMethod::NorthAmerica => "Islamic Society of North America (ISNA)",
            CalculationMethod::Egypt => "Egyptian General Authority of Survey",
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::UmmAlQura => "Umm Al-Qura University, Makkah",
        }
    }

    /// Where the method is customarily used.
    pub fn description(&self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Used in Europe, Far East, parts of US",
            CalculationMethod::NorthAmerica => "Used in North America",
            CalculationMethod::Egypt => "Used in Egypt",
            CalculationMethod::Karachi => "Used in Pakistan, Bangladesh, India, Afghanistan",
            CalculationMethod::UmmAlQura => "Used in Saudi Arabia",
        }
    }

    /// The fixed parameters of this preset.
    pub fn params(&self) -> MethodParams {
        let (fajr_angle, isha, dhuhr_offset_minutes) = match self {
            CalculationMethod::MuslimWorldLeague => (18.0, IshaRule::Angle(17.0), 1),
            CalculationMethod::NorthAmerica => (15.0, IshaRule::Angle(15.0), 1),
            CalculationMethod::Egypt => (19.5, IshaRule::Angle(17.5), 1),
            CalculationMethod::Karachi => (18.0, IshaRule::Angle(18.0), 1),
            CalculationMethod::UmmAlQura => (18.5, IshaRule::MinutesAfterMaghrib(90), 0),
        };

        MethodParams {
            method: *self,
            fajr_angle,
            isha,
            madhab: Madhab::default(),
            high_latitude_rule: HighLatitudeRule::default(),
            dhuhr_offset_minutes,
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How isha is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IshaRule {
    /// Sun depression angle below the horizon, in degrees.
    Angle(f64),
    /// Fixed interval after maghrib.
    MinutesAfterMaghrib(u32),
}

/// School of jurisprudence for the asr shadow length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Madhab {
    /// Shadow equals object length (Shafi, Maliki, Hanbali).
    #[default]
    Shafi,
    /// Shadow equals twice the object length.
    Hanafi,
}

impl Madhab {
    pub fn shadow_length(&self) -> f64 {
        match self {
            Madhab::Shafi => 1.0,
            Madhab::Hanafi => 2.0,
        }
    }
}

/// Cap applied to fajr and isha when twilight is very long or never ends.
///
/// The night (sunset to next sunrise) is split into portions; fajr can be
/// no earlier than `sunrise - portion * night` and isha no later than
/// `sunset + portion * night`.
///
/// The default is [`TwilightAngle`](Self::TwilightAngle): it leaves isha
/// well before the next fajr through the summer at London's latitude, where
/// half-night caps make the two meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HighLatitudeRule {
    /// Half of the night.
    MiddleOfTheNight,
    /// One seventh of the night.
    SeventhOfTheNight,
    /// A portion proportional to the twilight angle (angle / 60).
    #[default]
    TwilightAngle,
}

impl HighLatitudeRule {
    /// Night fraction used to cap an event computed from `angle`.
    pub fn night_portion(&self, angle: f64) -> f64 {
        match self {
            HighLatitudeRule::MiddleOfTheNight => 1.0 / 2.0,
            HighLatitudeRule::SeventhOfTheNight => 1.0 / 7.0,
            HighLatitudeRule::TwilightAngle => angle / 60.0,
        }
    }
}

/// Resolved parameters for one computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodParams {
    /// The preset these parameters came from.
    pub method: CalculationMethod,

    /// Sun depression for fajr, degrees.
    pub fajr_angle: f64,

    pub isha: IshaRule,

    pub madhab: Madhab,

    pub high_latitude_rule: HighLatitudeRule,

    /// Minutes added to solar transit for dhuhr.
    pub dhuhr_offset_minutes: i64,
}

impl MethodParams {
    /// Override the asr school.
    pub fn with_madhab(mut self, madhab: Madhab) -> Self {
        self.madhab = madhab;
        self
    }

    /// Override the high-latitude rule.
    pub fn with_high_latitude_rule(mut self, rule: HighLatitudeRule) -> Self {
        self.high_latitude_rule = rule;
        self
    }
}

impl From<CalculationMethod> for MethodParams {
    fn from(method: CalculationMethod) -> Self {
        method.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_roundtrip() {
        for method in CalculationMethod::ALL {
            assert_eq!(CalculationMethod::from_key(method.key()), Some(method));
            assert_eq!(method.to_string(), method.key());
        }
    }

    #[test]
    fn unknown_key() {
        assert_eq!(CalculationMethod::from_key("muslimworldleague"), None);
        assert_eq!(CalculationMethod::from_key(""), None);
        assert_eq!(
            CalculationMethod::from_key_or_default("Jafari"),
            CalculationMethod::MuslimWorldLeague
        );
    }

    #[test]
    fn preset_parameters() {
        let mwl = CalculationMethod::MuslimWorldLeague.params();
        assert_eq!(mwl.fajr_angle, 18.0);
        assert_eq!(mwl.isha, IshaRule::Angle(17.0));
        assert_eq!(mwl.dhuhr_offset_minutes, 1);

        let isna = CalculationMethod::NorthAmerica.params();
        assert_eq!(isna.fajr_angle, 15.0);
        assert_eq!(isna.isha, IshaRule::Angle(15.0));

        let egypt = CalculationMethod::Egypt.params();
        assert_eq!(egypt.fajr_angle, 19.5);
        assert_eq!(egypt.isha, IshaRule::Angle(17.5));

        let karachi = CalculationMethod::Karachi.params();
        assert_eq!(karachi.isha, IshaRule::Angle(18.0));

        let uaq = CalculationMethod::UmmAlQura.params();
        assert_eq!(uaq.fajr_angle, 18.5);
        assert_eq!(uaq.isha, IshaRule::MinutesAfterMaghrib(90));
        assert_eq!(uaq.dhuhr_offset_minutes, 0);
    }

    #[test]
    fn preset_defaults() {
        for method in CalculationMethod::ALL {
            let params = method.params();
            assert_eq!(params.method, method);
            assert_eq!(params.madhab, Madhab::Shafi);
            assert_eq!(params.high_latitude_rule, HighLatitudeRule::TwilightAngle);
        }
    }

    #[test]
    fn overrides() {
        let params = CalculationMethod::Karachi
            .params()
            .with_madhab(Madhab::Hanafi)
            .with_high_latitude_rule(HighLatitudeRule::SeventhOfTheNight);
        assert_eq!(params.madhab.shadow_length(), 2.0);
        assert_eq!(params.high_latitude_rule, HighLatitudeRule::SeventhOfTheNight);
    }

    #[test]
    fn night_portions() {
        assert_eq!(HighLatitudeRule::MiddleOfTheNight.night_portion(18.0), 0.5);
        assert_eq!(HighLatitudeRule::SeventhOfTheNight.night_portion(18.0), 1.0 / 7.0);
        assert_eq!(HighLatitudeRule::TwilightAngle.night_portion(18.0), 0.3);
    }
}
