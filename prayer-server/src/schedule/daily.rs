//! One day's events for one location.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::domain::{Location, MethodParams, Prayer};
use crate::solar::{Resolution, SolveError};

/// The six daily events, strictly increasing, in the location's offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySchedule {
    date: NaiveDate,
    location: Location,
    params: MethodParams,
    times: [DateTime<FixedOffset>; 6],
    resolution: Resolution,
}

impl DailySchedule {
    /// Build a schedule from times given in [`Prayer::ALL`] order.
    ///
    /// Fails with [`SolveError::Unordered`] naming the first pair that is
    /// not strictly increasing.
    pub fn new(
        date: NaiveDate,
        location: Location,
        params: MethodParams,
        times: [DateTime<FixedOffset>; 6],
        resolution: Resolution,
    ) -> Result<Self, SolveError> {
        let names = Prayer::ALL;
        for (pair, events) in times.windows(2).zip(names.windows(2)) {
            if pair[1] <= pair[0] {
                return Err(SolveError::Unordered {
                    earlier: events[0],
                    later: events[1],
                });
            }
        }

        Ok(Self {
            date,
            location,
            params,
            times,
            resolution,
        })
    }

    /// The local calendar date this schedule was requested for.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn params(&self) -> &MethodParams {
        &self.params
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn time(&self, prayer: Prayer) -> DateTime<FixedOffset> {
        self.times[prayer as usize]
    }

    pub fn fajr(&self) -> DateTime<FixedOffset> {
        self.time(Prayer::Fajr)
    }

    pub fn sunrise(&self) -> DateTime<FixedOffset> {
        self.time(Prayer::Sunrise)
    }

    pub fn dhuhr(&self) -> DateTime<FixedOffset> {
        self.time(Prayer::Dhuhr)
    }

    pub fn asr(&self) -> DateTime<FixedOffset> {
        self.time(Prayer::Asr)
    }

    pub fn maghrib(&self) -> DateTime<FixedOffset> {
        self.time(Prayer::Maghrib)
    }

    pub fn isha(&self) -> DateTime<FixedOffset> {
        self.time(Prayer::Isha)
    }

    /// Events in chronological order.
    pub fn events(&self) -> impl Iterator<Item = (Prayer, DateTime<FixedOffset>)> + '_ {
        Prayer::ALL.into_iter().zip(self.times.iter().copied())
    }
}
