//! Daily schedules and current/next prayer derivation.

mod daily;
mod state;

pub use daily::DailySchedule;
pub use state::{PrayerState, ScheduledPrayer, current_and_next};
