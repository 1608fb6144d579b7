use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

/// Length of one bookable slot.
pub const SLOT_MINUTES: i64 = 30;
/// First bookable start of the day.
pub const FIRST_SLOT_HOUR: u32 = 7;
/// Last hour that still has slots (22:00 and 22:30).
pub const LAST_SLOT_HOUR: u32 = 22;

const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single 30-minute court slot, identified by its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(NaiveDateTime);

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Slot(date.and_time(time))
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    /// `HH:MM`, as shown on keyboard buttons.
    pub fn time_label(&self) -> String {
        self.0.format("%H:%M").to_string()
    }

    /// True when the two slots are exactly one tick apart.
    pub fn is_adjacent(&self, other: &Slot) -> bool {
        (self.0 - other.0).abs() == TimeDelta::minutes(SLOT_MINUTES)
    }
}

impl From<NaiveDateTime> for Slot {
    fn from(value: NaiveDateTime) -> Self {
        Slot(value)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_FORMAT))
    }
}

impl FromStr for Slot {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, SLOT_FORMAT).map(Slot)
    }
}

/// The fixed daily grid of bookable slots.
pub struct SlotGrid;

impl SlotGrid {
    /// All slots of `date` in chronological order, 07:00 through 22:30.
    pub fn generate(date: NaiveDate) -> Vec<Slot> {
        (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
            .flat_map(|hour| [0, 30].into_iter().map(move |minute| (hour, minute)))
            .filter_map(|(hour, minute)| NaiveTime::from_hms_opt(hour, minute, 0))
            .map(|time| Slot::new(date, time))
            .collect()
    }

    pub fn contains(slot: &Slot) -> bool {
        let time = slot.time();
        (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR).contains(&time.hour())
            && (time.minute() == 0 || time.minute() == 30)
            && time.second() == 0
            && time.nanosecond() == 0
    }
}
