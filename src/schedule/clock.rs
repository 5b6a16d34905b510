use chrono::{Local, NaiveDateTime};

/// Wall-clock source for the scheduled-start gate.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local time of the machine running the campaign.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
