use crate::utils::time::Timestamp;

/// Represents an entity responsible for providing the current time across the application. This
/// allows it to be replaced in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> Timestamp;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
