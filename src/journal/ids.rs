use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// How record ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Epoch milliseconds of the creation tick, stringified
    #[default]
    Timestamp,
    /// Random UUID v4
    Uuid,
}

impl IdStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "timestamp" | "millis" => Some(IdStrategy::Timestamp),
            "uuid" => Some(IdStrategy::Uuid),
            _ => None,
        }
    }
}

/// Wall-clock millisecond ticks that never repeat within a process.
///
/// Two calls in the same millisecond get consecutive values, so file names and
/// timestamp ids derived from a tick cannot collide.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicI64,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next tick: `max(now_ms, last + 1)`.
    pub fn tick(&self) -> i64 {
        self.tick_at(Utc::now().timestamp_millis())
    }

    fn tick_at(&self, now_ms: i64) -> i64 {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now_ms.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }

    /// Record id for a tick under the given strategy.
    pub fn record_id(strategy: IdStrategy, tick: i64) -> String {
        match strategy {
            IdStrategy::Timestamp => tick.to_string(),
            IdStrategy::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }

    /// File name for a tick: `photo_<ms>.jpg`.
    pub fn file_name(tick: i64) -> String {
        format!("photo_{tick}.jpg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_follows_wall_clock() {
        let clock = IdClock::new();
        assert_eq!(clock.tick_at(1_000), 1_000);
        assert_eq!(clock.tick_at(5_000), 5_000);
    }

    #[test]
    fn test_tick_same_millisecond_is_distinct() {
        let clock = IdClock::new();
        let a = clock.tick_at(1_000);
        let b = clock.tick_at(1_000);
        let c = clock.tick_at(1_000);
        assert_eq!((a, b, c), (1_000, 1_001, 1_002));
    }

    #[test]
    fn test_tick_never_goes_backwards() {
        let clock = IdClock::new();
        clock.tick_at(2_000);
        assert_eq!(clock.tick_at(1_500), 2_001);
    }

    #[test]
    fn test_record_id_strategies() {
        assert_eq!(IdClock::record_id(IdStrategy::Timestamp, 42), "42");
        let id = IdClock::record_id(IdStrategy::Uuid, 42);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(IdClock::file_name(1714557600123), "photo_1714557600123.jpg");
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(IdStrategy::parse("UUID"), Some(IdStrategy::Uuid));
        assert_eq!(IdStrategy::parse("timestamp"), Some(IdStrategy::Timestamp));
        assert_eq!(IdStrategy::parse("nope"), None);
    }
}
