use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The two values published per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    PowerUsage,
    PhantomLoad,
}

impl SensorKind {
    pub const ALL: [SensorKind; 2] = [SensorKind::PowerUsage, SensorKind::PhantomLoad];

    pub fn key(&self) -> &'static str {
        match *self {
            SensorKind::PowerUsage => "power_usage",
            SensorKind::PhantomLoad => "phantom_load",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match *self {
            SensorKind::PowerUsage => "Power Usage",
            SensorKind::PhantomLoad => "Phantom Load",
        }
    }

    pub fn icon(&self) -> &'static str {
        match *self {
            SensorKind::PowerUsage => "mdi:power-plug",
            SensorKind::PhantomLoad => "mdi:ghost",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Kilowatts rounded to 3 decimals; `None` while unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub value: Option<f64>,
    pub fetched_at: Option<i64>,
}

impl Reading {
    pub fn is_unknown(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub power_usage: Reading,
    pub phantom_load: Reading,
}

impl Readings {
    pub fn get(&self, kind: SensorKind) -> Reading {
        match kind {
            SensorKind::PowerUsage => self.power_usage,
            SensorKind::PhantomLoad => self.phantom_load,
        }
    }

    pub(crate) fn set(&mut self, kind: SensorKind, value: f64, fetched_at: i64) {
        let reading = match kind {
            SensorKind::PowerUsage => &mut self.power_usage,
            SensorKind::PhantomLoad => &mut self.phantom_load,
        };
        reading.value = Some(value);
        reading.fetched_at = Some(fetched_at);
    }

    pub(crate) fn mark_unknown(&mut self) {
        self.power_usage.value = None;
        self.phantom_load.value = None;
    }
}

/// Read-only view of a client's readings, cheap to clone into subscribers.
#[derive(Debug, Clone, Default)]
pub struct ReadingsHandle(Arc<RwLock<Readings>>);

impl ReadingsHandle {
    pub fn snapshot(&self) -> Readings {
        *self.0.read()
    }

    pub fn get(&self, kind: SensorKind) -> Option<f64> {
        self.0.read().get(kind).value
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Readings) -> R) -> R {
        f(&mut self.0.write())
    }
}

/// Watts to kilowatts, rounded to 3 decimal places.
pub fn watts_to_kilowatts(watts: f64) -> f64 {
    let kilowatts = watts / 1000.0;
    (kilowatts * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(watts_to_kilowatts(250.0), 0.25);
        assert_eq!(watts_to_kilowatts(15.0), 0.015);
        assert_eq!(watts_to_kilowatts(1234.5678), 1.235);
        assert_eq!(watts_to_kilowatts(0.4), 0.0);
    }

    #[test]
    fn mark_unknown_keeps_fetch_timestamps() {
        let mut readings = Readings::default();
        readings.set(SensorKind::PowerUsage, 1.5, 10);
        readings.set(SensorKind::PhantomLoad, 0.1, 10);
        readings.mark_unknown();
        assert!(readings.power_usage.is_unknown());
        assert!(readings.phantom_load.is_unknown());
        assert_eq!(readings.power_usage.fetched_at, Some(10));
    }
}
