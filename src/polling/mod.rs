pub mod client;
pub mod readings;
pub mod scheduler;
pub mod subscribers;

pub use client::{PollingClient, PollingOptions, VendorEndpoints};
pub use readings::{Reading, Readings, ReadingsHandle, SensorKind};
pub use scheduler::PeriodicUpdate;
pub use subscribers::{Subscribers, Subscription};
