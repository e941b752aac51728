pub mod device;
pub mod entity;

pub use device::Device;
pub use entity::{DeviceInfo, EntityState, SensorEntity};
