// ── Presentation model ──
//
// Derived, display-ready views of cached greenhouse data. Everything here
// is pure: no I/O, no store access.

pub mod device;
pub mod sensor;

pub use device::{COMMAND_SEGMENTS, DeviceKind, DeviceStatus, DeviceView, STATE_KEYS};
pub use sensor::{OFFLINE_PLACEHOLDER, SensorKind, SensorReading, SensorStatus};
