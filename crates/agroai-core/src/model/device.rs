// ── Device state and command mapping ──
//
// The backend reports a device's state under one name and accepts
// switch commands under another. The two tables below are kept apart on
// purpose; no code should derive one from the other.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use agroai_api::{StatsBag, parse_stat};

/// A controllable greenhouse device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DeviceKind {
    Fan,
    Led,
    #[strum(to_string = "water_pump", serialize = "pump")]
    WaterPump,
    Humidifier,
}

/// Stats key each device's on/off state is read from.
pub const STATE_KEYS: [(DeviceKind, &str); 4] = [
    (DeviceKind::Fan, "fan"),
    (DeviceKind::Led, "led"),
    (DeviceKind::WaterPump, "soil_water_pump"),
    (DeviceKind::Humidifier, "air_water_pump"),
];

/// Path segment used in `/devices/{segment}/switch/{on|off}/`.
pub const COMMAND_SEGMENTS: [(DeviceKind, &str); 4] = [
    (DeviceKind::Fan, "air"),
    (DeviceKind::Led, "led"),
    (DeviceKind::WaterPump, "moisture"),
    (DeviceKind::Humidifier, "humidity"),
];

fn lookup(table: &[(DeviceKind, &'static str)], kind: DeviceKind) -> &'static str {
    table
        .iter()
        .find_map(|&(k, name)| (k == kind).then_some(name))
        .unwrap_or_default()
}

impl DeviceKind {
    pub const ALL: [Self; 4] = [Self::Fan, Self::Led, Self::WaterPump, Self::Humidifier];

    pub fn state_key(self) -> &'static str {
        lookup(&STATE_KEYS, self)
    }

    pub fn command_segment(self) -> &'static str {
        lookup(&COMMAND_SEGMENTS, self)
    }

    /// Stats key carrying the 0-100 level, for devices that have one.
    pub fn level_key(self) -> Option<&'static str> {
        match self {
            Self::Led => Some("led_brightness"),
            Self::Fan => Some("fan_speed"),
            Self::WaterPump | Self::Humidifier => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fan => "Fan",
            Self::Led => "LED lights",
            Self::WaterPump => "Water pump",
            Self::Humidifier => "Humidifier",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    On,
    Off,
    Offline,
}

/// Display state of one device on a greenhouse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceView {
    pub kind: DeviceKind,
    pub status: DeviceStatus,
    /// Brightness (led) or speed (fan), 0-100.
    pub level: Option<f64>,
    /// The on/off toggle accepts input.
    pub controls_enabled: bool,
    /// The level slider accepts input.
    pub slider_enabled: bool,
}

impl DeviceView {
    /// Derive a device's view from the stats bag and AI-mode flag.
    ///
    /// A JSON bool or any parseable number is a state (non-zero is on);
    /// anything else means offline. Manual control is locked while AI mode
    /// runs the greenhouse.
    pub fn derive(kind: DeviceKind, stats: Option<&StatsBag>, ai_mode: bool) -> Self {
        let status = match stats.and_then(|s| device_state(s.raw(kind.state_key()))) {
            Some(true) => DeviceStatus::On,
            Some(false) => DeviceStatus::Off,
            None => DeviceStatus::Offline,
        };
        let level = kind
            .level_key()
            .and_then(|key| stats.and_then(|s| s.reading(key)))
            .map(|v| v.clamp(0.0, 100.0));
        let controls_enabled = status != DeviceStatus::Offline && !ai_mode;

        Self {
            kind,
            status,
            level,
            controls_enabled,
            slider_enabled: controls_enabled && status == DeviceStatus::On && level.is_some(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.status == DeviceStatus::On
    }

    pub fn is_online(&self) -> bool {
        self.status != DeviceStatus::Offline
    }
}

fn device_state(raw: Option<&Value>) -> Option<bool> {
    match raw {
        Some(Value::Bool(b)) => Some(*b),
        other => parse_stat(other).map(|v| v != 0.0),
    }
}
