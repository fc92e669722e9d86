// ── Greenhouse view ──
//
// Everything a screen needs to render one greenhouse, derived from a
// cached `Greenhouse` in one pass.

use serde::Serialize;

use agroai_api::Greenhouse;

use crate::model::{DeviceKind, DeviceView, SensorKind, SensorReading};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreenhouseView {
    pub id: i64,
    pub name: String,
    pub ai_mode: bool,
    pub sensors: Vec<SensorReading>,
    pub devices: Vec<DeviceView>,
}

impl GreenhouseView {
    pub fn from_greenhouse(gh: &Greenhouse) -> Self {
        let ai_mode = gh.ai_mode_enabled();
        let stats = gh.stats.as_ref();
        let settings = gh.settings.as_ref();
        Self {
            id: gh.id,
            name: gh.name.clone(),
            ai_mode,
            sensors: SensorKind::ALL
                .iter()
                .map(|&k| SensorReading::derive(k, stats, settings))
                .collect(),
            devices: DeviceKind::ALL
                .iter()
                .map(|&k| DeviceView::derive(k, stats, ai_mode))
                .collect(),
        }
    }

    pub fn device(&self, kind: DeviceKind) -> Option<&DeviceView> {
        self.devices.iter().find(|d| d.kind == kind)
    }

    pub fn sensor(&self, kind: SensorKind) -> Option<&SensorReading> {
        self.sensors.iter().find(|s| s.kind == kind)
    }

    /// Number of sensors currently reporting.
    pub fn online_sensors(&self) -> usize {
        self.sensors.iter().filter(|s| !s.is_offline()).count()
    }
}

impl From<&Greenhouse> for GreenhouseView {
    fn from(gh: &Greenhouse) -> Self {
        Self::from_greenhouse(gh)
    }
}
