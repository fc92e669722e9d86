// ── Sensor readings ──

use serde::Serialize;
use strum::{Display, EnumIter};

use agroai_api::{GreenhouseSettings, StatsBag};

/// Shown in place of a value the sensor did not report.
pub const OFFLINE_PLACEHOLDER: &str = "--";

/// Band outside the thresholds, as a fraction of the threshold span,
/// that still counts as a warning rather than critical.
const WARNING_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    SoilMoisture,
    Co2,
    Light,
}

impl SensorKind {
    pub const ALL: [Self; 5] = [
        Self::Temperature,
        Self::Humidity,
        Self::SoilMoisture,
        Self::Co2,
        Self::Light,
    ];

    /// Stats key the reading is published under.
    pub fn stat_key(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::SoilMoisture => "moisture",
            Self::Co2 => "air",
            Self::Light => "light",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity | Self::SoilMoisture => "%",
            Self::Co2 => "ppm",
            Self::Light => "lux",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::SoilMoisture => "Soil moisture",
            Self::Co2 => "CO2",
            Self::Light => "Light",
        }
    }

    /// Gauge scale.
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Temperature => (0.0, 50.0),
            Self::Humidity | Self::SoilMoisture => (0.0, 100.0),
            Self::Co2 => (0.0, 2000.0),
            Self::Light => (0.0, 10_000.0),
        }
    }

    /// Configured alert thresholds, when both ends are set.
    pub fn thresholds(self, settings: &GreenhouseSettings) -> Option<(f64, f64)> {
        let (min, max) = match self {
            Self::Temperature => (settings.temp_min, settings.temp_max),
            Self::Humidity => (settings.humidity_min, settings.humidity_max),
            Self::SoilMoisture => (settings.soil_moisture_min, settings.soil_moisture_max),
            Self::Co2 => (settings.co2_min, settings.co2_max),
            Self::Light => (None, None),
        };
        Some((min?, max?)).filter(|(lo, hi)| lo <= hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorStatus {
    Good,
    Warning,
    Critical,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub kind: SensorKind,
    pub value: Option<f64>,
    pub status: SensorStatus,
}

impl SensorReading {
    pub fn derive(
        kind: SensorKind,
        stats: Option<&StatsBag>,
        settings: Option<&GreenhouseSettings>,
    ) -> Self {
        let value = stats.and_then(|s| s.reading(kind.stat_key()));
        let status = match value {
            None => SensorStatus::Offline,
            Some(v) => settings
                .and_then(|s| kind.thresholds(s))
                .map_or(SensorStatus::Good, |(lo, hi)| classify(v, lo, hi)),
        };
        Self {
            kind,
            value,
            status,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.value.is_none()
    }

    /// Value with unit, or [`OFFLINE_PLACEHOLDER`].
    pub fn display(&self) -> String {
        match self.value {
            Some(v) if v.fract() == 0.0 => format!("{v:.0}{}", self.unit_suffix()),
            Some(v) => format!("{v:.1}{}", self.unit_suffix()),
            None => OFFLINE_PLACEHOLDER.to_owned(),
        }
    }

    /// Position on the gauge, 0-100. Zero when offline.
    pub fn gauge_percent(&self) -> f64 {
        let (lo, hi) = self.kind.range();
        self.value
            .map_or(0.0, |v| ((v - lo) / (hi - lo) * 100.0).clamp(0.0, 100.0))
    }

    fn unit_suffix(&self) -> String {
        match self.kind.unit() {
            "%" => "%".to_owned(),
            unit => format!(" {unit}"),
        }
    }
}

fn classify(value: f64, lo: f64, hi: f64) -> SensorStatus {
    if (lo..=hi).contains(&value) {
        return SensorStatus::Good;
    }
    let band = (hi - lo).max(1.0) * WARNING_BAND;
    let distance = if value < lo { lo - value } else { value - hi };
    if distance <= band {
        SensorStatus::Warning
    } else {
        SensorStatus::Critical
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bag(value: serde_json::Value) -> StatsBag {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn placeholder_string_renders_offline() {
        let stats = bag(json!({"temperature": "string"}));
        let reading = SensorReading::derive(SensorKind::Temperature, Some(&stats), None);
        assert_eq!(reading.status, SensorStatus::Offline);
        assert_eq!(reading.display(), OFFLINE_PLACEHOLDER);
        assert!(reading.gauge_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn zero_is_a_reading() {
        let stats = bag(json!({"light": 0}));
        let reading = SensorReading::derive(SensorKind::Light, Some(&stats), None);
        assert_eq!(reading.value, Some(0.0));
        assert_eq!(reading.display(), "0 lux");
        assert_eq!(reading.status, SensorStatus::Good);
    }

    #[test]
    fn display_formats() {
        let stats = bag(json!({"temperature": "24.5", "humidity": 61, "air": 800}));
        let r = |k| SensorReading::derive(k, Some(&stats), None).display();
        assert_eq!(r(SensorKind::Temperature), "24.5 °C");
        assert_eq!(r(SensorKind::Humidity), "61%");
        assert_eq!(r(SensorKind::Co2), "800 ppm");
    }

    #[test]
    fn thresholds_drive_status() {
        let settings = GreenhouseSettings {
            temp_min: Some(18.0),
            temp_max: Some(28.0),
            ..GreenhouseSettings::default()
        };
        let status = |t: f64| {
            let stats = bag(json!({ "temperature": t }));
            SensorReading::derive(SensorKind::Temperature, Some(&stats), Some(&settings)).status
        };
        assert_eq!(status(22.0), SensorStatus::Good);
        assert_eq!(status(28.5), SensorStatus::Warning);
        assert_eq!(status(35.0), SensorStatus::Critical);
        assert_eq!(status(10.0), SensorStatus::Critical);
    }

    #[test]
    fn gauge_is_clamped() {
        let stats = bag(json!({"air": 5000}));
        let reading = SensorReading::derive(SensorKind::Co2, Some(&stats), None);
        assert!((reading.gauge_percent() - 100.0).abs() < f64::EPSILON);
    }
}
