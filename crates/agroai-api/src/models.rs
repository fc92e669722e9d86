// Wire types for the AgroAI backend.
//
// Field names follow the backend's JSON exactly. Shapes the backend is
// known to get wrong (stats, settings) deserialize leniently: a malformed
// value becomes `None` instead of failing the whole response.

use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stats::parse_stat;

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_active: bool,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_owned()
        }
    }
}

/// `POST /auth/login` body.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

impl LoginRequest {
    pub(crate) fn to_json(&self) -> Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }
}

/// Returned by both `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    pub(crate) fn to_json(&self) -> Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
            "first_name": self.first_name,
            "last_name": self.last_name,
        })
    }
}

/// `PUT /users/me` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(first) = &self.first_name {
            user.first_name.clone_from(first);
        }
        if let Some(last) = &self.last_name {
            user.last_name.clone_from(last);
        }
    }
}

// ── Assistant chat ──────────────────────────────────────────────────

/// Who said a line of the chat history, as the backend names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    pub role: ChatRole,
    pub content: String,
}

/// `POST /ai/chat` body: the new message plus everything said before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatHistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

// ── Greenhouses ─────────────────────────────────────────────────────

/// The loosely-typed bag of current sensor and device readings.
///
/// Raw values are kept as the server sent them; read numbers through
/// [`StatsBag::reading`], which applies [`parse_stat`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsBag(Map<String, Value>);

impl StatsBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The parsed reading for `key`, or `None` when unknown/offline.
    pub fn reading(&self, key: &str) -> Option<f64> {
        parse_stat(self.raw(key))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for StatsBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Per-dimension alert thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenhouseSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_max: Option<f64>,
}

impl GreenhouseSettings {
    /// Overlay every `Some` field of `other` onto `self`.
    pub fn merge(&mut self, other: &Self) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(
            temp_min,
            temp_max,
            humidity_min,
            humidity_max,
            soil_moisture_min,
            soil_moisture_max,
            co2_min,
            co2_max
        );
    }
}

/// A greenhouse as returned by `/greenhouses` and `/greenhouses/{id}`.
///
/// The backend serializes the AI-mode flag as `aiMode` on some endpoints
/// and `ai_mode` on others, so both are carried. Use
/// [`Greenhouse::ai_mode_enabled`] to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Greenhouse {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub stats: Option<StatsBag>,
    #[serde(rename = "aiMode", default, skip_serializing_if = "Option::is_none")]
    pub ai_mode: Option<bool>,
    #[serde(rename = "ai_mode", default, skip_serializing_if = "Option::is_none")]
    pub ai_mode_mirror: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub settings: Option<GreenhouseSettings>,
    /// Whether the server actually reported an AI-mode value (either key)
    /// in the response this value was built from.
    #[serde(skip)]
    pub ai_mode_reported: bool,
}

impl Greenhouse {
    /// The effective AI-mode flag: `aiMode`, then `ai_mode`, then `false`.
    pub fn ai_mode_enabled(&self) -> bool {
        self.ai_mode.or(self.ai_mode_mirror).unwrap_or(false)
    }

    /// Set both AI-mode mirrors.
    pub fn set_ai_mode(&mut self, enabled: bool) {
        self.ai_mode = Some(enabled);
        self.ai_mode_mirror = Some(enabled);
    }

    /// Resolve the AI-mode flag to a definite boolean, remembering whether
    /// the server sent one at all.
    pub fn normalized(mut self) -> Self {
        let raw = self.ai_mode.or(self.ai_mode_mirror);
        self.ai_mode_reported = raw.is_some();
        self.ai_mode = Some(raw.unwrap_or(false));
        self
    }

    /// Parsed stat reading, `None` when missing or unusable.
    pub fn reading(&self, key: &str) -> Option<f64> {
        self.stats.as_ref().and_then(|s| s.reading(key))
    }

    /// Mutable stats bag, created empty if absent.
    pub fn stats_mut(&mut self) -> &mut StatsBag {
        self.stats.get_or_insert_with(StatsBag::new)
    }
}

/// `POST /greenhouses` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGreenhouse {
    pub name: String,
}

/// `PATCH /greenhouses/{id}` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateGreenhouse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<GreenhouseSettings>,
}

impl UpdateGreenhouse {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            settings: None,
        }
    }

    pub fn settings(settings: GreenhouseSettings) -> Self {
        Self {
            name: None,
            settings: Some(settings),
        }
    }

    /// Apply this update to a cached greenhouse.
    pub fn apply_to(&self, greenhouse: &mut Greenhouse) {
        if let Some(name) = &self.name {
            greenhouse.name.clone_from(name);
        }
        if let Some(settings) = &self.settings {
            greenhouse
                .settings
                .get_or_insert_with(GreenhouseSettings::default)
                .merge(settings);
        }
    }
}

/// Acknowledgement returned by the switch endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SwitchAck {
    #[serde(default)]
    pub ok: bool,
}

// ── Plants ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub plant_type: String,
    #[serde(default)]
    pub variety: String,
    #[serde(default)]
    pub greenhouse_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlant {
    pub name: String,
    #[serde(rename = "type")]
    pub plant_type: String,
    pub variety: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub plant_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
}

impl UpdatePlant {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.plant_type.is_none() && self.variety.is_none()
    }

    pub fn apply_to(&self, plant: &mut Plant) {
        if let Some(name) = &self.name {
            plant.name.clone_from(name);
        }
        if let Some(plant_type) = &self.plant_type {
            plant.plant_type.clone_from(plant_type);
        }
        if let Some(variety) = &self.variety {
            plant.variety.clone_from(variety);
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Deserialize `Option<T>`, turning a value of the wrong shape into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn greenhouse_reads_both_ai_keys() {
        let camel: Greenhouse =
            serde_json::from_value(json!({"id": 1, "name": "A", "aiMode": true})).unwrap();
        let snake: Greenhouse =
            serde_json::from_value(json!({"id": 2, "name": "B", "ai_mode": true})).unwrap();
        let null: Greenhouse =
            serde_json::from_value(json!({"id": 3, "name": "C", "ai_mode": null})).unwrap();
        assert!(camel.ai_mode_enabled());
        assert!(snake.ai_mode_enabled());
        assert!(!null.ai_mode_enabled());
    }

    #[test]
    fn normalized_tracks_reported_flag() {
        let reported = serde_json::from_value::<Greenhouse>(json!({"id": 1, "name": "A", "ai_mode": false}))
            .unwrap()
            .normalized();
        assert_eq!(reported.ai_mode, Some(false));
        assert!(reported.ai_mode_reported);

        let missing = serde_json::from_value::<Greenhouse>(json!({"id": 1, "name": "A", "aiMode": null}))
            .unwrap()
            .normalized();
        assert_eq!(missing.ai_mode, Some(false));
        assert!(!missing.ai_mode_reported);
    }

    #[test]
    fn malformed_stats_do_not_fail_the_greenhouse() {
        let gh: Greenhouse = serde_json::from_value(json!({
            "id": 7,
            "name": "Shed",
            "stats": "string",
            "settings": "string",
        }))
        .unwrap();
        assert!(gh.stats.is_none());
        assert!(gh.settings.is_none());
    }

    #[test]
    fn settings_use_camel_case() {
        let body = serde_json::to_value(UpdateGreenhouse::settings(GreenhouseSettings {
            temp_min: Some(18.0),
            co2_max: Some(800.0),
            ..GreenhouseSettings::default()
        }))
        .unwrap();
        assert_eq!(body, json!({"settings": {"tempMin": 18.0, "co2Max": 800.0}}));
    }

    #[test]
    fn update_apply_merges_settings() {
        let mut gh: Greenhouse = serde_json::from_value(json!({
            "id": 1,
            "name": "Old",
            "settings": {"tempMin": 10.0, "tempMax": 30.0}
        }))
        .unwrap();
        UpdateGreenhouse {
            name: Some("New".into()),
            settings: Some(GreenhouseSettings {
                temp_max: Some(28.0),
                ..GreenhouseSettings::default()
            }),
        }
        .apply_to(&mut gh);
        let settings = gh.settings.unwrap();
        assert_eq!(gh.name, "New");
        assert_eq!(settings.temp_min, Some(10.0));
        assert_eq!(settings.temp_max, Some(28.0));
    }

    #[test]
    fn chat_history_roles_are_lowercase() {
        let body = serde_json::to_value(ChatRequest {
            message: "Is it too humid?".into(),
            history: vec![ChatHistoryItem {
                role: ChatRole::Model,
                content: "Hello".into(),
            }],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "message": "Is it too humid?",
                "history": [{"role": "model", "content": "Hello"}]
            })
        );
    }

    #[test]
    fn profile_update_skips_missing_names() {
        let update = UpdateProfile {
            last_name: Some("Grower".into()),
            ..UpdateProfile::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"last_name": "Grower"}));
        assert!(UpdateProfile::default().is_empty());
    }

    #[test]
    fn plant_type_field_is_renamed() {
        let plant: Plant = serde_json::from_value(json!({
            "id": 4, "name": "Cherry", "type": "tomato", "variety": "Sungold", "greenhouse_id": 1
        }))
        .unwrap();
        assert_eq!(plant.plant_type, "tomato");
    }
}
