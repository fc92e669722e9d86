// Greenhouse endpoints
//
// The switch endpoints end in a slash and take an empty JSON object; the
// backend redirects (and drops the body) without the slash.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ApiClient, decode};
use crate::error::Error;
use crate::models::{CreateGreenhouse, Greenhouse, SwitchAck, UpdateGreenhouse};

/// Path segment for a switch target state.
fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

impl ApiClient {
    /// `GET /greenhouses`
    ///
    /// Entries are normalized like the detail endpoint.
    pub async fn list_greenhouses(&self) -> Result<Vec<Greenhouse>, Error> {
        let list: Vec<Greenhouse> = self.get("/greenhouses").await?;
        Ok(list.into_iter().map(Greenhouse::normalized).collect())
    }

    /// `POST /greenhouses` with `{name}`
    pub async fn create_greenhouse(&self, body: &CreateGreenhouse) -> Result<Greenhouse, Error> {
        debug!(name = %body.name, "creating greenhouse");
        let created: Greenhouse = self.post("/greenhouses", body).await?;
        Ok(created.normalized())
    }

    /// `GET /greenhouses/{id}`
    ///
    /// The AI-mode flag is resolved from `aiMode`, then `ai_mode`, then
    /// `false`, so it is never absent on the returned value.
    pub async fn get_greenhouse(&self, id: i64) -> Result<Greenhouse, Error> {
        let gh: Greenhouse = self.get(&format!("/greenhouses/{id}")).await?;
        Ok(gh.normalized())
    }

    /// `PATCH /greenhouses/{id}`
    pub async fn update_greenhouse(
        &self,
        id: i64,
        body: &UpdateGreenhouse,
    ) -> Result<Greenhouse, Error> {
        debug!(id, "updating greenhouse");
        let updated: Greenhouse = self.patch(&format!("/greenhouses/{id}"), body).await?;
        Ok(updated.normalized())
    }

    /// `DELETE /greenhouses/{id}`
    ///
    /// The backend answers with a bare confirmation string.
    pub async fn delete_greenhouse(&self, id: i64) -> Result<String, Error> {
        debug!(id, "deleting greenhouse");
        Ok(match self.delete(&format!("/greenhouses/{id}")).await? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// `POST /greenhouses/{id}/devices/{segment}/switch/{on|off}/` with `{}`
    ///
    /// `segment` is the backend's command name for the device, which is not
    /// the key its state is reported under.
    pub async fn switch_device(
        &self,
        id: i64,
        segment: &str,
        on: bool,
    ) -> Result<SwitchAck, Error> {
        debug!(id, segment, on, "switching device");
        let path = format!("/greenhouses/{id}/devices/{segment}/switch/{}/", on_off(on));
        self.post_switch(&path).await
    }

    /// `POST /greenhouses/{id}/ai/switch/{on|off}/` with `{}`
    pub async fn switch_ai_mode(&self, id: i64, on: bool) -> Result<SwitchAck, Error> {
        debug!(id, on, "switching AI mode");
        let path = format!("/greenhouses/{id}/ai/switch/{}/", on_off(on));
        self.post_switch(&path).await
    }

    async fn post_switch(&self, path: &str) -> Result<SwitchAck, Error> {
        let value: Value = self.post(path, &json!({})).await?;
        // Some deployments answer with an empty body.
        if value.is_null() {
            return Ok(SwitchAck { ok: true });
        }
        decode(value)
    }
}
