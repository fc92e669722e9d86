// Plant endpoints, scoped to a greenhouse.

use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CreatePlant, Plant, UpdatePlant};

/// Served when the plant-type endpoint is unavailable.
pub const FALLBACK_PLANT_TYPES: [&str; 8] = [
    "tomato", "cucumber", "pepper", "eggplant", "lettuce", "carrot", "onion", "garlic",
];

impl ApiClient {
    /// `GET /greenhouses/{id}/plants`
    pub async fn list_plants(&self, greenhouse_id: i64) -> Result<Vec<Plant>, Error> {
        self.get(&format!("/greenhouses/{greenhouse_id}/plants")).await
    }

    /// `POST /greenhouses/{id}/plants`
    pub async fn create_plant(
        &self,
        greenhouse_id: i64,
        body: &CreatePlant,
    ) -> Result<Plant, Error> {
        debug!(greenhouse_id, name = %body.name, "creating plant");
        self.post(&format!("/greenhouses/{greenhouse_id}/plants"), body)
            .await
    }

    /// `PATCH /greenhouses/{id}/plants/{plant_id}`
    pub async fn update_plant(
        &self,
        greenhouse_id: i64,
        plant_id: i64,
        body: &UpdatePlant,
    ) -> Result<Plant, Error> {
        debug!(greenhouse_id, plant_id, "updating plant");
        self.patch(&format!("/greenhouses/{greenhouse_id}/plants/{plant_id}"), body)
            .await
    }

    /// `DELETE /greenhouses/{id}/plants/{plant_id}`
    pub async fn delete_plant(&self, greenhouse_id: i64, plant_id: i64) -> Result<(), Error> {
        debug!(greenhouse_id, plant_id, "deleting plant");
        self.delete(&format!("/greenhouses/{greenhouse_id}/plants/{plant_id}"))
            .await?;
        Ok(())
    }

    /// `GET /greenhouses/{id}/plants/plant-types`
    ///
    /// Never fails: a non-positive id yields an empty list without a
    /// request, and any error yields [`FALLBACK_PLANT_TYPES`].
    pub async fn plant_types(&self, greenhouse_id: i64) -> Vec<String> {
        if greenhouse_id <= 0 {
            return Vec::new();
        }
        match self
            .get::<Vec<String>>(&format!("/greenhouses/{greenhouse_id}/plants/plant-types"))
            .await
        {
            Ok(types) => types,
            Err(e) => {
                warn!(greenhouse_id, error = %e, "plant types unavailable, using fallback list");
                fallback_plant_types()
            }
        }
    }
}

pub fn fallback_plant_types() -> Vec<String> {
    FALLBACK_PLANT_TYPES.iter().map(|&s| s.to_owned()).collect()
}
