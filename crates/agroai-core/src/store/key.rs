// ── Cache keys, values, and entries ──

use std::fmt;

use chrono::{DateTime, Utc};

use agroai_api::{Greenhouse, Plant, User};

/// Identifies one cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `GET /greenhouses`
    Greenhouses,
    /// `GET /greenhouses/{id}`
    Greenhouse(i64),
    /// `GET /greenhouses/{id}/plants`
    Plants(i64),
    /// `GET /greenhouses/{id}/plants/plant-types`
    PlantTypes(i64),
    /// `GET /auth/whoami`
    WhoAmI,
    /// `GET /users/me`
    Profile,
}

impl QueryKey {
    /// Keys scoped to a greenhouse with no real id are never fetched.
    pub fn is_enabled(self) -> bool {
        self.greenhouse_id().is_none_or(|id| id > 0)
    }

    pub fn greenhouse_id(self) -> Option<i64> {
        match self {
            Self::Greenhouse(id) | Self::Plants(id) | Self::PlantTypes(id) => Some(id),
            Self::Greenhouses | Self::WhoAmI | Self::Profile => None,
        }
    }

    /// Detail key for an optional id; `None` when the id is missing.
    pub fn greenhouse(id: Option<i64>) -> Option<Self> {
        id.filter(|&id| id > 0).map(Self::Greenhouse)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greenhouses => f.write_str("greenhouses"),
            Self::Greenhouse(id) => write!(f, "greenhouse/{id}"),
            Self::Plants(id) => write!(f, "plants/{id}"),
            Self::PlantTypes(id) => write!(f, "plant-types/{id}"),
            Self::WhoAmI => f.write_str("whoami"),
            Self::Profile => f.write_str("profile"),
        }
    }
}

/// A cached resource.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Greenhouses(Vec<Greenhouse>),
    Greenhouse(Greenhouse),
    Plants(Vec<Plant>),
    PlantTypes(Vec<String>),
    User(User),
}

impl QueryValue {
    pub fn as_greenhouses(&self) -> Option<&[Greenhouse]> {
        match self {
            Self::Greenhouses(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_greenhouses_mut(&mut self) -> Option<&mut Vec<Greenhouse>> {
        match self {
            Self::Greenhouses(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_greenhouse(&self) -> Option<&Greenhouse> {
        match self {
            Self::Greenhouse(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_greenhouse_mut(&mut self) -> Option<&mut Greenhouse> {
        match self {
            Self::Greenhouse(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_plants(&self) -> Option<&[Plant]> {
        match self {
            Self::Plants(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_plants_mut(&mut self) -> Option<&mut Vec<Plant>> {
        match self {
            Self::Plants(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_plant_types(&self) -> Option<&[String]> {
        match self {
            Self::PlantTypes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_user_mut(&mut self) -> Option<&mut User> {
        match self {
            Self::User(u) => Some(u),
            _ => None,
        }
    }
}

/// The state of one key as observed by subscribers.
///
/// `confirmed_at` records the last server confirmation and is untouched by
/// optimistic writes, so a reader can tell "the server said so" from "we
/// assumed so" via `optimistic`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    pub value: Option<QueryValue>,
    pub fetching: bool,
    pub error: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub optimistic: bool,
    pub stale: bool,
}

impl CacheEntry {
    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    pub fn greenhouse(&self) -> Option<&Greenhouse> {
        self.value.as_ref().and_then(QueryValue::as_greenhouse)
    }

    pub fn greenhouses(&self) -> Option<&[Greenhouse]> {
        self.value.as_ref().and_then(QueryValue::as_greenhouses)
    }

    pub fn plants(&self) -> Option<&[Plant]> {
        self.value.as_ref().and_then(QueryValue::as_plants)
    }

    pub fn plant_types(&self) -> Option<&[String]> {
        self.value.as_ref().and_then(QueryValue::as_plant_types)
    }

    pub fn user(&self) -> Option<&User> {
        self.value.as_ref().and_then(QueryValue::as_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_ids_disable_keys() {
        assert!(QueryKey::Greenhouses.is_enabled());
        assert!(QueryKey::Greenhouse(3).is_enabled());
        assert!(!QueryKey::Greenhouse(0).is_enabled());
        assert!(!QueryKey::PlantTypes(-1).is_enabled());
        assert_eq!(QueryKey::greenhouse(None), None);
        assert_eq!(QueryKey::greenhouse(Some(0)), None);
        assert_eq!(QueryKey::greenhouse(Some(2)), Some(QueryKey::Greenhouse(2)));
    }
}
