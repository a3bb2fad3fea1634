//! Network route preference models
//! Persisted globally at ~/.config/langsync/route_preference.json

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A concrete network path the remote service can be reached over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiRoute {
    Default,
    PreferIpv4,
    PreferIpv6,
}

/// Which route won the last race, and how long that verdict stays valid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePreference {
    #[serde(default)]
    pub api_route_preference: Option<ApiRoute>,
    #[serde(default)]
    pub valid_until_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_verified_at_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retry_after_utc: Option<DateTime<Utc>>,
}

impl RoutePreference {
    /// The preferred route, if its validity window covers `now`
    pub fn preferred_route_at(&self, now: DateTime<Utc>) -> Option<ApiRoute> {
        match (self.api_route_preference, self.valid_until_utc) {
            (Some(route), Some(valid_until)) if now < valid_until => Some(route),
            _ => None,
        }
    }

    /// Whether a new race is allowed at `now` (outside the cooldown window)
    pub fn can_race_at(&self, now: DateTime<Utc>) -> bool {
        self.retry_after_utc.map_or(true, |after| now >= after)
    }

    /// Record a race winner
    pub fn record_win(
        &mut self,
        route: ApiRoute,
        now: DateTime<Utc>,
        ttl: TimeDelta,
        cooldown: TimeDelta,
    ) {
        self.api_route_preference = Some(route);
        self.valid_until_utc = Some(now + ttl);
        self.last_verified_at_utc = Some(now);
        self.retry_after_utc = Some(now + cooldown);
    }

    /// Extend the validity window after a successful call on the preferred route
    pub fn touch_verified(&mut self, now: DateTime<Utc>, ttl: TimeDelta) {
        self.last_verified_at_utc = Some(now);
        self.valid_until_utc = Some(now + ttl);
    }

    /// Drop the preference and start the re-verification cooldown
    pub fn invalidate(&mut self, now: DateTime<Utc>, cooldown: TimeDelta) {
        self.api_route_preference = None;
        self.valid_until_utc = None;
        self.retry_after_utc = Some(now + cooldown);
    }
}

/// Accessor through which route preference state is persisted
///
/// The racing client only reads and writes the four `RoutePreference` fields;
/// where they live is the embedder's concern.
pub trait RoutePreferenceStore: Send + Sync {
    fn load(&self) -> Result<RoutePreference>;
    fn save(&self, preference: &RoutePreference) -> Result<()>;
}

/// Process-local store, used in tests and by embedders that persist elsewhere
#[derive(Default)]
pub struct InMemoryRouteStore {
    inner: Mutex<RoutePreference>,
}

impl RoutePreferenceStore for InMemoryRouteStore {
    fn load(&self) -> Result<RoutePreference> {
        Ok(self
            .inner
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default())
    }

    fn save(&self, preference: &RoutePreference) -> Result<()> {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = preference.clone();
        }
        Ok(())
    }
}

/// JSON-file-backed store under the user configuration directory
pub struct JsonFileRouteStore {
    path: PathBuf,
}

impl JsonFileRouteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<config dir>/langsync/route_preference.json`
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("langsync").join("route_preference.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoutePreferenceStore for JsonFileRouteStore {
    fn load(&self) -> Result<RoutePreference> {
        if !self.path.exists() {
            return Ok(RoutePreference::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, preference: &RoutePreference) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(preference)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
