//! Network route racing
//!
//! Some environments have one of IPv4/IPv6 broken or half-broken, which turns
//! every request into a multi-second stall. The racing client issues a
//! request concurrently over the default, IPv4-preferred and IPv6-preferred
//! network paths, keeps the first success, and remembers the winning route
//! for a validity window so later calls skip the race entirely.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::RwLock;

use crate::error::{ErrorKind, Result, SyncError};
use crate::models::{ApiRoute, RoutePreference, RoutePreferenceStore};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn preference_ttl() -> TimeDelta {
    TimeDelta::minutes(15)
}

fn race_cooldown() -> TimeDelta {
    TimeDelta::seconds(60)
}

/// Run the attempts concurrently and resolve with the first success.
///
/// Losing attempts are cancelled by dropping their futures. An error whose
/// kind is not `External` means the remote actually answered, so it is
/// returned immediately instead of waiting on the other routes.
pub async fn race_first_success<K, T, F>(attempts: Vec<(K, F)>) -> Result<(K, T)>
where
    K: Copy,
    F: std::future::Future<Output = Result<T>>,
{
    let mut in_flight: FuturesUnordered<_> = attempts
        .into_iter()
        .map(|(key, attempt)| async move { (key, attempt.await) })
        .collect();

    let mut last_error: Option<SyncError> = None;
    while let Some((key, outcome)) = in_flight.next().await {
        match outcome {
            Ok(value) => return Ok((key, value)),
            Err(err) if err.kind() != ErrorKind::External => return Err(err),
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error
        .unwrap_or_else(|| SyncError::Unexpected("no network routes to race".to_string())))
}

/// HTTP transport that races network routes and remembers the winner
pub struct RouteRacingClient {
    default_client: reqwest::Client,
    ipv4_client: reqwest::Client,
    ipv6_client: reqwest::Client,
    ipv4_dedicated: bool,
    ipv6_dedicated: bool,
    state: RwLock<RoutePreference>,
    store: Arc<dyn RoutePreferenceStore>,
}

impl RouteRacingClient {
    /// Build the per-route clients and load the persisted preference.
    ///
    /// When a dedicated binding cannot be constructed the route falls back to
    /// an alias of the default client and is left out of races.
    pub fn new(store: Arc<dyn RoutePreferenceStore>) -> Self {
        let default_client = build_route_client(None).unwrap_or_default();

        let (ipv4_client, ipv4_dedicated) =
            match build_route_client(Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED))) {
                Some(client) => (client, true),
                None => (default_client.clone(), false),
            };
        let (ipv6_client, ipv6_dedicated) =
            match build_route_client(Some(IpAddr::V6(Ipv6Addr::UNSPECIFIED))) {
                Some(client) => (client, true),
                None => (default_client.clone(), false),
            };

        let initial = store.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load route preference, starting fresh");
            RoutePreference::default()
        });

        Self {
            default_client,
            ipv4_client,
            ipv6_client,
            ipv4_dedicated,
            ipv6_dedicated,
            state: RwLock::new(initial),
            store,
        }
    }

    /// Whether the IPv4-preferred route is a genuinely dedicated connection
    pub fn has_dedicated_ipv4(&self) -> bool {
        self.ipv4_dedicated
    }

    /// Whether the IPv6-preferred route is a genuinely dedicated connection
    pub fn has_dedicated_ipv6(&self) -> bool {
        self.ipv6_dedicated
    }

    /// Snapshot of the current route preference state
    pub async fn preference(&self) -> RoutePreference {
        self.state.read().await.clone()
    }

    /// Run `op` over the transport: directly on the preferred route while the
    /// preference is valid, otherwise racing all dedicated routes.
    pub async fn execute<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: Fn(reqwest::Client) -> BoxFuture<'static, Result<T>>,
    {
        let now = Utc::now();
        let preferred = { self.state.read().await.preferred_route_at(now) };

        let mut preferred_failure: Option<SyncError> = None;
        if let Some(route) = preferred {
            tracing::debug!(?route, "using preferred network route");
            match op(self.client_for(route)).await {
                Ok(value) => {
                    self.update_state(|state, now| state.touch_verified(now, preference_ttl()))
                        .await;
                    return Ok(value);
                }
                // The remote answered; this is not a route problem
                Err(err) if err.kind() != ErrorKind::External => return Err(err),
                Err(err) => {
                    tracing::warn!(?route, error = %err, "preferred network route failed, falling back to racing");
                    self.update_state(|state, now| state.invalidate(now, race_cooldown()))
                        .await;
                    preferred_failure = Some(err);
                }
            }
        }

        let candidates = self.candidates();
        if candidates.len() <= 1 {
            return match preferred_failure {
                Some(err) => Err(err),
                None => op(self.default_client.clone()).await,
            };
        }

        let allow_race =
            preferred_failure.is_some() || self.state.read().await.can_race_at(Utc::now());
        if !allow_race {
            // Inside the cooldown window, stick to the default route
            return op(self.default_client.clone()).await;
        }

        let attempts: Vec<(ApiRoute, BoxFuture<'static, Result<T>>)> = candidates
            .into_iter()
            .map(|route| (route, op(self.client_for(route))))
            .collect();

        match race_first_success(attempts).await {
            Ok((route, value)) => {
                tracing::info!(?route, "network route race settled");
                self.update_state(move |state, now| {
                    state.record_win(route, now, preference_ttl(), race_cooldown())
                })
                .await;
                Ok(value)
            }
            Err(err) => {
                if err.kind() == ErrorKind::External {
                    self.update_state(|state, now| state.invalidate(now, race_cooldown()))
                        .await;
                }
                Err(err)
            }
        }
    }

    fn candidates(&self) -> Vec<ApiRoute> {
        let mut routes = vec![ApiRoute::Default];
        if self.ipv4_dedicated {
            routes.push(ApiRoute::PreferIpv4);
        }
        if self.ipv6_dedicated {
            routes.push(ApiRoute::PreferIpv6);
        }
        routes
    }

    fn client_for(&self, route: ApiRoute) -> reqwest::Client {
        match route {
            ApiRoute::Default => self.default_client.clone(),
            ApiRoute::PreferIpv4 => self.ipv4_client.clone(),
            ApiRoute::PreferIpv6 => self.ipv6_client.clone(),
        }
    }

    /// Mutate the shared preference state under the write lock, then persist
    async fn update_state<F>(&self, mutate: F)
    where
        F: FnOnce(&mut RoutePreference, DateTime<Utc>),
    {
        let snapshot = {
            let mut state = self.state.write().await;
            mutate(&mut state, Utc::now());
            state.clone()
        };
        if let Err(err) = self.store.save(&snapshot) {
            tracing::warn!(error = %err, "failed to persist route preference");
        }
    }
}

fn build_route_client(local_address: Option<IpAddr>) -> Option<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
    if let Some(addr) = local_address {
        builder = builder.local_address(addr);
    }
    builder.build().ok()
}
