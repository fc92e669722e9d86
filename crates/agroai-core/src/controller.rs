// ── Controller: the sync layer's public face ──
//
// Owns the API client, the query store, and every background task.
// Reads go through `watch`/`fetch`; writes go through the optimistic
// mutation combinator. Session expiry observed on the session's watch
// channel tears the cache down and routes to the login screen.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use agroai_api::{
    ApiClient, ChatHistoryItem, ChatRequest, CreateGreenhouse, CreatePlant, Greenhouse,
    GreenhouseSettings, Plant, RegisterRequest, Session, SessionState, UpdateGreenhouse,
    UpdatePlant, UpdateProfile, User,
};

use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::event::{Notification, Route};
use crate::model::{DeviceKind, DeviceView};
use crate::mutation::{MutationPlan, OptimisticMutation, Reconcile};
use crate::store::{QueryKey, QueryStore, QueryValue};
use crate::stream::QueryStream;
use crate::sync;
use crate::view::GreenhouseView;

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

/// Toast shown when the assistant cannot be reached.
pub const CHAT_FAILURE: &str = "Something went wrong. Please try again.";

/// A switched AI-mode value that outranks fetches which omit the field.
#[derive(Debug, Clone, Copy)]
struct AiHold {
    enabled: bool,
    until: Instant,
}

/// Handle to the greenhouse sync layer. Cheap to clone.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: SyncConfig,
    api: ApiClient,
    store: Arc<QueryStore>,
    holds: DashMap<i64, AiHold>,
    notifications: broadcast::Sender<Notification>,
    route: watch::Sender<Route>,
    /// Child token for the current run; cancelled on shutdown, replaced so
    /// the controller can be started again.
    cancel_child: Mutex<CancellationToken>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    sync_tasks: DashMap<QueryKey, JoinHandle<()>>,
}

impl Controller {
    /// Build a controller over `session`. Nothing runs until
    /// [`start`](Self::start) or [`watch`](Self::watch).
    pub fn new(config: SyncConfig, session: Arc<Session>) -> Result<Self, CoreError> {
        let api = ApiClient::new(&config.api_url, &config.transport(), session)?;
        Ok(Self::with_client(config, api))
    }

    /// Build a controller around an existing client.
    pub fn with_client(config: SyncConfig, api: ApiClient) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let initial = if api.session().is_authenticated() {
            Route::Greenhouses
        } else {
            Route::Login
        };
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                api,
                store: Arc::new(QueryStore::new()),
                holds: DashMap::new(),
                notifications,
                route: watch::Sender::new(initial),
                cancel_child: Mutex::new(cancel_child),
                cancel,
                task_handles: Mutex::new(Vec::new()),
                sync_tasks: DashMap::new(),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the session watcher. Calling it twice is harmless.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if handles.iter().any(|h| !h.is_finished()) {
            return;
        }
        let cancel = self.inner.cancel_child.lock().await.clone();
        handles.push(tokio::spawn(session_watch_task(self.clone(), cancel)));
        debug!("controller started");
    }

    /// Stop every background task and wait for them to exit.
    pub async fn shutdown(&self) {
        {
            let mut child = self.inner.cancel_child.lock().await;
            child.cancel();
            *child = self.inner.cancel.child_token();
        }

        let mut handles: Vec<JoinHandle<()>> =
            self.inner.task_handles.lock().await.drain(..).collect();
        let keys: Vec<QueryKey> = self.inner.sync_tasks.iter().map(|e| *e.key()).collect();
        for key in keys {
            if let Some((_, handle)) = self.inner.sync_tasks.remove(&key) {
                handles.push(handle);
            }
        }
        for handle in futures_util::future::join_all(handles).await {
            if let Err(e) = handle {
                if !e.is_cancelled() {
                    warn!(error = %e, "background task panicked");
                }
            }
        }
        debug!("controller stopped");
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn session(&self) -> &Arc<Session> {
        self.inner.api.session()
    }

    pub fn store(&self) -> &Arc<QueryStore> {
        &self.inner.store
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    pub fn route(&self) -> watch::Receiver<Route> {
        self.inner.route.subscribe()
    }

    pub fn current_route(&self) -> Route {
        *self.inner.route.borrow()
    }

    pub fn navigate(&self, route: Route) {
        if self.inner.route.send_replace(route) != route {
            debug!(%route, "navigated");
        }
    }

    /// Display view of a cached greenhouse detail.
    pub fn greenhouse_view(&self, id: i64) -> Option<GreenhouseView> {
        self.inner
            .store
            .get(&QueryKey::Greenhouse(id))
            .greenhouse()
            .map(GreenhouseView::from)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Subscribe to `key` and keep it in sync in the background.
    ///
    /// Keys without a usable greenhouse id get a subscription but no
    /// background task, and never hit the network.
    pub async fn watch(&self, key: QueryKey) -> QueryStream {
        let stream = self.inner.store.subscribe(&key);
        if !key.is_enabled() {
            debug!(%key, "query disabled, not syncing");
            return stream;
        }
        if self
            .inner
            .sync_tasks
            .get(&key)
            .is_some_and(|h| !h.is_finished())
        {
            return stream;
        }

        let cancel = self.inner.cancel_child.lock().await.clone();
        let handle = tokio::spawn(sync::sync_task(self.clone(), key, cancel));
        if let Some(previous) = self.inner.sync_tasks.insert(key, handle) {
            previous.abort();
        }
        stream
    }

    /// Stop syncing `key`. The cached value stays.
    pub fn unwatch(&self, key: &QueryKey) {
        if let Some((_, handle)) = self.inner.sync_tasks.remove(key) {
            handle.abort();
            debug!(%key, "stopped syncing");
        }
    }

    /// Stop every per-key sync task.
    fn stop_syncing(&self) {
        let keys: Vec<QueryKey> = self.inner.sync_tasks.iter().map(|e| *e.key()).collect();
        for key in &keys {
            self.unwatch(key);
        }
    }

    pub fn is_watching(&self, key: &QueryKey) -> bool {
        self.inner
            .sync_tasks
            .get(key)
            .is_some_and(|h| !h.is_finished())
    }

    /// Fetch `key` once, store the result, and return it.
    pub async fn fetch(&self, key: QueryKey) -> Result<QueryValue, CoreError> {
        if !key.is_enabled() {
            return Err(CoreError::NotFound {
                entity: "greenhouse".into(),
                identifier: key.greenhouse_id().unwrap_or_default().to_string(),
            });
        }
        let ticket = self.inner.store.begin_fetch(&key);
        let result = self.load(key).await;
        if let Some(ticket) = ticket {
            let stored = match &result {
                Ok(value) => Ok(value.clone()),
                Err(e) => Err(e.user_message()),
            };
            self.inner.store.complete_fetch(&ticket, stored);
        }
        result
    }

    pub async fn greenhouses(&self) -> Result<Vec<Greenhouse>, CoreError> {
        match self.fetch(QueryKey::Greenhouses).await? {
            QueryValue::Greenhouses(list) => Ok(list),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn greenhouse(&self, id: i64) -> Result<Greenhouse, CoreError> {
        match self.fetch(QueryKey::Greenhouse(id)).await? {
            QueryValue::Greenhouse(gh) => Ok(gh),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn plants(&self, greenhouse_id: i64) -> Result<Vec<Plant>, CoreError> {
        match self.fetch(QueryKey::Plants(greenhouse_id)).await? {
            QueryValue::Plants(list) => Ok(list),
            other => Err(unexpected(&other)),
        }
    }

    /// Plant types for a greenhouse. Empty without a request for a
    /// non-positive id; the fallback list on any backend failure.
    pub async fn plant_types(&self, greenhouse_id: i64) -> Vec<String> {
        if greenhouse_id <= 0 {
            return Vec::new();
        }
        match self.fetch(QueryKey::PlantTypes(greenhouse_id)).await {
            Ok(QueryValue::PlantTypes(types)) => types,
            _ => agroai_api::fallback_plant_types(),
        }
    }

    /// Load `key` from the backend without touching the store.
    pub(crate) async fn load(&self, key: QueryKey) -> Result<QueryValue, CoreError> {
        let api = &self.inner.api;
        Ok(match key {
            QueryKey::Greenhouses => QueryValue::Greenhouses(
                api.list_greenhouses()
                    .await?
                    .into_iter()
                    .map(|gh| self.apply_hold(gh))
                    .collect(),
            ),
            QueryKey::Greenhouse(id) => {
                QueryValue::Greenhouse(self.apply_hold(api.get_greenhouse(id).await?))
            }
            QueryKey::Plants(id) => QueryValue::Plants(api.list_plants(id).await?),
            QueryKey::PlantTypes(id) => QueryValue::PlantTypes(api.plant_types(id).await),
            QueryKey::WhoAmI => QueryValue::User(api.whoami().await?),
            QueryKey::Profile => QueryValue::User(api.profile().await?),
        })
    }

    pub(crate) fn poll_interval(&self, key: QueryKey) -> Option<Duration> {
        match key {
            QueryKey::Greenhouses => Some(self.inner.config.list_poll_interval),
            QueryKey::Greenhouse(_) => Some(self.inner.config.detail_poll_interval),
            QueryKey::Plants(_)
            | QueryKey::PlantTypes(_)
            | QueryKey::WhoAmI
            | QueryKey::Profile => None,
        }
    }

    /// Keep a recently switched AI-mode value when the server omitted it.
    fn apply_hold(&self, mut gh: Greenhouse) -> Greenhouse {
        if gh.ai_mode_reported {
            self.inner.holds.remove(&gh.id);
            return gh;
        }
        let hold = self.inner.holds.get(&gh.id).map(|h| *h);
        match hold {
            Some(hold) if hold.until > Instant::now() => {
                trace!(id = gh.id, enabled = hold.enabled, "AI mode held");
                gh.set_ai_mode(hold.enabled);
            }
            Some(_) => {
                self.inner.holds.remove(&gh.id);
            }
            None => {}
        }
        gh
    }

    // ── Auth ─────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: SecretString) -> Result<User, CoreError> {
        let resp = self.inner.api.login(email, password).await?;
        self.inner.store.invalidate(&QueryKey::WhoAmI);
        self.navigate(Route::Greenhouses);
        info!(user = %resp.user.email, "logged in");
        Ok(resp.user)
    }

    /// Create an account and start a session for it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, CoreError> {
        if request.email.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Email is required".into(),
            });
        }
        let resp = self.inner.api.register(request).await?;
        self.inner.store.invalidate(&QueryKey::WhoAmI);
        self.inner.store.invalidate(&QueryKey::Profile);
        self.navigate(Route::Greenhouses);
        self.notify(Notification::success("Account created"));
        info!(user = %resp.user.email, "registered");
        Ok(resp.user)
    }

    pub async fn profile(&self) -> Result<User, CoreError> {
        match self.fetch(QueryKey::Profile).await? {
            QueryValue::User(user) => Ok(user),
            other => Err(unexpected(&other)),
        }
    }

    /// Change the user's names, patching the cached profile up front.
    pub async fn update_profile(&self, update: UpdateProfile) -> Result<User, CoreError> {
        if update.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Nothing to update".into(),
            });
        }
        let profile = QueryKey::Profile;
        let whoami = QueryKey::WhoAmI;
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new()
                .touch(profile)
                .touch(whoami)
                .invalidate(profile)
                .invalidate(whoami),
        );
        mutation.begin(|store| {
            for key in [profile, whoami] {
                store.set(&key, |value| {
                    if let Some(user) = value.as_mut().and_then(QueryValue::as_user_mut) {
                        update.apply_to(user);
                    }
                });
            }
        });

        let result = self
            .inner
            .api
            .update_profile(&update)
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(user) => {
                self.notify(Notification::success("Profile updated"));
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "profile update failed");
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn whoami(&self) -> Result<User, CoreError> {
        match self.fetch(QueryKey::WhoAmI).await? {
            QueryValue::User(user) => Ok(user),
            other => Err(unexpected(&other)),
        }
    }

    /// Drop the session and everything cached under it.
    pub fn logout(&self) {
        self.inner.api.logout();
        self.reset_cache();
        self.navigate(Route::Login);
        info!("logged out");
    }

    fn reset_cache(&self) {
        self.inner.store.clear();
        self.inner.holds.clear();
    }

    /// Session expired underneath us: stop syncing, clear state, and go
    /// to login.
    fn handle_session_expired(&self) {
        warn!("session expired, returning to login");
        self.stop_syncing();
        self.reset_cache();
        self.navigate(Route::Login);
        self.notify(Notification::error("Your session has expired. Please log in again."));
    }

    // ── Assistant ────────────────────────────────────────────────────

    /// Ask the assistant, sending everything said so far as history.
    ///
    /// A failure raises [`CHAT_FAILURE`] as an error notification.
    pub async fn chat(
        &self,
        message: &str,
        history: Vec<ChatHistoryItem>,
    ) -> Result<String, CoreError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Message is empty".into(),
            });
        }
        let request = ChatRequest {
            message: message.to_owned(),
            history,
        };
        match self.inner.api.send_chat(&request).await {
            Ok(reply) => Ok(reply.reply),
            Err(e) => {
                let e = CoreError::from(e);
                warn!(error = %e, "chat request failed");
                if !e.is_session_expired() {
                    self.notify(Notification::error(CHAT_FAILURE));
                }
                Err(e)
            }
        }
    }

    // ── Notifications ────────────────────────────────────────────────

    fn notify(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.inner.notifications.send(notification);
    }

    fn notify_failure(&self, err: &CoreError) {
        if !err.is_session_expired() {
            self.notify(Notification::error(err.user_message()));
        }
    }

    // ── Device mutations ─────────────────────────────────────────────

    /// Switch a device on or off, optimistically.
    ///
    /// The cached detail's stats bag is patched at the device's state key
    /// while the command goes out under its command segment. The detail is
    /// refetched once the call settles either way.
    pub async fn switch_device(
        &self,
        id: i64,
        kind: DeviceKind,
        on: bool,
    ) -> Result<(), CoreError> {
        let key = QueryKey::Greenhouse(id);
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new().touch(key).invalidate(key),
        );
        mutation.begin(|store| {
            store.set(&key, |value| {
                if let Some(gh) = value.as_mut().and_then(QueryValue::as_greenhouse_mut) {
                    gh.stats_mut().set(kind.state_key(), u8::from(on));
                }
            });
        });

        let result = self
            .inner
            .api
            .switch_device(id, kind.command_segment(), on)
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(_) => {
                debug!(id, %kind, on, "device switched");
                Ok(())
            }
            Err(e) => {
                warn!(id, %kind, on, error = %e, "device switch failed");
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    /// Flip a device based on its cached state.
    ///
    /// Refused for offline devices and while AI mode is on. Returns the
    /// new on/off state.
    pub async fn toggle_device(&self, id: i64, kind: DeviceKind) -> Result<bool, CoreError> {
        let gh = match self.inner.store.get(&QueryKey::Greenhouse(id)).greenhouse() {
            Some(gh) => gh.clone(),
            None => self.greenhouse(id).await?,
        };
        let view = DeviceView::derive(kind, gh.stats.as_ref(), gh.ai_mode_enabled());
        if !view.is_online() {
            return Err(CoreError::DeviceOffline {
                device: kind.label().into(),
            });
        }
        if !view.controls_enabled {
            return Err(CoreError::ValidationFailed {
                message: "Manual control is disabled while AI mode is on".into(),
            });
        }
        let target = !view.is_on();
        self.switch_device(id, kind, target).await?;
        Ok(target)
    }

    /// Switch AI mode, optimistically.
    ///
    /// On success nothing is invalidated: the backend answers reads with
    /// the field missing for a while after the switch. A hold keeps the
    /// switched value through those reads for `ai_mode_hold`.
    pub async fn switch_ai_mode(&self, id: i64, on: bool) -> Result<(), CoreError> {
        let detail = QueryKey::Greenhouse(id);
        let list = QueryKey::Greenhouses;
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new()
                .touch(detail)
                .touch(list)
                .invalidate(detail)
                .invalidate(list)
                .reconcile(Reconcile::SkipOnSuccess),
        );
        mutation.begin(|store| {
            store.set(&detail, |value| {
                if let Some(gh) = value.as_mut().and_then(QueryValue::as_greenhouse_mut) {
                    gh.set_ai_mode(on);
                }
            });
            store.set(&list, |value| {
                if let Some(list) = value.as_mut().and_then(QueryValue::as_greenhouses_mut) {
                    list.iter_mut()
                        .filter(|gh| gh.id == id)
                        .for_each(|gh| gh.set_ai_mode(on));
                }
            });
        });

        let result = self
            .inner
            .api
            .switch_ai_mode(id, on)
            .await
            .map_err(CoreError::from);
        if result.is_ok() {
            self.inner.holds.insert(
                id,
                AiHold {
                    enabled: on,
                    until: Instant::now() + self.inner.config.ai_mode_hold,
                },
            );
        }
        mutation.settle_with(&result);

        match result {
            Ok(_) => {
                info!(id, on, "AI mode switched");
                self.notify(Notification::success(if on {
                    "AI mode enabled"
                } else {
                    "AI mode disabled"
                }));
                Ok(())
            }
            Err(e) => {
                warn!(id, on, error = %e, "AI mode switch failed");
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    // ── Greenhouse mutations ─────────────────────────────────────────

    pub async fn create_greenhouse(&self, name: &str) -> Result<Greenhouse, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Greenhouse name is required".into(),
            });
        }
        let mutation = {
            let mut m = OptimisticMutation::new(
                Arc::clone(&self.inner.store),
                MutationPlan::new().invalidate(QueryKey::Greenhouses),
            );
            m.begin(|_| {});
            m
        };
        let result = self
            .inner
            .api
            .create_greenhouse(&CreateGreenhouse { name: name.into() })
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(gh) => {
                info!(id = gh.id, name = %gh.name, "greenhouse created");
                self.notify(Notification::success(format!("Greenhouse \"{}\" created", gh.name)));
                Ok(gh)
            }
            Err(e) => {
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    /// Patch a greenhouse in the detail and list caches, then send it.
    pub async fn update_greenhouse(
        &self,
        id: i64,
        update: UpdateGreenhouse,
    ) -> Result<Greenhouse, CoreError> {
        let detail = QueryKey::Greenhouse(id);
        let list = QueryKey::Greenhouses;
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new()
                .touch(detail)
                .touch(list)
                .invalidate(detail)
                .invalidate(list),
        );
        mutation.begin(|store| {
            store.set(&detail, |value| {
                if let Some(gh) = value.as_mut().and_then(QueryValue::as_greenhouse_mut) {
                    update.apply_to(gh);
                }
            });
            store.set(&list, |value| {
                if let Some(list) = value.as_mut().and_then(QueryValue::as_greenhouses_mut) {
                    list.iter_mut()
                        .filter(|gh| gh.id == id)
                        .for_each(|gh| update.apply_to(gh));
                }
            });
        });

        let result = self
            .inner
            .api
            .update_greenhouse(id, &update)
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(gh) => {
                self.notify(Notification::success("Greenhouse updated"));
                Ok(gh)
            }
            Err(e) => {
                warn!(id, error = %e, "greenhouse update failed");
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn rename_greenhouse(&self, id: i64, name: &str) -> Result<Greenhouse, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Greenhouse name is required".into(),
            });
        }
        self.update_greenhouse(id, UpdateGreenhouse::rename(name))
            .await
    }

    pub async fn update_settings(
        &self,
        id: i64,
        settings: GreenhouseSettings,
    ) -> Result<Greenhouse, CoreError> {
        self.update_greenhouse(id, UpdateGreenhouse::settings(settings))
            .await
    }

    /// Delete a greenhouse, dropping it from the caches up front.
    ///
    /// On success the detail stops syncing and the front end is routed to
    /// the collection.
    pub async fn delete_greenhouse(&self, id: i64) -> Result<(), CoreError> {
        let detail = QueryKey::Greenhouse(id);
        let list = QueryKey::Greenhouses;
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new().touch(detail).touch(list).invalidate(list),
        );
        mutation.begin(|store| {
            store.set(&list, |value| {
                if let Some(list) = value.as_mut().and_then(QueryValue::as_greenhouses_mut) {
                    list.retain(|gh| gh.id != id);
                }
            });
            store.set(&detail, |value| *value = None);
        });

        let result = self
            .inner
            .api
            .delete_greenhouse(id)
            .await
            .map_err(CoreError::from);
        if result.is_ok() {
            self.unwatch(&detail);
            self.unwatch(&QueryKey::Plants(id));
            self.unwatch(&QueryKey::PlantTypes(id));
            self.inner.holds.remove(&id);
        }
        mutation.settle_with(&result);

        match result {
            Ok(message) => {
                info!(id, %message, "greenhouse deleted");
                self.notify(Notification::success("Greenhouse deleted"));
                self.navigate(Route::Greenhouses);
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "greenhouse delete failed");
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    // ── Plant mutations ──────────────────────────────────────────────

    pub async fn create_plant(
        &self,
        greenhouse_id: i64,
        plant: CreatePlant,
    ) -> Result<Plant, CoreError> {
        let key = QueryKey::Plants(greenhouse_id);
        let mutation = {
            let mut m = OptimisticMutation::new(
                Arc::clone(&self.inner.store),
                MutationPlan::new().invalidate(key),
            );
            m.begin(|_| {});
            m
        };
        let result = self
            .inner
            .api
            .create_plant(greenhouse_id, &plant)
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(plant) => {
                self.notify(Notification::success(format!("Plant \"{}\" added", plant.name)));
                Ok(plant)
            }
            Err(e) => {
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn update_plant(
        &self,
        greenhouse_id: i64,
        plant_id: i64,
        update: UpdatePlant,
    ) -> Result<Plant, CoreError> {
        if update.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Nothing to update".into(),
            });
        }
        let key = QueryKey::Plants(greenhouse_id);
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new().touch(key).invalidate(key),
        );
        mutation.begin(|store| {
            store.set(&key, |value| {
                if let Some(plants) = value.as_mut().and_then(QueryValue::as_plants_mut) {
                    plants
                        .iter_mut()
                        .filter(|p| p.id == plant_id)
                        .for_each(|p| update.apply_to(p));
                }
            });
        });

        let result = self
            .inner
            .api
            .update_plant(greenhouse_id, plant_id, &update)
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(plant) => {
                self.notify(Notification::success("Plant updated"));
                Ok(plant)
            }
            Err(e) => {
                self.notify_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn delete_plant(&self, greenhouse_id: i64, plant_id: i64) -> Result<(), CoreError> {
        let key = QueryKey::Plants(greenhouse_id);
        let mut mutation = OptimisticMutation::new(
            Arc::clone(&self.inner.store),
            MutationPlan::new().touch(key).invalidate(key),
        );
        mutation.begin(|store| {
            store.set(&key, |value| {
                if let Some(plants) = value.as_mut().and_then(QueryValue::as_plants_mut) {
                    plants.retain(|p| p.id != plant_id);
                }
            });
        });

        let result = self
            .inner
            .api
            .delete_plant(greenhouse_id, plant_id)
            .await
            .map_err(CoreError::from);
        mutation.settle_with(&result);

        match result {
            Ok(()) => {
                self.notify(Notification::success("Plant removed"));
                Ok(())
            }
            Err(e) => {
                self.notify_failure(&e);
                Err(e)
            }
        }
    }
}

fn unexpected(value: &QueryValue) -> CoreError {
    CoreError::UnexpectedResponse {
        message: format!("unexpected cached value: {value:?}"),
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Reacts to session state changes published by the transport.
async fn session_watch_task(controller: Controller, cancel: CancellationToken) {
    let mut state = controller.session().subscribe();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                debug!(?current, "session state changed");
                if current == SessionState::Expired {
                    controller.handle_session_expired();
                }
            }
        }
    }
}
