// ── Explorer ──
//
// Orchestration facade over the Conseil clients and the state store.
// Every thunk reads the store, talks to the selected network's server and
// dispatches the outcome. Interactive consumers route thunks through the
// command channel; one-shot consumers call them directly.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use arronax_api::transport::{TlsMode, TransportConfig};
use arronax_api::{ConseilClient, ConseilQuery, EntityDefinition, NetworkDefinition};

use crate::command::{CommandEnvelope, CommandResult, ExplorerCommand};
use crate::config::{ExplorerConfig, NetworkConfig, TlsVerification};
use crate::error::CoreError;
use crate::export;
use crate::model::{AttributeDefinition, EntityKind, Record, Sort};
use crate::query;
use crate::store::{
    AvailableValues, ExplorerState, StateStore, StoreAction, selectors,
};
use crate::stream::StateStream;

const COMMAND_CHANNEL_SIZE: usize = 32;

/// Cache key for distinct attribute values: network, entity, attribute, prefix.
type ValueKey = (String, EntityKind, String, Option<String>);

// ── Explorer ─────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ExplorerInner>`. Owns one Conseil client per
/// configured network, the state store, and the command processor.
#[derive(Clone)]
pub struct Explorer {
    inner: Arc<ExplorerInner>,
}

struct ExplorerInner {
    config: ExplorerConfig,
    store: StateStore,
    clients: HashMap<String, ConseilClient>,
    value_cache: DashMap<ValueKey, Arc<Vec<String>>>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Explorer {
    /// Create an explorer from configuration. Builds the HTTP clients but
    /// does not contact any server and does not spawn the command
    /// processor; call [`start()`](Self::start) for interactive use.
    pub fn new(config: ExplorerConfig) -> Result<Self, CoreError> {
        let default = config.network(&config.default_network).ok_or_else(|| {
            CoreError::NetworkNotConfigured {
                network: config.default_network.clone(),
            }
        })?;

        let initial = ExplorerState::new(
            config.default_network.clone(),
            default.platform.clone(),
            config.default_entity,
            config.row_count,
        );

        let mut clients = HashMap::with_capacity(config.networks.len());
        for (name, network) in &config.networks {
            let client = ConseilClient::new(
                network.url.as_str(),
                &network.api_key,
                &build_transport(network),
            )?;
            clients.insert(name.clone(), client);
        }

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ExplorerInner {
                config,
                store: StateStore::new(initial),
                clients,
                value_cache: DashMap::new(),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        })
    }

    /// Access the explorer configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.inner.config
    }

    /// Access the underlying state store.
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    pub fn snapshot(&self) -> Arc<ExplorerState> {
        self.inner.store.snapshot()
    }

    pub fn subscribe(&self) -> StateStream {
        self.inner.store.subscribe()
    }

    /// Apply a plain state action (filter edits, page size, modal close).
    pub fn dispatch(&self, action: StoreAction) {
        self.inner.store.dispatch(action);
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the command processor. Calling it twice is a no-op.
    pub async fn start(&self) {
        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            return;
        };
        let handle = tokio::spawn(command_processor_task(
            self.clone(),
            rx,
            self.inner.cancel.clone(),
        ));
        *self.inner.task_handle.lock().await = Some(handle);
        debug!("command processor started");
    }

    /// Stop the command processor and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task_handle.lock().await.take() {
            let _ = handle.await;
        }
        debug!("explorer shut down");
    }

    // ── Command execution ────────────────────────────────────────

    /// Run a command on the command processor and await its result.
    pub async fn execute(&self, cmd: ExplorerCommand) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() || self.inner.task_handle.lock().await.is_none() {
            return Err(CoreError::ExplorerStopped);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ExplorerStopped)?;

        rx.await.map_err(|_| CoreError::ExplorerStopped)?
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: build, run closure, drop.
    ///
    /// For CLI use: the closure calls thunks directly, so no command
    /// processor is spawned.
    pub async fn oneshot<F, Fut, T>(config: ExplorerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Explorer) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let explorer = Explorer::new(config)?;
        let result = f(explorer.clone()).await;
        explorer.shutdown().await;
        result
    }

    // ── Thunks ───────────────────────────────────────────────────

    /// Load attribute definitions of the selected entity unless already loaded.
    pub async fn fetch_attributes(&self) -> Result<(), CoreError> {
        let entity = self.inner.store.select(selectors::entity);
        self.load_attributes(entity).await
    }

    /// Fetch the distinct values of `attribute` for the value-select.
    pub async fn fetch_values(&self, attribute: &str) -> Result<(), CoreError> {
        self.fetch_values_inner(attribute, None).await
    }

    /// Fetch the distinct values of `attribute` starting with `prefix`.
    pub async fn fetch_values_for_prefix(
        &self,
        attribute: &str,
        prefix: &str,
    ) -> Result<(), CoreError> {
        self.fetch_values_inner(attribute, Some(prefix)).await
    }

    async fn fetch_values_inner(
        &self,
        attribute: &str,
        prefix: Option<&str>,
    ) -> Result<(), CoreError> {
        let entity = self.inner.store.select(selectors::entity);
        self.with_loading(self.load_values(entity, attribute, prefix))
            .await
    }

    /// Reset the selected entity's columns to the initial subset of its attributes.
    pub fn fetch_columns(&self) {
        let entity = self.inner.store.select(selectors::entity);
        self.load_columns(entity);
    }

    /// Load attributes, columns and the newest rows of `entity`, unless rows
    /// are already present.
    pub async fn fetch_items(&self, entity: EntityKind) -> Result<(), CoreError> {
        if !self.inner.store.select(|s| s.entity(entity).items.is_empty()) {
            return Ok(());
        }

        self.with_loading(self.load_items(entity)).await
    }

    /// Select `entity` and make sure its rows are loaded.
    pub async fn change_entity(&self, entity: EntityKind) -> Result<(), CoreError> {
        self.dispatch(StoreAction::SetEntity(entity));
        self.fetch_items(entity).await
    }

    /// Switch to another configured network, dropping everything fetched
    /// from the previous one, and load the selected entity afresh.
    pub async fn change_network(&self, network: &str) -> Result<(), CoreError> {
        if self.inner.store.select(|s| s.network == network) {
            return Ok(());
        }
        let config = self.network_config(network)?;
        info!(network, "changing network");

        self.with_loading(self.reset_to_network(network, &config.platform))
            .await
    }

    /// Re-query the selected entity with its filters, page size and sort.
    pub async fn submit_query(&self) -> Result<(), CoreError> {
        let entity = self.inner.store.select(selectors::entity);
        self.with_loading(self.load_filtered_items(entity)).await
    }

    /// Sort the selected entity by `order_by` using the header toggle rule,
    /// then re-query.
    pub async fn set_sort(&self, order_by: &str) -> Result<(), CoreError> {
        let (entity, current) = self
            .inner
            .store
            .select(|s| (s.selected_entity, selectors::sort(s)));
        let sort = Sort::toggle(current.as_ref(), order_by);
        debug!(%entity, order_by, order = %sort.order, "sorting");
        self.dispatch(StoreAction::SetSort { entity, sort });
        self.submit_query().await
    }

    /// Fetch the single record of the selected entity with `key = value`
    /// and publish it as the modal item.
    pub async fn get_item_by_primary_key(&self, key: &str, value: &str) -> Result<Record, CoreError> {
        let entity = self.inner.store.select(selectors::entity);
        self.with_loading(self.load_modal_item(entity, key, value))
            .await
    }

    /// Drop the selected entity's rows and fetch them again.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let entity = self.inner.store.select(selectors::entity);
        self.dispatch(StoreAction::SetItems {
            entity,
            items: Vec::new(),
            limit: 0,
        });
        self.fetch_items(entity).await
    }

    /// Write the selected entity's rows, restricted to its columns, as CSV.
    pub fn export_csv<W: io::Write>(&self, writer: W) -> Result<usize, CoreError> {
        let (columns, items) = self
            .inner
            .store
            .select(|s| (s.current().columns.clone(), s.current().items.clone()));
        export::write_csv(writer, &columns, &items)
    }

    // ── Direct metadata access (CLI) ─────────────────────────────

    /// Every network the selected network's server indexes, across all of
    /// its platforms.
    pub async fn remote_networks(&self) -> Result<Vec<NetworkDefinition>, CoreError> {
        let (network, _) = self.location();
        let client = self.client(&network)?;
        let mut networks = Vec::new();
        for platform in client.get_platforms().await? {
            debug!(platform = %platform.name, "listing remote networks");
            networks.extend(client.get_networks(&platform.name).await?);
        }
        Ok(networks)
    }

    /// Entities of the selected network, with record counts.
    pub async fn entities(&self) -> Result<Vec<EntityDefinition>, CoreError> {
        let (network, platform) = self.location();
        Ok(self
            .client(&network)?
            .get_entities(&platform, &network)
            .await?)
    }

    /// Attribute definitions of `entity`, loading them if needed.
    pub async fn attributes(
        &self,
        entity: EntityKind,
    ) -> Result<Arc<Vec<AttributeDefinition>>, CoreError> {
        self.load_attributes(entity).await?;
        Ok(self.inner.store.select(|s| s.entity(entity).attributes.clone()))
    }

    /// Distinct values of an attribute, cached per network.
    pub async fn attribute_values(
        &self,
        entity: EntityKind,
        attribute: &str,
        prefix: Option<&str>,
    ) -> Result<Arc<Vec<String>>, CoreError> {
        let (network, platform) = self.location();
        let key: ValueKey = (
            network.clone(),
            entity,
            attribute.to_owned(),
            prefix.map(str::to_owned),
        );
        if let Some(hit) = self.inner.value_cache.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let client = self.client(&network)?;
        let values = match prefix {
            Some(prefix) => {
                client
                    .get_attribute_values_for_prefix(
                        &platform,
                        &network,
                        entity.as_str(),
                        attribute,
                        prefix,
                    )
                    .await?
            }
            None => {
                client
                    .get_attribute_values(&platform, &network, entity.as_str(), attribute)
                    .await?
            }
        };
        debug!(%entity, attribute, count = values.len(), "fetched attribute values");

        let values = Arc::new(values);
        self.inner.value_cache.insert(key, Arc::clone(&values));
        Ok(values)
    }

    /// Run an arbitrary query for `entity` on the selected network.
    pub async fn run_query(
        &self,
        entity: EntityKind,
        query: &ConseilQuery,
    ) -> Result<Vec<Record>, CoreError> {
        let (network, platform) = self.location();
        Ok(self
            .client(&network)?
            .execute_entity_query(&platform, &network, entity.as_str(), query)
            .await?)
    }

    // ── Helpers ──────────────────────────────────────────────────

    async fn load_attributes(&self, entity: EntityKind) -> Result<(), CoreError> {
        if !self
            .inner
            .store
            .select(|s| s.entity(entity).attributes.is_empty())
        {
            return Ok(());
        }

        self.with_loading(self.request_attributes(entity)).await
    }

    async fn request_attributes(&self, entity: EntityKind) -> Result<(), CoreError> {
        let (network, platform) = self.location();
        let attributes = self
            .client(&network)?
            .get_attributes(&platform, &network, entity.as_str())
            .await?;
        debug!(%entity, count = attributes.len(), "fetched attributes");
        self.dispatch(StoreAction::SetAttributes { entity, attributes });
        Ok(())
    }

    async fn load_values(
        &self,
        entity: EntityKind,
        attribute: &str,
        prefix: Option<&str>,
    ) -> Result<(), CoreError> {
        let values = self.attribute_values(entity, attribute, prefix).await?;
        self.dispatch(StoreAction::SetAvailableValues(Some(AvailableValues {
            entity,
            attribute: attribute.to_owned(),
            prefix: prefix.map(str::to_owned),
            values: values.to_vec(),
        })));
        Ok(())
    }

    async fn load_items(&self, entity: EntityKind) -> Result<(), CoreError> {
        self.load_attributes(entity).await?;
        self.load_columns(entity);

        let attributes = self
            .inner
            .store
            .select(|s| s.entity(entity).attributes.clone());
        let query = query::items_query(&attributes, self.inner.config.fetch_limit)?;
        let items = self.run_query(entity, &query).await?;
        debug!(%entity, rows = items.len(), "fetched items");
        self.dispatch(StoreAction::SetItems {
            entity,
            items,
            limit: query.limit,
        });
        Ok(())
    }

    async fn reset_to_network(&self, network: &str, platform: &str) -> Result<(), CoreError> {
        self.dispatch(StoreAction::InitData);
        self.dispatch(StoreAction::SetNetwork {
            network: network.to_owned(),
            platform: platform.to_owned(),
        });
        let entity = self.inner.store.select(selectors::entity);
        self.fetch_items(entity).await
    }

    async fn load_filtered_items(&self, entity: EntityKind) -> Result<(), CoreError> {
        self.load_attributes(entity).await?;

        let query = self
            .inner
            .store
            .select(|s| query::filter_query(entity, s.entity(entity), s.row_count))?;
        let items = self.run_query(entity, &query).await?;
        debug!(
            %entity,
            rows = items.len(),
            predicates = query.predicates.len(),
            "query submitted"
        );
        self.dispatch(StoreAction::SetItems {
            entity,
            items,
            limit: query.limit,
        });
        Ok(())
    }

    async fn load_modal_item(
        &self,
        entity: EntityKind,
        key: &str,
        value: &str,
    ) -> Result<Record, CoreError> {
        self.load_attributes(entity).await?;
        let attributes = self
            .inner
            .store
            .select(|s| s.entity(entity).attributes.clone());
        let query = query::primary_key_query(&attributes, key, value)?;
        let mut rows = self.run_query(entity, &query).await?;

        let item = if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        };
        self.dispatch(StoreAction::SetModalItem {
            entity,
            key: key.to_owned(),
            value: value.to_owned(),
            item: item.clone(),
        });

        item.ok_or_else(|| CoreError::RecordNotFound {
            entity: entity.to_string(),
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    fn load_columns(&self, entity: EntityKind) {
        let columns = self
            .inner
            .store
            .select(|s| query::initial_columns(entity, &s.entity(entity).attributes));
        self.dispatch(StoreAction::SetColumns { entity, columns });
    }

    /// Bracket a thunk with the loading flag and record its failure.
    async fn with_loading<T>(
        &self,
        fut: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        self.dispatch(StoreAction::SetLoading(true));
        let result = fut.await;
        match &result {
            Ok(_) => self.dispatch(StoreAction::SetError(None)),
            Err(e) => {
                warn!(error = %e, "explorer request failed");
                self.dispatch(StoreAction::SetError(Some(e.summary())));
            }
        }
        self.dispatch(StoreAction::SetLoading(false));
        result
    }

    fn location(&self) -> (String, String) {
        self.inner
            .store
            .select(|s| (s.network.clone(), s.platform.clone()))
    }

    fn network_config(&self, network: &str) -> Result<&NetworkConfig, CoreError> {
        self.inner
            .config
            .network(network)
            .ok_or_else(|| CoreError::NetworkNotConfigured {
                network: network.to_owned(),
            })
    }

    fn client(&self, network: &str) -> Result<&ConseilClient, CoreError> {
        self.inner
            .clients
            .get(network)
            .ok_or_else(|| CoreError::NetworkNotConfigured {
                network: network.to_owned(),
            })
    }
}

// ── Command processing ───────────────────────────────────────────

async fn command_processor_task(
    explorer: Explorer,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&explorer, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

/// Run a command against the explorer's thunks.
async fn route_command(
    explorer: &Explorer,
    cmd: ExplorerCommand,
) -> Result<CommandResult, CoreError> {
    debug!(?cmd, "routing command");
    match cmd {
        ExplorerCommand::FetchAttributes => explorer.fetch_attributes().await?,
        ExplorerCommand::FetchValues { attribute } => explorer.fetch_values(&attribute).await?,
        ExplorerCommand::FetchValuesForPrefix { attribute, prefix } => {
            explorer.fetch_values_for_prefix(&attribute, &prefix).await?;
        }
        ExplorerCommand::FetchColumns => explorer.fetch_columns(),
        ExplorerCommand::FetchItems { entity } => explorer.fetch_items(entity).await?,
        ExplorerCommand::ChangeEntity { entity } => explorer.change_entity(entity).await?,
        ExplorerCommand::ChangeNetwork { network } => explorer.change_network(&network).await?,
        ExplorerCommand::SubmitQuery => explorer.submit_query().await?,
        ExplorerCommand::SetSort { order_by } => explorer.set_sort(&order_by).await?,
        ExplorerCommand::GetItemByPrimaryKey { key, value } => {
            let item = explorer.get_item_by_primary_key(&key, &value).await?;
            return Ok(CommandResult::Item(Box::new(item)));
        }
        ExplorerCommand::Refresh => explorer.refresh().await?,
    }
    Ok(CommandResult::Ok)
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from one network's configuration.
fn build_transport(config: &NetworkConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
