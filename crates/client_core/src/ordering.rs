//! Ordered collections and the reorder/delete persistence protocol.
//!
//! Every orderable collection keeps a dense zero-based `order` field. A
//! gesture is applied to the local view first, the new positions are written
//! back item by item, and the collection is then replaced wholesale by a fresh
//! read from the backend.

use std::{fmt, future::Future, str::FromStr, sync::Arc};

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Map, Value};
use shared::{
    domain::{ChecklistId, ItemId, LicensingId, ProjectId, ResourceType},
    protocol::{NewOrderableItem, OrderableItem},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{error::ClientError, DashboardClient, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderedCollection {
    ProjectLines(ProjectId),
    ProjectTypes,
    LicensingAuthorizations(LicensingId),
    ChecklistEntries(ChecklistId),
    ProjectAttachments(ProjectId),
}

impl OrderedCollection {
    pub fn path(&self) -> String {
        match self {
            OrderedCollection::ProjectLines(project) => format!("projects/{project}/lines"),
            OrderedCollection::ProjectTypes => "project-types".to_string(),
            OrderedCollection::LicensingAuthorizations(licensing) => {
                format!("licensings/{licensing}/authorizations")
            }
            OrderedCollection::ChecklistEntries(checklist) => {
                format!("checklists/{checklist}/entries")
            }
            OrderedCollection::ProjectAttachments(project) => {
                format!("projects/{project}/attachments")
            }
        }
    }

    pub fn item_path(&self, id: ItemId) -> String {
        format!("{}/{id}", self.path())
    }

    /// The resource whose grants govern changes to this collection.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            OrderedCollection::LicensingAuthorizations(_) => ResourceType::Licensings,
            OrderedCollection::ProjectLines(_)
            | OrderedCollection::ProjectTypes
            | OrderedCollection::ChecklistEntries(_)
            | OrderedCollection::ProjectAttachments(_) => ResourceType::Projects,
        }
    }
}

impl fmt::Display for OrderedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Parses the `kind[:parent]` notation used on the command line, e.g.
/// `checklist:12` or `project-types`.
impl FromStr for OrderedCollection {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || ClientError::UnsupportedCollection(s.to_string());
        let (kind, parent) = match s.split_once(':') {
            Some((kind, parent)) => {
                let parent = parent.trim().parse::<i64>().map_err(|_| unsupported())?;
                (kind.trim(), Some(parent))
            }
            None => (s.trim(), None),
        };

        match (kind, parent) {
            ("project-lines", Some(id)) => Ok(OrderedCollection::ProjectLines(ProjectId(id))),
            ("project-types", None) => Ok(OrderedCollection::ProjectTypes),
            ("authorizations", Some(id)) => {
                Ok(OrderedCollection::LicensingAuthorizations(LicensingId(id)))
            }
            ("checklist", Some(id)) => Ok(OrderedCollection::ChecklistEntries(ChecklistId(id))),
            ("attachments", Some(id)) => Ok(OrderedCollection::ProjectAttachments(ProjectId(id))),
            _ => Err(unsupported()),
        }
    }
}

/// Moves the element at `source` to `destination`; all other elements keep
/// their relative order.
pub fn splice<T>(items: &mut Vec<T>, source: usize, destination: usize) -> Result<()> {
    let len = items.len();
    for index in [source, destination] {
        if index >= len {
            return Err(ClientError::IndexOutOfRange { index, len });
        }
    }
    let moved = items.remove(source);
    items.insert(destination, moved);
    Ok(())
}

/// Sets each item's `order` to its position.
pub fn renumber(items: &mut [OrderableItem]) {
    for (position, item) in items.iter_mut().enumerate() {
        item.order = position as u32;
    }
}

/// Whether the `order` values are exactly `0..len` with no gaps or repeats.
pub fn is_dense(items: &[OrderableItem]) -> bool {
    let mut orders: Vec<u32> = items.iter().map(|item| item.order).collect();
    orders.sort_unstable();
    orders
        .into_iter()
        .enumerate()
        .all(|(position, order)| order as usize == position)
}

/// Remote persistence for ordered collections.
#[async_trait]
pub trait CollectionBackend: Send + Sync {
    async fn list(&self, collection: &OrderedCollection) -> Result<Vec<OrderableItem>>;
    async fn update(&self, collection: &OrderedCollection, item: &OrderableItem) -> Result<()>;
    async fn create(
        &self,
        collection: &OrderedCollection,
        item: &NewOrderableItem,
    ) -> Result<OrderableItem>;
    async fn remove(&self, collection: &OrderedCollection, id: ItemId) -> Result<()>;
}

#[async_trait]
impl CollectionBackend for DashboardClient {
    async fn list(&self, collection: &OrderedCollection) -> Result<Vec<OrderableItem>> {
        let mut items: Vec<OrderableItem> = self.get_json(&collection.path()).await?;
        items.sort_by_key(|item| item.order);
        Ok(items)
    }

    async fn update(&self, collection: &OrderedCollection, item: &OrderableItem) -> Result<()> {
        self.put_json(&collection.item_path(item.id), item).await
    }

    async fn create(
        &self,
        collection: &OrderedCollection,
        item: &NewOrderableItem,
    ) -> Result<OrderableItem> {
        self.post_json(&collection.path(), item).await
    }

    async fn remove(&self, collection: &OrderedCollection, id: ItemId) -> Result<()> {
        DashboardClient::delete(self, &collection.item_path(id)).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Local view matches the last fetch.
    Stable,
    /// A gesture was applied locally and positions are being written.
    Reordering,
    /// Writes are done; the collection is being re-read.
    Reconciling,
}

/// Outcome of one persistence pass. Failed writes are reported, not raised.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub attempted: usize,
    pub failures: Vec<(ItemId, ClientError)>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failures.iter().map(|(id, _)| *id).collect()
    }
}

#[derive(Debug)]
struct CollectionState {
    phase: SyncPhase,
    items: Vec<OrderableItem>,
    confirmed: Vec<OrderableItem>,
    generation: u64,
}

/// Keeps one ordered collection in step with the backend.
///
/// Mutating operations are serialized by an internal gate: a gesture issued
/// while another is in flight waits for it to reconcile and then splices the
/// refreshed list.
pub struct OrderedCollectionSync<B: CollectionBackend + ?Sized> {
    backend: Arc<B>,
    collection: OrderedCollection,
    gate: Mutex<()>,
    state: RwLock<CollectionState>,
}

impl<B: CollectionBackend + ?Sized> OrderedCollectionSync<B> {
    pub fn new(backend: Arc<B>, collection: OrderedCollection) -> Self {
        Self {
            backend,
            collection,
            gate: Mutex::new(()),
            state: RwLock::new(CollectionState {
                phase: SyncPhase::Stable,
                items: Vec::new(),
                confirmed: Vec::new(),
                generation: 0,
            }),
        }
    }

    pub fn collection(&self) -> OrderedCollection {
        self.collection
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// The local view, including any optimistic change not yet reconciled.
    pub async fn items(&self) -> Vec<OrderableItem> {
        self.state.read().await.items.clone()
    }

    pub async fn phase(&self) -> SyncPhase {
        self.state.read().await.phase
    }

    /// Number of gestures applied so far.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn refresh(&self) -> Result<Vec<OrderableItem>> {
        let _gate = self.gate.lock().await;
        self.reconcile().await
    }

    /// Applies a drop from `source` to `destination`.
    ///
    /// A drop with no destination is ignored. Otherwise every item in the
    /// collection gets its new position written, even when `source ==
    /// destination`, and the collection is re-read afterwards. Only a failed
    /// re-read is an error.
    pub async fn reorder(
        &self,
        source: usize,
        destination: Option<usize>,
    ) -> Result<PersistReport> {
        let Some(destination) = destination else {
            debug!(collection = %self.collection, source, "ordering: drop outside target ignored");
            return Ok(PersistReport::default());
        };

        let _gate = self.gate.lock().await;
        let items = {
            let mut state = self.state.write().await;
            let mut items = state.items.clone();
            splice(&mut items, source, destination)?;
            renumber(&mut items);
            state.items = items.clone();
            state.phase = SyncPhase::Reordering;
            state.generation += 1;
            items
        };
        info!(
            collection = %self.collection,
            source,
            destination,
            items = items.len(),
            "ordering: persisting reorder"
        );

        let report = self.persist(&items).await;
        self.reconcile().await?;
        Ok(report)
    }

    /// Deletes `id` remotely, then closes the gap it leaves.
    ///
    /// Only items whose position changed are written back.
    pub async fn delete(&self, id: ItemId) -> Result<PersistReport> {
        let _gate = self.gate.lock().await;
        let mut remaining = self.state.read().await.items.clone();
        let position = remaining
            .iter()
            .position(|item| item.id == id)
            .ok_or(ClientError::UnknownItem(id))?;

        self.backend.remove(&self.collection, id).await?;
        remaining.remove(position);
        let changed: Vec<OrderableItem> = remaining
            .iter_mut()
            .enumerate()
            .filter_map(|(index, item)| {
                let order = index as u32;
                (item.order != order).then(|| {
                    item.order = order;
                    item.clone()
                })
            })
            .collect();

        {
            let mut state = self.state.write().await;
            state.items = remaining;
            state.phase = SyncPhase::Reordering;
            state.generation += 1;
        }
        info!(
            collection = %self.collection,
            item_id = id.0,
            renumbered = changed.len(),
            "ordering: item deleted"
        );

        let report = self.persist(&changed).await;
        self.reconcile().await?;
        Ok(report)
    }

    /// Creates an item at the end of the collection.
    pub async fn append(&self, fields: Map<String, Value>) -> Result<OrderableItem> {
        let backend = Arc::clone(&self.backend);
        let collection = self.collection;
        self.append_with(move |order| async move {
            backend
                .create(&collection, &NewOrderableItem { order, fields })
                .await
        })
        .await
    }

    /// Runs `create` with the append position, then re-reads the collection.
    pub async fn append_with<F, Fut>(&self, create: F) -> Result<OrderableItem>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<OrderableItem>>,
    {
        let _gate = self.gate.lock().await;
        let order = self.state.read().await.items.len() as u32;
        let created = create(order).await?;
        debug!(
            collection = %self.collection,
            item_id = created.id.0,
            order,
            "ordering: item appended"
        );
        self.reconcile().await?;
        Ok(created)
    }

    async fn persist(&self, items: &[OrderableItem]) -> PersistReport {
        let writes = items.iter().map(|item| async move {
            (item.id, self.backend.update(&self.collection, item).await)
        });

        let mut report = PersistReport {
            attempted: items.len(),
            failures: Vec::new(),
        };
        for (id, outcome) in join_all(writes).await {
            if let Err(err) = outcome {
                warn!(
                    collection = %self.collection,
                    item_id = id.0,
                    error = %err,
                    "ordering: position update failed"
                );
                report.failures.push((id, err));
            }
        }
        report
    }

    async fn reconcile(&self) -> Result<Vec<OrderableItem>> {
        self.state.write().await.phase = SyncPhase::Reconciling;
        match self.backend.list(&self.collection).await {
            Ok(items) => {
                let mut state = self.state.write().await;
                state.items = items.clone();
                state.confirmed = items.clone();
                state.phase = SyncPhase::Stable;
                Ok(items)
            }
            Err(err) => {
                error!(
                    collection = %self.collection,
                    error = %err,
                    "ordering: refetch failed; keeping last fetched state"
                );
                let mut state = self.state.write().await;
                let confirmed = state.confirmed.clone();
                state.items = confirmed;
                state.phase = SyncPhase::Stable;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/ordering_tests.rs"]
mod tests;
