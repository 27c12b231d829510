//! Queue storage.

use async_trait::async_trait;
use goldrec_types::QueueItemId;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{QueueError, QueueResult};
use crate::item::{QueueItem, QueueItemUpdate, QueueStatus};

/// Persists queue items.
///
/// Adapters store what they are given. Transition rules are enforced by
/// [`crate::ReviewQueue`], not here.
#[async_trait]
pub trait QueueAdapter<T>: Send + Sync {
    /// Stores a new item. Fails if the id is taken.
    async fn insert_queue_item(&self, item: &QueueItem<T>) -> QueueResult<()>;

    async fn get_queue_item(&self, id: &QueueItemId) -> QueueResult<Option<QueueItem<T>>>;

    /// Applies a partial update and returns the updated item.
    async fn update_queue_item(
        &self,
        id: &QueueItemId,
        update: &QueueItemUpdate,
    ) -> QueueResult<QueueItem<T>>;

    /// Lists items, optionally filtered by status, oldest first.
    async fn list_queue_items(&self, status: Option<QueueStatus>) -> QueueResult<Vec<QueueItem<T>>>;
}

/// In-memory [`QueueAdapter`].
#[derive(Debug)]
pub struct InMemoryQueueAdapter<T> {
    items: RwLock<HashMap<QueueItemId, QueueItem<T>>>,
}

impl<T> Default for InMemoryQueueAdapter<T> {
    fn default() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> InMemoryQueueAdapter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl<T> QueueAdapter<T> for InMemoryQueueAdapter<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn insert_queue_item(&self, item: &QueueItem<T>) -> QueueResult<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(QueueError::OperationFailed {
                operation: "insert_queue_item",
                reason: format!("queue item {} already exists", item.id),
            });
        }
        items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get_queue_item(&self, id: &QueueItemId) -> QueueResult<Option<QueueItem<T>>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn update_queue_item(
        &self,
        id: &QueueItemId,
        update: &QueueItemUpdate,
    ) -> QueueResult<QueueItem<T>> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(id)
            .ok_or_else(|| QueueError::ItemNotFound { id: id.clone() })?;
        item.apply(update);
        Ok(item.clone())
    }

    async fn list_queue_items(
        &self,
        status: Option<QueueStatus>,
    ) -> QueueResult<Vec<QueueItem<T>>> {
        let items = self.items.read().await;
        let mut listed: Vec<QueueItem<T>> = items
            .values()
            .filter(|item| status.is_none_or(|s| item.status == s))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(listed)
    }
}
