//! Mutation feed — явная регистрация подписчиков на изменения грида
//!
//! Вместо ambient event subscription каждый потребитель держит `SubscriptionId`.
//! Инвариант "ровно одна активная подписка" проверяется через `active_subscriptions()`.
//!
//! `SubscriptionId` привязан к конкретному экземпляру feed'а: если хост подменил
//! `GridWorld` целиком, старый id на новом feed'е не считается подпиской.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use super::events::MutationBatch;

static NEXT_FEED_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Handle подписки на `MutationFeed` (instance feed'а + порядковый номер)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId {
    feed: u64,
    seq: u64,
}

impl SubscriptionId {
    /// Instance feed'а, выдавшего подписку
    pub fn feed_instance(&self) -> u64 {
        self.feed
    }
}

/// Очереди batch'ей по подписчикам
///
/// BTreeMap — детерминированный порядок доставки.
#[derive(Debug)]
pub struct MutationFeed {
    instance: u64,
    next_seq: u64,
    queues: BTreeMap<SubscriptionId, VecDeque<MutationBatch>>,
}

impl Default for MutationFeed {
    fn default() -> Self {
        Self {
            instance: NEXT_FEED_INSTANCE.fetch_add(1, Ordering::Relaxed),
            next_seq: 0,
            queues: BTreeMap::new(),
        }
    }
}

impl MutationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Новая подписка. Получает только batch'и опубликованные после регистрации.
    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId {
            feed: self.instance,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queues.insert(id, VecDeque::new());
        id
    }

    /// Снять подписку (недоставленные batch'и выбрасываются)
    ///
    /// Возвращает `false` если подписки уже нет (или она выдана другим feed'ом).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.queues.remove(&id).is_some()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.queues.contains_key(&id)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.queues.len()
    }

    /// Доставить batch всем подписчикам. Без подписчиков batch теряется.
    ///
    /// Возвращает количество подписчиков, получивших batch.
    pub fn publish(&mut self, batch: MutationBatch) -> usize {
        if batch.is_empty() {
            return 0;
        }
        for queue in self.queues.values_mut() {
            queue.push_back(batch.clone());
        }
        self.queues.len()
    }

    /// Забрать все накопленные batch'и подписчика в порядке публикации
    pub fn drain(&mut self, id: SubscriptionId) -> Vec<MutationBatch> {
        self.queues
            .get_mut(&id)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn pending_batches(&self, id: SubscriptionId) -> usize {
        self.queues.get(&id).map(VecDeque::len).unwrap_or(0)
    }
}
