//! Materialized filter results and their traversal modes.

use std::future::Future;

use futures::future::join_all;

use crate::entity::{EntityId, EntityRef};

/// An ordered list of entities that satisfied a filter.
///
/// Besides plain iteration it offers three traversal modes:
///
/// - [`Filtered::for_each`]: synchronous, strictly ordered.
/// - [`Filtered::sequential`]: asynchronous, each callback completes before
///   the next one starts.
/// - [`Filtered::parallel`]: asynchronous fan-out: every callback is started,
///   then all of them are awaited together.
#[derive(Debug, Clone, Default)]
pub struct Filtered {
    items: Vec<EntityRef>,
}

impl Filtered {
    /// Wrap an already filtered list of entities.
    #[must_use]
    pub fn new(items: Vec<EntityRef>) -> Self {
        Self { items }
    }

    /// Number of matched entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no entity matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The matched entities in filter order.
    #[must_use]
    pub fn items(&self) -> &[EntityRef] {
        &self.items
    }

    /// The first matched entity, in filter order.
    #[must_use]
    pub fn first(&self) -> Option<&EntityRef> {
        self.items.first()
    }

    /// Ids of the matched entities, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|e| e.id().clone()).collect()
    }

    /// Iterate over the matches in filter order.
    pub fn iter(&self) -> std::slice::Iter<'_, EntityRef> {
        self.items.iter()
    }

    /// Call `f(entity, index)` for every entity, in order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&EntityRef, usize),
    {
        for (index, entity) in self.items.iter().enumerate() {
            f(entity, index);
        }
    }

    /// Run `f(entity, index)` for every entity, awaiting each call before
    /// starting the next.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error.
    pub async fn sequential<F, Fut, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(EntityRef, usize) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        for (index, entity) in self.items.iter().enumerate() {
            f(entity.clone(), index).await?;
        }
        Ok(())
    }

    /// Start `f(entity, index)` for every entity without waiting in between,
    /// then await all of them.
    ///
    /// # Errors
    ///
    /// Every call is driven to completion; afterwards the first error in
    /// entity order is returned.
    pub async fn parallel<F, Fut, E>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(EntityRef, usize) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let pending: Vec<Fut> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, entity)| f(entity.clone(), index))
            .collect();
        join_all(pending).await.into_iter().collect()
    }
}

impl IntoIterator for Filtered {
    type Item = EntityRef;
    type IntoIter = std::vec::IntoIter<EntityRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Filtered {
    type Item = &'a EntityRef;
    type IntoIter = std::slice::Iter<'a, EntityRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::entity::Entity;
    use crate::rarity::RarityTracker;

    fn filtered(ids: &[&str]) -> Filtered {
        let rarity = Arc::new(RarityTracker::new());
        Filtered::new(
            ids.iter()
                .map(|id| EntityRef::new(Entity::new(*id, Arc::clone(&rarity))))
                .collect(),
        )
    }

    #[test]
    fn test_count_and_items() {
        let f = filtered(&["a", "b", "c"]);
        assert_eq!(f.count(), 3);
        assert!(!f.is_empty());
        assert_eq!(f.first().unwrap().id().as_str(), "a");
        let ids: Vec<String> = f.ids().iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_for_each_is_ordered() {
        let f = filtered(&["a", "b", "c"]);
        let mut seen = Vec::new();
        f.for_each(|e, i| seen.push((e.id().to_string(), i)));
        assert_eq!(
            seen,
            vec![("a".into(), 0), ("b".into(), 1), ("c".into(), 2)]
        );
    }

    #[tokio::test]
    async fn test_sequential_waits_for_each_call() {
        let f = filtered(&["a", "b", "c"]);
        let log = Arc::new(Mutex::new(Vec::new()));
        f.sequential(|e, _| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("start {}", e.id()));
                tokio::task::yield_now().await;
                log.lock().unwrap().push(format!("end {}", e.id()));
                Ok::<(), ()>(())
            }
        })
        .await
        .unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec!["start a", "end a", "start b", "end b", "start c", "end c"]
        );
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_error() {
        let f = filtered(&["a", "b", "c"]);
        let calls = AtomicUsize::new(0);
        let result = f
            .sequential(|_, i| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { if i == 1 { Err("boom") } else { Ok(()) } }
            })
            .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_parallel_starts_all_before_joining() {
        let f = filtered(&["a", "b", "c"]);
        let started = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let result = f
            .parallel(|_, i| {
                started.fetch_add(1, Ordering::SeqCst);
                let completed = Arc::clone(&completed);
                async move {
                    tokio::time::sleep(Duration::from_millis(5 * (3 - i as u64))).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), ()>(())
                }
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parallel_settles_all_before_failing() {
        let f = filtered(&["a", "b", "c"]);
        let completed = Arc::new(AtomicUsize::new(0));
        let result = f
            .parallel(|_, i| {
                let completed = Arc::clone(&completed);
                async move {
                    tokio::task::yield_now().await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    if i == 0 { Err(i) } else { Ok(()) }
                }
            })
            .await;
        assert_eq!(result, Err(0));
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }
}
