//! System groups: one logical phase worth of ordered systems.
//!
//! A group is asked for its systems every time it is scheduled, so the list
//! may depend on the data of that particular trigger. Groups build the list
//! either as a [`SystemChain`] (list order is execution order) or as
//! [`OrderedSystems`] (sorted by order number).

use std::fmt;
use std::sync::Arc;

use crate::cache::SingletonCache;
use crate::chain::SystemChain;
use crate::config::SystemConfig;
use crate::context::GroupId;
use crate::ordered::OrderedSystems;
use crate::system::short_type_name;

/// A group's system list in one of the two ordering strategies.
pub enum SystemList<D> {
    Chain(SystemChain<D>),
    Ordered(OrderedSystems<D>),
}

impl<D> SystemList<D> {
    /// Flatten into execution order.
    ///
    /// Chain entries take their list position as order; ordered entries keep
    /// their resolved order number.
    #[must_use]
    pub fn into_sorted(self) -> Vec<ScheduledSystem<D>> {
        match self {
            Self::Chain(chain) => chain
                .into_configs()
                .into_iter()
                .enumerate()
                .map(|(index, config)| ScheduledSystem {
                    order: index as u64,
                    config,
                })
                .collect(),
            Self::Ordered(list) => list
                .into_sorted()
                .into_iter()
                .map(|(order, config)| ScheduledSystem { order, config })
                .collect(),
        }
    }
}

impl<D> From<SystemChain<D>> for SystemList<D> {
    fn from(chain: SystemChain<D>) -> Self {
        Self::Chain(chain)
    }
}

impl<D> From<OrderedSystems<D>> for SystemList<D> {
    fn from(list: OrderedSystems<D>) -> Self {
        Self::Ordered(list)
    }
}

/// A config together with its position in the group's order.
pub struct ScheduledSystem<D> {
    /// Sort key within the group.
    pub order: u64,
    /// The fully defaulted config.
    pub config: SystemConfig<D>,
}

impl<D: Send + Sync + 'static> fmt::Debug for ScheduledSystem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledSystem")
            .field("order", &self.order)
            .field("config", &self.config)
            .finish()
    }
}

/// Produces the ordered systems of one logical phase.
pub trait SystemGroup: Send + Sync + 'static {
    /// The caller data this group is scheduled with.
    type Data: Send + Sync + 'static;

    /// Identifier tagged onto every invocation of this group. Defaults to
    /// the type name.
    fn id(&self) -> GroupId {
        GroupId::new(short_type_name(std::any::type_name::<Self>()))
    }

    /// Build this trigger's system list. System instances should come from
    /// `cache` so every queue shares one instance per system type.
    fn systems(&self, data: &Arc<Self::Data>, cache: &SingletonCache) -> SystemList<Self::Data>;

    /// This trigger's systems in execution order, defaults filled.
    fn sorted(&self, data: &Arc<Self::Data>, cache: &SingletonCache) -> Vec<ScheduledSystem<Self::Data>> {
        self.systems(data, cache).into_sorted()
    }
}

type GroupFactory<D> = dyn Fn(&SingletonCache) -> Arc<dyn SystemGroup<Data = D>> + Send + Sync;

/// A reference to a group, resolved against the singleton cache when a
/// queue is set up.
pub struct GroupRef<D> {
    resolve: Arc<GroupFactory<D>>,
}

impl<D: Send + Sync + 'static> GroupRef<D> {
    /// Refer to group type `G`; its instance is built once and cached.
    #[must_use]
    pub fn of<G>() -> Self
    where
        G: SystemGroup<Data = D> + Default,
    {
        Self {
            resolve: Arc::new(|cache: &SingletonCache| -> Arc<dyn SystemGroup<Data = D>> {
                cache.get::<G>()
            }),
        }
    }

    /// Refer to an existing group instance.
    #[must_use]
    pub fn instance<G>(group: Arc<G>) -> Self
    where
        G: SystemGroup<Data = D>,
    {
        Self {
            resolve: Arc::new(move |_: &SingletonCache| -> Arc<dyn SystemGroup<Data = D>> {
                group.clone()
            }),
        }
    }

    /// Obtain the group instance.
    #[must_use]
    pub fn resolve(&self, cache: &SingletonCache) -> Arc<dyn SystemGroup<Data = D>> {
        (self.resolve)(cache)
    }
}

impl<D> Clone for GroupRef<D> {
    fn clone(&self) -> Self {
        Self {
            resolve: Arc::clone(&self.resolve),
        }
    }
}

impl<D> fmt::Debug for GroupRef<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRef").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SystemContext;
    use crate::system::{Execution, System};

    #[derive(Default)]
    struct Integrate;

    impl System for Integrate {
        type Data = u32;

        fn run(&self, _ctx: SystemContext<u32>) -> Execution {
            Execution::done()
        }
    }

    #[derive(Default)]
    struct Clamp;

    impl System for Clamp {
        type Data = u32;

        fn run(&self, _ctx: SystemContext<u32>) -> Execution {
            Execution::done()
        }
    }

    #[derive(Default)]
    struct Motion;

    impl SystemGroup for Motion {
        type Data = u32;

        fn systems(&self, data: &Arc<u32>, cache: &SingletonCache) -> SystemList<u32> {
            let mut chain = SystemChain::new();
            let _ = chain.append(SystemConfig::new(cache.get::<Integrate>()).keyed("integrate"));
            if **data > 1 {
                let _ = chain.append(SystemConfig::new(cache.get::<Clamp>()).keyed("clamp"));
            }
            chain.into()
        }
    }

    #[derive(Default)]
    struct Legacy;

    impl SystemGroup for Legacy {
        type Data = u32;

        fn systems(&self, _data: &Arc<u32>, cache: &SingletonCache) -> SystemList<u32> {
            let mut list = OrderedSystems::new();
            list.add(SystemConfig::new(cache.get::<Clamp>()))
                .add_at(5_000, SystemConfig::new(cache.get::<Integrate>()));
            list.into()
        }
    }

    fn names<D: Send + Sync + 'static>(sorted: &[ScheduledSystem<D>]) -> Vec<&str> {
        sorted.iter().map(|s| s.config.system_name()).collect()
    }

    #[test]
    fn test_group_is_re_evaluated_per_trigger() {
        let cache = SingletonCache::new();
        let group = Motion;
        assert_eq!(names(&group.sorted(&Arc::new(1), &cache)), vec!["Integrate"]);
        assert_eq!(
            names(&group.sorted(&Arc::new(2), &cache)),
            vec!["Integrate", "Clamp"]
        );
    }

    #[test]
    fn test_chain_order_is_position() {
        let cache = SingletonCache::new();
        let sorted = Motion.sorted(&Arc::new(5), &cache);
        let orders: Vec<u64> = sorted.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_ordered_strategy_sorts_by_number() {
        let cache = SingletonCache::new();
        let sorted = Legacy.sorted(&Arc::new(0), &cache);
        assert_eq!(names(&sorted), vec!["Integrate", "Clamp"]);
        assert_eq!(sorted[0].order, 5_000);
        assert_eq!(sorted[1].order, 10_000);
    }

    #[test]
    fn test_default_group_id_is_type_name() {
        assert_eq!(Motion.id().as_str(), "Motion");
    }

    #[test]
    fn test_group_ref_resolves_singleton() {
        let cache = SingletonCache::new();
        let group = GroupRef::<u32>::of::<Motion>();
        let a = group.resolve(&cache);
        let b = group.clone().resolve(&cache);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.contains::<Motion>());
    }

    #[test]
    fn test_systems_are_shared_through_cache() {
        let cache = SingletonCache::new();
        let first = Motion.sorted(&Arc::new(2), &cache);
        let second = Motion.sorted(&Arc::new(2), &cache);
        assert!(Arc::ptr_eq(&first[0].config.system, &second[0].config.system));
    }
}
