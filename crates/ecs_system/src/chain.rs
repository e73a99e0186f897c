//! Builder-chain ordering: list order is execution order.
//!
//! Entries are keyed by the config's [`key`](SystemConfig::key) or by a
//! generated id, and can be positioned relative to each other with
//! insert-before/insert-after, swapped with replace, or dropped with remove.

use uuid::Uuid;

use crate::config::SystemConfig;

/// Errors raised by chain edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("no chain entry with key '{0}'")]
    UnknownEntry(String),

    #[error("a chain entry with key '{0}' already exists")]
    DuplicateEntry(String),
}

/// An ordered, keyed list of system configs.
pub struct SystemChain<D> {
    entries: Vec<(String, SystemConfig<D>)>,
}

impl<D> SystemChain<D> {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in execution order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Returns `true` if an entry is keyed `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// The entry keyed `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SystemConfig<D>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, config)| config)
    }

    /// Add `config` at the end. Returns the entry key.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::DuplicateEntry`] if the config's key is taken.
    pub fn append(&mut self, config: SystemConfig<D>) -> Result<String, ChainError> {
        self.insert_at(self.entries.len(), config)
    }

    /// Add `config` at the front. Returns the entry key.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::DuplicateEntry`] if the config's key is taken.
    pub fn prepend(&mut self, config: SystemConfig<D>) -> Result<String, ChainError> {
        self.insert_at(0, config)
    }

    /// Add `config` directly before the entry keyed `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownEntry`] if `anchor` is not in the chain,
    /// or [`ChainError::DuplicateEntry`] if the config's key is taken.
    pub fn insert_before(
        &mut self,
        anchor: &str,
        config: SystemConfig<D>,
    ) -> Result<String, ChainError> {
        let index = self.require(anchor)?;
        self.insert_at(index, config)
    }

    /// Add `config` directly after the entry keyed `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownEntry`] if `anchor` is not in the chain,
    /// or [`ChainError::DuplicateEntry`] if the config's key is taken.
    pub fn insert_after(
        &mut self,
        anchor: &str,
        config: SystemConfig<D>,
    ) -> Result<String, ChainError> {
        let index = self.require(anchor)?;
        self.insert_at(index + 1, config)
    }

    /// Swap the config of the entry keyed `key`, keeping its position and key.
    /// Returns the previous config.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownEntry`] if `key` is not in the chain.
    pub fn replace(
        &mut self,
        key: &str,
        mut config: SystemConfig<D>,
    ) -> Result<SystemConfig<D>, ChainError> {
        let index = self.require(key)?;
        config.key = Some(key.to_string());
        Ok(std::mem::replace(&mut self.entries[index].1, config))
    }

    /// Drop the entry keyed `key`, returning its config.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownEntry`] if `key` is not in the chain.
    pub fn remove(&mut self, key: &str) -> Result<SystemConfig<D>, ChainError> {
        let index = self.require(key)?;
        Ok(self.entries.remove(index).1)
    }

    /// Consume the chain into its configs, in execution order.
    #[must_use]
    pub fn into_configs(self) -> Vec<SystemConfig<D>> {
        self.entries.into_iter().map(|(_, config)| config).collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn require(&self, key: &str) -> Result<usize, ChainError> {
        self.position(key)
            .ok_or_else(|| ChainError::UnknownEntry(key.to_string()))
    }

    fn insert_at(
        &mut self,
        index: usize,
        mut config: SystemConfig<D>,
    ) -> Result<String, ChainError> {
        let key = config
            .key
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.contains(&key) {
            return Err(ChainError::DuplicateEntry(key));
        }
        config.key = Some(key.clone());
        self.entries.insert(index, (key.clone(), config));
        Ok(key)
    }
}

impl<D> Default for SystemChain<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::SystemContext;
    use crate::system::{Execution, System};

    struct Named(&'static str);

    impl System for Named {
        type Data = ();

        fn name(&self) -> &str {
            self.0
        }

        fn run(&self, _ctx: SystemContext<()>) -> Execution {
            Execution::done()
        }
    }

    fn config(name: &'static str) -> SystemConfig<()> {
        SystemConfig::new(Arc::new(Named(name))).keyed(name)
    }

    fn names(chain: SystemChain<()>) -> Vec<String> {
        chain
            .into_configs()
            .iter()
            .map(|c| c.system_name().to_string())
            .collect()
    }

    #[test]
    fn test_append_and_prepend() {
        let mut chain = SystemChain::new();
        chain.append(config("b")).unwrap();
        chain.append(config("c")).unwrap();
        chain.prepend(config("a")).unwrap();
        assert_eq!(chain.keys(), vec!["a", "b", "c"]);
        assert_eq!(names(chain), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut chain = SystemChain::new();
        chain.append(config("a")).unwrap();
        chain.append(config("d")).unwrap();
        chain.insert_before("d", config("c")).unwrap();
        chain.insert_after("a", config("b")).unwrap();
        chain.insert_after("d", config("e")).unwrap();
        assert_eq!(chain.keys(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_unknown_anchor_fails() {
        let mut chain = SystemChain::new();
        let err = chain.insert_before("missing", config("a")).unwrap_err();
        assert_eq!(err, ChainError::UnknownEntry("missing".into()));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_duplicate_key_fails() {
        let mut chain = SystemChain::new();
        chain.append(config("a")).unwrap();
        let err = chain.append(config("a")).unwrap_err();
        assert_eq!(err, ChainError::DuplicateEntry("a".into()));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_generated_keys() {
        let mut chain = SystemChain::new();
        let first = chain.append(SystemConfig::new(Arc::new(Named("x")))).unwrap();
        let second = chain.append(SystemConfig::new(Arc::new(Named("x")))).unwrap();
        assert_ne!(first, second);
        assert_eq!(chain.get(&first).unwrap().key.as_deref(), Some(first.as_str()));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut chain = SystemChain::new();
        chain.append(config("a")).unwrap();
        chain.append(config("b")).unwrap();
        chain.append(config("c")).unwrap();
        let old = chain
            .replace("b", SystemConfig::new(Arc::new(Named("b2"))))
            .unwrap();
        assert_eq!(old.system_name(), "b");
        assert_eq!(chain.keys(), vec!["a", "b", "c"]);
        assert_eq!(names(chain), vec!["a", "b2", "c"]);
    }

    #[test]
    fn test_remove() {
        let mut chain = SystemChain::new();
        chain.append(config("a")).unwrap();
        chain.append(config("b")).unwrap();
        let removed = chain.remove("a").unwrap();
        assert_eq!(removed.system_name(), "a");
        assert_eq!(chain.keys(), vec!["b"]);
        assert!(chain.remove("a").is_err());
    }
}
