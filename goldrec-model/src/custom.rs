use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A caller-supplied field resolution strategy.
///
/// Receives the values of every source that has the field, in source order,
/// and returns the golden value. The result is used verbatim; it is not
/// checked against any schema type.
pub trait CustomMerge: Send + Sync {
    fn resolve(&self, field: &str, values: &[Value]) -> Value;
}

impl<F> CustomMerge for F
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    fn resolve(&self, _field: &str, values: &[Value]) -> Value {
        self(values)
    }
}

/// Named custom strategies referenced from `customMerge` in configuration.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn CustomMerge>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a strategy under `name`.
    pub fn register(&mut self, name: impl Into<String>, strategy: impl CustomMerge + 'static) {
        self.strategies.insert(name.into(), Arc::new(strategy));
    }

    /// Builder form of [`StrategyRegistry::register`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, strategy: impl CustomMerge + 'static) -> Self {
        self.register(name, strategy);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomMerge>> {
        self.strategies.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}
