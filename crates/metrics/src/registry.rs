use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use prometheus_client::registry::Registry;

/// A registry shared between the components that record metrics and the exporter.
#[derive(Clone, Default)]
pub struct SharedRegistry(Arc<RwLock<Registry>>);

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self(Arc::new(RwLock::new(registry)))
    }

    pub fn global() -> &'static Self {
        global_registry()
    }

    pub fn read<A>(&self, f: impl FnOnce(&Registry) -> A) -> A {
        f(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn write<A>(&self, f: impl FnOnce(&mut Registry) -> A) -> A {
        f(&mut self.0.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn with_prefix<A>(&self, prefix: impl AsRef<str>, f: impl FnOnce(&mut Registry) -> A) -> A {
        self.write(|reg| f(reg.sub_registry_with_prefix(prefix)))
    }
}

impl fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedRegistry")
    }
}

fn global_registry() -> &'static SharedRegistry {
    static REGISTRY: OnceLock<SharedRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SharedRegistry::new(Registry::default()))
}

/// Encode every metric of the registry in the OpenMetrics text format.
pub fn export<W: fmt::Write>(registry: &SharedRegistry, writer: &mut W) -> fmt::Result {
    use prometheus_client::encoding::text::encode;

    registry.read(|registry| encode(writer, registry))
}
