use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use super::{NotConfiguredManager, PrivateTransactionManager};

type Installed = Box<dyn PrivateTransactionManager>;

/// Process-wide so generations from different handles never collide in a
/// shared cache.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

/// One installed backend together with the generation it was installed as.
pub struct ManagerSnapshot {
    generation: u64,
    manager: Installed,
}

impl ManagerSnapshot {
    fn new(manager: Installed) -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            manager,
        }
    }

    /// Unique per install. Anything derived from this backend's answers is
    /// only valid for the same generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Deref for ManagerSnapshot {
    type Target = dyn PrivateTransactionManager;

    fn deref(&self) -> &Self::Target {
        self.manager.as_ref()
    }
}

/// Shared slot holding the active private transaction manager.
///
/// Cloning shares the slot. [`ManagerHandle::install`] replaces the backend
/// atomically; callers holding a [`ManagerHandle::current`] snapshot keep
/// using the previous backend until they take a new one.
#[derive(Clone)]
pub struct ManagerHandle {
    slot: Arc<ArcSwap<ManagerSnapshot>>,
}

impl ManagerHandle {
    pub fn new(manager: impl PrivateTransactionManager + 'static) -> Self {
        Self::from_boxed(Box::new(manager))
    }

    pub fn from_boxed(manager: Installed) -> Self {
        Self {
            slot: Arc::new(ArcSwap::from_pointee(ManagerSnapshot::new(manager))),
        }
    }

    /// A handle with nothing configured.
    pub fn not_configured() -> Self {
        Self::new(NotConfiguredManager::new())
    }

    /// Snapshot of the active manager.
    pub fn current(&self) -> Arc<ManagerSnapshot> {
        self.slot.load_full()
    }

    pub fn install(&self, manager: impl PrivateTransactionManager + 'static) {
        let manager: Installed = Box::new(manager);
        info!(
            backend = manager.name(),
            features = ?manager.features(),
            "installing private transaction manager"
        );
        self.slot.store(Arc::new(ManagerSnapshot::new(manager)));
    }
}

impl Default for ManagerHandle {
    fn default() -> Self {
        Self::not_configured()
    }
}

impl std::fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerHandle")
            .field("backend", &self.current().name())
            .finish()
    }
}
