use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use derive_where::derive_where;

use ibft_core_types::{Context, DecidedRecord, Height};

use crate::StoreError;

/// Where decisions go before they are announced.
pub trait DecidedStore<Ctx: Context>: Send + 'static {
    /// Persist the decision for `record.height`.
    ///
    /// Storing the same decision twice succeeds, storing a different one for a height
    /// that is already decided fails with [`StoreError::Conflict`].
    fn store(&mut self, record: &DecidedRecord<Ctx>, value: &Ctx::Value) -> Result<(), StoreError>;

    fn get(&self, height: Height) -> Option<(DecidedRecord<Ctx>, Ctx::Value)>;
}

type Decisions<Ctx> = BTreeMap<Height, (DecidedRecord<Ctx>, <Ctx as Context>::Value)>;

/// Decisions kept in memory. Clones share the same storage.
#[derive_where(Clone, Debug, Default)]
pub struct InMemoryStore<Ctx: Context> {
    decisions: Arc<Mutex<Decisions<Ctx>>>,
}

impl<Ctx: Context> InMemoryStore<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The highest decided height, if any.
    pub fn last_height(&self) -> Option<Height> {
        self.lock().keys().next_back().copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Decisions<Ctx>> {
        self.decisions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<Ctx: Context> DecidedStore<Ctx> for InMemoryStore<Ctx> {
    fn store(&mut self, record: &DecidedRecord<Ctx>, value: &Ctx::Value) -> Result<(), StoreError> {
        let mut decisions = self.lock();

        match decisions.get(&record.height) {
            Some((existing, _)) if existing.value_id == record.value_id => Ok(()),
            Some(_) => Err(StoreError::Conflict(record.height)),
            None => {
                decisions.insert(record.height, (record.clone(), value.clone()));
                Ok(())
            }
        }
    }

    fn get(&self, height: Height) -> Option<(DecidedRecord<Ctx>, Ctx::Value)> {
        self.lock().get(&height).cloned()
    }
}
