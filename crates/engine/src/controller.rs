use tracing::debug;

use ibft_core_consensus::{Implementor, Instance};
use ibft_core_types::{Context, Height};

/// What to do with an input addressed to some height.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// The input is for the running instance.
    Current,

    /// The height is in the future: nothing runs for it yet.
    Future,

    /// The height was abandoned or decided.
    Past,

    /// No instance is running.
    Idle,
}

/// Owns the instance of the current height.
///
/// Only a duty for a strictly higher height replaces the instance. Dropping the
/// previous instance discards its future-round buffer with it.
pub struct HeightController<Ctx, I>
where
    Ctx: Context,
{
    instance: Option<Instance<Ctx, I>>,
}

impl<Ctx, I> Default for HeightController<Ctx, I>
where
    Ctx: Context,
{
    fn default() -> Self {
        Self { instance: None }
    }
}

impl<Ctx, I> HeightController<Ctx, I>
where
    Ctx: Context,
    I: Implementor<Ctx>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> Option<Height> {
        self.instance.as_ref().map(Instance::height)
    }

    pub fn instance(&self) -> Option<&Instance<Ctx, I>> {
        self.instance.as_ref()
    }

    /// Whether a duty for `height` should start a new instance.
    pub fn accepts(&self, height: Height) -> bool {
        self.height().is_none_or(|current| height > current)
    }

    /// Install the instance for a new height, returning the height it replaces.
    ///
    /// Refuses instances that do not move the height forward, returning the current height.
    pub fn replace(&mut self, instance: Instance<Ctx, I>) -> Result<Option<Height>, Height> {
        if let Some(current) = self.height().filter(|&h| instance.height() <= h) {
            return Err(current);
        }

        if let Some(previous) = &self.instance {
            debug!(
                previous = %previous.height(),
                next = %instance.height(),
                decided = previous.decided().is_some(),
                "Abandoning height"
            );
        }

        Ok(self
            .instance
            .replace(instance)
            .map(|previous| previous.height()))
    }

    pub fn route(&self, height: Height) -> Route {
        match self.height() {
            None => Route::Idle,
            Some(current) if height == current => Route::Current,
            Some(current) if height > current => Route::Future,
            Some(_) => Route::Past,
        }
    }

    /// The running instance, if `height` is its height.
    pub fn get_mut(&mut self, height: Height) -> Option<&mut Instance<Ctx, I>> {
        self.instance
            .as_mut()
            .filter(|instance| instance.height() == height)
    }
}
