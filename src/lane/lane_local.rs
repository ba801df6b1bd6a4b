use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{LaneError, LaneId};

/// Per-lane storage backed by a `HashMap<LaneId, Arc<Mutex<T>>>`.
///
/// Slots are created lazily with `T::default()` the first time a lane is
/// touched. The table lock is only held to look a slot up; work on a slot
/// holds that slot's own mutex, so lanes never wait on each other's state.
pub struct LaneLocal<T> {
    slots: Mutex<HashMap<LaneId, Arc<Mutex<T>>>>,
}

impl<T> Default for LaneLocal<T> {
    fn default() -> Self {
        LaneLocal {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Default> LaneLocal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the slot for `lane`.
    ///
    /// Repeated calls with the same lane return the same `Arc`.
    pub fn slot(&self, lane: LaneId) -> Result<Arc<Mutex<T>>, LaneError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| LaneError::Poisoned("slot lookup"))?;
        Ok(slots
            .entry(lane)
            .or_insert_with(|| Arc::new(Mutex::new(T::default())))
            .clone())
    }

    /// Run `f` against the lane's value, creating it if needed.
    pub fn with<R>(&self, lane: LaneId, f: impl FnOnce(&mut T) -> R) -> Result<R, LaneError> {
        let slot = self.slot(lane)?;
        let mut value = slot
            .lock()
            .map_err(|_| LaneError::Poisoned("slot access"))?;
        Ok(f(&mut value))
    }

    /// Run `f` against the lane's value if the lane has one.
    pub fn with_existing<R>(
        &self,
        lane: LaneId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>, LaneError> {
        let Some(slot) = self.existing(lane)? else {
            return Ok(None);
        };
        let mut value = slot
            .lock()
            .map_err(|_| LaneError::Poisoned("slot access"))?;
        Ok(Some(f(&mut value)))
    }

    /// Run `f` against the lane's value without creating a slot.
    pub fn peek<R>(&self, lane: LaneId, f: impl FnOnce(&T) -> R) -> Result<Option<R>, LaneError> {
        let Some(slot) = self.existing(lane)? else {
            return Ok(None);
        };
        let value = slot
            .lock()
            .map_err(|_| LaneError::Poisoned("slot access"))?;
        Ok(Some(f(&value)))
    }
}

impl<T> LaneLocal<T> {
    fn existing(&self, lane: LaneId) -> Result<Option<Arc<Mutex<T>>>, LaneError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| LaneError::Poisoned("slot lookup"))?;
        Ok(slots.get(&lane).cloned())
    }

    /// Drop the lane's slot. Returns `false` if it was already gone.
    pub fn release(&self, lane: LaneId) -> Result<bool, LaneError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| LaneError::Poisoned("release"))?;
        Ok(slots.remove(&lane).is_some())
    }

    /// Drop every slot. Returns how many were released.
    pub fn clear(&self) -> Result<usize, LaneError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| LaneError::Poisoned("clear"))?;
        let released = slots.len();
        slots.clear();
        Ok(released)
    }

    pub fn contains(&self, lane: LaneId) -> Result<bool, LaneError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| LaneError::Poisoned("contains"))?;
        Ok(slots.contains_key(&lane))
    }

    pub fn len(&self) -> Result<usize, LaneError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| LaneError::Poisoned("len"))?;
        Ok(slots.len())
    }

    pub fn is_empty(&self) -> Result<bool, LaneError> {
        Ok(self.len()? == 0)
    }
}
