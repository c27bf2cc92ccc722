use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Scratch state shared by every item of one batch run.
///
/// Starts empty; a batch worker fills slots on first use and finds them again
/// on later items. The executor never inspects or resets it, and it is dropped
/// when the run ends.
#[derive(Default)]
pub struct BatchContext {
    slots: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot of type `T`, creating it with `init` on first use.
    pub fn get_or_insert_with<T, F>(&mut self, init: F) -> &mut T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        self.slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
            .expect("slot is keyed by its own TypeId")
    }

    pub fn get<T: Any + Send>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Reusable byte buffer slot for batch workers.
#[derive(Debug, Default)]
pub struct SharedBuffer(pub Vec<u8>);

impl BatchContext {
    /// A buffer of at least `size` bytes, allocated once per batch.
    pub fn buffer(&mut self, size: usize) -> &mut Vec<u8> {
        let buffer = &mut self.get_or_insert_with(|| SharedBuffer(vec![0; size])).0;
        if buffer.len() < size {
            buffer.resize(size, 0);
        }
        buffer
    }
}
