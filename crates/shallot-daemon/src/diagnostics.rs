//! Last-value slots backing the diagnostic getters.

use tokio::sync::RwLock;

/// Holds the most recent value of one observation.
#[derive(Debug)]
pub struct Slot<T> {
    value: RwLock<Option<T>>,
}

impl<T: Clone> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// A slot that reads as `initial` until first set.
    pub fn with_value(initial: T) -> Self {
        Self {
            value: RwLock::new(Some(initial)),
        }
    }

    /// Replace the stored value.
    pub async fn set(&self, value: T) {
        *self.value.write().await = Some(value);
    }

    /// Copy of the stored value, if any.
    pub async fn get(&self) -> Option<T> {
        self.value.read().await.clone()
    }
}

impl<T: Clone> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slot_keeps_last_value() {
        let slot = Slot::new();
        assert_eq!(slot.get().await, None);
        slot.set("a".to_string()).await;
        slot.set("b".to_string()).await;
        assert_eq!(slot.get().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_slot_with_initial_value() {
        let slot: Slot<Vec<u32>> = Slot::with_value(Vec::new());
        assert_eq!(slot.get().await, Some(Vec::new()));
        slot.set(vec![1, 2, 3]).await;
        assert_eq!(slot.get().await, Some(vec![1, 2, 3]));
    }
}
