// src/engine/locks.rs

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// One async mutex per invocation key, created on first use and kept for
/// the rest of the run.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(lock.value());
        }
        Arc::clone(
            self.locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_shares_one_lock() {
        let registry = LockRegistry::new();
        let a = registry.get("make");
        let b = registry.get("make");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        let _held = a.lock().await;
        assert!(b.try_lock().is_err());
        assert!(registry.get("other").try_lock().is_ok());
        assert_eq!(registry.len(), 2);
    }
}
