//! Keyed registry of repeating background tasks.
//!
//! Each key owns at most one task. A task runs every cycle inside its
//! [`Gate`]; stopping a key closes the gate, which waits for an in-flight
//! cycle to finish, so nothing the task does becomes visible after
//! [`TaskRegistry::stop`] returns.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio::task::JoinHandle;

/// Open/closed flag guarding a task's cycles.
#[derive(Debug, Clone)]
pub struct Gate(Arc<AsyncMutex<bool>>);

impl Gate {
    pub fn open() -> Self {
        Gate(Arc::new(AsyncMutex::new(true)))
    }

    /// Enter for one cycle. `None` once the gate is closed.
    pub async fn enter(&self) -> Option<MutexGuard<'_, bool>> {
        let guard = self.0.lock().await;
        if *guard { Some(guard) } else { None }
    }

    /// Close the gate, waiting for any cycle currently inside it.
    pub async fn close(&self) {
        *self.0.lock().await = false;
    }
}

struct Entry {
    gate: Gate,
    join: JoinHandle<()>,
}

pub struct TaskRegistry<K> {
    tasks: Mutex<HashMap<K, Entry>>,
}

impl<K> Default for TaskRegistry<K> {
    fn default() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> TaskRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task for `key` unless one is already running.
    ///
    /// The check and the insert happen under one lock, so concurrent starts
    /// for the same key produce a single task. Returns whether a task was
    /// spawned.
    pub fn start<F>(&self, key: K, spawn: F) -> bool
    where
        F: FnOnce(Gate) -> JoinHandle<()>,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if tasks.get(&key).is_some_and(|e| !e.join.is_finished()) {
            return false;
        }
        let gate = Gate::open();
        let join = spawn(gate.clone());
        tasks.insert(key, Entry { gate, join });
        true
    }

    /// Stop the task for `key`. Idempotent; returns whether a live task was stopped.
    pub async fn stop(&self, key: &K) -> bool {
        let entry = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.remove(key)
        };
        match entry {
            Some(entry) => {
                let was_running = !entry.join.is_finished();
                entry.join.abort();
                entry.gate.close().await;
                was_running
            }
            None => false,
        }
    }

    pub fn is_active(&self, key: &K) -> bool {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.get(key).is_some_and(|e| !e.join.is_finished())
    }

    /// Live tasks. Tasks that ended on their own are pruned.
    pub fn active_count(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|_, e| !e.join.is_finished());
        tasks.len()
    }

    /// Gate of the live task for `key`. Work done for the key outside the
    /// task enters it to stay serialized with the task's cycles.
    pub fn gate(&self, key: &K) -> Option<Gate> {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks
            .get(key)
            .filter(|e| !e.join.is_finished())
            .map(|e| e.gate.clone())
    }

    /// Stop every task and wait for them to wind down.
    pub async fn stop_all(&self) {
        let entries: Vec<Entry> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.drain().map(|(_, e)| e).collect()
        };
        for entry in &entries {
            entry.join.abort();
        }
        futures::future::join_all(entries.iter().map(|e| e.gate.close())).await;
        let _ = futures::future::join_all(entries.into_iter().map(|e| e.join)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn spawn_counter(counter: Arc<AtomicUsize>) -> impl FnOnce(Gate) -> JoinHandle<()> {
        move |gate| {
            tokio::spawn(async move {
                loop {
                    let Some(cycle) = gate.enter().await else {
                        break;
                    };
                    counter.fetch_add(1, Ordering::SeqCst);
                    drop(cycle);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
        }
    }

    #[tokio::test]
    async fn test_start_twice_keeps_one_task() {
        let registry = TaskRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(registry.start("a", spawn_counter(counter.clone())));
        assert!(!registry.start("a", spawn_counter(counter.clone())));
        assert_eq!(registry.active_count(), 1);
        registry.stop_all().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_final() {
        let registry = TaskRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.start("a", spawn_counter(counter.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(registry.stop(&"a").await);
        let after_stop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);

        assert!(!registry.stop(&"a").await);
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn test_finished_task_can_restart() {
        let registry: TaskRegistry<&str> = TaskRegistry::new();
        registry.start("a", |_gate| tokio::spawn(async {}));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!registry.is_active(&"a"));
        assert_eq!(registry.active_count(), 0);
        assert!(registry.start("a", |_gate| tokio::spawn(async {})));
    }

    #[tokio::test]
    async fn test_gate_only_for_live_task() {
        let registry = TaskRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(registry.gate(&"a").is_none());

        registry.start("a", spawn_counter(counter.clone()));
        let gate = registry.gate(&"a").unwrap();
        let before = {
            let _cycle = gate.enter().await.unwrap();
            let seen = counter.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            // The task cannot run a cycle while the gate is held
            assert_eq!(counter.load(Ordering::SeqCst), seen);
            seen
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(counter.load(Ordering::SeqCst) > before);

        registry.stop(&"a").await;
        assert!(registry.gate(&"a").is_none());
    }

    #[tokio::test]
    async fn test_closed_gate_refuses_entry() {
        let gate = Gate::open();
        assert!(gate.enter().await.is_some());
        gate.close().await;
        assert!(gate.enter().await.is_none());
    }
}
