//! Client-side todo cache with optimistic updates.
//!
//! # Responsibility
//! - Hold the last known collection for immediate rendering.
//! - Issue mutations against a `TodoResource` and reconcile the result.
//! - Raise dismissible notifications and schedule background refreshes.
//!
//! # Invariants
//! - A stale refresh never overwrites state written after it was superseded.
//! - Rollback restores the pre-mutation collection exactly, or not at all.
//! - Validation failures return before any resource call.
//! - Mutations are never cancelled once issued.

use crate::api::resource::TodoResource;
use crate::cache::state::{
    CacheError, CacheSnapshot, MutationPhase, Notification, NotificationLevel,
};
use crate::model::todo::{NewTodo, Todo, TodoId, TodoPatch};
use crate::model::validation::{validate_new_todo, validate_patch};
use chrono::Utc;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cached view of a todo resource.
///
/// Cloning is cheap; clones share one cache.
pub struct TodoCache<R> {
    inner: Arc<CacheInner<R>>,
}

struct CacheInner<R> {
    resource: Arc<R>,
    state: watch::Sender<CacheSnapshot>,
    refresh_generation: AtomicU64,
    background_refresh: Mutex<Option<JoinHandle<()>>>,
    next_notification_id: AtomicU64,
}

impl<R> Clone for TodoCache<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TodoResource + 'static> TodoCache<R> {
    pub fn new(resource: Arc<R>) -> Self {
        let (state, _) = watch::channel(CacheSnapshot {
            is_loading: true,
            ..CacheSnapshot::default()
        });
        Self {
            inner: Arc::new(CacheInner {
                resource,
                state,
                refresh_generation: AtomicU64::new(0),
                background_refresh: Mutex::new(None),
                next_notification_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn resource(&self) -> &Arc<R> {
        &self.inner.resource
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CacheSnapshot> {
        self.inner.state.subscribe()
    }

    /// Fetches the collection and replaces the cached copy.
    ///
    /// Starting a refresh supersedes any refresh already in flight; a
    /// superseded refresh resolves `Ok(())` without touching state.
    pub async fn refresh(&self) -> Result<(), CacheError> {
        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            generation = self.inner.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.is_fetching = true;
            state.is_loading = state.last_synced_at.is_none();
        });

        let result = self.inner.resource.list().await;

        let mut applied = false;
        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|state| {
            if self.inner.refresh_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            applied = true;
            state.is_fetching = false;
            state.is_loading = false;
            match result {
                Ok(todos) => {
                    state.todos = todos;
                    state.error = None;
                    state.last_synced_at = Some(Utc::now());
                }
                Err(err) => {
                    let err = CacheError::from(err);
                    state.error = Some(err.clone());
                    outcome = Err(err);
                }
            }
            true
        });

        match (&outcome, applied) {
            (_, false) => debug!(
                "event=cache_refresh module=cache status=superseded generation={generation}"
            ),
            (Ok(()), true) => debug!(
                "event=cache_refresh module=cache status=ok generation={generation}"
            ),
            (Err(err), true) => warn!(
                "event=cache_refresh module=cache status=error generation={generation} error={err}"
            ),
        }
        outcome
    }

    /// Schedules a background refresh, aborting the previous one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn invalidate(&self) {
        let cache = self.clone();
        let task = tokio::spawn(async move {
            let _ = cache.refresh().await;
        });
        if let Some(previous) = self.replace_background(Some(task)) {
            previous.abort();
        }
    }

    /// Waits until no background refresh is pending.
    pub async fn settled(&self) {
        while let Some(task) = self.replace_background(None) {
            let _ = task.await;
        }
    }

    /// Fetches one todo. Failures are recorded in `error`.
    pub async fn get(&self, id: TodoId) -> Result<Todo, CacheError> {
        match self.inner.resource.get(id).await {
            Ok(todo) => Ok(todo),
            Err(err) => {
                let err = CacheError::from(err);
                let recorded = err.clone();
                self.inner
                    .state
                    .send_modify(|state| state.error = Some(recorded));
                warn!("event=cache_get module=cache status=error todo_id={id} error={err}");
                Err(err)
            }
        }
    }

    /// Flips completion with an optimistic local update.
    ///
    /// The entry flips immediately. If the resource rejects, the collection
    /// captured before the flip is restored and an error notification is
    /// raised. Concurrent toggles on one id are not serialized: whichever
    /// settles last overwrites the entry until the follow-up refresh lands.
    ///
    /// TODO: queue mutations per id so settlement order follows issue order.
    pub async fn toggle_completion(&self, id: TodoId) -> Result<Todo, CacheError> {
        const OP: &str = "toggle";
        self.begin_mutation(OP, Some(id));

        let mut rollback = None;
        self.inner.state.send_modify(|state| {
            rollback = Some(state.todos.clone());
            if let Some(todo) = state.todos.iter_mut().find(|todo| todo.id == id) {
                todo.completed = !todo.completed;
                todo.touch(Utc::now());
            }
        });
        self.trace(OP, Some(id), MutationPhase::OptimisticApplied);

        let outcome = match self.inner.resource.toggle_completion(id).await {
            Ok(canonical) => {
                self.settle(OP, Some(id), MutationPhase::SettledSuccess, None, |state| {
                    state.merge(&canonical)
                });
                Ok(canonical)
            }
            Err(err) => {
                let notice = (
                    NotificationLevel::Error,
                    format!("Could not update todo: {err}"),
                );
                self.settle(
                    OP,
                    Some(id),
                    MutationPhase::SettledFailure,
                    Some(notice),
                    |state| {
                        if let Some(previous) = rollback.take() {
                            state.todos = previous;
                        }
                    },
                );
                Err(err.into())
            }
        };

        self.finalize(OP, Some(id));
        outcome
    }

    /// Validates and creates a todo; the cache changes only on success.
    pub async fn create(&self, input: NewTodo) -> Result<Todo, CacheError> {
        const OP: &str = "create";
        let input = validate_new_todo(&input).inspect_err(|err| {
            debug!("event=cache_mutation module=cache op={OP} status=rejected error={err}")
        })?;
        self.begin_mutation(OP, None);

        let outcome = match self.inner.resource.create(input).await {
            Ok(canonical) => {
                let notice = (NotificationLevel::Success, "Todo created.".to_string());
                self.settle(
                    OP,
                    Some(canonical.id),
                    MutationPhase::SettledSuccess,
                    Some(notice),
                    |state| state.upsert(&canonical),
                );
                Ok(canonical)
            }
            Err(err) => {
                let notice = (
                    NotificationLevel::Error,
                    format!("Could not create todo: {err}"),
                );
                self.settle(OP, None, MutationPhase::SettledFailure, Some(notice), |_| {});
                Err(err.into())
            }
        };

        self.finalize(OP, outcome.as_ref().ok().map(|todo| todo.id));
        outcome
    }

    /// Validates and applies a patch; the cache changes only on success.
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, CacheError> {
        const OP: &str = "update";
        let patch = validate_patch(&patch).inspect_err(|err| {
            debug!("event=cache_mutation module=cache op={OP} status=rejected todo_id={id} error={err}")
        })?;
        self.begin_mutation(OP, Some(id));

        let outcome = match self.inner.resource.update(id, patch).await {
            Ok(canonical) => {
                let notice = (NotificationLevel::Success, "Todo updated.".to_string());
                self.settle(
                    OP,
                    Some(id),
                    MutationPhase::SettledSuccess,
                    Some(notice),
                    |state| state.merge(&canonical),
                );
                Ok(canonical)
            }
            Err(err) => {
                let notice = (
                    NotificationLevel::Error,
                    format!("Could not update todo: {err}"),
                );
                self.settle(OP, Some(id), MutationPhase::SettledFailure, Some(notice), |_| {});
                Err(err.into())
            }
        };

        self.finalize(OP, Some(id));
        outcome
    }

    /// Deletes a todo; the cache changes only on success.
    pub async fn delete(&self, id: TodoId) -> Result<(), CacheError> {
        const OP: &str = "delete";
        self.begin_mutation(OP, Some(id));

        let outcome = match self.inner.resource.delete(id).await {
            Ok(()) => {
                let notice = (NotificationLevel::Success, "Todo deleted.".to_string());
                self.settle(
                    OP,
                    Some(id),
                    MutationPhase::SettledSuccess,
                    Some(notice),
                    |state| state.remove(id),
                );
                Ok(())
            }
            Err(err) => {
                let notice = (
                    NotificationLevel::Error,
                    format!("Could not delete todo: {err}"),
                );
                self.settle(OP, Some(id), MutationPhase::SettledFailure, Some(notice), |_| {});
                Err(err.into())
            }
        };

        self.finalize(OP, Some(id));
        outcome
    }

    /// Removes a notification. Returns `false` when it was already gone.
    pub fn dismiss_notification(&self, notification_id: u64) -> bool {
        self.inner.state.send_if_modified(|state| {
            let before = state.notifications.len();
            state
                .notifications
                .retain(|notification| notification.id != notification_id);
            state.notifications.len() != before
        })
    }

    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|state| state.error.take().is_some());
    }

    // Issued: stale background data must not land on top of this mutation.
    fn begin_mutation(&self, op: &'static str, id: Option<TodoId>) {
        if let Some(task) = self.replace_background(None) {
            task.abort();
        }
        self.inner.state.send_modify(|state| {
            self.inner.refresh_generation.fetch_add(1, Ordering::SeqCst);
            state.is_fetching = false;
            state.pending_mutations += 1;
        });
        self.trace(op, id, MutationPhase::Issued);
    }

    fn settle(
        &self,
        op: &'static str,
        id: Option<TodoId>,
        phase: MutationPhase,
        notice: Option<(NotificationLevel, String)>,
        apply: impl FnOnce(&mut CacheSnapshot),
    ) {
        let notification = notice.map(|(level, message)| Notification {
            id: self.inner.next_notification_id.fetch_add(1, Ordering::SeqCst),
            level,
            message,
            created_at: Utc::now(),
        });
        // A refresh that read the resource before this settled is stale.
        self.inner.state.send_modify(|state| {
            self.inner.refresh_generation.fetch_add(1, Ordering::SeqCst);
            apply(state);
            state.pending_mutations = state.pending_mutations.saturating_sub(1);
            if let Some(notification) = notification {
                state.notify(notification);
            }
        });
        self.trace(op, id, phase);
    }

    fn finalize(&self, op: &'static str, id: Option<TodoId>) {
        self.invalidate();
        self.trace(op, id, MutationPhase::Final);
    }

    fn trace(&self, op: &'static str, id: Option<TodoId>, phase: MutationPhase) {
        let id_label = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        debug!(
            "event=cache_mutation module=cache op={op} phase={} todo_id={id_label}",
            phase.as_str()
        );
    }

    fn replace_background(&self, task: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut slot = self
            .inner
            .background_refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *slot, task)
    }
}
