use std::sync::Arc;
use std::time::Duration;
use todo_core::storage::seed_todos;
use todo_core::{
    ApiError, CacheError, MemoryStorage, NewTodo, NoLatency, NotificationLevel, SimulatedTodoApi,
    TodoCache, TodoPatch, TodoResource, TodoStore, UniformLatency, ValidationError,
    DEFAULT_STORAGE_KEY, MAX_NOTIFICATIONS,
};
use uuid::Uuid;

fn api() -> Arc<SimulatedTodoApi> {
    let store = TodoStore::new(Box::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY);
    Arc::new(SimulatedTodoApi::new(Arc::new(store), Arc::new(NoLatency)))
}

async fn loaded_cache() -> TodoCache<SimulatedTodoApi> {
    let cache = TodoCache::new(api());
    cache.refresh().await.unwrap();
    cache
}

#[tokio::test]
async fn new_cache_is_loading_until_first_refresh() {
    let cache = TodoCache::new(api());
    let initial = cache.snapshot();
    assert!(initial.is_loading);
    assert!(initial.todos.is_empty());
    assert_eq!(initial.last_synced_at, None);

    cache.refresh().await.unwrap();
    let loaded = cache.snapshot();
    assert!(!loaded.is_loading);
    assert!(!loaded.is_fetching);
    assert_eq!(loaded.todos, seed_todos());
    assert!(loaded.last_synced_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn toggle_is_visible_before_the_resource_settles() {
    let store = TodoStore::new(Box::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY);
    let api = Arc::new(SimulatedTodoApi::new(
        Arc::new(store),
        Arc::new(UniformLatency::new(300, 300)),
    ));
    let cache = TodoCache::new(Arc::clone(&api));
    cache.refresh().await.unwrap();
    let target = cache.snapshot().todos[0].clone();

    let mut updates = cache.subscribe();
    let task = tokio::spawn({
        let cache = cache.clone();
        async move { cache.toggle_completion(target.id).await }
    });

    let optimistic = updates
        .wait_for(|state| {
            state.pending_mutations == 1
                && state
                    .find(target.id)
                    .is_some_and(|todo| todo.completed != target.completed)
        })
        .await
        .unwrap()
        .clone();
    assert_eq!(
        api.store()
            .read()
            .iter()
            .find(|todo| todo.id == target.id)
            .map(|todo| todo.completed),
        Some(target.completed)
    );
    assert_eq!(optimistic.pending_mutations, 1);

    let canonical = task.await.unwrap().unwrap();
    assert_eq!(canonical.completed, !target.completed);
    cache.settled().await;

    let settled = cache.snapshot();
    assert_eq!(settled.pending_mutations, 0);
    assert_eq!(settled.find(target.id), Some(&canonical));
}

#[tokio::test]
async fn double_toggle_restores_original_value() {
    let cache = loaded_cache().await;
    let target = cache.snapshot().todos[1].clone();

    let (first, second) = tokio::join!(
        cache.toggle_completion(target.id),
        cache.toggle_completion(target.id)
    );
    first.unwrap();
    second.unwrap();
    cache.settled().await;

    let snapshot = cache.snapshot();
    let cached = snapshot.find(target.id).unwrap();
    assert_eq!(cached.completed, target.completed);
    assert_eq!(snapshot.pending_mutations, 0);
    assert_eq!(snapshot.todos, cache.resource().list().await.unwrap());
}

#[tokio::test]
async fn failed_toggle_rolls_back_and_notifies() {
    let cache = loaded_cache().await;
    let before = cache.snapshot();
    let target = before.todos[0].clone();

    cache.resource().delete(target.id).await.unwrap();

    let err = cache.toggle_completion(target.id).await.unwrap_err();
    assert_eq!(err, CacheError::Resource(ApiError::NotFound(target.id)));
    assert!(err.is_not_found());

    let rolled_back = cache.snapshot();
    assert_eq!(rolled_back.todos, before.todos);
    assert_eq!(rolled_back.pending_mutations, 0);
    assert_eq!(rolled_back.notifications.len(), 1);
    assert_eq!(rolled_back.notifications[0].level, NotificationLevel::Error);
    assert!(rolled_back.notifications[0].message.contains("not found"));

    cache.settled().await;
    assert!(cache.snapshot().find(target.id).is_none());
}

#[tokio::test]
async fn create_validates_before_calling_resource() {
    let cache = loaded_cache().await;

    let err = cache.create(NewTodo::new("   ")).await.unwrap_err();
    assert_eq!(err, CacheError::Validation(ValidationError::EmptyTitle));

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.pending_mutations, 0);
    assert!(snapshot.notifications.is_empty());
    assert_eq!(cache.resource().list().await.unwrap(), seed_todos());
}

#[tokio::test]
async fn create_inserts_canonical_item_at_head() {
    let cache = loaded_cache().await;

    let created = cache.create(NewTodo::new(" Buy milk ")).await.unwrap();
    assert_eq!(created.title, "Buy milk");

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.todos[0], created);
    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].level, NotificationLevel::Success);

    cache.settled().await;
    assert_eq!(cache.snapshot().todos[0], created);
}

#[tokio::test]
async fn update_merges_canonical_result() {
    let cache = loaded_cache().await;
    let target = cache.snapshot().todos[2].clone();

    let updated = cache
        .update(target.id, TodoPatch::default().title("Renamed").clear_due_date())
        .await
        .unwrap();

    let cached = cache.snapshot().find(target.id).cloned().unwrap();
    assert_eq!(cached, updated);
    assert_eq!(cached.title, "Renamed");
    assert_eq!(cached.due_date, None);
}

#[tokio::test]
async fn update_rejects_invalid_patch_inline() {
    let cache = loaded_cache().await;
    let target = cache.snapshot().todos[0].clone();

    let err = cache
        .update(target.id, TodoPatch::default().due_date("someday"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CacheError::Validation(ValidationError::InvalidDueDate("someday".to_string()))
    );
    assert_eq!(cache.snapshot().find(target.id), Some(&target));
}

#[tokio::test]
async fn failed_delete_leaves_cache_unchanged() {
    let cache = loaded_cache().await;
    let before = cache.snapshot().todos;

    let missing = Uuid::new_v4();
    let err = cache.delete(missing).await.unwrap_err();
    assert!(err.is_not_found());

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.todos, before);
    assert_eq!(snapshot.notifications[0].level, NotificationLevel::Error);

    let notification_id = snapshot.notifications[0].id;
    assert!(cache.dismiss_notification(notification_id));
    assert!(!cache.dismiss_notification(notification_id));
    assert!(cache.snapshot().notifications.is_empty());
}

#[tokio::test]
async fn delete_removes_item_from_cache() {
    let cache = loaded_cache().await;
    let target = cache.snapshot().todos[0].clone();

    cache.delete(target.id).await.unwrap();
    assert!(cache.snapshot().find(target.id).is_none());

    cache.settled().await;
    assert_eq!(cache.snapshot().todos.len(), seed_todos().len() - 1);
}

#[tokio::test]
async fn get_unknown_id_sets_error_state_without_panicking() {
    let cache = loaded_cache().await;
    let missing = Uuid::new_v4();

    let err = cache.get(missing).await.unwrap_err();
    assert_eq!(err, CacheError::Resource(ApiError::NotFound(missing)));
    assert_eq!(cache.snapshot().error, Some(err));
    assert_eq!(cache.snapshot().todos, seed_todos());

    cache.clear_error();
    assert_eq!(cache.snapshot().error, None);
}

#[tokio::test]
async fn mutation_supersedes_in_flight_refresh() {
    let cache = loaded_cache().await;

    cache.invalidate();
    let created = cache.create(NewTodo::new("after invalidate")).await.unwrap();
    cache.settled().await;

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.todos[0], created);
    assert!(!snapshot.is_fetching);
    assert_eq!(snapshot.todos, cache.resource().list().await.unwrap());
}

#[tokio::test]
async fn failed_update_notifies_and_leaves_cache_unchanged() {
    let cache = loaded_cache().await;
    let before = cache.snapshot().todos;

    let missing = Uuid::new_v4();
    let err = cache
        .update(missing, TodoPatch::default().title("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err, CacheError::Resource(ApiError::NotFound(missing)));

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.todos, before);
    assert_eq!(snapshot.pending_mutations, 0);
    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].level, NotificationLevel::Error);
    assert!(snapshot.notifications[0].message.contains("not found"));
}

#[tokio::test]
async fn notifications_keep_only_the_newest() {
    let cache = loaded_cache().await;

    let extra = 3;
    for index in 0..MAX_NOTIFICATIONS + extra {
        cache
            .create(NewTodo::new(format!("item {index}")))
            .await
            .unwrap();
    }
    cache.settled().await;

    let notifications = cache.snapshot().notifications;
    assert_eq!(notifications.len(), MAX_NOTIFICATIONS);
    assert_eq!(notifications[0].id, extra as u64 + 1);
    assert!(notifications
        .windows(2)
        .all(|pair| pair[0].id < pair[1].id));
}

#[tokio::test(start_paused = true)]
async fn refresh_that_read_before_a_mutation_is_discarded() {
    let store = TodoStore::new(Box::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY);
    let api = Arc::new(SimulatedTodoApi::new(
        Arc::new(store),
        Arc::new(UniformLatency::new(300, 300)),
    ));
    let cache = TodoCache::new(api);
    cache.refresh().await.unwrap();
    let synced_at = cache.snapshot().last_synced_at;
    let target = cache.snapshot().todos[0].clone();

    let refresh = tokio::spawn({
        let cache = cache.clone();
        async move { cache.refresh().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    let delete = tokio::spawn({
        let cache = cache.clone();
        async move { cache.delete(target.id).await }
    });

    // The refresh resolves first but must not apply its result.
    refresh.await.unwrap().unwrap();
    let mid = cache.snapshot();
    assert_eq!(mid.last_synced_at, synced_at);
    assert_eq!(mid.pending_mutations, 1);
    assert!(!mid.is_fetching);

    delete.await.unwrap().unwrap();
    cache.settled().await;

    let settled = cache.snapshot();
    assert!(settled.find(target.id).is_none());
    assert!(!settled.is_fetching);
    assert_eq!(settled.todos.len(), seed_todos().len() - 1);
}
