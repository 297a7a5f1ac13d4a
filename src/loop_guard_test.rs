use super::*;

fn guard() -> (LoopGuard, MemoryPageStorage) {
    let storage = MemoryPageStorage::new();
    (LoopGuard::new(Arc::new(storage.clone())), storage)
}

#[test]
fn unmarked_guard_reports_no_loop() {
    let (guard, _) = guard();
    assert!(!guard.was_loop_detected());
}

#[test]
fn mark_is_single_use() {
    let (guard, storage) = guard();
    guard.mark_loop_detected();
    assert!(guard.was_loop_detected());
    assert!(!guard.was_loop_detected());
    assert_eq!(storage.get(LOOP_FLAG_KEY), None);
}

#[test]
fn second_redirect_in_tab_marks_loop() {
    let (guard, storage) = guard();
    assert!(!guard.note_auth_redirect());
    assert!(!guard.was_loop_detected());

    assert!(guard.note_auth_redirect());
    assert_eq!(storage.get(REDIRECT_COUNT_KEY).as_deref(), Some("2"));
    assert!(guard.was_loop_detected());
    assert!(!guard.was_loop_detected());
}

#[test]
fn reset_forgets_earlier_redirects() {
    let (guard, storage) = guard();
    assert!(!guard.note_auth_redirect());
    guard.reset();
    assert_eq!(storage.get(REDIRECT_COUNT_KEY), None);
    assert!(!guard.note_auth_redirect());
}

#[test]
fn corrupt_counter_starts_over() {
    let (guard, storage) = guard();
    storage.set(REDIRECT_COUNT_KEY, "many");
    assert!(!guard.note_auth_redirect());
    assert_eq!(storage.get(REDIRECT_COUNT_KEY).as_deref(), Some("1"));
}

#[test]
fn storage_is_shared_between_guards_in_one_tab() {
    let storage = MemoryPageStorage::new();
    let login_page = LoopGuard::new(Arc::new(storage.clone()));
    let dashboard = LoopGuard::new(Arc::new(storage));

    login_page.mark_loop_detected();
    assert!(dashboard.was_loop_detected());
    assert!(!login_page.was_loop_detected());
}

#[test]
fn consumed_mark_starts_a_fresh_count() {
    let (guard, storage) = guard();
    assert!(!guard.note_auth_redirect());
    assert!(guard.note_auth_redirect());
    assert!(guard.was_loop_detected());
    assert_eq!(storage.get(REDIRECT_COUNT_KEY), None);

    // One later bounce in the same tab is not a loop on its own.
    assert!(!guard.note_auth_redirect());
    assert!(!guard.was_loop_detected());
    assert!(guard.note_auth_redirect());
    assert!(guard.was_loop_detected());
}
