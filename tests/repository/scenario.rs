//! End-to-end Put / GetByIndex / Delete scenarios

use crate::common::*;

// ============================================================================
// Basic CRUD
// ============================================================================

#[test]
fn put_then_get_by_index_returns_both_records() {
    let (store, repo) = customers();

    store
        .update(|tx| {
            repo.put(tx, &customer(1, "ACME"))?;
            repo.put(tx, &customer(2, "ACME"))
        })
        .unwrap();

    let acme = store
        .view(|tx| repo.get_by_index(tx, "company", "ACME"))
        .unwrap();
    assert_eq!(ids_of(&acme), vec![1, 2]);
}

#[test]
fn delete_removes_record_from_index() {
    let (store, repo) = customers();
    store
        .update(|tx| {
            repo.put(tx, &customer(1, "ACME"))?;
            repo.put(tx, &customer(2, "ACME"))
        })
        .unwrap();

    store.update(|tx| repo.delete(tx, &key_of(1u64))).unwrap();

    let acme = store
        .view(|tx| repo.get_by_index(tx, "company", "ACME"))
        .unwrap();
    assert_eq!(ids_of(&acme), vec![2]);
    assert!(store.view(|tx| repo.get(tx, &key_of(1u64))).unwrap().is_none());
}

#[test]
fn delete_absent_record_is_key_not_found() {
    let (store, repo) = customers();
    let err = store.update(|tx| repo.delete_by_id(tx, 42)).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::KeyNotFound { .. }));
}

#[test]
fn delete_returns_removed_record() {
    let (store, repo) = customers();
    let stored = customer(7, "Globex");
    store.update(|tx| repo.put(tx, &stored)).unwrap();

    let removed = store.update(|tx| repo.delete_by_id(tx, 7)).unwrap();
    assert_eq!(removed, stored);
}

#[test]
fn put_overwrites_record() {
    let (store, repo) = customers();
    store.update(|tx| repo.put(tx, &customer(1, "ACME"))).unwrap();

    let mut renamed = customer(1, "ACME");
    renamed.name = "renamed".to_string();
    store.update(|tx| repo.put(tx, &renamed)).unwrap();

    let loaded = store.view(|tx| repo.get_by_id(tx, 1)).unwrap();
    assert_eq!(loaded, Some(renamed));
    assert_eq!(store.view(|tx| repo.count(tx)).unwrap(), 1);
}

#[test]
fn changing_indexed_field_moves_record() {
    let (store, repo) = customers();
    store.update(|tx| repo.put(tx, &customer(1, "ACME"))).unwrap();

    let mut moved = customer(1, "Globex");
    moved.active = false;
    store.update(|tx| repo.put(tx, &moved)).unwrap();

    let tx = store.begin_read();
    assert!(repo.get_by_index(&tx, "company", "ACME").unwrap().is_empty());
    assert_eq!(ids_of(&repo.get_by_index(&tx, "company", "Globex").unwrap()), vec![1]);
    assert!(repo.get_by_index(&tx, "active", &true).unwrap().is_empty());
    assert_eq!(ids_of(&repo.get_by_index(&tx, "active", &false).unwrap()), vec![1]);
}

// ============================================================================
// Transactions
// ============================================================================

#[test]
fn failed_update_leaves_no_index_entries() {
    let (store, repo) = customers();

    let result: Result<()> = store.update(|tx| {
        repo.put(tx, &customer(1, "ACME"))?;
        Err(Error::StorageError("caller aborted".to_string()))
    });
    assert!(result.is_err());

    let tx = store.begin_read();
    assert!(repo.get_by_index(&tx, "company", "ACME").unwrap().is_empty());
    assert_eq!(tx.entry_count(&repo.index_path("company")).unwrap(), 0);
    assert_eq!(repo.count(&tx).unwrap(), 0);
}

#[test]
fn reads_inside_write_transaction_see_pending_writes() {
    let (store, repo) = customers();
    let mut tx = store.begin_write();
    repo.put(&mut tx, &customer(1, "ACME")).unwrap();

    assert_eq!(ids_of(&repo.get_by_index(&tx, "company", "ACME").unwrap()), vec![1]);
    assert!(store
        .view(|read| repo.get_by_index(read, "company", "ACME"))
        .unwrap()
        .is_empty());

    tx.commit();
    assert_eq!(
        store
            .view(|read| repo.get_by_index(read, "company", "ACME"))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn snapshot_reader_does_not_see_later_delete() {
    let (store, repo) = customers();
    store.update(|tx| repo.put(tx, &customer(1, "ACME"))).unwrap();

    let snapshot = store.begin_read();
    store.update(|tx| repo.delete_by_id(tx, 1)).unwrap();

    assert_eq!(ids_of(&repo.get_by_index(&snapshot, "company", "ACME").unwrap()), vec![1]);
    assert!(store
        .view(|tx| repo.get_by_index(tx, "company", "ACME"))
        .unwrap()
        .is_empty());
}

// ============================================================================
// Composite values
// ============================================================================

#[test]
fn struct_valued_index() {
    let (store, repo) = orders();
    store
        .update(|tx| {
            repo.put(tx, &order(1, 10, "Oslo"))?;
            repo.put(tx, &order(2, 11, "Oslo"))?;
            repo.put(tx, &order(3, 10, "Lima"))
        })
        .unwrap();

    let tx = store.begin_read();
    let oslo = order(0, 0, "Oslo").ship_to;
    assert_eq!(ids_of(&repo.get_by_index(&tx, "ship_to", &oslo).unwrap()), vec![1, 2]);
    assert_eq!(ids_of(&repo.get_by_index(&tx, "customer_id", &10u64).unwrap()), vec![1, 3]);
}

#[test]
fn index_lookup_needs_native_value_type() {
    let (store, repo) = orders();
    store.update(|tx| repo.put(tx, &order(1, 10, "Oslo"))).unwrap();

    // customer_id is a u64; a string never matches its encoding
    let found = store
        .view(|tx| repo.get_by_index(tx, "customer_id", "10"))
        .unwrap();
    assert!(found.is_empty());
}
