//! Concurrent writers and readers over one store

use crate::common::*;
use std::thread;

#[test]
fn concurrent_puts_keep_key_sets_complete() {
    let (store, repo) = customers();

    let handles: Vec<_> = (0..8u64)
        .map(|worker| {
            let store = store.clone();
            let repo = repo.clone();
            thread::spawn(move || {
                for i in 0..25u64 {
                    let id = worker * 100 + i;
                    store.update(|tx| repo.put(tx, &customer(id, "ACME"))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let tx = store.begin_read();
    assert_eq!(repo.index_keys(&tx, "company", "ACME").unwrap().len(), 200);
    assert_eq!(repo.count(&tx).unwrap(), 200);
    assert!(repo.check_consistency(&tx).unwrap().is_consistent());
}

#[test]
fn concurrent_moves_between_values() {
    let (store, repo) = customers();
    store
        .update(|tx| {
            for id in 0..40u64 {
                repo.put(tx, &customer(id, "ACME"))?;
            }
            Ok(())
        })
        .unwrap();

    let handles: Vec<_> = (0..4u64)
        .map(|worker| {
            let store = store.clone();
            let repo = repo.clone();
            thread::spawn(move || {
                for id in (worker * 10)..(worker * 10 + 10) {
                    store
                        .update(|tx| {
                            if id % 2 == 0 {
                                repo.put(tx, &customer(id, "Globex"))
                            } else {
                                repo.delete_by_id(tx, id).map(|_| ())
                            }
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let tx = store.begin_read();
    assert!(repo.get_by_index(&tx, "company", "ACME").unwrap().is_empty());
    assert_eq!(repo.get_by_index(&tx, "company", "Globex").unwrap().len(), 20);
    assert!(repo.check_consistency(&tx).unwrap().is_consistent());
}

#[test]
fn readers_see_whole_transactions() {
    let (store, repo) = customers();

    let writer = {
        let store = store.clone();
        let repo = repo.clone();
        thread::spawn(move || {
            for id in 0..50u64 {
                store
                    .update(|tx| {
                        repo.put(tx, &customer(id * 2, "ACME"))?;
                        repo.put(tx, &customer(id * 2 + 1, "ACME"))
                    })
                    .unwrap();
            }
        })
    };

    for _ in 0..50 {
        let tx = store.begin_read();
        let count = repo.count(&tx).unwrap();
        let indexed = repo.index_keys(&tx, "company", "ACME").unwrap().len();
        assert_eq!(count % 2, 0);
        assert_eq!(count, indexed);
    }
    writer.join().unwrap();
}
