//! Schema declaration and namespace layout

use crate::common::*;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Ticket {
    id: u16,
    queue: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Tagged<T> {
    id: u64,
    tag: T,
}

impl<T> Record for Tagged<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }

    fn schema() -> SchemaBuilder<Self> {
        SchemaBuilder::new()
            .fields(["id", "tag"])
            .index("tag", |t: &Tagged<T>| t.tag.clone())
    }
}

#[test]
fn derived_namespace_uses_type_name() {
    let (store, repo) = customers();
    assert_eq!(repo.descriptor().primary_namespace(), "Customer");
    assert_eq!(repo.descriptor().indexed_fields(), ["company", "active"]);

    let tx = store.begin_read();
    assert!(tx.namespace_exists(&NamespacePath::root("Customer")));
    assert!(tx.namespace_exists(&NamespacePath::root("Customer").child("company")));
    assert!(tx.namespace_exists(&NamespacePath::root("Customer").child("active")));
}

#[test]
fn explicit_namespace_overrides_type_name() {
    let (store, repo) = orders();
    assert_eq!(repo.namespace_path(), &NamespacePath::root("orders"));
    assert!(store
        .begin_read()
        .namespace_exists(&NamespacePath::root("orders").child("ship_to")));
}

#[test]
fn repositories_share_one_store() {
    let repo_c = IndexedRepository::<Customer>::new().unwrap();
    let repo_o = IndexedRepository::<Order>::new().unwrap();
    let store = store_with(&repo_c);
    store
        .update(|tx| {
            repo_o.create_schema(tx)?;
            repo_c.put(tx, &customer(1, "ACME"))?;
            repo_o.put(tx, &order(1, 1, "Oslo"))
        })
        .unwrap();

    let tx = store.begin_read();
    assert_eq!(repo_c.count(&tx).unwrap(), 1);
    assert_eq!(repo_o.count(&tx).unwrap(), 1);
    let placed = repo_o.get_by_index(&tx, "customer_id", &1u64).unwrap();
    assert_eq!(placed[0].customer_id, 1);
}

#[test]
fn create_schema_twice_keeps_data() {
    let (store, repo) = customers();
    store.update(|tx| repo.put(tx, &customer(1, "ACME"))).unwrap();
    store.update(|tx| repo.create_schema(tx)).unwrap();
    assert_eq!(store.view(|tx| repo.count(tx)).unwrap(), 1);
}

#[test]
fn index_on_undeclared_field_is_rejected() {
    let err = SchemaBuilder::<Ticket>::new()
        .fields(["id", "queue"])
        .index("owner", |t: &Ticket| t.queue.clone())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::SchemaError(_)));
}

#[test]
fn duplicate_index_is_rejected() {
    let err = SchemaBuilder::<Ticket>::new()
        .fields(["id", "queue"])
        .index("queue", |t: &Ticket| t.queue.clone())
        .index("queue", |t: &Ticket| t.queue.len())
        .build()
        .unwrap_err();
    assert!(err.is_schema());
}

#[test]
fn schema_without_fields_needs_namespace() {
    assert!(SchemaBuilder::<Ticket>::new().build().unwrap_err().is_schema());

    let schema = SchemaBuilder::<Ticket>::new()
        .namespace("tickets")
        .build()
        .unwrap();
    assert_eq!(schema.descriptor().primary_namespace(), "tickets");
    assert!(schema.descriptor().indexed_fields().is_empty());
}

#[test]
fn index_value_for_unindexed_field_is_schema_error() {
    let repo = IndexedRepository::<Customer>::new().unwrap();
    let record = customer(1, "ACME");
    assert_eq!(
        repo.schema().index_value("company", &record).unwrap(),
        encode("ACME").unwrap()
    );
    assert!(repo.schema().index_value("name", &record).unwrap_err().is_schema());
}

#[test]
fn cached_schema_is_shared() {
    let a = Schema::<Customer>::cached().unwrap();
    let b = Schema::<Customer>::cached().unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

#[test]
fn generic_instantiations_do_not_share_data() {
    let numbers = IndexedRepository::<Tagged<u64>>::new().unwrap();
    let strings = IndexedRepository::<Tagged<String>>::new().unwrap();
    assert_ne!(numbers.namespace_path(), strings.namespace_path());
    assert_eq!(numbers.descriptor().primary_namespace(), "Tagged<u64>");
    assert_eq!(strings.descriptor().primary_namespace(), "Tagged<String>");

    let store = store_with(&numbers);
    store
        .update(|tx| {
            strings.create_schema(tx)?;
            numbers.put(tx, &Tagged { id: 1, tag: 7u64 })?;
            strings.put(
                tx,
                &Tagged {
                    id: 1,
                    tag: "seven".to_string(),
                },
            )
        })
        .unwrap();

    let tx = store.begin_read();
    assert_eq!(numbers.count(&tx).unwrap(), 1);
    assert_eq!(strings.count(&tx).unwrap(), 1);
    assert_eq!(numbers.get_by_id(&tx, 1).unwrap().unwrap().tag, 7);
    assert_eq!(strings.get_by_id(&tx, 1).unwrap().unwrap().tag, "seven");
    assert_eq!(strings.get_by_index(&tx, "tag", "seven").unwrap().len(), 1);
}
