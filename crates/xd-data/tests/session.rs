//! Integration tests for sessions over a shared store.

use proptest::prelude::*;
use xd_data::{
    rules, Base, Config, Context, DataTree, ErrorKind, Given, Posted, Store, Value,
};

fn ctx() -> Context {
    Context::new(Config::default())
}

fn store() -> Store {
    let mut tree = DataTree::new();
    let root = tree.root();
    let site = tree.create_child(root, "site", None, Some(Base::Collection)).unwrap();
    tree.set(site, "temp", 20.0).unwrap();
    let list = tree.create_child(site, "log", None, Some(Base::List)).unwrap();
    for text in ["one", "two", "three"] {
        let member = tree.create_child(list, "", None, Some(Base::String)).unwrap();
        tree.set_value(member, Value::from(text)).unwrap();
    }
    Store::new(tree)
}

fn read(store: &Store, path: &str) -> String {
    store
        .atomic_get_string(path, ctx())
        .unwrap_or_else(|e| panic!("get of '{}' failed: {}", path, e))
}

// ------------------------------------------------------------ Commit and discard

#[test]
fn test_commit_publishes_edits() {
    let store = store();
    let session = store.write_session(ctx()).unwrap();
    session
        .with_tree(|tree, root, ctx| {
            let site = tree.eval(root, "site", ctx, xd_data::EvalMode::Put)?;
            let given = Given::new("site", Base::Collection)
                .partial()
                .with_child(Given::new("temp", Base::Real).with_value(22.5))
                .with_child(Given::new("humidity", Base::Real).with_value(40.0));
            tree.put(site, &given, ctx, xd_data::PutOptions::NONE)
        })
        .unwrap();
    assert_eq!(read(&store, "site/temp"), "20");
    session.commit().unwrap();
    assert_eq!(read(&store, "site/temp"), "22.5");
    assert_eq!(read(&store, "site/humidity"), "40");
}

#[test]
fn test_discard_leaves_the_tree_alone() {
    let store = store();
    let session = store.write_session(ctx()).unwrap();
    session.with_tree(|tree, root, ctx| {
        let log = tree.eval(root, "site/log", ctx, xd_data::EvalMode::Delete).unwrap();
        tree.delete(log, "1", ctx).unwrap();
    });
    session.discard();
    assert_eq!(read(&store, "site/log/1"), "one");
    let count = store.with_tree(|tree| tree.open_sessions());
    assert_eq!(count, 0);
}

#[test]
fn test_deletes_renumber_on_commit() {
    let store = store();
    store.atomic_delete("site/log/1", ctx()).unwrap();
    assert_eq!(read(&store, "site/log/1"), "two");
    assert_eq!(read(&store, "site/log/2"), "three");
    let err = store.atomic_get_string("site/log/3", ctx()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DataNotFound);
}

#[test]
fn test_post_returns_the_new_path() {
    let store = store();
    let given = Given::new("entry", Base::String).with_value("four");
    let posted = store.atomic_post("site/log", &given, ctx()).unwrap();
    assert_eq!(posted, Posted::Created("/site/log/4".to_string()));
    assert_eq!(read(&store, "site/log/4"), "four");
}

#[test]
fn test_copy_reflects_committed_state() {
    let store = store();
    let given = Given::new("temp", Base::Real).with_value(18.0);
    store.atomic_put("site/temp", &given, ctx()).unwrap();
    let copy = store.atomic_get_copy("site", ctx()).unwrap();
    let temp = copy.child("temp").unwrap();
    assert_eq!(temp.value, Some(Value::Real(18.0)));
    assert_eq!(copy.child("log").unwrap().children.len(), 3);
}

#[test]
fn test_readers_do_not_wait_for_writers() {
    let store = store();
    let session = store.write_session(ctx()).unwrap();
    session.with_tree(|tree, root, ctx| {
        let temp = tree.eval(root, "site/temp", ctx, xd_data::EvalMode::Put).unwrap();
        tree.set_value(temp, Value::Real(30.0)).unwrap();
    });
    std::thread::scope(|scope| {
        let reader = scope.spawn(|| read(&store, "site/temp"));
        assert_eq!(reader.join().unwrap(), "20");
    });
    session.commit().unwrap();
    assert_eq!(read(&store, "site/temp"), "30");
}

// ------------------------------------------------------------ Naming

proptest! {
    #[test]
    fn prop_collection_names_are_fresh(
        existing in proptest::collection::vec("[ab](_[0-9]{1,2})?", 0..8),
        prefix in "[ab]?",
    ) {
        let name = rules::next_available_child_name(Base::Collection, &prefix, &existing, false).unwrap();
        prop_assert!(!existing.contains(&name));
        prop_assert!(name.starts_with(&prefix));
    }

    #[test]
    fn prop_list_names_count_up(count in 0usize..20) {
        let existing: Vec<String> = (1..=count).map(|i| i.to_string()).collect();
        let name = rules::next_available_child_name(Base::List, "x", &existing, false).unwrap();
        prop_assert_eq!(name, (count + 1).to_string());
    }
}
