//! Integration tests for building, merging and reading back data trees.

use xd_data::{meta, Base, Config, Context, DataTree, ErrorKind, Given, NodeId, PutOptions, Value, XdError};

fn ctx() -> Context {
    Context::new(Config::default())
}

fn point() -> Given {
    Given::new("Point", Base::Sequence)
        .with_meta(Given::new(meta::DISPLAY_NAME, Base::String).with_value("A point"))
        .with_child(Given::new("x", Base::Real).with_value(0.0))
        .with_child(Given::new("y", Base::Real).with_value(0.0))
        .with_child(
            Given::new("label", Base::String)
                .with_meta(Given::new(meta::OPTIONAL, Base::Boolean).with_value(true)),
        )
}

fn instance(tree: &mut DataTree, type_name: &str, name: &str) -> NodeId {
    let root = tree.root();
    let node = tree.make_instance(type_name, name).unwrap();
    tree.add_local(root, node);
    node
}

fn names(tree: &DataTree, id: NodeId) -> Vec<String> {
    tree.local_children(id)
        .into_iter()
        .map(|c| tree.name(c).to_string())
        .collect()
}

fn check(tree: &mut DataTree, target: NodeId, given: &Given) -> NodeId {
    tree.put(target, given, &ctx(), PutOptions::NONE)
        .unwrap_or_else(|e| panic!("put of '{}' failed: {}", given.name, e))
}

fn check_err(tree: &mut DataTree, target: NodeId, given: &Given) -> XdError {
    tree.put(target, given, &ctx(), PutOptions::NONE)
        .err()
        .unwrap_or_else(|| panic!("expected put of '{}' to fail", given.name))
}

// ------------------------------------------------------------ Round trip

#[test]
fn test_snapshot_round_trip() {
    let mut source = DataTree::new();
    let root = source.root();
    let site = source.create_child(root, "site", None, Some(Base::Collection)).unwrap();
    let temp = source.set(site, "temp", 21.5).unwrap();
    source.set(temp, meta::DISPLAY_NAME, "Temperature").unwrap();
    let list = source.create_child(site, "readings", None, Some(Base::List)).unwrap();
    for value in [1.0, 2.0] {
        let member = source.create_child(list, "", None, Some(Base::Real)).unwrap();
        source.set_value(member, Value::Real(value)).unwrap();
    }
    let snapshot = source.to_given(site).unwrap();

    let mut copy = DataTree::new();
    let root = copy.root();
    let site = copy.create_child(root, "site", None, Some(Base::Collection)).unwrap();
    copy.put(site, &snapshot, &ctx(), PutOptions::USE_CLIENT_RULES).unwrap();
    assert_eq!(copy.to_given(site).unwrap(), snapshot);
    assert_eq!(copy.path_of(copy.find_local(site, "readings").unwrap()), "/site/readings");
}

// ------------------------------------------------------------ Inheritance

#[test]
fn test_local_metadata_wins_over_prototype() {
    let mut tree = DataTree::new();
    tree.register_definition(point());
    let p = instance(&mut tree, "Point", "p");
    assert_eq!(tree.effective_string_value_of(p, meta::DISPLAY_NAME, String::new()), "A point");
    tree.set(p, meta::DISPLAY_NAME, "Mine").unwrap();
    assert_eq!(tree.effective_string_value_of(p, meta::DISPLAY_NAME, String::new()), "Mine");
}

#[test]
fn test_writable_inherits_from_parents() {
    let mut tree = DataTree::new();
    let root = tree.root();
    let folder = tree.create_child(root, "folder", None, Some(Base::Collection)).unwrap();
    let leaf = tree.set(folder, "leaf", 1u64).unwrap();
    assert!(!tree.is_writable(leaf));
    tree.set(folder, meta::WRITABLE, true).unwrap();
    assert!(tree.is_writable(leaf));
    tree.set(leaf, meta::WRITABLE, false).unwrap();
    assert!(!tree.is_writable(leaf));
}

// ------------------------------------------------------------ Put

#[test]
fn test_struct_children_are_not_deleted_by_omission() {
    let mut tree = DataTree::new();
    tree.register_definition(point());
    let p = instance(&mut tree, "Point", "p");
    let given = Given::new("p", Base::Sequence).with_child(Given::new("x", Base::Real).with_value(3.0));
    let err = check_err(&mut tree, p, &given);
    assert_eq!(err.kind, ErrorKind::CannotDelete);
    assert!(err.message.contains("'y'"));

    check(&mut tree, p, &given.partial());
    let x = tree.find_local(p, "x").unwrap();
    assert_eq!(tree.local_value(x), Some(&Value::Real(3.0)));
    assert_eq!(names(&tree, p), vec!["x", "y"]);
}

#[test]
fn test_list_members_are_replaced() {
    let mut tree = DataTree::new();
    let root = tree.root();
    let list = tree.create_child(root, "list", None, Some(Base::List)).unwrap();
    for _ in 0..3 {
        tree.create_child(list, "", None, Some(Base::Real)).unwrap();
    }
    let given = Given::new("list", Base::List).with_child(Given::new("1", Base::Real).with_value(9.0));
    check(&mut tree, list, &given);
    assert_eq!(names(&tree, list), vec!["1"]);
    let first = tree.find_local(list, "1").unwrap();
    assert_eq!(tree.local_value(first), Some(&Value::Real(9.0)));
}

#[test]
fn test_array_members_must_be_complete() {
    let mut tree = DataTree::new();
    let root = tree.root();
    let array = tree.create_child(root, "array", None, Some(Base::Array)).unwrap();
    let given = Given::new("array", Base::Array)
        .with_child(Given::new("1", Base::Real).with_value(1.0))
        .with_child(Given::new("3", Base::Real).with_value(3.0));
    assert_eq!(check_err(&mut tree, array, &given).kind, ErrorKind::InconsistentValues);
}

#[test]
fn test_any_is_replaced_by_given_data() {
    let mut tree = DataTree::new();
    tree.register_definition(
        Given::new("Holder", Base::Sequence).with_child(Given::new("data", Base::Any)),
    );
    let holder = instance(&mut tree, "Holder", "h");
    let given = Given::new("h", Base::Sequence)
        .partial()
        .with_child(Given::new("data", Base::Real).with_value(3.0));
    check(&mut tree, holder, &given);
    let data = tree.find_local(holder, "data").unwrap();
    assert_eq!(tree.base(data), Base::Real);
    assert!(tree.is_from_any(data));
    assert_eq!(tree.local_value(data), Some(&Value::Real(3.0)));

    // still replaceable
    let given = Given::new("h", Base::Sequence)
        .partial()
        .with_child(Given::new("data", Base::String).with_value("text"));
    check(&mut tree, holder, &given);
    let data = tree.find_local(holder, "data").unwrap();
    assert_eq!(tree.base(data), Base::String);
    assert_eq!(names(&tree, holder), vec!["data"]);
}

#[test]
fn test_untyped_data_on_any_is_refused() {
    let mut tree = DataTree::new();
    tree.register_definition(
        Given::new("Holder", Base::Sequence).with_child(Given::new("data", Base::Any)),
    );
    let holder = instance(&mut tree, "Holder", "h");
    let data = tree.find_local(holder, "data").unwrap();
    let err = check_err(&mut tree, data, &Given::untyped("data").with_value("1"));
    assert_eq!(err.kind, ErrorKind::ValueFormat);
}

// ------------------------------------------------------------ Priority array

fn commandable(tree: &mut DataTree) -> NodeId {
    let root = tree.root();
    let pv = tree.set(root, "pv", 0.0).unwrap();
    tree.set(pv, meta::COMMANDABLE, true).unwrap();
    tree.set(pv, meta::RELINQUISH_DEFAULT, 40.0).unwrap();
    pv
}

fn command(tree: &mut DataTree, pv: NodeId, priority: u8, given: Given) {
    let ctx = ctx().with_priority(priority);
    ctx.set_target(Some(pv));
    tree.put(pv, &given, &ctx, PutOptions::NONE).unwrap();
}

#[test]
fn test_lowest_priority_slot_wins() {
    let mut tree = DataTree::new();
    let pv = commandable(&mut tree);
    command(&mut tree, pv, 8, Given::new("pv", Base::Real).with_value(160.0));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(160.0)));
    command(&mut tree, pv, 4, Given::new("pv", Base::Real).with_value(120.0));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(120.0)));
    command(&mut tree, pv, 4, Given::new("pv", Base::Null));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(160.0)));
    command(&mut tree, pv, 8, Given::new("pv", Base::Null));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(40.0)));

    let array = tree.find_local(pv, meta::PRIORITY_ARRAY).unwrap();
    assert_eq!(tree.local_children(array).len(), 16);
    let slot = tree.find_local(array, "8").unwrap();
    assert_eq!(names(&tree, slot), vec!["null"]);
}

#[test]
fn test_relinquishing_everything_leaves_no_value() {
    let mut tree = DataTree::new();
    let root = tree.root();
    let pv = tree.set(root, "pv", 0.0).unwrap();
    tree.set(pv, meta::COMMANDABLE, true).unwrap();
    command(&mut tree, pv, 16, Given::new("pv", Base::Real).with_value(160.0));
    command(&mut tree, pv, 12, Given::new("pv", Base::Null));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(160.0)));
    command(&mut tree, pv, 12, Given::new("pv", Base::Real).with_value(120.0));
    command(&mut tree, pv, 4, Given::new("pv", Base::Real).with_value(40.0));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(40.0)));
    command(&mut tree, pv, 4, Given::new("pv", Base::Null));
    command(&mut tree, pv, 12, Given::new("pv", Base::Null));
    assert_eq!(tree.local_value(pv), Some(&Value::Real(160.0)));
    command(&mut tree, pv, 16, Given::new("pv", Base::Null));
    assert_eq!(tree.local_value(pv), None);
}

#[test]
fn test_commands_below_the_target_use_priority_sixteen() {
    let mut tree = DataTree::new();
    let pv = commandable(&mut tree);
    tree.put(pv, &Given::new("pv", Base::Real).with_value(7.0), &ctx(), PutOptions::NONE)
        .unwrap();
    let array = tree.find_local(pv, meta::PRIORITY_ARRAY).unwrap();
    let slot = tree.find_local(array, "16").unwrap();
    assert_eq!(names(&tree, slot), vec!["real"]);
}

// ------------------------------------------------------------ Errors

#[test]
fn test_error_codes() {
    assert_eq!(ErrorKind::NotWritable.code(), 15);
    assert_eq!(ErrorKind::CannotCreate.code(), 31);
    assert_eq!(ErrorKind::CannotDelete.code(), 32);
    assert_eq!(ErrorKind::InconsistentValues.code(), 39);
    assert_eq!(ErrorKind::from_code(1024), Some(ErrorKind::InternalTimeout));
    assert_eq!(ErrorKind::from_code(22), None);
}

#[test]
fn test_errors_name_target_and_given() {
    let mut tree = DataTree::new();
    let root = tree.root();
    let folder = tree.create_child(root, "folder", None, Some(Base::Collection)).unwrap();
    let leaf = tree.set(folder, "n", 1u64).unwrap();
    let given = Given::new("folder", Base::Collection)
        .partial()
        .with_child(Given::new("n", Base::Unsigned).with_value("nope"));
    let err = check_err(&mut tree, folder, &given);
    assert_eq!(err.kind, ErrorKind::ValueFormat);
    assert_eq!(err.target.as_deref(), Some(tree.path_of(leaf).as_str()));
    assert_eq!(err.given.as_deref(), Some("n"));
}

#[test]
fn test_config_from_toml() {
    let config = Config::from_toml_str("write_lock_timeout_ms = 10\nmax_path_length = 8").unwrap();
    assert_eq!(config.write_lock_timeout_ms, 10);
    assert_eq!(config.locale, "en-US");
    let err = Config::from_toml_str("max_path_length = \"many\"").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParamValueFormat);
}
