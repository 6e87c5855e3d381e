use proptest::prelude::*;
use refl_core::{merge, Database, Merger, Modifier, NameHash, Primitive, PrimitiveBody, PrimitiveKind};
use std::collections::HashMap;
use std::thread;

/// Parameter names are not part of a callable's identity; which unit's
/// spelling survives a merge depends on input order.
fn canonical(p: &Primitive) -> String {
    let mut p = p.clone();
    if let PrimitiveBody::Function(c) | PrimitiveBody::Method(c) = &mut p.body {
        for f in c.parameters.iter_mut().chain(c.return_field.as_mut()) {
            f.name = NameHash::NONE;
        }
    }
    format!("{p:?}")
}

/// Per-kind multiset of rendered primitives.
fn multiset(db: &Database) -> HashMap<PrimitiveKind, Vec<String>> {
    let mut out = HashMap::new();
    for kind in PrimitiveKind::ALL {
        let mut items: Vec<String> = db.primitives(kind).map(canonical).collect();
        items.sort();
        out.insert(kind, items);
    }
    out
}

fn physics_unit() -> Database {
    let mut db = Database::with_base_types().unwrap().with_source("physics.cpp");
    let ns = db.add_namespace("phys", NameHash::NONE).unwrap();
    let body = db.add_class("phys::Body", ns.name, 32, None).unwrap();
    let mass = db.field("phys::Body::mass", "float").unwrap().with_offset(0);
    db.add_field(body.name, mass);
    let dt = db.field("dt", "float").unwrap();
    db.add_method("phys::Body::step", body.name, None, vec![dt]).unwrap();
    db
}

fn render_unit() -> Database {
    let mut db = Database::with_base_types().unwrap().with_source("render.cpp");
    let ns = db.add_namespace("phys", NameHash::NONE).unwrap();
    // same class seen through a header include
    let body = db.add_class("phys::Body", ns.name, 32, None).unwrap();
    let mass = db.field("phys::Body::mass", "float").unwrap().with_offset(0);
    db.add_field(body.name, mass);
    let delta = db.field("delta", "float").unwrap();
    db.add_method("phys::Body::step", body.name, None, vec![delta]).unwrap();
    let b = db.field("b", "phys::Body").unwrap().with_const(true).with_modifier(Modifier::Reference);
    db.add_function("draw", NameHash::NONE, None, vec![b]).unwrap();
    db
}

#[test]
fn units_built_on_separate_threads_merge_cleanly() {
    let a = thread::spawn(physics_unit);
    let b = thread::spawn(render_unit);
    let (a, b) = (a.join().unwrap(), b.join().unwrap());

    let out = Merger::new().with_input(&a).with_input(&b).merge().unwrap();
    assert!(out.is_clean(), "{:?}", out.conflicts);
    let db = &out.database;
    assert_eq!(db.lookup_text(PrimitiveKind::Class, "phys::Body").len(), 1);
    assert_eq!(db.lookup_text(PrimitiveKind::Method, "phys::Body::step").len(), 1);
    assert_eq!(db.lookup_text(PrimitiveKind::Function, "draw").len(), 1);
    assert_eq!(db.primitives(PrimitiveKind::Type).count(), 12);
}

#[test]
fn merge_order_does_not_matter_without_conflicts() {
    let a = physics_unit();
    let b = render_unit();
    let ab = merge(&[&a, &b]).unwrap();
    let ba = merge(&[&b, &a]).unwrap();
    assert!(ab.is_clean() && ba.is_clean());
    assert_eq!(multiset(&ab.database), multiset(&ba.database));
}

#[test]
fn conflicting_layouts_are_all_reported() {
    let a = physics_unit();
    let mut b = Database::with_base_types().unwrap().with_source("legacy.cpp");
    let ns = b.add_namespace("phys", NameHash::NONE).unwrap();
    b.add_class("phys::Body", ns.name, 48, None).unwrap();
    b.add_enum("phys::Shape", ns.name, 4).unwrap();
    let mut c = Database::with_base_types().unwrap().with_source("tools.cpp");
    c.add_enum("phys::Shape", ns.name, 1).unwrap();

    let out = merge(&[&a, &b, &c]).unwrap();
    assert_eq!(out.conflicts.len(), 2);
    let sources: Vec<(&str, &str)> = out
        .conflicts
        .iter()
        .map(|c| (c.kept.source.as_str(), c.rejected.source.as_str()))
        .collect();
    assert!(sources.contains(&("physics.cpp", "legacy.cpp")));
    assert!(sources.contains(&("legacy.cpp", "tools.cpp")));
}

#[test]
fn merged_database_survives_a_binary_round_trip() {
    let a = physics_unit();
    let b = render_unit();
    let out = merge(&[&a, &b]).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("merged.rfdb");
    refl_core::binary::write_file(&out.database, &path).unwrap();
    let back = refl_core::binary::read_file(&path).unwrap();
    assert_eq!(back.snapshot(), out.database.snapshot());
}

fn type_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["int", "float", "double", "char", "bool"])
}

fn unit_from(decls: &[(u8, Vec<(&'static str, bool)>)], label: &str) -> Database {
    let mut db = Database::with_base_types().unwrap().with_source(label);
    for (i, (fname, params)) in decls.iter().enumerate() {
        let fields = params
            .iter()
            .enumerate()
            .map(|(j, (ty, ptr))| {
                let f = db.field(&format!("p{i}_{j}"), ty).unwrap();
                if *ptr { f.with_modifier(Modifier::Pointer) } else { f }
            })
            .collect();
        db.add_function(&format!("fn{fname}"), NameHash::NONE, None, fields).unwrap();
    }
    db
}

/// Constants named `C{n}` under enums `E{p}`; the value is fixed by the pair,
/// so two units never disagree about one.
fn constants_from(decls: &[(u8, u8)], label: &str) -> Database {
    let mut db = Database::with_base_types().unwrap().with_source(label);
    for &(n, p) in decls {
        let parent = db.get_name(&format!("E{p}")).unwrap().hash;
        db.add_enum_constant(&format!("C{n}"), parent, i64::from(n) * 10 + i64::from(p)).unwrap();
    }
    db
}

proptest! {
    // Callables only conflict on equal (name, uid) with different payload,
    // which cannot happen here, so every generated pair merges cleanly.
    #[test]
    fn callable_merge_is_commutative(
        a in prop::collection::vec((0u8..4, prop::collection::vec((type_name(), any::<bool>()), 0..4)), 0..6),
        b in prop::collection::vec((0u8..4, prop::collection::vec((type_name(), any::<bool>()), 0..4)), 0..6),
    ) {
        let da = unit_from(&a, "a");
        let db = unit_from(&b, "b");
        let ab = merge(&[&da, &db]).unwrap();
        let ba = merge(&[&db, &da]).unwrap();
        prop_assert!(ab.is_clean());
        prop_assert!(ba.is_clean());
        prop_assert_eq!(multiset(&ab.database), multiset(&ba.database));
    }

    // Same-named constants under several parents, in any order inside a
    // unit. A key both units carry is clean only when they share at least one
    // definition of it, and that holds in either merge order.
    #[test]
    fn shared_constant_names_merge_in_any_order(
        shared in prop::collection::vec((0u8..3, 0u8..3), 0..4),
        a in prop::collection::vec((0u8..3, 0u8..3), 0..6),
        b in prop::collection::vec((0u8..3, 0u8..3), 0..6),
    ) {
        let da = constants_from(&[shared.clone(), a].concat(), "a");
        let db = constants_from(&[b, shared].concat(), "b");
        let ab = merge(&[&da, &db]).unwrap();
        let ba = merge(&[&db, &da]).unwrap();
        prop_assert_eq!(ab.is_clean(), ba.is_clean());
        if ab.is_clean() {
            prop_assert_eq!(multiset(&ab.database), multiset(&ba.database));
        }
    }
}
