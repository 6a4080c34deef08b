//! Merge laws for the configuration tree.

use packcfg::{ConfigBuilder, Map, Plugin, Value, merge_values};
use proptest::prelude::*;
use serde_json::json;

/// Scalars and small nested objects/arrays.
fn leaf_strategy() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z./-]{0,8}".prop_map(Value::from),
    ];
    scalar.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|pairs| pairs.into_iter().collect::<Value>()),
        ]
    })
}

/// Between one and four fragments whose top-level keys never overlap.
fn disjoint_fragments() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::btree_map("[a-z]{1,6}", leaf_strategy(), 1..12).prop_flat_map(|entries| {
        let entries: Vec<_> = entries.into_iter().collect();
        let len = entries.len();
        prop::collection::vec(0..4usize, len).prop_map(move |buckets| {
            let mut fragments = vec![Map::new(); 4];
            for ((key, value), bucket) in entries.iter().cloned().zip(buckets) {
                fragments[bucket].insert(key, value);
            }
            fragments.into_iter().map(Value::Object).collect::<Vec<Value>>()
        })
    })
}

fn union(fragments: &[Value]) -> Map {
    fragments
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: merging disjoint fragments yields their union however the
    /// calls are grouped.
    #[test]
    fn prop_disjoint_merge_is_grouping_independent(fragments in disjoint_fragments()) {
        let one_call = ConfigBuilder::new().merge(fragments.clone()).build();

        let one_by_one = fragments
            .iter()
            .cloned()
            .fold(ConfigBuilder::new(), |builder, fragment| builder.merge([fragment]))
            .build();

        let mut right_grouped = Value::object();
        for fragment in fragments.iter().rev() {
            let mut grouped = fragment.clone();
            merge_values(&mut grouped, right_grouped);
            right_grouped = grouped;
        }

        let expected = union(&fragments);

        // Key order follows merge order, so compare as sets of entries.
        prop_assert_eq!(one_call.as_object().map_or(0, Map::len), expected.len());
        for (key, value) in &expected {
            prop_assert_eq!(one_call.get(key), Some(value));
            prop_assert_eq!(one_by_one.get(key), Some(value));
            prop_assert_eq!(right_grouped.get(key), Some(value));
        }
    }

    /// Property: merging an empty object never changes a tree.
    #[test]
    fn prop_empty_fragment_is_identity(value in leaf_strategy()) {
        let mut merged = value.clone();
        merge_values(&mut merged, Value::object());
        if value.as_object().is_some() {
            prop_assert_eq!(merged, value);
        } else {
            prop_assert_eq!(merged, Value::object());
        }
    }

    /// Property: array lengths add up across merges.
    #[test]
    fn prop_arrays_concatenate(
        a in prop::collection::vec(leaf_strategy(), 0..5),
        b in prop::collection::vec(leaf_strategy(), 0..5),
    ) {
        let mut target = Value::Array(a.clone());
        merge_values(&mut target, Value::Array(b.clone()));
        let items = target.as_array().unwrap();
        prop_assert_eq!(items.len(), a.len() + b.len());
        prop_assert_eq!(&items[..a.len()], &a[..]);
        prop_assert_eq!(&items[a.len()..], &b[..]);
    }
}

#[test]
fn nested_objects_merge_deeply() {
    let config = ConfigBuilder::new()
        .merge([Value::from(json!({
            "devServer": {"publicPath": "/js/", "headers": {"X-A": "1"}},
        }))])
        .merge([Value::from(json!({
            "devServer": {"headers": {"X-B": "2"}, "port": 8080},
        }))])
        .build();

    assert_eq!(
        config["devServer"].to_json(),
        json!({"publicPath": "/js/", "headers": {"X-A": "1", "X-B": "2"}, "port": 8080})
    );
}

#[test]
fn plugins_concatenate_across_calls() {
    let config = ConfigBuilder::new()
        .plugins([Plugin::named("A")])
        .merge([Value::from_iter([(
            "plugins",
            Value::from(vec![Plugin::named("B"), Plugin::named("C")]),
        )])])
        .plugins([Plugin::named("D")])
        .build();

    let names: Vec<_> = config["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_plugin().unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
}

#[test]
fn scalar_replaces_object() {
    let config = ConfigBuilder::new()
        .merge([Value::from(json!({"devtool": {"type": "source-map"}}))])
        .merge([Value::from(json!({"devtool": false}))])
        .build();
    assert_eq!(config["devtool"], Value::from(false));
}

#[test]
fn several_fragments_in_one_call() {
    let config = ConfigBuilder::new()
        .merge([
            Value::from(json!({"resolve": {"modules": ["node_modules"]}})),
            Value::from(json!({"resolve": {"modules": ["src"]}})),
            Value::object(),
        ])
        .build();
    assert_eq!(
        config["resolve"]["modules"].to_json(),
        json!(["node_modules", "src"])
    );
}
