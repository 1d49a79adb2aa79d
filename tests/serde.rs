#![cfg(feature = "serde1")]

mod common;

use crate::common::{sample, Fs, FsItem};

#[test]
fn green_trees_serialize_as_nested_maps() {
    let (root, d) = sample::<Fs>();
    let json = serde_json::to_value(&root).unwrap();

    assert_eq!(json["identity"], root.identity().get());
    assert_eq!(json["payload"], "c:");
    let names: Vec<_> =
        json["children"].as_array().unwrap().iter().map(|it| it["payload"].clone()).collect();
    assert_eq!(names, ["a.cs", "b.cs", "c"]);
    assert_eq!(json["children"][2]["children"][0]["identity"], d.identity().get());
    assert!(json["children"][0].get("children").is_none());
}

#[test]
fn diffgrams_serialize_with_their_kind() {
    let (root, d) = sample::<Fs>();
    let locked = d.with_payload(FsItem { read_only: true, ..d.payload().clone() });
    let new_root = root.replace_descendant(&locked).unwrap();
    let changes = new_root.changes_since(&root).unwrap();

    let json = serde_json::to_value(&changes).unwrap();
    assert_eq!(json[0]["kind"], "Replaced");
    assert_eq!(json[0]["identity"], d.identity().get());
    assert_eq!(json[0]["before"], "d.cs");
}
