/*!
 * Properties Tests
 * Side-file metadata lifecycle and caching
 */

use std::time::Duration;

use workspace_vfs::{Properties, VfsError};

use crate::support::{mount, path, write_file};

#[test]
fn test_missing_item_has_no_properties() {
    let (_temp, mount) = mount();
    let ghost = mount.get_virtual_file(&path("/ghost"));
    assert!(matches!(ghost.get_properties(), Err(VfsError::NotFound(_))));
}

#[test]
fn test_set_and_remove_property() {
    let (temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"");
    let side = temp.path().join(".vfs/props/a.txt_props");

    assert!(file.get_properties().unwrap().is_empty());
    assert!(!side.exists());

    file.set_property("owner", Some("alice")).unwrap();
    assert_eq!(file.get_property("owner").unwrap().as_deref(), Some("alice"));
    assert!(side.exists());

    file.set_property("owner", None).unwrap();
    assert_eq!(file.get_property("owner").unwrap(), None);
    assert!(!side.exists());
}

#[test]
fn test_update_properties_merges() {
    let (_temp, mount) = mount();
    let folder = mount.root().create_folder("dir").unwrap();
    folder.set_property("keep", Some("1")).unwrap();
    folder.set_property("drop", Some("2")).unwrap();

    let updates: Properties = [
        ("drop", Vec::new()),
        ("tags", vec!["x".to_string(), "y".to_string()]),
    ]
    .into_iter()
    .collect();
    folder.update_properties(&updates, None).unwrap();

    assert_eq!(folder.get_property("keep").unwrap().as_deref(), Some("1"));
    assert_eq!(folder.get_property("drop").unwrap(), None);
    assert_eq!(folder.get_property_values("tags").unwrap(), vec!["x", "y"]);
}

#[test]
fn test_locked_file_properties_need_token() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"");
    let token = file.lock(Duration::ZERO).unwrap();

    let mut updates = Properties::new();
    updates.set("k", ["v"]);
    assert!(matches!(file.update_properties(&updates, None), Err(VfsError::Forbidden(_))));
    assert!(matches!(file.set_property("k", Some("v")), Err(VfsError::Forbidden(_))));

    file.update_properties(&updates, Some(&token)).unwrap();
    assert_eq!(file.get_property("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn test_properties_follow_copy_and_vanish_on_delete() {
    let (temp, mount) = mount();
    let root = mount.root();
    let folder = root.create_folder("src/inner").unwrap();
    let inner = mount.get_virtual_file(&path("/src/inner"));
    inner.set_property("depth", Some("2")).unwrap();
    folder.set_property("depth", Some("1")).unwrap();
    let dest = root.create_folder("dest").unwrap();

    let copy = folder.copy_to(&dest).unwrap();
    assert_eq!(copy.get_property("depth").unwrap().as_deref(), Some("1"));
    let inner_copy = mount.get_virtual_file(&path("/dest/src/inner"));
    assert_eq!(inner_copy.get_property("depth").unwrap().as_deref(), Some("2"));

    folder.delete(None).unwrap();
    assert!(!temp.path().join(".vfs/props/src_props").exists());
    assert!(!temp.path().join(".vfs/props/src").exists());
    assert_eq!(inner_copy.get_property("depth").unwrap().as_deref(), Some("2"));
}

#[test]
fn test_properties_are_cached() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"");
    file.set_property("k", Some("v")).unwrap();

    let before = mount.cache_stats()[1].hits;
    for _ in 0..5 {
        file.get_properties().unwrap();
    }
    assert!(mount.cache_stats()[1].hits >= before + 5);
}
