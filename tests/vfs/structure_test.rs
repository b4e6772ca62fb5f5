/*!
 * Structure Tests
 * Create, copy, move, rename and delete
 */

use std::time::Duration;

use pretty_assertions::assert_eq;
use workspace_vfs::VfsError;

use crate::support::{mount, path, read_all, write_file};

#[test]
fn test_create_file_conflicts_on_existing() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let file = write_file(&root, "a.txt", b"hello");
    assert_eq!(file.path(), &path("/a.txt"));
    assert_eq!(read_all(&file), b"hello");
    assert!(matches!(root.create_file("a.txt", None), Err(VfsError::Conflict(_))));
}

#[test]
fn test_create_file_under_file_is_forbidden() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"");
    assert!(matches!(file.create_file("b", None), Err(VfsError::Forbidden(_))));
}

#[test]
fn test_service_dir_name_is_reserved() {
    let (_temp, mount) = mount();
    let root = mount.root();
    assert!(matches!(root.create_file(".vfs", None), Err(VfsError::Forbidden(_))));
    assert!(matches!(root.create_folder(".vfs/x"), Err(VfsError::Forbidden(_))));
}

#[test]
fn test_create_folder_returns_first_created_level() {
    let (_temp, mount) = mount();
    let root = mount.root();

    let a = root.create_folder("a").unwrap();
    assert_eq!(a.path(), &path("/a"));

    let first = root.create_folder("a/b/c").unwrap();
    assert_eq!(first.path(), &path("/a/b"));
    assert!(mount.get_virtual_file(&path("/a/b/c")).is_folder());

    assert!(matches!(root.create_folder("a/b/c"), Err(VfsError::Conflict(_))));
}

#[test]
fn test_create_folder_through_file_is_forbidden() {
    let (_temp, mount) = mount();
    let root = mount.root();
    write_file(&root, "f", b"");
    assert!(matches!(root.create_folder("f/sub"), Err(VfsError::Forbidden(_))));
}

#[test]
fn test_children_are_sorted_and_hide_service_dir() {
    let (_temp, mount) = mount();
    let root = mount.root();
    write_file(&root, "b.txt", b"");
    root.create_folder("c").unwrap();
    write_file(&root, "a.txt", b"");

    let names: Vec<String> = root
        .children()
        .unwrap()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c"]);

    assert!(root.child("c").unwrap().unwrap().is_folder());
    assert!(root.child("missing").unwrap().is_none());
    assert!(root.child(".vfs").unwrap().is_none());
}

#[test]
fn test_walk_is_breadth_first() {
    let (_temp, mount) = mount();
    let root = mount.root();
    root.create_folder("a/b").unwrap();
    write_file(&mount.get_virtual_file(&path("/a/b")), "deep.txt", b"");
    write_file(&root, "top.txt", b"");

    let mut seen = Vec::new();
    root.walk(|item| {
        seen.push(item.path().to_string());
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, vec!["/a", "/top.txt", "/a/b", "/a/b/deep.txt"]);
}

#[test]
fn test_copy_is_independent_of_original() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let dest = root.create_folder("dest").unwrap();
    let original = write_file(&root, "a.txt", b"payload");

    let copy = original.copy_to(&dest).unwrap();
    assert_eq!(copy.path(), &path("/dest/a.txt"));
    assert_eq!(read_all(&copy), read_all(&original));

    original.delete(None).unwrap();
    assert!(!original.exists());
    assert_eq!(read_all(&copy), b"payload");
}

#[test]
fn test_copy_folder_recursively() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let src = root.create_folder("src").unwrap();
    src.create_folder("x/y").unwrap();
    write_file(&mount.get_virtual_file(&path("/src/x/y")), "z.txt", b"z");
    let dest = root.create_folder("dest").unwrap();

    let copied = src.copy_to_named(&dest, Some("renamed"), false).unwrap();
    assert_eq!(copied.path(), &path("/dest/renamed"));
    assert_eq!(
        read_all(&mount.get_virtual_file(&path("/dest/renamed/x/y/z.txt"))),
        b"z"
    );
}

#[test]
fn test_copy_existing_target_needs_overwrite() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let dest = root.create_folder("dest").unwrap();
    let existing = write_file(&dest, "a.txt", b"old");
    existing.lock(Duration::ZERO).unwrap();
    let source = write_file(&root, "a.txt", b"new");

    assert!(matches!(source.copy_to(&dest), Err(VfsError::Conflict(_))));

    let copy = source.copy_to_named(&dest, None, true).unwrap();
    assert_eq!(read_all(&copy), b"new");
    assert!(!copy.is_locked().unwrap());
}

#[test]
fn test_copy_into_itself_is_forbidden() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let folder = root.create_folder("a").unwrap();
    let sub = folder.create_folder("b").unwrap();

    assert!(matches!(folder.copy_to(&folder), Err(VfsError::Forbidden(_))));
    assert!(matches!(folder.copy_to(&sub), Err(VfsError::Forbidden(_))));
}

#[test]
fn test_move_into_descendant_is_forbidden() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let folder = root.create_folder("a").unwrap();
    let sub = folder.create_folder("b").unwrap();
    write_file(&folder, "keep.txt", b"k");

    assert!(matches!(folder.move_to(&sub, None), Err(VfsError::Forbidden(_))));
    assert!(folder.exists());
    assert!(sub.exists());
    assert_eq!(read_all(&mount.get_virtual_file(&path("/a/keep.txt"))), b"k");
}

#[test]
fn test_move_file_with_lock_token() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let dest = root.create_folder("dest").unwrap();
    let file = write_file(&root, "a.txt", b"data");
    let token = file.lock(Duration::ZERO).unwrap();

    assert!(matches!(file.move_to(&dest, None), Err(VfsError::Forbidden(_))));

    let moved = file.move_to(&dest, Some(&token)).unwrap();
    assert!(!file.exists());
    assert_eq!(moved.path(), &path("/dest/a.txt"));
    assert_eq!(read_all(&moved), b"data");
    assert!(!moved.is_locked().unwrap());
}

#[test]
fn test_rename() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let file = write_file(&root, "a.txt", b"data");
    write_file(&root, "taken.txt", b"");

    assert!(matches!(file.rename("taken.txt", None), Err(VfsError::Conflict(_))));
    assert!(matches!(file.rename("a.txt", None), Err(VfsError::Conflict(_))));

    let renamed = file.rename("b.txt", None).unwrap();
    assert_eq!(renamed.path(), &path("/b.txt"));
    assert!(!file.exists());
    assert_eq!(read_all(&renamed), b"data");
}

#[test]
fn test_root_cannot_be_mutated() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let dest = root.create_folder("dest").unwrap();
    assert!(matches!(root.delete(None), Err(VfsError::Forbidden(_))));
    assert!(matches!(root.rename("x", None), Err(VfsError::Forbidden(_))));
    assert!(matches!(root.move_to(&dest, None), Err(VfsError::Forbidden(_))));
}

#[test]
fn test_delete_folder_with_locked_descendant() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let folder = root.create_folder("a/b").unwrap();
    assert_eq!(folder.path(), &path("/a"));
    let locked = write_file(&mount.get_virtual_file(&path("/a/b")), "l.txt", b"l");
    let token = locked.lock(Duration::ZERO).unwrap();

    assert!(matches!(folder.delete(None), Err(VfsError::Forbidden(_))));
    assert!(folder.exists());
    assert!(locked.exists());

    locked.unlock(&token).unwrap();
    folder.delete(None).unwrap();
    assert!(!folder.exists());
    assert!(!locked.exists());
}

#[test]
fn test_move_and_rename_folder_with_locked_descendant() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let folder = root.create_folder("src/inner").unwrap();
    let dest = root.create_folder("dest").unwrap();
    let locked = write_file(&mount.get_virtual_file(&path("/src/inner")), "l.txt", b"l");
    let token = locked.lock(Duration::ZERO).unwrap();

    assert!(matches!(folder.move_to(&dest, None), Err(VfsError::Forbidden(_))));
    assert!(matches!(folder.rename("renamed", None), Err(VfsError::Forbidden(_))));

    assert!(folder.exists());
    assert!(locked.exists());
    assert!(locked.is_locked().unwrap());
    assert!(!mount.get_virtual_file(&path("/dest/src")).exists());
    assert!(!mount.get_virtual_file(&path("/renamed")).exists());
    assert!(dest.children().unwrap().is_empty());
    locked.unlock(&token).unwrap();
}

#[test]
fn test_delete_file_named_like_sibling_props_file() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let plain = write_file(&root, "a", b"a");
    let suffixed = write_file(&root, "a_props", b"b");
    plain.set_property("k", Some("v")).unwrap();

    suffixed.delete(None).unwrap();

    assert!(!suffixed.exists());
    assert_eq!(plain.get_property("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn test_delete_file_named_like_sibling_lock_file() {
    let (temp, mount) = mount();
    let root = mount.root();
    let plain = write_file(&root, "a", b"a");
    let suffixed = write_file(&root, "a_lock", b"b");
    let token = plain.lock(Duration::ZERO).unwrap();

    suffixed.delete(None).unwrap();

    assert!(!suffixed.exists());
    assert!(temp.path().join(".vfs/locks/a_lock").is_file());
    assert!(plain.is_locked().unwrap());
    plain.unlock(&token).unwrap();
}

#[test]
fn test_delete_folder_named_like_sibling_props_file() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let plain = write_file(&root, "a", b"a");
    plain.set_property("k", Some("v")).unwrap();
    let folder = root.create_folder("a_props").unwrap();

    folder.delete(None).unwrap();

    assert!(!folder.exists());
    assert_eq!(plain.get_property("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn test_delete_missing_is_not_found() {
    let (_temp, mount) = mount();
    let ghost = mount.get_virtual_file(&path("/ghost"));
    assert!(matches!(ghost.delete(None), Err(VfsError::NotFound(_))));
}

#[test]
fn test_content_hashes() {
    let (_temp, mount) = mount();
    let root = mount.root();
    let folder = root.create_folder("p/q").unwrap();
    write_file(&folder, "b.txt", b"hello");
    let nested = mount.get_virtual_file(&path("/p/q"));
    write_file(&nested, "a.txt", b"");

    let hashes = folder.content_hashes().unwrap();
    assert_eq!(
        hashes,
        vec![
            ("b.txt".to_string(), "5d41402abc4b2a76b9719d911017c592".to_string()),
            ("q/a.txt".to_string(), "d41d8cd98f00b204e9800998ecf8427e".to_string()),
        ]
    );

    let single = mount.get_virtual_file(&path("/p/b.txt")).content_hashes().unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].0, "b.txt");
}
