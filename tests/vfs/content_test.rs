/*!
 * Content Tests
 * Reads, writes, spooling and index notifications
 */

use std::io::Read;

use pretty_assertions::assert_eq;
use workspace_vfs::{MountConfig, MountPoint, VfsError};

use crate::support::{mount, mount_with, path, read_all, write_file, RecordingIndexer};

#[test]
fn test_small_content_is_buffered_large_is_spooled() {
    let (_temp, mount) = mount_with(MountConfig::compact().with_memory_threshold(16));
    let root = mount.root();
    let small = write_file(&root, "small", b"tiny");
    let large = write_file(&root, "large", &[42u8; 64]);

    let stream = small.get_content().unwrap();
    assert!(!stream.is_spooled());
    assert_eq!(stream.into_bytes().unwrap(), b"tiny");

    let mut stream = large.get_content().unwrap();
    assert!(stream.is_spooled());
    assert_eq!(stream.len(), 64);

    // The source can change while the spooled copy is still being read
    large.update_content(&mut &b"replaced"[..], None).unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, vec![42u8; 64]);
}

#[test]
fn test_update_content_truncates() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a long original");
    file.update_content(&mut &b"short"[..], None).unwrap();
    assert_eq!(read_all(&file), b"short");
    assert_eq!(file.length().unwrap(), 5);
}

#[test]
fn test_folder_content_is_forbidden() {
    let (_temp, mount) = mount();
    let folder = mount.root().create_folder("dir").unwrap();
    assert!(matches!(folder.get_content(), Err(VfsError::Forbidden(_))));
    assert_eq!(folder.length().unwrap(), 0);
    assert!(folder.last_modified().is_ok());
}

#[test]
fn test_index_notifications() {
    let temp = tempfile::TempDir::new().unwrap();
    let indexer = RecordingIndexer::shared();
    let mount = MountPoint::builder(temp.path())
        .with_config(MountConfig::compact())
        .with_indexer(indexer.clone())
        .build()
        .unwrap();
    let root = mount.root();

    let dir = root.create_folder("dir").unwrap();
    let file = write_file(&dir, "a.txt", b"a");
    file.update_content(&mut &b"b"[..], None).unwrap();
    let renamed = file.rename("b.txt", None).unwrap();
    renamed.delete(None).unwrap();

    assert_eq!(
        indexer.take(),
        vec![
            "add /dir",
            "add /dir/a.txt",
            "update /dir/a.txt",
            "delete file /dir/a.txt",
            "add /dir/b.txt",
            "delete file /dir/b.txt",
        ]
    );
}

#[test]
fn test_background_indexing_drains_on_drop() {
    let temp = tempfile::TempDir::new().unwrap();
    let indexer = RecordingIndexer::shared();
    let mount = MountPoint::builder(temp.path())
        .with_config(MountConfig::compact().with_background_indexing(true))
        .with_indexer(indexer.clone())
        .build()
        .unwrap();

    for i in 0..5 {
        write_file(&mount.root(), &format!("f{}", i), b"");
    }
    drop(mount);
    assert_eq!(indexer.take().len(), 5);
}

#[test]
fn test_handles_compare_by_path_and_mount() {
    let (_temp, mount) = mount();
    let (_other_temp, other) = crate::support::mount();
    let a = mount.get_virtual_file(&path("/x"));

    assert_eq!(a, mount.get_virtual_file(&path("/x")));
    assert_ne!(a, other.get_virtual_file(&path("/x")));
    assert_eq!(a.parent().unwrap(), mount.root());
    assert!(mount.root().parent().is_none());
}

#[test]
fn test_cross_mount_copy_is_forbidden() {
    let (_temp, mount) = mount();
    let (_other_temp, other) = crate::support::mount();
    let file = write_file(&mount.root(), "a.txt", b"a");
    assert!(matches!(file.copy_to(&other.root()), Err(VfsError::Forbidden(_))));
}
