/*!
 * Lock Tests
 * Token ownership, lazy expiry and concurrent acquisition
 */

use std::sync::Barrier;
use std::thread;
use std::time::Duration;

use workspace_vfs::{MountConfig, MountPoint, VfsError};

use crate::support::{mount, path, read_all, write_file};

#[test]
fn test_lock_and_unlock_with_token() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a");

    assert!(!file.is_locked().unwrap());
    let token = file.lock(Duration::ZERO).unwrap();
    assert!(file.is_locked().unwrap());

    file.unlock(&token).unwrap();
    assert!(!file.is_locked().unwrap());
}

#[test]
fn test_only_lock_token_is_accepted() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a");
    let token = file.lock(Duration::ZERO).unwrap();

    assert!(matches!(file.unlock("bogus"), Err(VfsError::Forbidden(_))));
    assert!(matches!(
        file.update_content(&mut &b"x"[..], Some("bogus")),
        Err(VfsError::Forbidden(_))
    ));
    assert!(matches!(file.update_content(&mut &b"x"[..], None), Err(VfsError::Forbidden(_))));
    assert!(matches!(file.delete(None), Err(VfsError::Forbidden(_))));
    assert!(matches!(file.rename("b.txt", Some("bogus")), Err(VfsError::Forbidden(_))));

    file.update_content(&mut &b"owner"[..], Some(&token)).unwrap();
    assert_eq!(read_all(&file), b"owner");
    assert!(file.is_locked().unwrap());
}

#[test]
fn test_second_lock_conflicts() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a");
    file.lock(Duration::ZERO).unwrap();
    assert!(matches!(file.lock(Duration::ZERO), Err(VfsError::Conflict(_))));
}

#[test]
fn test_unlock_without_lock_conflicts() {
    let (_temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a");
    assert!(matches!(file.unlock("anything"), Err(VfsError::Conflict(_))));
}

#[test]
fn test_folders_cannot_be_locked() {
    let (_temp, mount) = mount();
    let folder = mount.root().create_folder("dir").unwrap();
    assert!(matches!(folder.lock(Duration::ZERO), Err(VfsError::Forbidden(_))));
    assert!(!folder.is_locked().unwrap());
}

#[test]
fn test_lock_expires_lazily() {
    let (temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a");

    file.lock(Duration::from_millis(100)).unwrap();
    assert!(file.is_locked().unwrap());
    assert!(temp.path().join(".vfs/locks/a.txt_lock").exists());

    thread::sleep(Duration::from_millis(150));
    assert!(!file.is_locked().unwrap());
    assert!(!temp.path().join(".vfs/locks/a.txt_lock").exists());

    // The expired lock no longer guards the file
    file.update_content(&mut &b"free"[..], None).unwrap();
    file.lock(Duration::ZERO).unwrap();
}

#[test]
fn test_lock_survives_remount() {
    let (temp, mount) = mount();
    let file = write_file(&mount.root(), "a.txt", b"a");
    let token = file.lock(Duration::ZERO).unwrap();
    drop(mount);

    let mount = MountPoint::builder(temp.path())
        .with_config(MountConfig::compact())
        .build()
        .unwrap();
    let file = mount.get_virtual_file(&path("/a.txt"));
    assert!(file.is_locked().unwrap());
    file.unlock(&token).unwrap();
}

#[test]
fn test_concurrent_lock_has_one_winner() {
    let (_temp, mount) = mount();
    write_file(&mount.root(), "contended.txt", b"x");
    let target = path("/contended.txt");
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    mount.lock_file(&target, Duration::ZERO)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(VfsError::Conflict(_))))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);
}
