/*!
 * Path Tests
 * Parsing, normalization and round-trip properties
 */

use proptest::prelude::*;
use workspace_vfs::{ErrorKind, Path, VfsError};

fn element() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_ .-]{0,12}".prop_filter("dot names normalize away", |s| {
        s != "." && s != ".."
    })
}

proptest! {
    #[test]
    fn prop_string_round_trip(elements in prop::collection::vec(element(), 0..8)) {
        let raw = format!("/{}", elements.join("/"));
        let path = Path::parse(&raw).unwrap();
        prop_assert_eq!(path.elements(), elements.as_slice());
        prop_assert_eq!(Path::parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn prop_parent_of_child(elements in prop::collection::vec(element(), 0..6), name in element()) {
        let parent = Path::parse(&elements.join("/")).unwrap();
        let child = parent.child(&name).unwrap();
        prop_assert!(child.is_child(&parent));
        prop_assert_eq!(child.parent().unwrap(), parent);
        prop_assert_eq!(child.name(), name.as_str());
    }
}

#[test]
fn test_equivalent_spellings_normalize_identically() {
    let canonical = Path::parse("/src/main.rs").unwrap();
    for raw in ["src/main.rs", "/src/main.rs/", "/src/./main.rs", "/src/lib/../main.rs"] {
        assert_eq!(Path::parse(raw).unwrap(), canonical, "{}", raw);
    }
}

#[test]
fn test_malformed_input_rejected() {
    for raw in ["/a//b", "/..", "a/../../b", "/a/b\0c"] {
        let err = Path::parse(raw).unwrap_err();
        assert!(matches!(err, VfsError::InvalidPath(_)), "{}: {:?}", raw, err);
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}

#[test]
fn test_root() {
    let root = Path::root();
    assert!(root.is_root());
    assert_eq!(root.to_string(), "/");
    assert_eq!(Path::parse("/").unwrap(), root);
    assert!(!Path::parse("/a").unwrap().is_root());
}
