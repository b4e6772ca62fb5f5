/*!
 * VFS Path
 * Immutable, normalized hierarchical identifier within one mount point
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::{VfsError, VfsResult};

/// Separator between path elements
pub const SEPARATOR: char = '/';

/// Normalized mount-relative path
///
/// A path is a sequence of non-empty names; the root is the empty sequence.
/// Two paths are equal iff their element sequences are equal, which makes
/// `Path` the key for every cache and path lock in the engine.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    elements: Vec<String>,
}

impl Path {
    /// The mount root
    #[inline]
    pub const fn root() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Build from elements that are already known to be valid names
    pub(crate) fn from_trusted(elements: Vec<String>) -> Self {
        debug_assert!(elements.iter().all(|e| validate_name(e).is_ok()));
        Self { elements }
    }

    /// Parse and normalize a path string
    ///
    /// The leading separator is optional and one trailing separator is
    /// tolerated. `.` elements are dropped and `..` removes the preceding
    /// element. Empty elements (`a//b`) and escapes above the root are rejected.
    pub fn parse(raw: &str) -> VfsResult<Self> {
        Self::root().join(raw)
    }

    /// Resolve a relative path string against this path
    pub fn join(&self, relative: &str) -> VfsResult<Self> {
        let trimmed = relative.strip_prefix(SEPARATOR).unwrap_or(relative);
        // A trailing separator only counts after a non-empty element
        let trimmed = match trimmed.strip_suffix(SEPARATOR) {
            Some(rest) if !rest.is_empty() => rest,
            _ => trimmed,
        };

        let mut elements = self.elements.clone();
        if trimmed.is_empty() {
            return Ok(Self { elements });
        }

        for element in trimmed.split(SEPARATOR) {
            match element {
                "" => {
                    return Err(VfsError::InvalidPath(format!(
                        "empty element in '{}'",
                        relative
                    )))
                }
                "." => {}
                ".." => {
                    if elements.pop().is_none() {
                        return Err(VfsError::InvalidPath(format!(
                            "'{}' escapes the mount root",
                            relative
                        )));
                    }
                }
                name => {
                    validate_name(name)?;
                    elements.push(name.to_string());
                }
            }
        }

        Ok(Self { elements })
    }

    /// Append a single element
    pub fn child(&self, name: &str) -> VfsResult<Self> {
        validate_name(name)?;
        if name == "." || name == ".." {
            return Err(VfsError::InvalidPath(format!("'{}' is not a valid name", name)));
        }
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend_from_slice(&self.elements);
        elements.push(name.to_string());
        Ok(Self { elements })
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.elements.split_last()?;
        Some(Self {
            elements: init.to_vec(),
        })
    }

    /// Elements `from..` as a relative path
    pub fn sub_path(&self, from: usize) -> VfsResult<Self> {
        self.sub_path_to(from, self.elements.len())
    }

    /// Elements `from..to` as a relative path
    pub fn sub_path_to(&self, from: usize, to: usize) -> VfsResult<Self> {
        if from > to || to > self.elements.len() {
            return Err(VfsError::InvalidPath(format!(
                "sub path {}..{} out of range for '{}'",
                from, to, self
            )));
        }
        Ok(Self {
            elements: self.elements[from..to].to_vec(),
        })
    }

    /// True when `self` is a strict descendant of `ancestor`
    pub fn is_child(&self, ancestor: &Path) -> bool {
        self.elements.len() > ancestor.elements.len()
            && self.elements.starts_with(&ancestor.elements)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Last element, empty string for the root
    pub fn name(&self) -> &str {
        self.elements.last().map(String::as_str).unwrap_or("")
    }

    /// Rendering without the leading separator, used for archive entry names
    pub fn to_relative_string(&self) -> String {
        self.elements.join("/")
    }
}

/// Check a single element
fn validate_name(name: &str) -> VfsResult<()> {
    if name.is_empty() {
        return Err(VfsError::InvalidPath("name cannot be empty".into()));
    }
    if name.contains(SEPARATOR) {
        return Err(VfsError::InvalidPath(format!(
            "name '{}' cannot contain a separator",
            name
        )));
    }
    if name.contains('\0') {
        return Err(VfsError::InvalidPath(
            "name cannot contain null bytes".into(),
        ));
    }
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "{}", SEPARATOR);
        }
        for element in &self.elements {
            write!(f, "{}{}", SEPARATOR, element)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Path({})", self)
    }
}

impl FromStr for Path {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = VfsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}
