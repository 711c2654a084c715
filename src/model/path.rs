//! Path comparison helpers shared by positions and operations.

/// Relation between two paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRelation {
    /// Both paths are identical.
    Same,
    /// The first path is a proper prefix of the second.
    Prefix,
    /// The first path extends the second.
    Extension,
    /// The paths first differ at the given index.
    DiffersAt(usize),
}

/// Compare two offset paths.
///
/// ```rust
/// use docmodel_core::model::{compare_paths, PathRelation};
///
/// assert_eq!(compare_paths(&[1, 2], &[1, 2]), PathRelation::Same);
/// assert_eq!(compare_paths(&[1], &[1, 2]), PathRelation::Prefix);
/// assert_eq!(compare_paths(&[1, 2, 0], &[1, 2]), PathRelation::Extension);
/// assert_eq!(compare_paths(&[1, 3], &[1, 2]), PathRelation::DiffersAt(1));
/// ```
pub fn compare_paths(a: &[usize], b: &[usize]) -> PathRelation {
    let shared = a.len().min(b.len());

    for i in 0..shared {
        if a[i] != b[i] {
            return PathRelation::DiffersAt(i);
        }
    }

    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Equal => PathRelation::Same,
        std::cmp::Ordering::Less => PathRelation::Prefix,
        std::cmp::Ordering::Greater => PathRelation::Extension,
    }
}
