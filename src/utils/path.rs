//! Path relocation for project directories that moved on disk.

use std::path::{Path, PathBuf};

/// Rebase `path` from `original_base` onto `new_base`.
///
/// Returns `None` when `path` does not live under `original_base`, in which
/// case the caller leaves it alone. Matching is done component-wise, so
/// `/proj/ab` is not under `/proj/a`.
///
/// Applying a relocation twice is the same as applying it once. When the new
/// base itself lives under the original base, paths already under the new
/// base are left untouched.
pub fn relocate_path(path: &Path, original_base: &Path, new_base: &Path) -> Option<PathBuf> {
    if original_base == new_base {
        return None;
    }
    if new_base.starts_with(original_base) && path.starts_with(new_base) {
        return None;
    }
    let rest = path.strip_prefix(original_base).ok()?;
    if rest.as_os_str().is_empty() {
        Some(new_base.to_path_buf())
    } else {
        Some(new_base.join(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_relocates_nested_file() {
        let relocated = relocate_path(
            Path::new("/proj/a/run1/out.csv"),
            Path::new("/proj/a"),
            Path::new("/proj/b"),
        );
        assert_eq!(relocated, Some(PathBuf::from("/proj/b/run1/out.csv")));
    }

    #[test]
    fn test_relocates_base_itself() {
        let relocated = relocate_path(Path::new("/proj/a"), Path::new("/proj/a"), Path::new("/x"));
        assert_eq!(relocated, Some(PathBuf::from("/x")));
    }

    #[test]
    fn test_ignores_sibling_with_shared_prefix() {
        let relocated = relocate_path(
            Path::new("/proj/ab/out.csv"),
            Path::new("/proj/a"),
            Path::new("/proj/b"),
        );
        assert_eq!(relocated, None);
    }

    #[test]
    fn test_new_base_under_original_is_stable() {
        let original = Path::new("/proj");
        let new = Path::new("/proj/moved");
        let once = relocate_path(Path::new("/proj/run/out.csv"), original, new).unwrap();
        assert_eq!(once, PathBuf::from("/proj/moved/run/out.csv"));
        assert_eq!(relocate_path(&once, original, new), None);
    }

    proptest! {
        #[test]
        fn prop_relocation_is_idempotent(
            segments in proptest::collection::vec("[a-z]{1,6}", 1..5),
            original in "[a-z]{1,4}",
            new in "[A-Z]{1,4}",
        ) {
            let original_base = PathBuf::from("/").join(&original);
            let new_base = PathBuf::from("/").join(&new);
            let path = segments.iter().fold(original_base.clone(), |acc, s| acc.join(s));

            let once = relocate_path(&path, &original_base, &new_base).unwrap();
            prop_assert!(once.starts_with(&new_base));
            prop_assert_eq!(relocate_path(&once, &original_base, &new_base), None);
        }
    }
}
