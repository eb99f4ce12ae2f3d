//! Archive unit resolution
//!
//! Maps an edited source file to the archive unit it belongs to, using
//! the directory conventions of the extracted game tree.

use std::path::Path;

/// Directory markers that identify sources belonging to an archive unit.
///
/// A source produces a unit only when its parent directory name contains
/// one of these markers (case-sensitive). The same names are the
/// subdirectories of the patched output tree searched for rebuilt files.
pub const CATEGORY_MARKERS: [&str; 2] = ["facechat", "npc"];

/// Extension appended to a source's stem to form its unit name.
pub const ARCHIVE_EXTENSION: &str = "arc";

/// Resolves the archive unit a source file belongs to.
///
/// Returns `None` when the file is not under a recognized category
/// directory or the path cannot be inspected. `None` means "skip this
/// file", never "fail the batch".
pub fn archive_unit_for(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    let parent = source.parent()?.file_name()?.to_str()?;

    if CATEGORY_MARKERS
        .iter()
        .any(|marker| parent.contains(marker))
    {
        Some(format!("{}.{}", stem, ARCHIVE_EXTENSION))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_facechat_source_resolves() {
        let path = PathBuf::from("project/facechat/002.xml");
        assert_eq!(archive_unit_for(&path), Some("002.arc".to_string()));
    }

    #[test]
    fn test_npc_source_resolves() {
        let path = PathBuf::from("project/npc/001.xml");
        assert_eq!(archive_unit_for(&path), Some("001.arc".to_string()));
    }

    #[test]
    fn test_marker_matches_as_substring() {
        let path = PathBuf::from("project/npc_extra/007.xml");
        assert_eq!(archive_unit_for(&path), Some("007.arc".to_string()));
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let path = PathBuf::from("project/NPC/001.xml");
        assert_eq!(archive_unit_for(&path), None);
    }

    #[test]
    fn test_unrecognized_directory_yields_no_unit() {
        let path = PathBuf::from("project/menu/003.xml");
        assert_eq!(archive_unit_for(&path), None);
    }

    #[test]
    fn test_bare_file_yields_no_unit() {
        let path = PathBuf::from("003.xml");
        assert_eq!(archive_unit_for(&path), None);
    }
}
