//! Vault-relative path helpers.
//!
//! Paths are `/`-separated, relative to the vault root, with no leading or
//! trailing slash. The vault root itself is the empty string.

/// Extension (without the dot) of files that can act as folder notes.
pub const NOTE_EXTENSION: &str = "md";

/// Strip leading and trailing slashes so `"/A/"` and `"A"` address the same folder.
pub fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Parent folder of `path`, or `None` for the vault root.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(pos) => Some(&path[..pos]),
        None => Some(""),
    }
}

/// Last path component. Empty for the vault root.
pub fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// File name without the note extension, or `None` if `path` is not a note file.
pub fn note_stem(path: &str) -> Option<&str> {
    let name = base_name(path);
    let stem = name.strip_suffix(NOTE_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() { None } else { Some(stem) }
}

/// Join a folder and a child name. Joining onto the root yields just the name.
pub fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Path of the note named `stem` inside `folder`.
pub fn note_in(folder: &str, stem: &str) -> String {
    join(folder, &format!("{}.{}", stem, NOTE_EXTENSION))
}

/// True if any component is dot-prefixed (`.obsidian`, `.git`, `.trash`, ...).
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|c| c.starts_with('.'))
}

/// True if `path` is `ancestor` or lies beneath it. Everything lies beneath the root.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Move `path` from under `from` to under `to`. `None` if `path` is not within `from`.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if !is_within(path, from) {
        return None;
    }
    let rest = path[from.len()..].trim_start_matches('/');
    if rest.is_empty() {
        Some(to.to_string())
    } else {
        Some(join(to, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_slashes() {
        assert_eq!(normalize("/A/B/"), "A/B");
        assert_eq!(normalize("/"), "");
    }

    #[test]
    fn test_parent_and_base_name() {
        assert_eq!(parent("A/B/c.md"), Some("A/B"));
        assert_eq!(parent("A"), Some(""));
        assert_eq!(parent(""), None);
        assert_eq!(base_name("A/B/c.md"), "c.md");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_note_stem_requires_md() {
        assert_eq!(note_stem("A/A.md"), Some("A"));
        assert_eq!(note_stem("A/archive.tar.md"), Some("archive.tar"));
        assert_eq!(note_stem("A/A.txt"), None);
        assert_eq!(note_stem("A/.md"), None);
        assert_eq!(note_stem("A"), None);
    }

    #[test]
    fn test_is_within_respects_component_boundaries() {
        assert!(is_within("A/B", "A"));
        assert!(is_within("A", "A"));
        assert!(!is_within("AB/c.md", "A"));
        assert!(is_within("anything", ""));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(rebase("A/x/y.md", "A", "B").as_deref(), Some("B/x/y.md"));
        assert_eq!(rebase("A", "A", "C/D").as_deref(), Some("C/D"));
        assert_eq!(rebase("AB/y.md", "A", "B"), None);
        assert_eq!(rebase("x.md", "", "B").as_deref(), Some("B/x.md"));
    }
}
