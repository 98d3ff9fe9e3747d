//! Placement policy resolution: where a folder's note is expected to live.
//!
//! Everything here is pure. Existence checks against the vault happen in
//! [`crate::cache`].

use crate::path;
use crate::settings::{PlacementPolicy, Settings};

/// Outcome of resolving a folder under a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The folder's note is expected at this path.
    Eligible(String),
    /// The policy cannot place a note for this folder (e.g. the vault root
    /// under a same-name policy, which has no name to copy).
    Ineligible,
}

impl Resolution {
    pub fn into_path(self) -> Option<String> {
        match self {
            Resolution::Eligible(path) => Some(path),
            Resolution::Ineligible => None,
        }
    }
}

/// Expected note path for `folder`.
pub fn resolve(folder: &str, policy: PlacementPolicy, index_name: &str) -> Resolution {
    let resolved = match policy {
        PlacementPolicy::IndexInside => {
            if index_name.is_empty() || index_name.contains('/') {
                return Resolution::Ineligible;
            }
            path::note_in(folder, index_name)
        }
        PlacementPolicy::SameNameInside => {
            if folder.is_empty() {
                return Resolution::Ineligible;
            }
            path::note_in(folder, path::base_name(folder))
        }
        PlacementPolicy::SameNameOutside => match path::parent(folder) {
            Some(parent) => path::note_in(parent, path::base_name(folder)),
            None => return Resolution::Ineligible,
        },
    };
    Resolution::Eligible(resolved)
}

/// [`resolve`] with the policy and index name taken from `settings`.
pub fn resolve_with(folder: &str, settings: &Settings) -> Resolution {
    resolve(folder, settings.folder_note_pref, &settings.index_name)
}

/// True if `note` is exactly where `folder`'s note is expected.
pub fn is_note_for(note: &str, folder: &str, policy: PlacementPolicy, index_name: &str) -> bool {
    match resolve(folder, policy, index_name) {
        Resolution::Eligible(expected) => expected == note,
        Resolution::Ineligible => false,
    }
}

/// The only folder whose expected note could be `note`.
///
/// The returned folder is not checked for existence.
pub fn candidate_folder(note: &str, policy: PlacementPolicy, index_name: &str) -> Option<String> {
    let stem = path::note_stem(note)?;
    let parent = path::parent(note)?;
    let folder = match policy {
        PlacementPolicy::IndexInside => (stem == index_name).then(|| parent.to_string())?,
        PlacementPolicy::SameNameInside => {
            (!parent.is_empty() && path::base_name(parent) == stem).then(|| parent.to_string())?
        }
        PlacementPolicy::SameNameOutside => path::join(parent, stem),
    };
    is_note_for(note, &folder, policy, index_name).then_some(folder)
}

/// [`candidate_folder`] with the policy and index name taken from `settings`.
pub fn candidate_folder_with(note: &str, settings: &Settings) -> Option<String> {
    candidate_folder(note, settings.folder_note_pref, &settings.index_name)
}
