//! User preferences for folder note placement and behavior.
//!
//! Serialized as camelCase JSON. Every field has a default, so a partially
//! written settings file is merged over [`Settings::default`] on load.

use serde::{Deserialize, Serialize};

/// Where a folder's note lives relative to the folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// `folder/<indexName>.md`
    #[serde(rename = "index")]
    IndexInside,
    /// `folder/<folderName>.md`
    #[serde(rename = "inside")]
    SameNameInside,
    /// `<parent>/<folderName>.md`
    #[serde(rename = "outside")]
    SameNameOutside,
}

impl PlacementPolicy {
    /// Policies whose note name follows the folder name. Only these take part
    /// in the auto-rename cascade.
    pub fn is_name_coupled(self) -> bool {
        !matches!(self, PlacementPolicy::IndexInside)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlacementPolicy::IndexInside => "index",
            PlacementPolicy::SameNameInside => "inside",
            PlacementPolicy::SameNameOutside => "outside",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PlacementPolicy::IndexInside => "Inside Folder, Index File",
            PlacementPolicy::SameNameInside => "Inside Folder, With Same Name",
            PlacementPolicy::SameNameOutside => "Outside Folder, With Same Name",
        }
    }
}

impl std::str::FromStr for PlacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(PlacementPolicy::IndexInside),
            "inside" => Ok(PlacementPolicy::SameNameInside),
            "outside" => Ok(PlacementPolicy::SameNameOutside),
            other => Err(format!(
                "unknown placement policy '{}' (expected index, inside or outside)",
                other
            )),
        }
    }
}

/// Modifier key that must be held while clicking a folder to create its note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Mod,
    Ctrl,
    Meta,
    Shift,
    Alt,
}

impl Modifier {
    /// Display label, which differs between macOS and other platforms.
    pub fn label(self, is_mac: bool) -> &'static str {
        match (self, is_mac) {
            (Modifier::Mod, false) => "Ctrl(Cmd in macOS)",
            (Modifier::Ctrl, false) => "Ctrl(Ctrl in macOS)",
            (Modifier::Meta, false) => "⊞ Win",
            (Modifier::Shift, false) => "Shift",
            (Modifier::Alt, false) => "Alt",
            (Modifier::Mod, true) | (Modifier::Meta, true) => "⌘ Cmd",
            (Modifier::Ctrl, true) => "⌃ Control",
            (Modifier::Shift, true) => "⇧ Shift",
            (Modifier::Alt, true) => "⌥ Option",
        }
    }
}

pub const FOLDER_NAME_PLACEHOLDER: &str = "{{FOLDER_NAME}}";
pub const FOLDER_PATH_PLACEHOLDER: &str = "{{FOLDER_PATH}}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub folder_note_pref: PlacementPolicy,
    /// Note base name used by [`PlacementPolicy::IndexInside`], without extension.
    pub index_name: String,
    pub modifier_for_new_note: Modifier,
    pub hide_note_in_explorer: bool,
    pub auto_rename: bool,
    /// Body of newly created folder notes. See [`Settings::render_template`].
    pub folder_note_template: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder_note_pref: PlacementPolicy::SameNameInside,
            index_name: "_about_".to_string(),
            modifier_for_new_note: Modifier::Meta,
            hide_note_in_explorer: true,
            auto_rename: true,
            folder_note_template: format!("# {}", FOLDER_NAME_PLACEHOLDER),
        }
    }
}

impl Settings {
    /// Parse settings JSON, filling in defaults for missing fields.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Substitute the folder placeholders. No escaping is applied.
    pub fn render_template(&self, folder_name: &str, folder_path: &str) -> String {
        self.folder_note_template
            .replace(FOLDER_NAME_PLACEHOLDER, folder_name)
            .replace(FOLDER_PATH_PLACEHOLDER, folder_path)
    }

    /// True if switching from `self` to `other` changes where notes resolve.
    pub fn resolution_differs(&self, other: &Settings) -> bool {
        self.folder_note_pref != other.folder_note_pref
            || (other.folder_note_pref == PlacementPolicy::IndexInside
                && self.index_name != other.index_name)
    }
}
