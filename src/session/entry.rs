use std::cmp::Ordering;

pub const PARENT_DIR: &str = "..";
pub const REFRESH_LABEL: &str = "[ Refresh ]";

/// One row of a local or device listing. The name is unique within a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_folder: bool,
    /// Only the synthetic refresh row sets this.
    pub is_special_action: bool,
    pub is_selected: bool,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, is_folder: bool) -> Self {
        let name = name.into();
        let is_folder = is_folder || name == PARENT_DIR;
        Self {
            name,
            is_folder,
            is_special_action: false,
            is_selected: false,
        }
    }

    pub fn parent() -> Self {
        Self::new(PARENT_DIR, true)
    }

    pub fn refresh() -> Self {
        Self {
            name: REFRESH_LABEL.to_string(),
            is_folder: false,
            is_special_action: true,
            is_selected: false,
        }
    }

    pub fn is_parent(&self) -> bool {
        !self.is_special_action && self.name == PARENT_DIR
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.') && !self.is_parent()
    }

    /// Real files and folders only; never `..` or the refresh row.
    pub fn is_selectable(&self) -> bool {
        !self.is_special_action && !self.is_parent()
    }
}

/// Case-insensitive first, case as tie-breaker, so `a.txt` sits next to `A.txt`.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// `..` first, then folders, then files, each bucket ascending by name.
/// Hidden entries are dropped unless `show_hidden` is set.
pub fn sort_entries(entries: Vec<DirEntry>, show_hidden: bool) -> Vec<DirEntry> {
    let mut parent: Option<DirEntry> = None;
    let mut folders = Vec::new();
    let mut files = Vec::new();

    for entry in entries {
        if entry.is_special_action {
            continue;
        }
        if entry.is_parent() {
            parent.get_or_insert(entry);
        } else if entry.is_hidden() && !show_hidden {
            continue;
        } else if entry.is_folder {
            folders.push(entry);
        } else {
            files.push(entry);
        }
    }

    folders.sort_by(|a, b| compare_names(&a.name, &b.name));
    files.sort_by(|a, b| compare_names(&a.name, &b.name));

    parent.into_iter().chain(folders).chain(files).collect()
}

/// Sorted listing with the refresh row on top, ready for display.
pub fn finish_listing(entries: Vec<DirEntry>, show_hidden: bool) -> Vec<DirEntry> {
    let mut sorted = sort_entries(entries, show_hidden);
    sorted.insert(0, DirEntry::refresh());
    sorted
}
