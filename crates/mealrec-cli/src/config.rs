use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Where the menu and the preferences live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub menu_file: PathBuf,
    pub preference_file: PathBuf,
}

impl DataPaths {
    pub fn new(menu_file: impl Into<PathBuf>, preference_file: impl Into<PathBuf>) -> Result<Self> {
        let paths = Self {
            menu_file: menu_file.into(),
            preference_file: preference_file.into(),
        };
        if same_file(&paths.menu_file, &paths.preference_file) {
            bail!(
                "Menu and preference file must differ (both are {})",
                paths.menu_file.display()
            );
        }
        Ok(paths)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
