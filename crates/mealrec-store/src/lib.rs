#![warn(clippy::unwrap_used, clippy::expect_used)]

//! File persistence for mealrec.
//!
//! Loading never fails: a missing or unreadable menu falls back to the
//! built-in menu, a missing or corrupt preference file yields an empty store,
//! and single bad lines or entries are skipped and reported. Saving goes
//! through [`write_atomic`], so a failed write leaves the previous file as it
//! was.

macro_rules! warn_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::warn!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        eprintln!("Warning: {}", format_args!($($arg)*));
    }};
}

macro_rules! debug_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::debug!($($arg)*);
    }};
}

pub mod error;
pub mod menu_file;
pub mod preference_file;

pub use error::{Result, StoreError};
pub use menu_file::{
    append_menu_dish, load_menu, parse_menu, render_menu, save_menu, write_default_menu, MenuLoad,
    MenuOrigin,
};
pub use preference_file::{
    flush_preferences, load_preferences, save_preferences, PreferenceLoad, PreferenceOrigin,
};

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Writes `contents` to a sibling temp file and renames it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp = temp_path(path);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(source) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    debug_event!("wrote {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mealrec".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}


#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::scratch_dir;

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = scratch_dir("atomic");
        let path = dir.join("nested").join("file.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = scratch_dir("atomic_fail");
        let path = dir.join("file.txt");
        write_atomic(&path, b"good").unwrap();
        // A directory where the temp file should go makes the write fail.
        fs::create_dir_all(temp_path(&path)).unwrap();

        let err = write_atomic(&path, b"bad").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "good");
    }

    #[test]
    fn timestamp_is_utc_rfc3339() {
        let ts = iso8601_now();
        assert!(ts.contains('T'));
        assert!(ts.ends_with('Z'));
    }
}
