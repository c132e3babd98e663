//! `Cuisine,Dish` menu files.

use crate::error::{Result, StoreError};
use crate::write_atomic;
use mealrec_core::{Dish, Menu};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOrigin {
    File,
    BuiltinDefault,
}

#[derive(Debug)]
pub struct MenuLoad {
    pub menu: Menu,
    pub origin: MenuOrigin,
    /// Lines that were ignored, and the read error if the file was unusable.
    pub skipped: Vec<StoreError>,
}

/// Parses one `Cuisine,Dish` pair per line. Blank lines are ignored; the
/// first comma separates cuisine from dish. A leading byte order mark is
/// dropped.
#[must_use]
pub fn parse_menu(text: &str) -> (Menu, Vec<StoreError>) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut menu = Menu::new();
    let mut skipped = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let location = format!("line {}", idx + 1);
        let Some((cuisine, name)) = line.split_once(',') else {
            skipped.push(StoreError::malformed(location, "expected `Cuisine,Dish`"));
            continue;
        };
        let (cuisine, name) = (cuisine.trim(), name.trim());
        if cuisine.is_empty() || name.is_empty() {
            skipped.push(StoreError::malformed(location, "blank cuisine or dish"));
        } else if !menu.insert(Dish::new(cuisine, name)) {
            skipped.push(StoreError::malformed(
                location,
                format!("duplicate dish {name} in {cuisine}"),
            ));
        }
    }

    (menu, skipped)
}

#[must_use]
pub fn render_menu(menu: &Menu) -> String {
    menu.iter()
        .map(|d| format!("{},{}\n", d.cuisine, d.name))
        .collect()
}

/// Reads the menu at `path`, falling back to [`Menu::builtin`] when the file
/// is missing, unreadable or has no usable line.
#[must_use]
pub fn load_menu(path: &Path) -> MenuLoad {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) => {
            if source.kind() == io::ErrorKind::NotFound {
                debug_event!("no menu at {}, using built-in menu", path.display());
                return builtin(Vec::new());
            }
            let err = StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            };
            warn_event!("{err}; using built-in menu");
            return builtin(vec![err]);
        }
    };

    let (menu, skipped) = parse_menu(&text);
    for err in &skipped {
        warn_event!("{}: {err}", path.display());
    }
    if menu.is_empty() {
        warn_event!("menu {} has no dishes; using built-in menu", path.display());
        return builtin(skipped);
    }
    MenuLoad {
        menu,
        origin: MenuOrigin::File,
        skipped,
    }
}

fn builtin(skipped: Vec<StoreError>) -> MenuLoad {
    MenuLoad {
        menu: Menu::builtin(),
        origin: MenuOrigin::BuiltinDefault,
        skipped,
    }
}

/// Writes the built-in menu so later runs can edit it.
pub fn write_default_menu(path: &Path) -> Result<()> {
    write_atomic(path, render_menu(&Menu::builtin()).as_bytes())
}

/// Replaces the file with the whole of `menu`.
pub fn save_menu(path: &Path, menu: &Menu) -> Result<()> {
    write_atomic(path, render_menu(menu).as_bytes())
}

/// Appends one dish, creating the file if needed.
pub fn append_menu_dish(path: &Path, dish: &Dish) -> Result<()> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let needs_newline = match fs::read(path) {
        Ok(bytes) => bytes.last().is_some_and(|b| *b != b'\n'),
        Err(_) => false,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    let prefix = if needs_newline { "\n" } else { "" };
    writeln!(file, "{prefix}{},{}", dish.cuisine, dish.name).map_err(write_err)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::scratch_dir;

    #[test]
    fn parse_skips_bad_lines_and_keeps_the_rest() {
        let text = "True\nChinese,Dumplings\n\n  Chinese , Noodles \n,Steak\nChinese,Dumplings\nWestern,Fish, chips\n";
        let (menu, skipped) = parse_menu(text);
        assert_eq!(menu.len(), 3);
        assert!(menu.contains(&Dish::new("Chinese", "Noodles")));
        assert!(menu.contains(&Dish::new("Western", "Fish, chips")));
        let locations: Vec<String> = skipped
            .iter()
            .map(|e| match e {
                StoreError::Malformed { location, .. } => location.clone(),
                other => panic!("unexpected {other}"),
            })
            .collect();
        assert_eq!(locations, ["line 1", "line 5", "line 6"]);
    }

    #[test]
    fn byte_order_mark_is_not_part_of_the_first_cuisine() {
        let (menu, skipped) = parse_menu("\u{feff}Chinese,Dumplings\r\nJapanese,Sushi\r\n");
        assert!(skipped.is_empty());
        assert_eq!(menu.find_cuisine("chinese"), Some("Chinese"));
        assert!(menu.contains(&Dish::new("Chinese", "Dumplings")));
    }

    #[test]
    fn missing_file_uses_builtin_menu() {
        let dir = scratch_dir("menu_missing");
        let load = load_menu(&dir.join("menu.txt"));
        assert_eq!(load.origin, MenuOrigin::BuiltinDefault);
        assert_eq!(load.menu, Menu::builtin());
        assert!(load.skipped.is_empty());
    }

    #[test]
    fn empty_file_uses_builtin_menu() {
        let dir = scratch_dir("menu_empty");
        let path = dir.join("menu.txt");
        fs::write(&path, "\n\n").unwrap();
        let load = load_menu(&path);
        assert_eq!(load.origin, MenuOrigin::BuiltinDefault);
        assert!(!load.menu.is_empty());
    }

    #[test]
    fn default_menu_roundtrips_through_file() {
        let dir = scratch_dir("menu_default");
        let path = dir.join("data").join("menu.txt");
        write_default_menu(&path).unwrap();
        let load = load_menu(&path);
        assert_eq!(load.origin, MenuOrigin::File);
        assert_eq!(load.menu, Menu::builtin());
    }

    #[test]
    fn saved_menu_replaces_unusable_file() {
        let dir = scratch_dir("menu_save");
        let path = dir.join("menu.txt");
        fs::write(&path, "not a menu\n").unwrap();
        let mut menu = load_menu(&path).menu;
        menu.insert(Dish::new("Chinese Cuisine", "Peking Duck"));
        save_menu(&path, &menu).unwrap();

        let load = load_menu(&path);
        assert_eq!(load.origin, MenuOrigin::File);
        assert_eq!(load.menu.len(), Menu::builtin().len() + 1);
        assert!(load.menu.contains(&Dish::new("Chinese Cuisine", "Peking Duck")));
        assert!(load.menu.contains(&Dish::new("Western Cuisine", "Steak")));
    }

    #[test]
    fn appended_dish_is_loaded_next_time() {
        let dir = scratch_dir("menu_append");
        let path = dir.join("menu.txt");
        fs::write(&path, "Chinese,Dumplings").unwrap();
        append_menu_dish(&path, &Dish::new("Chinese", "Peking Duck")).unwrap();
        let load = load_menu(&path);
        assert!(load.skipped.is_empty());
        assert_eq!(
            load.menu.dishes_in("Chinese").unwrap(),
            ["Dumplings", "Peking Duck"]
        );
    }
}
