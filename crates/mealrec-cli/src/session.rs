//! The interactive loop.
//!
//! [`Session`] reads commands line by line and drives one recommendation
//! round per `yes`: offer cuisines, recommend dishes, record the final pick.
//! Preferences are flushed after every recommendation, selection and reset,
//! and once more before the loop ends. End of input behaves like `exit`.

use crate::config::DataPaths;
use anyhow::Result;
use mealrec_core::{
    Dish, Menu, PreferenceStore, Recommendation, RecommendationPolicy, ResetConfirmation, Slot,
};
use mealrec_recommender::{
    accept_selection, resolve_choice, DishResolution, RecommendError, Recommender, CUISINE_SAMPLE,
};
use mealrec_store::{
    append_menu_dish, flush_preferences, load_menu, load_preferences, save_menu,
    write_default_menu, MenuOrigin, PreferenceOrigin,
};
use std::fmt::Display;
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Awake,
    Asleep,
}

/// Everything a session works on. Nothing here is process-global.
#[derive(Debug)]
pub struct SessionContext {
    pub menu: Menu,
    /// `BuiltinDefault` until the menu file holds the whole menu.
    pub menu_origin: MenuOrigin,
    pub prefs: PreferenceStore,
    pub paths: DataPaths,
    pub recommender: Recommender,
    pub state: SessionState,
    /// Preferences were read from an existing file.
    pub prefs_loaded: bool,
}

impl SessionContext {
    /// Loads menu and preferences. Writes the built-in menu when no menu
    /// file exists yet. An existing but unusable file is left alone until a
    /// dish is added.
    pub fn load(paths: DataPaths, recommender: Recommender) -> Self {
        let menu_load = load_menu(&paths.menu_file);
        let mut menu_origin = menu_load.origin;
        if menu_origin == MenuOrigin::BuiltinDefault && !paths.menu_file.exists() {
            match write_default_menu(&paths.menu_file) {
                Ok(()) => {
                    info!(path = %paths.menu_file.display(), "wrote default menu");
                    menu_origin = MenuOrigin::File;
                }
                Err(err) => warn!("{err}"),
            }
        }
        let pref_load = load_preferences(&paths.preference_file);
        info!(
            cuisines = menu_load.menu.cuisine_count(),
            dishes = menu_load.menu.len(),
            total_selections = pref_load.store.total_selections(),
            "session loaded"
        );
        Self {
            menu: menu_load.menu,
            menu_origin,
            prefs: pref_load.store,
            paths,
            recommender,
            state: SessionState::Awake,
            prefs_loaded: pref_load.origin == PreferenceOrigin::File,
        }
    }

    pub fn flush(&mut self) -> mealrec_store::Result<bool> {
        flush_preferences(&self.paths.preference_file, &mut self.prefs)
    }

    /// Persists a dish the user just added. While the menu still comes from
    /// the built-in default, the whole menu is written instead of one line.
    fn store_added_dish(&mut self, dish: &Dish) -> mealrec_store::Result<()> {
        match self.menu_origin {
            MenuOrigin::File => append_menu_dish(&self.paths.menu_file, dish),
            MenuOrigin::BuiltinDefault => {
                save_menu(&self.paths.menu_file, &self.menu)?;
                self.menu_origin = MenuOrigin::File;
                Ok(())
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "session state");
            self.state = state;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Session<R, W> {
    ctx: SessionContext,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(ctx: SessionContext, input: R, output: W) -> Self {
        Self { ctx, input, output }
    }

    #[cfg(test)]
    pub fn into_context(self) -> SessionContext {
        self.ctx
    }

    pub fn run(&mut self) -> Result<()> {
        self.say("\n-----Welcome to the Meal Recommendation System!-----")?;
        self.say("-----Please enter 'exit' to quit the system at any time.-----")?;
        self.say("-----Enter 'reset' to reset your preferences.-----")?;

        let mut flow = self.offer_reset_on_start()?;
        while flow == Flow::Continue {
            let Some(command) = self.prompt("\nAny recommendation? (yes/no/exit/reset): ")? else {
                break;
            };
            flow = match command.to_lowercase().as_str() {
                "yes" => self.round()?,
                "no" => self.sleep()?,
                "reset" => self.reset()?,
                "exit" => Flow::Exit,
                _ => {
                    self.say("Invalid input, please enter 'yes', 'no', 'reset' or 'exit'.")?;
                    Flow::Continue
                }
            };
        }

        self.persist()?;
        self.say("Exiting the system...")
    }

    fn offer_reset_on_start(&mut self) -> Result<Flow> {
        if !self.ctx.prefs_loaded || self.ctx.prefs.total_selections() == 0 {
            return Ok(Flow::Continue);
        }
        match self.prompt("\nWould you like to reset your preferences? (yes/no): ")? {
            Some(answer) => {
                if is_word(&answer, "yes") {
                    self.apply_reset(ResetConfirmation::Confirmed)?;
                }
                Ok(Flow::Continue)
            }
            None => Ok(Flow::Exit),
        }
    }

    fn reset(&mut self) -> Result<Flow> {
        let Some(answer) =
            self.prompt("Are you sure you want to reset all your preferences? (yes/no): ")?
        else {
            return Ok(Flow::Exit);
        };
        let confirmation = if is_word(&answer, "yes") {
            ResetConfirmation::Confirmed
        } else {
            ResetConfirmation::Declined
        };
        self.apply_reset(confirmation)?;
        Ok(Flow::Continue)
    }

    fn apply_reset(&mut self, confirmation: ResetConfirmation) -> Result<()> {
        if !self.ctx.prefs.reset(confirmation) {
            return self.say("Reset cancelled.");
        }
        info!("preferences reset");
        self.persist()?;
        self.say("User preferences have been reset successfully!")
    }

    fn sleep(&mut self) -> Result<Flow> {
        self.ctx.set_state(SessionState::Asleep);
        let woken = self.prompt("zzzzz System is in sleep mode, enter anything to wake it up. zzzzz\n")?;
        if woken.is_none() {
            return Ok(Flow::Exit);
        }
        self.ctx.set_state(SessionState::Awake);
        Ok(Flow::Continue)
    }

    fn round(&mut self) -> Result<Flow> {
        let offered = self
            .ctx
            .recommender
            .sample_cuisines(&self.ctx.menu, CUISINE_SAMPLE);
        self.say("\nThere are some cuisines I have chosen to recommend to you:")?;
        for (i, cuisine) in offered.iter().enumerate() {
            self.say(format_args!("{}. {cuisine}", i + 1))?;
        }

        loop {
            let Some(cuisine) = self.choose_cuisine(&offered)? else {
                return Ok(Flow::Exit);
            };
            let recommendation = match self.ctx.recommender.recommend(
                &self.ctx.menu,
                &mut self.ctx.prefs,
                &cuisine,
            ) {
                Ok(recommendation) => recommendation,
                Err(err) => {
                    self.say(format_args!("{err}, please try another cuisine"))?;
                    continue;
                }
            };
            // Offering a list is itself recorded.
            self.persist()?;
            self.show(&recommendation)?;
            return self.choose_dish(&recommendation);
        }
    }

    fn choose_cuisine(&mut self, offered: &[String]) -> Result<Option<String>> {
        loop {
            let Some(input) = self.prompt(
                "\nPlease select a cuisine (index or name), or enter another cuisine you prefer: ",
            )?
            else {
                return Ok(None);
            };
            if is_word(&input, "exit") {
                return Ok(None);
            }
            if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
                let picked = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| offered.get(i));
                match picked {
                    Some(cuisine) => return Ok(Some(cuisine.clone())),
                    None => {
                        self.say("Invalid index, please try again")?;
                        continue;
                    }
                }
            }
            let found = self.ctx.menu.find_cuisine(&input).map(str::to_string);
            match found {
                Some(cuisine) => return Ok(Some(cuisine)),
                None => self.say(format_args!("'{input}' is not a valid cuisine, please try again"))?,
            }
        }
    }

    fn show(&mut self, recommendation: &Recommendation) -> Result<()> {
        self.say(format_args!(
            "\nRecommended dishes of {}:",
            recommendation.cuisine
        ))?;
        for (i, candidate) in recommendation.candidates.iter().enumerate() {
            let dish = &candidate.dish;
            let origin = if dish.cuisine == recommendation.cuisine {
                String::new()
            } else {
                format!(" ({})", dish.cuisine)
            };
            let tag = if candidate.slot == Slot::Favorite {
                " - one of your favorites"
            } else {
                ""
            };
            self.say(format_args!("{}. {}{origin}{tag}", i + 1, dish.name))?;
        }
        Ok(())
    }

    fn choose_dish(&mut self, recommendation: &Recommendation) -> Result<Flow> {
        let resolution = loop {
            let Some(input) = self.prompt(
                "\nPlease select a dish (index or name), or enter another dish you prefer: ",
            )?
            else {
                return Ok(Flow::Exit);
            };
            if is_word(&input, "exit") {
                return Ok(Flow::Exit);
            }
            match resolve_choice(&self.ctx.menu, recommendation, &input) {
                Ok(resolution) => break resolution,
                Err(RecommendError::AmbiguousSelection(_)) => {
                    self.say("Please enter the index of a listed dish or a dish name")?;
                }
                Err(err) => self.say(err)?,
            }
        };

        match &resolution {
            DishResolution::Found(dish) => self.say(format_args!(
                "You've selected '{}' from '{}'",
                dish.name, dish.cuisine
            ))?,
            DishResolution::CrossCuisineFound(dish) => {
                self.say(format_args!("'{}' is found in '{}'", dish.name, dish.cuisine))?;
            }
            DishResolution::NotFound { name } => self.say(format_args!(
                "'{name}' is not on the menu yet, adding it to '{}'",
                recommendation.cuisine
            ))?,
        }

        let accepted = accept_selection(
            &mut self.ctx.menu,
            &mut self.ctx.prefs,
            &recommendation.cuisine,
            resolution,
        );
        if accepted.added_to_menu {
            if let Err(err) = self.ctx.store_added_dish(&accepted.dish) {
                warn!("{err}");
                self.say(format_args!(
                    "Could not add '{}' to the menu file: {err}",
                    accepted.dish.name
                ))?;
            }
        }
        self.persist()?;
        self.say(format_args!(
            "\n-----You have chosen: {}, enjoy your meal!-----",
            accepted.dish.name
        ))?;
        Ok(Flow::Continue)
    }

    /// Reports a failed save to the user; the session goes on with the
    /// in-memory state.
    fn persist(&mut self) -> Result<()> {
        if let Err(err) = self.ctx.flush() {
            warn!("{err}");
            self.say(format_args!("Could not save your preferences: {err}"))?;
        }
        Ok(())
    }

    /// Writes `text` and reads one trimmed line; `None` at end of input.
    /// Bytes that are not UTF-8 are replaced, not rejected.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }

    fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }
}

fn is_word(input: &str, word: &str) -> bool {
    input.trim().eq_ignore_ascii_case(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealrec_core::PreferenceRecord;
    use std::fs;

    fn context(name: &str, menu: Menu, prefs: PreferenceStore) -> SessionContext {
        let dir = std::env::temp_dir().join(format!("mealrec_session_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let paths = DataPaths::new(dir.join("menu.txt"), dir.join("user_preference.json")).unwrap();
        SessionContext {
            menu,
            menu_origin: MenuOrigin::File,
            prefs,
            paths,
            recommender: Recommender::seeded(11),
            state: SessionState::Awake,
            prefs_loaded: false,
        }
    }

    fn small_menu() -> Menu {
        Menu::from_pairs([
            ("Chinese", "Dumplings"),
            ("Chinese", "Noodles"),
            ("Japanese", "Sushi"),
        ])
    }

    fn drive(ctx: SessionContext, script: &str) -> (SessionContext, String) {
        drive_bytes(ctx, script.as_bytes())
    }

    fn drive_bytes(ctx: SessionContext, script: &[u8]) -> (SessionContext, String) {
        let mut out = Vec::new();
        let mut session = Session::new(ctx, script, &mut out);
        session.run().unwrap();
        let ctx = session.into_context();
        (ctx, String::from_utf8(out).unwrap())
    }

    #[test]
    fn first_round_offers_unseen_dishes_and_records_choice() {
        let ctx = context("first_round", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive(ctx, "yes\nChinese\n1\nexit\n");

        assert!(out.contains("Recommended dishes of Chinese:"));
        assert!(out.contains("enjoy your meal!"));
        assert!(out.ends_with("Exiting the system...\n"));
        assert_eq!(ctx.prefs.total_selections(), 1);
        for name in ["Dumplings", "Noodles"] {
            let record = ctx.prefs.peek(&Dish::new("Chinese", name));
            assert_eq!(record.recommendation_count, 1);
        }
        assert!(!ctx.prefs.is_dirty());
        assert!(ctx.paths.preference_file.exists());
    }

    #[test]
    fn typed_dish_from_other_cuisine_is_recorded_there() {
        let ctx = context("cross", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive(ctx, "yes\n1\nsushi\nexit\n");

        assert!(out.contains("'Sushi' is found in 'Japanese'"));
        let sushi = ctx.prefs.peek(&Dish::new("Japanese", "Sushi"));
        assert_eq!(sushi.selection_count, 1);
        assert_eq!(sushi.recommendation_count, 0);
    }

    #[test]
    fn unknown_dish_is_added_to_active_cuisine() {
        let ctx = context("new_dish", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive(ctx, "yes\nChinese\nPeking Duck\nexit\n");

        let duck = Dish::new("Chinese", "Peking Duck");
        assert!(out.contains("'Peking Duck' is not on the menu yet"));
        assert!(ctx.menu.contains(&duck));
        assert_eq!(
            ctx.prefs.peek(&duck),
            PreferenceRecord {
                selection_count: 1,
                recommendation_count: 0
            }
        );
        let menu_file = fs::read_to_string(&ctx.paths.menu_file).unwrap();
        assert!(menu_file.contains("Chinese,Peking Duck"));
    }

    #[test]
    fn bad_input_is_reported_and_reprompted() {
        let ctx = context("bad_input", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive(ctx, "maybe\nyes\n9\nThai\n1\n5\n\n1\nexit\n");

        assert!(out.contains("Invalid input"));
        assert!(out.contains("Invalid index, please try again"));
        assert!(out.contains("'Thai' is not a valid cuisine"));
        assert!(out.contains("Please enter the index of a listed dish"));
        assert_eq!(ctx.prefs.total_selections(), 1);
    }

    #[test]
    fn sleep_wakes_on_any_input() {
        let ctx = context("sleep", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive(ctx, "no\nhello?\nexit\n");
        assert!(out.contains("sleep mode"));
        assert_eq!(ctx.state, SessionState::Awake);
        assert_eq!(out.matches("Any recommendation?").count(), 2);
    }

    #[test]
    fn reset_needs_confirmation() {
        let mut prefs = PreferenceStore::new();
        prefs.record_selection(&Dish::new("Chinese", "Dumplings"));
        let ctx = context("reset", small_menu(), prefs);

        let (ctx, out) = drive(ctx, "reset\nno\n");
        assert!(out.contains("Reset cancelled."));
        assert_eq!(ctx.prefs.total_selections(), 1);

        let (ctx, out) = drive(ctx, "reset\nyes\nexit\n");
        assert!(out.contains("reset successfully"));
        assert_eq!(ctx.prefs.total_selections(), 0);
        assert!(ctx.prefs.is_empty());
        let saved = load_preferences(&ctx.paths.preference_file);
        assert_eq!(saved.origin, PreferenceOrigin::File);
        assert!(saved.store.is_empty());
    }

    #[test]
    fn startup_offers_reset_for_existing_preferences() {
        let mut prefs = PreferenceStore::new();
        prefs.record_selection(&Dish::new("Chinese", "Dumplings"));
        let mut ctx = context("startup_reset", small_menu(), prefs);
        ctx.prefs_loaded = true;

        let (ctx, out) = drive(ctx, "yes\nexit\n");
        assert!(out.contains("Would you like to reset your preferences?"));
        assert_eq!(ctx.prefs.total_selections(), 0);
    }

    #[test]
    fn end_of_input_flushes_and_exits() {
        let ctx = context("eof", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive(ctx, "yes\n");
        assert!(out.ends_with("Exiting the system...\n"));
        assert!(!ctx.prefs.is_dirty());
    }

    #[test]
    fn favorites_are_marked_after_ten_selections() {
        let menu = Menu::from_pairs(
            ["Dumplings", "Noodles", "Buns", "Fried Rice", "Hot Pot", "Wontons", "Congee", "Char Siu"]
                .map(|name| ("Chinese", name)),
        );
        let mut prefs = PreferenceStore::new();
        let dumplings = Dish::new("Chinese", "Dumplings");
        for _ in 0..12 {
            prefs.record_selection(&dumplings);
        }
        let ctx = context("favorites", menu, prefs);

        let (ctx, out) = drive(ctx, "yes\nChinese\n1\nexit\n");
        assert!(out.contains("1. Dumplings - one of your favorites"));
        assert!(out.contains("7. "));
        assert!(!out.contains("8. "));
        assert_eq!(ctx.prefs.peek(&dumplings).selection_count, 13);
    }

    #[test]
    fn non_utf8_input_is_treated_as_invalid_text() {
        let ctx = context("non_utf8", small_menu(), PreferenceStore::new());
        let (ctx, out) = drive_bytes(ctx, b"caf\xe9\nyes\nChinese\nNood\xffles\n1\nexit\n");

        assert!(out.contains("Invalid input"));
        assert!(out.contains("is not on the menu yet"));
        assert!(out.ends_with("Exiting the system...\n"));
        assert_eq!(ctx.prefs.total_selections(), 1);
        assert!(!ctx.prefs.is_dirty());
    }

    #[test]
    fn dish_added_to_empty_menu_file_keeps_builtin_menu() {
        let dir = std::env::temp_dir().join(format!("mealrec_session_empty_menu_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("menu.txt"), "").unwrap();
        let paths = DataPaths::new(dir.join("menu.txt"), dir.join("user_preference.json")).unwrap();

        let ctx = SessionContext::load(paths, Recommender::seeded(11));
        assert_eq!(ctx.menu_origin, MenuOrigin::BuiltinDefault);
        // The unusable file is only replaced once there is something to add.
        assert_eq!(fs::read_to_string(&ctx.paths.menu_file).unwrap(), "");

        let (ctx, out) = drive(ctx, "yes\nChinese Cuisine\nPeking Duck\nexit\n");
        assert!(out.contains("'Peking Duck' is not on the menu yet"));
        assert_eq!(ctx.menu_origin, MenuOrigin::File);

        let reloaded = load_menu(&ctx.paths.menu_file);
        assert_eq!(reloaded.origin, MenuOrigin::File);
        assert_eq!(reloaded.menu.len(), Menu::builtin().len() + 1);
        assert!(reloaded.menu.contains(&Dish::new("Chinese Cuisine", "Peking Duck")));
        assert!(reloaded.menu.contains(&Dish::new("Japanese Cuisine", "Sushi")));
    }

    #[test]
    fn missing_menu_file_is_written_on_load() {
        let dir = std::env::temp_dir().join(format!("mealrec_session_missing_menu_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let paths = DataPaths::new(dir.join("menu.txt"), dir.join("user_preference.json")).unwrap();

        let ctx = SessionContext::load(paths, Recommender::seeded(11));
        assert_eq!(ctx.menu_origin, MenuOrigin::File);
        assert_eq!(load_menu(&ctx.paths.menu_file).menu, Menu::builtin());
    }
}
