use mealrec_core::{Menu, PreferenceStore, RecommendationPolicy};
use mealrec_recommender::{accept_selection, resolve_choice, Recommender};

/// Simulated user who always takes the first offered dish.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rounds: usize = std::env::args()
        .nth(1)
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(12);

    let mut menu = Menu::builtin();
    let mut prefs = PreferenceStore::new();
    let mut recommender = Recommender::seeded(7);

    for round in 1..=rounds {
        let cuisine = recommender
            .pick_cuisine(&menu)
            .ok_or("menu has no cuisines")?;
        let rec = recommender.recommend(&menu, &mut prefs, &cuisine)?;
        let resolution = resolve_choice(&menu, &rec, "1")?;
        let accepted = accept_selection(&mut menu, &mut prefs, &rec.cuisine, resolution);
        println!(
            "{round:>3} {:?}\t{}\t-> {}",
            rec.phase,
            rec.dishes()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            accepted.dish
        );
    }

    println!("{}", serde_json::to_string_pretty(&prefs.snapshot())?);
    Ok(())
}
