use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use nutrijoy_core::metabolic::{display_bmi, Selection, SelectionSource, BMI_TICKS};
use nutrijoy_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "nutrijoy")]
#[command(about = "NutriJoy daily calorie tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or edit the physiological profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// List catalog meals
    Catalog {
        /// Only show one category (fried, baked, soups, ...)
        #[arg(long)]
        category: Option<String>,
    },

    /// Log a meal into today's bucket
    Log {
        /// Catalog meal id
        #[arg(long)]
        meal: Option<String>,

        /// Name of a meal not in the catalog
        #[arg(long)]
        custom: Option<String>,

        /// Amount eaten, in the meal's base unit
        #[arg(long)]
        quantity: f64,

        /// Calories of a custom meal
        #[arg(long, allow_negative_numbers = true)]
        calories: Option<f64>,
    },

    /// Remove an entry from today's bucket
    Remove {
        /// Entry id as printed by `log` or `today`
        id: Uuid,
    },

    /// Show today's entries with consumed and remaining calories
    Today,

    /// Move today's entries into history
    Finalize {
        /// Date to record (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show finalized days against the current calorie target
    History {
        /// Number of days to look back
        #[arg(long)]
        days: Option<i64>,
    },

    /// Append history summaries to a CSV file
    Export {
        /// Output path (defaults to <data-dir>/history.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create or update the profile
    Set {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        age: u32,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Weight in kg
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        gender: Option<String>,
        /// sedentary, light, moderate, active, very_active
        #[arg(long)]
        activity: Option<String>,
        /// lose_weight, gain_weight, maintain_weight
        #[arg(long)]
        goal: Option<String>,
    },

    /// Show profile with BMR, TDEE and BMI
    Show,
}

/// Files under the data directory
struct Paths {
    data_dir: PathBuf,
}

impl Paths {
    fn profile(&self) -> PathBuf {
        self.data_dir.join("profile.json")
    }

    fn catalog(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }

    fn journal(&self) -> PathBuf {
        self.data_dir.join("journal")
    }

    fn export(&self) -> PathBuf {
        self.data_dir.join("history.csv")
    }
}

fn main() -> Result<()> {
    nutrijoy_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let paths = Paths {
        data_dir: cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone()),
    };
    tracing::debug!("Using data directory {:?}", paths.data_dir);

    match cli.command {
        Commands::Profile { action } => match action {
            ProfileAction::Set {
                username,
                email,
                age,
                height,
                weight,
                gender,
                activity,
                goal,
            } => {
                let update = ProfileUpdate {
                    username,
                    email,
                    age,
                    height_cm: height,
                    weight_kg: weight,
                };
                cmd_profile_set(&paths, update, gender, activity, goal)
            }
            ProfileAction::Show => cmd_profile_show(&paths, &config),
        },
        Commands::Catalog { category } => cmd_catalog(&paths, &config, category),
        Commands::Log {
            meal,
            custom,
            quantity,
            calories,
        } => cmd_log(&paths, meal, custom, quantity, calories),
        Commands::Remove { id } => cmd_remove(&paths, id),
        Commands::Today => cmd_today(&paths),
        Commands::Finalize { date } => cmd_finalize(&paths, date),
        Commands::History { days } => {
            cmd_history(&paths, days.unwrap_or(config.display.history_days))
        }
        Commands::Export { output } => cmd_export(&paths, output),
    }
}

fn load_catalog(paths: &Paths) -> Result<MealCatalog> {
    let catalog = MealCatalog::load_from(&paths.catalog())?;
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

/// Profile if one has been saved
fn load_profile(paths: &Paths) -> Result<Option<Profile>> {
    match Profile::load(&paths.profile()) {
        Ok(profile) => Ok(Some(profile)),
        Err(Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Calorie target, or None when no profile or no usable gender
fn current_tdee(paths: &Paths) -> Result<Option<i64>> {
    Ok(load_profile(paths)?
        .map(|p| estimate(&p))
        .filter(|est| !est.is_unknown())
        .map(|est| est.tdee))
}

fn cmd_profile_set(
    paths: &Paths,
    update: ProfileUpdate,
    gender: Option<String>,
    activity: Option<String>,
    goal: Option<String>,
) -> Result<()> {
    update.validate()?;

    let base = load_profile(paths)?.unwrap_or_else(|| Profile {
        username: String::new(),
        email: String::new(),
        weight_kg: update.weight_kg,
        height_cm: update.height_cm,
        age: update.age,
        gender: None,
        activity_level: None,
        goal: None,
        bmi: None,
        bmi_category: None,
        ideal_weight: None,
    });

    let mut profile = update.apply(&base);
    if gender.is_some() {
        profile.gender = gender;
    }
    if activity.is_some() {
        profile.activity_level = activity;
    }
    if goal.is_some() {
        profile.goal = goal;
    }
    // Locally edited body measurements invalidate the service's BMI
    profile.bmi = None;
    profile.bmi_category = None;

    profile.save(&paths.profile())?;
    println!("✓ Profile saved for {}", profile.username);
    Ok(())
}

fn describe_selection<T>(field: &str, sel: &Selection<T>, fallback: &str) -> Option<String> {
    match &sel.source {
        SelectionSource::Explicit => None,
        SelectionSource::DefaultUnset => Some(format!("{} not set, using {}", field, fallback)),
        SelectionSource::DefaultUnrecognized(raw) => Some(format!(
            "{} '{}' not recognized, using {}",
            field, raw, fallback
        )),
    }
}

fn cmd_profile_show(paths: &Paths, config: &Config) -> Result<()> {
    let profile = load_profile(paths)?.ok_or_else(|| {
        Error::NotFound("no profile saved yet; run `nutrijoy profile set`".into())
    })?;
    let est = estimate(&profile);

    println!("\n  Username:  {}", profile.username);
    println!("  Email:     {}", profile.email);
    println!("  Age:       {}", profile.age);
    println!("  Gender:    {}", profile.gender.as_deref().unwrap_or("-"));
    println!("  Height:    {} cm", profile.height_cm);
    println!("  Weight:    {} kg", profile.weight_kg);
    if let Some(ideal) = profile.ideal_weight {
        println!("  Ideal:     {} kg", ideal);
    }
    println!("  Activity:  {}", est.activity.value.as_str());
    println!("  Goal:      {}", est.goal.value.as_str());
    println!();

    if est.is_unknown() {
        println!("  Daily Calories: unknown (gender not set)");
    } else {
        println!("  BMR:            {:.2} kcal", est.bmr);
        println!("  Daily Calories: {} kcal", est.tdee);
    }

    let notes = [
        describe_selection("gender", &est.gender, "no estimate"),
        describe_selection("activity level", &est.activity, est.activity.value.as_str()),
        describe_selection("goal", &est.goal, est.goal.value.as_str()),
    ];
    for note in notes.iter().flatten() {
        println!("  ! {}", note);
    }

    if let Some(bmi) = display_bmi(&profile) {
        let band = BmiBand::classify(bmi);
        let category = profile.bmi_category.as_deref().unwrap_or(band.label());
        let position = bmi_meter_position(bmi, config.display.bmi_scale);
        println!();
        println!("  BMI:   {:.2} ({})", bmi, category);
        println!("  {}", render_gauge(position));
        println!(
            "  Ticks: {}",
            BMI_TICKS
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        );
    }

    println!();
    Ok(())
}

/// Text gauge with a marker at `position` percent
fn render_gauge(position: f64) -> String {
    const WIDTH: usize = 40;
    let marker = ((position / 100.0) * (WIDTH - 1) as f64).round() as usize;
    let bar: String = (0..WIDTH)
        .map(|i| if i == marker.min(WIDTH - 1) { '▲' } else { '─' })
        .collect();
    format!("[{}] {:.1}%", bar, position)
}

fn cmd_catalog(paths: &Paths, config: &Config, category: Option<String>) -> Result<()> {
    let catalog = load_catalog(paths)?;

    let meals: Vec<&MealCatalogEntry> = match category {
        Some(c) => {
            let cat = MealCategory::parse(&c)
                .ok_or_else(|| Error::Validation(format!("unknown category '{}'", c)))?;
            catalog.by_category(cat)
        }
        None => catalog.meals.values().collect(),
    };

    if meals.is_empty() {
        println!("No meals found.");
        return Ok(());
    }

    for meal in meals {
        println!(
            "{:<18} {:<26} {:>6} {:<5} = {} Cal",
            meal.id, meal.name, meal.base_quantity_value, meal.base_quantity_unit, meal.calories_per_base
        );
        println!(
            "{:<18} image: {}",
            "",
            resolve_image_url(
                meal.image_url.as_deref(),
                &config.api.base_url,
                &config.api.placeholder_image
            )
        );
    }
    Ok(())
}

fn cmd_log(
    paths: &Paths,
    meal: Option<String>,
    custom: Option<String>,
    quantity: f64,
    calories: Option<f64>,
) -> Result<()> {
    let new = match (meal, custom) {
        (Some(id), None) => {
            if calories.is_some() {
                return Err(Error::Validation(
                    "--calories only applies to custom meals; catalog calories are derived from the quantity".into(),
                ));
            }
            let catalog = load_catalog(paths)?;
            let entry = catalog
                .get(&id)
                .ok_or_else(|| Error::NotFound(format!("no meal '{}' in catalog", id)))?;
            NewEntry::catalog(entry, quantity)?
        }
        (None, Some(name)) => {
            let calories = calories.ok_or_else(|| {
                Error::Validation("--calories is required for a custom meal".into())
            })?;
            NewEntry::custom(name, quantity, calories)
        }
        (meal_id, custom_name) => NewEntry {
            meal_id,
            custom_name,
            quantity,
            calories: calories.unwrap_or(0.0),
        },
    };

    let mut store = JournalDayStore::new(paths.journal());
    let entry = store.add_entry(new)?;

    println!("✓ Meal added: {} kcal", entry.calories);
    println!("  id: {}", entry.id);
    Ok(())
}

fn cmd_remove(paths: &Paths, id: Uuid) -> Result<()> {
    let mut store = JournalDayStore::new(paths.journal());
    let removed = store.remove_entry(id)?;
    println!("✓ Removed entry ({} kcal)", removed.calories);
    Ok(())
}

fn print_entries(entries: &[DailyEntry], catalog: Option<&MealCatalog>) {
    for entry in entries {
        println!(
            "  {}  {} - {} kcal",
            entry.id,
            entry.source.label(catalog),
            entry.calories
        );
    }
}

fn format_remaining(remaining: f64) -> String {
    match BudgetStatus::of(remaining) {
        BudgetStatus::WithinBudget => format!("{} kcal", remaining),
        BudgetStatus::OverBudget => format!("{} kcal (over budget)", remaining),
    }
}

fn cmd_today(paths: &Paths) -> Result<()> {
    let store = JournalDayStore::new(paths.journal());
    let entries = store.today()?;
    let catalog = load_catalog(paths)?;

    if entries.is_empty() {
        println!("No meals logged today.");
    } else {
        println!("Today's Meals");
        print_entries(&entries, Some(&catalog));
    }

    match current_tdee(paths)? {
        Some(tdee) => {
            let summary = DailySummary::new(tdee, &entries);
            println!(
                "Consumed today: {} kcal | Remaining: {}",
                summary.consumed,
                format_remaining(summary.remaining)
            );
        }
        None => {
            println!(
                "Consumed today: {} kcal | Remaining: unknown (set a profile with gender)",
                total_consumed(&entries)
            );
        }
    }
    Ok(())
}

fn cmd_finalize(paths: &Paths, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let mut store = JournalDayStore::new(paths.journal());
    let record = store.finalize_day(date)?;

    println!(
        "✓ Today's meals added to history ({} meals, {} kcal)",
        record.meals.len(),
        record.total_calories
    );
    Ok(())
}

fn cmd_history(paths: &Paths, days: i64) -> Result<()> {
    let store = JournalDayStore::new(paths.journal());
    let today = Local::now().date_naive();
    let records = load_recent_history(&store.history_path(), today, days)?;

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    let catalog = load_catalog(paths)?;
    let tdee = current_tdee(paths)?;

    for record in &records {
        println!("\n{}", record.date.format("%d/%m/%Y"));
        print_entries(&record.meals, Some(&catalog));
        match tdee {
            Some(tdee) => {
                let report = DayReport::new(record, tdee);
                println!(
                    "  Total: {} kcal | Remaining: {}",
                    report.total_calories,
                    format_remaining(report.remaining)
                );
            }
            None => println!("  Total: {} kcal", record.total_calories),
        }
    }
    Ok(())
}

fn cmd_export(paths: &Paths, output: Option<PathBuf>) -> Result<()> {
    let store = JournalDayStore::new(paths.journal());
    let records = store.history()?;
    let csv_path = output.unwrap_or_else(|| paths.export());

    let count = export_history_csv(&records, &csv_path)?;
    println!("✓ Exported {} days to CSV", count);
    println!("  CSV: {}", display_path(&csv_path));
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
