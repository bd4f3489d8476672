use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use setlog_core::*;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "setlog")]
#[command(about = "Set-by-set workout logger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available workout templates
    Templates,

    /// Start a workout from a template or an empty custom workout
    Start {
        /// Template id to start from
        #[arg(long, conflicts_with = "custom", required_unless_present = "custom")]
        template: Option<String>,

        /// Name of a custom workout built as you go
        #[arg(long)]
        custom: Option<String>,

        /// Rest between sets, in seconds
        #[arg(long)]
        recovery: Option<u32>,
    },

    /// Add an exercise to a custom workout
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        muscle: String,

        #[arg(long, default_value_t = 3)]
        sets: u32,

        #[arg(long, default_value_t = 10)]
        reps: u32,

        #[arg(long, default_value_t = 0.0)]
        weight: f64,

        /// Partner movement, making this a superset
        #[arg(long, requires = "partner_muscle")]
        partner_name: Option<String>,

        #[arg(long, requires = "partner_name")]
        partner_muscle: Option<String>,

        #[arg(long, default_value_t = 10)]
        partner_reps: u32,

        #[arg(long, default_value_t = 0.0)]
        partner_weight: f64,
    },

    /// Edit a set (exercise and set numbers start at 1)
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        exercise: u32,

        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        set: u32,

        #[arg(long)]
        reps: Option<u32>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        partner_reps: Option<u32>,

        #[arg(long)]
        partner_weight: Option<f64>,

        /// Mark the set completed
        #[arg(long, conflicts_with = "undo")]
        done: bool,

        /// Mark the set not completed
        #[arg(long)]
        undo: bool,
    },

    /// Replace the notes of an exercise
    Notes {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        exercise: u32,

        text: String,
    },

    /// Move to the next exercise
    Next,

    /// Move to the previous exercise
    Prev,

    /// Show the active workout (default)
    Status,

    /// Run or adjust the recovery timer
    Rest {
        /// Add 30 seconds
        #[arg(long, conflicts_with = "cancel")]
        extend: bool,

        /// Stop the timer
        #[arg(long)]
        cancel: bool,

        /// Advance this many seconds without waiting
        #[arg(long, conflicts_with_all = ["extend", "cancel"])]
        ticks: Option<u32>,
    },

    /// Finish the workout and record completed sets
    Finish,

    /// Discard the workout without recording anything
    Cancel {
        /// Cancel even when not on the first exercise
        #[arg(long)]
        force: bool,
    },

    /// Show recorded workouts for a month
    History {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Show how often each exercise was performed
    Summary {
        /// Show the day-by-day trend of one exercise instead
        #[arg(long)]
        exercise: Option<String>,
    },

    /// Export history to CSV
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    setlog_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    tracing::debug!("Using data directory {:?}", config.data.data_dir);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Templates => cmd_templates(&config),
        Commands::Start {
            template,
            custom,
            recovery,
        } => cmd_start(&config, template, custom, recovery),
        Commands::Add {
            name,
            muscle,
            sets,
            reps,
            weight,
            partner_name,
            partner_muscle,
            partner_reps,
            partner_weight,
        } => {
            let superset = match (partner_name, partner_muscle) {
                (Some(name), Some(muscle)) => Some(SupersetPartner {
                    name,
                    muscle,
                    target_reps: partner_reps,
                    target_weight: partner_weight,
                }),
                _ => None,
            };
            cmd_add(
                &config,
                NewExercise {
                    name,
                    muscle,
                    target_sets: sets,
                    target_reps: reps,
                    target_weight: weight,
                    superset,
                },
            )
        }
        Commands::Set {
            exercise,
            set,
            reps,
            weight,
            partner_reps,
            partner_weight,
            done,
            undo,
        } => {
            let mut fields = Vec::new();
            fields.extend(reps.map(SetField::Reps));
            fields.extend(weight.map(SetField::Weight));
            fields.extend(partner_reps.map(SetField::PartnerReps));
            fields.extend(partner_weight.map(SetField::PartnerWeight));
            // Completion last, so the values above are in place when the set is done
            if done {
                fields.push(SetField::Completed(true));
            } else if undo {
                fields.push(SetField::Completed(false));
            }
            cmd_set(&config, exercise as usize - 1, set as usize - 1, fields)
        }
        Commands::Notes { exercise, text } => cmd_notes(&config, exercise as usize - 1, text),
        Commands::Next => with_session(&config, |c| c.next()),
        Commands::Prev => with_session(&config, |c| c.previous()),
        Commands::Status => cmd_status(&config),
        Commands::Rest {
            extend,
            cancel,
            ticks,
        } => cmd_rest(&config, extend, cancel, ticks),
        Commands::Finish => cmd_finish(&config),
        Commands::Cancel { force } => cmd_cancel(&config, force),
        Commands::History { month } => cmd_history(&config, month),
        Commands::Summary { exercise } => match exercise {
            Some(name) => cmd_progression(&config, &name),
            None => cmd_summary(&config),
        },
        Commands::Export { out } => cmd_export(&config, out),
    }
}

fn slot(config: &Config) -> SessionSlot {
    SessionSlot::new(config.data.session_slot_path())
}

fn load_controller(config: &Config) -> Result<SessionController> {
    Ok(match slot(config).load()? {
        Some(snapshot) => SessionController::restore(snapshot),
        None => SessionController::new(),
    })
}

/// Write the controller back to the slot, or clear it once the session is over
fn persist(config: &Config, controller: &SessionController) -> Result<()> {
    match controller.snapshot() {
        Some(snapshot) => slot(config).save(&snapshot),
        None => slot(config).clear(),
    }
}

fn load_active(config: &Config) -> Result<SessionController> {
    let controller = load_controller(config)?;
    if controller.session().is_none() {
        return Err(Error::State(
            "No active workout. Start one with `setlog start`.".into(),
        ));
    }
    Ok(controller)
}

/// Apply a change to the active session, save it and show the result
fn with_session<F>(config: &Config, f: F) -> Result<()>
where
    F: FnOnce(&mut SessionController),
{
    let mut controller = load_active(config)?;
    f(&mut controller);
    persist(config, &controller)?;
    display_session(&controller);
    Ok(())
}

fn cmd_templates(config: &Config) -> Result<()> {
    let catalog = TemplateCatalog::load(&config.data.templates_path())?;

    for template in &catalog.templates {
        println!("{} ({})", template.name, template.id);
        for exercise in &template.exercises {
            let name = match &exercise.superset {
                Some(p) => superset::display_name(&exercise.name, &p.name),
                None => exercise.name.clone(),
            };
            print!(
                "  - {} [{}] {}x{} @ {}",
                name, exercise.muscle, exercise.target_sets, exercise.target_reps, exercise.target_weight
            );
            if let Some(rest) = exercise.rest_seconds {
                print!(", rest {}s", rest);
            }
            println!();
            if let Some(note) = &exercise.note {
                println!("      {}", note);
            }
        }
    }

    Ok(())
}

fn cmd_start(
    config: &Config,
    template: Option<String>,
    custom: Option<String>,
    recovery: Option<u32>,
) -> Result<()> {
    let mut controller = load_controller(config)?;
    let recovery = recovery.unwrap_or(config.session.recovery_seconds);
    let now = Utc::now();

    match (template, custom) {
        (Some(id), _) => {
            let catalog = TemplateCatalog::load(&config.data.templates_path())?;
            let template = catalog.get(&id)?;
            let history = JsonlHistoryStore::new(config.data.history_path()).load()?;
            controller.start_template(template, &history, recovery, now)?;
        }
        (None, Some(name)) => controller.start_custom(&name, recovery, now)?,
        (None, None) => {
            return Err(Error::Validation("pass --template or --custom".into()));
        }
    }

    persist(config, &controller)?;
    println!("✓ Workout started");
    display_session(&controller);
    Ok(())
}

fn cmd_add(config: &Config, exercise: NewExercise) -> Result<()> {
    let mut controller = load_active(config)?;
    controller.add_exercise(exercise)?;
    persist(config, &controller)?;
    display_session(&controller);
    Ok(())
}

fn cmd_set(config: &Config, exercise: usize, set: usize, fields: Vec<SetField>) -> Result<()> {
    for field in &fields {
        if let SetField::Weight(w) | SetField::PartnerWeight(w) = field {
            if !session::is_valid_weight(*w) {
                return Err(Error::Validation(format!(
                    "weight must be a non-negative number, got {}",
                    w
                )));
            }
        }
    }

    let mut controller = load_active(config)?;

    let known = controller
        .session()
        .and_then(|s| s.exercises.get(exercise))
        .is_some_and(|e| set < e.sets.len());
    if !known {
        return Err(Error::Validation(format!(
            "no set {} in exercise {}",
            set + 1,
            exercise + 1
        )));
    }

    let mut rest_started = false;
    for field in fields {
        rest_started |= controller.update_set(exercise, set, field);
    }
    controller.go_to(exercise);
    persist(config, &controller)?;

    display_session(&controller);
    if rest_started {
        println!("⏱ Rest {}s", controller.timer().remaining());
    }
    Ok(())
}

fn cmd_notes(config: &Config, exercise: usize, text: String) -> Result<()> {
    with_session(config, |c| c.update_notes(exercise, text))
}

fn cmd_status(config: &Config) -> Result<()> {
    let controller = load_controller(config)?;
    if controller.session().is_none() {
        println!("No active workout.");
        return Ok(());
    }
    display_session(&controller);
    Ok(())
}

fn cmd_rest(config: &Config, extend: bool, cancel: bool, ticks: Option<u32>) -> Result<()> {
    let mut controller = load_active(config)?;

    if cancel {
        controller.cancel_recovery();
        println!("Rest cancelled");
    } else if extend {
        controller.extend_recovery();
        println!("⏱ Rest extended to {}s", controller.timer().remaining());
    } else if !controller.timer().is_running() {
        println!("No rest running");
    } else {
        let simulated = ticks.is_some();
        let mut budget = ticks.unwrap_or(u32::MAX);
        while budget > 0 {
            if !simulated {
                std::thread::sleep(std::time::Duration::from_secs(1));
            }
            budget -= 1;
            match controller.tick() {
                TimerEvent::Ticked(left) => {
                    if !simulated {
                        print!("\r⏱ {:>4}s", left);
                        std::io::stdout().flush()?;
                    }
                }
                TimerEvent::RecoveryComplete => {
                    println!("\n✓ Recovery complete");
                    break;
                }
                TimerEvent::Idle => break,
            }
        }
        if controller.timer().is_running() {
            println!("⏱ {}s left", controller.timer().remaining());
        }
    }

    persist(config, &controller)
}

fn cmd_finish(config: &Config) -> Result<()> {
    let mut controller = load_active(config)?;
    let mut store = JsonlHistoryStore::new(config.data.history_path());

    let report = controller.finalize(&config.profile.user_id, Utc::now(), &mut store)?;
    persist(config, &controller)?;

    println!("✓ Workout finished");
    println!("  Recorded {} entries", report.written);
    if report.skipped > 0 {
        println!("  {} exercises had no completed sets", report.skipped);
    }
    if !report.is_complete() {
        tracing::warn!("{} entries could not be recorded", report.failed.len());
    }
    for failure in &report.failed {
        eprintln!(
            "  ✗ Could not record {}: {}",
            failure.exercise_name, failure.error
        );
    }
    Ok(())
}

fn cmd_cancel(config: &Config, force: bool) -> Result<()> {
    let mut controller = load_active(config)?;

    if !controller.cancel_offered() && !force {
        return Err(Error::State(
            "cancel is only available on the first exercise (use `setlog prev` or --force)".into(),
        ));
    }

    controller.cancel();
    persist(config, &controller)?;
    println!("Workout cancelled; nothing recorded.");
    Ok(())
}

fn parse_month(month: Option<String>) -> Result<(i32, u32)> {
    let Some(text) = month else {
        let now = Utc::now();
        return Ok((now.year(), now.month()));
    };

    let parsed = text.split_once('-').and_then(|(y, m)| {
        let year = y.parse::<i32>().ok()?;
        let month = m.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
        Some((year, month))
    });
    parsed.ok_or_else(|| Error::Validation(format!("invalid month '{}', expected YYYY-MM", text)))
}

fn cmd_history(config: &Config, month: Option<String>) -> Result<()> {
    let (year, month) = parse_month(month)?;
    let entries = JsonlHistoryStore::new(config.data.history_path()).load()?;
    let window = chrono::Duration::seconds(config.history.pairing_window_seconds);
    let days = reconstruct_month(&entries, year, month, window);

    if days.is_empty() {
        println!("No workouts recorded in {}-{:02}.", year, month);
        return Ok(());
    }

    for day in days {
        println!("{}", day.date);
        for group in &day.exercises {
            match group.exercise2() {
                Some(partner) => println!(
                    "  Superset: {} + {}",
                    group.display_name(),
                    partner.exercise_name
                ),
                None => println!("  {}", group.display_name()),
            }
            print_entry(group.primary());
            if let Some(partner) = group.exercise2() {
                print_entry(partner);
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &ProgressEntry) {
    println!(
        "    {}: {} sets, {} reps @ {}",
        entry.exercise_name, entry.sets_completed, entry.reps_completed, entry.weight_used
    );
    if let Some(notes) = &entry.notes {
        println!("      \"{}\"", notes);
    }
}

fn cmd_summary(config: &Config) -> Result<()> {
    let entries = JsonlHistoryStore::new(config.data.history_path()).load()?;
    let summaries = exercise_summaries(&entries);

    if summaries.is_empty() {
        println!("No exercises recorded yet.");
        return Ok(());
    }

    for s in summaries {
        println!(
            "{} [{}]: {}x, best {}, last {}",
            s.name,
            s.muscle,
            s.times_performed,
            s.best_weight,
            s.last_performed.date_naive()
        );
    }
    Ok(())
}

fn cmd_progression(config: &Config, name: &str) -> Result<()> {
    let entries = JsonlHistoryStore::new(config.data.history_path()).load()?;
    let series = progression_series(&entries, name);

    if series.is_empty() {
        println!("No history for '{}'.", name.trim());
        return Ok(());
    }

    println!("{}", name.trim());
    for point in series {
        println!(
            "  {}: best {}, {} sets",
            point.date, point.max_weight, point.total_sets
        );
    }
    Ok(())
}

fn cmd_export(config: &Config, out: Option<PathBuf>) -> Result<()> {
    let entries = JsonlHistoryStore::new(config.data.history_path()).load()?;
    let out = out.unwrap_or_else(|| config.data.data_dir.join("history.csv"));

    let count = setlog_core::csv_export::export_csv(&entries, &out)?;
    println!("✓ Exported {} entries", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn display_session(controller: &SessionController) {
    let Some(session) = controller.session() else {
        return;
    };

    println!();
    println!("  {} ({})", session.name, source_label(&session.source));
    println!();

    if session.exercises.is_empty() {
        println!("  No exercises yet. Add one with `setlog add`.");
    }

    for (i, exercise) in session.exercises.iter().enumerate() {
        let marker = if i == controller.cursor() { ">" } else { " " };
        println!(
            "{} {}. {} [{}] {}x{} @ {}",
            marker,
            i + 1,
            exercise.name,
            exercise.muscle,
            exercise.target_sets,
            exercise.target_reps,
            exercise.target_weight
        );
        for set in &exercise.sets {
            let check = if set.completed { "x" } else { " " };
            match &set.partner {
                Some(p) => println!(
                    "     [{}] set {}: {} x {} | {} x {}",
                    check, set.set_number, set.reps, set.weight, p.reps, p.weight
                ),
                None => println!(
                    "     [{}] set {}: {} x {}",
                    check, set.set_number, set.reps, set.weight
                ),
            }
        }
        if !exercise.notes.is_empty() {
            println!("     notes: {}", exercise.notes);
        }
    }

    let timer = controller.timer();
    if timer.is_running() {
        println!();
        println!("  ⏱ Resting: {}s left", timer.remaining());
    }
    println!();
}

fn source_label(source: &SessionSource) -> String {
    match source {
        SessionSource::Template(id) => format!("template {}", id),
        SessionSource::Custom => "custom".into(),
    }
}
