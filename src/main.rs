//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{stdin, stdout, Write};
use tracing_subscriber::{fmt, EnvFilter};

use fittrack_lib::{
    codec, metrics, AccountData, AppService, CardioType, Dashboard, Gender, Goal, NewCardio,
    NewStrength, ProfileUpdate, RecordKind,
};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli_args = cli::parse_args();

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color = service.config.theme.header_color();
    let today = Local::now().date_naive();

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Signup { username, name } => {
            let password = prompt("Password: ")?;
            let confirm = prompt("Confirm password: ")?;
            match service.signup(&username, &password, &confirm, &name) {
                Ok(()) => {
                    println!("Account '{}' created and logged in.", username.trim());
                    println!("Complete your profile with 'profile --gender .. --weight .. --height .. --age ..'.");
                }
                Err(e) => bail!("Signup failed: {e}"),
            }
        }
        cli::Commands::Login { username } => {
            let password = prompt("Password: ")?;
            match service.login(&username, &password) {
                Ok(data) => println!(
                    "Welcome, {}! Loaded {} cardio, {} strength, {} bodyweight entries and {} goals.",
                    data.profile.display_name,
                    data.cardio.len(),
                    data.strength.len(),
                    data.bodyweight.len(),
                    data.goals.len()
                ),
                Err(e) => bail!("Login failed: {e}"),
            }
        }
        cli::Commands::Logout => {
            service.logout()?;
            println!("Logged out.");
        }
        cli::Commands::Profile {
            gender,
            weight,
            target,
            height,
            age,
        } => {
            service
                .update_profile(ProfileUpdate {
                    gender: cli_gender(gender),
                    weight,
                    target_bodyweight: target,
                    height,
                    age,
                })
                .context("Error updating profile")?;
            println!("Profile updated!");
        }
        cli::Commands::AddCardio {
            type_,
            duration,
            distance,
            date,
        } => {
            let workout = service
                .add_cardio(NewCardio {
                    date: date.unwrap_or(today),
                    type_: cli_cardio_type(type_),
                    duration_minutes: duration,
                    distance_km: distance,
                })
                .context("Error adding cardio workout")?;
            println!(
                "Cardio saved: {} {:.1} km in {} min ({:.0} kcal, {:.1} km/h).",
                workout.type_,
                workout.distance_km,
                workout.duration_minutes,
                workout.calories,
                workout.avg_speed_kmh
            );
        }
        cli::Commands::AddStrength { exercises, date } => {
            let exercises =
                codec::parse_exercise_input(&exercises).context("Error adding strength workout")?;
            let workout = service
                .add_strength(NewStrength {
                    date: date.unwrap_or(today),
                    exercises,
                })
                .context("Error adding strength workout")?;
            println!(
                "Strength workout saved: {} exercise(s), {:.0} kg volume, {:.0} kcal.",
                workout.exercises.len(),
                workout.volume(),
                workout.calories
            );
        }
        cli::Commands::AddBodyweight { weight, date } => {
            service
                .add_bodyweight(date.unwrap_or(today), weight)
                .context("Error logging bodyweight")?;
            println!("Weight logged: {weight:.1} kg");
        }
        cli::Commands::AddGoal(goal) => {
            let goal = match goal {
                cli::GoalCommand::Cardio {
                    name,
                    target,
                    minutes,
                } => Goal::cardio(name.trim(), target, minutes),
                cli::GoalCommand::Strength {
                    name,
                    exercise,
                    weight,
                    sets,
                    reps,
                } => Goal::strength(name.trim(), exercise.trim(), weight, sets, reps),
            };
            service.add_goal(goal).context("Error creating goal")?;
            println!("Goal created!");
        }
        cli::Commands::Delete { kind, index } => {
            let kind = cli_record_kind(kind);
            service
                .delete_record(kind, index)
                .with_context(|| format!("Error deleting {kind} entry {index}"))?;
            println!("Deleted {kind} entry {index}.");
        }
        cli::Commands::List { kind } => {
            let data = service.account()?;
            match cli_record_kind(kind) {
                RecordKind::Cardio => print_cardio_table(data, header_color),
                RecordKind::Strength => print_strength_table(data, header_color),
                RecordKind::Bodyweight => print_bodyweight_table(data, header_color),
                RecordKind::Goal => print_goal_table(&service.compute_dashboard()?, header_color),
            }
        }
        cli::Commands::Show { index } => {
            let data = service.account()?;
            let Some(workout) = data.strength.get(index) else {
                bail!("No strength workout at index {index}.");
            };
            println!("Workout: {}\n", workout.date);
            for exercise in &workout.exercises {
                println!("{}", exercise.name);
                for (i, set) in exercise.sets.iter().enumerate() {
                    println!("   Set {}: {} reps @ {} kg", i + 1, set.reps, set.weight);
                }
                println!("   Volume: {:.0} kg\n", exercise.volume());
            }
            println!(
                "Total Volume: {:.0} kg\nCalories: {:.0}",
                workout.volume(),
                workout.calories
            );
        }
        cli::Commands::Dashboard { date } => {
            let dashboard = service.compute_dashboard_at(date.unwrap_or(today))?;
            print_dashboard(&dashboard, header_color);
        }
        cli::Commands::DataPath => {
            println!("Data directory: {:?}", service.get_data_dir());
            println!("Config file: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn cli_cardio_type(type_: cli::CardioTypeCli) -> CardioType {
    match type_ {
        cli::CardioTypeCli::Running => CardioType::Running,
        cli::CardioTypeCli::Cycling => CardioType::Cycling,
        cli::CardioTypeCli::Swimming => CardioType::Swimming,
        cli::CardioTypeCli::Walking => CardioType::Walking,
    }
}

fn cli_gender(gender: cli::GenderCli) -> Gender {
    match gender {
        cli::GenderCli::Male => Gender::Male,
        cli::GenderCli::Female => Gender::Female,
        cli::GenderCli::Other => Gender::Other,
    }
}

fn cli_record_kind(kind: cli::RecordKindCli) -> RecordKind {
    match kind {
        cli::RecordKindCli::Cardio => RecordKind::Cardio,
        cli::RecordKindCli::Strength => RecordKind::Strength,
        cli::RecordKindCli::Bodyweight => RecordKind::Bodyweight,
        cli::RecordKindCli::Goal => RecordKind::Goal,
    }
}

fn new_table(headers: &[&str], header_color: Color) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(header_color))
                .collect::<Vec<_>>(),
        );
    table
}

fn print_cardio_table(data: &AccountData, header_color: Color) {
    let mut table = new_table(
        &["#", "Date", "Type", "Duration (min)", "Distance (km)", "Calories", "Avg speed (km/h)"],
        header_color,
    );
    for (i, w) in data.cardio.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&w.date),
            Cell::new(w.type_),
            Cell::new(w.duration_minutes),
            Cell::new(format!("{:.2}", w.distance_km)),
            Cell::new(format!("{:.0}", w.calories)),
            Cell::new(format!("{:.1}", w.avg_speed_kmh)),
        ]);
    }
    println!("{table}");
}

fn print_strength_table(data: &AccountData, header_color: Color) {
    let mut table = new_table(
        &["#", "Date", "Exercises", "Sets", "Volume (kg)", "Calories"],
        header_color,
    );
    for (i, w) in data.strength.iter().enumerate() {
        let names = w
            .exercises
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let sets: usize = w.exercises.iter().map(|e| e.sets.len()).sum();
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&w.date),
            Cell::new(names),
            Cell::new(sets),
            Cell::new(format!("{:.0}", w.volume())),
            Cell::new(format!("{:.0}", w.calories)),
        ]);
    }
    println!("{table}");
}

fn print_bodyweight_table(data: &AccountData, header_color: Color) {
    let mut table = new_table(&["#", "Date", "Weight (kg)"], header_color);
    for (i, b) in data.bodyweight.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&b.date),
            Cell::new(format!("{:.1}", b.weight)),
        ]);
    }
    println!("{table}");
}

fn print_goal_table(dashboard: &Dashboard, header_color: Color) {
    let mut table = new_table(
        &["#", "Goal", "Type", "Progress", "Target", "Status"],
        header_color,
    );
    for (i, g) in dashboard.goals.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&g.name),
            Cell::new(g.type_label),
            Cell::new(format!("{:.1}", g.progress)),
            Cell::new(format!("{:.1}", g.target)),
            Cell::new(g.status),
        ]);
    }
    println!("{table}");
}

fn print_dashboard(d: &Dashboard, header_color: Color) {
    let w = &d.weekly;
    println!("Last 7 days (through {}):", d.today);
    println!(
        "  Cardio:   {:.1} km in {} min, {:.0} kcal • target {:.1} km ({}%)",
        w.cardio_km, w.cardio_minutes, w.cardio_calories, d.cardio_target_km, d.cardio_percent
    );
    println!(
        "  Strength: {}/{} workouts • {:.0} kg vol, {:.0} kcal ({}%)",
        w.strength_workouts, d.strength_target, w.strength_volume, w.strength_calories, d.strength_percent
    );
    let current = d
        .current_weight
        .map_or_else(|| "-- kg".to_string(), |kg| format!("{kg:.1} kg"));
    println!(
        "  Weight:   {current} (target {:.1} kg) • BMI {} ({})",
        d.target_bodyweight,
        metrics::or_na(d.bmi.map(|b| format!("{b:.1}"))),
        metrics::or_na(d.bmi_category)
    );

    let start = d.today - Duration::days(6);
    let mut headers = vec!["Daily".to_string()];
    headers.extend((0..7).map(|i| day_label(start + Duration::days(i))));
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let mut table = new_table(&header_refs, header_color);
    for (label, series, decimals) in [
        ("Cardio (km)", &d.cardio_daily, 1usize),
        ("Volume (kg)", &d.strength_daily, 0),
        ("Weight (kg)", &d.bodyweight_daily, 1),
    ] {
        let mut row = vec![Cell::new(label)];
        row.extend(series.iter().map(|v| Cell::new(format!("{v:.decimals$}"))));
        table.add_row(row);
    }
    println!("{table}");

    let l = &d.lifetime;
    println!(
        "All time: {} cardio ({:.1} km, {:.0} kcal) • {} strength ({:.0} kg, {:.0} kcal)",
        l.cardio_count, l.cardio_km, l.cardio_calories, l.strength_count, l.strength_volume, l.strength_calories
    );
    if !d.goals.is_empty() {
        print_goal_table(d, header_color);
    }
}

fn day_label(day: NaiveDate) -> String {
    day.format("%a %d").to_string()
}
