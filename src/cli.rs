// src/cli.rs
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Track cardio, strength, bodyweight and goals", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardioTypeCli {
    Running,
    Cycling,
    Swimming,
    Walking,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenderCli {
    Male,
    Female,
    Other,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKindCli {
    Cardio,
    Strength,
    Bodyweight,
    Goal,
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    /// Kilometres to cover, optionally with a time budget
    Cardio {
        /// Goal name
        name: String,
        /// Target distance in km
        #[arg(short, long)]
        target: f64,
        /// Time limit in minutes (0 = no limit)
        #[arg(long, default_value_t = 0)]
        minutes: u32,
    },
    /// One workout where an exercise hits sets/reps/weight thresholds
    Strength {
        /// Goal name
        name: String,
        /// Exercise to match (case-insensitive)
        #[arg(short, long)]
        exercise: String,
        /// Minimum weight of the qualifying set (kg)
        #[arg(short, long, default_value_t = 20.0)]
        weight: f64,
        /// Minimum number of sets of the exercise
        #[arg(short, long, default_value_t = 3)]
        sets: u32,
        /// Minimum reps of the qualifying set
        #[arg(short, long, default_value_t = 12)]
        reps: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account (prompts for a password) and log into it
    Signup {
        username: String,
        /// Name shown in the app
        #[arg(short, long)]
        name: String,
    },
    /// Log into an existing account (prompts for the password)
    Login { username: String },
    /// Save and unload the current account
    Logout,
    /// Complete or update the profile of the current account
    Profile {
        #[arg(short, long, value_enum)]
        gender: GenderCli,
        /// Current weight in kg
        #[arg(short, long)]
        weight: f64,
        /// Target bodyweight in kg
        #[arg(short, long, default_value_t = 0.0)]
        target: f64,
        /// Height in cm
        #[arg(long)]
        height: f64,
        #[arg(short, long)]
        age: u32,
    },
    /// Log a cardio session
    AddCardio {
        #[arg(short = 't', long = "type", value_enum)]
        type_: CardioTypeCli,
        /// Duration in minutes
        #[arg(short, long)]
        duration: u32,
        /// Distance in km
        #[arg(long)]
        distance: f64,
        /// Date of the session (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Log a strength workout
    AddStrength {
        /// Exercises as "Name:RxW,RxW;Other:RxW", e.g. "Bench Press:8x60,8x60"
        exercises: String,
        /// Date of the workout (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Log a bodyweight entry (also updates the profile weight)
    AddBodyweight {
        weight: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create a goal
    #[command(subcommand)]
    AddGoal(GoalCommand),
    /// Delete a record by its index as shown by `list`
    Delete {
        #[arg(value_enum)]
        kind: RecordKindCli,
        index: usize,
    },
    /// List records of one kind
    List {
        #[arg(value_enum)]
        kind: RecordKindCli,
    },
    /// Show the details of one strength workout
    Show { index: usize },
    /// Weekly summary, daily charts, goal progress and BMI
    Dashboard {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the path to the data directory
    DataPath,
    /// Print a shell completion script
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_goal_strength() {
        let cli = Cli::try_parse_from([
            "fittrack", "add-goal", "strength", "Bench 60", "--exercise", "Bench Press",
            "--weight", "60", "--sets", "3", "--reps", "8",
        ])
        .unwrap();
        match cli.command {
            Commands::AddGoal(GoalCommand::Strength { name, exercise, weight, sets, reps }) => {
                assert_eq!(name, "Bench 60");
                assert_eq!(exercise, "Bench Press");
                assert_eq!((weight, sets, reps), (60.0, 3, 8));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
