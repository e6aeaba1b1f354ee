use anyhow::Result;
use chrono::{Duration, NaiveDate};
use fittrack_lib::store::DataFile;
use fittrack_lib::{
    AppService, CardioType, Config, Exercise, ExerciseSet, Gender, Goal, GoalKind, GoalStatus,
    NewCardio, NewStrength, ProfileUpdate, RecordKind, ValidationError,
};
use std::fs;
use tempfile::TempDir;

const PASSWORD: &str = "hunter22";

// Helper: a service over a throwaway data directory, logged into "ana"
fn create_test_service() -> Result<(AppService, TempDir)> {
    let dir = TempDir::new()?;
    let mut service = AppService::new(
        Config::default(),
        dir.path().join("config.toml"),
        dir.path().to_path_buf(),
    );
    service.signup("ana", PASSWORD, PASSWORD, "Ana")?;
    service.update_profile(ProfileUpdate {
        gender: Gender::Female,
        weight: 70.0,
        target_bodyweight: 65.0,
        height: 170.0,
        age: 30,
    })?;
    Ok((service, dir))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn run(days_ago: i64, km: f64, minutes: u32) -> NewCardio {
    NewCardio {
        date: today() - Duration::days(days_ago),
        type_: CardioType::Running,
        duration_minutes: minutes,
        distance_km: km,
    }
}

fn bench(days_ago: i64, sets: &[(u32, f64)]) -> NewStrength {
    NewStrength {
        date: today() - Duration::days(days_ago),
        exercises: vec![Exercise {
            name: "Bench Press".into(),
            sets: sets
                .iter()
                .map(|&(reps, weight)| ExerciseSet { reps, weight })
                .collect(),
        }],
    }
}

fn validation_error(err: &anyhow::Error) -> Option<&ValidationError> {
    err.downcast_ref::<ValidationError>()
}

#[test]
fn test_add_cardio_computes_derived_fields() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    let workout = service.add_cardio(run(0, 5.0, 30))?;

    assert!((workout.calories - 343.0).abs() < 1e-9);
    assert!((workout.avg_speed_kmh - 10.0).abs() < 1e-9);
    assert_eq!(workout.date, "2024-06-15");
    assert_eq!(service.account()?.cardio.len(), 1);
    Ok(())
}

#[test]
fn test_add_strength_computes_calories_from_volume() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    let workout = service.add_strength(bench(0, &[(10, 50.0), (10, 50.0)]))?;
    // 5 * 70 * 0.15 + 1000 * 0.01
    assert!((workout.calories - 62.5).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_state_survives_logout_and_login() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_cardio(run(1, 5.0, 30))?;
    service.add_strength(bench(2, &[(8, 60.0), (8, 60.0), (8, 60.0)]))?;
    service.add_bodyweight(today(), 69.5)?;
    service.add_goal(Goal::cardio("Run 20k", 20.0, 0))?;
    let before = service.account()?.clone();

    service.logout()?;
    assert!(!service.is_logged_in());
    assert!(service.config.active_user.is_none());

    let after = service.login("ana", PASSWORD)?.clone();
    assert_eq!(before, after);
    assert_eq!(after.profile.display_name, "Ana");
    assert_eq!(after.profile.gender, Some(Gender::Female));
    // Logging bodyweight moved the profile weight along with it.
    assert_eq!(after.profile.weight, 69.5);
    Ok(())
}

#[test]
fn test_loading_twice_is_idempotent() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_cardio(run(0, 3.0, 20))?;
    service.add_goal(Goal::strength("Bench", "Bench Press", 60.0, 3, 8))?;

    let first = service.login("ana", PASSWORD)?.clone();
    let second = service.login("ana", PASSWORD)?.clone();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_accounts_are_isolated() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_cardio(run(0, 3.0, 20))?;

    service.signup("bob", PASSWORD, PASSWORD, "Bob")?;
    assert!(service.account()?.cardio.is_empty());
    assert_eq!(service.config.active_user.as_deref(), Some("bob"));

    service.login("ana", PASSWORD)?;
    assert_eq!(service.account()?.cardio.len(), 1);
    Ok(())
}

#[test]
fn test_restore_session_from_config() -> Result<()> {
    let (mut service, dir) = create_test_service()?;
    service.add_bodyweight(today(), 71.0)?;

    let config = fittrack_lib::load_config_util(&dir.path().join("config.toml"))?;
    assert_eq!(config.active_user.as_deref(), Some("ana"));
    let mut restored = AppService::new(
        config,
        dir.path().join("config.toml"),
        dir.path().to_path_buf(),
    );
    restored.restore_session()?;
    assert_eq!(restored.account()?.bodyweight.len(), 1);
    assert_eq!(restored.account()?.profile.display_name, "Ana");
    Ok(())
}

#[test]
fn test_login_rejections() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    let err = service.login("ana", "wrong-password").unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::InvalidCredentials));
    // A failed login leaves the current session alone.
    assert!(service.is_logged_in());

    let err = service.login("  ", PASSWORD).unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::EmptyField("Username")));

    let err = service.signup("ana", PASSWORD, PASSWORD, "Ana again").unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::UsernameTaken("ana".into()))
    );
    Ok(())
}

#[test]
fn test_mutations_require_login() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.logout()?;
    let err = service.add_cardio(run(0, 5.0, 30)).unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::NotLoggedIn));
    assert!(service.compute_dashboard_at(today()).is_err());
    Ok(())
}

#[test]
fn test_validation_rejects_without_mutation() -> Result<()> {
    let (mut service, dir) = create_test_service()?;

    let err = service
        .add_goal(Goal::strength("Bench", "  ", 60.0, 3, 8))
        .unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::EmptyField("Exercise name")));

    let err = service.add_goal(Goal::cardio("", 10.0, 0)).unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::EmptyField("Goal name")));

    let err = service
        .add_strength(NewStrength {
            date: today(),
            exercises: vec![],
        })
        .unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::NoExercises));

    let err = service.add_bodyweight(today(), 0.0).unwrap_err();
    assert_eq!(validation_error(&err), Some(&ValidationError::NotPositive("Weight")));

    let data = service.account()?;
    assert!(data.goals.is_empty() && data.strength.is_empty() && data.bodyweight.is_empty());
    let goals_file = fs::read_to_string(DataFile::Goals.path(dir.path(), "ana"))?;
    assert!(goals_file.is_empty());
    Ok(())
}

#[test]
fn test_delete_out_of_range() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_cardio(run(0, 5.0, 30))?;
    let err = service.delete_record(RecordKind::Cardio, 3).unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::NoSuchRecord {
            kind: RecordKind::Cardio,
            index: 3,
            len: 1
        })
    );
    service.delete_record(RecordKind::Cardio, 0)?;
    assert!(service.account()?.cardio.is_empty());
    Ok(())
}

#[test]
fn test_cardio_goal_accumulates() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_goal(Goal::cardio("10k", 10.0, 0))?;

    service.add_cardio(run(0, 5.0, 30))?;
    assert_eq!(service.account()?.goals[0].progress, 5.0);

    service.add_cardio(run(0, 7.0, 40))?;
    let goal = &service.account()?.goals[0];
    assert_eq!(goal.progress, 12.0);
    let dashboard = service.compute_dashboard_at(today())?;
    assert_eq!(dashboard.goals[0].percent, 100);
    assert_eq!(dashboard.goals[0].status, GoalStatus::Done);
    Ok(())
}

#[test]
fn test_timed_cardio_goal_tracks_minutes() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_goal(Goal::cardio("Quick 10k", 10.0, 60))?;
    service.add_cardio(run(0, 5.0, 25))?;
    service.add_cardio(run(0, 5.0, 27))?;
    assert_eq!(
        service.account()?.goals[0].kind,
        GoalKind::CardioDistance {
            target_time: 60,
            progress_time: 52
        }
    );
    Ok(())
}

#[test]
fn test_strength_goal_achievement() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_goal(Goal::strength("Bench 60x8", "bench press", 60.0, 3, 8))?;

    let workout = || bench(0, &[(8, 60.0), (8, 60.0), (8, 60.0)]);
    service.add_strength(workout())?;
    assert_eq!(service.account()?.goals[0].progress, 1.0);

    service.add_strength(workout())?;
    assert_eq!(service.account()?.goals[0].progress, 2.0);

    // Not enough sets
    service.add_strength(bench(0, &[(8, 60.0), (8, 60.0)]))?;
    assert_eq!(service.account()?.goals[0].progress, 2.0);
    Ok(())
}

#[test]
fn test_deleting_workouts_keeps_goal_progress() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_goal(Goal::cardio("10k", 10.0, 0))?;
    service.add_cardio(run(0, 4.0, 30))?;
    service.delete_record(RecordKind::Cardio, 0)?;
    assert_eq!(service.account()?.goals[0].progress, 4.0);

    service.delete_goal(0)?;
    assert!(service.account()?.goals.is_empty());
    Ok(())
}

#[test]
fn test_dashboard_window_and_targets() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    for (days_ago, km) in [(0, 5.0), (3, 3.0), (6, 2.0), (7, 40.0)] {
        service.add_cardio(run(days_ago, km, 30))?;
    }
    service.add_strength(bench(1, &[(10, 50.0)]))?;
    service.add_bodyweight(today() - Duration::days(2), 80.0)?;
    service.add_bodyweight(today() - Duration::days(2), 82.5)?;

    let d = service.compute_dashboard_at(today())?;
    assert_eq!(d.cardio_daily, [2.0, 0.0, 0.0, 3.0, 0.0, 0.0, 5.0]);
    assert_eq!(d.strength_daily[5], 500.0);
    assert_eq!(d.bodyweight_daily[4], 82.5);
    assert_eq!(d.weekly.cardio_km, 10.0);
    assert_eq!(d.weekly.cardio_minutes, 90);
    assert_eq!(d.weekly.strength_workouts, 1);
    assert_eq!(d.cardio_target_km, 20.0);
    assert_eq!(d.cardio_percent, 50);
    assert_eq!(d.strength_target, 3);
    assert_eq!(d.strength_percent, 33);
    assert_eq!(d.lifetime.cardio_count, 4);
    assert_eq!(d.lifetime.cardio_km, 50.0);

    // Later goals override earlier ones.
    service.add_goal(Goal::cardio("Big", 100.0, 0))?;
    service.add_goal(Goal::cardio("Small", 10.0, 0))?;
    service.add_goal(Goal::strength("Bench", "Bench Press", 60.0, 3, 8))?;
    let d = service.compute_dashboard_at(today())?;
    assert_eq!(d.cardio_target_km, 10.0);
    assert_eq!(d.cardio_percent, 100);
    assert_eq!(d.strength_target, 1);
    assert_eq!(d.strength_percent, 100);
    Ok(())
}

#[test]
fn test_dashboard_bmi() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    let d = service.compute_dashboard_at(today())?;
    assert!((d.bmi.unwrap() - 24.22).abs() < 0.01);
    assert_eq!(d.bmi_category, Some(fittrack_lib::BmiCategory::Normal));
    assert_eq!(d.current_weight, Some(70.0));

    service.update_profile(ProfileUpdate {
        gender: Gender::Female,
        weight: 100.0,
        target_bodyweight: 80.0,
        height: 170.0,
        age: 30,
    })?;
    let d = service.compute_dashboard_at(today())?;
    assert_eq!(d.bmi_category, Some(fittrack_lib::BmiCategory::Obese));
    Ok(())
}

#[test]
fn test_malformed_lines_are_skipped_on_load() -> Result<()> {
    let (mut service, dir) = create_test_service()?;
    service.logout()?;

    fs::write(
        DataFile::Cardio.path(dir.path(), "ana"),
        "2024-06-15|Running|30|5|343|10\nbroken line\n2024-06-14|Walking|60\nbad-date|Cycling|60|20|525|20\n",
    )?;
    fs::write(
        DataFile::Goals.path(dir.path(), "ana"),
        "Old 10k|cardio_km|10|3|0|0\nBench|strength_exercise|1|0|0|0|Bench Press|60|3|8\nshort|cardio_km\n",
    )?;
    fs::remove_file(DataFile::Strength.path(dir.path(), "ana"))?;

    let data = service.login("ana", PASSWORD)?;
    assert_eq!(data.cardio.len(), 2);
    assert_eq!(data.cardio[1].date, "bad-date");
    assert_eq!(data.goals.len(), 2);
    assert_eq!(data.goals[0].progress, 3.0);
    assert!(data.strength.is_empty());

    // Records with unparseable dates are kept but never aggregated.
    let d = service.compute_dashboard_at(today())?;
    assert_eq!(d.weekly.cardio_km, 5.0);
    assert_eq!(d.lifetime.cardio_km, 25.0);

    // Legacy goal lines are rewritten in the full shape.
    service.logout()?;
    let goals = fs::read_to_string(DataFile::Goals.path(dir.path(), "ana"))?;
    assert_eq!(goals.lines().next(), Some("Old 10k|cardio_km|10|3|0|0||0|0|0"));
    Ok(())
}

#[test]
fn test_storage_failure_is_reported() -> Result<()> {
    let (mut service, dir) = create_test_service()?;
    // A directory where the cardio file should be makes the rename fail.
    let cardio_path = DataFile::Cardio.path(dir.path(), "ana");
    fs::remove_file(&cardio_path)?;
    fs::create_dir(&cardio_path)?;
    fs::write(cardio_path.join("blocker"), "x")?;

    let err = service.add_cardio(run(0, 5.0, 30)).unwrap_err();
    assert!(validation_error(&err).is_none());
    assert!(err.to_string().contains("Failed to write"));
    Ok(())
}

#[test]
fn test_failed_logout_keeps_account_loaded() -> Result<()> {
    let (mut service, dir) = create_test_service()?;
    let cardio_path = DataFile::Cardio.path(dir.path(), "ana");
    fs::remove_file(&cardio_path)?;
    fs::create_dir(&cardio_path)?;
    fs::write(cardio_path.join("blocker"), "x")?;

    // The workout stays in memory even though it could not be written.
    assert!(service.add_cardio(run(0, 5.0, 30)).is_err());
    let err = service.logout().unwrap_err();
    assert!(err.to_string().contains("Failed to write"));
    assert!(service.is_logged_in());
    assert_eq!(service.config.active_user.as_deref(), Some("ana"));
    assert_eq!(service.account()?.cardio.len(), 1);

    fs::remove_dir_all(&cardio_path)?;
    service.logout()?;
    assert!(!service.is_logged_in());
    assert_eq!(service.config.active_user, None);

    let data = service.login("ana", PASSWORD)?;
    assert_eq!(data.cardio.len(), 1);
    Ok(())
}

#[test]
fn test_huge_durations_do_not_overflow() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.add_goal(Goal::cardio("Ultra", 100.0, 600))?;
    service.add_cardio(run(0, 5.0, u32::MAX))?;
    service.add_cardio(run(1, 5.0, u32::MAX))?;

    let goal = &service.account()?.goals[0];
    assert_eq!(
        goal.kind,
        GoalKind::CardioDistance { target_time: 600, progress_time: u32::MAX }
    );
    assert!((goal.progress - 10.0).abs() < 1e-9);

    let d = service.compute_dashboard_at(today())?;
    assert_eq!(d.weekly.cardio_minutes, 2 * u64::from(u32::MAX));
    Ok(())
}

#[test]
fn test_names_with_line_breaks_are_rejected() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;

    let err = service
        .add_goal(Goal::cardio("Run\n10k", 10.0, 0))
        .unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::ControlCharacter("Goal name"))
    );

    let mut workout = bench(0, &[(8, 60.0)]);
    workout.exercises[0].name = "Bench\r\nPress".into();
    let err = service.add_strength(workout).unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::ControlCharacter("Exercise name"))
    );

    let err = service
        .signup("bo", PASSWORD, PASSWORD, "Bo\nB")
        .unwrap_err();
    assert_eq!(
        validation_error(&err),
        Some(&ValidationError::ControlCharacter("Name"))
    );

    service.add_goal(Goal::cardio("Run 10k", 10.0, 0))?;
    service.logout()?;
    let data = service.login("ana", PASSWORD)?;
    assert_eq!(data.goals.len(), 1);
    assert_eq!(data.goals[0].name, "Run 10k");
    assert!(data.strength.is_empty());
    Ok(())
}
