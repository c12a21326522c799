//! Tests for command-line argument parsing
//!
//! Note: These tests verify the argument parser configuration by creating
//! a test parser with the same structure as the main application, then feeding
//! `--set` assignments through the library's parameter validation.

use clap::{Arg, ArgAction, Command as ClapCommand};
use face_gesture_mouse::{config::Config, Error};

/// Create a command with the same argument structure as the main binary
fn create_test_command() -> ClapCommand {
    ClapCommand::new("face-gesture-mouse")
        .version("0.1.0")
        .about("Hands-free pointer control from facial gestures")
        .arg(
            Arg::new("cam")
                .long("cam")
                .value_name("INDEX")
                .value_parser(clap::value_parser!(i32))
                .help("Camera index"),
        )
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .value_name("PATH")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("PATH")
                .help("Face-mesh ONNX model"),
        )
        .arg(
            Arg::new("no-mirror")
                .long("no-mirror")
                .action(ArgAction::SetTrue)
                .help("Do not mirror camera frames"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debug output"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Log pointer actions only"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("NAME=VALUE")
                .action(ArgAction::Append)
                .help("Override a gesture parameter"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("Print an example configuration"),
        )
}

/// Apply `NAME=VALUE` strings the way the binary does
fn apply_overrides(config: &mut Config, assignments: &[&str]) -> Result<(), Error> {
    for assignment in assignments {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| Error::InvalidInput(format!("expected NAME=VALUE, got {assignment}")))?;
        let value: f64 = value
            .parse()
            .map_err(|_| Error::InvalidInput(format!("not a number: {value}")))?;
        config.parameters.update(name, value)?;
    }
    Ok(())
}

#[test]
fn test_help_argument() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["face-gesture-mouse", "--help"]);

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn test_no_arguments() {
    let cmd = create_test_command();
    let matches = cmd.try_get_matches_from(vec!["face-gesture-mouse"]).unwrap();

    assert_eq!(matches.get_one::<i32>("cam"), None);
    assert!(!matches.get_flag("dry-run"));
    assert!(!matches.get_flag("no-mirror"));
    assert!(matches.get_many::<String>("set").is_none());
}

#[test]
fn test_cam_argument() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["face-gesture-mouse", "--cam", "2"])
        .unwrap();
    assert_eq!(matches.get_one::<i32>("cam"), Some(&2));

    let cmd = create_test_command();
    assert!(cmd
        .try_get_matches_from(vec!["face-gesture-mouse", "--cam", "front"])
        .is_err());
}

#[test]
fn test_flags() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec!["face-gesture-mouse", "-d", "--dry-run", "--no-mirror"])
        .unwrap();
    assert!(matches.get_flag("debug"));
    assert!(matches.get_flag("dry-run"));
    assert!(matches.get_flag("no-mirror"));
}

#[test]
fn test_repeated_set() {
    let cmd = create_test_command();
    let matches = cmd
        .try_get_matches_from(vec![
            "face-gesture-mouse",
            "--set",
            "SCROLL_STEP=80",
            "--set",
            "ema_alpha=0.3",
        ])
        .unwrap();
    let assignments: Vec<&str> = matches
        .get_many::<String>("set")
        .unwrap()
        .map(String::as_str)
        .collect();
    assert_eq!(assignments, vec!["SCROLL_STEP=80", "ema_alpha=0.3"]);

    let mut config = Config::default();
    apply_overrides(&mut config, &assignments).unwrap();
    assert_eq!(config.parameters.scroll_step, 80.0);
    assert_eq!(config.parameters.ema_alpha, 0.3);
}

#[test]
fn test_invalid_set_values() {
    let mut config = Config::default();
    assert!(matches!(
        apply_overrides(&mut config, &["TURBO=1"]),
        Err(Error::UnknownParameter(_))
    ));
    assert!(matches!(
        apply_overrides(&mut config, &["SCROLL_INTERVAL=-1"]),
        Err(Error::InvalidParameterValue { .. })
    ));
    assert!(matches!(
        apply_overrides(&mut config, &["SCROLL_STEP"]),
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(config, Config::default());
}
