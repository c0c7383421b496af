//! Config validation CLI tool
//!
//! Validates an fxsessiond configuration file and prints the resulting
//! session tables.

use fxsession_api::{SessionDefinition, TableVariant};
use fxsession_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_table(variant: TableVariant, sessions: &[SessionDefinition]) {
    println!();
    println!("{} table:", variant);
    for session in sessions {
        println!("  - {} {}", session.name, session.main.describe());
        for window in session.windows().skip(1) {
            println!(
                "      {} [{:?}]: {} {}",
                window.role,
                window.kind,
                window.display_label(),
                window.window.describe()
            );
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an fxsessiond configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match fxsession_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", fxsession_config::CURRENT_CONFIG_VERSION);
            println!("  Sessions: {}", policy.session_count());
            println!("  Observer offset: {:+} h", policy.engine.observer_offset_hours);
            match policy.engine.dst_override {
                Some(daylight) => println!("  Table: {} (forced)", TableVariant::from_dst(daylight)),
                None if policy.engine.auto_detect_dst => println!("  Table: auto (US/Europe DST)"),
                None => println!("  Table: standard (auto-detect off)"),
            }

            print_table(TableVariant::Standard, &policy.tables.standard);
            print_table(TableVariant::Daylight, &policy.tables.daylight);

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                fxsession_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                fxsession_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                fxsession_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                fxsession_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        fxsession_config::CURRENT_CONFIG_VERSION
                    );
                }
                other => eprintln!("{}", other),
            }
            ExitCode::from(1)
        }
    }
}
