//! gh-switcher CLI - per-directory GitHub identity management.

use clap::Parser;
use gh_switcher::cli::{Cli, Commands, GuardCommands};
use gh_switcher::commands::{self, Output};
use gh_switcher::config::{ConfigOverrides, OutputFormat, ResolvedConfig, resolve_config};
use gh_switcher::gh::GhCli;
use gh_switcher::git::GitCli;
use gh_switcher::{action_log, ssh, store};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

fn main() {
    let cli = Cli::parse();

    let config_dir = match store::config_dir(cli.config_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => fail_early(&e, cli.human_readable),
    };

    let overrides = ConfigOverrides {
        output_format: cli.human_readable.then_some(OutputFormat::Human),
        ssh_timeout_secs: None,
    };
    let settings = match resolve_config(&config_dir, &overrides) {
        Ok(settings) => settings,
        Err(e) => fail_early(&e, cli.human_readable),
    };
    let human = settings.output_format() == OutputFormat::Human;

    // Serialize command for the audit log before it is consumed.
    let (cmd_name, args_json) = serialize_command(&cli.command);

    let start = Instant::now();
    let result = run_command(cli.command, &config_dir, &settings, human);
    let duration = start.elapsed().as_millis() as u64;

    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    action_log::log_action(&config_dir, &cmd_name, args_json, success, error, duration);

    match result {
        Ok(code) => {
            if code != 0 {
                process::exit(code);
            }
        }
        Err(e) => {
            print_error(&e, human);
            process::exit(1);
        }
    }
}

fn fail_early(e: &gh_switcher::Error, human: bool) -> ! {
    print_error(e, human);
    process::exit(1);
}

fn print_error(e: &gh_switcher::Error, human: bool) {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
}

fn current_dir() -> Result<PathBuf, gh_switcher::Error> {
    env::current_dir().map_err(gh_switcher::Error::Io)
}

/// Execute a command; the returned code is the process exit code for
/// commands whose contract goes beyond success/failure (guard test,
/// test-ssh).
fn run_command(
    command: Commands,
    config_dir: &Path,
    settings: &ResolvedConfig,
    human: bool,
) -> Result<i32, gh_switcher::Error> {
    let probe_timeout = Duration::from_secs(settings.ssh_timeout_secs());
    let prober =
        move |key: &Path, host: &str| ssh::probe(key, host, probe_timeout);

    match command {
        Commands::Add {
            username,
            name,
            email,
            ssh_key,
            signing_key,
            host,
            auto_sign,
        } => {
            let result = commands::profile::add(
                config_dir,
                commands::profile::AddArgs {
                    username,
                    name,
                    email,
                    ssh_key,
                    signing_key,
                    host,
                    auto_sign,
                },
                settings.default_host(),
                prober,
            )?;
            output(&result, human);
        }

        Commands::Remove { user } => {
            let result = commands::profile::remove(config_dir, &user)?;
            output(&result, human);
        }

        Commands::Edit { user, field, value } => {
            let result = commands::profile::edit(config_dir, &user, &field, &value)?;
            output(&result, human);
        }

        Commands::List => {
            let cwd = current_dir()?;
            let result = commands::profile::list(config_dir, &GitCli::for_dir(&cwd))?;
            output(&result, human);
        }

        Commands::Show { user } => {
            let cwd = current_dir()?;
            let result =
                commands::profile::show(config_dir, user.as_deref(), &GitCli::for_dir(&cwd))?;
            output(&result, human);
        }

        Commands::Status => {
            let cwd = current_dir()?;
            let result =
                commands::profile::status(config_dir, &cwd, &GitCli::for_dir(&cwd), &GhCli)?;
            output(&result, human);
        }

        Commands::Switch { user } => {
            let cwd = current_dir()?;
            let result =
                commands::switch::switch(config_dir, &user, &GitCli::for_dir(&cwd), &GhCli)?;
            output(&result, human);
        }

        Commands::Assign {
            args,
            list,
            remove,
            clean,
        } => {
            let cwd = current_dir()?;
            if list {
                let result = commands::assign::list(config_dir)?;
                output(&result, human);
            } else if remove {
                let result = commands::assign::unassign(config_dir, &args, &cwd)?;
                output(&result, human);
            } else if clean {
                let result = commands::assign::clean(config_dir)?;
                output(&result, human);
            } else {
                let result =
                    commands::assign::assign(config_dir, &args, &cwd, &GitCli::for_dir(&cwd))?;
                output(&result, human);
            }
        }

        Commands::Guard { command } => match command {
            GuardCommands::Install { force } => {
                let cwd = current_dir()?;
                let result = commands::guard::install(&cwd, force)?;
                output(&result, human);
            }
            GuardCommands::Uninstall => {
                let cwd = current_dir()?;
                let result = commands::guard::uninstall(&cwd)?;
                output(&result, human);
            }
            GuardCommands::Status => {
                let cwd = current_dir()?;
                let result = commands::guard::status(&cwd)?;
                output(&result, human);
            }
            GuardCommands::Test => {
                let cwd = current_dir()?;
                let result =
                    commands::guard::test(config_dir, &cwd, &GitCli::for_dir(&cwd), &GhCli)?;
                // Matched stays silent in human mode: the hook runs on every
                // commit and should not add noise to clean ones.
                if !(human && result.is_silent()) {
                    output(&result, human);
                }
                return Ok(result.exit_code());
            }
        },

        Commands::TestSsh { user, quiet } => {
            let cwd = current_dir()?;
            let result = commands::ssh::test_ssh(
                config_dir,
                user.as_deref(),
                &GitCli::for_dir(&cwd),
                prober,
            )?;
            if !quiet {
                output(&result, human);
            }
            return Ok(result.exit_code());
        }
    }

    Ok(0)
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Serialize the command for audit logging. Values that could be sensitive
/// (key paths) are logged by presence, not content.
fn serialize_command(command: &Commands) -> (String, serde_json::Value) {
    match command {
        Commands::Add {
            username,
            email,
            ssh_key,
            signing_key,
            host,
            auto_sign,
            ..
        } => (
            "add".to_string(),
            serde_json::json!({
                "username": username,
                "email": email,
                "ssh_key": ssh_key.is_some(),
                "signing_key": signing_key.is_some(),
                "host": host,
                "auto_sign": auto_sign
            }),
        ),
        Commands::Remove { user } => ("remove".to_string(), serde_json::json!({ "user": user })),
        Commands::Edit { user, field, .. } => (
            "edit".to_string(),
            serde_json::json!({ "user": user, "field": field }),
        ),
        Commands::List => ("list".to_string(), serde_json::json!({})),
        Commands::Show { user } => ("show".to_string(), serde_json::json!({ "user": user })),
        Commands::Status => ("status".to_string(), serde_json::json!({})),
        Commands::Switch { user } => ("switch".to_string(), serde_json::json!({ "user": user })),
        Commands::Assign {
            args,
            list,
            remove,
            clean,
        } => (
            "assign".to_string(),
            serde_json::json!({ "args": args, "list": list, "remove": remove, "clean": clean }),
        ),
        Commands::Guard { command } => match command {
            GuardCommands::Install { force } => (
                "guard install".to_string(),
                serde_json::json!({ "force": force }),
            ),
            GuardCommands::Uninstall => ("guard uninstall".to_string(), serde_json::json!({})),
            GuardCommands::Status => ("guard status".to_string(), serde_json::json!({})),
            GuardCommands::Test => ("guard test".to_string(), serde_json::json!({})),
        },
        Commands::TestSsh { user, quiet } => (
            "test-ssh".to_string(),
            serde_json::json!({ "user": user, "quiet": quiet }),
        ),
    }
}
