use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use paneld::commands;

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("PATH")
        .help("Config file (defaults to <config dir>/paneld/config.json)")
}

fn metrics_arg() -> Arg {
    Arg::new("metrics")
        .short('m')
        .long("metrics")
        .value_name("PATH")
        .help("JSON file with the current metrics")
}

fn build_cli() -> Command {
    Command::new("paneld")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Trigger-driven layout and redraw controller for e-paper panels")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue)
        )
        .subcommand(
            Command::new("run")
                .about("Run the controller loop")
                .arg(config_arg())
                .arg(metrics_arg().required(true))
                .arg(
                    Arg::new("frame-out")
                        .short('o')
                        .long("frame-out")
                        .value_name("PATH")
                        .help("Write each presented frame as JSON to this file")
                )
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Override daemon.updateIntervalSecs")
                        .value_parser(clap::value_parser!(u64).range(1..))
                )
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Run a single cycle and exit")
                        .action(ArgAction::SetTrue)
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Log dispatches instead of writing frames")
                        .action(ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("check")
                .about("Validate the configuration and show what it declares")
                .arg(config_arg())
        )
        .subcommand(
            Command::new("eval")
                .about("Evaluate a single condition")
                .arg(
                    Arg::new("condition")
                        .help("Condition, e.g. \"precipitationNow > 0 OR forecastPrecip2h >= 0.2\"")
                        .required(true)
                        .index(1)
                )
                .arg(metrics_arg())
                .arg(
                    Arg::new("set")
                        .short('s')
                        .long("set")
                        .value_name("KEY=VALUE")
                        .help("Supply or override a variable (repeatable)")
                        .action(ArgAction::Append)
                )
                .arg(config_arg().help("Config whose declared variables and fallbacks apply"))
        )
        .subcommand(
            Command::new("resolve")
                .about("Show the layout and modules the current metrics select")
                .arg(config_arg())
                .arg(metrics_arg().required(true))
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate completions for")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .index(1)
                )
        )
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    paneld::init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run::execute(sub_matches)?,
        Some(("check", sub_matches)) => commands::check::execute(sub_matches)?,
        Some(("eval", sub_matches)) => commands::eval::execute(sub_matches)?,
        Some(("resolve", sub_matches)) => commands::resolve::execute(sub_matches)?,
        Some(("completions", sub_matches)) => {
            let mut cli = build_cli();
            commands::completions::execute(sub_matches, &mut cli)?;
        }
        _ => {
            println!("paneld {}", env!("CARGO_PKG_VERSION"));
            println!("Use 'paneld --help' for more information.");
        }
    }

    Ok(())
}
