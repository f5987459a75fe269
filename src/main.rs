use anyhow::{anyhow, Result};
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use scriptorium::build::build_site;
use scriptorium::config::Config;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = App::new("scriptorium")
        .version(crate_version!())
        .about("Builds a static site from Markdown documents")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders the source directory into the output directory")
                .arg(
                    Arg::with_name("config")
                        .long("config")
                        .value_name("FILE")
                        .takes_value(true)
                        .help(
                            "The project file (default: scriptorium.yaml in this or any \
                             parent directory)",
                        ),
                )
                .arg(
                    Arg::with_name("source")
                        .long("source")
                        .value_name("DIR")
                        .takes_value(true)
                        .help("Overrides the source directory"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .value_name("DIR")
                        .takes_value(true)
                        .help("Overrides the output directory"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(args)) => build(args),
        (name, _) => Err(anyhow!("Unknown command `{}`", name)),
    }
}

fn build(args: &ArgMatches) -> Result<()> {
    let mut config = match args.value_of("config") {
        Some(path) => Config::from_project_file(Path::new(path))?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };
    if let Some(source) = args.value_of("source") {
        config.set_source_directory(PathBuf::from(source));
    }
    if let Some(output) = args.value_of("output") {
        config.output_directory = PathBuf::from(output);
    }

    build_site(&config)?;
    info!(output = %config.output_directory.display(), "site built");
    Ok(())
}
