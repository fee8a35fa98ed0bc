use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::io;
use std::path::PathBuf;

use ndstore::config::{load_store_config, StoreConfig};
use ndstore_cli::commands::{exit_code, run_copy, run_export, run_info};

fn selection_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("dataset")
                .short('d')
                .long("dataset")
                .help("Dataset to read. Defaults to the first dataset in the file.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("slice_dim")
                .long("slice-dim")
                .help("Dimension to take a single index of. Negative reads the whole dataset.")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("slice_index")
                .long("slice-index")
                .help("Index along --slice-dim to read.")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("transpose")
                .short('t')
                .long("transpose")
                .help("Reverse the dimension order after reading.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a JSON configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
}

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("NDSTORE_LOG", "error,ndstore=info"))
        .init();

    let matches = Command::new("ndstore")
        .version(clap::crate_version!())
        .about("Inspect, slice and export dense arrays stored in ndstore containers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("info")
                .about("List the datasets of a container with their shapes and value ranges")
                .arg(
                    Arg::new("input")
                        .help("Path to the container (a Zarr hierarchy directory)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(selection_args(
            Command::new("export")
                .about("Write a dataset, or one slice of it, as delimited text")
                .arg(
                    Arg::new("input")
                        .help("Path to the container (a Zarr hierarchy directory)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path of the text file to write. Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("delimiter")
                        .long("delimiter")
                        .help("Field delimiter (single ASCII character). Defaults to tab.")
                        .value_parser(clap::value_parser!(char)),
                )
                .arg(
                    Arg::new("precision")
                        .long("precision")
                        .help("Digits after the decimal point.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("header")
                        .long("header")
                        .help("Write a header row.")
                        .action(ArgAction::SetTrue),
                ),
        ))
        .subcommand(selection_args(
            Command::new("copy")
                .about("Copy a dataset, or one slice of it, into another container")
                .arg(
                    Arg::new("input")
                        .help("Path to the source container")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .help("Path to the destination container")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Dataset name in the destination. Defaults to the source name.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("append")
                        .short('a')
                        .long("append")
                        .help("Add to an existing destination instead of recreating it.")
                        .action(ArgAction::SetTrue),
                ),
        ))
        .get_matches();

    let result = match matches.subcommand() {
        Some(("info", sub_m)) => handle_info(sub_m),
        Some(("export", sub_m)) => handle_export(sub_m),
        Some(("copy", sub_m)) => handle_copy(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Builds the configuration from an optional JSON file, then applies flags.
fn config_from_arguments(matches: &ArgMatches) -> Result<StoreConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[ndstore] Using config: {:?}", path);
            load_store_config(path)?
        }
        None => StoreConfig::default(),
    };

    if let Some(dataset) = matches.get_one::<String>("dataset") {
        config.dataset = Some(dataset.clone());
    }
    if let Some(&dim) = matches.get_one::<i64>("slice_dim") {
        config.slice_dim = dim;
    }
    if let Some(&index) = matches.get_one::<i64>("slice_index") {
        config.slice_index = index;
    }
    if matches.get_flag("transpose") {
        config.transpose = true;
    }
    log::debug!(
        "[ndstore] Effective config:\n{}",
        serde_json::to_string_pretty(&config).unwrap_or_default()
    );
    Ok(config)
}

fn handle_info(matches: &ArgMatches) -> Result<()> {
    let input: &PathBuf = matches.get_one("input").unwrap();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_info(input, &mut out)
}

fn handle_export(matches: &ArgMatches) -> Result<()> {
    let input: &PathBuf = matches.get_one("input").unwrap();
    let output: Option<&PathBuf> = matches.get_one("output_file");
    let mut config = config_from_arguments(matches)?;

    if let Some(&delimiter) = matches.get_one::<char>("delimiter") {
        config.export.delimiter = delimiter;
    }
    if let Some(&precision) = matches.get_one::<usize>("precision") {
        config.export.precision = Some(precision);
    }
    if matches.get_flag("header") {
        config.export.header = true;
    }

    run_export(input, output.map(PathBuf::as_path), &config)
}

fn handle_copy(matches: &ArgMatches) -> Result<()> {
    let input: &PathBuf = matches.get_one("input").unwrap();
    let output: &PathBuf = matches.get_one("output").unwrap();
    let name = matches.get_one::<String>("name").map(String::as_str);
    let mut config = config_from_arguments(matches)?;

    if matches.get_flag("append") {
        config.append = true;
    }

    run_copy(input, output, name, &config)
}
