//! Tabula - command-line front end for the spreadsheet core.

use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;
use tabula_core::{CellRef, CellUpdate, Config, DataType, Document, TabulaError};

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS] [SNAPSHOT]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [SNAPSHOT]                JSON snapshot to load");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <ADDR=TEXT>     Commit TEXT to ADDR; '=' starts a formula (repeatable)");
    eprintln!("  -t, --type <ADDR=TYPE>    Declare ADDR as text, number, date or auto (repeatable)");
    eprintln!("  -p, --print <ADDR>        Print the computed value of ADDR (repeatable)");
    eprintln!("  -o, --output <FILE>       Write the resulting snapshot to FILE");
    eprintln!("  --config <FILE>           Read configuration from FILE");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -h, --help                Print help");
}

/// Edits applied in command-line order.
enum Edit {
    Set(String, String),
    Type(String, DataType),
}

struct Args {
    snapshot: Option<PathBuf>,
    edits: Vec<Edit>,
    prints: Vec<String>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    no_config: bool,
}

enum Parsed {
    Run(Args),
    Help,
}

fn parse_args(args: &[String]) -> Result<Parsed> {
    let mut parsed = Args {
        snapshot: None,
        edits: Vec::new(),
        prints: Vec::new(),
        output: None,
        config: None,
        no_config: false,
    };

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = |name: &str| -> Result<String> {
            i += 1;
            match args.get(i) {
                Some(v) => Ok(v.clone()),
                None => bail!("{} requires a value", name),
            }
        };
        match arg {
            "-h" | "--help" => return Ok(Parsed::Help),
            "-s" | "--set" => {
                let edit = value("--set")?;
                let Some((addr, text)) = edit.split_once('=') else {
                    bail!("--set expects ADDR=TEXT, got '{}'", edit);
                };
                parsed
                    .edits
                    .push(Edit::Set(addr.trim().to_string(), text.to_string()));
            }
            "-t" | "--type" => {
                let edit = value("--type")?;
                let Some((addr, name)) = edit.split_once('=') else {
                    bail!("--type expects ADDR=TYPE, got '{}'", edit);
                };
                let data_type = name.parse::<DataType>().map_err(|e| anyhow!(e))?;
                parsed
                    .edits
                    .push(Edit::Type(addr.trim().to_string(), data_type));
            }
            "-p" | "--print" => parsed.prints.push(value("--print")?),
            "-o" | "--output" => parsed.output = Some(PathBuf::from(value("--output")?)),
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--no-config" => parsed.no_config = true,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                if parsed.snapshot.is_some() {
                    bail!("Unexpected argument: {}", other);
                }
                parsed.snapshot = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }
    Ok(Parsed::Run(parsed))
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabula")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Config::load(path).with_context(|| format!("reading {}", path.display()))
        }
        None => match user_config_path() {
            Some(path) => {
                log::debug!("looking for config at {}", path.display());
                Config::load(&path).with_context(|| format!("reading {}", path.display()))
            }
            None => Ok(Config::default()),
        },
    }
}

fn parse_cell(addr: &str) -> Result<CellRef> {
    CellRef::parse(addr).with_context(|| format!("bad address '{}'", addr))
}

fn run(args: Args) -> Result<()> {
    let config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_ref())?
    };
    let mut doc = Document::with_file(args.snapshot.clone(), config)
        .context("loading snapshot")?;

    for edit in &args.edits {
        match edit {
            Edit::Set(addr, text) => {
                let cell_ref = parse_cell(addr)?;
                let is_formula = text.starts_with('=');
                match doc.commit_edit(&cell_ref, text, is_formula) {
                    Ok(_) => {}
                    Err(TabulaError::Rejected(reason)) => bail!("{}: {}", cell_ref, reason),
                    Err(err) => return Err(err.into()),
                }
            }
            Edit::Type(addr, data_type) => {
                doc.update_cell(&parse_cell(addr)?, CellUpdate::DataType(*data_type));
            }
        }
    }

    if args.prints.is_empty() {
        for (cell_ref, value) in doc.filled_cells() {
            println!("{}: {}", cell_ref, value);
        }
    } else {
        for addr in &args.prints {
            println!("{}", doc.display(&parse_cell(addr)?));
        }
    }

    if let Some(output) = &args.output {
        doc.save_file_as(output)
            .with_context(|| format!("writing {}", output.display()))?;
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let parsed = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };
    let args = match parsed {
        Parsed::Help => {
            print_usage();
            return;
        }
        Parsed::Run(args) => args,
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
