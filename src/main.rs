use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{bail, Context, Result};

use morae::{compile_with, to_records, to_yaml, Environment};

const USAGE: &str = "Usage: morae [options] [INPUT]";

enum Format {
    Records,
    Yaml,
}

struct Args {
    input_path: Option<String>,
    output_path: Option<String>,
    config_path: Option<String>,
    format: Format,
}

fn get_args() -> Result<Option<Args>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut opts = getopts::Options::new();
    opts.optopt("c", "config", "YAML file with initial settings", "CONFIG");
    opts.optopt("f", "format", "output format: records (default) or yaml", "FORMAT");
    opts.optopt("o", "output", "write to OUTPUT instead of stdout", "OUTPUT");
    opts.optflag("h", "help", "print this help");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => bail!(f),
    };
    if matches.opt_present("h") {
        print!("{}", opts.usage(USAGE));
        return Ok(None);
    }

    let format = match matches.opt_str("f").as_deref() {
        None | Some("records") => Format::Records,
        Some("yaml") => Format::Yaml,
        Some(other) => bail!("unknown format '{}'", other),
    };
    if matches.free.len() > 1 {
        bail!("{}", opts.usage(USAGE));
    }

    Ok(Some(Args {
        input_path: matches.free.first().cloned(),
        output_path: matches.opt_str("o"),
        config_path: matches.opt_str("c"),
        format,
    }))
}

fn run() -> Result<()> {
    let Some(args) = get_args()? else {
        return Ok(());
    };

    let env = match &args.config_path {
        Some(path) => Environment::load(path)?,
        None => Environment::default(),
    };

    let source = match &args.input_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Error reading file '{}'", path))?,
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("Error reading standard input")?;
            source
        }
    };

    let morae = compile_with(&source, env)?;
    log::info!("compiled {} morae", morae.len());

    let out = match args.format {
        Format::Records => to_records(&morae),
        Format::Yaml => to_yaml(&morae).context("Error serializing morae")?,
    };

    match &args.output_path {
        Some(path) => {
            fs::write(path, &out).with_context(|| format!("Error writing to '{}'", path))?;
            log::info!("wrote {} morae to {}", morae.len(), path);
        }
        None => print!("{}", out),
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Compilation error: {:#}", e);
        process::exit(1);
    }
}
