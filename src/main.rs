use hdml::*;

use anyhow::Context;
use clap::Parser;
use log::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A source file, or a netlist previously written as `.json`.
    filename: String,

    /// Print the truth table of this gate instead of the netlist.
    #[arg(long)]
    table: Option<String>,

    /// Print this gate as a Graphviz digraph instead of the netlist.
    #[arg(long, conflicts_with = "table")]
    dot: Option<String>,

    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let netlist = if args.filename.ends_with(".json") {
        let text = std::fs::read_to_string(&args.filename)
            .with_context(|| format!("Couldn't read {}", args.filename))?;
        Netlist::from_json(&text).with_context(|| format!("Invalid netlist: {}", args.filename))?
    } else {
        match load_program_from_file(&args.filename) {
            Ok(program) => Netlist::from(&program),
            Err(errors) => {
                for error in &errors {
                    eprintln!("{}: {error}", error.loc());
                }
                eprintln!("Program has {} errors.", errors.len());
                std::process::exit(1);
            },
        }
    };

    if let Some(gate_name) = args.table {
        let table = analysis::truth_table(&netlist, &gate_name)?;
        print!("{table}");
    } else if let Some(gate_name) = args.dot {
        let gate = netlist.gate(&gate_name).ok_or_else(|| anyhow::anyhow!("Gate does not exist: {gate_name}"))?;
        print!("{}", gate.to_dot());
    } else {
        println!("{}", netlist.to_json()?);
    }
    Ok(())
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    use chrono::{DateTime, Utc};

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let now: DateTime<Utc> = Utc::now();
            out.finish(format_args!(
                "[{} {} {}] {}",
                now.format("%Y-%m-%dT%H:%M:%S%.fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let level = std::env::var("LEVEL").unwrap_or_default();

    if debug || level == "DEBUG" {
        dispatch = dispatch.level(LevelFilter::Debug);
    } else {
        dispatch = dispatch.level(LevelFilter::Info);
    }

    dispatch.apply()?;
    Ok(())
}
