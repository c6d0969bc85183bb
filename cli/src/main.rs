//! as240: command-line front end for the 240 assembler

use std::fs;

use anyhow::{Context, Result};
use as240::{AsmError, Assembler240};
use clap::Parser;
use spdlog::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-pass assembler for the 240 ISA")]
struct Cli {
    /// Assembly source; `.asm` is appended when the name has no extension
    asm_file: String,

    /// Memory image output
    #[arg(short, long, value_name = "MEM_FILE", default_value = "memory.hex")]
    mfile: String,

    /// Listing output (default: <base>.list)
    #[arg(short, long, value_name = "LIST_FILE")]
    listfile: Option<String>,

    /// Symbol table output; not written unless given
    #[arg(short, long, value_name = "SYM_FILE", visible_alias = "symbolfile")]
    symfile: Option<String>,

    /// Print the listing to stdout instead of a file
    #[arg(short = 'o')]
    stdout: bool,

    /// Log everything, down to per-line trace
    #[arg(short, long)]
    verbose: bool,
}

/// `prog` -> (`prog.asm`, `prog`), `dir/prog.s` -> (`dir/prog.s`, `dir/prog`)
fn source_names(arg: &str) -> (String, String) {
    match arg.rfind('.') {
        Some(dot) => (arg.to_string(), arg[..dot].to_string()),
        None => (format!("{}.asm", arg), arg.to_string()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        spdlog::default_logger().set_level_filter(spdlog::LevelFilter::All);
    }

    let (asm_file, base) = source_names(&cli.asm_file);
    let list_file = cli.listfile.clone().unwrap_or_else(|| format!("{}.list", base));
    info!("assembling {}", asm_file);

    let src = fs::read_to_string(&asm_file).with_context(|| format!("cannot read {}", asm_file))?;

    let mut assembler = Assembler240::new();
    let out = match assembler.assemble(&src) {
        Ok(out) => out,
        Err(AsmError::Rejected { errors, aborted }) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            if aborted {
                eprintln!("Too many errors, assembly stopped.");
            }
            eprintln!("{} error(s), no output written", errors.len());
            std::process::exit(errors.len() as i32);
        }
        Err(e) => return Err(e.into()),
    };

    if cli.stdout {
        out.print_assembly_listing();
    } else {
        out.save_listing(&list_file).with_context(|| format!("cannot write {}", list_file))?;
        info!("listing saved to {}", list_file);
    }

    out.save_memory_image(&cli.mfile).with_context(|| format!("cannot write {}", cli.mfile))?;
    info!("memory image saved to {}", cli.mfile);

    if let Some(sym) = &cli.symfile {
        out.save_symbols(sym).with_context(|| format!("cannot write {}", sym))?;
        info!("symbol table saved to {}", sym);
    }

    debug!("{} words, {} labels", out.words().len(), out.symbols().len());
    Ok(())
}
