#[macro_use]
extern crate clap;

use clap::{Arg, ArgGroup};
use std::fs;
use std::path::Path;
use toy::{Machine, StdIo};

#[derive(Debug)]
enum Error {
    Io(std::io::Error, String),
    Assembly(toy::ToyAssemblyError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, path) => write!(f, "reading \"{}\" failed: {}", path, err),
            Error::Assembly(err) => write!(f, "{}", err),
        }
    }
}

/// Not a REPL: no breakpoints, no single-stepping, no interactive disassembly.
/// Just assemble-or-load, then run to completion against real stdio.
fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("SOURCE")
                .help("Sets the assembly source file to assemble and run")
                .index(1),
        )
        .arg(
            Arg::with_name("machine_language")
                .short("m")
                .long("machine-language")
                .takes_value(true)
                .value_name("SNAPSHOT")
                .help("Sets a machine-language snapshot file to load and run"),
        )
        .group(
            ArgGroup::with_name("input")
                .args(&["SOURCE", "machine_language"])
                .required(true),
        )
        .get_matches();

    let result = match matches.value_of("SOURCE") {
        Some(path) => run_source(path),
        None => run_snapshot(matches.value_of("machine_language").unwrap()),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run_source(path: &str) -> Result<(), Error> {
    let source = read_file(path)?;
    let program = toy_asm::assemble(&source).map_err(Error::Assembly)?;

    let mut machine = Machine::new();
    machine.load_program(&program.words, program.pc_start);

    let mut io = StdIo::new();
    machine.run(&mut io);
    Ok(())
}

fn run_snapshot(path: &str) -> Result<(), Error> {
    let text = read_file(path)?;
    let mut machine = toy::load_machine_language(&text).map_err(Error::Assembly)?;

    let mut io = StdIo::new();
    machine.run(&mut io);
    Ok(())
}

fn read_file(path: &str) -> Result<String, Error> {
    fs::read_to_string(Path::new(path)).map_err(|err| Error::Io(err, path.to_string()))
}
