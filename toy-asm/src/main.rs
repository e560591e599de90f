#[macro_use]
extern crate clap;

use clap::Arg;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use toy::ToyAssemblyError;

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Assembly(ToyAssemblyError),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Assembly(err) => write!(f, "Assembling input failed: {}", err),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the assembly source file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the machine-language file to write to"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");

    if let Err(err) = tasm(input, output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn tasm(input: &str, output: Option<&str>) -> Result<(), Error> {
    let input_path = Path::new(input);

    let mut source = String::new();
    File::open(input_path)
        .and_then(|mut f| f.read_to_string(&mut source))
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    let program = toy_asm::assemble(&source).map_err(Error::Assembly)?;

    let output_path: PathBuf = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("tmc"));

    let mut text = format!("pc: {:02X}\n", program.pc_start);
    for (addr, &word) in program.words.iter().enumerate() {
        if word != 0 {
            text.push_str(&format!("{:02X}: {:04X}\n", addr, word));
        }
    }

    File::create(&output_path)
        .and_then(|mut f| f.write_all(text.as_bytes()))
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path))?;

    Ok(())
}
