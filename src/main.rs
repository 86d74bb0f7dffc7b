use clap::Parser;
use siebns::NsFile;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "siebnsfix",
    version,
    about = "Fix the size checksum in a Siebel Gateway naming file"
)]
struct Cli {
    /// Path to the naming server backing file (e.g. siebns.dat)
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage and parse errors alike exit with status 1.
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    let mut ns = match NsFile::open(&cli.file) {
        Ok(ns) => ns,
        Err(err) => {
            eprintln!("{}: {}", cli.file.display(), err);
            return ExitCode::FAILURE;
        }
    };

    if ns.is_header_correct() {
        println!("file {}:  OK:  no correction needed.", ns.name());
        return ExitCode::SUCCESS;
    }

    println!("file {}:  correction needed.", ns.name());
    match ns.fix_size() {
        Ok(wrote) => {
            println!("file {}:  OK: updated {} bytes.", ns.name(), wrote);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error writing to file:  {}", err);
            ExitCode::FAILURE
        }
    }
}
