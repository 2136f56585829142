use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use lc3_emu::{Emulator, ReservedPolicy};

use clap::Parser;

/// LC-3 emulator
#[derive(Parser)]
struct Args {
    /// Program image to execute
    image: String,

    /// Fail on the reserved RTI/RES encodings instead of skipping them
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let mut emu = Emulator::new();
    if args.strict {
        emu.set_reserved_policy(ReservedPolicy::Strict);
    }

    let file = match File::open(&args.image) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("{}: {err}", args.image);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = emu.load_image(BufReader::new(file)) {
        eprintln!("{}: {err}", args.image);
        return ExitCode::FAILURE;
    }

    // Execution always starts at the user-program base, regardless of
    // the image origin.
    match emu.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: {err}");
            ExitCode::FAILURE
        }
    }
}
