use std::sync::Arc;

use common::constants::PC_START;
use lc3_emu::io::console::PipeConsole;
use lc3_emu::Emulator;

/// Emulator over a pipe console with `words` loaded at the user-program
/// base, ready to run.
pub fn load(words: &[u16]) -> (Emulator, Arc<PipeConsole>) {
    let console = Arc::new(PipeConsole::default());
    let mut emu = Emulator::with_console(console.clone());
    emu.load_words(PC_START, words);
    (emu, console)
}

/// Load and run to halt. The program must not need console input.
pub fn run(words: &[u16]) -> Emulator {
    let (mut emu, _console) = load(words);
    emu.run().expect("program failed");
    emu
}
