pub mod emulator;
pub mod emulator_state;
pub mod io;

pub use emulator::{Emulator, EmulatorError, ExecRet, ImageError, ReservedPolicy};
pub use emulator_state::EmulatorState;
pub use io::MmioHandler;
