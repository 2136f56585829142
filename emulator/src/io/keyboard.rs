use std::sync::Arc;

use common::constants::{KBDR, KBSR};

use crate::io::console::Console;
use crate::io::MmioHandler;

// Key-available bit of KBSR.
const KBSR_READY: u16 = 0x8000;

/// Memory-mapped keyboard. A read of KBSR polls the console: on success
/// the status/data pair publishes the key until the next poll, on
/// failure status drops to zero and data keeps the last key. KBDR reads
/// never consume input.
pub struct Keyboard {
    console: Arc<dyn Console>,
    status: u16,
    data: u16,
}

impl Keyboard {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Keyboard {
            console,
            status: 0,
            data: 0,
        }
    }
}

impl MmioHandler for Keyboard {
    fn read_word(&mut self, addr: u16) -> u16 {
        match addr {
            KBSR => {
                match self.console.poll_byte() {
                    Some(ch) => {
                        self.status = KBSR_READY;
                        self.data = ch as u16;
                    }
                    None => self.status = 0,
                }
                self.status
            }
            KBDR => self.data,
            _ => panic!("keyboard doesn't handle address {addr:#06x}"),
        }
    }

    fn write_word(&mut self, addr: u16, val: u16) {
        // Stores land in the pair but the next KBSR read overwrites them.
        match addr {
            KBSR => self.status = val,
            KBDR => self.data = val,
            _ => panic!("keyboard doesn't handle address {addr:#06x}"),
        }
    }

    fn default_addrs(&self) -> &[u16] {
        &[KBSR, KBDR]
    }
}
