use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Byte-oriented console shared by the trap routines and the keyboard
/// device. Output is unframed raw bytes.
pub trait Console: Send + Sync {
    fn write_byte(&self, val: u8) -> io::Result<()>;

    /// Block until a byte arrives.
    fn read_byte(&self) -> io::Result<u8>;

    /// Bounded-wait poll. Consumes at most one byte.
    fn poll_byte(&self) -> Option<u8>;
}

////////////////////////////////////////////////////////////////////////////////

// How long a keyboard poll may wait before reporting "no key".
const POLL_TIMEOUT: Duration = Duration::from_millis(2);

/// Stdin/stdout console. Input is drained by a reader thread feeding a
/// channel, so polls never block on the kernel read. The thread is
/// spawned on first input request; output-only programs never take
/// ownership of stdin.
pub struct StdConsole {
    input: Mutex<Option<Receiver<u8>>>,
}

impl StdConsole {
    pub fn new() -> Self {
        StdConsole {
            input: Mutex::new(None),
        }
    }

    fn with_input<T>(&self, f: impl FnOnce(&Receiver<u8>) -> T) -> T {
        let mut guard = self.input.lock().unwrap();
        let rx = guard.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let mut stdin = io::stdin().lock();
                let mut buf = [0u8; 1];
                while stdin.read_exact(&mut buf).is_ok() {
                    if tx.send(buf[0]).is_err() {
                        break;
                    }
                }
            });
            rx
        });
        f(rx)
    }
}

impl Console for StdConsole {
    fn write_byte(&self, val: u8) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(&[val])?;
        out.flush()
    }

    fn read_byte(&self) -> io::Result<u8> {
        self.with_input(|rx| rx.recv())
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
    }

    fn poll_byte(&self) -> Option<u8> {
        self.with_input(|rx| rx.recv_timeout(POLL_TIMEOUT)).ok()
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// In-memory console for tests and embedding.
#[derive(Default)]
pub struct PipeConsole {
    in_buf: Mutex<VecDeque<u8>>,
    out_buf: Mutex<VecDeque<u8>>,
}

impl PipeConsole {
    pub fn push_input(&self, val: u8) {
        self.in_buf.lock().unwrap().push_back(val);
    }

    pub fn write_input(&self, vals: &[u8]) {
        for val in vals {
            self.push_input(*val);
        }
    }

    pub fn take_output(&self) -> VecDeque<u8> {
        std::mem::take(&mut self.out_buf.lock().unwrap())
    }

    /// Drain the output buffer as a string.
    pub fn output_string(&self) -> String {
        let mut buf = self.take_output();
        buf.make_contiguous();
        String::from_utf8_lossy(buf.as_slices().0).into_owned()
    }
}

impl Console for PipeConsole {
    fn write_byte(&self, val: u8) -> io::Result<()> {
        self.out_buf.lock().unwrap().push_back(val);
        Ok(())
    }

    fn read_byte(&self) -> io::Result<u8> {
        self.in_buf
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "input pipe empty"))
    }

    fn poll_byte(&self) -> Option<u8> {
        self.in_buf.lock().unwrap().pop_front()
    }
}
