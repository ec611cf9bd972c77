//! Toolchain output streams

use std::io::{self, Read};
use std::process::{ChildStderr, ChildStdout};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Source of output from a monitored process
///
/// Implementations must not block for long in `read_available`; the
/// poller relies on the read/sleep cycle to observe its stop signal
/// promptly.
pub trait OutputStream: Send {
    /// Read whatever output is available right now into `buf`.
    /// Returns `Ok(0)` when nothing is available yet.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// False once the producing process has gone away. The poller exits
    /// quietly when this turns false; it never reports a failure itself.
    fn is_alive(&self) -> bool;
}

/// Output stream over the stdout/stderr pipes of a spawned toolchain
///
/// Owns only the pipe ends; the `Child` itself stays with the export
/// driver, which waits on it and decides the session outcome.
pub struct ChildOutputStream {
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    stdout_done: bool,
    stderr_done: bool,
}

impl ChildOutputStream {
    /// Wrap the pipes taken from a spawned child. On Unix the pipes are
    /// switched to non-blocking so reads honor the short-block contract.
    pub fn new(stdout: ChildStdout, stderr: Option<ChildStderr>) -> io::Result<Self> {
        #[cfg(unix)]
        {
            set_nonblocking(stdout.as_raw_fd())?;
            if let Some(stderr) = &stderr {
                set_nonblocking(stderr.as_raw_fd())?;
            }
        }

        let stderr_done = stderr.is_none();
        Ok(Self {
            stdout,
            stderr,
            stdout_done: false,
            stderr_done,
        })
    }
}

impl OutputStream for ChildOutputStream {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.stdout_done {
            match read_pipe(&mut self.stdout, buf) {
                Ok(PipeRead::Data(n)) => return Ok(n),
                Ok(PipeRead::Eof) => self.stdout_done = true,
                Ok(PipeRead::Empty) => {}
                Err(err) => {
                    self.stdout_done = true;
                    return Err(err);
                }
            }
        }

        if let Some(stderr) = &mut self.stderr {
            if !self.stderr_done {
                match read_pipe(stderr, buf) {
                    Ok(PipeRead::Data(n)) => return Ok(n),
                    Ok(PipeRead::Eof) => self.stderr_done = true,
                    Ok(PipeRead::Empty) => {}
                    Err(err) => {
                        self.stderr_done = true;
                        return Err(err);
                    }
                }
            }
        }

        Ok(0)
    }

    fn is_alive(&self) -> bool {
        // Both pipes at EOF means the process closed them, which for a
        // toolchain run means it exited.
        !(self.stdout_done && self.stderr_done)
    }
}

enum PipeRead {
    Data(usize),
    Empty,
    Eof,
}

fn read_pipe(pipe: &mut impl Read, buf: &mut [u8]) -> io::Result<PipeRead> {
    match pipe.read(buf) {
        Ok(0) => Ok(PipeRead::Eof),
        Ok(n) => Ok(PipeRead::Data(n)),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(PipeRead::Empty),
        Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(PipeRead::Empty),
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn set_nonblocking(fd: std::os::unix::io::RawFd) -> io::Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, OFlag};

    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(io::Error::from)?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(io::Error::from)?;

    Ok(())
}
