use std::fs::File;
use std::io::{self, stderr, stdout, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;

use super::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to keep reading a killed tool's output before giving up on it.
const KILL_GRACE: Duration = Duration::from_secs(2);

type ReadResult = io::Result<Vec<u8>>;

/// What a finished subprocess left behind.
#[derive(Debug)]
pub struct Captured {
    /// `None` if the process was killed after `timeout`
    pub status: Option<ExitStatus>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run a subprocess, teeing stdout and stderr into `out_file` and `err_file`
/// (and to our own stdout/stderr if `echo` is set) while keeping a copy of each.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(
    tool: &'static str,
    cmd: &mut Command,
    out_file: File,
    err_file: File,
    echo: bool,
    timeout: Option<Duration>,
) -> Result<Captured, Error> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    // With a deadline, the tool gets its own process group so that anything
    // it starts can be killed along with it. Without one, it stays in ours
    // and receives Ctrl-C from the terminal.
    #[cfg(unix)]
    if timeout.is_some() {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::ToolNotFound {
            tool,
            program: program.clone(),
            source,
        })?;

    let child_out = child.stdout.take().ok_or(Error::NoPipe(tool))?;
    let child_err = child.stderr.take().ok_or(Error::NoPipe(tool))?;

    let out_rx = spawn_reader(move || communicate(child_out, out_file, echo.then(stdout)));
    let err_rx = spawn_reader(move || communicate(child_err, err_file, echo.then(stderr)));

    let status = wait(&mut child, timeout).map_err(|source| Error::Io {
        tool,
        action: "waiting on child process",
        source,
    })?;

    // a killed tool's descendants may still hold the pipes open:
    let grace = status.is_none().then_some(KILL_GRACE);
    let stdout = receive(tool, &out_rx, grace)?;
    let stderr = receive(tool, &err_rx, grace)?;

    match status {
        Some(status) => log::debug!("{tool} ({program}) finished with {status}"),
        None => eprintln!("{} {tool} after {:?}", "Killed".red(), timeout.unwrap_or_default()),
    }

    Ok(Captured {
        status,
        stdout,
        stderr,
    })
}

/// Wait for `child` to exit. With a timeout, poll until the deadline and then
/// kill its process group, returning `None`.
fn wait(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill(child)?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the tool's whole process group.
#[cfg(unix)]
fn kill(child: &mut Child) -> io::Result<()> {
    let Ok(group) = libc::pid_t::try_from(child.id()) else {
        return child.kill();
    };
    // SAFETY: only sends a signal. The group id is the child's pid, set at
    // spawn, and the child hasn't been reaped yet so the id can't be reused.
    if unsafe { libc::killpg(group, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn kill(child: &mut Child) -> io::Result<()> {
    child.kill()
}

fn spawn_reader<F>(read: F) -> Receiver<ReadResult>
where
    F: FnOnce() -> ReadResult + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // the receiver is gone if we stopped waiting for this output
        let _ = tx.send(read());
    });
    rx
}

/// Collect one reader's output. With a `grace` period, output that hasn't
/// finished by then is abandoned; it is still in the log file.
fn receive(
    tool: &'static str,
    rx: &Receiver<ReadResult>,
    grace: Option<Duration>,
) -> Result<Vec<u8>, Error> {
    let read = match grace {
        None => rx.recv().map_err(|_| Error::ReaderThread(tool))?,
        Some(grace) => match rx.recv_timeout(grace) {
            Ok(read) => read,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("{tool}: output still open {grace:?} after kill; not waiting for it");
                return Ok(Vec::new());
            }
            Err(RecvTimeoutError::Disconnected) => return Err(Error::ReaderThread(tool)),
        },
    };
    read.map_err(|source| Error::Io {
        tool,
        action: "communicating with child process",
        source,
    })
}

fn communicate<R: Read, W: Write>(
    mut stream: R,
    mut file: File,
    mut output: Option<W>,
) -> io::Result<Vec<u8>> {
    let mut captured = Vec::with_capacity(4096);
    let mut buf = [0u8; 1024];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        file.write_all(buf)?;
        if let Some(output) = output.as_mut() {
            output.write_all(buf)?;
        }
        captured.extend_from_slice(buf);
    }

    Ok(captured)
}
