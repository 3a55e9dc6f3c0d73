//! Output capture for engine child processes.
//!
//! Exec output goes through one pipe shared by stdout and stderr so the
//! interleaving the user would see on a terminal is preserved.

use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::unix::pipe;
use tokio::process::Command;

use super::ExecLimits;

const CHUNK_SIZE: usize = 8 * 1024;

/// Keeps the last `cap` bytes written to it.
#[derive(Debug)]
pub(crate) struct TailBuffer {
    buf: Vec<u8>,
    cap: usize,
    dropped: bool,
}

impl TailBuffer {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            buf: Vec::new(),
            cap: cap.max(1),
            dropped: false,
        }
    }

    /// The buffer may grow to twice `cap` before old bytes are dropped, so
    /// each byte is moved at most once.
    pub(crate) fn push(&mut self, data: &[u8]) {
        if data.len() >= self.cap {
            self.dropped |= self.buf.len() + data.len() > self.cap;
            self.buf.clear();
            self.buf.extend_from_slice(&data[data.len() - self.cap..]);
            return;
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= 2 * self.cap {
            self.compact();
        }
    }

    fn compact(&mut self) {
        if self.buf.len() > self.cap {
            let excess = self.buf.len() - self.cap;
            self.buf.drain(..excess);
            self.dropped = true;
        }
    }

    pub(crate) fn into_parts(mut self) -> (Vec<u8>, bool) {
        self.compact();
        (self.buf, self.dropped)
    }
}

/// Outcome of [`run_merged`].
pub(crate) struct MergedOutput {
    pub output: TailBuffer,
    /// `None` when the timeout fired and the process was killed.
    pub status: Option<ExitStatus>,
}

/// Spawn `cmd` with stdout and stderr on one pipe and collect its output.
pub(crate) async fn run_merged(mut cmd: Command, limits: &ExecLimits) -> io::Result<MergedOutput> {
    let (reader, writer) = nix::unistd::pipe().map_err(io::Error::from)?;
    let writer_err = writer.try_clone()?;

    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(writer_err))
        .kill_on_drop(true);
    let mut child = cmd.spawn()?;
    // The command still owns the parent's copies of the write end; the
    // reader only sees EOF once those are closed.
    drop(cmd);

    let mut receiver = pipe::Receiver::from_owned_fd(reader)?;
    let mut output = TailBuffer::new(limits.max_output_bytes);

    let collect = async {
        drain_into(&mut receiver, &mut output).await?;
        child.wait().await
    };

    let status = match limits.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, collect).await {
            Ok(status) => Some(status?),
            Err(_) => None,
        },
        None => Some(collect.await?),
    };

    if status.is_none() {
        child.start_kill()?;
        let _ = child.wait().await;
    }

    Ok(MergedOutput { output, status })
}

async fn drain_into<R>(reader: &mut R, output: &mut TailBuffer) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        output.push(&chunk[..n]);
    }
}

/// Read at most `limit` bytes. Returns `None` if the stream holds more.
pub(crate) async fn read_bounded<R>(reader: R, limit: u64) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut buf).await?;
    if buf.len() as u64 > limit {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tail_buffer_keeps_most_recent_bytes() {
        let mut tail = TailBuffer::new(4);
        tail.push(b"abc");
        tail.push(b"def");
        let (buf, dropped) = tail.into_parts();
        assert_eq!(buf, b"cdef");
        assert!(dropped);
    }

    #[test]
    fn tail_buffer_keeps_tail_across_many_small_writes() {
        let mut tail = TailBuffer::new(10);
        for i in 0..1000u32 {
            tail.push(format!("{:03}|", i).as_bytes());
        }
        let (buf, dropped) = tail.into_parts();
        assert_eq!(buf, b"7|998|999|");
        assert!(dropped);
    }

    #[test]
    fn tail_buffer_oversized_write_keeps_its_end() {
        let mut tail = TailBuffer::new(4);
        tail.push(b"ab");
        tail.push(b"0123456789");
        let (buf, dropped) = tail.into_parts();
        assert_eq!(buf, b"6789");
        assert!(dropped);
    }

    #[test]
    fn tail_buffer_exact_fit_is_not_dropped() {
        let mut tail = TailBuffer::new(4);
        tail.push(b"abcd");
        let (buf, dropped) = tail.into_parts();
        assert_eq!(buf, b"abcd");
        assert!(!dropped);
    }

    #[test]
    fn tail_buffer_under_cap_is_untouched() {
        let mut tail = TailBuffer::new(16);
        tail.push(b"hello");
        let (buf, dropped) = tail.into_parts();
        assert_eq!(buf, b"hello");
        assert!(!dropped);
    }

    #[tokio::test]
    async fn read_bounded_rejects_oversized_input() {
        let data: &[u8] = b"0123456789";
        assert_eq!(read_bounded(data, 10).await.unwrap(), Some(data.to_vec()));
        assert_eq!(read_bounded(data, 9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn run_merged_interleaves_stdout_and_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let merged = run_merged(cmd, &ExecLimits::default()).await.unwrap();
        let status = merged.status.unwrap();
        assert_eq!(status.code(), Some(3));
        let (buf, _) = merged.output.into_parts();
        assert_eq!(String::from_utf8_lossy(&buf), "out\nerr\n");
    }

    #[tokio::test]
    async fn run_merged_kills_on_timeout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo started; sleep 30"]);
        let limits = ExecLimits {
            timeout: Some(Duration::from_millis(300)),
            max_output_bytes: 1024,
        };
        let merged = run_merged(cmd, &limits).await.unwrap();
        assert!(merged.status.is_none());
        let (buf, _) = merged.output.into_parts();
        assert_eq!(String::from_utf8_lossy(&buf), "started\n");
    }
}
