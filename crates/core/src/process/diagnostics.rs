//! Bounded capture of a child's diagnostic output.

use std::collections::VecDeque;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::task::JoinHandle;

const TRUNCATION_MARKER: &str = "[earlier output truncated]";

/// Keeps the most recent lines of diagnostic output within a byte budget.
///
/// Tools like yt-dlp and ffmpeg can print progress for hours; only the tail
/// is useful when reporting a failure.
#[derive(Debug)]
pub struct DiagnosticBuffer {
    lines: VecDeque<String>,
    bytes: usize,
    max_bytes: usize,
    truncated: bool,
}

impl DiagnosticBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            max_bytes,
            truncated: false,
        }
    }

    pub fn push(&mut self, line: &str) {
        let mut line = line.trim_end().to_string();
        if line.is_empty() {
            return;
        }
        if line.len() > self.max_bytes {
            let mut cut = line.len() - self.max_bytes;
            while !line.is_char_boundary(cut) {
                cut += 1;
            }
            line = line[cut..].to_string();
            self.truncated = true;
        }

        self.bytes += line.len();
        self.lines.push_back(line);

        while self.bytes > self.max_bytes {
            match self.lines.pop_front() {
                Some(dropped) => {
                    self.bytes -= dropped.len();
                    self.truncated = true;
                }
                None => break,
            }
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        let mut out = String::with_capacity(self.bytes + self.lines.len() + 32);
        if self.truncated {
            out.push_str(TRUNCATION_MARKER);
            out.push('\n');
        }
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }
}

/// Spawns a task draining `reader` into a bounded buffer.
///
/// The reader must always be drained: a child blocked on a full stderr pipe
/// never exits. Reads are capped at `max_bytes`, so a tool that never
/// prints a newline cannot grow memory; carriage returns (progress meters)
/// separate lines too.
pub fn capture_diagnostics<R>(reader: R, max_bytes: usize) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = DiagnosticBuffer::new(max_bytes);
        let mut reader = BufReader::new(reader);
        let limit = max_bytes.max(1) as u64;
        let mut chunk = Vec::new();
        loop {
            chunk.clear();
            match (&mut reader).take(limit).read_until(b'\n', &mut chunk).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&chunk);
                    for line in text.split('\r') {
                        buffer.push(line);
                    }
                }
                Err(e) => {
                    tracing::debug!("Diagnostic output read failed: {}", e);
                    let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                    break;
                }
            }
        }
        buffer.into_string()
    })
}
