//! Local process execution backend

use async_process::Stdio;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use futures_lite::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::launcher::Launcher;
use crate::process::CapturedOutput;

/// Launcher for executing processes locally
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLauncher;

#[async_trait]
impl Launcher for LocalLauncher {
    async fn output(&self, command: &Command) -> Result<CapturedOutput> {
        let program = command.get_program().to_string_lossy().into_owned();

        let mut async_cmd = command.prepare();
        async_cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = async_cmd
            .spawn()
            .map_err(|e| Error::from_spawn_io(program.as_str(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::spawn_failed(program.as_str(), "stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::spawn_failed(program.as_str(), "stderr was not captured"))?;

        // Interleave both pipes line by line, the way a shared pipe would.
        let mut lines = std::pin::pin!(stream::select(
            raw_lines(BufReader::new(stdout)),
            raw_lines(BufReader::new(stderr)),
        ));

        let mut output = Vec::new();
        while let Some(line) = lines.next().await {
            output.extend_from_slice(&line?);
        }

        let status = child.status().await?;
        Ok(CapturedOutput {
            status: status.into(),
            output,
        })
    }
}

/// Lines of `reader`, each ending in `\n` unless it is an unterminated last line
fn raw_lines<R>(reader: R) -> impl Stream<Item = std::io::Result<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    stream::try_unfold(reader, next_line)
}

async fn next_line<R>(mut reader: R) -> std::io::Result<Option<(Vec<u8>, R)>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some((line, reader)))
}

// Convenience constructor for Executor with LocalLauncher
impl Executor<LocalLauncher> {
    /// Create an executor for local process execution
    pub fn local(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LocalLauncher)
    }
}
