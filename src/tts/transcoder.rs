//! External audio transcoder process.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::TtsConfig;
use crate::tts::TtsError;

/// Runs a transcoder that reads audio on stdin and writes the result to stdout.
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
    args: Vec<String>,
}

impl Transcoder {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &TtsConfig) -> Self {
        Self::new(config.transcoder_program.clone(), config.transcoder_args.clone())
    }

    /// Pipe `input` through the transcoder and collect its stdout.
    ///
    /// A non-zero exit fails with the process's stderr as the message.
    pub async fn transcode(&self, input: Vec<u8>) -> Result<Vec<u8>, TtsError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TtsError::Transcoder(format!("failed to spawn {}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TtsError::Transcoder("stdin was not captured".to_string()))?;

        // Written concurrently so a full stdout pipe cannot deadlock the child.
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(program = %self.program, status = %output.status, stderr = %stderr, "Transcoder failed");
            return Err(TtsError::Transcoder(stderr));
        }

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(TtsError::Io(e)),
            Err(e) => return Err(TtsError::Transcoder(format!("stdin writer task failed: {}", e))),
        }

        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passthrough_program_returns_stdout() {
        let transcoder = Transcoder::new("cat", vec![]);
        let input = vec![7u8; 256 * 1024];
        let output = transcoder.transcode(input.clone()).await.unwrap();
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn non_zero_exit_surfaces_stderr() {
        let transcoder = Transcoder::new(
            "sh",
            vec!["-c".into(), "cat >/dev/null; echo 'Invalid data found' >&2; exit 1".into()],
        );
        let err = transcoder.transcode(b"RIFF".to_vec()).await.unwrap_err();
        match err {
            TtsError::Transcoder(msg) => assert_eq!(msg, "Invalid data found"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let transcoder = Transcoder::new("definitely-not-a-transcoder", vec![]);
        assert!(matches!(transcoder.transcode(vec![]).await, Err(TtsError::Transcoder(_))));
    }
}
