//! Analyzer backed by an external program.
//!
//! The program receives `{"grammar": "...", "code": "..."}` on stdin and must
//! print the analyzer response on stdout and exit successfully.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use peglint_core::{Analyzer, AnalyzerError};

/// Runs one process per analysis.
#[derive(Debug, Clone)]
pub(crate) struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub(crate) fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Analyzer for CommandAnalyzer {
    fn lint(&mut self, grammar: &str, code: &str) -> Result<String, AnalyzerError> {
        let request = serde_json::json!({ "grammar": grammar, "code": code }).to_string();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AnalyzerError::with_source(format!("failed to run analyzer '{}'", self.program), e)
            })?;

        // The child may fill stdout before it has read all of stdin.
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(request.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output = output.map_err(|e| {
            AnalyzerError::with_source(format!("analyzer '{}' did not finish", self.program), e)
        })?;

        if output.status.success() {
            // A program may answer without consuming all of its input.
            if let Err(e) = written
                && e.kind() != io::ErrorKind::BrokenPipe
            {
                return Err(AnalyzerError::with_source(
                    format!("failed to send request to analyzer '{}'", self.program),
                    e,
                ));
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalyzerError::new(format!(
                "analyzer '{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            AnalyzerError::with_source(
                format!("analyzer '{}' wrote non-UTF-8 output", self.program),
                e,
            )
        })
    }
}
