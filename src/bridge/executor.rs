use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, trace};

use crate::error::BridgeError;

/// What one bridge invocation printed, and how it exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutput {
    pub text: String,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl BridgeOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// The text on a zero exit, `CommandFailed` otherwise.
    pub fn into_result(self, args: &[String]) -> Result<String, BridgeError> {
        if self.success() {
            return Ok(self.text);
        }
        Err(BridgeError::CommandFailed {
            command: args.join(" "),
            message: failure_message(&self.text, self.code),
        })
    }
}

/// Anything that can run the bridge tool with an argument list and hand back
/// its combined text output.
pub trait CommandRunner: Send + Sync {
    /// Run the bridge and report its output whatever the exit status.
    fn execute(&self, args: &[String]) -> Result<BridgeOutput, BridgeError>;

    /// Like [`CommandRunner::execute`], but a non-zero exit is an error.
    fn run(&self, args: &[String]) -> Result<String, BridgeError> {
        self.execute(args)?.into_result(args)
    }

    /// Run a command string through the device shell.
    fn shell(&self, command: &str) -> Result<String, BridgeError> {
        self.run(&shell_args(command))
    }

    /// Device shell command whose output is wanted even on a non-zero exit,
    /// e.g. `ls -la` over a folder with one unreadable child.
    fn shell_lenient(&self, command: &str) -> Result<BridgeOutput, BridgeError> {
        self.execute(&shell_args(command))
    }
}

fn shell_args(command: &str) -> Vec<String> {
    vec!["shell".to_string(), command.to_string()]
}

/// Runs the real `adb` executable, one synchronous child process per call.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    adb_path: PathBuf,
}

impl AdbBridge {
    pub fn new(adb_path: impl Into<PathBuf>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }
}

impl CommandRunner for AdbBridge {
    fn execute(&self, args: &[String]) -> Result<BridgeOutput, BridgeError> {
        if !self.adb_path.exists() {
            return Err(BridgeError::ExecutableNotFound(self.adb_path.clone()));
        }

        debug!("adb {}", args.join(" "));

        let output = Command::new(&self.adb_path)
            .args(args)
            .output()
            .map_err(|source| BridgeError::ProcessStart {
                path: self.adb_path.clone(),
                source,
            })?;

        // stderr follows all of stdout, not interleaved line by line
        let mut bytes = output.stdout;
        bytes.extend_from_slice(&output.stderr);
        let text = String::from_utf8(bytes).map_err(|_| BridgeError::OutputDecode)?;
        trace!("adb output ({:?}): {}", output.status.code(), text.trim_end());

        Ok(BridgeOutput {
            text,
            code: output.status.code(),
        })
    }
}

fn failure_message(text: &str, code: Option<i32>) -> String {
    let text = text.trim();
    match (text.is_empty(), code) {
        (false, _) => text.to_string(),
        (true, Some(code)) => format!("exited with status {}", code),
        (true, None) => "terminated by signal".to_string(),
    }
}
