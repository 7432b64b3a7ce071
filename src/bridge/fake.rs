//! Scripted stand-in for the bridge tool, used by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::executor::{BridgeOutput, CommandRunner};
use crate::error::BridgeError;

#[derive(Debug, Default)]
pub struct FakeBridge {
    replies: HashMap<String, BridgeOutput>,
    calls: Mutex<Vec<String>>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(args: &[String]) -> String {
        args.join("\u{1f}")
    }

    /// Script the output and exit code of one exact invocation.
    pub fn exit(mut self, args: &[&str], output: &str, code: i32) -> Self {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.replies.insert(
            Self::key(&args),
            BridgeOutput {
                text: output.to_string(),
                code: Some(code),
            },
        );
        self
    }

    pub fn reply(self, args: &[&str], output: &str) -> Self {
        self.exit(args, output, 0)
    }

    pub fn fail(self, args: &[&str], message: &str) -> Self {
        self.exit(args, message, 1)
    }

    pub fn shell(self, command: &str, output: &str) -> Self {
        self.reply(&["shell", command], output)
    }

    pub fn shell_err(self, command: &str, message: &str) -> Self {
        self.fail(&["shell", command], message)
    }

    pub fn shell_exit(self, command: &str, output: &str, code: i32) -> Self {
        self.exit(&["shell", command], output, code)
    }

    /// Every invocation so far, arguments joined by spaces.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CommandRunner for FakeBridge {
    fn execute(&self, args: &[String]) -> Result<BridgeOutput, BridgeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.join(" "));
        }
        self.replies
            .get(&Self::key(args))
            .cloned()
            .ok_or_else(|| BridgeError::CommandFailed {
                command: args.join(" "),
                message: "unscripted command".to_string(),
            })
    }
}
