use tracing::debug;

use super::executor::{BridgeOutput, CommandRunner};
use super::shell::shell_safe;
use crate::error::{BridgeError, SessionError};

/// Upper bound on resolution rounds; `readlink -f` settles in one or two.
const MAX_RESOLVE_ROUNDS: usize = 32;

/// Follow symlinks on the device until `readlink -f` reports a fixed point.
///
/// Empty output, or output equal to the candidate, ends the walk. `readlink`
/// exits non-zero without printing anything for paths it cannot resolve;
/// that is a fixed point too. A non-zero exit that did print something, or
/// a bridge failure, aborts resolution; the last good candidate is only logged.
pub fn resolve_remote_path(
    runner: &dyn CommandRunner,
    initial_path: &str,
) -> Result<String, SessionError> {
    let mut candidate = initial_path.to_string();

    for _ in 0..MAX_RESOLVE_ROUNDS {
        let command = format!("readlink -f {}", shell_safe(&candidate));
        let output = match runner
            .shell_lenient(&command)
            .and_then(|output| lenient_readlink(output, &command))
        {
            Ok(output) => output,
            Err(source) => {
                debug!("resolution of {} stopped at {}", initial_path, candidate);
                return Err(SessionError::PathResolution {
                    path: initial_path.to_string(),
                    source,
                });
            }
        };

        if output.is_empty() || output == candidate {
            debug!("Resolved device path: {} -> {}", initial_path, candidate);
            return Ok(candidate);
        }
        candidate = output;
    }

    Err(SessionError::PathResolution {
        path: initial_path.to_string(),
        source: BridgeError::CommandFailed {
            command: "readlink -f".to_string(),
            message: format!("no fixed point after {} rounds", MAX_RESOLVE_ROUNDS),
        },
    })
}

fn lenient_readlink(output: BridgeOutput, command: &str) -> Result<String, BridgeError> {
    let text = output.text.trim().to_string();
    if output.success() || text.is_empty() {
        return Ok(text);
    }
    output.into_result(&["shell".to_string(), command.to_string()])
}
