// resolver.rs — PATH lookup for the external binaries the server drives.
//
// Resolution happens fresh on every call. A long-lived server must notice
// PATH changes between invocations, so there is deliberately no cache here.

use std::path::PathBuf;

use crate::error::ExecError;

/// A logical command and the executable names that can satisfy it,
/// in priority order.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Human-readable name used in error messages.
    pub name: &'static str,
    /// Candidate executable names, tried in order.
    pub candidates: &'static [&'static str],
    /// Remediation hint shown when no candidate resolves.
    pub hint: &'static str,
}

/// PowerShell 7+, the interpreter the policy-as-code automation module
/// runs under.
pub const SHELL_INTERPRETER: CommandSpec = CommandSpec {
    name: "PowerShell 7+ (pwsh)",
    candidates: &["pwsh", "pwsh.exe"],
    hint: "Install from https://aka.ms/powershell",
};

/// Azure CLI, used for read-only policy catalog queries.
pub const CLOUD_CLI: CommandSpec = CommandSpec {
    name: "Azure CLI (az)",
    candidates: &["az", "az.cmd"],
    hint: "Install from https://aka.ms/azure-cli",
};

/// Locate the first candidate for `spec` on PATH.
pub fn resolve(spec: &CommandSpec) -> Result<PathBuf, ExecError> {
    for candidate in spec.candidates {
        if let Ok(path) = which::which(candidate) {
            tracing::debug!(command = spec.name, path = %path.display(), "resolved binary");
            return Ok(path);
        }
    }
    Err(ExecError::ToolNotFound {
        name: spec.name,
        hint: spec.hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_reports_tool_not_found() {
        let spec = CommandSpec {
            name: "Imaginary Tool",
            candidates: &["definitely-not-a-real-binary-xyz"],
            hint: "Install it from nowhere",
        };
        let err = resolve(&spec).unwrap_err();
        assert!(matches!(err, ExecError::ToolNotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("Imaginary Tool"));
        assert!(msg.contains("Install it from nowhere"));
    }

    #[test]
    fn falls_back_through_candidates_in_order() {
        // "sh" exists on every unix box; the bogus name before it must be skipped.
        let spec = CommandSpec {
            name: "POSIX shell",
            candidates: &["definitely-not-a-real-binary-xyz", "sh"],
            hint: "unreachable",
        };
        let path = resolve(&spec).unwrap();
        assert!(path.ends_with("sh"));
    }
}
