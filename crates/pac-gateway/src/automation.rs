// automation.rs — Invocations of the policy-as-code automation module.
//
// The module runs under PowerShell, so its two operations are the one place
// a command string exists at all. Configured values are embedded only via
// ps_quote (single quotes, embedded quotes doubled); everything else —
// interpreter flags, the script itself — travels as a structured argv
// through pac-exec, never through a shell.

use std::path::Path;
use std::time::Duration;

use crate::config::PacConfig;

/// Well-known module name used when no override path is configured.
const MODULE_NAME: &str = "EnterprisePolicyAsCode";

/// Wall-clock limit for plan builds and deployments.
pub const MODULE_TIMEOUT: Duration = Duration::from_secs(600);

/// Wall-clock limit for read-only cloud CLI queries.
pub const CLI_TIMEOUT: Duration = Duration::from_secs(120);

/// Quote a value for embedding in a PowerShell command. Single-quoted
/// strings are literal in PowerShell; the only escape is doubling an
/// embedded single quote.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn ps_quote_path(path: &Path) -> String {
    ps_quote(&path.to_string_lossy())
}

fn import_clause(config: &PacConfig) -> String {
    match &config.module_path {
        Some(path) => format!("Import-Module {} -Force; ", ps_quote_path(path)),
        None => format!("Import-Module {MODULE_NAME} -Force; "),
    }
}

/// Script for the "build plans" operation: diff the definitions against the
/// target environment and write `*-plan.json` artifacts into `output`.
pub fn build_plans_script(config: &PacConfig, output: &Path) -> String {
    format!(
        "{}Build-DeploymentPlans -PacEnvironmentSelector {} -DefinitionsRootFolder {} -OutputFolder {}",
        import_clause(config),
        ps_quote(&config.pac_selector),
        ps_quote_path(&config.definitions_root),
        ps_quote_path(output),
    )
}

/// Script for the "deploy plan" operation: apply the previously generated
/// plan in `input`, non-interactively.
pub fn deploy_plan_script(config: &PacConfig, input: &Path) -> String {
    format!(
        "{}Deploy-PolicyPlan -PacEnvironmentSelector {} -DefinitionsRootFolder {} -InputFolder {} -Interactive $false",
        import_clause(config),
        ps_quote(&config.pac_selector),
        ps_quote_path(&config.definitions_root),
        ps_quote_path(input),
    )
}

/// Interpreter argv for running `script`: flags and script as separate
/// arguments, handed straight to the spawn primitive.
pub fn interpreter_args(script: String) -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
        script,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config() -> PacConfig {
        PacConfig {
            definitions_root: PathBuf::from("/policies/Definitions"),
            pac_selector: "epac-dev".to_string(),
            ..PacConfig::default()
        }
    }

    #[test]
    fn build_script_imports_module_by_name_by_default() {
        let script = build_plans_script(&test_config(), Path::new("/tmp/out"));
        assert!(script.starts_with("Import-Module EnterprisePolicyAsCode -Force; "));
        assert!(script.contains("Build-DeploymentPlans"));
        assert!(script.contains("-PacEnvironmentSelector 'epac-dev'"));
        assert!(script.contains("-DefinitionsRootFolder '/policies/Definitions'"));
        assert!(script.contains("-OutputFolder '/tmp/out'"));
    }

    #[test]
    fn module_path_override_is_imported_instead() {
        let mut config = test_config();
        config.module_path = Some(PathBuf::from("/opt/epac/module.psd1"));
        let script = build_plans_script(&config, Path::new("/tmp/out"));
        assert!(script.starts_with("Import-Module '/opt/epac/module.psd1' -Force; "));
    }

    #[test]
    fn deploy_script_is_non_interactive() {
        let script = deploy_plan_script(&test_config(), Path::new("/tmp/out"));
        assert!(script.contains("Deploy-PolicyPlan"));
        assert!(script.contains("-InputFolder '/tmp/out'"));
        assert!(script.ends_with("-Interactive $false"));
    }

    #[test]
    fn embedded_single_quotes_are_doubled() {
        let mut config = test_config();
        config.pac_selector = "it's-prod".to_string();
        let script = build_plans_script(&config, Path::new("/tmp/out"));
        assert!(script.contains("-PacEnvironmentSelector 'it''s-prod'"));
    }

    #[test]
    fn interpreter_args_keep_script_as_one_argument() {
        let args = interpreter_args("Get-Date".to_string());
        assert_eq!(args, vec!["-NoProfile", "-NonInteractive", "-Command", "Get-Date"]);
    }
}
