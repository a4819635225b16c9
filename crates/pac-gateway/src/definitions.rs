// definitions.rs — Scaffolding and listing of definition documents.
//
// Definition and assignment files are plain JSON written into the standard
// folder layout under the definitions root. This is deliberately simple
// I/O glue: the automation module, not this server, interprets the files.

use std::fs;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use pac_plan::ResourceCategory;

use crate::config::PacConfig;
use crate::error::GatewayError;

/// Base URL for the schema references embedded in scaffolded documents.
pub const SCHEMA_BASE: &str =
    "https://raw.githubusercontent.com/Azure/enterprise-azure-policy-as-code/main/Schemas";

/// Parameters for `pac_create_policy_definition`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PolicyDefinitionParams {
    /// Unique policy name (GUID or short identifier).
    pub name: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Policy description.
    pub description: String,
    /// Policy category (e.g. "Storage", "Security").
    pub category: String,
    /// JSON string of the policyRule object (the if/then block).
    pub policy_rule: String,
    /// Policy mode — "All", "Indexed", or a resource provider mode.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// JSON string of parameter definitions.
    #[serde(default = "default_json_object")]
    pub parameters: String,
}

fn default_mode() -> String {
    "All".to_string()
}

fn default_json_object() -> String {
    "{}".to_string()
}

/// Parameters for `pac_create_policy_assignment`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PolicyAssignmentParams {
    /// Short name for the assignment (used in the resource name).
    pub assignment_name: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Description of what this assignment does.
    pub description: String,
    /// The policy definition name (GUID for built-in, or custom name).
    pub policy_name: String,
    /// Target scope — management group, subscription, or resource group ID.
    pub scope: String,
    /// JSON string of parameter values to pass to the policy.
    #[serde(default = "default_json_object")]
    pub parameters: String,
    /// "Default" (enforce) or "DoNotEnforce" (audit only).
    #[serde(default = "default_enforcement_mode")]
    pub enforcement_mode: String,
    /// Optional output filename; defaults to the assignment name.
    #[serde(default)]
    pub filename: Option<String>,
}

fn default_enforcement_mode() -> String {
    "Default".to_string()
}

/// Scaffold a custom policy definition file under
/// `policyDefinitions/<category>/<name>.jsonc`. Returns the path written.
pub fn write_policy_definition(
    config: &PacConfig,
    params: &PolicyDefinitionParams,
) -> Result<PathBuf, GatewayError> {
    let rule: Value = serde_json::from_str(&params.policy_rule)
        .map_err(|source| GatewayError::InvalidJson {
            field: "policy_rule",
            source,
        })?;
    let parameters: Value = serde_json::from_str(&params.parameters)
        .map_err(|source| GatewayError::InvalidJson {
            field: "parameters",
            source,
        })?;

    let document = json!({
        "$schema": format!("{SCHEMA_BASE}/policy-definition-schema.json"),
        "name": params.name,
        "type": "Microsoft.Authorization/policyDefinitions",
        "properties": {
            "displayName": params.display_name,
            "policyType": "Custom",
            "mode": params.mode,
            "description": params.description,
            "metadata": {
                "version": "1.0.0",
                "category": params.category,
            },
            "parameters": parameters,
            "policyRule": rule,
        },
    });

    let dir = config
        .category_dir(ResourceCategory::Definitions)
        .join(&params.category);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.jsonc", params.name));
    fs::write(&path, serde_json::to_string_pretty(&document)?)?;
    tracing::info!(path = %path.display(), "scaffolded policy definition");
    Ok(path)
}

/// Scaffold an assignment tree document under `policyAssignments/`.
/// The scope is keyed by the configured environment selector.
pub fn write_policy_assignment(
    config: &PacConfig,
    params: &PolicyAssignmentParams,
) -> Result<PathBuf, GatewayError> {
    let parameters: Value = serde_json::from_str(&params.parameters)
        .map_err(|source| GatewayError::InvalidJson {
            field: "parameters",
            source,
        })?;

    let mut document = json!({
        "$schema": format!("{SCHEMA_BASE}/policy-assignment-schema.json"),
        "nodeName": format!("/{}/", params.assignment_name),
        "scope": {
            (config.pac_selector.as_str()): [params.scope],
        },
        "definitionEntry": {
            "policyName": params.policy_name,
            "displayName": params.display_name,
        },
        "assignment": {
            "name": params.assignment_name,
            "displayName": params.display_name,
            "description": params.description,
        },
        "parameters": parameters,
    });

    // enforcementMode is only written when it deviates from the default.
    if params.enforcement_mode != "Default" {
        document["enforcementMode"] = Value::String(params.enforcement_mode.clone());
    }

    let dir = config.category_dir(ResourceCategory::Assignments);
    fs::create_dir_all(&dir)?;
    let file_stem = params.filename.as_deref().unwrap_or(&params.assignment_name);
    let path = dir.join(format!("{file_stem}.jsonc"));
    fs::write(&path, serde_json::to_string_pretty(&document)?)?;
    tracing::info!(path = %path.display(), "scaffolded policy assignment");
    Ok(path)
}

/// List definition files (`*.json` / `*.jsonc`) for one category, as sorted
/// paths relative to the definitions root. A missing folder is an empty
/// list, not an error.
pub fn list_definition_files(
    config: &PacConfig,
    category: ResourceCategory,
) -> Result<Vec<String>, GatewayError> {
    let folder = config.category_dir(category);
    if !folder.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = folder.join("**").join("*.json*");
    let paths = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| GatewayError::Io(std::io::Error::other(e)))?;

    let mut files: Vec<String> = paths
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .map(|p| {
            p.strip_prefix(&config.definitions_root)
                .unwrap_or(&p)
                .display()
                .to_string()
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> (PacConfig, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = PacConfig {
            definitions_root: dir.path().to_path_buf(),
            pac_selector: "epac-dev".to_string(),
            ..PacConfig::default()
        };
        (config, dir)
    }

    fn definition_params() -> PolicyDefinitionParams {
        PolicyDefinitionParams {
            name: "deny-public-blob".to_string(),
            display_name: "Deny public blob access".to_string(),
            description: "Blocks public access on storage accounts".to_string(),
            category: "Storage".to_string(),
            policy_rule: r#"{"if": {"field": "type", "equals": "Microsoft.Storage/storageAccounts"}, "then": {"effect": "deny"}}"#.to_string(),
            mode: default_mode(),
            parameters: default_json_object(),
        }
    }

    #[test]
    fn definition_lands_in_category_subfolder() {
        let (config, _dir) = test_config();
        let path = write_policy_definition(&config, &definition_params()).unwrap();
        assert!(path.ends_with("policyDefinitions/Storage/deny-public-blob.jsonc"));

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["properties"]["policyType"], "Custom");
        assert_eq!(written["properties"]["mode"], "All");
        assert_eq!(written["properties"]["metadata"]["category"], "Storage");
        assert_eq!(written["properties"]["policyRule"]["then"]["effect"], "deny");
    }

    #[test]
    fn bad_policy_rule_names_the_field() {
        let (config, _dir) = test_config();
        let mut params = definition_params();
        params.policy_rule = "{nope".to_string();
        let err = write_policy_definition(&config, &params).unwrap_err();
        assert!(err.to_string().contains("policy_rule"));
    }

    fn assignment_params() -> PolicyAssignmentParams {
        PolicyAssignmentParams {
            assignment_name: "deny-blob-prod".to_string(),
            display_name: "Deny public blobs (prod)".to_string(),
            description: "Applies the blob policy to production".to_string(),
            policy_name: "deny-public-blob".to_string(),
            scope: "/providers/Microsoft.Management/managementGroups/prod".to_string(),
            parameters: default_json_object(),
            enforcement_mode: default_enforcement_mode(),
            filename: None,
        }
    }

    #[test]
    fn assignment_scope_is_keyed_by_selector() {
        let (config, _dir) = test_config();
        let path = write_policy_assignment(&config, &assignment_params()).unwrap();
        assert!(path.ends_with("policyAssignments/deny-blob-prod.jsonc"));

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["nodeName"], "/deny-blob-prod/");
        assert_eq!(
            written["scope"]["epac-dev"][0],
            "/providers/Microsoft.Management/managementGroups/prod"
        );
        // Default enforcement mode is implied, not written.
        assert!(written.get("enforcementMode").is_none());
    }

    #[test]
    fn non_default_enforcement_mode_is_written() {
        let (config, _dir) = test_config();
        let mut params = assignment_params();
        params.enforcement_mode = "DoNotEnforce".to_string();
        let path = write_policy_assignment(&config, &params).unwrap();
        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["enforcementMode"], "DoNotEnforce");
    }

    #[test]
    fn filename_override_controls_the_file_stem() {
        let (config, _dir) = test_config();
        let mut params = assignment_params();
        params.filename = Some("custom-name".to_string());
        let path = write_policy_assignment(&config, &params).unwrap();
        assert!(path.ends_with("policyAssignments/custom-name.jsonc"));
    }

    #[test]
    fn listing_is_recursive_sorted_and_relative() {
        let (config, _dir) = test_config();
        write_policy_definition(&config, &definition_params()).unwrap();
        let mut second = definition_params();
        second.name = "audit-tls".to_string();
        second.category = "Network".to_string();
        write_policy_definition(&config, &second).unwrap();

        let files = list_definition_files(&config, ResourceCategory::Definitions).unwrap();
        assert_eq!(
            files,
            vec![
                "policyDefinitions/Network/audit-tls.jsonc".to_string(),
                "policyDefinitions/Storage/deny-public-blob.jsonc".to_string(),
            ]
        );
    }

    #[test]
    fn missing_category_folder_lists_empty() {
        let (config, _dir) = test_config();
        let files = list_definition_files(&config, ResourceCategory::Exemptions).unwrap();
        assert!(files.is_empty());
    }
}
