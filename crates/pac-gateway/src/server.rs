// server.rs — MCP gateway server for policy-as-code management.
//
// PacGatewayServer implements the rmcp ServerHandler trait, exposing the
// policy lifecycle as MCP tools. Configuration is an immutable snapshot
// taken at construction; the server holds no other state, so concurrent
// tool calls never contend on a lock.
//
// Tools (prefixed `pac_` for namespacing):
//   pac_search_policies          — keyword search over built-in policies
//   pac_create_policy_definition — scaffold a custom definition file
//   pac_create_policy_assignment — scaffold an assignment file
//   pac_list_definitions         — list definition files per category
//   pac_build_plan               — run the module's plan build
//   pac_deploy_plan              — apply the generated plan
//   pac_plan_summary             — bounded summary of the generated plan
//
// Result contract: every tool returns one JSON payload. Domain failures
// are `{ "error": ..., "details"? }` objects inside a successful MCP
// response; McpError is reserved for protocol-level faults.

use std::fs;
use std::path::{Path, PathBuf};

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use pac_exec::{ExecutionRequest, ExecutionResult, CLOUD_CLI, SHELL_INTERPRETER};
use pac_plan::{summarize, ChangePlanDocument, ResourceCategory};

use crate::automation;
use crate::config::{PacConfig, PLAN_FILENAME};
use crate::definitions::{self, PolicyAssignmentParams, PolicyDefinitionParams};
use crate::error::GatewayError;

/// Maximum policies returned by a catalog search.
const SEARCH_LIMIT: usize = 20;

/// Tail kept from stdout/stderr on a failed module run.
const FAILURE_TAIL_CHARS: usize = 2000;

/// Tail kept from stdout on a successful module run.
const SUMMARY_TAIL_CHARS: usize = 3000;

/// Preview kept when CLI output does not parse as JSON.
const RAW_PREVIEW_CHARS: usize = 500;

// ── Tool parameter types ─────────────────────────────────────────

/// Parameters for `pac_search_policies`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchPoliciesParams {
    /// Search term matched against policy display names and descriptions.
    pub keyword: String,
    /// Optional category filter (e.g. "Storage", "Security", "Network").
    #[serde(default)]
    pub category: Option<String>,
}

/// Parameters for `pac_list_definitions`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDefinitionsParams {
    /// One of "all", "policyDefinitions", "policySetDefinitions",
    /// "policyAssignments", "policyExemptions".
    #[serde(default = "default_definition_type")]
    pub definition_type: String,
}

fn default_definition_type() -> String {
    "all".to_string()
}

// ── MCP Server ───────────────────────────────────────────────────

/// The MCP gateway server. Holds the configuration snapshot and the
/// tool router.
pub struct PacGatewayServer {
    config: PacConfig,
    tool_router: ToolRouter<Self>,
}

// Tool definitions. Each `#[tool]` method becomes an MCP tool that an AI
// agent (or any MCP client) can call.
#[tool_router]
impl PacGatewayServer {
    /// Create a new gateway server over an immutable config snapshot.
    pub fn new(config: PacConfig) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }

    pub fn config(&self) -> &PacConfig {
        &self.config
    }

    // ── Discovery tools ──────────────────────────────────────

    #[tool(
        description = "Search built-in policy definitions by keyword, optionally filtered by category. Returns name, display name, description, and category for up to 20 matches."
    )]
    async fn pac_search_policies(
        &self,
        Parameters(params): Parameters<SearchPoliciesParams>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.search_policies(&params.keyword, params.category.as_deref()).await)
    }

    #[tool(
        description = "List existing definition files in the definitions folder, per resource category. definition_type is 'all' or one category key."
    )]
    fn pac_list_definitions(
        &self,
        Parameters(params): Parameters<ListDefinitionsParams>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.list_definitions(&params.definition_type))
    }

    // ── Authoring tools ──────────────────────────────────────

    #[tool(
        description = "Create a custom policy definition file in the definitions tree. policy_rule and parameters are JSON strings."
    )]
    fn pac_create_policy_definition(
        &self,
        Parameters(params): Parameters<PolicyDefinitionParams>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.create_policy_definition(&params))
    }

    #[tool(
        description = "Create a policy assignment file scoped to the configured environment selector. Use pac_search_policies first to find the policy name."
    )]
    fn pac_create_policy_assignment(
        &self,
        Parameters(params): Parameters<PolicyAssignmentParams>,
    ) -> Result<CallToolResult, McpError> {
        reply(self.create_policy_assignment(&params))
    }

    // ── Plan tools ───────────────────────────────────────────

    #[tool(
        description = "Build deployment plans: diff the definitions against the target environment and write plan files to the output folder."
    )]
    async fn pac_build_plan(&self) -> Result<CallToolResult, McpError> {
        reply(self.build_plan().await)
    }

    #[tool(
        description = "Summarize the generated policy plan: per-category change counts plus the first few new/update/delete items. Review this before deploying."
    )]
    fn pac_plan_summary(&self) -> Result<CallToolResult, McpError> {
        reply(self.plan_summary())
    }

    #[tool(
        description = "Deploy the generated policy plan to the target environment. WARNING: creates/updates/deletes real policy resources. Review pac_plan_summary first."
    )]
    async fn pac_deploy_plan(&self) -> Result<CallToolResult, McpError> {
        reply(self.deploy_plan().await)
    }

    // ── Business logic ───────────────────────────────────────

    async fn search_policies(
        &self,
        keyword: &str,
        category: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let cli = pac_exec::resolve(&CLOUD_CLI)?;
        let query = policy_search_query(keyword, category);
        let request = ExecutionRequest::new(
            cli,
            [
                "policy",
                "definition",
                "list",
                "--query",
                query.as_str(),
                "--output",
                "json",
            ],
        )
        .timeout(automation::CLI_TIMEOUT);
        let result = pac_exec::execute(&request).await?;

        if !result.success() {
            let message = if result.stderr.is_empty() {
                "policy search failed".to_string()
            } else {
                result.stderr
            };
            return Ok(json!({ "error": message }));
        }

        // The CLI is expected to print JSON; degrade to a raw preview
        // rather than failing the action when it does not.
        match serde_json::from_str::<Value>(&result.stdout) {
            Ok(Value::Array(policies)) => {
                let total = policies.len();
                let capped: Vec<Value> = policies.into_iter().take(SEARCH_LIMIT).collect();
                Ok(json!({ "count": total, "policies": capped }))
            }
            Ok(other) => Ok(json!({ "policies": other })),
            Err(_) => Ok(json!({
                "error": "failed to parse policy search results",
                "raw": truncate_chars(&result.stdout, RAW_PREVIEW_CHARS),
            })),
        }
    }

    fn list_definitions(&self, definition_type: &str) -> Result<Value, GatewayError> {
        let categories: Vec<ResourceCategory> = if definition_type == "all" {
            ResourceCategory::ALL.to_vec()
        } else {
            let category = ResourceCategory::from_key(definition_type).ok_or_else(|| {
                GatewayError::UnknownDefinitionType(definition_type.to_string())
            })?;
            vec![category]
        };

        let mut listing = serde_json::Map::new();
        for category in categories {
            let files = definitions::list_definition_files(&self.config, category)?;
            listing.insert(category.key().to_string(), json!(files));
        }
        Ok(Value::Object(listing))
    }

    fn create_policy_definition(
        &self,
        params: &PolicyDefinitionParams,
    ) -> Result<Value, GatewayError> {
        let path = definitions::write_policy_definition(&self.config, params)?;
        Ok(json!({
            "status": "created",
            "file": path.display().to_string(),
            "displayName": params.display_name,
        }))
    }

    fn create_policy_assignment(
        &self,
        params: &PolicyAssignmentParams,
    ) -> Result<Value, GatewayError> {
        let path = definitions::write_policy_assignment(&self.config, params)?;
        Ok(json!({
            "status": "created",
            "file": path.display().to_string(),
            "assignment_name": params.assignment_name,
            "policy": params.policy_name,
            "scope": params.scope,
        }))
    }

    async fn build_plan(&self) -> Result<Value, GatewayError> {
        self.require_valid_config()?;
        let output = self.prepare_output_folder()?;
        tracing::info!(output = %output.display(), "building deployment plans");

        let script = automation::build_plans_script(&self.config, &output);
        let result = self.run_module(script).await?;
        if !result.success() {
            return Ok(failure_payload(&result));
        }

        let plans = plan_artifacts(&output)?;
        Ok(json!({
            "status": "success",
            "plans_generated": plans,
            "output_folder": output.display().to_string(),
            "summary": success_summary(&result, "Plan completed (no output captured)"),
        }))
    }

    async fn deploy_plan(&self) -> Result<Value, GatewayError> {
        self.require_valid_config()?;
        let output = self.prepare_output_folder()?;
        self.require_plan_file(&output)?;
        tracing::info!(input = %output.display(), "deploying policy plan");

        let script = automation::deploy_plan_script(&self.config, &output);
        let result = self.run_module(script).await?;
        if !result.success() {
            return Ok(failure_payload(&result));
        }

        Ok(json!({
            "status": "deployed",
            "summary": success_summary(&result, "Deployment completed"),
        }))
    }

    fn plan_summary(&self) -> Result<Value, GatewayError> {
        let output = self.prepare_output_folder()?;
        let plan_file = self.require_plan_file(&output)?;

        let raw = fs::read_to_string(&plan_file)?;
        let document = ChangePlanDocument::from_json_str(&raw)?;
        let summary = summarize(&document);

        let mut payload = serde_json::to_value(&summary)?;
        payload["file"] = json!(plan_file.display().to_string());
        Ok(payload)
    }

    // ── Internals ────────────────────────────────────────────

    fn require_valid_config(&self) -> Result<(), GatewayError> {
        let violations = self.config.validate();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Configuration(violations))
        }
    }

    /// Create the output folder if needed and return its absolute path.
    fn prepare_output_folder(&self) -> Result<PathBuf, GatewayError> {
        fs::create_dir_all(&self.config.output_folder)?;
        Ok(self.config.output_folder.canonicalize()?)
    }

    fn require_plan_file(&self, output: &Path) -> Result<PathBuf, GatewayError> {
        let plan_file = output.join(PLAN_FILENAME);
        if plan_file.exists() {
            Ok(plan_file)
        } else {
            Err(GatewayError::MissingArtifact {
                artifact: PLAN_FILENAME,
                folder: output.display().to_string(),
                prerequisite: "pac_build_plan",
            })
        }
    }

    /// Resolve the shell interpreter (fresh, every call) and run one
    /// automation module operation under the module timeout.
    async fn run_module(&self, script: String) -> Result<ExecutionResult, GatewayError> {
        let interpreter = pac_exec::resolve(&SHELL_INTERPRETER)?;
        let request = ExecutionRequest::new(interpreter, automation::interpreter_args(script))
            .timeout(automation::MODULE_TIMEOUT);
        Ok(pac_exec::execute(&request).await?)
    }
}

// ── ServerHandler implementation ─────────────────────────────────

#[tool_handler]
impl ServerHandler for PacGatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pac-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Policy as Code".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Policy-as-code MCP server. Use pac_search_policies to find \
                 built-in policies, pac_create_policy_assignment to author \
                 definition files, pac_build_plan to plan, pac_plan_summary \
                 to review, and pac_deploy_plan to apply."
                    .into(),
            ),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Render a domain outcome as the tool's JSON payload. Errors become the
/// `{ "error": ... }` contract instead of failing the MCP call.
fn reply(outcome: Result<Value, GatewayError>) -> Result<CallToolResult, McpError> {
    let payload = match outcome {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, "tool call failed");
            error_payload(&error)
        }
    };
    Ok(CallToolResult::success(vec![Content::json(payload)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?]))
}

fn error_payload(error: &GatewayError) -> Value {
    match error {
        GatewayError::Configuration(details) => json!({
            "error": "invalid configuration",
            "details": details,
        }),
        GatewayError::MissingArtifact { folder, .. } => json!({
            "error": error.to_string(),
            "output_folder": folder,
        }),
        other => json!({ "error": other.to_string() }),
    }
}

fn failure_payload(result: &ExecutionResult) -> Value {
    json!({
        "status": "failed",
        "stderr": tail_chars(&result.stderr, FAILURE_TAIL_CHARS),
        "stdout": tail_chars(&result.stdout, FAILURE_TAIL_CHARS),
    })
}

fn success_summary(result: &ExecutionResult, fallback: &str) -> String {
    if result.stdout.is_empty() {
        fallback.to_string()
    } else {
        tail_chars(&result.stdout, SUMMARY_TAIL_CHARS)
    }
}

/// JMESPath filter for the built-in policy search. String literals in
/// JMESPath are single-quoted; embedded quotes are stripped from user
/// input rather than escaped.
fn policy_search_query(keyword: &str, category: Option<&str>) -> String {
    let keyword = keyword.replace('\'', "");
    let mut query = format!(
        "[?policyType=='BuiltIn' && (contains(displayName, '{keyword}') \
         || contains(description, '{keyword}'))]"
    );
    if let Some(category) = category.filter(|c| !c.is_empty()) {
        let category = category.replace('\'', "");
        query.push_str(&format!("[?metadata.category=='{category}']"));
    }
    query.push_str(
        ".{name:name, displayName:displayName, description:description, category:metadata.category}",
    );
    query
}

/// Plan artifacts (`*-plan.json`) under `output`, relative and sorted.
fn plan_artifacts(output: &Path) -> Result<Vec<String>, GatewayError> {
    let pattern = output.join("**").join("*-plan.json");
    let paths = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| GatewayError::Io(std::io::Error::other(e)))?;
    let mut plans: Vec<String> = paths
        .filter_map(Result::ok)
        .map(|p| p.strip_prefix(output).unwrap_or(&p).display().to_string())
        .collect();
    plans.sort();
    Ok(plans)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn tail_chars(text: &str, limit: usize) -> String {
    let count = text.chars().count();
    if count <= limit {
        text.to_string()
    } else {
        text.chars().skip(count - limit).collect()
    }
}
