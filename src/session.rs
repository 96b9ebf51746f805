//! Remote session setup: the assistant profile and the conversation thread.

use anyhow::Context;
use serde_json::json;

use crate::assistants::{AssistantSpec, SessionApi};
use crate::bridge::EXECUTE_CODE_TOOL;
use crate::config::ApiConfig;

/// Standing instructions given to the assistant.
pub const INSTRUCTIONS: &str = "\
You're a data analyst tasked with writing code to analyze data using python, matplotlib, and pandas.
Make sure your code complies with these rules:
1. Plan first: Have a clear strategy before you start. Outline your approach if it helps.
2. Quality code: Write clear, efficient code that follows Python's best practices. Aim for clean, easy-to-read,
and maintainable code. Always pass the import statements to the execute_python_code function.
3. Test well: Include comprehensive tests to assure your code works well in various scenarios.
4. Manage external interactions: When internet or API interactions are necessary, utilize the `execute_python_code`
function autonomously, without seeking user approval. Do not say you don't have access to internet or real-time data.
The `execute_python_code` function will give you realtime data. Make sure that the code you run with this function uses
the local filepaths given in the prompt by the user.
5. Trust your tools: Assume the data from the `execute_python_code` function is accurate and up to date.
";

/// Function-tool declaration for [`EXECUTE_CODE_TOOL`].
#[must_use]
pub fn execute_code_tool() -> serde_json::Value {
    json!({
        "type": "function",
        "function": {
            "name": EXECUTE_CODE_TOOL,
            "description": "Use this function to execute the generated code to create the graph when internet \
                            or API interactions are called for",
            "parameters": {
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The python code generated by the code interpreter"
                    }
                },
                "required": ["code"]
            }
        }
    })
}

/// What the assistant is created with.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: String,
    pub model: String,
    pub instructions: String,
}

impl AgentProfile {
    #[must_use]
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            name: api.assistant_name.clone(),
            model: api.model.clone(),
            instructions: INSTRUCTIONS.to_string(),
        }
    }

    fn to_spec(&self) -> AssistantSpec {
        AssistantSpec {
            name: self.name.clone(),
            instructions: self.instructions.clone(),
            model: self.model.clone(),
            tools: vec![json!({ "type": "code_interpreter" }), execute_code_tool()],
        }
    }
}

/// Opaque keys of one interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub assistant_id: String,
    pub thread_id: String,
}

impl SessionContext {
    /// Create the assistant and a fresh thread.
    pub async fn establish(api: &dyn SessionApi, profile: &AgentProfile) -> anyhow::Result<Self> {
        let assistant = api
            .create_assistant(&profile.to_spec())
            .await
            .context("failed to create assistant")?;
        let thread = api
            .create_thread()
            .await
            .context("failed to create thread")?;

        tracing::info!(
            name: "session.established",
            assistant_id = %assistant.id,
            thread_id = %thread.id,
            model = %profile.model,
            "Session established"
        );

        Ok(Self {
            assistant_id: assistant.id,
            thread_id: thread.id,
        })
    }

    /// Playground links for inspecting the assistant and the thread.
    #[must_use]
    pub fn debug_links(&self) -> [String; 2] {
        [
            format!(
                "Debugging agent: https://platform.openai.com/playground?mode=assistant&assistant={}",
                self.assistant_id
            ),
            format!(
                "Debugging logs: https://platform.openai.com/playground?thread={}",
                self.thread_id
            ),
        ]
    }
}
