use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Downstream agent (OpenAI-compatible endpoint)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    /// Upper bound on tool-call round trips per message.
    #[serde(default = "d_max_tool_rounds")]
    pub max_tool_rounds: u32,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    /// System instructions sent ahead of the conversation.
    #[serde(default = "d_instructions")]
    pub instructions: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            api_key_env: d_api_key_env(),
            model: d_model(),
            temperature: d_temperature(),
            max_tool_rounds: d_max_tool_rounds(),
            timeout_ms: d_timeout_ms(),
            instructions: d_instructions(),
        }
    }
}

fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_temperature() -> f32 {
    0.2
}
fn d_max_tool_rounds() -> u32 {
    6
}
fn d_timeout_ms() -> u64 {
    60_000
}
fn d_instructions() -> String {
    "אתה סוכן איקומרס שעוזר לנהל חנויות WooCommerce. אתה דובר עברית ואנגלית.\n\
     אתה יכול לעזור למשתמשים לנהל את המוצרים, הקטגוריות וההזמנות בחנות שלהם.\n\
     השתמש בכלים שניתנו לך כדי לבצע פעולות בחנות.\n\
     ענה בקצרה וישירות לשאלות פשוטות, ובפירוט ממוקד לשאלות מורכבות.\n\
     אם אינך בטוח במשהו, אמור זאת במקום לנחש.\n\
     התייחס להיסטוריית השיחה כדי לספק תשובות עקביות."
        .into()
}
