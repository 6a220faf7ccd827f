use clap::Parser;

/// Settings shared by every subcommand
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    pub openai_api_base: Option<String>,

    /// Model used for assistant replies
    #[arg(long, env = "HAVI_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Timezone used to work out today's date for age calculations
    #[arg(long, env = "TIMEZONE")]
    pub timezone: Option<String>,
}
