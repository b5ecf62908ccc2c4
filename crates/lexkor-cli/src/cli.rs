//! Command-line arguments.
//!
//! Every setting has a flag and an environment variable; flags win.

use clap::{Args, Parser, Subcommand};
use lexkor_core::Settings;
use lexkor_core::config::{
    DEFAULT_DRF_BASE_URL, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LAW_BASE_URL, DEFAULT_LLM_BASE_URL,
    DEFAULT_MODEL, non_blank, secret,
};

/// Korean statute lookup and legal Q&A.
#[derive(Parser, Debug)]
#[command(name = "lexkor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// OpenAI-compatible API root
    #[arg(long, env = "LEXKOR_LLM_BASE_URL", default_value = DEFAULT_LLM_BASE_URL)]
    pub llm_base_url: String,

    /// API key for the LLM endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat model name
    #[arg(long, env = "LEXKOR_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Statute site root used for links
    #[arg(long, env = "LEXKOR_LAW_BASE_URL", default_value = DEFAULT_LAW_BASE_URL)]
    pub law_base_url: String,

    /// DRF open-API root
    #[arg(long, env = "LEXKOR_DRF_BASE_URL", default_value = DEFAULT_DRF_BASE_URL)]
    pub drf_base_url: String,

    /// DRF service key (OC)
    #[arg(long, env = "LAW_OC", hide_env_values = true)]
    pub law_oc: Option<String>,

    /// Pass-through proxy in front of DRF
    #[arg(long, env = "LEXKOR_PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Shared secret for the proxy (X-Proxy-Token)
    #[arg(long, env = "LEXKOR_PROXY_TOKEN", hide_env_values = true)]
    pub proxy_token: Option<String>,

    /// Timeout for statute-site and DRF fetches, clamped to 3..=15
    #[arg(long, env = "LEXKOR_FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,
}

impl SettingsArgs {
    pub fn into_settings(self) -> Settings {
        Settings {
            llm_base_url: self.llm_base_url,
            llm_api_key: secret(self.api_key),
            model: self.model,
            law_base_url: self.law_base_url,
            drf_base_url: self.drf_base_url,
            drf_service_key: secret(self.law_oc),
            proxy_url: non_blank(self.proxy_url),
            proxy_token: secret(self.proxy_token),
            ..Settings::default()
        }
        .with_fetch_timeout_secs(self.fetch_timeout_secs)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a legal question
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Ask for a short answer
        #[arg(long)]
        brief: bool,

        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Show the detected intent and routed mode
    Classify {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show the plan the model produces for a query
    Plan {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print JSON instead of a card
        #[arg(long)]
        json: bool,
    },

    /// Resolve a statute article to text and link
    Resolve {
        /// Statute name or abbreviation (e.g. 민법, 형소법)
        law: String,

        /// Article label (e.g. 제839조의2, 750조)
        article: Option<String>,

        /// Only resolve the link, checking that the page is live
        #[arg(long)]
        link_only: bool,

        /// Print JSON instead of a card
        #[arg(long)]
        json: bool,
    },

    /// Add or refresh the related-links block in a document
    Links {
        /// File to read, or - for stdin
        #[arg(default_value = "-")]
        path: String,
    },

    /// Fetch a page as plain text
    Fetch {
        url: String,

        /// Maximum characters to print
        #[arg(long, default_value_t = 4000)]
        max_chars: usize,
    },
}

/// Join positional words back into one query.
pub fn join_query(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_ask_with_flags() {
        let cli = Cli::try_parse_from([
            "lexkor", "--model", "gpt-x", "ask", "민법", "제750조", "--brief",
        ])
        .unwrap();
        assert_eq!(cli.settings.model, "gpt-x");
        let Commands::Ask { query, brief, stream } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(join_query(&query), "민법 제750조");
        assert!(brief);
        assert!(!stream);
    }

    #[test]
    fn resolve_article_is_optional() {
        let cli = Cli::try_parse_from(["lexkor", "resolve", "형소법"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Resolve { article: None, link_only: false, .. }
        ));
    }

    #[test]
    fn settings_clamp_and_blank_secrets() {
        let cli = Cli::try_parse_from([
            "lexkor",
            "--fetch-timeout-secs",
            "99",
            "--law-oc",
            " ",
            "--proxy-url",
            "",
            "links",
        ])
        .unwrap();
        let settings = cli.settings.into_settings();
        assert_eq!(settings.fetch_timeout, Duration::from_secs(15));
        assert!(settings.drf_service_key.is_none());
        assert!(settings.proxy_url.is_none());
    }
}
