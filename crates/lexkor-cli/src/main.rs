mod answer;
mod cli;
mod display;

use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lexkor_ai::{OpenAiClient, PlanRouter, classify, route};
use lexkor_core::{LinkComposer, Settings, canonical_law_name, normalize_article_label};
use lexkor_law::{ArticleResolver, ResolvedArticle, fetch_for_context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::answer::{AnswerPipeline, streamed_suffix};
use crate::cli::{Cli, Commands, join_query};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings.into_settings();
    info!("lexkor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Ask {
            query,
            brief,
            stream,
        } => ask(&settings, &join_query(&query), brief, stream).await,
        Commands::Classify { query } => {
            let query = join_query(&query);
            let (intent, confidence) = classify(&query);
            display::print_classification(&query, intent, confidence, route(intent, confidence));
            Ok(())
        }
        Commands::Plan { query, json } => {
            let query = join_query(&query);
            let planner = PlanRouter::new(chat_model(&settings), settings.model.clone());
            let plan = planner.plan(&query).await.context("planning query")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                display::print_plan_card(&query, &plan);
            }
            Ok(())
        }
        Commands::Resolve {
            law,
            article,
            link_only,
            json,
        } => {
            let article = article.unwrap_or_default();
            let resolver = ArticleResolver::new(&settings).context("building HTTP client")?;
            let resolved = if link_only {
                ResolvedArticle {
                    text: String::new(),
                    link: resolver.resolve_article_url(&law, &article).await,
                }
            } else {
                resolver.resolve(&law, &article).await
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                display::print_resolved_card(
                    &canonical_law_name(&law),
                    &normalize_article_label(&article),
                    &resolved,
                );
            }
            Ok(())
        }
        Commands::Links { path } => {
            let text = read_input(&path)?;
            let composer = LinkComposer::new(settings.law_base_url.clone());
            print!("{}", composer.merge(&text));
            if !text.is_empty() {
                println!();
            }
            Ok(())
        }
        Commands::Fetch { url, max_chars } => {
            let resolver = ArticleResolver::new(&settings).context("building HTTP client")?;
            println!("{}", fetch_for_context(resolver.client(), &url, max_chars).await);
            Ok(())
        }
    }
}

async fn ask(settings: &Settings, query: &str, brief: bool, stream: bool) -> anyhow::Result<()> {
    let resolver = ArticleResolver::new(settings).context("building HTTP client")?;
    let pipeline = AnswerPipeline::new(
        chat_model(settings),
        settings.model.clone(),
        resolver,
        LinkComposer::new(settings.law_base_url.clone()),
    );

    let mut stdout = io::stdout();
    let answer = pipeline
        .answer(query, brief, stream, &mut |chunk| {
            print!("{chunk}");
            let _ = io::stdout().flush();
        })
        .await
        .context("generating answer")?;
    info!(
        intent = %answer.intent,
        confidence = answer.confidence,
        mode = %answer.mode,
        planned = answer.plan.is_some(),
        result = answer.execution.as_ref().map_or("-", |e| e.kind()),
        "answer ready"
    );

    if stream && answer.blocked.is_none() {
        writeln!(stdout, "{}", streamed_suffix(&answer.text, &answer.raw_text))?;
    } else {
        writeln!(stdout, "{}", answer.text)?;
    }
    Ok(())
}

fn chat_model(settings: &Settings) -> Arc<OpenAiClient> {
    Arc::new(OpenAiClient::new(
        settings.llm_base_url.clone(),
        settings.llm_api_key.clone(),
    ))
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
    }
}
