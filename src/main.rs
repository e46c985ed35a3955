//! # FitCoach — retrieval-augmented fitness assistant
//!
//! Usage:
//!   fitcoach files                     # List supported resource files
//!   fitcoach index [--rebuild]         # Ensure/force-build the corpus index
//!   fitcoach index --file F            # Ensure/force-build one file's index
//!   fitcoach ask "question" [--file F] # One grounded answer
//!   fitcoach chat [--web]              # Interactive coaching session

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fitcoach_agent::{CoachTeam, SessionContext, answer_grounded};
use fitcoach_core::FitCoachConfig;
use fitcoach_core::types::Profile;
use fitcoach_knowledge::{
    CorpusManager, PopplerTesseract, QueryMethod, RetrievalScope, list_supported_files,
};
use fitcoach_providers::{create_chat_provider, create_embedder};
use fitcoach_tools::{
    ContraindicationCheckTool, CorpusInfoTool, CorroborateAnswerTool, EstimateTdeeTool,
    ExercisePickerTool, MacroPlanTool, SearchPapersTool, ToolRegistry, WebSearchTool,
};

#[derive(Parser)]
#[command(name = "fitcoach", version, about = "Retrieval-augmented multi-agent fitness assistant")]
struct Cli {
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported files in the resources directory
    Files,
    /// Build an index if it does not exist yet
    Index {
        /// Rebuild from scratch even when an index exists
        #[arg(long)]
        rebuild: bool,
        /// Index one file on its own instead of the whole corpus
        #[arg(long)]
        file: Option<String>,
    },
    /// Ask one question and print a grounded answer
    Ask {
        question: String,
        /// Answer from one file's own index instead of the corpus
        #[arg(long)]
        file: Option<String>,
        /// Retrieval method: mmr, similarity, or similarity_with_threshold
        #[arg(long, default_value = "mmr")]
        method: String,
        /// Number of chunks to retrieve
        #[arg(short)]
        k: Option<usize>,
    },
    /// Interactive coaching session
    Chat {
        /// Enable web corroboration for the Q&A agent
        #[arg(long)]
        web: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "fitcoach=debug" } else { "fitcoach=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = FitCoachConfig::load()?;

    match cli.command {
        Command::Files => files(&config),
        Command::Index { rebuild, file } => index(&config, rebuild, file.as_deref()).await,
        Command::Ask { question, file, method, k } => {
            ask(&config, &question, file.as_deref(), &method, k).await
        }
        Command::Chat { web } => chat(&config, web).await,
    }
}

fn corpus_manager(config: &FitCoachConfig) -> Arc<CorpusManager> {
    Arc::new(CorpusManager::new(&config.rag, Box::new(PopplerTesseract::default())))
}

fn files(config: &FitCoachConfig) -> Result<()> {
    let files = list_supported_files(&config.rag.resources_dir)?;
    if files.is_empty() {
        println!("No supported files under {}", config.rag.resources_dir.display());
        return Ok(());
    }
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}

async fn index(config: &FitCoachConfig, rebuild: bool, file: Option<&str>) -> Result<()> {
    let embedder = create_embedder(config, config.rag.model_size)?;
    let corpus = corpus_manager(config);
    let (index, dir) = match file {
        Some(path) => {
            let path = Path::new(path);
            let index = if rebuild {
                corpus.rebuild_file_index(path, embedder.as_ref()).await?
            } else {
                corpus.ensure_file_index(path, embedder.as_ref()).await?
            };
            (index, corpus.file_index_dir(path, config.rag.model_size))
        }
        None => {
            let index = if rebuild {
                corpus.rebuild(embedder.as_ref()).await?
            } else {
                corpus.ensure_index(embedder.as_ref()).await?
            };
            (index, config.rag.index_dir.clone())
        }
    };
    println!(
        "Index ready at {} ({} chunks, {} model)",
        dir.display(),
        index.len(),
        index.model_size()
    );
    Ok(())
}

async fn ask(
    config: &FitCoachConfig,
    question: &str,
    file: Option<&str>,
    method: &str,
    k: Option<usize>,
) -> Result<()> {
    let method: QueryMethod = method.parse()?;
    let k = k.unwrap_or(config.rag.default_k);

    let embedder = create_embedder(config, config.rag.model_size)?;
    let corpus = corpus_manager(config);
    // A file question gets that file's own index, built on demand.
    let index = match file {
        Some(path) => corpus.ensure_file_index(Path::new(path), embedder.as_ref()).await?,
        None => corpus.ensure_index(embedder.as_ref()).await?,
    };

    let query_vec = embedder
        .embed(&[question.to_string()])
        .await?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("no embedding for question"))?;
    let hits = index.query(&query_vec, k, method, None, config.rag.score_threshold)?;
    if hits.is_empty() {
        println!("Nothing relevant found.");
        return Ok(());
    }

    let provider = create_chat_provider(config)?;
    let params = fitcoach_core::types::GenerateParams {
        temperature: config.default_temperature,
        max_tokens: config.max_tokens,
    };
    let answer = answer_grounded(provider.as_ref(), question, &hits, &params).await?;
    println!("{answer}");
    Ok(())
}

async fn chat(config: &FitCoachConfig, web: bool) -> Result<()> {
    let provider: Arc<dyn fitcoach_core::traits::Provider> =
        create_chat_provider(config)?.into();
    let embedder: Arc<dyn fitcoach_core::traits::Embedder> =
        create_embedder(config, config.rag.model_size)?.into();
    let corpus = corpus_manager(config);

    let mut ctx = SessionContext::new(Profile::default(), web);

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(EstimateTdeeTool));
    registry.register(Box::new(MacroPlanTool));
    registry.register(Box::new(ExercisePickerTool));
    registry.register(Box::new(ContraindicationCheckTool));
    registry.register(Box::new(SearchPapersTool::new(
        corpus.clone(),
        embedder,
        ctx.scope.clone(),
        &config.rag,
    )));
    registry.register(Box::new(CorpusInfoTool::new(corpus, ctx.scope.clone())));
    registry.register(Box::new(WebSearchTool::new(&config.web)));
    registry.register(Box::new(CorroborateAnswerTool::new(&config.web)));

    let params = fitcoach_core::types::GenerateParams {
        temperature: config.default_temperature,
        max_tokens: config.max_tokens,
    };
    let team = CoachTeam::new(provider, Arc::new(registry), params);

    println!(
        "FitCoach ready. '/scope file <path>' focuses retrieval on one file, '/scope corpus' resets it, 'exit' quits."
    );
    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        if let Some(rest) = line.strip_prefix("/scope") {
            match parse_scope_command(rest) {
                Ok(scope) => {
                    let desc = scope.describe();
                    *ctx.scope.write().await = scope;
                    println!("scope> retrieval scope set to {desc}\n");
                }
                Err(e) => println!("scope> {e}\n"),
            }
            continue;
        }

        // A failed turn becomes a visible reply; the session continues.
        match team.run_turn(&mut ctx, line).await {
            Ok(reply) => println!("coach> {reply}\n"),
            Err(e) => {
                let reply = format!("Sorry - something went wrong this turn: {e}");
                tracing::error!(error = %e, "turn failed");
                ctx.push_assistant(&reply);
                println!("coach> {reply}\n");
            }
        }
    }
    println!("Bye!");
    Ok(())
}

/// Parse the body of a `/scope` chat command: `corpus`, or `file <path>`
/// (the path may contain spaces).
fn parse_scope_command(rest: &str) -> fitcoach_core::error::Result<RetrievalScope> {
    let rest = rest.trim();
    match rest.split_once(char::is_whitespace) {
        Some((mode, path)) => RetrievalScope::parse(mode, Some(path.trim())),
        None => RetrievalScope::parse(rest, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_command() {
        assert_eq!(parse_scope_command(" corpus").unwrap(), RetrievalScope::Corpus);

        let scope = parse_scope_command(" file docs/study guide.pdf").unwrap();
        let RetrievalScope::File(path) = &scope else { panic!("expected file scope") };
        assert!(path.is_absolute());
        assert!(path.ends_with("docs/study guide.pdf"));

        assert!(parse_scope_command(" file").is_err());
        assert!(parse_scope_command(" folder x").is_err());
        assert!(parse_scope_command("").is_err());
    }
}
