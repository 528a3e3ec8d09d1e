use anyhow::Context;
use clap::{Parser, Subcommand};
use docchat_rag::{IngestRequest, SearchRequest, runtime};
use docchat_server::{
    AppState, ServerConfig, commands, run_server,
    telemetry::init_tracing,
    wire::{EmbeddingsResponse, SimilaritySearchResponse},
};

#[derive(Parser)]
#[command(name = "docchat", version, about = "Ask questions about your documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load, chunk and embed files into a thread's collection
    Ingest {
        /// Conversation thread identifier
        #[arg(long)]
        thread: String,
        /// API key for the embedding service
        #[arg(long)]
        api_key: Option<String>,
        /// PDF or text files to ingest
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the chunks nearest to a query, ingesting any given files first
    Search {
        #[arg(long)]
        thread: String,
        #[arg(long)]
        api_key: Option<String>,
        /// Number of chunks to return
        #[arg(long)]
        top_k: Option<usize>,
        /// Files to ingest before searching
        #[arg(long = "file")]
        files: Vec<String>,
        query: String,
    },
    /// Answer a question from a thread, ingesting any given files first
    Ask {
        #[arg(long)]
        thread: String,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long = "file")]
        files: Vec<String>,
        question: String,
    },
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            rt.block_on(run_server(config))
        }
        // The in-memory store lives only for this process; pass --file to
        // search or ask unless DOCCHAT_VECTOR_STORE points at qdrant.
        Command::Ingest { thread, api_key, paths } => {
            let state = AppState::from_config(&config)?;
            let request = IngestRequest { sources: paths, thread_id: thread, api_key };
            let report = runtime::block_on(state.pipeline.ingest(request))?;
            println!("{}", serde_json::to_string_pretty(&EmbeddingsResponse::from(report))?);
            Ok(())
        }
        Command::Search { thread, api_key, top_k, files, query } => {
            let state = AppState::from_config(&config)?;
            let request = SearchRequest { query, thread_id: thread, api_key, top_k };
            let report = runtime::block_on(commands::search(&state.pipeline, files, request))?;
            println!("{}", serde_json::to_string_pretty(&SimilaritySearchResponse::from(report))?);
            Ok(())
        }
        Command::Ask { thread, api_key, top_k, files, question } => {
            let state = AppState::from_config(&config)?;
            let request = SearchRequest { query: question, thread_id: thread, api_key, top_k };
            let answer = runtime::block_on(commands::ask(&state.pipeline, files, request))?;
            println!("{answer}");
            Ok(())
        }
    }
}
