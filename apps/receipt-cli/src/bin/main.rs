use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use receipt_core::config::{expand_path, Config};
use receipt_core::pages::{document_name, read_pages};
use receipt_core::types::{IndexStatus, Match, Pipeline};
use receipt_core::Error;
use receipt_query::{QueryCoordinator, QueryRequest, QueryResponse};

#[derive(Parser)]
#[command(name = "receipt", about = "Ask questions about a document, offline", version)]
struct Cli {
    /// Use the hashing embedder instead of loading a model
    #[arg(long, global = true)]
    fake_embeddings: bool,

    /// Directory holding the sentence-embedding model
    #[arg(long, global = true)]
    model_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load one document and answer a single question
    Ask {
        /// Text file (pages split on form feeds) or directory of per-page .txt files
        path: PathBuf,
        question: String,
        /// Number of matches (defaults to retrieval.top_k)
        #[arg(long)]
        top_k: Option<usize>,
        /// Search the embedding index instead of the lexical one
        #[arg(long)]
        semantic: bool,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load documents and answer questions read from stdin
    Shell {
        paths: Vec<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn load(coordinator: &QueryCoordinator, path: &Path) -> anyhow::Result<()> {
    let pages = read_pages(path).with_context(|| format!("reading {}", path.display()))?;
    let name = document_name(path);
    let pb = progress_bar()?;
    pb.set_message(name.clone());
    let report = coordinator.load_document_with_progress(pages, &name, &pb);
    pb.finish_and_clear();
    let report = report?;
    eprintln!(
        "Indexed {} ({} pages, {} embedding entries)",
        report.document_name, report.pages_indexed, report.embedding_entries
    );
    Ok(())
}

fn print_response(response: &QueryResponse) {
    if response.matches.is_empty() {
        println!("No matches.");
        return;
    }
    for (rank, m) in response.matches.iter().enumerate() {
        match m {
            Match::Lexical(hit) => println!("{}. page {} (similarity {:.3})", rank + 1, hit.page, hit.similarity),
            Match::Embedding(hit) => println!("{}. {} page {} (distance {:.4})", rank + 1, hit.document, hit.page, hit.distance),
        }
        println!("   {}", m.text().replace('\n', "\n   "));
    }
}

fn print_status(status: Option<IndexStatus>) {
    match status {
        Some(s) => println!(
            "{}: {} pages, loaded {}, {} embedding entries",
            s.document_name,
            s.pages_indexed,
            s.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
            s.embedding_entries
        ),
        None => println!("{}", Error::NoIndex),
    }
}

fn run_query(coordinator: &QueryCoordinator, request: &QueryRequest) {
    match coordinator.handle_query(request) {
        Ok(response) => print_response(&response),
        Err(err) => eprintln!("{err}"),
    }
}

fn shell(coordinator: &QueryCoordinator, paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        if let Err(err) = load(coordinator, path) { eprintln!("{err:#}"); }
    }
    println!("Type a question, or :load <path>, :semantic <question>, :status, :quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 { break; }
        let line = line.trim();
        if line.is_empty() { continue; }

        let (command, rest) = line.split_once(char::is_whitespace).map_or((line, ""), |(c, r)| (c, r.trim()));
        match command {
            ":quit" | ":q" => break,
            ":status" => print_status(coordinator.status()),
            ":load" if !rest.is_empty() => {
                if let Err(err) = load(coordinator, &expand_path(rest)) { eprintln!("{err:#}"); }
            }
            ":semantic" if !rest.is_empty() => {
                run_query(coordinator, &QueryRequest::new(rest).pipeline(Pipeline::Embedding));
            }
            ":load" | ":semantic" => eprintln!("{command} needs an argument"),
            _ if command.starts_with(':') => eprintln!("Unknown command: {command}"),
            _ => run_query(coordinator, &QueryRequest::new(line)),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Config::load()?.settings()?;
    if cli.fake_embeddings { settings.embedding.use_fake = true; }
    if let Some(dir) = cli.model_dir { settings.embedding.model_dir = Some(dir); }
    debug!(?settings, "settings resolved");

    let coordinator = QueryCoordinator::from_settings(&settings)?;

    match cli.command {
        Command::Ask { path, question, top_k, semantic, json } => {
            load(&coordinator, &path)?;
            let pipeline = if semantic { Pipeline::Embedding } else { Pipeline::Lexical };
            let mut request = QueryRequest::new(question).pipeline(pipeline);
            request.top_k = top_k;
            let response = coordinator.handle_query(&request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_response(&response);
            }
        }
        Command::Shell { paths } => shell(&coordinator, &paths)?,
    }
    Ok(())
}
