use repo_archaeologist::{
    analysis::{AnalysisResult, Analyzer},
    error::Result,
    logging, Config,
};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample a repository and describe its stack and structure
    Analyze {
        /// Repository URL, e.g. https://github.com/owner/name
        url: String,
        /// Maximum number of files to sample
        #[arg(long)]
        max_files: Option<usize>,
        /// Ask the generative backend for a prose summary
        #[arg(long)]
        ai_summary: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask a question about a repository's code
    Ask {
        url: String,
        question: String,
        /// Extra context passed along with the question
        #[arg(long)]
        context: Option<String>,
    },
    /// Show repository metadata
    Metadata { owner: String, repo: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level) {
        eprintln!("{} {}", "[WARNING]".bright_yellow(), e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "[ERROR]".bright_red(), e.to_string().bright_red());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };

    match cli.command {
        Command::Analyze { url, max_files, ai_summary, json } => {
            if let Some(max_files) = max_files {
                config.traversal.max_files = max_files;
            }
            config.summarizer.ai_summary |= ai_summary;
            config.validate()?;

            let analyzer = Analyzer::from_config(&config)?;
            let pb = create_spinner(format!("Sampling {}", url));
            let result = analyzer.analyze(&url).await;
            pb.finish_and_clear();
            let result = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_analysis(&result);
            }
        }
        Command::Ask { url, question, context } => {
            config.validate()?;
            let analyzer = Analyzer::from_config(&config)?;
            let pb = create_spinner(format!("Reading {}", url));
            let answer = analyzer.chat(&url, &question, context.as_deref()).await;
            pb.finish_and_clear();
            let answer = answer?;

            println!("{}\n", answer.answer);
            if !answer.relevant_files.is_empty() {
                println!("{}", "Relevant files:".bright_white().bold());
                for path in &answer.relevant_files {
                    println!("  {}", path.bright_cyan());
                }
            }
        }
        Command::Metadata { owner, repo } => {
            config.validate()?;
            let analyzer = Analyzer::from_config(&config)?;
            let metadata = analyzer.metadata(&owner, &repo).await?;

            println!("{} {}", metadata.full_name.bright_green().bold(), metadata.url.bright_blue());
            if let Some(description) = &metadata.description {
                println!("  {}", description);
            }
            println!(
                "  {} {}   {} {}   {} {}",
                "Language:".bright_white().bold(),
                metadata.language.as_deref().unwrap_or("unknown"),
                "Stars:".bright_white().bold(),
                metadata.stars,
                "Forks:".bright_white().bold(),
                metadata.forks
            );
        }
    }

    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    println!("\n{}", result.repo_name.bright_green().bold());
    println!("{}", result.summary);
    println!("\n{} {}", "Stack:".bright_white().bold(), result.tech_stack_analysis);
    for (label, items) in [
        ("Languages", &result.tech_stack.languages),
        ("Frameworks", &result.tech_stack.frameworks),
        ("Tools", &result.tech_stack.tools),
    ] {
        if !items.is_empty() {
            println!("  {} {}", format!("{}:", label).bright_white(), items.join(", ").bright_cyan());
        }
    }
    println!("\n{}\n{}", "Summary:".bright_white().bold(), result.repo_summary);
    println!("\n{}\n{}", "Diagram:".bright_white().bold(), result.mermaid_graph);
    println!(
        "\n{} {}",
        "[SAMPLED]".bright_blue(),
        format!("{} files", result.total_files).bright_white()
    );
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style.tick_strings(&["-", "\\", "|", "/", "-", "\\", "|", "/"]));
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
