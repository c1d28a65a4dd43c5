use clap::{ArgGroup, Parser};
use colored::*;
use explainthisrepo::{
    config::Config,
    doctor,
    error::{ProcessorError, Result},
    github::GitHubClient,
    llm::GeminiClient,
    logging,
    processors::{
        common, create_reader,
        github::GitHubReader,
        local::{language_histogram, LocalReader},
        RepoReadResult, RepoReader,
    },
    prompts,
    stack::{detect_stack, print_stack, StackInput},
    utils::{parse_target, RepoTarget},
};
use log::warn;
use std::path::PathBuf;
use std::process;

const EXAMPLES: &str = "\
Examples:
  $ explainthisrepo owner/repo
  $ explainthisrepo https://github.com/owner/repo
  $ explainthisrepo github.com/owner/repo
  $ explainthisrepo git@github.com:owner/repo.git
  $ explainthisrepo owner/repo --detailed
  $ explainthisrepo owner/repo --quick
  $ explainthisrepo owner/repo --simple
  $ explainthisrepo owner/repo --stack
  $ explainthisrepo .
  $ explainthisrepo ./path/to/directory
  $ explainthisrepo . --stack
  $ explainthisrepo --doctor";

#[derive(Parser)]
#[command(
    name = "explainthisrepo",
    version,
    about = "Explain GitHub repositories in plain English",
    after_help = EXAMPLES
)]
#[command(group(ArgGroup::new("mode").args(["quick", "simple", "detailed", "stack"]).multiple(false)))]
struct Cli {
    /// GitHub repository (owner/repo or URL) or local path
    #[arg(required_unless_present = "doctor")]
    repository: Option<String>,

    /// Run diagnostics
    #[arg(long)]
    doctor: bool,

    /// One-sentence summary
    #[arg(long)]
    quick: bool,

    /// Short bullet-point summary
    #[arg(long)]
    simple: bool,

    /// Explanation including architecture and folder structure
    #[arg(long)]
    detailed: bool,

    /// Detect the technology stack without calling the language model
    #[arg(long)]
    stack: bool,

    /// Where to write the explanation (defaults to EXPLAIN.md)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Quick,
    Simple,
    Explain { detailed: bool },
    Stack,
}

impl Mode {
    fn from_cli(cli: &Cli) -> Self {
        if cli.quick {
            Mode::Quick
        } else if cli.simple {
            Mode::Simple
        } else if cli.stack {
            Mode::Stack
        } else {
            Mode::Explain { detailed: cli.detailed }
        }
    }
}

/// Name, description and README handed to every prompt
struct RepoContext {
    name: String,
    description: Option<String>,
    readme: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(&cli.log_level) {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            1
        }
    };
    process::exit(code);
}

fn report_error(err: &ProcessorError) {
    eprintln!("{} {}", "error:".red().bold(), err);
    let hints = err.hint();
    if !hints.is_empty() {
        eprintln!("\n{}", "fix:".yellow().bold());
        for hint in hints {
            eprintln!("- {}", hint);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let mut config = Config::load()?;
    if let Some(output) = &cli.output {
        config.output_file = output.clone();
    }

    if cli.doctor {
        return Ok(doctor::run_doctor(&config).await);
    }

    let input = cli
        .repository
        .as_deref()
        .ok_or_else(|| ProcessorError::Validation("repository argument required".into()))?;
    let target = parse_target(input)?;
    match &target {
        RepoTarget::Local(_) => println!("Analyzing local directory: {}", input.trim()),
        RepoTarget::GitHub { .. } => println!("Fetching {}...", target.label()),
    }

    let mode = Mode::from_cli(&cli);
    if mode == Mode::Stack {
        run_stack(&target, &config).await?;
        return Ok(0);
    }

    let llm = GeminiClient::new(&config)?;
    let (context, digest) = load_context(&target, &config, mode).await?;

    match mode {
        Mode::Quick => {
            let prompt = prompts::build_quick_prompt(
                &context.name,
                context.description.as_deref(),
                context.readme.as_deref(),
            );
            let output = generate(&llm, &prompt).await?;
            println!("{}", "Quick summary 🎉".green().bold());
            println!("{}", output);
        }
        Mode::Simple => {
            let prompt = prompts::build_simple_prompt(
                &context.name,
                context.description.as_deref(),
                context.readme.as_deref(),
                digest.as_ref().map(|d| d.tree_text.as_str()),
            );
            let output = generate(&llm, &prompt).await?;
            println!("{}", "Simple summary 🎉".green().bold());
            println!("{}", output);
        }
        Mode::Explain { detailed } => {
            let prompt = prompts::build_prompt(
                &context.name,
                context.description.as_deref(),
                context.readme.as_deref(),
                detailed,
                digest.as_ref().map(|d| d.tree_text.as_str()),
                digest.as_ref().map(|d| d.files_text.as_str()),
            );
            let output = generate(&llm, &prompt).await?;

            let file = config.output_file.display().to_string();
            println!("Writing {}...", file);
            common::save_output_file(&output, &config.output_file).await?;
            println!("{}", format!("{} generated successfully 🎉", file).green().bold());
            println!("Words: {}", common::word_count(&output));
            println!("Open {} to read it.", file);
        }
        // handled before the Gemini client is built
        Mode::Stack => {}
    }
    Ok(0)
}

/// Metadata and digest for the prompt modes; only the metadata fetch is fatal
async fn load_context(
    target: &RepoTarget,
    config: &Config,
    mode: Mode,
) -> Result<(RepoContext, Option<RepoReadResult>)> {
    match target {
        RepoTarget::GitHub { owner, repo } => {
            let client = GitHubClient::new(config)?;
            let metadata = client.fetch_repo(owner, repo).await?;
            let readme = match client.fetch_readme(owner, repo).await {
                Ok(readme) => readme,
                Err(e) => {
                    warn!("Could not fetch README: {}", e);
                    None
                }
            };
            let digest = match mode {
                Mode::Quick => None,
                _ => {
                    let reader =
                        GitHubReader::new(client, owner, repo).with_branch(&metadata.default_branch);
                    read_digest(&reader).await
                }
            };
            let context = RepoContext {
                name: metadata.full_name,
                description: metadata.description,
                readme,
            };
            Ok((context, digest))
        }
        RepoTarget::Local(path) => {
            let digest = read_digest(&LocalReader::new(path.clone())).await;
            let context = RepoContext {
                name: path.display().to_string(),
                description: None,
                readme: digest.as_ref().and_then(|d| d.readme()).map(str::to_string),
            };
            Ok((context, digest))
        }
    }
}

/// Reads the repository digest, degrading to `None` with a warning
async fn read_digest(reader: &dyn RepoReader) -> Option<RepoReadResult> {
    let pb = common::create_progress_bar("Reading repository files...");
    let result = reader.read().await;
    pb.finish_and_clear();

    match result {
        Ok(digest) => Some(digest),
        Err(e) => {
            warn!("Could not read repo files: {}", e);
            None
        }
    }
}

async fn generate(llm: &GeminiClient, prompt: &str) -> Result<String> {
    let pb = common::create_progress_bar("Generating explanation...");
    let result = llm.generate(prompt).await;
    pb.finish_and_clear();
    result
}

async fn run_stack(target: &RepoTarget, config: &Config) -> Result<()> {
    let pb = common::create_progress_bar("Detecting stack...");
    let read = async {
        match target {
            RepoTarget::GitHub { owner, repo } => {
                let client = GitHubClient::new(config)?;
                let languages = client.fetch_languages(owner, repo).await?;
                let digest = create_reader(target, config)?.read().await?;
                Ok::<_, ProcessorError>((languages, digest))
            }
            RepoTarget::Local(_) => {
                let digest = create_reader(target, config)?.read().await?;
                Ok((language_histogram(&digest.tree), digest))
            }
        }
    };
    let result = read.await;
    pb.finish_and_clear();
    let (languages, digest) = result?;

    let report = detect_stack(&StackInput {
        languages: &languages,
        tree: &digest.tree,
        key_files: &digest.key_files,
    });
    print_stack(&report, &target.label());
    Ok(())
}
