// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use futures::StreamExt;
use rmcp::ServiceExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use worklog_assistant::llm::prompts::{quick_assistant_prompt, worklog_assistant_prompt};
use worklog_assistant::mcp::WorklogMcp;
use worklog_assistant::utils::logging::{
    format_error, format_info, format_success, format_tool_call, format_warning, init_logger,
};
use worklog_assistant::{
    ChatService, Config, CredentialCipher, Message, Platform, ToolExecutor, UserSettings,
    create_host, create_llm_client, generate_worklog, timerange, tool_catalog,
};

#[derive(Parser)]
#[command(name = "worklog")]
#[command(author = "cipher")]
#[command(version)]
#[command(about = "Work-log assistant over GitLab and GitHub commit history", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the assistant; it may call commit tools before answering
    Chat {
        message: String,

        /// JSON array of earlier messages to continue from
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Stream a plain answer without tool calls
        #[arg(long)]
        stream: bool,

        /// Use the short general-purpose prompt
        #[arg(long)]
        quick: bool,

        /// Write a detected work-log attachment into this directory
        #[arg(long, value_name = "DIR")]
        save_to: Option<PathBuf>,
    },

    /// Build a Markdown work log directly from commit history
    Worklog {
        /// Natural-language range such as "last week" or "最近7天"
        #[arg(short, long, default_value = "this week")]
        range: String,

        #[arg(short, long)]
        platform: Option<Platform>,

        #[arg(long)]
        project: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print per-project commit totals instead of the full work log
        #[arg(long)]
        summary: bool,
    },

    /// Print the tool catalog offered to the model
    Tools {
        #[arg(short, long)]
        platform: Option<Platform>,
    },

    /// Start MCP (Model Context Protocol) server for agentic tool integration
    Mcp {
        #[arg(long, default_value = "stdio")]
        transport: String,
    },

    /// Print a fresh base64 key for security.encryption_key
    GenerateKey,

    /// Encrypt a token with the configured key
    EncryptToken { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Chat {
            message,
            history,
            stream,
            quick,
            save_to,
        } => {
            cmd_chat(&config, &message, history.as_deref(), stream, quick, save_to.as_deref())
                .await?;
        }
        Commands::Worklog {
            range,
            platform,
            project,
            output,
            summary,
        } => {
            cmd_worklog(&config, &range, platform, project, output.as_deref(), summary).await?;
        }
        Commands::Tools { platform } => {
            cmd_tools(&config, platform)?;
        }
        Commands::Mcp { transport } => {
            cmd_mcp(&config, &transport).await?;
        }
        Commands::GenerateKey => {
            println!("{}", CredentialCipher::generate_key());
        }
        Commands::EncryptToken { token } => {
            cmd_encrypt_token(&config, &token)?;
        }
    }

    Ok(())
}

fn load_history(path: Option<&Path>) -> Result<Vec<Message>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&raw).context("History file is not a JSON array of messages")
}

async fn cmd_chat(
    config: &Config,
    message: &str,
    history: Option<&Path>,
    stream: bool,
    quick: bool,
    save_to: Option<&Path>,
) -> Result<()> {
    let prompt = if quick {
        quick_assistant_prompt()
    } else {
        worklog_assistant_prompt()
    };
    let llm = create_llm_client(&config.llm, prompt).context("Failed to create LLM client")?;
    let service = ChatService::new(llm, config.chat.clone());
    let history = load_history(history)?;

    if stream {
        let mut parts = service.chat_stream(message, &history).await?;
        let mut stdout = std::io::stdout();
        while let Some(part) = parts.next().await {
            write!(stdout, "{}", part?)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
        return Ok(());
    }

    let settings = UserSettings::from_config(config).context("Invalid credentials")?;
    let reply = service.chat(message, &settings, &history).await;

    for call in &reply.metadata.tool_calls {
        eprintln!("{}", format_tool_call(call));
    }
    if reply.metadata.exhausted {
        eprintln!(
            "{}",
            format_warning("Tool round limit reached; answer produced without further tool calls")
        );
    }

    println!("{}", reply.content);

    if let Some(error) = &reply.metadata.error {
        eprintln!("{}", format_error(error));
        anyhow::bail!("chat request failed");
    }

    if let Some(attachment) = &reply.attachment {
        match save_to {
            Some(dir) => {
                let path = dir.join(&attachment.filename);
                std::fs::write(&path, &attachment.content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("{}", format_success(&format!("Saved {}", path.display())));
            }
            None => eprintln!(
                "{}",
                format_info(&format!(
                    "Work log detected ({} bytes); pass --save-to to keep {}",
                    attachment.size, attachment.filename
                ))
            ),
        }
    }

    Ok(())
}

async fn cmd_worklog(
    config: &Config,
    range_text: &str,
    platform: Option<Platform>,
    project: Option<String>,
    output: Option<&Path>,
    summary_only: bool,
) -> Result<()> {
    let settings = UserSettings::from_config(config).context("Invalid credentials")?;
    let platform = platform.unwrap_or(settings.default_platform);
    let host = create_host(platform, &settings)?;

    let range = timerange::from_message(range_text, Utc::now());
    info!(
        "Building {} work log for {} ~ {}",
        platform.display_name(),
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d")
    );

    let document = generate_worklog(host.as_ref(), range, project).await?;
    let content = if summary_only {
        &document.summary
    } else {
        &document.attachment.content
    };

    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}",
                format_success(&format!(
                    "Wrote {} commits to {}",
                    document.report.total_commits,
                    path.display()
                ))
            );
        }
        None => println!("{}", content),
    }

    Ok(())
}

fn cmd_tools(config: &Config, platform: Option<Platform>) -> Result<()> {
    let platforms = match platform {
        Some(p) => vec![p],
        None => Platform::ALL.to_vec(),
    };
    let default = config.credentials.default_platform;

    for platform in platforms {
        let marker = if Some(platform) == default { " (default)" } else { "" };
        println!("{}{}", format_info(platform.display_name()), marker);
        for tool in tool_catalog(platform) {
            println!("  {:<26} {}", tool.name, tool.description);
        }
    }

    Ok(())
}

async fn cmd_mcp(config: &Config, transport: &str) -> Result<()> {
    info!("Starting MCP server (transport: {})", transport);

    if transport != "stdio" {
        return Err(anyhow::anyhow!("Unsupported transport: {}", transport));
    }

    let settings = UserSettings::from_config(config).context("Invalid credentials")?;
    let executor = ToolExecutor::from_settings(&settings)?;
    info!(
        "Serving tools for {:?}, default {}",
        executor.platforms(),
        executor.default_platform()
    );

    let server = WorklogMcp::new(Arc::new(executor));
    for tool in server.get_tool_router().list_all() {
        info!("  - {}", tool.name);
    }

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio transport")?;
    service.waiting().await?;

    Ok(())
}

fn cmd_encrypt_token(config: &Config, token: &str) -> Result<()> {
    let key = config
        .security
        .encryption_key
        .as_deref()
        .context("security.encryption_key is not set; run `worklog generate-key` first")?;
    let cipher = CredentialCipher::new(key)?;
    println!("{}", cipher.encrypt(token)?);
    Ok(())
}
