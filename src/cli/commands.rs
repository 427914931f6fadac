//! CLI command implementations.
//!
//! Every command that talks to the model builds its configuration first, so
//! a missing API key fails before any document is read. Async work runs on a
//! current-thread runtime built here; Ctrl-C cancels the running operation
//! between model calls.

use std::future::Future;
use std::io::{self, BufRead, Write as IoWrite};
use std::path::{Path, PathBuf};

use serde_json::json;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::agent::config::AgentConfig;
use crate::agent::orchestrator::Orchestrator;
use crate::agent::schema::ExtractionSchema;
use crate::cli::output::{
    OutputFormat, format_answer, format_chunks, format_extraction, format_history,
    format_translation,
};
use crate::cli::parser::{Cli, Commands};
use crate::core::{Document, Session};
use crate::error::{AgentError, CommandError, Result};
use crate::io::load_document;

const SESSION_HELP: &str = "\
Type a question, or one of:
  :summary            extract key tender information
  :translate <lang>   translate the latest summary
  :history            show questions asked so far
  :reset              clear the question history
  :load <file>        switch to another document
  :help               show this help
  :quit               leave the session
Ctrl-C stops the running request only; use :quit or Ctrl-D to leave.
";

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if configuration, document loading or the model calls
/// fail.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Chunks {
            file,
            chunk_size,
            overlap,
        } => cmd_chunks(file, *chunk_size, *overlap, format),
        Commands::Summarize {
            file,
            schema,
            translate,
        } => cmd_summarize(
            agent_config(cli, *schema)?,
            file,
            translate.as_deref(),
            format,
        ),
        Commands::Ask { file, question } => cmd_ask(
            agent_config(cli, ExtractionSchema::default())?,
            file,
            question,
            format,
        ),
        Commands::Translate { file, to, schema } => {
            cmd_translate(agent_config(cli, *schema)?, file, to, format)
        }
        Commands::Session { file, schema } => cmd_session(agent_config(cli, *schema)?, file, format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Builds the agent configuration: CLI values, then environment, then
/// defaults.
fn agent_config(cli: &Cli, schema: ExtractionSchema) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().schema(schema);
    if let Some(dir) = &cli.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    Ok(builder.from_env().build()?)
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
        })
}

/// Drives `fut` to completion, cancelling `cancel` on Ctrl-C.
fn block_on_interruptible<F: Future>(rt: &Runtime, cancel: &CancellationToken, fut: F) -> F::Output {
    rt.block_on(async {
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received; stopping after the current call");
                    cancel.cancel();
                }
            }
        });
        let output = fut.await;
        watcher.abort();
        output
    })
}

fn cmd_chunks(file: &Path, chunk_size: usize, overlap: usize, format: OutputFormat) -> Result<String> {
    let document = load_document(file, chunk_size, overlap)?;
    Ok(format_chunks(&document, chunk_size, overlap, format))
}

fn open_document(config: &AgentConfig, file: &Path) -> Result<Document> {
    load_document(file, config.chunk_size, config.overlap)
}

fn cmd_summarize(
    config: AgentConfig,
    file: &Path,
    translate: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let orchestrator = Orchestrator::from_config(config)?;
    let document = open_document(orchestrator.config(), file)?;
    summarize_document(&runtime()?, &orchestrator, document, translate, format)
}

fn summarize_document(
    rt: &Runtime,
    orchestrator: &Orchestrator,
    document: Document,
    translate: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let name = document.name.clone();
    let mut session = Session::new(document);
    let cancel = CancellationToken::new();

    block_on_interruptible(rt, &cancel, async {
        session.summarize(orchestrator, &cancel).await?;
        if let Some(language) = translate {
            session
                .translate_summary(orchestrator, language, &cancel)
                .await?;
        }
        Ok::<_, AgentError>(())
    })?;

    let report = session.extraction().ok_or_else(|| {
        CommandError::ExecutionFailed("summary missing after extraction".to_string())
    })?;
    Ok(format_extraction(&name, report, session.translation(), format))
}

fn cmd_ask(config: AgentConfig, file: &Path, question: &str, format: OutputFormat) -> Result<String> {
    let orchestrator = Orchestrator::from_config(config)?;
    let document = open_document(orchestrator.config(), file)?;
    ask_document(&runtime()?, &orchestrator, document, question, format)
}

fn ask_document(
    rt: &Runtime,
    orchestrator: &Orchestrator,
    document: Document,
    question: &str,
    format: OutputFormat,
) -> Result<String> {
    let mut session = Session::new(document);
    let cancel = CancellationToken::new();
    let report = block_on_interruptible(rt, &cancel, session.ask(orchestrator, question, &cancel))?;
    Ok(format_answer(&report, format))
}

fn cmd_translate(config: AgentConfig, file: &Path, language: &str, format: OutputFormat) -> Result<String> {
    let orchestrator = Orchestrator::from_config(config)?;
    let document = open_document(orchestrator.config(), file)?;
    translate_document(&runtime()?, &orchestrator, document, language, format)
}

fn translate_document(
    rt: &Runtime,
    orchestrator: &Orchestrator,
    document: Document,
    language: &str,
    format: OutputFormat,
) -> Result<String> {
    let name = document.name.clone();
    let mut session = Session::new(document);
    let cancel = CancellationToken::new();

    let translation = block_on_interruptible(rt, &cancel, async {
        session.summarize(orchestrator, &cancel).await?;
        let translation = session
            .translate_summary(orchestrator, language, &cancel)
            .await?
            .clone();
        Ok::<_, AgentError>(translation)
    })?;

    Ok(format_translation(&name, &translation, format))
}

fn cmd_session(config: AgentConfig, file: &Path, format: OutputFormat) -> Result<String> {
    let orchestrator = Orchestrator::from_config(config)?;
    let document = open_document(orchestrator.config(), file)?;
    let mut session = Session::new(document);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_session(
        &runtime()?,
        &orchestrator,
        &mut session,
        stdin.lock(),
        &mut stdout,
        format,
    )?;
    Ok(String::new())
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum SessionInput<'a> {
    Blank,
    Question(&'a str),
    Summary,
    Translate(&'a str),
    History,
    Reset,
    Load(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_session_line(line: &str) -> SessionInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return SessionInput::Blank;
    }
    let Some(command) = line.strip_prefix(':') else {
        return SessionInput::Question(line);
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match name.to_ascii_lowercase().as_str() {
        "summary" | "summarize" => SessionInput::Summary,
        "translate" => SessionInput::Translate(arg),
        "history" => SessionInput::History,
        "reset" => SessionInput::Reset,
        "load" => SessionInput::Load(arg),
        "help" | "h" | "?" => SessionInput::Help,
        "quit" | "q" | "exit" => SessionInput::Quit,
        _ => SessionInput::Unknown(line),
    }
}

fn emit(output: &mut impl IoWrite, text: &str) -> Result<()> {
    output
        .write_all(text.as_bytes())
        .and_then(|()| output.flush())
        .map_err(|e| CommandError::OutputFormat(format!("failed to write output: {e}")).into())
}

fn render_error(error: &dyn std::error::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{error}\n"),
        OutputFormat::Json => format.to_json(&json!({ "error": error.to_string() })),
    }
}

/// Runs the interactive loop until `:quit` or end of input.
///
/// Failures of a single line are reported and the loop continues.
fn run_session<R: BufRead, W: IoWrite>(
    rt: &Runtime,
    orchestrator: &Orchestrator,
    session: &mut Session,
    input: R,
    output: &mut W,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Text {
        if let Some(doc) = session.document() {
            emit(
                output,
                &format!(
                    "Loaded {} ({} chars, {} chunk(s)). Type a question or :help.\n",
                    doc.name,
                    doc.char_len(),
                    doc.chunks.len()
                ),
            )?;
        }
        emit(output, "> ")?;
    }

    for line in input.lines() {
        let line = line.map_err(|e| CommandError::ExecutionFailed(format!("failed to read input: {e}")))?;
        let cancel = CancellationToken::new();

        let rendered = match parse_session_line(&line) {
            SessionInput::Blank => None,
            SessionInput::Quit => break,
            SessionInput::Help => Some(SESSION_HELP.to_string()),
            SessionInput::Unknown(command) => Some(render_error(
                &CommandError::InvalidInput(format!("unknown command {command}; try :help")),
                format,
            )),
            SessionInput::Question(question) => Some(
                match block_on_interruptible(rt, &cancel, session.ask(orchestrator, question, &cancel)) {
                    Ok(report) => format_answer(&report, format),
                    Err(e) => render_error(&e, format),
                },
            ),
            SessionInput::Summary => {
                let name = session.document().map(|d| d.name.clone()).unwrap_or_default();
                Some(
                    match block_on_interruptible(rt, &cancel, session.summarize(orchestrator, &cancel)) {
                        Ok(report) => format_extraction(&name, report, None, format),
                        Err(e) => render_error(&e, format),
                    },
                )
            }
            SessionInput::Translate("") => Some(render_error(
                &CommandError::InvalidInput("usage: :translate <language>".to_string()),
                format,
            )),
            SessionInput::Translate(language) => {
                let name = session.document().map(|d| d.name.clone()).unwrap_or_default();
                Some(
                    match block_on_interruptible(
                        rt,
                        &cancel,
                        session.translate_summary(orchestrator, language, &cancel),
                    ) {
                        Ok(translation) => format_translation(&name, translation, format),
                        Err(e) => render_error(&e, format),
                    },
                )
            }
            SessionInput::History => Some(format_history(session.history(), format)),
            SessionInput::Reset => {
                session.reset_history();
                Some(match format {
                    OutputFormat::Text => "History cleared.\n".to_string(),
                    OutputFormat::Json => format.to_json(&json!({ "history": "cleared" })),
                })
            }
            SessionInput::Load("") => Some(render_error(
                &CommandError::InvalidInput("usage: :load <file>".to_string()),
                format,
            )),
            SessionInput::Load(path) => {
                let config = orchestrator.config();
                Some(match load_document(Path::new(path), config.chunk_size, config.overlap) {
                    Ok(document) => {
                        let message = format!(
                            "Loaded {} ({} chars, {} chunk(s)).",
                            document.name,
                            document.char_len(),
                            document.chunks.len()
                        );
                        session.load(document);
                        match format {
                            OutputFormat::Text => format!("{message}\n"),
                            OutputFormat::Json => format.to_json(&json!({ "loaded": message })),
                        }
                    }
                    Err(e) => render_error(&e, format),
                })
            }
        };

        if let Some(text) = rendered {
            emit(output, &text)?;
        }
        if format == OutputFormat::Text {
            emit(output, "> ")?;
        }
    }

    if format == OutputFormat::Text {
        emit(output, "\n")?;
    }
    Ok(())
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    use crate::agent::prompt::PromptSet;

    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                output.push_str("  ");
                output.push_str(&name);
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize the extraction, answer and translation prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => Ok(format.to_json(&json!({
            "directory": target_dir.to_string_lossy(),
            "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
            "count": written.len(),
        }))),
    }
}
