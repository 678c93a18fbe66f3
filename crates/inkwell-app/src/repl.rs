//! Line-oriented chat loop over stdin.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use inkwell_ai::{ChatSession, ContextTrigger, Document, DocumentStore, Role, TurnStatus};
use inkwell_common::InkwellError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::setup::Components;

const HELP: &str = "\
Type a prompt and press enter. Mention the trigger to send the open document as context.
  /docs            list saved documents
  /open <title>    open a document as chat context
  /close           close the open document
  /save <title>    save the last answer as a document
  /delete <title>  delete a document
  /history         show the conversation so far
  /help            show this help
  /quit            exit
Ctrl-C cancels an answer while it streams.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    Docs,
    Open(String),
    Close,
    Save(String),
    Delete(String),
    History,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`; a malformed command
/// yields a usage message.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Prompt(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let titled = |make: fn(String) -> Command| {
        if arg.is_empty() {
            Err(format!("usage: /{name} <title>"))
        } else {
            Ok(Some(make(arg.to_string())))
        }
    };

    match name {
        "docs" => Ok(Some(Command::Docs)),
        "open" => titled(Command::Open),
        "close" => Ok(Some(Command::Close)),
        "save" => titled(Command::Save),
        "delete" => titled(Command::Delete),
        "history" => Ok(Some(Command::History)),
        "help" => Ok(Some(Command::Help)),
        "quit" | "exit" => Ok(Some(Command::Quit)),
        other => Err(format!("unknown command /{other} (try /help)")),
    }
}

pub struct Repl {
    session: Arc<ChatSession>,
    documents: Arc<dyn DocumentStore>,
    trigger: ContextTrigger,
    turn_timeout: Option<Duration>,
    /// Document sent as context when a prompt mentions the trigger.
    context: Option<Document>,
}

impl Repl {
    pub fn new(components: Components) -> Self {
        Self {
            session: components.session,
            documents: components.documents,
            trigger: components.trigger,
            turn_timeout: components.turn_timeout,
            context: None,
        }
    }

    pub fn open_document(&self) -> Option<&Document> {
        self.context.as_ref()
    }

    /// Read commands from stdin until `/quit`, end of input, or Ctrl-C at
    /// the prompt.
    pub async fn run(&mut self) -> Result<(), InkwellError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut out = std::io::stdout();
        writeln!(out, "inkwell {} (/help for commands)", env!("CARGO_PKG_VERSION"))?;
        if let Some(doc) = self.open_document() {
            writeln!(out, "context document: '{}'", doc.title)?;
        }

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                writeln!(out)?;
                break;
            };

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(usage) => {
                    writeln!(out, "{usage}")?;
                    continue;
                }
            };
            match self.handle(command, &mut out).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    warn!(error = %e, "Command failed");
                    writeln!(out, "error: {e}")?;
                }
            }
        }
        info!("Chat loop finished");
        Ok(())
    }

    pub async fn handle(
        &mut self,
        command: Command,
        out: &mut dyn Write,
    ) -> Result<Flow, InkwellError> {
        match command {
            Command::Prompt(prompt) => self.ask(&prompt, out).await?,
            Command::Docs => self.list_documents(out).await?,
            Command::Open(title) => self.open(&title, out).await?,
            Command::Close => match self.context.take() {
                Some(doc) => writeln!(out, "closed '{}'", doc.title)?,
                None => writeln!(out, "no document open")?,
            },
            Command::Save(title) => self.save_answer(&title, out).await?,
            Command::Delete(title) => self.delete(&title, out).await?,
            Command::History => self.print_history(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Load a document and keep it as the chat context.
    pub async fn open(&mut self, title: &str, out: &mut dyn Write) -> Result<(), InkwellError> {
        let doc = self.documents.get(title).await.map_err(document_error)?;
        writeln!(
            out,
            "opened '{}' ({} chars); mention {} to include it",
            doc.title,
            doc.content.chars().count(),
            self.trigger.marker()
        )?;
        info!(title = %doc.title, "Context document opened");
        self.context = Some(doc);
        Ok(())
    }

    async fn ask(&self, prompt: &str, out: &mut dyn Write) -> Result<(), InkwellError> {
        let include = self.trigger.detect(prompt);
        let context = match (&self.context, include) {
            (Some(doc), true) => doc.content.as_str(),
            (None, true) => {
                writeln!(out, "(no document open, sending without context)")?;
                ""
            }
            (_, false) => "",
        };

        let submit = self.session.submit(prompt, include, context);
        tokio::pin!(submit);
        let deadline = expire(self.turn_timeout);
        tokio::pin!(deadline);

        let mut cancel_sent = false;
        let result = loop {
            tokio::select! {
                result = &mut submit => break result,
                _ = tokio::signal::ctrl_c(), if !cancel_sent => {
                    cancel_sent = true;
                    info!("Interrupted, cancelling turn");
                    self.session.cancel();
                }
                _ = &mut deadline, if !cancel_sent => {
                    cancel_sent = true;
                    warn!(timeout = ?self.turn_timeout, "Turn timed out, cancelling");
                    self.session.cancel();
                }
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) if err.is_precondition() => {
                writeln!(out, "{err}")?;
                return Ok(());
            }
            Err(err) => return Err(InkwellError::Chat(err.to_string())),
        };
        debug!(
            status = ?outcome.turn.status(),
            content_frames = outcome.content_frames,
            "Answer received"
        );
        Ok(())
    }

    async fn list_documents(&self, out: &mut dyn Write) -> Result<(), InkwellError> {
        let docs = self.documents.list().await.map_err(document_error)?;
        if docs.is_empty() {
            writeln!(out, "no documents")?;
            return Ok(());
        }
        let open = self.context.as_ref().map(|doc| doc.title.as_str());
        for doc in docs {
            let marker = if open == Some(doc.title.as_str()) { "*" } else { " " };
            writeln!(out, "{marker} {}  ({})", doc.title, doc.created_at)?;
        }
        Ok(())
    }

    async fn save_answer(&self, title: &str, out: &mut dyn Write) -> Result<(), InkwellError> {
        let answer = self
            .session
            .last_answer()
            .filter(|turn| turn.status() == TurnStatus::Complete && !turn.text().is_empty());
        let Some(answer) = answer else {
            writeln!(out, "no completed answer to save")?;
            return Ok(());
        };
        self.documents
            .upsert(title, answer.text())
            .await
            .map_err(document_error)?;
        writeln!(out, "saved last answer as '{title}'")?;
        Ok(())
    }

    async fn delete(&mut self, title: &str, out: &mut dyn Write) -> Result<(), InkwellError> {
        self.documents.delete(title).await.map_err(document_error)?;
        if self.context.as_ref().is_some_and(|doc| doc.title == title) {
            self.context = None;
        }
        writeln!(out, "deleted '{title}'")?;
        Ok(())
    }

    fn print_history(&self, out: &mut dyn Write) -> Result<(), InkwellError> {
        for turn in self.session.turns() {
            let who = match turn.role() {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            let flag = match turn.status() {
                TurnStatus::Errored => " [failed]",
                TurnStatus::Pending | TurnStatus::Streaming => " [in progress]",
                TurnStatus::Complete => "",
            };
            writeln!(out, "{who}{flag}: {}", turn.text())?;
        }
        Ok(())
    }
}

fn document_error(err: inkwell_ai::DocumentError) -> InkwellError {
    InkwellError::Document(err.to_string())
}

/// Resolves after `timeout`, or never.
async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
