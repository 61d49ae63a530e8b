// inkwell-cli/src/console.rs

//! Terminal side of the interactive session.

use anyhow::{anyhow, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, warn};

use inkwell_core::{async_trait, AgentError, TurnReply, UserInteraction};

use crate::rendering::{print_panel, print_reply, PanelKind};

const HISTORY_FILE_NAME: &str = "cli_history.txt";

pub fn thinking_spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "-"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Determinate bar for work with a known row count; the length is set by the caller.
pub fn batch_progress(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    pb.set_message(message.to_string());
    Ok(pb)
}

pub struct ConsoleUi {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    spinner: Option<ProgressBar>,
}

impl ConsoleUi {
    /// Sets up line editing and loads prompt history from `history_dir`.
    pub fn new(history_dir: Option<PathBuf>) -> Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .edit_mode(rustyline::EditMode::Emacs)
            .auto_add_history(true)
            .build();
        let mut editor = DefaultEditor::with_config(rl_config)?;

        let history_path = match history_dir {
            Some(dir) => {
                fs::create_dir_all(&dir).context("Failed to create history directory")?;
                Some(dir.join(HISTORY_FILE_NAME))
            }
            None => None,
        };
        if let Some(path) = &history_path {
            if editor.load_history(path).is_err() {
                debug!(path = %path.display(), "No previous CLI history found or error loading.");
            }
        }

        Ok(Self {
            editor,
            history_path,
            spinner: None,
        })
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn print_welcome(&self) {
        println!("\n{}", "Inkwell - AI Email Assistant".cyan().bold());
        println!(
            "{}",
            "Ask about your inbox, or have me write and reply to email. Type 'exit' or Ctrl-D to quit."
                .dimmed()
        );
        println!();
    }
}

#[async_trait]
impl UserInteraction for ConsoleUi {
    async fn read_input(&mut self, prompt: &str) -> Result<Option<String>> {
        let prompt = format!("{} {} ", prompt.yellow().bold(), ">".green().bold());
        match self.editor.readline(&prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C drops the current line only.
                println!("{}", "^C".yellow());
                Ok(Some(String::new()))
            }
            Err(ReadlineError::Eof) => {
                debug!("EOF detected, ending session.");
                Ok(None)
            }
            Err(err) => {
                error!("Readline error: {:?}", err);
                Err(anyhow!("Error reading input: {}", err))
            }
        }
    }

    fn turn_started(&mut self) {
        self.stop_spinner();
        match thinking_spinner("Thinking...") {
            Ok(pb) => self.spinner = Some(pb),
            Err(e) => warn!(error = %e, "Could not start spinner"),
        }
    }

    fn show_reply(&mut self, reply: &TurnReply) {
        self.stop_spinner();
        println!();
        print_reply(reply);
    }

    fn show_error(&mut self, error: &AgentError) {
        self.stop_spinner();
        print_panel(PanelKind::Error, &error.to_string());
    }

    fn show_message(&mut self, message: &str) {
        self.stop_spinner();
        println!("\n{}\n", message.cyan());
    }
}

impl Drop for ConsoleUi {
    fn drop(&mut self) {
        self.stop_spinner();
        if let Some(path) = &self.history_path {
            if let Err(e) = self.editor.save_history(path) {
                warn!(path = %path.display(), error = %e, "Failed to save CLI history.");
            } else {
                debug!(path = %path.display(), "Saved CLI history.");
            }
        }
    }
}
