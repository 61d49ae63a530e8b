// inkwell-core/src/session.rs

//! Reads user lines and feeds them to a [`Conversation`] until `exit`.

use tracing::{error, info};

use crate::conversation::Conversation;
use crate::errors::AgentError;
use crate::UserInteraction;

pub const PROMPT: &str = "Enter your command";
pub const FAREWELL: &str = "Exiting bot. Goodbye!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Exit,
    Blank,
    Message(String),
}

pub fn parse_input(line: &str) -> SessionInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        SessionInput::Blank
    } else if trimmed.eq_ignore_ascii_case("exit") {
        SessionInput::Exit
    } else {
        SessionInput::Message(trimmed.to_string())
    }
}

/// Runs until the user types `exit` or input ends. Turn failures are shown
/// and the loop carries on; only a failure to read input ends it early.
pub async fn run_session<UI>(conversation: &mut Conversation, ui: &mut UI) -> Result<(), AgentError>
where
    UI: UserInteraction + ?Sized,
{
    info!("Starting interactive session.");
    loop {
        let line = ui.read_input(PROMPT).await.map_err(AgentError::Ui)?;
        let text = match line.as_deref().map(parse_input) {
            None | Some(SessionInput::Exit) => {
                ui.show_message(FAREWELL);
                info!("Session ended by user.");
                return Ok(());
            }
            Some(SessionInput::Blank) => continue,
            Some(SessionInput::Message(text)) => text,
        };

        ui.turn_started();
        match conversation.handle_turn(&text).await {
            Ok(reply) => ui.show_reply(&reply),
            Err(e) => {
                error!(error = ?e, "Turn failed.");
                ui.show_error(&e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("exit"), SessionInput::Exit);
        assert_eq!(parse_input("  EXIT \n"), SessionInput::Exit);
        assert_eq!(parse_input("   "), SessionInput::Blank);
        assert_eq!(parse_input(""), SessionInput::Blank);
        assert_eq!(
            parse_input(" list my emails "),
            SessionInput::Message("list my emails".to_string())
        );
        assert_eq!(
            parse_input("exit now"),
            SessionInput::Message("exit now".to_string())
        );
    }
}
