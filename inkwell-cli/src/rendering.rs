// src/rendering.rs
use anyhow::Result;
use colored::{Color as PanelColor, Colorize};
use lazy_static::lazy_static;
use std::io;
use termimad::{crossterm::style::Color, MadSkin};

use inkwell_core::{ToolExecutionStatus, TurnReply};

lazy_static! {
    static ref SKIN: MadSkin = create_skin();
}

const PANEL_WIDTH: usize = 60;

fn create_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.inline_code.set_fg(Color::Cyan);
    skin.inline_code.set_bg(Color::Reset);
    skin.code_block.set_fg(Color::Reset);
    skin.code_block.set_bg(Color::Reset);
    skin.bold.set_fg(Color::Yellow);
    skin
}

/// Renders model output as terminal markdown.
pub fn print_formatted(markdown_text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    SKIN.write_text_on(&mut stdout, markdown_text)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Response,
    ToolResult,
    Error,
    Warning,
}

impl PanelKind {
    pub fn title(&self) -> &'static str {
        match self {
            PanelKind::Response => "AI Response",
            PanelKind::ToolResult => "Tool Result",
            PanelKind::Error => "Error",
            PanelKind::Warning => "Warning",
        }
    }

    fn color(&self) -> PanelColor {
        match self {
            PanelKind::Response => PanelColor::Green,
            PanelKind::ToolResult => PanelColor::Blue,
            PanelKind::Error => PanelColor::Red,
            PanelKind::Warning => PanelColor::Yellow,
        }
    }
}

/// Uncoloured frame lines around `body`.
pub fn panel_lines(title: &str, body: &str) -> Vec<String> {
    let header = format!("╭─ {} ", title);
    let fill = PANEL_WIDTH.saturating_sub(header.chars().count());
    let mut lines = vec![format!("{}{}", header, "─".repeat(fill))];
    if body.trim().is_empty() {
        lines.push("│".to_string());
    } else {
        lines.extend(body.trim_end().lines().map(|line| format!("│ {}", line)));
    }
    lines.push(format!("╰{}", "─".repeat(PANEL_WIDTH - 1)));
    lines
}

pub fn print_panel(kind: PanelKind, body: &str) {
    let color = kind.color();
    let lines = panel_lines(kind.title(), body);
    let last = lines.len() - 1;
    for (i, line) in lines.into_iter().enumerate() {
        if i == 0 {
            println!("{}", line.color(color).bold());
        } else if i == last {
            println!("{}", line.color(color));
        } else {
            // Only the frame is coloured.
            let content = line.trim_start_matches('│');
            println!("{}{}", "│".color(color), content);
        }
    }
}

/// Tool panel body: a header naming the tool, then its raw output.
pub fn tool_result_body(reply: &TurnReply) -> Option<String> {
    let result = reply.tool_results.first()?;
    let status = match result.status {
        ToolExecutionStatus::Success => "ok",
        ToolExecutionStatus::Failure => "failed",
    };
    Some(format!(
        "{} ({})\n{}",
        result.tool_name, status, result.output
    ))
}

/// Error panel body for a turn whose tool ran but whose answer never came back.
pub fn model_error_body(reply: &TurnReply) -> Option<String> {
    reply
        .model_error
        .as_ref()
        .map(|error| format!("The tool ran, but no final answer was produced.\n{}", error))
}

pub fn print_reply(reply: &TurnReply) {
    if !reply.dropped_tool_calls.is_empty() {
        print_panel(
            PanelKind::Warning,
            &format!(
                "Only one tool runs per turn. Ignored: {}",
                reply.dropped_tool_calls.join(", ")
            ),
        );
    }
    if let Some(body) = tool_result_body(reply) {
        print_panel(PanelKind::ToolResult, &body);
    }
    if let Some(body) = model_error_body(reply) {
        print_panel(PanelKind::Error, &body);
        return;
    }

    println!("{}", panel_lines(PanelKind::Response.title(), "")[0].green().bold());
    match reply.content.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            if let Err(e) = print_formatted(text) {
                tracing::error!("Failed to render AI message markdown: {}. Printing raw.", e);
                println!("{}", text);
            }
        }
        _ => println!("{}", "(no response text)".dimmed()),
    }
    println!("{}", format!("╰{}", "─".repeat(PANEL_WIDTH - 1)).green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_core::ToolExecutionResult;

    #[test]
    fn test_panel_lines_frame_body() {
        let lines = panel_lines("Tool Result", "first\nsecond\n");
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("╭─ Tool Result ─"));
        assert_eq!(lines[0].chars().count(), PANEL_WIDTH);
        assert_eq!(lines[1], "│ first");
        assert_eq!(lines[2], "│ second");
        assert!(lines[3].starts_with('╰'));
    }

    #[test]
    fn test_panel_lines_empty_body() {
        let lines = panel_lines("Warning", "   ");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "│");
    }

    #[test]
    fn test_tool_result_body() {
        let mut reply = TurnReply::default();
        assert_eq!(tool_result_body(&reply), None);

        reply.tool_results.push(ToolExecutionResult {
            tool_call_id: "call_1".to_string(),
            tool_name: "read_email".to_string(),
            input: serde_json::json!({"email_id": "m1"}),
            output: "Subject: Hi".to_string(),
            status: ToolExecutionStatus::Success,
        });
        assert_eq!(
            tool_result_body(&reply).as_deref(),
            Some("read_email (ok)\nSubject: Hi")
        );
    }

    #[test]
    fn test_model_error_body_reports_completed_tool() {
        let mut reply = TurnReply::default();
        assert_eq!(model_error_body(&reply), None);

        reply.model_error = Some("API Error: 503 - overloaded".to_string());
        let body = model_error_body(&reply).unwrap();
        assert!(body.starts_with("The tool ran"));
        assert!(body.ends_with("503 - overloaded"));
    }

    #[test]
    fn test_panel_titles() {
        assert_eq!(PanelKind::Response.title(), "AI Response");
        assert_eq!(PanelKind::Error.title(), "Error");
    }
}
