//! Slash-command parsing and execution shared by the adapters.

mod registry;

pub use registry::{all_commands, CommandInvocation};

use std::path::Path;

use crate::core::assistant::{Assistant, AssistantStatus};

pub enum CommandResult {
    /// Text to show the user; the conversation continues.
    Reply(String),
    /// Not a command; run it as a conversation turn.
    ProcessAsMessage(String),
    /// End the session.
    Quit,
}

pub fn process_input(assistant: &mut Assistant, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(assistant, invocation)
    } else {
        CommandResult::Reply(format!(
            "Unknown command: /{command_name}. Type /help for available commands."
        ))
    }
}

/// The command subset exposed over the web endpoint. Everything beyond
/// clear/mode/status stays terminal-only.
pub fn process_web_command(assistant: &mut Assistant, input: &str) -> String {
    let name = input
        .trim()
        .trim_start_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("");

    match name.to_ascii_lowercase().as_str() {
        "clear" => assistant.clear_history(),
        "mode" => assistant.switch_mode(),
        "status" => format_status(&assistant.status()),
        other => format!("Unknown command: /{other}. Available commands: /clear, /mode, /status"),
    }
}

pub fn format_status(status: &AssistantStatus) -> String {
    format!(
        "Mode: {}\nModel: {}\nMessages: {}",
        status.mode, status.model, status.turn_count
    )
}

pub(super) fn handle_help(_assistant: &mut Assistant, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Available commands:\n");
    for command in all_commands() {
        help.push_str(&format!("  {:<14} {}\n", command.usage, command.help));
    }
    CommandResult::Reply(help.trim_end().to_string())
}

pub(super) fn handle_quit(_assistant: &mut Assistant, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}

pub(super) fn handle_clear(assistant: &mut Assistant, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Reply(assistant.clear_history())
}

pub(super) fn handle_mode(assistant: &mut Assistant, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Reply(assistant.switch_mode())
}

pub(super) fn handle_save(assistant: &mut Assistant, _invocation: CommandInvocation<'_>) -> CommandResult {
    match assistant.save() {
        Ok(path) => CommandResult::Reply(format!("Conversation saved to {}", path.display())),
        Err(e) => CommandResult::Reply(format!("Save failed: {e}")),
    }
}

pub(super) fn handle_load(assistant: &mut Assistant, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Reply("Usage: /load <path>".to_string());
    }
    match assistant.load(Path::new(invocation.args)) {
        Ok(confirmation) => CommandResult::Reply(confirmation),
        Err(e) => CommandResult::Reply(format!("Load failed: {e}")),
    }
}

pub(super) fn handle_status(assistant: &mut Assistant, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Reply(format_status(&assistant.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assistant::{CompletionBackend, CompletionError, CompletionInput};
    use crate::core::store::ChatMode;
    use async_trait::async_trait;

    struct NoopBackend;

    #[async_trait]
    impl CompletionBackend for NoopBackend {
        async fn complete(&self, _input: CompletionInput) -> Result<String, CompletionError> {
            Ok("noop".to_string())
        }
    }

    fn assistant() -> Assistant {
        Assistant::new(Box::new(NoopBackend), "test-model", ChatMode::Raw, "unused")
    }

    #[test]
    fn plain_text_passes_through_as_a_message() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "hello there") {
            CommandResult::ProcessAsMessage(text) => assert_eq!(text, "hello there"),
            _ => panic!("expected pass-through"),
        }
    }

    #[test]
    fn known_commands_dispatch_case_insensitively() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "/MODE") {
            CommandResult::Reply(text) => assert_eq!(text, "Switched to templated mode"),
            _ => panic!("expected a reply"),
        }
        assert_eq!(assistant.mode(), ChatMode::Templated);
    }

    #[test]
    fn unknown_commands_reply_with_guidance() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "/frobnicate") {
            CommandResult::Reply(text) => {
                assert!(text.contains("Unknown command: /frobnicate"));
            }
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn quit_ends_the_session() {
        let mut assistant = assistant();
        assert!(matches!(
            process_input(&mut assistant, "/quit"),
            CommandResult::Quit
        ));
    }

    #[test]
    fn load_without_arguments_prints_usage() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "/load") {
            CommandResult::Reply(text) => assert_eq!(text, "Usage: /load <path>"),
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn load_with_a_missing_file_reports_the_error() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "/load nope/missing.json") {
            CommandResult::Reply(text) => assert!(text.starts_with("Load failed:")),
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn help_lists_every_command() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "/help") {
            CommandResult::Reply(text) => {
                for command in all_commands() {
                    assert!(text.contains(command.usage), "missing {}", command.usage);
                }
            }
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn status_reports_mode_model_and_count() {
        let mut assistant = assistant();
        match process_input(&mut assistant, "/status") {
            CommandResult::Reply(text) => {
                assert!(text.contains("Mode: raw"));
                assert!(text.contains("Model: test-model"));
                assert!(text.contains("Messages: 1"));
            }
            _ => panic!("expected a reply"),
        }
    }

    #[test]
    fn web_subset_rejects_terminal_only_commands() {
        let mut assistant = assistant();
        let reply = process_web_command(&mut assistant, "/save");
        assert!(reply.contains("Unknown command: /save"));
        assert!(reply.contains("/clear, /mode, /status"));

        let reply = process_web_command(&mut assistant, "/mode");
        assert_eq!(reply, "Switched to templated mode");
    }
}
