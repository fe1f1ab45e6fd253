use super::CommandResult;
use crate::core::assistant::Assistant;

pub type CommandHandler = fn(&mut Assistant, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Exit the chat.",
        handler: super::handle_quit,
    },
    Command {
        name: "clear",
        usage: "/clear",
        help: "Clear the conversation history.",
        handler: super::handle_clear,
    },
    Command {
        name: "mode",
        usage: "/mode",
        help: "Switch between raw and templated memory.",
        handler: super::handle_mode,
    },
    Command {
        name: "save",
        usage: "/save",
        help: "Save the conversation to a timestamped file.",
        handler: super::handle_save,
    },
    Command {
        name: "load",
        usage: "/load <path>",
        help: "Load a previously saved conversation.",
        handler: super::handle_load,
    },
    Command {
        name: "status",
        usage: "/status",
        help: "Show the current mode, model, and message count.",
        handler: super::handle_status,
    },
];
