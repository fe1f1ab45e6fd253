//! Line-oriented terminal adapter.
//!
//! Reads lines from standard input; `/`-prefixed lines dispatch through
//! the command registry and everything else becomes a conversation turn.
//! Replies render with a typewriter effect, which is cosmetic only.

use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{self, CommandResult};
use crate::core::assistant::Assistant;

pub struct ChatTerminal {
    assistant: Assistant,
    typewriter_delay: Duration,
}

impl ChatTerminal {
    pub fn new(assistant: Assistant, typewriter_delay: Duration) -> Self {
        Self {
            assistant,
            typewriter_delay,
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error>> {
        self.print_welcome();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("You > ");
            io::stdout().flush()?;

            // EOF on stdin ends the session like /quit.
            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match commands::process_input(&mut self.assistant, input) {
                CommandResult::Quit => {
                    println!("Goodbye!");
                    break;
                }
                CommandResult::Reply(text) => {
                    println!("System > {text}");
                }
                CommandResult::ProcessAsMessage(text) => {
                    print!("AI > ");
                    io::stdout().flush()?;
                    match self.assistant.respond(text.trim()).await {
                        Ok(reply) => self.typewrite(&reply).await?,
                        Err(e) => {
                            println!();
                            eprintln!("Error: {e}");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn typewrite(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        for ch in text.chars() {
            write!(stdout, "{ch}")?;
            stdout.flush()?;
            if !self.typewriter_delay.is_zero() {
                tokio::time::sleep(self.typewriter_delay).await;
            }
        }
        writeln!(stdout)?;
        Ok(())
    }

    fn print_welcome(&self) {
        let status = self.assistant.status();
        println!("{}", "=".repeat(50));
        println!("  Parley — chat with {} ({} mode)", status.model, status.mode);
        println!("  Type /help for commands, /quit to exit");
        println!("{}", "=".repeat(50));
    }
}
