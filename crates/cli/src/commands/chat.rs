//! Interactive chat command handler.

use crate::context::AppContext;
use clap::Args;
use docchat_core::AppResult;
use std::io::{BufRead, Write};

/// Interactive chat against the ingested document
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    pub async fn execute(&self, ctx: &AppContext) -> AppResult<()> {
        tracing::info!("Starting interactive chat");

        let session = ctx.load_session()?;

        match session.source_name() {
            Some(source) => println!("Chatting with '{}'. Type 'exit' to quit.", source),
            None => println!("No document ingested; answering as plain chat. Type 'exit' to quit."),
        }

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            print!("> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                break;
            }

            match ctx.orchestrator.ask(&session, question).await {
                Ok(answer) => {
                    println!("{}", answer);
                    println!();
                }
                Err(e) => {
                    // A failed turn is reported and the chat continues;
                    // history is untouched by failures.
                    eprintln!("error: {}", e);
                }
            }

            ctx.store.save(&session)?;
        }

        ctx.store.save(&session)?;
        println!("bye");

        Ok(())
    }
}
