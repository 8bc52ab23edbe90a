//! Interactive terminal conversation

use std::future::Future;
use std::io;
use std::io::Write;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::build_rag_service;
use crate::cli::output::print_error;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::conversation::ChatMessage;
use crate::conversation::ChatSession;
use crate::conversation::ConversationLoop;
use crate::conversation::Role;
use crate::conversation::TranscriptView;
use crate::llm::PERSONA_NAME;
use crate::AppConfig;
use crate::Result;

pub async fn handle_chat(config: &AppConfig) -> Result<()> {
    let rag = build_rag_service(config)?;
    let conversation = ConversationLoop::from_config(rag, config);

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║  💬 Interactive Chat Mode                                      ║");
    println!("║  Chatting with: {PERSONA_NAME:<47}║");
    println!("║  Commands: 'exit', 'quit'. Ctrl+C cancels an answer or exits   ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!();

    let mut session = ChatSession::new();
    let mut view = TerminalView::default();
    session.start();
    view.render(session.transcript());

    let mut lines = spawn_stdin_reader();
    let mut interrupts = spawn_interrupt_listener();

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let input = match next_input(&mut lines, &mut interrupts).await? {
            Input::Line(line) => line,
            Input::Closed => break,
            Input::Interrupted => {
                println!();
                break;
            }
        };
        let question = input.trim();

        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit")
            || question.eq_ignore_ascii_case("quit")
            || question.eq_ignore_ascii_case("q")
        {
            break;
        }

        let cancel = CancellationToken::new();
        let turn = conversation.submit(&mut session, question, &mut view, &cancel);
        if let Err(e) = until_interrupted(turn, &cancel, &mut interrupts).await {
            print_error(&e.to_string());
        }
        println!();
    }

    println!();
    print_info(&format!(
        "{} messages exchanged",
        session.transcript().len()
    ));
    print_success("👋 Conversation ended. Goodbye!");
    Ok(())
}

/// What the prompt received
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Closed,
    Interrupted,
}

/// Read stdin on its own thread so the prompt can also wait for Ctrl+C
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// One listener for the whole session; the SIGINT handler cannot be uninstalled
fn spawn_interrupt_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

async fn next_input(
    lines: &mut mpsc::UnboundedReceiver<io::Result<String>>,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<Input> {
    tokio::select! {
        biased;
        Some(()) = interrupts.recv() => Ok(Input::Interrupted),
        line = lines.recv() => match line {
            Some(line) => Ok(Input::Line(line?)),
            None => Ok(Input::Closed),
        },
    }
}

/// Run a turn, cancelling it on Ctrl+C instead of exiting
async fn until_interrupted<F: Future>(
    turn: F,
    cancel: &CancellationToken,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> F::Output {
    tokio::pin!(turn);
    loop {
        tokio::select! {
            output = &mut turn => return output,
            Some(()) = interrupts.recv() => cancel.cancel(),
        }
    }
}

/// Prints assistant replies as they arrive. User messages are already on screen.
#[derive(Default)]
struct TerminalView {
    printed: usize,
    streamed: Option<String>,
}

impl TranscriptView for TerminalView {
    fn render(&mut self, transcript: &[ChatMessage]) {
        for message in &transcript[self.printed.min(transcript.len())..] {
            if message.role != Role::Assistant {
                continue;
            }
            match self.streamed.take() {
                Some(streamed) if streamed == message.content => println!(),
                Some(_) => println!("\n{PERSONA_NAME}: {}", message.content),
                None => println!("{PERSONA_NAME}: {}", message.content),
            }
        }
        self.printed = transcript.len();
    }

    fn partial(&mut self, delta: &str) {
        let streamed = self.streamed.get_or_insert_with(|| {
            print!("{PERSONA_NAME}: ");
            String::new()
        });
        streamed.push_str(delta);
        print!("{delta}");
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ctrl_c_at_prompt_ends_chat() {
        let (_lines_tx, mut lines) = mpsc::unbounded_channel();
        let (interrupts_tx, mut interrupts) = mpsc::unbounded_channel();
        interrupts_tx.send(()).unwrap();

        let input = next_input(&mut lines, &mut interrupts).await.unwrap();
        assert_eq!(input, Input::Interrupted);
    }

    #[tokio::test]
    async fn test_prompt_reads_lines_until_closed() {
        let (lines_tx, mut lines) = mpsc::unbounded_channel();
        let (_interrupts_tx, mut interrupts) = mpsc::unbounded_channel();
        lines_tx.send(Ok("hello".to_string())).unwrap();
        drop(lines_tx);

        let input = next_input(&mut lines, &mut interrupts).await.unwrap();
        assert_eq!(input, Input::Line("hello".to_string()));
        let input = next_input(&mut lines, &mut interrupts).await.unwrap();
        assert_eq!(input, Input::Closed);
    }

    #[tokio::test]
    async fn test_ctrl_c_during_turn_cancels_it() {
        let (interrupts_tx, mut interrupts) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        interrupts_tx.send(()).unwrap();

        let turn = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                "cancelled"
            }
        };
        let output = until_interrupted(turn, &cancel, &mut interrupts).await;

        assert_eq!(output, "cancelled");
        assert!(cancel.is_cancelled());
        // The chat keeps going: the next prompt still reads input
        let (lines_tx, mut lines) = mpsc::unbounded_channel();
        lines_tx.send(Ok("next".to_string())).unwrap();
        let input = next_input(&mut lines, &mut interrupts).await.unwrap();
        assert_eq!(input, Input::Line("next".to_string()));
    }
}
