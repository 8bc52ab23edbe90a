//! One-shot question handler

use super::build_rag_service;
use crate::cli::output::print_info;
use crate::cli::output::print_sources;
use crate::cli::output::print_warning;
use crate::llm::PERSONA_NAME;
use crate::rag::Answer;
use crate::AppConfig;
use crate::Result;

pub async fn handle_ask(
    config: &AppConfig,
    question: String,
    top_k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(top_k) = top_k {
        config.retrieval.top_k = top_k;
        config.validate()?;
    }

    print_info(&format!("🤖 Asking {PERSONA_NAME}: \"{question}\""));
    let rag = build_rag_service(&config)?;
    let response = rag.answer(&question).await?;

    println!();
    match &response.answer {
        Answer::Generated(text) => println!("{text}"),
        other => print_warning(other.text()),
    }

    if show_sources {
        println!();
        print_sources(&response.sources);
    }

    Ok(())
}
