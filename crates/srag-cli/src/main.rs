//! Command-line interface for the SRAG report agent

use anyhow::Context;
use clap::{Parser, Subcommand};
use srag_core::AuditLog;
use srag_llm::providers::groq::GroqProvider;
use srag_report::{SragConfig, StoreAccessor, build_registry};
use srag_runtime::{Orchestrator, OrchestratorConfig, TaskOutcome};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "srag")]
#[command(about = "Agente de relatórios de vigilância SRAG", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Gera o relatório completo de vigilância (padrão)
    Report,

    /// Modo interativo: faça perguntas ao agente sobre os dados
    Interactive,

    /// Verifica os pré-requisitos de execução
    Verify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so GROQ_API_KEY and the SRAG_* overrides are visible
    dotenvy::dotenv().ok();
    srag_core::logging::init_tracing();

    let cli = Cli::parse();
    let config = SragConfig::default().with_env_overrides();
    config.validate().map_err(anyhow::Error::from)?;

    match cli.command.unwrap_or(Command::Report) {
        Command::Report => run_report(&config).await,
        Command::Interactive => run_interactive(&config).await,
        Command::Verify => run_verify(&config),
    }
}

/// Wire up the store, tools, provider and loop for one session
fn build_orchestrator(config: &SragConfig) -> anyhow::Result<Orchestrator> {
    let audit = AuditLog::new();
    let store = Arc::new(
        StoreAccessor::open(&config.db_path, audit.clone())
            .context("falha ao abrir o banco de dados SRAG")?,
    );
    let registry = Arc::new(build_registry(config, store)?);
    let provider = Arc::new(GroqProvider::from_env()?);

    Ok(Orchestrator::new(
        provider,
        registry,
        OrchestratorConfig {
            model: config.model.clone(),
            max_iterations: config.max_iterations,
        },
        audit,
    ))
}

async fn run_report(config: &SragConfig) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    info!("Iniciando geração do relatório completo");
    let outcome = orchestrator.generate_full_report().await;
    print_outcome(&outcome);

    if outcome.success {
        Ok(())
    } else {
        anyhow::bail!("geração do relatório falhou");
    }
}

async fn run_interactive(config: &SragConfig) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    println!("Agente SRAG interativo. Digite sua pergunta ou 'sair' para encerrar.");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        // EOF also ends the session
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("sair") {
            break;
        }

        let outcome = orchestrator.run(question).await;
        print_outcome(&outcome);
    }

    println!("Sessão encerrada.");
    Ok(())
}

fn run_verify(config: &SragConfig) -> anyhow::Result<()> {
    let missing = config.missing_prerequisites();
    if missing.is_empty() {
        println!("Todos os pré-requisitos estão atendidos.");
        return Ok(());
    }

    eprintln!("Pré-requisitos ausentes:");
    for item in &missing {
        eprintln!("  - {item}");
    }
    std::process::exit(1);
}

fn print_outcome(outcome: &TaskOutcome) {
    if outcome.success {
        println!("{}", outcome.response);
    } else if let Some(error) = &outcome.error {
        eprintln!("Erro: {error}");
    }
    info!(
        success = outcome.success,
        audit_entries = outcome.audit.len(),
        "Tarefa encerrada"
    );
}
