use display_error_chain::DisplayErrorChain;
use std::{error::Error, process::ExitCode, sync::Arc};
use tracing::{error, info};
use video_analyst::{
    config::{Command, Config, USAGE},
    orchestrator::stage_video, AnalysisResult, Gemini, GeminiAgent, Orchestrator, OrchestratorError,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Command::from_env() {
        Ok(Command::Help) => {
            print!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(Command::Analyze(config)) => config,
        Err(e) => {
            eprintln!("error: {}\n\n{USAGE}", DisplayErrorChain::new(&e));
            return ExitCode::FAILURE;
        }
    };

    match do_main(config).await {
        Ok(answer) => {
            println!("{answer}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = failure_message(e.as_ref());
            error!(error.message = %message, "analysis failed");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// The full error chain, prefixed with the error kind when the orchestrator
/// produced it.
fn failure_message(e: &(dyn Error + 'static)) -> String {
    let error_chain = DisplayErrorChain::new(e);
    match e.downcast_ref::<OrchestratorError>() {
        Some(err) => format!("error ({}): {error_chain}", err.kind()),
        None => format!("error: {error_chain}"),
    }
}

async fn do_main(config: Config) -> Result<AnalysisResult, Box<dyn Error>> {
    let gemini =
        Gemini::with_model_and_base_url(&config.api_key, config.model.clone(), &config.base_url)?;
    let agent = GeminiAgent::new(gemini, Arc::new(config.agent()));
    let orchestrator = Orchestrator::new(agent, config.poll);

    let staged = stage_video(&config.video).await?;
    info!(
        video = %config.video.display(),
        model = %config.model,
        "analyzing video and researching"
    );

    Ok(orchestrator.analyze(staged, &config.question).await?)
}
