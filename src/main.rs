use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use skillgap::cli::{
    Args, ChallengeOptions, ConfigError, ConfigResolver, ExecutionMode, FileConfigSource,
    SaveConfigOptions, default_config_template, show_discovery_info, test_connection,
};
use skillgap::{
    AnalysisClient, AnalysisResult, CareerGoals, ChallengeCatalog, ChallengeGrader, UserSkill,
    UserSkillData,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skillgap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mode = args.mode().map_err(anyhow::Error::msg)?;

    match mode {
        ExecutionMode::ShowConfig => show_config(),
        ExecutionMode::SaveConfig(options) => save_config(options),
        ExecutionMode::ClearConfig { path } => clear_config(path),
        ExecutionMode::Health { test_connection } => run_health(test_connection).await,
        ExecutionMode::Analyze { user_data } => {
            let client = build_client()?;
            let data: UserSkillData = read_json(&user_data)?;
            let analysis = client.analyze_skills(&data).await?;
            print_json(&analysis)
        }
        ExecutionMode::Plan { analysis, goals } => {
            let client = build_client()?;
            let analysis: AnalysisResult = read_json(&analysis)?;
            let goals: CareerGoals = read_json(&goals)?;
            let plan = client.generate_improvement_plan(&analysis, &goals).await?;
            print_json(&plan)
        }
        ExecutionMode::Progress { current, history } => {
            let client = build_client()?;
            let current: UserSkillData = read_json(&current)?;
            let history = history
                .iter()
                .map(|path| read_json::<AnalysisResult>(path))
                .collect::<Result<Vec<_>>>()?;
            let report = client.track_progress(&current, &history).await?;
            print_json(&report)
        }
        ExecutionMode::Challenge(options) => run_challenge(options),
    }
}

fn show_config() -> Result<()> {
    show_discovery_info(&FileConfigSource::discover());

    match ConfigResolver::standard().resolve() {
        Ok(resolved) => {
            println!("Active configuration: {}", resolved.origin);
            for problem in resolved.config.validate() {
                println!("  ⚠ {problem}");
            }
            print_json(&resolved.config.redacted())
        }
        Err(ConfigError::NotConfigured) => {
            println!("Active configuration: none (defaults shown)");
            print_json(&default_config_template())
        }
        Err(e) => Err(e.into()),
    }
}

fn save_config(options: SaveConfigOptions) -> Result<()> {
    let mut config = default_config_template();
    config.api_endpoint = options.endpoint;
    config.api_key = options.api_key;
    if let Some(rate) = options.rate_limit {
        config.rate_limit_per_hour = rate;
    }
    if let Some(timeout) = options.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(retries) = options.retry_attempts {
        config.retry_attempts = retries;
    }
    if let Some(level) = options.privacy_level {
        config.privacy_level = level;
    }

    let problems = config.validate();
    if !problems.is_empty() {
        bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
    }

    let saved = file_source(options.path).save(&config)?;
    println!("Saved configuration to {}", saved.display());
    Ok(())
}

fn clear_config(path: Option<PathBuf>) -> Result<()> {
    let source = file_source(path);
    if source.clear()? {
        println!("Removed {}", source.save_path().display());
    } else {
        println!("No saved configuration at {}", source.save_path().display());
    }
    Ok(())
}

async fn run_health(run_connection_test: bool) -> Result<()> {
    let client = build_client()?;
    let health = client.get_service_health().await;

    if run_connection_test {
        let report = test_connection(&client).await;
        print_json(&json!({ "health": health, "connection": report }))
    } else {
        print_json(&health)
    }
}

fn run_challenge(options: ChallengeOptions) -> Result<()> {
    let catalog = Arc::new(ChallengeCatalog::new());
    let grader = ChallengeGrader::new(Arc::clone(&catalog));

    let challenge = catalog.generate_challenge(
        &options.skill_id,
        &options.skill_name,
        &options.category,
        options.difficulty,
        options.language.as_deref(),
    )?;

    let Some(submission) = options.submission else {
        return print_json(&challenge);
    };

    let code = fs::read_to_string(&submission.solution)
        .with_context(|| format!("Failed to read solution {:?}", submission.solution))?;
    let result = grader.validate_challenge(&challenge.id, &code, submission.completion_secs)?;

    let validation = match &submission.skill_file {
        Some(path) => {
            let mut skill: UserSkill = read_json(path)?;
            let validation = grader.apply_validation(&mut skill, &result);
            write_json(path, &skill)?;
            info!(skill_id = %skill.id, "Updated skill file {:?}", path);
            Some(validation)
        }
        None => None,
    };

    print_json(&json!({
        "challenge": challenge,
        "result": result,
        "validation": validation,
    }))
}

fn build_client() -> Result<AnalysisClient> {
    let resolved = ConfigResolver::standard().resolve()?;
    info!(origin = %resolved.origin, "Using analysis service at {}", resolved.config.api_endpoint);
    Ok(AnalysisClient::new(resolved.config)?)
}

fn file_source(path: Option<PathBuf>) -> FileConfigSource {
    path.map(FileConfigSource::at)
        .unwrap_or_else(FileConfigSource::discover)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {path:?}"))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write {path:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
