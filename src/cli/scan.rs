use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::style;

use crate::config::credentials::resolve_credential;
use crate::config::{Intensity, SpeculaConfig, StaticCredentials};
use crate::engine::GeminiEngine;
use crate::evidence::HttpCollectors;
use crate::mission::{LaunchOptions, MissionOrchestrator};
use crate::probes::HttpTransport;
use super::commands::ScanArgs;

pub async fn handle_scan(args: ScanArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => crate::config::parser::load_config(Path::new(path))?,
        None => SpeculaConfig::default(),
    };
    if args.model.is_some() {
        config.engine.model = args.model.clone();
    }

    let intensity: Intensity = args
        .intensity
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let api_key = args
        .api_key
        .as_deref()
        .map(resolve_credential)
        .or_else(|| std::env::var("SPECULA_API_KEY").ok())
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .unwrap_or_default();

    let orchestrator = MissionOrchestrator::new(
        config.clone(),
        Arc::new(StaticCredentials(api_key.clone())),
        Arc::new(HttpCollectors::new(config.collectors.clone())),
        Arc::new(GeminiEngine::new(&api_key, &config.engine)),
        Arc::new(HttpTransport::new()),
    );

    println!(
        "{} {} ({})",
        style("Launching mission against").bold(),
        style(&args.target).cyan(),
        intensity
    );

    orchestrator
        .launch(
            &args.target,
            intensity,
            LaunchOptions {
                language: args.language.clone(),
                auth_context: args.auth_context.clone(),
            },
        )
        .await;

    let state = orchestrator.snapshot().await;
    if let Some(error) = &state.error {
        eprintln!(
            "{} [{}] {}",
            style("Mission failed:").red().bold(),
            error.kind,
            error.message
        );
        if let Some(hint) = &error.retry_hint {
            eprintln!("  {}", style(hint).yellow());
        }
        bail!("mission aborted ({})", error.kind);
    }

    let report = state
        .report
        .context("mission finished without a report")?;

    println!();
    println!("{}", style("Mission debriefing").bold().underlined());
    println!("  Target:           {}", report.target);
    println!("  Security score:   {}/100", report.security_score);
    println!("  Confidence score: {}/100", report.confidence_score);
    println!("  Trust score:      {}/100", report.data_quality.trust_score);
    println!("  Findings:         {}", report.findings.len());
    println!("  Probes executed:  {}", report.data_quality.probes_executed);
    println!("  Technologies:     {}", report.technologies.len());
    println!("  Tokens used:      {}", report.usage.total_tokens);

    for finding in &report.findings {
        println!(
            "  - [{}] {} ({:?})",
            style(format!("{:?}", finding.severity).to_uppercase()).red(),
            finding.title,
            finding.verification.unwrap_or(crate::models::finding::VerificationStatus::Unverified)
        );
    }

    let out_dir = PathBuf::from(&args.output).join(&report.mission_id);
    write_deliverables(&out_dir, &orchestrator, &report).await?;
    println!();
    println!("Report written to {}", style(out_dir.display()).green());

    Ok(())
}

async fn write_deliverables(
    out_dir: &Path,
    orchestrator: &MissionOrchestrator,
    report: &crate::models::report::MissionReport,
) -> Result<()> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let report_json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(out_dir.join("report.json"), report_json).await?;

    let telemetry = orchestrator.telemetry_snapshot().await;
    let telemetry_json = serde_json::to_string_pretty(&telemetry)?;
    tokio::fs::write(out_dir.join("telemetry.json"), telemetry_json).await?;

    Ok(())
}
