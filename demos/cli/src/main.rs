use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use triage_core::{FinalRecommendation, TriageConfig};
use triage_rules::assess_patient_str;

#[derive(Parser, Debug)]
#[command(
    name = "triage-cli",
    about = "Phân loại cấp cứu cho một hồ sơ bệnh nhân JSON."
)]
struct Args {
    /// Đường dẫn tới file JSON hồ sơ bệnh nhân.
    #[arg(short, long)]
    input: PathBuf,
    /// File JSON cấu hình pipeline (ngưỡng, trọng số, bộ luật).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// In toàn bộ khuyến nghị dạng JSON thay vì bản tóm tắt.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(triage_core::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Không đọc được file cấu hình {path:?}"))?;
            serde_json::from_str::<TriageConfig>(&raw)
                .with_context(|| format!("File cấu hình {path:?} không hợp lệ"))?
        }
        None => TriageConfig::default(),
    };
    tracing::debug!(
        input = ?args.input,
        custom_config = args.config.is_some(),
        "patient record loaded"
    );

    let recommendation = assess_patient_str(&data, &config)
        .with_context(|| format!("Không phân loại được hồ sơ {:?}", args.input))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        print_summary(&recommendation);
    }

    Ok(())
}

fn print_summary(recommendation: &FinalRecommendation) {
    let risk = &recommendation.risk_assessment;
    println!(
        "Urgency: {:?} (priority {})\nRisk: {:.2} ({:?})\nAction: {}",
        recommendation.urgency_level,
        recommendation.priority,
        risk.risk_score,
        risk.risk_category,
        recommendation.recommended_action
    );
    if recommendation.insufficient_data {
        println!("Warning: insufficient data for a reliable assessment");
    }

    println!("Next steps:");
    for step in &recommendation.next_steps {
        println!("  - {step}");
    }

    if !recommendation.differential_diagnosis.is_empty() {
        println!("Differential diagnosis:");
        for entry in recommendation.differential_diagnosis.iter().take(3) {
            println!(
                "  - {} [{}] match {:.2}, {:?}",
                entry.condition, entry.code, entry.match_score, entry.severity
            );
        }
    }

    if let Some(advisory) = &recommendation.advisory {
        println!(
            "Quality score: {:.2}, medication safety: {:?}",
            advisory.quality.overall_score, advisory.drug_safety.safety_level
        );
    }
}
