//! mortarix — extract material records from a specification document and
//! render CSV/HTML reports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mortarix_common::MaterialCatalog;
use mortarix_embed::{EmbeddingConfig, SentenceEmbedder};
use mortarix_extraction::{ExtractionConfig, ExtractionEngine};
use mortarix_refine::{drop_unreferenced, OpenAiCompatibleBackend, Refiner};

#[derive(Parser, Debug)]
#[command(name = "mortarix", version, about = "Material information extraction for construction specifications")]
struct Cli {
    /// Document to process (PDF)
    document: PathBuf,

    /// Alternative material catalogue (YAML); defaults to the builtin set
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Skip the embedding model and run keyword-only matching
    #[arg(long)]
    keyword_only: bool,

    /// Refine records with a generative model (reads GEMINI_API_KEY_1..3
    /// and OPENROUTER_API_KEY from the environment or .env)
    #[arg(long)]
    refine: bool,

    /// Directory the reports are written to
    #[arg(long, default_value = "downloads")]
    out_dir: PathBuf,

    /// Override the embedding model id
    #[arg(long)]
    model_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => MaterialCatalog::from_path(path)
            .with_context(|| format!("loading catalogue {}", path.display()))?,
        None => MaterialCatalog::builtin(),
    };
    info!(materials = catalog.len(), "catalogue loaded");

    let pages = mortarix_ingestion::process_document(&cli.document)?;
    info!(pages = pages.len(), "document ingested");

    let mut engine = ExtractionEngine::new(catalog, ExtractionConfig::default());
    if !cli.keyword_only {
        let mut embed_config = EmbeddingConfig::default();
        if let Some(model_id) = &cli.model_id {
            embed_config = embed_config.with_model(model_id.clone());
        }
        match SentenceEmbedder::new(embed_config).await {
            Ok(embedder) => engine = engine.with_embedder(Arc::new(embedder)),
            Err(e) => warn!("embedding model unavailable, keyword-only run: {e}"),
        }
    }

    let outcome = engine.extract(&pages).await?;
    info!(
        job = %outcome.job_id,
        records = outcome.records.len(),
        degraded = outcome.degraded,
        duration_ms = outcome.duration_ms,
        "extraction complete"
    );
    for error in &outcome.errors {
        warn!("{error}");
    }

    let mut records = outcome.records;
    if cli.refine {
        let keys: Vec<String> = (1..=3)
            .filter_map(|i| std::env::var(format!("GEMINI_API_KEY_{i}")).ok())
            .collect();
        if keys.is_empty() {
            warn!("no GEMINI_API_KEY_* configured, skipping refinement");
        } else {
            let mut refiner = Refiner::new(keys);
            if let Ok(openrouter_key) = std::env::var("OPENROUTER_API_KEY") {
                refiner = refiner.with_fallback(OpenAiCompatibleBackend::openrouter(
                    openrouter_key,
                    "google/gemma-3n-e2b-it:free",
                ));
            }
            records = refiner.refine(records).await;
            records = drop_unreferenced(records);
        }
    }

    std::fs::create_dir_all(&cli.out_dir)?;
    let csv_path = cli.out_dir.join("material_report.csv");
    let html_path = cli.out_dir.join("material_report.html");
    mortarix_report::write_csv(&records, &csv_path)?;
    mortarix_report::write_html(&records, "Material Extraction Report", &html_path)?;

    println!("Extracted {} material records", records.len());
    println!("  CSV:  {}", csv_path.display());
    println!("  HTML: {}", html_path.display());
    Ok(())
}
