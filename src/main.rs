//! Assessment recommender: semantic assessment recommendations from free text

use assessment_recommender::catalog::Catalog;
use assessment_recommender::cli::{self, Cli, Commands, ConfigAction, ModelAction, QueryArgs};
use assessment_recommender::config::Config;
use assessment_recommender::error::{RecommenderError, Result};
use assessment_recommender::output::formatter::{save_report_to_file, suggest_filename, ReportGenerator};
use assessment_recommender::output::report::{ReportContext, RecommendationReport};
use assessment_recommender::processing::embedding_manager::EmbeddingModelManager;
use assessment_recommender::processing::embeddings::{Embedder, Model2VecEmbedder};
use assessment_recommender::processing::extractor::{AttributeExtractor, QueryConstraints};
use assessment_recommender::processing::index::{BuildOptions, EmbeddingIndex};
use assessment_recommender::processing::ranker::Recommender;
use clap::Parser;
use log::{error, info};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {}", e);
        // 2 for caller mistakes, 1 for everything else
        process::exit(if e.is_client_error() { 2 } else { 1 });
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Recommend {
            query,
            top_k,
            catalog,
            embedding,
            output,
            save,
            detailed,
        } => {
            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(RecommenderError::InvalidRequest)?,
                None => config.output.format.clone(),
            };
            let top_k = top_k.unwrap_or(config.scoring.default_top_k);
            let detailed = detailed || config.output.detailed;

            let source = query.source();
            let query_text = source.read().await?;
            if query_text.trim().is_empty() {
                return Err(RecommenderError::InvalidRequest("Query cannot be empty".to_string()));
            }

            let start_time = Instant::now();
            let catalog_path = catalog.unwrap_or_else(|| config.catalog.path.clone());
            let catalog = Catalog::load(&catalog_path).await?;
            let catalog_size = catalog.len();

            let embedder: Arc<dyn Embedder> =
                Arc::new(Model2VecEmbedder::from_config(&config, embedding.as_deref())?);
            let options = BuildOptions {
                fields: config.catalog.embedding_fields,
                batch_size: config.models.batch_size,
                show_progress: std::io::stderr().is_terminal(),
            };
            let index = EmbeddingIndex::build(catalog, embedder, &options)?;
            let recommender = Recommender::new(Arc::new(index), config.scoring.clone());

            let ranking = recommender.rank_detailed(&query_text, top_k)?;
            let report = RecommendationReport::from_ranking(
                &query_text,
                &ranking,
                ReportContext {
                    query_source: source.describe(),
                    embedding_model: recommender.index().embedder_name().to_string(),
                    embedding_fields: recommender.index().fields(),
                    catalog_size,
                    processing_time_ms: start_time.elapsed().as_millis() as u64,
                },
            );

            let generator = ReportGenerator::with_options(config.output.color_output && save.is_none(), detailed);
            let rendered = generator.generate_report(&report, &output_format)?;

            match save {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(suggest_filename(&output_format, true))
                    } else {
                        path
                    };
                    save_report_to_file(&rendered, &path)?;
                    info!("Saved {} recommendations to {}", report.recommendations.len(), path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Extract { query } => {
            let constraints = extract_constraints(&query).await?;
            println!("{}", serde_json::to_string_pretty(&constraints)?);
        }

        Commands::Catalog { catalog } => {
            let catalog_path = catalog.unwrap_or_else(|| config.catalog.path.clone());
            let catalog = Catalog::load(&catalog_path).await?;
            let stats = catalog.stats();

            println!("Catalog: {}", catalog_path.display());
            println!("  Assessments: {}", stats.item_count);
            println!("  Remote testing: {}", stats.remote_testing);
            println!("  Unknown duration: {}", stats.unknown_duration);
            println!("  With job tags: {}", stats.tagged_items);
            println!("  Test types:");
            for (test_type, count) in &stats.test_types {
                println!("    {}: {}", test_type, count);
            }
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(
                config.models_dir().clone(),
                config.models.available_models.clone(),
            )
            .await?;

            match action {
                ModelAction::List => {
                    println!("Embedding models:");
                    for model in manager.list_available_models() {
                        let status = if manager.is_model_downloaded(&model.name) {
                            "downloaded"
                        } else {
                            "available"
                        };
                        let default_marker = if model.name == config.models.default_embedding_model {
                            " (default)"
                        } else {
                            ""
                        };
                        println!(
                            "  {}{} [{}] - {} ({} MB)",
                            model.name, default_marker, status, model.repo_id, model.size_mb
                        );
                        println!("    {}", model.description);
                    }
                }

                ModelAction::Download { model, force } => {
                    let path = manager.download_model(&model, force).await?;
                    println!("Model '{}' ready at {}", model, path.display());
                }

                ModelAction::Remove { model } => {
                    let path = manager.remove_model(&model).await?;
                    println!("Removed {}", path.display());
                }

                ModelAction::Info { model } => {
                    let info = manager
                        .get_model_info(&model)
                        .ok_or_else(|| RecommenderError::ModelNotFound(model.clone()))?;
                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Size: {} MB", info.size_mb);
                    println!("Description: {}", info.description);
                    match manager.get_model_path(&model) {
                        Some(path) => println!("Location: {}", path.display()),
                        None => println!("Status: not downloaded (assessment-recommender models download {})", info.name),
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| RecommenderError::Configuration(e.to_string()))?;
                println!("{}", content);
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.unwrap_or_else(Config::config_path).display());
            }

            Some(ConfigAction::Reset) => {
                let path = config_path.unwrap_or_else(Config::config_path);
                Config::default().save_to(&path)?;
                println!("Configuration reset: {}", path.display());
            }
        },
    }

    Ok(())
}

async fn extract_constraints(query: &QueryArgs) -> Result<QueryConstraints> {
    let text = query.source().read().await?;
    Ok(AttributeExtractor::new().extract(&text))
}
