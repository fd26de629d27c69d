use clap::Parser;
use coleta_leads::core::export::ExportFormat;
use coleta_leads::core::{LeadRepository, SearchCriteria, Storage};
use coleta_leads::domain::model::AccessRecord;
use coleta_leads::utils::error::{ErrorSeverity, LeadError};
use coleta_leads::utils::{logger, validation::Validate};
use coleta_leads::{AppConfig, CollectionEngine, GooglePlacesClient, InMemoryStore, LocalStorage};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "coletar")]
#[command(about = "Executa uma coleta de leads e grava o resultado em CSV ou XLSX")]
struct Args {
    /// Palavra-chave da busca (ex.: "pizzaria")
    keyword: String,

    #[arg(long)]
    cidade: String,

    #[arg(long, default_value = "")]
    bairro: String,

    /// Restringe a busca a um raio (km) em torno do endereço geocodificado
    #[arg(long)]
    raio_km: Option<f64>,

    /// Arquivo TOML de configuração
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long, default_value = "output")]
    output: String,

    #[arg(long, default_value = "csv")]
    format: String,

    /// Limite mensal de leads para o usuário da coleta
    #[arg(long)]
    limite: Option<u32>,

    #[arg(long, default_value_t = 1)]
    user_id: u64,

    /// Mostra o que seria buscado sem chamar o serviço
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let Some(format) = ExportFormat::parse(&args.format) else {
        eprintln!("❌ Formato desconhecido: {} (use csv ou xlsx)", args.format);
        std::process::exit(1);
    };

    let mut criteria = SearchCriteria::new(&args.keyword, &args.cidade, &args.bairro);
    if let Some(radius) = args.raio_km {
        criteria = criteria.with_radius(radius);
    }

    display_summary(&criteria, &config, &args, format);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        if let Err(e) = criteria.validate() {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
        println!("✅ Critérios válidos");
        return Ok(());
    }

    match collect(&args, &config, criteria, format).await {
        Ok(output_path) => {
            println!("📁 Arquivo gravado em: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Collection failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Sugestão: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<AppConfig, LeadError> {
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

/// Acesso do usuário da linha de comando: o da configuração, ou um acesso
/// básico criado na hora. `--limite` sobrescreve o limite mensal.
fn access_for(args: &Args, config: &AppConfig) -> AccessRecord {
    let mut access = config
        .access_records()
        .into_iter()
        .find(|record| record.user_id == args.user_id)
        .unwrap_or_else(|| {
            AccessRecord::new(args.user_id, "basico", config.collection.max_results as u32)
        });
    if let Some(limit) = args.limite {
        access.monthly_limit = limit;
    }
    access
}

async fn collect(
    args: &Args,
    config: &AppConfig,
    criteria: SearchCriteria,
    format: ExportFormat,
) -> Result<String, LeadError> {
    let store = Arc::new(InMemoryStore::with_access(vec![access_for(args, config)]).await);
    let places = Arc::new(GooglePlacesClient::new(config)?);
    let engine = CollectionEngine::from_config(places, Arc::clone(&store), config);

    let batch = engine.prepare(args.user_id, criteria).await?;
    let report = engine.run_now(batch.id).await?;

    println!("📋 {}", report.status);
    println!("  Leads coletados: {}", report.collected);
    println!("  Duplicados ignorados: {}", report.skipped_duplicates);
    println!("  Sem detalhes: {}", report.missing_details);
    if !report.message.is_empty() {
        println!("  Mensagem: {}", report.message);
    }

    let leads = store.leads_since(batch.id, 0).await?;
    let data = format.render(&leads)?;

    let storage = LocalStorage::new(args.output.clone());
    let file_name = format!("coleta-{}-{}", batch.id, format.filename());
    storage.write_file(&file_name, &data).await?;
    Ok(storage.full_path(&file_name))
}

fn display_summary(criteria: &SearchCriteria, config: &AppConfig, args: &Args, format: ExportFormat) {
    println!("📋 Resumo da coleta:");
    match criteria.effective_radius_km() {
        Some(radius) => println!(
            "  Busca: \"{}\" num raio de {} km de {}",
            criteria.keyword,
            radius,
            criteria.location()
        ),
        None => println!("  Busca: \"{}\"", criteria.text_query()),
    }
    println!("  Máximo de resultados: {}", config.collection.max_results);
    println!("  Saída: {} ({})", args.output, format.filename());
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}
