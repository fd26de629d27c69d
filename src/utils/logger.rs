use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Diretivas usadas quando `RUST_LOG` não está definido. hyper e reqwest
/// ficam sempre em `warn`; axum só sobe para `info` no modo verbose.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "coleta_leads=debug,coletar=debug,axum=info,hyper=warn,reqwest=warn,info"
    } else {
        "coleta_leads=info,coletar=info,axum=warn,hyper=warn,reqwest=warn,warn"
    }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Saída compacta para terminal (servidor em desenvolvimento e binário `coletar`).
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Um objeto JSON por evento, com os campos no nível raiz.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_target(true)
                .with_current_span(false),
        )
        .init();
}
