use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use poster_core::{merge, Design, RasterFormat, TemplateCatalog};
use postercraft::api;
use postercraft::models::AppConfig;
use postercraft::server;
use postercraft::services::RenderService;

#[derive(Parser)]
#[command(name = "postercraft")]
#[command(about = "Postercraft - turn a short prompt into a rendered poster")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Merge a design into a template and render it to a file
    Render {
        /// Design JSON file, or "-" for stdin
        #[arg(short, long)]
        design: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: png, jpeg or pdf
        #[arg(short, long, default_value = "png")]
        format: String,

        /// Template id; overrides the design's template_id
        #[arg(short, long)]
        template: Option<String>,
    },
    /// List the template catalog
    Templates {
        /// Only templates of this category
        #[arg(short, long)]
        category: Option<String>,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Postercraft API",
        description = "Prompt-to-poster generation with template merge and PNG/JPEG/PDF export",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_health,
        api::handle_generate,
        api::handle_list_templates,
        api::handle_get_template,
        api::handle_upload_image,
        api::handle_get_image,
        api::handle_get_poster,
        api::handle_update_poster,
        api::handle_poster_image,
        api::handle_export_poster,
    ),
    components(schemas(
        api::HealthResponse,
        api::LlmStatus,
        api::ServiceStatus,
        api::GenerateRequest,
        api::GenerateResponse,
        api::TemplateListResponse,
        api::TemplateResponse,
        api::UploadResponse,
        api::PosterResponse,
        api::UpdatePosterRequest,
        api::UpdatePosterResponse,
        api::ExportRequest,
    )),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Posters", description = "Generate, edit and export posters"),
        (name = "Templates", description = "Template catalog"),
        (name = "Images", description = "Uploaded images")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Render {
            design,
            output,
            format,
            template,
        }) => run_render_command(&design, &output, &format, template.as_deref()).await,
        Some(Commands::Templates { category }) => {
            run_templates_command(category.as_deref());
            Ok(())
        }
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postercraft=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn load_catalog(config: &AppConfig) -> TemplateCatalog {
    match &config.templates_dir {
        Some(dir) => TemplateCatalog::with_directory(dir),
        None => TemplateCatalog::builtin(),
    }
}

/// Merge and render a design offline (no server needed)
async fn run_render_command(
    design_path: &PathBuf,
    output: &PathBuf,
    format: &str,
    template: Option<&str>,
) -> anyhow::Result<()> {
    init_cli_logging();

    let config = AppConfig::load();
    let catalog = load_catalog(&config);

    let raw = if design_path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(design_path)?
    };
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid design JSON: {e}"))?;
    let design = Design::from_value(value);

    let template_id = template.or(design.template_id.as_deref());
    let document = merge(catalog.get_or_default(template_id), &design)?;

    let renderer = RenderService::from_config(&config);
    let bytes = match format.to_ascii_lowercase().as_str() {
        "pdf" => renderer.render_pdf(document.clone()).await?,
        "jpeg" | "jpg" => renderer.render(document.clone(), RasterFormat::Jpeg).await?,
        "png" => renderer.render(document.clone(), RasterFormat::Png).await?,
        other => anyhow::bail!("Unknown format {other:?}, expected png, jpeg or pdf"),
    };

    std::fs::write(output, &bytes)?;
    println!(
        "Rendered {} from {} ({} bytes)",
        output.display(),
        document.id,
        bytes.len()
    );

    Ok(())
}

/// Print the template catalog
fn run_templates_command(category: Option<&str>) {
    init_cli_logging();

    let config = AppConfig::load();
    let catalog = load_catalog(&config);
    let templates = catalog.list(category);

    if templates.is_empty() {
        println!("No templates found.");
        return;
    }
    for t in templates {
        let size = t
            .size
            .map(|s| format!("{}x{}", s.width, s.height))
            .unwrap_or_else(|| "?".to_string());
        println!("  {:<14} {:<10} {:<10} {}", t.id, size, t.category, t.name);
    }
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let config_file = std::env::var("CONFIG_FILE").ok();
    let config = AppConfig::load();

    println!("Postercraft v{VERSION}");
    println!("Prompt-to-poster generation server\n");

    println!("Configuration:");
    println!(
        "  CONFIG_FILE   = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!("  BIND_ADDR     = {}", config.bind_addr);
    println!("  DATA_DIR      = {}", config.data_dir.display());
    println!(
        "  TEMPLATES_DIR = {}",
        config
            .templates_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in only)".to_string())
    );

    println!("\nLanguage model:");
    println!("  Provider: {}", config.llm.provider);
    println!(
        "  Model:    {}",
        config.llm.model.as_deref().unwrap_or("(provider default)")
    );
    let key_state = if config.llm.api_key.is_some() {
        "set"
    } else {
        "not set, fallback designs only"
    };
    println!("  API key:  {key_state}");

    println!(
        "\nPDF export: {}",
        if poster_core::pdf_supported() {
            "enabled"
        } else {
            "disabled (built without the pdf feature)"
        }
    );

    println!("\nCommands:");
    println!("  postercraft serve       Start the HTTP server");
    println!("  postercraft render      Render a design JSON to PNG/JPEG/PDF");
    println!("  postercraft templates   List available templates");
    println!("\nRun 'postercraft --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "postercraft=debug,poster_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load();
    let bind_addr = config.bind_addr.clone();

    let state = server::create_app_state(config).await?;

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Postercraft server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
