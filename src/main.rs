use clap::Parser;
use site_cms::app::{run_server, BundleSource, ClientAuth, ContentClient};
use site_cms::config::cli::{Cli, Commands, CropArgs, ServiceCommand, ServiceFields};
use site_cms::config::{AuthConfig, DEV_TOKEN_VAR};
use site_cms::core::crop::{crop_file, CropOptions};
use site_cms::core::editor::{Editor, ServicePatch};
use site_cms::core::render::render_page;
use site_cms::core::save::StoreSink;
use site_cms::domain::ports::Storage;
use site_cms::utils::error::{ErrorSeverity, Result, SiteError};
use site_cms::utils::{logger, validation::Validate};
use site_cms::{ContentBundle, FileStore, SiteConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting site-cms");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
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

    Ok(())
}

/// site.toml when present, then environment overrides.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let mut config = if cli.config.exists() {
        tracing::info!("📄 Loading configuration from {}", cli.config.display());
        SiteConfig::from_file(&cli.config)?
    } else {
        SiteConfig::default()
    };

    config.auth = config.auth.merge(AuthConfig::from_env());

    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port.trim().parse().map_err(|_| SiteError::InvalidConfigValueError {
            field: "PORT".to_string(),
            value: port.clone(),
            reason: "must be a port number".to_string(),
        })?;
    }

    config.validate()?;
    Ok(config)
}

/// Where editing commands read and write the bundle.
struct Workspace {
    config: SiteConfig,
    client: Option<ContentClient>,
}

impl Workspace {
    fn new(cli: &Cli, config: SiteConfig) -> Result<Self> {
        let client = match &cli.remote {
            Some(remote) => Some(
                ContentClient::new(remote)?
                    .with_auth(ClientAuth {
                        email: cli.email.clone(),
                        dev_token: cli
                            .dev_token
                            .clone()
                            .or_else(|| std::env::var(DEV_TOKEN_VAR).ok()),
                    })
                    .with_cache(&cli.cache)
                    .with_seed(config.seed_path()),
            ),
            None => None,
        };
        Ok(Self { config, client })
    }

    fn client(&self) -> Result<&ContentClient> {
        self.client.as_ref().ok_or_else(|| SiteError::MissingConfigError {
            field: "--remote".to_string(),
        })
    }

    fn store(&self) -> FileStore {
        FileStore::new(&self.config.server.content_dir)
    }

    async fn load(&self) -> Result<ContentBundle> {
        if let Some(client) = &self.client {
            let fetched = client.fetch_bundle().await?;
            if fetched.source != BundleSource::Remote {
                tracing::warn!("⚠️ Editing a {:?} copy, not the live content", fetched.source);
            }
            return Ok(fetched.bundle);
        }

        if let Some(raw) = self.store().read(&self.config.server.content_key).await? {
            return ContentBundle::from_json(&raw);
        }

        let seed = self.config.seed_path();
        match tokio::fs::read(&seed).await {
            Ok(raw) => ContentBundle::from_json(&raw),
            Err(_) => {
                tracing::info!("🌱 No stored content, starting from the built-in seed");
                ContentBundle::seed()
            }
        }
    }

    async fn editor(&self) -> Result<Editor> {
        Editor::new(self.load().await?)
    }

    async fn save(&self, editor: &Editor) -> Result<()> {
        match &self.client {
            Some(client) => editor.save(client).await,
            None => {
                let sink = StoreSink::with_key(self.store(), self.config.server.content_key.clone());
                editor.save(&sink).await
            }
        }
    }
}

async fn run(cli: Cli, mut config: SiteConfig) -> Result<()> {
    let workspace = Workspace::new(&cli, config.clone())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }

        Commands::Export { output } => {
            let json = workspace.editor().await?.export_json()?;
            write_or_print(output.as_deref(), json.as_bytes()).await
        }

        Commands::Import { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let mut editor = workspace.editor().await?;
            let report = editor.import_json(&text)?;
            workspace.save(&editor).await?;
            println!(
                "✅ Imported {} ({} cards cloned across locales)",
                file.display(),
                report.cloned
            );
            Ok(())
        }

        Commands::Normalize => {
            let mut editor = workspace.editor().await?;
            let report = editor.normalize();
            if report.is_noop() {
                println!("✅ Services already aligned");
                return Ok(());
            }
            workspace.save(&editor).await?;
            println!(
                "✅ Normalized: {} cards cloned, {} duplicates dropped, locales changed: {:?}",
                report.cloned, report.dropped_duplicates, report.changed_locales
            );
            Ok(())
        }

        Commands::Service { action } => run_service(&workspace, action).await,

        Commands::Crop(args) => run_crop(&workspace, args).await,

        Commands::Upload { file } => {
            let data = tokio::fs::read(&file).await?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload");
            let receipt = workspace
                .client()?
                .upload(data, name, mime_for(&file))
                .await?;
            println!("{}", receipt.url);
            Ok(())
        }

        Commands::Render { locale, output } => {
            let bundle = workspace.load().await?;
            let html = render_page(&bundle, locale);
            write_or_print(output.as_deref(), html.as_bytes()).await
        }

        Commands::Pull => {
            let fetched = workspace.client()?.fetch_bundle().await?;
            if fetched.source != BundleSource::Remote {
                return Err(SiteError::StoreError {
                    message: format!("remote unavailable, cache left as is ({:?})", fetched.source),
                });
            }
            println!("✅ Cached remote content at {}", cli.cache.display());
            Ok(())
        }
    }
}

fn patch_from(fields: ServiceFields) -> ServicePatch {
    ServicePatch {
        title: fields.title,
        short_md: fields.short,
        full_md: fields.full,
        price: fields.price,
        image_url: fields.image,
    }
}

async fn run_service(workspace: &Workspace, action: ServiceCommand) -> Result<()> {
    let mut editor = workspace.editor().await?;

    let summary = match action {
        ServiceCommand::Add(fields) => {
            let card = editor.add_service(patch_from(fields));
            serde_json::to_string_pretty(&card)?
        }
        ServiceCommand::Update { id, locale, fields } => {
            editor.set_locale(locale);
            let card = editor.update_service(&id, patch_from(fields))?;
            serde_json::to_string_pretty(&card)?
        }
        ServiceCommand::Delete { id } => {
            editor.delete_service(&id)?;
            format!("🗑️ Deleted {}", id)
        }
        ServiceCommand::Move { id, index } => {
            editor.move_service(&id, index)?;
            format!("↕️ Moved {} to {}", id, index)
        }
    };

    workspace.save(&editor).await?;
    println!("{}", summary);
    Ok(())
}

async fn run_crop(workspace: &Workspace, args: CropArgs) -> Result<()> {
    let options = CropOptions {
        aspect: args.aspect,
        zoom: args.zoom,
        pan: (args.pan_x, args.pan_y),
        view_width: args.view_width,
        out_width: args.width,
        format: args.format,
        quality: args.quality,
    };

    let input = args.input.clone();
    let cropped = tokio::task::spawn_blocking(move || crop_file(&input, &options))
        .await
        .map_err(|e| SiteError::CropError {
            message: format!("crop task failed: {}", e),
        })??;

    if args.upload {
        let mime = cropped.format.mime_type();
        let receipt = workspace
            .client()?
            .upload(cropped.bytes, &cropped.file_name, mime)
            .await?;
        println!("{}", receipt.url);
        return Ok(());
    }

    tokio::fs::create_dir_all(&args.output_dir).await?;
    let target = args.output_dir.join(&cropped.file_name);
    tokio::fs::write(&target, &cropped.bytes).await?;
    println!(
        "✂️ {} ({}x{}) written to {}",
        cropped.file_name,
        cropped.width,
        cropped.height,
        target.display()
    );
    Ok(())
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

async fn write_or_print(output: Option<&Path>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, data).await?;
            println!("✅ Written to {}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(data)),
    }
    Ok(())
}
