//! Image Variations CLI
//!
//! Normalizes an image file or a camera still and requests generated
//! variations of it from the remote images API.

use clap::{Parser, Subcommand, ValueEnum};
use image_variations::{
    capture::{Camera, CameraController, CaptureConfig, FacingMode, PermissionPrompt},
    config::FileConfig,
    metrics::{MetricsRegistry, MetricsSnapshot},
    normalize::Normalizer,
    session::{GenerateStatus, VariationTool},
    variation::{ApiCredential, OpenAiImages, VariationClient},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Delay between polls while waiting for a first camera frame.
const FRAME_POLL: Duration = Duration::from_millis(50);

/// Polls before giving up on a camera that never produces a frame.
const MAX_FRAME_POLLS: u32 = 200;

#[derive(Parser)]
#[command(name = "image-variations", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API credential; overrides the configured environment variable.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Print Prometheus metrics to stdout before exiting.
    #[arg(long, global = true)]
    print_metrics: bool,

    /// Serve Prometheus metrics on this port until interrupted
    /// (requires the `metrics` feature).
    #[arg(long, global = true)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize an image file to a square PNG.
    Normalize {
        /// Image file to normalize.
        input: PathBuf,
        /// Output file (defaults to `normalized.png` in the output directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output edge length in pixels.
        #[arg(long)]
        size: Option<u32>,
    },
    /// Upload an image file and request variations of it.
    Generate {
        /// Image file to use as the source.
        input: PathBuf,
    },
    /// Take a still from the camera, optionally requesting variations.
    Capture {
        /// Camera to open first.
        #[arg(long, value_enum)]
        facing: Option<Facing>,
        /// Switch to the other camera before capturing.
        #[arg(long)]
        switch: bool,
        /// Output file (defaults to `capture.png` in the output directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Request variations of the captured still.
        #[arg(long)]
        generate: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Facing {
    User,
    Environment,
}

impl From<Facing> for FacingMode {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::User => FacingMode::User,
            Facing::Environment => FacingMode::Environment,
        }
    }
}

/// Ctrl-C state shared with the signal handler.
#[derive(Default)]
struct Interrupt {
    flag: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    fn install() -> Arc<Self> {
        let interrupt = Arc::new(Self::default());
        let handler = Arc::clone(&interrupt);
        if let Err(e) = ctrlc::set_handler(move || {
            handler.flag.store(true, Ordering::SeqCst);
            handler.notify.notify_one();
        }) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
        interrupt
    }

    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Image Variations v{}", image_variations::VERSION);

    let config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => FileConfig::default(),
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: FileConfig) -> Result<(), BoxError> {
    let interrupt = Interrupt::install();

    #[cfg(feature = "metrics")]
    let served = {
        let port = cli.metrics_port.unwrap_or(config.output.metrics_port);
        (port != 0).then(|| spawn_metrics_server(port)).transpose()?
    };

    #[cfg(not(feature = "metrics"))]
    if cli.metrics_port.is_some_and(|port| port != 0) {
        warn!("Built without the `metrics` feature; --metrics-port ignored");
    }

    let credential = match cli.api_key.as_deref() {
        Some(key) => ApiCredential::new(key),
        None => ApiCredential::from_env(&config.api.credential_env),
    };

    let result = match cli.command {
        Command::Normalize {
            input,
            output,
            size,
        } => normalize_file(&config, &input, output, size).await,
        Command::Generate { input } => {
            let mut tool = build_tool(&config, credential)?;
            let outcome = upload_and_generate(&mut tool, &input, &interrupt).await;
            outcome.map(|()| {
                MetricsSnapshot::from_components(&tool.stats(), false, &Default::default())
            })
        }
        Command::Capture {
            facing,
            switch,
            output,
            generate,
        } => {
            let facing = facing.map(FacingMode::from);
            let tool = if generate {
                Some(build_tool(&config, credential)?)
            } else {
                None
            };
            capture(&config, facing, switch, output, tool, &interrupt).await
        }
    };

    let snapshot = result?;

    if cli.print_metrics {
        let registry = MetricsRegistry::new()?;
        registry.update(&snapshot);
        print!("{}", registry.encode()?);
    }

    #[cfg(feature = "metrics")]
    if let Some(registry) = served {
        registry.update(&snapshot);
        info!("Serving metrics until interrupted");
        if !interrupt.is_set() {
            interrupt.notify.notified().await;
        }
    }

    Ok(())
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(
    port: u16,
) -> Result<Arc<MetricsRegistry>, image_variations::metrics::MetricsError> {
    let registry = Arc::new(MetricsRegistry::new()?);
    let server = image_variations::metrics::MetricsServer::loopback(port, Arc::clone(&registry));
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            warn!("Metrics server stopped: {}", e);
        }
    });
    Ok(registry)
}

fn build_tool(
    config: &FileConfig,
    credential: ApiCredential,
) -> Result<VariationTool<OpenAiImages>, BoxError> {
    let api = OpenAiImages::new(config.api.base_url.clone())?.with_model(config.api.model.clone());
    let client = VariationClient::new(api, credential, config.variation_size())
        .with_count(config.api.count);
    if !client.has_valid_credential() {
        warn!(
            env = %config.api.credential_env,
            "No valid API credential configured; generation will be refused"
        );
    }
    Ok(VariationTool::new(
        client,
        Normalizer::new(config.normalize.target_size),
    ))
}

async fn normalize_file(
    config: &FileConfig,
    input: &Path,
    output: Option<PathBuf>,
    size: Option<u32>,
) -> Result<MetricsSnapshot, BoxError> {
    let normalizer = Normalizer::new(size.unwrap_or(config.normalize.target_size));
    let bytes = tokio::fs::read(input).await?;
    let normalized = tokio::task::spawn_blocking(move || normalizer.normalize_bytes(&bytes))
        .await?
        .map_err(|e| {
            warn!(error = %e, input = %input.display(), "Normalization failed");
            e.user_message()
        })?;

    let output = output.unwrap_or_else(|| config.output.directory.join("normalized.png"));
    tokio::fs::write(&output, &normalized.png).await?;
    println!("{}", output.display());
    info!(size = normalized.size, output = %output.display(), "Wrote normalized image");

    Ok(MetricsSnapshot {
        uploads: 1,
        ..Default::default()
    })
}

async fn upload_and_generate(
    tool: &mut VariationTool<OpenAiImages>,
    input: &Path,
    interrupt: &Interrupt,
) -> Result<(), BoxError> {
    if let Err(e) = tool.upload_file(input).await {
        return Err(visible_error(tool, e));
    }
    generate(tool, interrupt).await
}

/// Runs one variation request, abandoning it on Ctrl-C.
async fn generate(
    tool: &mut VariationTool<OpenAiImages>,
    interrupt: &Interrupt,
) -> Result<(), BoxError> {
    let pending = match tool.begin_generate() {
        Ok(Some(pending)) => pending,
        Ok(None) => return Err("no source image selected".into()),
        Err(e) => return Err(visible_error(tool, e)),
    };

    info!(ticket = pending.ticket(), "Requesting variations");
    let outcome = tokio::select! {
        outcome = pending.run() => outcome,
        _ = interrupt.notify.notified() => {
            tool.cancel_generate();
            return Err("variation request cancelled".into());
        }
    };

    match tool.finish_generate(outcome) {
        Ok(GenerateStatus::Completed { count }) => {
            info!(count, "Variations received");
            for reference in tool.variations().map(|v| v.references()).unwrap_or_default() {
                println!("{}", reference);
            }
            Ok(())
        }
        Ok(status) => Err(format!("variation request not applied: {:?}", status).into()),
        Err(e) => Err(visible_error(tool, e)),
    }
}

/// Prefers the tool's user-facing message over the internal error text.
fn visible_error<A>(tool: &VariationTool<A>, err: image_variations::ToolError) -> BoxError
where
    A: image_variations::VariationApi,
{
    match tool.error() {
        Some(message) => message.to_string().into(),
        None => Box::new(err),
    }
}

async fn capture(
    config: &FileConfig,
    facing: Option<FacingMode>,
    switch: bool,
    output: Option<PathBuf>,
    tool: Option<VariationTool<OpenAiImages>>,
    interrupt: &Interrupt,
) -> Result<MetricsSnapshot, BoxError> {
    #[cfg(feature = "camera")]
    let camera = image_variations::capture::NativeCamera::new();
    #[cfg(not(feature = "camera"))]
    let camera = {
        info!("Built without the `camera` feature; using a synthetic camera");
        image_variations::capture::MockCamera::new()
    };

    let capture_config = CaptureConfig {
        target_size: config.normalize.target_size,
        ..config.capture.clone()
    };
    let controller = CameraController::new(camera, capture_config, config.platform.capabilities())?;
    capture_with(controller, config, facing, switch, output, tool, interrupt).await
}

async fn capture_with<C: Camera>(
    mut controller: CameraController<C>,
    config: &FileConfig,
    facing: Option<FacingMode>,
    switch: bool,
    output: Option<PathBuf>,
    mut tool: Option<VariationTool<OpenAiImages>>,
    interrupt: &Interrupt,
) -> Result<MetricsSnapshot, BoxError> {
    let facing = facing.unwrap_or(config.capture.default_facing);
    if let Err(e) = controller.start(facing) {
        if let Some(prompt) = controller.permission_prompt() {
            eprintln!("{}\n\n{}", PermissionPrompt::TITLE, prompt.instructions);
        }
        return Err(e.user_message().into());
    }

    if switch {
        controller
            .switch_facing()
            .map_err(|e| -> BoxError { e.user_message().into() })?;
    }

    let mut polls = 0;
    let still = loop {
        if interrupt.is_set() {
            controller.stop();
            return Err("capture interrupted".into());
        }
        match controller.capture_photo() {
            Ok(Some(still)) => break still,
            Ok(None) if polls < MAX_FRAME_POLLS => {
                polls += 1;
                tokio::time::sleep(FRAME_POLL).await;
            }
            Ok(None) => {
                controller.stop();
                return Err("camera produced no frame".into());
            }
            Err(e) => {
                controller.stop();
                return Err(e.user_message().into());
            }
        }
    };

    let output = output.unwrap_or_else(|| config.output.directory.join("capture.png"));
    tokio::fs::write(&output, still.png()).await?;
    println!("{}", output.display());
    info!(origin = %still.origin(), output = %output.display(), "Wrote captured still");

    let streams = controller.stats();
    let tool_stats = match tool.as_mut() {
        Some(tool) => {
            tool.accept_capture(still);
            generate(tool, interrupt).await?;
            tool.stats()
        }
        None => Default::default(),
    };

    let mut snapshot = MetricsSnapshot::from_components(&tool_stats, false, &streams);
    snapshot.captures = snapshot.captures.max(1);
    Ok(snapshot)
}
