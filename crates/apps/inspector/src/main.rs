mod live;
mod report;

use crate::report::Reporter;
use app_state::load_app_settings;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use common_services::image_source::{PreviewRegistry, pick_file};
use common_services::session::SessionController;
use inference_client::InferenceClient;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(version, about = "Detect faults on PCB images", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an image file and write a report.
    Upload {
        image: PathBuf,
        /// Run the analysis this many times on the same image.
        #[clap(long, default_value_t = 1)]
        repeat: u32,
        /// Also write the report as JSON and print it.
        #[clap(long, default_value_t = false, action)]
        json: bool,
    },
    /// Capture camera frames on Enter, quit with `q`.
    Live {
        /// Folder the camera drops frames into.
        #[clap(long)]
        spool: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = load_app_settings()?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    color_eyre::install()?;

    let args = Args::parse();
    let client = InferenceClient::from_settings(&settings.inference);
    let reporter = Reporter::new(&settings.report)?;
    let mut controller = SessionController::new(PreviewRegistry::new());

    match args.command {
        Command::Upload {
            image,
            repeat,
            json,
        } => upload(&mut controller, &client, &reporter, &image, repeat, json).await,
        Command::Live { spool } => {
            let spool = spool.unwrap_or_else(|| settings.camera.spool_folder.clone());
            live::run(
                &mut controller,
                &client,
                &reporter,
                spool,
                settings.camera.jpeg_quality,
            )
            .await
        }
    }
}

async fn upload(
    controller: &mut SessionController,
    client: &InferenceClient,
    reporter: &Reporter,
    image: &Path,
    repeat: u32,
    json: bool,
) -> Result<()> {
    let Some(loaded) = pick_file(image, controller.previews()).await? else {
        warn!(path = %image.display(), "Not an image, nothing to analyze");
        return Ok(());
    };
    controller.load_image(loaded);

    for attempt in 1..=repeat.max(1) {
        controller.analyze(client).await;
        info!(attempt, state = controller.state().name(), "Analysis finished");
    }

    let written = reporter.write(controller)?;
    if json {
        let json_path = reporter.write_json(controller)?;
        println!("{}", std::fs::read_to_string(json_path)?);
    }
    info!(report = %written.display(), "Done");
    Ok(())
}
