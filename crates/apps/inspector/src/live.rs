use crate::report::Reporter;
use color_eyre::Result;
use common_services::image_source::{LiveCapture, SpoolCamera};
use common_services::session::{Commit, Generation, SessionController};
use common_types::AnalysisResult;
use inference_client::{InferenceClient, InferenceResult};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Interactive capture loop.
///
/// Each Enter captures a frame and submits it right away; older submissions
/// keep running and are discarded by the controller when they come back.
pub async fn run(
    controller: &mut SessionController,
    client: &InferenceClient,
    reporter: &Reporter,
    spool: PathBuf,
    jpeg_quality: u8,
) -> Result<()> {
    let mut capture = LiveCapture::new(SpoolCamera::new(spool.clone()), jpeg_quality);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: JoinSet<(Generation, InferenceResult<AnalysisResult>)> = JoinSet::new();

    info!(spool = %spool.display(), report = %reporter.output_folder().display(), "Press Enter to capture, q to quit");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().eq_ignore_ascii_case("q") {
                    break;
                }
                match capture.capture(controller.previews()) {
                    Ok(loaded) => controller.load_image(loaded),
                    Err(error) => {
                        warn!("Capture failed: {error}");
                        continue;
                    }
                }
                if let Some(request) = controller.begin_analysis() {
                    let client = client.clone();
                    in_flight.spawn(async move {
                        let outcome = client.submit(request.origin, request.upload).await;
                        (request.generation, outcome)
                    });
                }
                reporter.write(controller)?;
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let (generation, outcome) = joined?;
                if controller.complete(generation, outcome) == Commit::Applied {
                    reporter.write(controller)?;
                }
            }
        }
    }

    debug!(
        frames = capture.frames_captured(),
        pending = in_flight.len(),
        "Leaving live mode"
    );
    Ok(())
}
