use super::{ConfidenceBar, Overlay, OverlayBox, ReportView, Verdict};
use crate::session::AnalysisFailure;
use std::fmt::{self, Write};

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; background: #0f172a; color: #e2e8f0; margin: 2rem; }
.stage { position: relative; display: inline-block; max-width: 100%; border: 1px solid #475569; border-radius: 6px; overflow: hidden; }
.stage img { display: block; max-width: 100%; height: auto; }
.fault-box { position: absolute; box-sizing: border-box; border: 2px solid; }
.fault-label { position: absolute; top: -1.25rem; left: 0; font-size: 0.75rem; padding: 0 0.25rem; border-radius: 3px; color: #fff; white-space: nowrap; }
.grade-high { border-color: #dc2626; background: rgba(220, 38, 38, 0.1); }
.grade-high .fault-label, .grade-high .fill { background: #dc2626; }
.grade-medium { border-color: #f59e0b; background: rgba(245, 158, 11, 0.1); }
.grade-medium .fault-label, .grade-medium .fill { background: #f59e0b; }
.grade-low { border-color: #3b82f6; background: rgba(59, 130, 246, 0.1); }
.grade-low .fault-label, .grade-low .fill { background: #3b82f6; }
.verdict { font-weight: 600; margin: 1rem 0; }
.verdict-clear { color: #22c55e; }
.verdict-faulty, .failed { color: #f87171; }
.bars { list-style: none; padding: 0; max-width: 32rem; }
.bars li { display: grid; grid-template-columns: 10rem 1fr 4rem; gap: 0.5rem; align-items: center; margin: 0.25rem 0; border: none; background: none; }
.bar { height: 0.5rem; background: #334155; border-radius: 4px; overflow: hidden; }
.fill { height: 100%; }
";

/// Render a self-contained HTML page for the given view.
pub fn render_report(view: &ReportView) -> Result<String, fmt::Error> {
    let mut html = String::new();
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html><head><meta charset=\"utf-8\">")?;
    writeln!(html, "<title>PCB Fault Detection</title>")?;
    writeln!(html, "<style>{STYLE}</style></head><body>")?;
    writeln!(html, "<h1>PCB Fault Detection</h1>")?;

    match view {
        ReportView::Idle => writeln!(html, "<p>Upload a PCB image to detect faults.</p>")?,
        ReportView::Loaded { image_src } => {
            write_stage(&mut html, image_src, &[])?;
            writeln!(html, "<p>Ready to analyze.</p>")?;
        }
        ReportView::Analyzing { image_src } => {
            write_stage(&mut html, image_src, &[])?;
            writeln!(html, "<p class=\"analyzing\">Analyzing image...</p>")?;
        }
        ReportView::Failed { image_src, failure } => {
            write_stage(&mut html, image_src, &[])?;
            write_failure(&mut html, failure)?;
        }
        ReportView::Resolved(overlay) => write_overlay(&mut html, overlay)?,
    }

    writeln!(html, "</body></html>")?;
    Ok(html)
}

fn write_overlay(html: &mut String, overlay: &Overlay) -> fmt::Result {
    match overlay.verdict {
        Verdict::AllClear => writeln!(
            html,
            "<div class=\"verdict verdict-clear\">No faults detected in the image.</div>"
        )?,
        Verdict::Flagged => writeln!(
            html,
            "<div class=\"verdict verdict-faulty\">No fault locations found, but the board is flagged as faulty.</div>"
        )?,
        Verdict::FaultsPresent { count } => writeln!(
            html,
            "<div class=\"verdict verdict-faulty\">{count} fault{} detected.</div>",
            if count == 1 { "" } else { "s" }
        )?,
    }

    writeln!(
        html,
        "<p class=\"server-verdict\" data-faulty=\"{}\">Detector verdict: {}</p>",
        overlay.is_faulty,
        if overlay.is_faulty { "faulty" } else { "ok" }
    )?;

    write_stage(html, &overlay.image_src, &overlay.boxes)?;

    if overlay.mapping_degraded {
        writeln!(
            html,
            "<p class=\"degraded\">Image size unknown, fault locations cannot be shown.</p>"
        )?;
    }
    if !overlay.bars.is_empty() {
        writeln!(html, "<ul class=\"bars\">")?;
        for bar in &overlay.bars {
            write_bar(html, bar)?;
        }
        writeln!(html, "</ul>")?;
    }
    if !overlay.missing_components.is_empty() {
        writeln!(html, "<section class=\"missing\"><h2>Missing components</h2><ul>")?;
        for component in &overlay.missing_components {
            writeln!(html, "<li>{}</li>", escape(component))?;
        }
        writeln!(html, "</ul></section>")?;
    }
    Ok(())
}

fn write_stage(html: &mut String, image_src: &str, boxes: &[OverlayBox]) -> fmt::Result {
    writeln!(html, "<div class=\"stage\">")?;
    writeln!(
        html,
        "<img src=\"{}\" alt=\"Inspected PCB\">",
        escape(image_src)
    )?;
    for b in boxes {
        writeln!(
            html,
            "<div class=\"fault-box grade-{grade}\" style=\"top: {top}; left: {left}; width: {width}; height: {height};\" title=\"{title}\"><span class=\"fault-label\">{label}</span></div>",
            grade = b.grade,
            top = css_percent(b.region.top),
            left = css_percent(b.region.left),
            width = css_percent(b.region.width),
            height = css_percent(b.region.height),
            title = escape(&b.title()),
            label = escape(&b.label),
        )?;
    }
    writeln!(html, "</div>")
}

fn write_bar(html: &mut String, bar: &ConfidenceBar) -> fmt::Result {
    writeln!(
        html,
        "<li class=\"grade-{grade}\"><span>{label}</span><div class=\"bar\"><div class=\"fill\" style=\"width: {percent:.1}%\"></div></div><span>{percent:.1}%</span></li>",
        grade = bar.grade,
        label = escape(&bar.label),
        percent = bar.percent,
    )
}

fn write_failure(html: &mut String, failure: &AnalysisFailure) -> fmt::Result {
    writeln!(
        html,
        "<div class=\"failed\" data-kind=\"{}\">Analysis failed. Please try again.</div>",
        failure.kind.as_str()
    )?;
    writeln!(html, "<pre>{}</pre>", escape(&failure.message))
}

/// Fraction as a CSS percentage.
fn css_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::build_overlay;
    use common_types::{AnalysisResult, BoundingBox, Detection};
    use inference_client::FailureKind;

    fn resolved(detections: Vec<Detection>) -> ReportView {
        let result = AnalysisResult::builder()
            .detections(detections)
            .original_width(800)
            .original_height(600)
            .build();
        ReportView::Resolved(build_overlay("data:image/png;base64,AA==", &result))
    }

    #[test]
    fn test_boxes_use_percentages() -> color_eyre::Result<()> {
        let html = render_report(&resolved(vec![Detection::new(
            "missing-resistor",
            0.82,
            Some(BoundingBox::new(100.0, 50.0, 40.0, 40.0)),
        )]))?;

        assert!(html.contains("top: 8.33%; left: 12.50%; width: 5.00%; height: 6.67%;"));
        assert!(html.contains("title=\"missing-resistor (82.0%)\""));
        assert!(html.contains("<li class=\"grade-high\"><span>missing-resistor</span>"));
        assert!(html.contains("style=\"width: 82.0%\""));
        assert!(html.contains("1 fault detected."));
        assert!(!html.contains("px;"), "overlay must not use pixel offsets");
        Ok(())
    }

    #[test]
    fn test_all_clear() -> color_eyre::Result<()> {
        let html = render_report(&resolved(vec![]))?;
        assert!(html.contains("verdict-clear"));
        assert!(!html.contains("fault-box"));
        Ok(())
    }

    #[test]
    fn test_flagged_board_is_not_all_clear() -> color_eyre::Result<()> {
        let result = AnalysisResult::builder()
            .detections(vec![])
            .original_width(800)
            .original_height(600)
            .is_faulty(true)
            .missing_components(vec!["MOSFET".to_string()])
            .build();
        let html = render_report(&ReportView::Resolved(build_overlay("blob:x", &result)))?;

        assert!(!html.contains("verdict-clear"));
        assert!(!html.contains("No faults detected"));
        assert!(html.contains("flagged as faulty"));
        assert!(html.contains("data-faulty=\"true\""));
        assert!(html.contains("<li>MOSFET</li>"));
        Ok(())
    }

    #[test]
    fn test_labels_are_escaped() -> color_eyre::Result<()> {
        let html = render_report(&resolved(vec![Detection::new(
            "<script>",
            0.3,
            Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
        )]))?;
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        Ok(())
    }

    #[test]
    fn test_failure_page() -> color_eyre::Result<()> {
        let html = render_report(&ReportView::Failed {
            image_src: "blob:x".to_string(),
            failure: AnalysisFailure {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            },
        })?;
        assert!(html.contains("Please try again"));
        assert!(html.contains("data-kind=\"network\""));
        assert!(!html.contains("fault-box"));
        Ok(())
    }
}
