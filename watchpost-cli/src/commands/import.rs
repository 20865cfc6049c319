//! `watchpost import` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use watchpost_core::types::Alert;
use watchpost_eve_pipeline::import_events;

use crate::cli::ImportArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `import` command.
///
/// Reads the capture file, runs it through the same exclusion and
/// normalization path as the live tail, and renders the resulting alerts.
///
/// # Errors
///
/// Returns `CliError::Io` if the file cannot be read and `CliError::Import`
/// if the capture is a JSON array that fails to parse.
pub async fn execute(args: ImportArgs, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %args.file.display(), "importing capture file");

    let content = tokio::fs::read_to_string(&args.file).await?;
    let alerts = import_events(&content)?;

    let report = build_import_report(&args.file, alerts, args.limit);
    writer.render(&report)?;

    Ok(())
}

fn build_import_report(file: &Path, alerts: Vec<Alert>, limit: usize) -> ImportReport {
    ImportReport {
        source: file.display().to_string(),
        total: alerts.len(),
        alerts,
        display_limit: limit,
    }
}

/// Capture import report.
///
/// JSON output carries every normalized alert; text output renders a summary
/// table capped at `display_limit` rows.
#[derive(Serialize)]
pub struct ImportReport {
    /// Capture file path
    pub source: String,
    /// Number of alerts produced by the import
    pub total: usize,
    /// Normalized alerts in input order
    pub alerts: Vec<Alert>,
    /// Text-mode row cap (0 = unlimited); not part of the JSON payload
    #[serde(skip)]
    pub display_limit: usize,
}

impl Render for ImportReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Imported {} alerts from {}",
            self.total.to_string().bold(),
            self.source
        )?;

        if self.alerts.is_empty() {
            return Ok(());
        }

        writeln!(w)?;
        writeln!(
            w,
            "{:<48} {:<22} {:<22} Sev",
            "Signature", "Source", "Destination"
        )?;
        writeln!(w, "{}", "-".repeat(98))?;

        let shown = if self.display_limit == 0 {
            self.alerts.len()
        } else {
            self.display_limit.min(self.alerts.len())
        };

        for alert in &self.alerts[..shown] {
            let signature = truncate(alert.signature.as_deref().unwrap_or("-"), 48);
            let src = endpoint(alert.src_ip.as_deref(), alert.src_port);
            let dest = endpoint(alert.dest_ip.as_deref(), alert.dest_port);
            let severity = alert
                .severity
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_owned());
            // Suricata severity: 1 is most severe
            let severity_colored = match alert.severity.as_ref().and_then(|s| s.as_u64()) {
                Some(1) => severity.red().bold(),
                Some(2) => severity.yellow(),
                _ => severity.normal(),
            };

            writeln!(
                w,
                "{:<48} {:<22} {:<22} {}",
                signature, src, dest, severity_colored
            )?;
        }

        if shown < self.total {
            writeln!(
                w,
                "... {} more (raise --limit or use --output json)",
                self.total - shown
            )?;
        }

        Ok(())
    }
}

/// Truncate a string to `max` characters, appending "..." when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_owned()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Format an ip/port pair for table display.
fn endpoint(ip: Option<&str>, port: Option<u16>) -> String {
    match (ip, port) {
        (Some(ip), Some(port)) => format!("{}:{}", ip, port),
        (Some(ip), None) => ip.to_owned(),
        (None, Some(port)) => format!("?:{}", port),
        (None, None) => "-".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn sample_alert(signature: &str, severity: i64) -> Alert {
        Alert {
            signature: Some(signature.to_owned()),
            severity: Some(serde_json::Number::from(severity)),
            src_ip: Some("10.0.0.5".to_owned()),
            src_port: Some(4444),
            dest_ip: Some("192.168.1.10".to_owned()),
            dest_port: Some(80),
            protocol: Some("TCP".to_owned()),
            original: json!({"event_type": "alert"}),
            ..Alert::default()
        }
    }

    #[test]
    fn test_build_import_report_counts_alerts() {
        let alerts = vec![sample_alert("sig-a", 2), sample_alert("sig-b", 1)];
        let report = build_import_report(&PathBuf::from("capture.json"), alerts, 20);

        assert_eq!(report.total, 2);
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.source, "capture.json");
        assert_eq!(report.display_limit, 20);
    }

    #[test]
    fn test_import_report_render_text_table() {
        let report = build_import_report(
            &PathBuf::from("eve.json"),
            vec![sample_alert("ET SCAN Nmap Scripting Engine", 2)],
            20,
        );

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(
            output.contains("Imported 1 alerts from eve.json"),
            "should show summary line"
        );
        assert!(output.contains("Signature"), "should show table header");
        assert!(
            output.contains("ET SCAN Nmap Scripting Engine"),
            "should show signature"
        );
        assert!(output.contains("10.0.0.5:4444"), "should show source");
        assert!(
            output.contains("192.168.1.10:80"),
            "should show destination"
        );
    }

    #[test]
    fn test_import_report_render_text_respects_limit() {
        let alerts = (0..5).map(|i| sample_alert(&format!("sig-{}", i), 3)).collect();
        let report = build_import_report(&PathBuf::from("eve.json"), alerts, 2);

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("sig-0"), "should show first alert");
        assert!(output.contains("sig-1"), "should show second alert");
        assert!(!output.contains("sig-2"), "should not show third alert");
        assert!(output.contains("... 3 more"), "should report hidden count");
    }

    #[test]
    fn test_import_report_render_text_zero_limit_is_unlimited() {
        let alerts = (0..30).map(|i| sample_alert(&format!("sig-{}", i), 3)).collect();
        let report = build_import_report(&PathBuf::from("eve.json"), alerts, 0);

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("sig-29"), "should show every alert");
        assert!(!output.contains("more"), "should not report hidden count");
    }

    #[test]
    fn test_import_report_render_text_empty() {
        let report = build_import_report(&PathBuf::from("empty.json"), Vec::new(), 20);

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("empty report should render");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(
            output.contains("Imported 0 alerts"),
            "should show zero summary"
        );
        assert!(
            !output.contains("Signature"),
            "should not print a table header"
        );
    }

    #[test]
    fn test_import_report_render_text_missing_fields() {
        let alert = Alert {
            original: json!({"event_type": "alert"}),
            ..Alert::default()
        };
        let report = build_import_report(&PathBuf::from("eve.json"), vec![alert], 20);

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("sparse alert should render");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains('-'), "missing fields should render as dashes");
    }

    #[test]
    fn test_import_report_json_serialization() {
        let report = build_import_report(
            &PathBuf::from("capture.json"),
            vec![sample_alert("sig-a", 1)],
            20,
        );

        let json = serde_json::to_string(&report).expect("JSON serialization should succeed");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should parse JSON");

        assert_eq!(parsed["source"].as_str(), Some("capture.json"));
        assert_eq!(parsed["total"].as_u64(), Some(1));
        let alerts = parsed["alerts"].as_array().expect("alerts should be array");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["signature"].as_str(), Some("sig-a"));
        // display_limit is a text-mode concern only
        assert!(
            parsed.get("display_limit").is_none(),
            "display_limit should be skipped"
        );
    }

    #[test]
    fn test_import_report_json_includes_all_alerts_despite_limit() {
        let alerts = (0..10).map(|i| sample_alert(&format!("sig-{}", i), 2)).collect();
        let report = build_import_report(&PathBuf::from("eve.json"), alerts, 1);

        let json = serde_json::to_string(&report).expect("JSON serialization should succeed");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should parse JSON");

        assert_eq!(
            parsed["alerts"].as_array().expect("array").len(),
            10,
            "JSON output should never be truncated"
        );
    }

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate("short", 48), "short");
    }

    #[test]
    fn test_truncate_long_string_appends_ellipsis() {
        let long = "a".repeat(60);
        let result = truncate(&long, 48);
        assert_eq!(result.chars().count(), 48);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_unicode_safe() {
        let korean = "한".repeat(60);
        let result = truncate(&korean, 10);
        assert_eq!(result.chars().count(), 10);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_endpoint_formats() {
        assert_eq!(endpoint(Some("10.0.0.1"), Some(80)), "10.0.0.1:80");
        assert_eq!(endpoint(Some("10.0.0.1"), None), "10.0.0.1");
        assert_eq!(endpoint(None, Some(80)), "?:80");
        assert_eq!(endpoint(None, None), "-");
    }
}
