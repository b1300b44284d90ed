// src/core/report.rs

use crate::core::models::ScanResult;
use std::fmt::Write;

/// Renders a plain-text summary of a finished scan.
pub fn render_summary(result: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "WebRadar • Domain Recon");
    let _ = writeln!(out, "{}", "─".repeat(48));
    let _ = writeln!(out, "Domain: {}", result.domain);
    let _ = writeln!(out, "IP: {}", result.ip.as_deref().unwrap_or("unresolved"));

    let ports: Vec<String> = result.open_ports.iter().map(u16::to_string).collect();
    let _ = writeln!(out, "Open Ports: {} found {}", ports.len(), if ports.is_empty() { String::new() } else { format!("({})", ports.join(", ")) });

    if let Some(technologies) = result.technologies.as_ref().filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "\nTechnologies / Fingerprints");
        for (key, value) in technologies {
            let _ = writeln!(out, "  • {key}: {value}");
        }
    }

    if let Some(registrar) = result.whois.as_ref().and_then(|w| w.get("registrar")) {
        let _ = writeln!(out, "\nRegistrar: {registrar}");
    }

    let child_sitemaps = result
        .sitemap_pages
        .iter()
        .flatten()
        .filter(|entry| entry.is_child_sitemap())
        .count();
    let _ = writeln!(out, "\nQuick Stats");
    let _ = writeln!(out, "  Hidden paths: {}", result.hidden_paths.as_ref().map_or(0, Vec::len));
    let _ = writeln!(out, "  Sitemap pages: {} ({} referenced sitemaps)", result.sitemap_pages.as_ref().map_or(0, Vec::len), child_sitemaps);
    let _ = writeln!(out, "  Errors: {}", result.errors.len());

    for path in result.hidden_paths.iter().flatten() {
        let _ = writeln!(out, "  → {path}");
    }
    for error in &result.errors {
        let _ = writeln!(out, "  ✗ {error}");
    }
    out
}
