//! Terminal and JSON output
//!
//! Every `render_*` function builds the full text, which `emit` then prints.

use anyhow::Result;
use hwdriver::{DriverRegistry, InstallPlan, PostInstallReport, Resolution, ResolutionSummary};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Write;

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_catalog(registry: &DriverRegistry, json: bool) -> Result<String> {
    if json {
        let specs: Vec<_> = registry.iter().collect();
        return to_json(&specs);
    }

    let mut out = String::new();
    writeln!(out, "[CATALOG] {} drivers", registry.len())?;
    for spec in registry.iter() {
        let class = if spec.class_id().is_empty() {
            "any"
        } else {
            spec.class_id()
        };
        let devices = if spec.device_ids().is_empty() {
            "all devices".to_string()
        } else {
            format!("{} devices", spec.device_ids().len())
        };
        let license = if spec.is_proprietary() {
            "proprietary".yellow().to_string()
        } else {
            "open".green().to_string()
        };
        writeln!(
            out,
            "  {:<14} class {:<6} vendor {} {:<12} priority {:<3} {}",
            spec.name().cyan(),
            class,
            spec.vendor_id(),
            devices,
            spec.priority(),
            license
        )?;
    }
    Ok(out)
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    resolution: ResolutionSummary,
    plan: &'a InstallPlan,
}

pub fn render_resolution(
    resolution: &Resolution<'_>,
    plan: &InstallPlan,
    json: bool,
) -> Result<String> {
    if json {
        return to_json(&ResolveOutput {
            resolution: resolution.summary(),
            plan,
        });
    }

    let mut out = String::new();
    writeln!(out, "[DRIVERS]")?;
    if resolution.selections().is_empty() {
        writeln!(out, "  {}", "no device needs an extra driver".dimmed())?;
    }
    for (device, spec) in resolution.selections() {
        writeln!(out, "  {}  ->  {}", device, spec.name().green())?;
    }

    if !resolution.unhandled().is_empty() {
        writeln!(out)?;
        writeln!(out, "[UNHANDLED] {} devices", resolution.unhandled().len())?;
        for device in resolution.unhandled() {
            writeln!(out, "  {}", device.to_string().dimmed())?;
        }
    }

    writeln!(out)?;
    writeln!(out, "[PACKAGES] {}", plan.architecture)?;
    for package in &plan.packages {
        writeln!(out, "  {}", package)?;
    }

    if !plan.post_install.is_empty() {
        writeln!(out)?;
        writeln!(out, "[POST-INSTALL]")?;
        for action in &plan.post_install {
            writeln!(out, "  {} in {}", action.driver, action.target_root.display())?;
        }
    }
    Ok(out)
}

/// Bare list for feeding a package manager
pub fn render_packages(plan: &InstallPlan, json: bool) -> Result<String> {
    if json {
        return to_json(&plan.packages);
    }
    let mut out = String::new();
    for package in &plan.packages {
        writeln!(out, "{}", package)?;
    }
    Ok(out)
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    started_at: String,
    finished_at: String,
    completed: &'a [String],
    failures: Vec<String>,
}

pub fn render_report(report: &PostInstallReport, json: bool) -> Result<String> {
    if json {
        return to_json(&ReportOutput {
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.to_rfc3339(),
            completed: &report.completed,
            failures: report.failures.iter().map(|e| e.to_string()).collect(),
        });
    }

    let mut out = String::new();
    for driver in &report.completed {
        writeln!(out, "[OK] {}", driver.green())?;
    }
    for failure in &report.failures {
        writeln!(out, "[FAILED] {}", failure.to_string().red())?;
    }
    if report.completed.is_empty() && report.failures.is_empty() {
        writeln!(out, "{}", "nothing to do".dimmed())?;
    }
    Ok(out)
}

/// Write rendered output without doubling the trailing newline
pub fn emit(rendered: &str) {
    if rendered.ends_with('\n') {
        print!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
}
