use std::fs;

use autostream_core::config::{AppConfig, LoadOptions};
use autostream_core::Lead;
use autostream_store::KnowledgeStore;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('"', "\\\"")
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_knowledge_document(&config));
            checks.push(check_lead_log(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "knowledge_document",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "lead_log",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let overall_status = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    let summary = match overall_status {
        CheckStatus::Pass => "all checks passed".to_string(),
        _ => "one or more checks failed".to_string(),
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_knowledge_document(config: &AppConfig) -> DoctorCheck {
    match KnowledgeStore::load(&config.storage.knowledge_path) {
        Ok(store) => {
            let document = store.get();
            DoctorCheck {
                name: "knowledge_document",
                status: CheckStatus::Pass,
                details: format!(
                    "loaded `{}` (basic: {}, pro: {})",
                    config.storage.knowledge_path.display(),
                    document.pricing.basic.price,
                    document.pricing.pro.price
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "knowledge_document",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// A corrupt lead log is a recoverable runtime condition (reads fall back
/// to empty), so it reports as a pass with a warning detail rather than a
/// failure.
fn check_lead_log(config: &AppConfig) -> DoctorCheck {
    let path = &config.storage.leads_path;
    let raw = match fs::read_to_string(path) {
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return DoctorCheck {
                name: "lead_log",
                status: CheckStatus::Pass,
                details: format!("`{}` not created yet; first capture will create it", path.display()),
            };
        }
        Err(error) => {
            return DoctorCheck {
                name: "lead_log",
                status: CheckStatus::Fail,
                details: format!("could not read `{}`: {error}", path.display()),
            };
        }
        Ok(raw) => raw,
    };

    let mut parsed = 0usize;
    for line in raw.lines().filter(|line| !line.trim().is_empty()) {
        if serde_json::from_str::<Lead>(line).is_err() {
            return DoctorCheck {
                name: "lead_log",
                status: CheckStatus::Pass,
                details: format!(
                    "`{}` contains malformed records; the runtime will treat the list as empty",
                    path.display()
                ),
            };
        }
        parsed += 1;
    }

    DoctorCheck {
        name: "lead_log",
        status: CheckStatus::Pass,
        details: format!("`{}` holds {parsed} lead record(s)", path.display()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![format!("doctor: {}", report.summary)];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("  [{marker}] {} - {}", check.name, check.details));
    }
    lines.join("\n")
}
