use std::fs;

use martley_core::config::{AppConfig, LlmProvider, LoadOptions};
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
                escape_json(&error.to_string())
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
            checks.push(check_llm_credentials(&config));
            checks.push(check_cart_directory(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "llm_credentials",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "cart_directory_writable",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    let details = match config.llm.provider {
        LlmProvider::Ollama => "local provider, no credentials required".to_string(),
        provider => {
            if config.llm.api_key.is_some() {
                format!("api key present for provider {provider:?}")
            } else {
                return DoctorCheck {
                    name: "llm_credentials",
                    status: CheckStatus::Fail,
                    details: format!("provider {provider:?} requires an api key"),
                };
            }
        }
    };

    DoctorCheck { name: "llm_credentials", status: CheckStatus::Pass, details }
}

fn check_cart_directory(config: &AppConfig) -> DoctorCheck {
    let directory = &config.cart.directory;
    let probe = directory.join(".doctor-probe");

    let result = fs::create_dir_all(directory)
        .and_then(|()| fs::write(&probe, b"probe"))
        .and_then(|()| fs::remove_file(&probe));

    match result {
        Ok(()) => DoctorCheck {
            name: "cart_directory_writable",
            status: CheckStatus::Pass,
            details: format!("`{}` is writable", directory.display()),
        },
        Err(error) => DoctorCheck {
            name: "cart_directory_writable",
            status: CheckStatus::Fail,
            details: format!("`{}` is not writable: {error}", directory.display()),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
