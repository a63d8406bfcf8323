use std::io::{self, BufRead, Write};
use std::sync::Arc;

use resume_wizard::backend::types::{Certification, Education, ResumeFile};
use resume_wizard::backend::{HttpBackend, ResumeBackend};
use resume_wizard::config::WizardConfig;
use resume_wizard::profile::{BootstrapOutcome, ProfileBootstrap, ProfileForm};
use resume_wizard::session::SessionContext;
use resume_wizard::workflow::{Flow, GateChoice, ResumeInput, Stage, WizardEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WizardConfig::from_env()?;

    let email = std::env::var("RESUME_WIZARD_EMAIL").unwrap_or_else(|_| {
        eprintln!("Error: RESUME_WIZARD_EMAIL not set");
        eprintln!("  export RESUME_WIZARD_EMAIL=you@example.com");
        std::process::exit(1);
    });
    let token = std::env::var("RESUME_WIZARD_TOKEN").unwrap_or_default();
    let premium = std::env::var("RESUME_WIZARD_PREMIUM")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    eprintln!("📄 Resume Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.base_url);
    eprintln!("   Account: {email}");
    eprintln!("   Tier:    {}\n", if premium { "premium" } else { "free" });

    let backend: Arc<dyn ResumeBackend> = Arc::new(HttpBackend::new(&config));
    let session = SessionContext::new(email.clone(), token, premium);

    // One-time profile check before the wizard starts.
    let bootstrap = ProfileBootstrap::new(Arc::clone(&backend), &config);
    match bootstrap.check(&email).await {
        Ok(BootstrapOutcome::Ready) => {}
        Ok(BootstrapOutcome::NeedsSetup { prefill }) => {
            eprintln!("No profile found — a few basic details are needed first.\n");
            run_profile_form(&bootstrap, &email, prefill.map(|p| (p.name, p.phone))).await;
        }
        Err(e) => {
            eprintln!("⚠ Could not check your profile: {}", e.user_message());
        }
    }

    let mut engine = WizardEngine::new(backend, session, &config);
    run_wizard(&mut engine).await;
    Ok(())
}

/// Blocking collection form: loops until submission succeeds or the
/// user gives up.
async fn run_profile_form(
    bootstrap: &ProfileBootstrap,
    email: &str,
    prefill: Option<(String, String)>,
) {
    let (name_hint, phone_hint) = prefill.unwrap_or_default();

    loop {
        let name = prompt_default("Name", &name_hint);
        let phone = prompt_default("Phone", &phone_hint);
        let linkedin = prompt("LinkedIn URL (optional)");

        let mut education = Vec::new();
        eprintln!("At least one education entry is required.");
        loop {
            education.push(Education {
                institution: prompt("  Institution"),
                location: prompt("  Location"),
                degree: prompt("  Degree"),
                start_date: prompt("  Start date (MM/YYYY)"),
                end_date: prompt("  End date (MM/YYYY)"),
            });
            if !yes_no("Add another education entry?") {
                break;
            }
        }

        let mut certifications = Vec::new();
        while yes_no("Add a certification?") {
            certifications.push(Certification {
                title: prompt("  Title"),
                description: prompt("  Description"),
            });
        }

        let resume = read_resume_file("Path to your resume file").await;

        let form = ProfileForm {
            name,
            email: email.to_string(),
            phone,
            linkedin_url: (!linkedin.is_empty()).then_some(linkedin),
            education,
            certifications,
            resume,
        };

        match bootstrap.submit(email, &form).await {
            Ok(()) => {
                eprintln!("✓ Profile saved.\n");
                return;
            }
            Err(e) => {
                eprintln!("✗ {}", e.user_message());
                if !yes_no("Try again?") {
                    return;
                }
            }
        }
    }
}

/// Drive the engine stage by stage until the user is done.
async fn run_wizard(engine: &mut WizardEngine) {
    loop {
        match engine.stage() {
            Stage::ResumeIntake => {
                if prompt("Flow — [1] job description, [2] keywords") == "2" {
                    let _ = engine.select_flow(Flow::DirectKeywords);
                } else {
                    let _ = engine.select_flow(Flow::JobDescription);
                }

                let input = if yes_no("Use your stored resume?") {
                    ResumeInput::Stored
                } else {
                    match read_resume_file("Path to your resume file").await {
                        Some(file) => ResumeInput::Upload(file),
                        None => continue,
                    }
                };

                let result = match engine.flow() {
                    Flow::JobDescription => {
                        let jd = prompt("Paste the job description");
                        engine.submit_job_description(input, jd).await
                    }
                    Flow::DirectKeywords => {
                        let kw = prompt("Keywords (comma-separated)");
                        engine.submit_direct_keywords(input, kw).await
                    }
                };
                if result.is_err() {
                    show_failure(engine);
                }
            }

            Stage::KeywordReview => {
                if engine.load_match_report().await.is_err() {
                    show_failure(engine);
                    if !yes_no("Retry?") {
                        engine.retreat();
                    }
                    continue;
                }

                if let Some(report) = &engine.state().match_report {
                    eprintln!(
                        "\nCurrent score: {:.0}%   Potential score: {:.0}%",
                        report.match_rate, report.expected_rate
                    );
                }
                loop {
                    let all: Vec<String> = engine
                        .state()
                        .match_report
                        .iter()
                        .flat_map(|r| r.missing_keywords.clone())
                        .chain(engine.state().custom_keywords.clone())
                        .collect();
                    for kw in &all {
                        let mark = if engine.state().selected_keywords.contains(kw) {
                            "x"
                        } else {
                            " "
                        };
                        eprintln!("  [{mark}] {kw}");
                    }
                    let command = prompt("toggle <kw> | add <kw> | done | back");
                    if command == "back" {
                        engine.retreat();
                        break;
                    }
                    if command == "done" {
                        if engine.submit_build().await.is_err() {
                            show_failure(engine);
                        }
                        break;
                    }
                    match command.split_once(' ') {
                        Some(("toggle", kw)) => {
                            let _ = engine.toggle_keyword(kw.trim());
                        }
                        Some(("add", kw)) => {
                            let _ = engine.add_custom_keyword(kw);
                        }
                        _ => {}
                    }
                }
            }

            Stage::UpgradeGate => {
                eprintln!("\nAlmost there! Unlock the final version with Premium,");
                eprintln!("or continue with a watermarked document.");
                match prompt("[p]remium | [w]atermark | [b]ack").as_str() {
                    "p" => {
                        let _ = engine.resolve_gate(GateChoice::GoPremium);
                    }
                    "w" => {
                        let _ = engine.resolve_gate(GateChoice::ContinueWithWatermark);
                    }
                    _ => engine.retreat(),
                }
            }

            Stage::Delivery => match engine.finalize().await {
                Ok(url) => {
                    eprintln!("\n✓ Your resume is ready: {url}");
                    if yes_no("Create another?") {
                        engine.reset();
                    } else {
                        return;
                    }
                }
                Err(_) => {
                    show_failure(engine);
                    if !yes_no("Retry?") {
                        engine.retreat();
                    }
                }
            },
        }
    }
}

fn show_failure(engine: &WizardEngine) {
    if let Some(failure) = engine.failure() {
        eprintln!("✗ {}", failure.message);
    }
}

async fn read_resume_file(label: &str) -> Option<ResumeFile> {
    let path = prompt(label);
    match ResumeFile::from_path(&path).await {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("✗ Could not read {path}: {e}");
            None
        }
    }
}

fn prompt(label: &str) -> String {
    eprint!("{label}: ");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
    line.trim().to_string()
}

fn prompt_default(label: &str, default: &str) -> String {
    if default.is_empty() {
        return prompt(label);
    }
    let entered = prompt(&format!("{label} [{default}]"));
    if entered.is_empty() {
        default.to_string()
    } else {
        entered
    }
}

fn yes_no(label: &str) -> bool {
    let answer = prompt(&format!("{label} [y/N]"));
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
