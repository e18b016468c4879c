use chrono::Utc;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vigil::cli::{Args, Command};
use vigil::{
    Config, Decision, FileStore, MemoryStore, Moderator, ReportRequest, ResolveRequest, Submission,
};
use vigil_common::UserId;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(EnvFilter::from_env("VIGIL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::builtin()?,
    };

    match args.command {
        // stateless commands never touch the store file
        Command::Score { text } => {
            let moderator = Moderator::new(config, MemoryStore::new());
            let assessment = moderator.score(&text);
            println!(
                "score {}{}",
                assessment.score,
                if assessment.blocked { " (blocked)" } else { "" }
            );
            for signal in &assessment.signals {
                println!(
                    "  +{:<3} {:<8} {}: {}",
                    signal.points,
                    format!("{:?}", signal.level).to_lowercase(),
                    signal.table,
                    signal.description
                );
            }
        }
        Command::Trust { account } => {
            let moderator = Moderator::new(config, MemoryStore::new());
            let account = account.account(UserId::new("cli")?, Utc::now())?;
            println!("{}", moderator.trust(&account));
        }
        Command::Rules => {
            for table in config.rules.tables() {
                println!(
                    "{} ({} points, {:?}, {} {} entries)",
                    table.name,
                    table.points,
                    table.level,
                    table.rules.len(),
                    table.kind.node_name()
                );
                for rule in &table.rules {
                    println!("  [{}] {}", rule.category, rule.source);
                }
            }
            println!(
                "block at {}, auto-hide at {} reports, trust policy {:?}",
                config.thresholds.block, config.thresholds.auto_hide, config.trust_policy
            );
        }
        command => {
            let store = FileStore::open(&args.store).await?;
            let moderator = Moderator::new(config, store);
            run_stateful(&moderator, command).await?;
        }
    }
    Ok(())
}

async fn run_stateful(moderator: &Moderator<FileStore>, command: Command) -> Result<()> {
    match command {
        Command::Submit {
            author,
            account,
            attachments,
            confirm,
            text,
        } => {
            let submission = Submission::new()
                .author(account.account(author, Utc::now())?)
                .text(text)
                .attachment_count(attachments)
                .build();
            let check = moderator.check_admission(submission)?;
            match (check.decision, check.ticket) {
                (Decision::Blocked, _) | (_, None) => {
                    println!("blocked (score {}): {}", check.score, check.reason);
                }
                (Decision::NeedsReview, Some(_)) if !confirm => {
                    println!("needs review (score {}): {}", check.score, check.reason);
                    println!("re-run with --confirm to publish it for review");
                }
                (_, Some(ticket)) => {
                    let item = moderator.commit_submission(ticket, confirm).await?;
                    print_json(&item)?;
                }
            }
        }
        Command::Report {
            content,
            reporter,
            reason,
            details,
        } => {
            let filed = moderator
                .file_report(
                    ReportRequest::new()
                        .content(content)
                        .reporter(reporter)
                        .reason(reason)
                        .maybe_details(details)
                        .build(),
                )
                .await?;
            print_json(&filed)?;
        }
        Command::Queue => {
            print_json(&moderator.queue().await?)?;
        }
        Command::Resolve {
            content,
            action,
            reviewer,
            notes,
        } => {
            let resolution = moderator
                .resolve(
                    ResolveRequest::new()
                        .content(content)
                        .action(action)
                        .reviewer(reviewer)
                        .maybe_notes(notes)
                        .build(),
                )
                .await?;
            print_json(&resolution)?;
        }
        Command::Show { content } => {
            #[derive(Serialize)]
            struct Shown {
                content: vigil_common::ContentItem,
                reports: Vec<vigil_common::Report>,
            }
            print_json(&Shown {
                reports: moderator.reports(&content).await?,
                content: moderator.content(&content).await?,
            })?;
        }
        Command::Score { .. } | Command::Trust { .. } | Command::Rules => {}
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
