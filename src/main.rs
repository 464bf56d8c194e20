use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod filter;
mod models;
mod notify;
mod pipeline;
mod render;
mod source;

use config::{SheetConfig, SmtpConfig, TwilioConfig, WhatsAppConfig};
use models::{Channel, RunReport};
use notify::{
    EmailNotifier, Notifier, SmsNotifier, WhatsAppTemplateNotifier, WhatsAppTextNotifier,
};
use pipeline::ReminderPipeline;
use source::{CsvSource, RecordSource, SheetSource};

#[derive(Parser)]
#[command(name = "academy-reminders")]
#[command(about = "Schedule reminder dispatch for New Dimension Academy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch today's schedule and deliver reminders on one channel
    Run {
        #[arg(long, value_enum)]
        channel: Channel,
        /// Override the UTC run date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Read the schedule from a local CSV file instead of the sheet
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Render matching reminders without sending anything
    Preview {
        #[arg(long, value_enum)]
        channel: Channel,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("academy_reminders=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { channel, date, csv } => {
            let run_date = resolve_run_date(date);
            let source = build_source(csv)?;
            let notifier = build_notifier(channel)?;

            let report = ReminderPipeline::new(source.as_ref(), notifier.as_ref())
                .run(&run_date)
                .await?;
            print_report(&report);
        }
        Commands::Preview { channel, date, csv } => {
            let run_date = resolve_run_date(date);
            let source = build_source(csv)?;

            let records = source.fetch().await?;
            let matched = filter::select(&records, run_date.as_str());
            println!(
                "{} of {} record(s) match {run_date} on the {channel} channel.",
                matched.len(),
                records.len()
            );

            for record in &matched {
                println!("\n--- row {} -> {}", record.row, record.contact_address);
                match render::render(record, channel) {
                    Ok(body) => println!("{body}"),
                    Err(error) => println!("would be skipped: {error}"),
                }
            }
        }
    }

    Ok(())
}

fn resolve_run_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(filter::run_date)
}

fn build_source(csv: Option<PathBuf>) -> anyhow::Result<Box<dyn RecordSource>> {
    Ok(match csv {
        Some(path) => Box::new(CsvSource::new(path)),
        None => Box::new(SheetSource::new(SheetConfig::from_env()?)),
    })
}

fn build_notifier(channel: Channel) -> anyhow::Result<Box<dyn Notifier>> {
    Ok(match channel {
        Channel::Email => Box::new(EmailNotifier::new(SmtpConfig::from_env()?)),
        Channel::Sms => Box::new(SmsNotifier::new(TwilioConfig::from_env()?)),
        Channel::Whatsapp => Box::new(WhatsAppTextNotifier::new(WhatsAppConfig::from_env()?)),
        Channel::WhatsappTemplate => {
            Box::new(WhatsAppTemplateNotifier::new(WhatsAppConfig::from_env()?))
        }
    })
}

fn print_report(report: &RunReport) {
    println!(
        "Run complete for {}: {} row(s), {} matched, {} sent, {} failed, {} skipped.",
        report.run_date,
        report.total_rows,
        report.matched,
        report.sent,
        report.failed,
        report.skipped
    );

    for result in report.results.iter().filter(|r| !r.succeeded) {
        println!(
            "- {}: {}",
            result.destination,
            result.detail.as_deref().unwrap_or("unknown failure")
        );
    }
}
