mod domain;
mod report;
mod storage;

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::domain::analyze;
use crate::report::{
	daily_rows, format_report, print_rows, print_timeline, print_today, rows_json,
	timeline_json, today_json, weekly_rows,
};
use crate::storage::{load_idle_log, load_overrides};

#[derive(Debug, Parser)]
#[command(name = "worklight", about = "Idle-log activity and remaining-work reporter")]
struct Cli {
	/// Idle log: headerless CSV rows of `timestamp,idle_time_ms`.
	#[arg(long)]
	log: PathBuf,
	/// Manual override table; defaults to activity_overrides.csv next to the log.
	#[arg(long)]
	overrides: Option<PathBuf>,
	/// Emit tables as JSON instead of text.
	#[arg(long)]
	json: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Today's status string (the default).
	Report,
	/// Today's per-minute projection.
	Today,
	/// Active hours per calendar date.
	Daily,
	/// Active hours per ISO week.
	Weekly,
	/// The full per-minute timeline.
	Timeline,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let samples = load_idle_log(&cli.log)?;
	let override_path = cli
		.overrides
		.unwrap_or_else(|| default_override_path(&cli.log));
	let overrides = load_overrides(&override_path)?;

	let summary = analyze(&samples, &overrides, Local::now().naive_local())?;

	match cli.command.unwrap_or(Command::Report) {
		Command::Report => {
			print!("{}", format_report(&summary));
		}
		Command::Today => {
			if cli.json {
				println!("{}", today_json(&summary.today)?);
			} else {
				print_today(&summary.today);
			}
		}
		Command::Daily => {
			let rows = daily_rows(&summary.daily);
			if cli.json {
				println!("{}", rows_json(&rows)?);
			} else {
				print_rows(&rows);
			}
		}
		Command::Weekly => {
			let rows = weekly_rows(&summary.weekly);
			if cli.json {
				println!("{}", rows_json(&rows)?);
			} else {
				print_rows(&rows);
			}
		}
		Command::Timeline => {
			if cli.json {
				println!("{}", timeline_json(&summary.timeline)?);
			} else {
				print_timeline(&summary.timeline);
			}
		}
	}

	Ok(())
}

fn default_override_path(log: &Path) -> PathBuf {
	log.with_file_name("activity_overrides.csv")
}
