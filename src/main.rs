use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveTime};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use dispensersched::ScheduleCard;
use dispensersched::config::load_card_config;
use dispensersched::schedule::model::EntryStatus;
use dispensersched::schedule::resolver::SwitchState;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSwitch {
    On,
    Off,
}

impl From<CliSwitch> for SwitchState {
    fn from(value: CliSwitch) -> Self {
        match value {
            CliSwitch::On => SwitchState::On,
            CliSwitch::Off => SwitchState::Off,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dispensersched",
    version,
    about = "Render a dispenser schedule from a device-reported state string"
)]
struct Cli {
    /// Card configuration file.
    #[arg(long, default_value = "card.json")]
    config: PathBuf,

    /// Raw schedule state string as reported by the device entity.
    #[arg(long)]
    state: Option<String>,

    /// Read the raw state string from a file instead.
    #[arg(long, conflicts_with = "state")]
    state_file: Option<PathBuf>,

    /// Master switch state of the schedule.
    #[arg(long, value_enum, default_value_t = CliSwitch::On)]
    switch: CliSwitch,

    /// Resolve display statuses as if the local time were HH:MM instead of
    /// now. Useful for reproducible output.
    #[arg(long)]
    at: Option<String>,

    /// Emit the resolved schedule as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ResolvedRow {
    id: u32,
    hour: u32,
    minute: u32,
    amount: u32,
    status: EntryStatus,
    display_status: EntryStatus,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = load_card_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let mut card = ScheduleCard::new(config)?;

    let raw = match (&cli.state, &cli.state_file) {
        (Some(state), _) => Some(state.clone()),
        (None, Some(path)) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("unable to read state file {}", path.display()))?,
        ),
        (None, None) => None,
    };
    card.apply_state(raw.as_deref().map(str::trim));

    let now = match &cli.at {
        Some(text) => Local::now().date_naive().and_time(parse_clock_time(text)?),
        None => Local::now().naive_local(),
    };
    let switch = SwitchState::from(cli.switch);

    let rows: Vec<ResolvedRow> = card
        .entries()
        .iter()
        .map(|entry| ResolvedRow {
            id: entry.id,
            hour: entry.hour,
            minute: entry.minute,
            amount: entry.amount,
            status: entry.status,
            display_status: card.display_status(entry, now, switch),
        })
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("schedule is empty");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{:02}:{:02}  {}  {}",
            row.hour,
            row.minute,
            card.config().format_amount(row.amount),
            card.config().status_label(row.display_status),
        );
    }
    Ok(())
}

fn parse_clock_time(input: &str) -> Result<NaiveTime> {
    let parsed = NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"));
    match parsed {
        Ok(time) => Ok(time),
        Err(_) => bail!("invalid --at value '{input}', expected HH:MM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_accepts_both_forms() {
        assert_eq!(
            parse_clock_time("07:30").expect("valid"),
            NaiveTime::from_hms_opt(7, 30, 0).expect("valid time")
        );
        assert_eq!(
            parse_clock_time("07:30:15").expect("valid"),
            NaiveTime::from_hms_opt(7, 30, 15).expect("valid time")
        );
    }

    #[test]
    fn clock_time_rejects_garbage() {
        assert!(parse_clock_time("7h30").is_err());
        assert!(parse_clock_time("25:00").is_err());
    }
}
