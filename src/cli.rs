use crate::config::{DEFAULT_BASE_URL, DEFAULT_OUTPUT_PATH, Settings};
use crate::errors::AppError;
use crate::form::EventForm;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the event backend.
    #[arg(long, global = true, env = "EVENT_CHART_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Bearer token sent with every request.
    #[arg(long, global = true, env = "EVENT_CHART_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Seconds between chart refreshes.
    #[arg(long, global = true, env = "EVENT_CHART_INTERVAL_SECS", default_value_t = 60)]
    pub interval_secs: u64,

    /// Where the chart page is written.
    #[arg(short, long, global = true, env = "EVENT_CHART_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Keep the chart up to date and read events from stdin.
    ///
    /// Each line is either `TYPE LOCATION now` or
    /// `TYPE LOCATION DATE HOURS MINUTES`. Quote a field or separate
    /// fields with tabs to keep spaces in it.
    Watch,
    /// Record a single event and refresh the chart once.
    Submit(SubmitArgs),
}

#[derive(Args)]
pub struct SubmitArgs {
    #[arg(short = 't', long = "type")]
    pub event_type: String,

    #[arg(short, long)]
    pub location: String,

    /// Use the current local date and time.
    #[arg(long, conflicts_with_all = ["date", "hours", "minutes"])]
    pub now: bool,

    #[arg(long, required_unless_present = "now")]
    pub date: Option<String>,

    #[arg(long, required_unless_present = "now")]
    pub hours: Option<String>,

    #[arg(long, required_unless_present = "now")]
    pub minutes: Option<String>,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings, AppError> {
        Settings::resolve(
            &self.base_url,
            self.token.clone(),
            self.interval_secs,
            self.output.clone(),
        )
    }
}

impl SubmitArgs {
    pub fn to_form(&self, now: NaiveDateTime) -> EventForm {
        let mut form = EventForm {
            event_type: self.event_type.clone(),
            location: self.location.clone(),
            ..EventForm::default()
        };
        if self.now {
            form.set_now(now);
        } else {
            form.date = self.date.clone().unwrap_or_default();
            form.hours = self.hours.clone().unwrap_or_default();
            form.minutes = self.minutes.clone().unwrap_or_default();
        }
        form
    }
}

/// Parses one `watch` input line into a filled form.
///
/// Fields are separated by tabs when the line has any, otherwise by
/// whitespace with double quotes grouping words (`"Front yard"`).
pub fn parse_entry(line: &str, now: NaiveDateTime) -> Result<EventForm, AppError> {
    let fields = split_fields(line)?;
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let mut form = EventForm::default();
    match fields.as_slice() {
        [event_type, location, "now"] => {
            form.select("type", event_type)?;
            form.select("location", location)?;
            form.set_now(now);
        }
        [event_type, location, date, hours, minutes] => {
            form.select("type", event_type)?;
            form.select("location", location)?;
            form.select("date", date)?;
            form.select("hours", hours)?;
            form.select("minutes", minutes)?;
        }
        _ => {
            return Err(AppError::form(
                "expected `TYPE LOCATION now` or `TYPE LOCATION DATE HOURS MINUTES`",
            ));
        }
    }
    Ok(form)
}

fn split_fields(line: &str) -> Result<Vec<String>, AppError> {
    if line.contains('\t') {
        return Ok(line
            .split('\t')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect());
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    fields.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if quoted {
        return Err(AppError::form("unterminated quote"));
    }
    if pending {
        fields.push(current);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap()
    }

    #[test]
    fn entry_with_explicit_time() {
        let form = parse_entry("Pee Inside 2024-03-05 9 5", now()).unwrap();
        assert_eq!(form.event_type, "Pee");
        assert_eq!(form.location, "Inside");
        assert_eq!(form.timestamp(), "2024-03-05T09:05");
    }

    #[test]
    fn entry_with_now() {
        let form = parse_entry("  Poo   Outside now ", now()).unwrap();
        assert_eq!(form.timestamp(), "2024-03-05T14:07");
    }

    #[test]
    fn malformed_entry_is_rejected() {
        assert!(parse_entry("Pee", now()).is_err());
        assert!(parse_entry("", now()).is_err());
        assert!(parse_entry("Pee \"Front yard now", now()).is_err());
    }

    #[test]
    fn quoted_fields_keep_spaces() {
        let form = parse_entry("Pee \"Front yard\" 2024-03-05 9 5", now()).unwrap();
        assert_eq!(form.location, "Front yard");
        assert_eq!(form.timestamp(), "2024-03-05T09:05");

        let form = parse_entry("\"Long walk\" \"Back garden\" now", now()).unwrap();
        assert_eq!(form.event_type, "Long walk");
        assert_eq!(form.location, "Back garden");
    }

    #[test]
    fn tab_separated_fields_keep_spaces() {
        let form = parse_entry("Poo\tFront yard\tnow", now()).unwrap();
        assert_eq!(form.event_type, "Poo");
        assert_eq!(form.location, "Front yard");
        assert_eq!(form.timestamp(), "2024-03-05T14:07");
    }

    #[test]
    fn submit_args_parse() {
        let cli = Cli::try_parse_from([
            "event_chart",
            "submit",
            "--type",
            "Pee",
            "--location",
            "Inside",
            "--date",
            "2024-03-05",
            "--hours",
            "9",
            "--minutes",
            "5",
        ])
        .unwrap();
        let Commands::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.to_form(now()).timestamp(), "2024-03-05T09:05");
    }

    #[test]
    fn submit_requires_time_or_now() {
        let missing = Cli::try_parse_from([
            "event_chart", "submit", "--type", "Pee", "--location", "Inside",
        ]);
        assert!(missing.is_err());

        let cli = Cli::try_parse_from([
            "event_chart", "submit", "-t", "Pee", "-l", "Inside", "--now",
        ])
        .unwrap();
        let Commands::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.to_form(now()).timestamp(), "2024-03-05T14:07");
    }
}
