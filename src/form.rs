use crate::errors::AppError;
use crate::models::EventSubmission;
use chrono::{NaiveDateTime, Timelike};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Type,
    Location,
    Date,
    Hours,
    Minutes,
}

impl FromStr for FormField {
    type Err = AppError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match id {
            "type" => Ok(Self::Type),
            "location" => Ok(Self::Location),
            "date" => Ok(Self::Date),
            "hours" => Ok(Self::Hours),
            "minutes" => Ok(Self::Minutes),
            other => Err(AppError::form(format!("unknown field `{other}`"))),
        }
    }
}

/// Raw values of the event form, kept as typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventForm {
    pub event_type: String,
    pub location: String,
    pub date: String,
    pub hours: String,
    pub minutes: String,
}

impl EventForm {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Type => self.event_type = value,
            FormField::Location => self.location = value,
            FormField::Date => self.date = value,
            FormField::Hours => self.hours = value,
            FormField::Minutes => self.minutes = value,
        }
    }

    /// Applies a select button: `target` is the id of the field it fills.
    pub fn select(&mut self, target: &str, value: &str) -> Result<(), AppError> {
        let field = target.parse()?;
        self.set(field, value);
        Ok(())
    }

    pub fn set_now(&mut self, now: NaiveDateTime) {
        self.date = now.date().format("%Y-%m-%d").to_string();
        self.hours = format!("{:02}", now.hour());
        self.minutes = format!("{:02}", now.minute());
    }

    /// Local timestamp without zone, e.g. `2024-03-05T09:05`. Component ranges
    /// are not checked.
    pub fn timestamp(&self) -> String {
        format!(
            "{}T{}:{}",
            self.date,
            pad_start(&self.hours, 2, '0'),
            pad_start(&self.minutes, 2, '0')
        )
    }

    pub fn to_submission(&self) -> EventSubmission {
        EventSubmission {
            event_type: self.event_type.clone(),
            location: self.location.clone(),
            timestamp: self.timestamp(),
        }
    }
}

fn pad_start(value: &str, width: usize, fill: char) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let mut padded: String = std::iter::repeat_n(fill, width - len).collect();
    padded.push_str(value);
    padded
}
