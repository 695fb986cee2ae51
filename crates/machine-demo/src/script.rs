//! Whitespace-separated task scripts, e.g. `machine 2 frame 10 capture exit`.

use machine_core::Point;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Machine(i32),
    Frame(u32),
    Rate(f64),
    Location(Point),
    Flags(u8),
    Capture(Option<PathBuf>),
    Exit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error("unknown task {0:?}")]
    UnknownTask(String),
    #[error("task {0} needs an argument")]
    MissingArgument(&'static str),
    #[error("task {task} cannot use {value:?}")]
    InvalidArgument { task: &'static str, value: String },
}

const KEYWORDS: &[&str] = &[
    "machine", "frame", "rate", "location", "flags", "capture", "exit",
];

pub fn parse(text: &str) -> Result<Vec<Task>, ScriptError> {
    let mut words = text.split_whitespace().peekable();
    let mut tasks = Vec::new();

    while let Some(word) = words.next() {
        let task = match word {
            "machine" => Task::Machine(argument(&mut words, "machine", |s| s.parse().ok())?),
            "frame" => Task::Frame(argument(&mut words, "frame", |s| s.parse().ok())?),
            "rate" => Task::Rate(argument(&mut words, "rate", |s| {
                s.parse::<f64>().ok().filter(|r| r.is_finite() && *r > 0.0)
            })?),
            "location" => {
                let x = argument(&mut words, "location", |s| s.parse().ok())?;
                let y = argument(&mut words, "location", |s| s.parse().ok())?;
                Task::Location(Point::new(x, y))
            }
            "flags" => Task::Flags(argument(&mut words, "flags", parse_flags)?),
            "capture" => {
                let path = words
                    .next_if(|next| !KEYWORDS.contains(next))
                    .map(PathBuf::from);
                Task::Capture(path)
            }
            "exit" => Task::Exit,
            other => return Err(ScriptError::UnknownTask(other.to_string())),
        };
        tasks.push(task);
    }

    Ok(tasks)
}

/// Decimal or `0x` hex.
pub fn parse_flags(text: &str) -> Option<u8> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn argument<'a, T>(
    words: &mut impl Iterator<Item = &'a str>,
    task: &'static str,
    convert: impl Fn(&str) -> Option<T>,
) -> Result<T, ScriptError> {
    let value = words.next().ok_or(ScriptError::MissingArgument(task))?;
    convert(value).ok_or_else(|| ScriptError::InvalidArgument {
        task,
        value: value.to_string(),
    })
}
