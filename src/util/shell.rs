//! Terminal output for the CLI.
//!
//! Human mode prints right-aligned status words on stderr and results on
//! stdout. JSON mode prints one object per line on stdout and nothing else;
//! errors become `{"reason": "error"}` events.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How much human-mode chatter to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only, no spinner.
    Quiet,
    #[default]
    Normal,
    /// Log lines replace the spinner.
    Verbose,
}

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn resolve(self) -> bool {
        match self {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Good,
    Progress,
    Neutral,
    Caution,
    Bad,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Good => "\x1b[1;32m",
            Tone::Progress => "\x1b[1;36m",
            Tone::Neutral => "\x1b[1;34m",
            Tone::Caution => "\x1b[1;33m",
            Tone::Bad => "\x1b[1;31m",
        }
    }
}

/// Status word printed in front of a human-mode message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Resolved,
    Registered,
    Removed,
    Applying,
    Info,
    Hash,
    Skipped,
    Error,
}

impl Status {
    fn label(self) -> (&'static str, Tone) {
        match self {
            Status::Resolved => ("Resolved", Tone::Good),
            Status::Registered => ("Registered", Tone::Good),
            Status::Removed => ("Removed", Tone::Good),
            Status::Applying => ("Applying", Tone::Progress),
            Status::Info => ("Info", Tone::Neutral),
            Status::Hash => ("SHA256", Tone::Neutral),
            Status::Skipped => ("Skipped", Tone::Caution),
            Status::Error => ("error", Tone::Bad),
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Output sink shared by all commands.
#[derive(Debug)]
pub struct Shell {
    json: bool,
    verbosity: Verbosity,
    color: bool,
}

impl Shell {
    pub fn human(verbosity: Verbosity, color: ColorChoice) -> Self {
        Shell {
            json: false,
            verbosity,
            color: color.resolve(),
        }
    }

    pub fn json() -> Self {
        Shell {
            json: true,
            verbosity: Verbosity::Normal,
            color: false,
        }
    }

    /// Build from CLI flags. `json` wins over `quiet` and `verbose`.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        if json {
            return Shell::json();
        }
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Shell::human(verbosity, color)
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn is_quiet(&self) -> bool {
        !self.json && self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        !self.json && self.verbosity == Verbosity::Verbose
    }

    pub fn use_color(&self) -> bool {
        self.color
    }

    /// `{status:>12} {msg}` on stderr. Quiet keeps errors only; JSON mode prints nothing.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.json || (self.is_quiet() && status != Status::Error) {
            return;
        }
        eprintln!("{} {}", self.render(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn error(&self, msg: impl Display) {
        if self.json {
            self.json_event(&serde_json::json!({
                "reason": "error",
                "message": msg.to_string(),
            }));
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// One JSON object on stdout. No-op in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.json {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = serde_json::to_writer(&mut out, event);
        let _ = writeln!(out);
        let _ = out.flush();
    }

    /// A result line on stdout. No-op in JSON mode.
    pub fn print(&self, msg: impl Display) {
        if !self.json {
            println!("{}", msg);
        }
    }

    /// Spinner on stderr while a blocking call runs.
    ///
    /// Only shown in normal human mode on a terminal.
    pub fn spinner(&self, msg: impl Display) -> Spinner {
        let visible = !self.json
            && self.verbosity == Verbosity::Normal
            && io::stderr().is_terminal();

        let bar = visible.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                bar.set_style(style);
            }
            bar.set_message(msg.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Spinner { bar }
    }

    fn render(&self, status: Status) -> String {
        let (label, tone) = status.label();
        if self.color {
            format!("{}{:>w$}\x1b[0m", tone.ansi(), label, w = STATUS_WIDTH)
        } else {
            format!("{:>w$}", label, w = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::human(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Clears its spinner when finished or dropped.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn finish(self) {}
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
