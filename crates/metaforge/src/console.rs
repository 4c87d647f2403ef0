//! Colorful console output for search events.
//!
//! Provides a custom `tracing` layer that formats metaheuristic events
//! with colors. Available with the `console` feature.
//!
//! ## Log Levels
//!
//! - **INFO**: Progress of stop criteria configured with a progress step
//! - **WARN**: Contained failures of neighborhoods and workers
//! - **DEBUG**: Run start/end and best improvements
//! - **TRACE**: Individual movements and pool admissions

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVE: &str = "metaforge_solver=info";

/// Initializes the console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the MetaForge banner and sets up tracing.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SearchConsoleLayer)
            .try_init();
    });
}

fn print_banner() {
    let banner = r#"
 __  __      _        _____
|  \/  | ___| |_ __ _|  ___|__  _ __ __ _  ___
| |\/| |/ _ \ __/ _` | |_ / _ \| '__/ _` |/ _ \
| |  | |  __/ || (_| |  _| (_) | | | (_| |  __/
|_|  |_|\___|\__\__,_|_|  \___/|_|  \__, |\___|
                                    |___/
"#;

    let version_line = format!(
        "              v{} - Composable Metaheuristic Search\n",
        env!("CARGO_PKG_VERSION")
    );

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats search events with colors.
pub struct SearchConsoleLayer;

impl<S: Subscriber> Layer<S> for SearchConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("metaforge_solver") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    metaheuristic: Option<String>,
    component: Option<String>,
    neighborhood: Option<String>,
    id: Option<String>,
    error: Option<String>,
    thread: Option<u64>,
    duration_ms: Option<u64>,
    iterations: Option<u64>,
    objective: Option<f64>,
    percent: Option<f64>,
}

impl EventVisitor {
    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "event" => self.event = Some(value),
            "metaheuristic" => self.metaheuristic = Some(value),
            "component" => self.component = Some(value),
            "neighborhood" => self.neighborhood = Some(value),
            "id" => self.id = Some(value),
            "error" => self.error = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field.name(), s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "thread" => self.thread = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "iterations" => self.iterations = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "objective" => self.objective = Some(value),
            "percent" => self.percent = Some(value),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref().unwrap_or("") {
        "run_start" => format_run_start(v, level),
        "run_end" => format_run_end(v, level),
        "best_improved" => format_best_improved(v),
        "contained_failure" | "run_failed" => format_failure(v, level),
        "progress" => format_progress(v, level),
        _ => String::new(),
    }
}

fn level_label(level: Level) -> String {
    match level {
        Level::ERROR => "ERROR".bright_red().to_string(),
        Level::WARN => " WARN".bright_yellow().to_string(),
        Level::INFO => " INFO".bright_green().to_string(),
        Level::DEBUG => "DEBUG".bright_blue().to_string(),
        Level::TRACE => "TRACE".bright_black().to_string(),
    }
}

fn tag(v: &EventVisitor) -> String {
    let name = v
        .metaheuristic
        .as_deref()
        .or(v.component.as_deref())
        .unwrap_or("Search");
    format!("[{}]", name).bright_cyan().to_string()
}

fn format_run_start(v: &EventVisitor, level: Level) -> String {
    format!(
        "{} {} {} run {} started on thread ({})",
        timestamp().bright_black(),
        level_label(level),
        tag(v),
        v.id.as_deref().unwrap_or("?").white(),
        v.thread.unwrap_or(0).to_string().yellow()
    )
}

fn format_run_end(v: &EventVisitor, level: Level) -> String {
    format!(
        "{} {} {} run {} ended: time spent ({}), objective ({})",
        timestamp().bright_black(),
        level_label(level),
        tag(v),
        v.id.as_deref().unwrap_or("?").white(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        format_objective(v.objective)
    )
}

fn format_best_improved(v: &EventVisitor) -> String {
    let via = v
        .neighborhood
        .as_deref()
        .map(|n| format!(" via {}", n))
        .unwrap_or_default();
    format!(
        "    {} {}{} | {}",
        "->".bright_blue(),
        v.metaheuristic.as_deref().unwrap_or("Search").white(),
        via,
        format_objective(v.objective)
    )
}

fn format_failure(v: &EventVisitor, level: Level) -> String {
    format!(
        "{} {} {} {} recovered: {}",
        timestamp().bright_black(),
        level_label(level),
        tag(v),
        v.id.as_deref().unwrap_or("?").white(),
        v.error.as_deref().unwrap_or("unknown error").bright_red()
    )
}

fn format_progress(v: &EventVisitor, level: Level) -> String {
    format!(
        "{} {} {} progress ({:.0}%), iterations ({})",
        timestamp().bright_black(),
        level_label(level),
        "[Stop]".bright_cyan(),
        v.percent.unwrap_or(0.0).bright_magenta(),
        v.iterations
            .unwrap_or(0)
            .to_formatted_string(&Locale::en)
            .white()
    )
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn format_objective(objective: Option<f64>) -> String {
    match objective {
        None => "N/A".white().to_string(),
        Some(value) if value.is_infinite() => value.to_string().bright_red().to_string(),
        Some(value) => format!("{:.4}", value).bright_green().to_string(),
    }
}
