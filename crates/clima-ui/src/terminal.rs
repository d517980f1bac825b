//! Plain-text dashboard for the terminal.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::controller::{Confirm, DashboardView, Notification, NotificationKind, Section, Trigger};
use crate::render::{
    CurrentView, ForecastMode, ForecastView, SavedCitiesView, SavedCityStatus, SearchResultsView,
};

/// Writes every repaint as a block of text.
pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = self.out.lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                tracing::debug!("Terminal write failed: {}", e);
                return;
            }
        }
        let _ = out.flush();
    }
}

fn section_title(section: Section) -> &'static str {
    match section {
        Section::Current => "Current weather",
        Section::Forecast => "Forecast",
        Section::SavedCities => "Saved cities",
    }
}

impl<W: Write + Send> DashboardView for TerminalView<W> {
    fn show_current(&self, view: &CurrentView) {
        self.write_lines(&[
            String::new(),
            format!("== {} ==", view.location_name),
            format!("   {}", view.coordinates),
            format!("   [{}] {} {}", view.icon, view.temperature, view.description),
            format!("   Feels like {}", view.feels_like),
            format!("   Humidity {}", view.humidity),
            format!("   Wind {} {}", view.wind_speed, view.wind_direction),
        ]);
    }

    fn show_forecast(&self, view: &ForecastView) {
        let mut lines = vec![String::new()];
        match view {
            ForecastView::Daily(cards) => {
                lines.push("-- Daily forecast --".to_string());
                for card in cards {
                    let mut line = format!(
                        "   {:<12} [{}] {} / {}  {}",
                        card.label,
                        card.icon,
                        card.temperature_max,
                        card.temperature_min,
                        card.description
                    );
                    if let Some(precipitation) = &card.precipitation {
                        line.push_str(&format!("  ({})", precipitation));
                    }
                    lines.push(line);
                }
            }
            ForecastView::Hourly(cards) => {
                lines.push("-- Hourly forecast --".to_string());
                for card in cards {
                    lines.push(format!(
                        "   {} [{}] {}  {}",
                        card.time, card.icon, card.temperature, card.humidity
                    ));
                }
            }
        }
        self.write_lines(&lines);
    }

    fn set_forecast_mode(&self, mode: ForecastMode) {
        tracing::debug!("Forecast mode: {:?}", mode);
    }

    fn show_search_results(&self, view: &SearchResultsView) {
        let mut lines = vec![String::new(), "-- Search results --".to_string()];
        match view {
            SearchResultsView::Empty { message } => lines.push(format!("   {}", message)),
            SearchResultsView::Results(rows) => {
                for row in rows {
                    let star = if row.is_saved { "*" } else { " " };
                    lines.push(format!(
                        "  {}{:>2}. {} ({})",
                        star,
                        row.index + 1,
                        row.name,
                        row.coordinates
                    ));
                }
            }
        }
        self.write_lines(&lines);
    }

    fn hide_search_results(&self) {}

    fn show_saved_cities(&self, view: &SavedCitiesView) {
        let mut lines = vec![String::new(), "-- Saved cities --".to_string()];
        match view {
            SavedCitiesView::Empty { message, hint } => {
                lines.push(format!("   {}", message));
                lines.push(format!("   {}", hint));
            }
            SavedCitiesView::Cards(cards) => {
                for (i, card) in cards.iter().enumerate() {
                    let status = match &card.status {
                        SavedCityStatus::Weather {
                            icon,
                            temperature,
                            description,
                        } => format!("[{}] {} {}", icon, temperature, description),
                        SavedCityStatus::Failed { message } => message.to_string(),
                    };
                    lines.push(format!("  {:>2}. {}: {}", i + 1, card.name, status));
                }
            }
        }
        self.write_lines(&lines);
    }

    fn set_busy(&self, control: Trigger, busy: bool) {
        if busy {
            tracing::debug!("{:?} busy", control);
        }
    }

    fn notify(&self, notification: &Notification) {
        let prefix = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        self.write_lines(&[format!("[{}] {}", prefix, notification.message)]);
    }

    fn set_active_section(&self, section: Section) {
        tracing::debug!("Active section: {:?}", section);
    }

    fn scroll_to(&self, section: Section) {
        self.write_lines(&[format!(">> {}", section_title(section))]);
    }

    fn set_last_updated(&self, label: &str) {
        self.write_lines(&[format!("   ({})", label)]);
    }
}

/// Asks on stdout and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            print!("{} [y/N] ", prompt);
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                tracing::warn!("Failed to read confirmation: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Confirmation task failed: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
