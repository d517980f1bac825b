//! Line commands for the terminal dashboard.

use crate::controller::{DashboardController, Section};

pub const HELP: &str = "\
Commands:
  search <city>   search for a city
  select <n>      show weather for search result n
  locate          use the device location
  daily | hourly  switch forecast view
  save [n]        toggle search result n (or the current location) as favorite
  open <n>        show weather for saved city n
  remove <n>      remove saved city n
  clear           remove all saved cities
  saved           reload saved cities
  refresh         reload the current location
  go <section>    jump to current | forecast | saved
  quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    ClearSearch,
    Select(usize),
    Locate,
    Daily,
    Hourly,
    /// 0-based search result index, or the current location when absent
    Save(Option<usize>),
    Open(usize),
    Remove(usize),
    Clear,
    Saved,
    Refresh,
    Go(Section),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("'{0}' needs a number starting at 1")]
    BadIndex(String),
    #[error("Unknown section: {0}")]
    BadSection(String),
}

/// 1-based user index to 0-based.
fn parse_index(command: &str, arg: &str) -> Result<usize, CommandError> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadIndex(command.to_string())),
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "search" | "s" if arg.is_empty() => Command::ClearSearch,
            "search" | "s" => Command::Search(arg.to_string()),
            "select" => Command::Select(parse_index(word, arg)?),
            "locate" | "here" => Command::Locate,
            "daily" => Command::Daily,
            "hourly" => Command::Hourly,
            "save" | "star" if arg.is_empty() => Command::Save(None),
            "save" | "star" => Command::Save(Some(parse_index(word, arg)?)),
            "open" => Command::Open(parse_index(word, arg)?),
            "remove" | "rm" => Command::Remove(parse_index(word, arg)?),
            "clear" => Command::Clear,
            "saved" => Command::Saved,
            "refresh" => Command::Refresh,
            "go" => Command::Go(match arg.to_lowercase().as_str() {
                "current" | "home" => Section::Current,
                "forecast" => Section::Forecast,
                "saved" | "favorites" => Section::SavedCities,
                other => return Err(CommandError::BadSection(other.to_string())),
            }),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Runs one command. Returns `false` when the session should end.
pub async fn dispatch(controller: &DashboardController, command: Command) -> bool {
    match command {
        Command::Search(query) => {
            // failures are already reported through the view
            let _ = controller.search(&query).await;
        }
        Command::ClearSearch => controller.clear_search_input(),
        Command::Select(index) => {
            controller.select_search_result(index).await;
        }
        Command::Locate => {
            controller.use_device_location().await;
        }
        Command::Daily => controller.show_daily(),
        Command::Hourly => controller.show_hourly(),
        Command::Save(index) => {
            let target = match index {
                Some(i) => controller.search_results().get(i).cloned(),
                None => controller.current_location(),
            };
            match target {
                Some(location) => {
                    // failures are already reported through the view
                    let _ = controller.toggle_saved(location).await;
                }
                None => println!("Nothing to save"),
            }
        }
        Command::Open(index) => match controller.saved_cities().get(index).cloned() {
            Some(location) => {
                controller.select_location(location).await;
            }
            None => println!("No saved city #{}", index + 1),
        },
        Command::Remove(index) => match controller.saved_cities().get(index).cloned() {
            Some(location) => {
                let _ = controller.remove_saved(&location).await;
            }
            None => println!("No saved city #{}", index + 1),
        },
        Command::Clear => {
            let _ = controller.clear_saved().await;
        }
        Command::Saved => {
            controller.refresh_saved_cities().await;
        }
        Command::Refresh => {
            controller.refresh().await;
        }
        Command::Go(section) => controller.navigate(section),
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}
