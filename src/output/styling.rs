use console::{style, StyledObject};
use std::fmt::Display;

/// Bright icon followed by an underlined title.
pub fn heading(icon: &str, title: &str) -> String {
    format!("{}  {}", style(icon).bright(), style(title).bright().underlined())
}

pub fn label<D: Display>(text: D) -> StyledObject<D> {
    style(text).dim()
}

pub fn value<D: Display>(text: D) -> StyledObject<D> {
    style(text).cyan()
}

/// Something the user should look at, e.g. a pipeline that is not ready.
pub fn notice<D: Display>(text: D) -> StyledObject<D> {
    style(text).bright().yellow()
}

pub fn success<D: Display>(text: D) -> StyledObject<D> {
    style(text).bright().green()
}

pub fn failure<D: Display>(text: D) -> StyledObject<D> {
    style(text).bright().red()
}

pub fn banner<D: Display>(text: D) -> StyledObject<D> {
    style(text).magenta().bold()
}
