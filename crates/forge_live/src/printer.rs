//! Console presentation sink: colored status lines, banners and a spinner.

use std::time::Duration;

use forge_core::sink::{Color, PresentationSink};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

pub const ACCENT: (u8, u8, u8) = (37, 171, 190);

pub struct ConsolePrinter {
    spinner: ProgressBar,
}

impl ConsolePrinter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        Self { spinner }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for ConsolePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsolePrinter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl PresentationSink for ConsolePrinter {
    fn print(&self, text: &str, color: Color, blank_before: usize, blank_after: usize) {
        let rendered = render_line(text, color, blank_before, blank_after);
        self.spinner.suspend(|| println!("{rendered}"));
    }

    fn show_banner(&self, title: &str) {
        let rendered = render_banner(title);
        self.spinner.suspend(|| println!("{rendered}"));
    }

    fn change_spinner_legend(&self, text: &str) {
        self.spinner.set_message(text.to_string());
        self.spinner.enable_steady_tick(Duration::from_millis(100));
    }
}

pub fn render_line(text: &str, color: Color, blank_before: usize, blank_after: usize) -> String {
    let colored = match color {
        Color::Green => text.green().to_string(),
        Color::Red => text.red().to_string(),
        Color::White => text.white().to_string(),
        Color::Gray => text.bright_black().to_string(),
    };
    format!(
        "{}{colored}{}",
        "\n".repeat(blank_before),
        "\n".repeat(blank_after)
    )
}

pub fn render_banner(title: &str) -> String {
    let rule = "=".repeat(title.chars().count() + 8);
    let (r, g, b) = ACCENT;
    format!(
        "{}\n{}\n{}",
        rule.truecolor(r, g, b),
        format!("    {title}    ").truecolor(r, g, b).bold(),
        rule.truecolor(r, g, b)
    )
}
