//! Write-only presentation interface used by the live orchestrator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
    White,
    Gray,
}

/// Renders status text for the engineer. Implementations never feed anything
/// back into the caller.
pub trait PresentationSink {
    /// Prints `text` framed by `blank_before` and `blank_after` empty lines.
    fn print(&self, text: &str, color: Color, blank_before: usize, blank_after: usize);

    fn show_banner(&self, title: &str);

    fn change_spinner_legend(&self, text: &str);
}
