use dialoguer::Input;
use owo_colors::OwoColorize;

use crate::error::LiveError;
use crate::printer::ACCENT;

/// Source of the message body typed by the engineer.
pub trait MessagePrompt {
    fn message_body(&self) -> Result<String, LiveError>;
}

pub struct DialoguerPrompt;

impl MessagePrompt for DialoguerPrompt {
    fn message_body(&self) -> Result<String, LiveError> {
        let (r, g, b) = ACCENT;
        Input::<String>::new()
            .with_prompt("Message".truecolor(r, g, b).to_string())
            .interact_text()
            .map_err(|error| LiveError::Prompt(error.to_string()))
    }
}
