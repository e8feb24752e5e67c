//! Conversation state for a single sender and input parsing helpers.

use serde::{Deserialize, Serialize};

use crate::catalog::FEATURED_PLANTS;

/// Represents where a sender currently is in the menu flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Fresh conversation, the welcome menu has not been shown yet
    #[default]
    Menu,
    /// Welcome shown, waiting for a photo or a menu option
    Default,
    /// Plant list shown, waiting for a number
    SelectingPlant,
}

/// Commands honoured in every state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalCommand {
    Restart,
    Exit,
}

/// Normalize inbound text the way every comparison expects it
pub fn normalize_input(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Recognize a global command in normalized input
pub fn parse_global_command(input: &str) -> Option<GlobalCommand> {
    match input {
        "menu" | "start over" => Some(GlobalCommand::Restart),
        "exit" | "end" => Some(GlobalCommand::Exit),
        _ => None,
    }
}

/// Validates a plant selection, returning the 1-based index
pub fn parse_plant_selection(input: &str) -> Option<usize> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let selection = input.parse::<usize>().ok()?;
    (1..=FEATURED_PLANTS.len())
        .contains(&selection)
        .then_some(selection)
}
