//! Chat prompt and slash commands.
//!
//! Typing starts when the player presses `/`; the buffer is echoed by the
//! HUD and submitted with Enter. Command handling mutates engine state
//! directly — the only state a command may leave behind on failure is a
//! chat message explaining the rejection.

use bevy::prelude::*;
use bevy::window::ReceivedCharacter;
use std::collections::VecDeque;

use crate::chunk::streaming::ViewConfig;

pub const MAX_MESSAGES: usize = 4;
pub const MAX_TEXT_LENGTH: usize = 256;

/// Rolling log of recent chat/engine messages, oldest first.
#[derive(Resource, Default)]
pub struct Messages {
    entries: VecDeque<String>,
}

impl Messages {
    pub fn add(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{text}");
        self.entries.push_back(text);
        while self.entries.len() > MAX_MESSAGES {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// State of the chat prompt.
#[derive(Resource, Default)]
pub struct TypingState {
    pub active: bool,
    pub buffer: String,
}

/// Execute one slash command. Unknown commands are ignored.
pub fn parse_command(input: &str, view: &mut ViewConfig, messages: &mut Messages) {
    if let Some(arg) = input.strip_prefix("/view ") {
        match arg.trim().parse::<i32>() {
            Ok(radius) if (1..=24).contains(&radius) => {
                view.create_radius = radius;
                view.render_radius = radius;
                view.delete_radius = radius + 4;
            }
            _ => {
                messages.add("Viewing distance must be between 1 and 24.");
            }
        }
    }
}

/// Drive the chat prompt from keyboard input.
#[allow(clippy::needless_pass_by_value)]
pub fn chat_input(
    mut chars: EventReader<ReceivedCharacter>,
    keys: Res<ButtonInput<KeyCode>>,
    mut typing: ResMut<TypingState>,
    mut view: ResMut<ViewConfig>,
    mut messages: ResMut<Messages>,
) {
    if typing.active {
        if keys.just_pressed(KeyCode::Escape) {
            typing.active = false;
            typing.buffer.clear();
            chars.clear();
            return;
        }
        if keys.just_pressed(KeyCode::Enter) {
            let command = std::mem::take(&mut typing.buffer);
            typing.active = false;
            if command.starts_with('/') {
                parse_command(&command, &mut view, &mut messages);
            } else if !command.is_empty() {
                messages.add(command);
            }
            chars.clear();
            return;
        }
        if keys.just_pressed(KeyCode::Backspace) {
            typing.buffer.pop();
        }
        for ev in chars.read() {
            for c in ev.char.chars() {
                if (' '..='~').contains(&c) && typing.buffer.len() < MAX_TEXT_LENGTH - 1 {
                    typing.buffer.push(c);
                }
            }
        }
    } else {
        for ev in chars.read() {
            if ev.char.as_str() == "/" {
                typing.active = true;
                typing.buffer.clear();
                typing.buffer.push('/');
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_command_sets_all_three_radii() {
        let mut view = ViewConfig::default();
        let mut messages = Messages::default();
        parse_command("/view 2", &mut view, &mut messages);
        assert_eq!(view.create_radius, 2);
        assert_eq!(view.render_radius, 2);
        assert_eq!(view.delete_radius, 6);
        assert_eq!(messages.iter().count(), 0);
    }

    #[test]
    fn out_of_range_view_is_rejected_with_a_message() {
        let mut view = ViewConfig::default();
        let mut messages = Messages::default();
        parse_command("/view 2", &mut view, &mut messages);
        parse_command("/view 30", &mut view, &mut messages);
        assert_eq!(view.render_radius, 2, "rejected command must not change state");
        let logged: Vec<_> = messages.iter().collect();
        assert_eq!(logged, vec!["Viewing distance must be between 1 and 24."]);
    }

    #[test]
    fn malformed_view_argument_is_rejected() {
        let mut view = ViewConfig::default();
        let mut messages = Messages::default();
        let before = view.render_radius;
        parse_command("/view much", &mut view, &mut messages);
        assert_eq!(view.render_radius, before);
        assert_eq!(messages.iter().count(), 1);
    }

    #[test]
    fn message_log_keeps_only_the_most_recent() {
        let mut messages = Messages::default();
        for i in 0..6 {
            messages.add(format!("message {i}"));
        }
        let logged: Vec<_> = messages.iter().collect();
        assert_eq!(logged.len(), MAX_MESSAGES);
        assert_eq!(logged[0], "message 2");
        assert_eq!(logged[3], "message 5");
    }
}
