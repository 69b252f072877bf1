use anyhow::Result;
use sweeptoken_protocol::{BLANK, BOMB, BoardMessage, Button, FLAG, FollowupMessage};

/// Writes rendered messages to stdout, either as a text grid or as JSON.
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn board(&self, message: &BoardMessage) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(message)?);
            return Ok(());
        }

        println!("{}", message.content);
        let width = message.rows.first().map_or(0, Vec::len);
        for (y, row) in message.rows.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(x, button)| format!("{:>4}", cell_glyph(button, y * width + x)))
                .collect();
            println!("{}", cells.join(""));
        }
        Ok(())
    }

    pub fn followup(&self, message: &FollowupMessage) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(message)?);
            return Ok(());
        }

        if message.content != BLANK {
            println!("{}", message.content);
        }
        for button in &message.buttons {
            let state = if button.disabled { " (disabled)" } else { "" };
            let emoji = button
                .emoji
                .as_deref()
                .map(|emoji| format!("{emoji} "))
                .unwrap_or_default();
            println!("[{emoji}{}]{state} {}", button.label, button.token);
        }
        Ok(())
    }

    pub fn state(&self, state: &[u8]) {
        let state = hex::encode(state);
        if self.json {
            println!("{}", serde_json::json!({ "state": state }));
        } else {
            println!("state: {state}");
        }
    }
}

/// Hidden cells show their index so they can be clicked by number.
fn cell_glyph(button: &Button, index: usize) -> String {
    match button.emoji.as_deref() {
        Some(FLAG) => "F".to_string(),
        Some(BOMB) => "*".to_string(),
        _ if button.label == BLANK => format!("·{index}"),
        _ => button.label.clone(),
    }
}
