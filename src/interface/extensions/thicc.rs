//! # Thicc Extension
//!
//! `thicc` converts letters, digits and a few symbols to emoji. Emoji
//! shortcodes (`:smile:`) and custom emoji tokens pass through untouched.

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::application::host::{BotHost, Command, CommandContext};

const DIGITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Keeps adjacent regional indicators from merging into flags.
const SEPARATOR: char = '\u{180E}';

pub fn setup(host: &mut BotHost) -> Result<()> {
    host.add_command(Command::new("thicc", handle_thicc).help("Convert letters to emojis"));
    Ok(())
}

async fn handle_thicc(ctx: CommandContext) -> Result<()> {
    if ctx.args.is_empty() {
        anyhow::bail!("thicc needs some text to convert");
    }
    ctx.send(&thicc(&ctx.args)).await
}

fn emoji_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"(?:<a?:\w+:\d+>|:[a-z_]+:)").expect("static regex"))
}

pub fn thicc(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 4);
    let mut end = 0;
    for token in emoji_token().find_iter(text) {
        convert_into(&text[end..token.start()], &mut result);
        result.push_str(token.as_str());
        end = token.end();
    }
    convert_into(&text[end..], &mut result);
    result
}

fn convert_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            'a'..='z' | 'A'..='Z' => {
                let offset = c.to_ascii_lowercase() as u32 - 'a' as u32;
                if let Some(indicator) = char::from_u32(0x1F1E6 + offset) {
                    out.push(indicator);
                    out.push(SEPARATOR);
                }
            }
            '0'..='9' => {
                out.push(':');
                out.push_str(DIGITS[c as usize - '0' as usize]);
                out.push(':');
            }
            '!' => out.push('❗'),
            '?' => out.push('❓'),
            '+' => out.push('➕'),
            '-' => out.push('➖'),
            '$' => out.push('💲'),
            '*' => out.push_str("*\u{FE0F}\u{20E3}"),
            '#' => out.push_str("#\u{FE0F}\u{20E3}"),
            other => out.push(other),
        }
    }
}
