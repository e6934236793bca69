//! # Split Extension
//!
//! `lines` (alias `split`) and `words` send each piece of their argument as a
//! separate message. An optional leading number sets the delay in seconds between
//! messages (default 0.5).

use anyhow::Result;
use std::time::Duration;

use crate::application::host::{BotHost, Command, CommandContext};
use crate::strings::messages;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    Lines,
    Words,
}

pub fn setup(host: &mut BotHost) -> Result<()> {
    host.add_command(
        Command::new("lines", |ctx| handle_split(ctx, SplitMode::Lines))
            .alias("split")
            .help("Send each line as its own message: lines [delay] <text>"),
    );
    host.add_command(
        Command::new("words", |ctx| handle_split(ctx, SplitMode::Words))
            .help("Send each word as its own message: words [delay] <text>"),
    );
    Ok(())
}

async fn handle_split(ctx: CommandContext, mode: SplitMode) -> Result<()> {
    let (delay, pieces) = split_pieces(&ctx.args, mode)?;
    if pieces.is_empty() {
        return ctx.send(messages::SPLIT_USAGE).await;
    }
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        ctx.send(piece).await?;
    }
    Ok(())
}

/// Separates the optional delay from the text and splits the text into pieces.
pub fn split_pieces(args: &str, mode: SplitMode) -> Result<(Duration, Vec<&str>)> {
    let args = args.trim_start();
    let token_end = args.find(char::is_whitespace).unwrap_or(args.len());
    let (delay, rest) = match args[..token_end].parse::<f64>() {
        Ok(seconds) if !seconds.is_finite() => {
            anyhow::bail!(messages::not_finite(&args[..token_end]))
        }
        Ok(seconds) => match Duration::try_from_secs_f64(seconds.max(0.0)) {
            Ok(delay) => (delay, args[token_end..].trim_start()),
            Err(_) => anyhow::bail!(messages::delay_out_of_range(&args[..token_end])),
        },
        Err(_) => (DEFAULT_DELAY, args),
    };

    let pieces = match mode {
        SplitMode::Lines => rest.lines().filter(|l| !l.trim().is_empty()).collect(),
        SplitMode::Words => rest.split_whitespace().collect(),
    };
    Ok((delay, pieces))
}
