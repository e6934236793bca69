//! # Gee Extension
//!
//! `gee` replies with something GeeTransit would say.
//!
//! - `gee` -> random response
//! - `gee ...` -> yes / no
//! - `gee a or b` -> one of the choices
//! - `gee X ...` -> random number in [0, X]
//! - `gee X Y ...` -> random number in [X, Y]
//!
//! Numbers past the `i128` range get a "too large" reply.

use anyhow::Result;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use regex::Regex;
use std::num::{IntErrorKind, ParseIntError};
use std::sync::OnceLock;

use crate::application::host::{BotHost, Command, CommandContext};
use crate::strings::messages;

const REPLIES: &[&str] = &[
    "dang lol", "lmao", "fax", "bruh lol", "lol", "o ezpz", "bruh tru", "damn", "dang", "tru",
    "lmaoo", "big fax", "o really", "ebic", "o dang", "wut lol", "damn boi", "tooez", "pog",
    "lol aight", "o bruh", "sus", "ree", "yeebruh", "xD", "bruh", "pong", "lol pong", "ezpz",
    "bruh moment", "ez", "monke", "toocool",
];

const QUESTION_REPLIES: &[&str] = &[
    "ye lol", "lol idk", "na lol", "ye ik", "na", "ye", "bruh na", "orz ye", "sus na",
];

/// "lol idk" gets 1/7 of the weight; the rest share the remainder evenly.
const QUESTION_WEIGHTS: &[u32] = &[3, 4, 3, 3, 3, 3, 3, 3, 3];

pub fn setup(host: &mut BotHost) -> Result<()> {
    host.add_command(
        Command::new("gee", handle_gee)
            .alias("g")
            .help("Reply with something GeeTransit would say"),
    );
    Ok(())
}

async fn handle_gee(ctx: CommandContext) -> Result<()> {
    let reply = gee_reply(&ctx.args, &mut rand::thread_rng());
    ctx.send(&reply).await
}

fn or_separator() -> &'static Regex {
    static OR: OnceLock<Regex> = OnceLock::new();
    OR.get_or_init(|| Regex::new(r"\bor\b").expect("static regex"))
}

pub fn gee_reply<R: Rng>(args: &str, rng: &mut R) -> String {
    let words: Vec<&str> = args.split_whitespace().collect();

    if words.contains(&"or") {
        let choices: Vec<&str> = or_separator()
            .split(args)
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .collect();
        if let Some(choice) = choices.choose(rng) {
            return choice.to_string();
        }
    }

    let Some(first) = words.first() else {
        return pick(REPLIES, rng);
    };
    let a = match first.parse::<i128>() {
        Ok(a) => a,
        Err(err) if is_overflow(&err) => return messages::number_too_large(first),
        Err(_) => {
            return match WeightedIndex::new(QUESTION_WEIGHTS) {
                Ok(dist) => QUESTION_REPLIES[dist.sample(rng)].to_string(),
                Err(_) => pick(QUESTION_REPLIES, rng),
            };
        }
    };
    let b = match words.get(1).map(|w| (w, w.parse::<i128>())) {
        Some((_, Ok(b))) => b,
        Some((word, Err(err))) if is_overflow(&err) => return messages::number_too_large(word),
        _ => return rng.gen_range(a.min(0)..=a.max(0)).to_string(),
    };

    if (a, b) == (69, 420) {
        return pick(&["69", "420"], rng);
    }
    rng.gen_range(a.min(b)..=a.max(b)).to_string()
}

fn is_overflow(err: &ParseIntError) -> bool {
    matches!(err.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow)
}

fn pick<R: Rng>(options: &[&str], rng: &mut R) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_args_give_a_stock_reply() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(REPLIES.contains(&gee_reply("", &mut rng).as_str()));
        }
    }

    #[test]
    fn test_question_gets_yes_or_no() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = gee_reply("is it friday", &mut rng);
            assert!(QUESTION_REPLIES.contains(&reply.as_str()));
        }
    }

    #[test]
    fn test_choice_picks_one_side() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = gee_reply("pizza or tacos or sushi", &mut rng);
            assert!(["pizza", "tacos", "sushi"].contains(&reply.as_str()), "{reply}");
        }
        // "or" inside a word is not a separator
        let reply = gee_reply("orange or lemon", &mut rng);
        assert!(["orange", "lemon"].contains(&reply.as_str()), "{reply}");
    }

    #[test]
    fn test_numbers_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let n: i128 = gee_reply("-5", &mut rng).parse().unwrap();
            assert!((-5..=0).contains(&n));
            let n: i128 = gee_reply("10 3 dice", &mut rng).parse().unwrap();
            assert!((3..=10).contains(&n));
            let n: i128 = gee_reply("69 420", &mut rng).parse().unwrap();
            assert!(n == 69 || n == 420);
        }
    }

    #[test]
    fn test_numbers_past_i64_still_roll() {
        let mut rng = StdRng::seed_from_u64(7);
        let bound = 99_999_999_999_999_999_999_i128;
        for _ in 0..20 {
            let n: i128 = gee_reply("99999999999999999999", &mut rng).parse().unwrap();
            assert!((0..=bound).contains(&n));
            let n: i128 = gee_reply("-99999999999999999999 1", &mut rng).parse().unwrap();
            assert!((-bound..=1).contains(&n));
        }
    }

    #[test]
    fn test_number_too_large_is_reported() {
        let mut rng = StdRng::seed_from_u64(7);
        let huge = "1".repeat(50);
        assert_eq!(
            gee_reply(&huge, &mut rng),
            format!("{huge} is too large a number")
        );
        assert_eq!(
            gee_reply(&format!("3 -{huge}"), &mut rng),
            format!("-{huge} is too large a number")
        );
    }
}
