use std::sync::LazyLock;

use clap::Parser;
use quiz::{QuizAnswer, best_profile};
use regex::Regex;

static ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+):?([A-Za-z]+)$").expect("valid answer pattern"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Score questionnaire answers against the Academy profiles")]
struct Args {
    /// Answers such as `3b` or `3:b`
    #[arg(required = true, value_parser = parse_answer)]
    answers: Vec<QuizAnswer>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn parse_answer(raw: &str) -> Result<QuizAnswer, String> {
    let captures = ANSWER
        .captures(raw.trim())
        .ok_or_else(|| format!("expected <number><letter>, got {raw:?}"))?;

    let question_number = captures[1]
        .parse()
        .map_err(|e| format!("invalid question number in {raw:?}: {e}"))?;

    Ok(QuizAnswer::new(question_number, &captures[2]))
}

fn main() -> Result<(), serde_json::Error> {
    let args = Args::parse();

    let profile = best_profile(&args.answers);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile.result())?);
    } else {
        println!("{} ({})", profile.name, profile.kind);
        println!("{}", profile.description);
    }

    Ok(())
}
