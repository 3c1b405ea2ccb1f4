use std::io::{self, Write};

use fixbot::chatbot::{Answer, Chatbot};
use fixbot::matcher::similarities;
use fixbot::stopwords::STOPWORDS_VERSION;
use fixbot::text::normalize;

pub enum Command {
    Ask { query: String },
    Explain { query: String, top: usize },
    Stats,
}

/// Parse one REPL line into a command
/// Lines starting with ':' are meta commands, everything else is a question
pub fn parse_command(line: &str) -> Result<Command, String> {
    let Some(meta) = line.strip_prefix(':') else {
        return Ok(Command::Ask { query: line.to_string() });
    };

    let mut parts = meta.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match name {
        "explain" => parse_explain(rest),
        "stats" => Ok(Command::Stats),
        _ => Err(format!("Unknown command: :{}. Available: :explain, :stats", name)),
    }
}

/// Parse the ':explain' command
/// Usage: :explain [--top <number>] <question>
fn parse_explain(rest: &str) -> Result<Command, String> {
    let mut top = 3; // default value
    let mut query = rest;

    if let Some(after) = rest.strip_prefix("--top") {
        let after = after.trim_start();
        let (num, remainder) = after.split_once(char::is_whitespace).unwrap_or((after, ""));
        top = num.parse::<usize>()
            .map_err(|_| format!("Invalid --top value: '{}'. Must be a positive integer.", num))?;
        query = remainder.trim();
    }

    if query.is_empty() {
        return Err("':explain' requires a question. Usage: :explain [--top N] <question>".to_string());
    }

    Ok(Command::Explain { query: query.to_string(), top })
}

/// REPL mode - interactive session against a loaded chatbot
pub fn run_repl(bot: &Chatbot) {
    println!("fixbot - Computer Troubleshooting Chatbot");
    println!("Type 'help' for commands, 'exit' or 'quit' to quit\n");

    loop {
        print!("fixbot> ");
        if let Err(error) = io::stdout().flush() {
            eprintln!("Error writing prompt: {}", error);
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_help();
            continue;
        }

        match parse_command(input) {
            Ok(command) => execute_command(bot, command),
            Err(error) => eprintln!("Error: {}", error),
        }
    }
}

pub fn execute_command(bot: &Chatbot, command: Command) {
    match command {
        Command::Ask { query } => println!("{}", bot.respond(&query)),

        Command::Explain { query, top } => explain(bot, &query, top),

        Command::Stats => {
            let index = bot.model().index();
            println!("Rows: {}", index.len());
            println!("Vocabulary: {}", index.vocabulary().len());
            println!("Weighting: {:?}", index.weighting());
            println!("Threshold: {:.2}", bot.threshold());
            println!("Stopwords: {}", STOPWORDS_VERSION);
        }
    }
}

/// Prints the normalized query, the best scoring rows and the final answer
pub fn explain(bot: &Chatbot, query: &str, top: usize) {
    let cleaned = normalize(query);
    println!("Normalized: {:?}", cleaned);

    let index = bot.model().index();
    let scores = similarities(&index.transform(&cleaned), index.documents());

    let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
    // stable sort keeps lower indices first among equal scores
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    println!("Top {} rows:", top.min(ranked.len()));
    for (rank, (i, score)) in ranked.iter().take(top).enumerate() {
        println!("{}. Score: {:.4}, Problem: {}", rank + 1, score, bot.rows()[*i].problem);
    }

    match bot.answer(query) {
        Answer::Matched { score, .. } => println!("Answer (score {:.4}):", score),
        Answer::NoMatch { best_score } => println!("No match (best {:.4} < {:.2}):", best_score, bot.threshold()),
        Answer::Invalid => println!("Invalid query:"),
    }
    println!("{}", bot.respond(query));
}

fn print_help() {
    println!("Available commands:");
    println!("  <question>                       - Ask the chatbot");
    println!("  :explain [--top N] <question>    - Show the closest rows and their scores (default N=3)");
    println!("  :stats                           - Show index statistics");
    println!("  help                             - Show this help");
    println!("  exit, quit                       - Exit the program");
}
