use regex::Regex;
use thiserror::Error;

#[derive(Debug, PartialEq)]
pub enum Command {
    List,
    Add {
        title: String,
        description: String,
    },
    Edit {
        position: usize,
        title: String,
        description: Option<String>,
    },
    Done(usize),
    Undo(usize),
    Toggle(usize),
    Remove(usize),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
list                              show all tasks
add <title> [| <description>]     create a task
edit <n> <title> [| <description>] change task n
done <n> / undo <n> / toggle <n>  change completion of task n
rm <n>                            delete task n
help                              show this help
quit                              exit";

// Splits "title | description" and collapses whitespace in the title
fn split_text(input: &str) -> (String, Option<String>) {
    let (title, description) = match input.split_once('|') {
        Some((title, description)) => (title, Some(description.trim().to_string())),
        None => (input, None),
    };

    let title = Regex::new(r"\s+")
        .unwrap()
        .replace_all(title, " ")
        .trim()
        .to_string();

    (title, description)
}

fn parse_position(rest: &str, usage: &'static str) -> Result<usize, ParseError> {
    match rest.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::Usage(usage)),
    }
}

pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let command_re = Regex::new(r"^\s*(\w+)(?:\s+(.*))?$").unwrap();

    let caps = command_re
        .captures(input)
        .ok_or_else(|| ParseError::Unknown(input.trim().to_string()))?;
    let verb = caps[1].to_lowercase();
    let rest = caps.get(2).map_or("", |m| m.as_str());

    match verb.as_str() {
        "list" | "ls" => Ok(Command::List),
        "help" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "add" => {
            let (title, description) = split_text(rest);
            if title.is_empty() {
                return Err(ParseError::Usage("add <title> [| <description>]"));
            }
            Ok(Command::Add {
                title,
                description: description.unwrap_or_default(),
            })
        }
        "edit" => {
            let edit_re = Regex::new(r"^\s*(\d+)\s+(.+)$").unwrap();
            let usage = "edit <n> <title> [| <description>]";
            let caps = edit_re.captures(rest).ok_or(ParseError::Usage(usage))?;
            let position = parse_position(&caps[1], usage)?;
            let (title, description) = split_text(&caps[2]);
            if title.is_empty() {
                return Err(ParseError::Usage(usage));
            }
            Ok(Command::Edit {
                position,
                title,
                description,
            })
        }
        "done" => Ok(Command::Done(parse_position(rest, "done <n>")?)),
        "undo" => Ok(Command::Undo(parse_position(rest, "undo <n>")?)),
        "toggle" => Ok(Command::Toggle(parse_position(rest, "toggle <n>")?)),
        "rm" | "delete" => Ok(Command::Remove(parse_position(rest, "rm <n>")?)),
        _ => Err(ParseError::Unknown(verb)),
    }
}
