//! The command line typed after `:` or `/`.
//!
//! Meta-commands (`:q`, `/help`, `/err`, ...) are matched on the exact trimmed
//! text. Everything else is split on whitespace and the first token, which
//! must carry the `/` prefix, selects the verb.

pub mod error;
pub mod key_value;

#[cfg(test)]
mod tests;

pub use error::CommandError;
pub use key_value::{KeyValue, parse_key_value};

pub const QUERY_USAGE: &str = "Usage: /query [indexName] pk=value";
pub const GET_USAGE: &str = "Usage: /get pk [sk]";
pub const UPDATE_USAGE: &str = "Usage: /update pk [sk]";

/// Primary key values given as command arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyArgs {
    pub partition: String,
    pub sort: Option<String>,
}

impl KeyArgs {
    fn from_args(args: &[&str]) -> Option<Self> {
        let (partition, rest) = args.split_first()?;
        Some(Self {
            partition: partition.to_string(),
            sort: rest.first().map(|sort| sort.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Help,
    ShowError,
    Scan { index: Option<String> },
    Query { index: Option<String>, key: KeyValue },
    Get(KeyArgs),
    Put,
    Update(KeyArgs),
    /// Without a key the current selection is deleted after confirmation.
    Delete(Option<KeyArgs>),
}

/// Parses one entered line. An empty line yields `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    match line {
        ":q" | ":quit" | "/q" | "/quit" | "\\q" => return Ok(Some(Command::Quit)),
        ":?" | ":help" | "/?" | "/help" => return Ok(Some(Command::Help)),
        "/err" | ":err" => return Ok(Some(Command::ShowError)),
        _ => {}
    }

    let mut tokens = line.split_whitespace();
    let Some(token) = tokens.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = tokens.collect();
    let unknown = || CommandError::UnknownCommand {
        token: token.to_string(),
    };

    let verb = token.to_lowercase();
    let verb = verb.strip_prefix('/').ok_or_else(unknown)?;

    let command = match verb {
        "scan" => Command::Scan {
            index: args.first().map(|index| index.to_string()),
        },
        "query" => parse_query(&args)?,
        "get" => Command::Get(KeyArgs::from_args(&args).ok_or(CommandError::Usage(GET_USAGE))?),
        "put" => Command::Put,
        "update" => {
            Command::Update(KeyArgs::from_args(&args).ok_or(CommandError::Usage(UPDATE_USAGE))?)
        }
        "delete" | "rm" => Command::Delete(KeyArgs::from_args(&args)),
        _ => return Err(unknown()),
    };
    Ok(Some(command))
}

fn parse_query(args: &[&str]) -> Result<Command, CommandError> {
    // more than one argument and no `=` in the first: it names an index
    let (index, key_args) = match args {
        [first, rest @ ..] if !rest.is_empty() && !first.contains('=') => {
            (Some(first.to_string()), rest)
        }
        _ => (None, args),
    };
    let key = key_args.first().ok_or(CommandError::Usage(QUERY_USAGE))?;
    Ok(Command::Query {
        index,
        key: parse_key_value(key)?,
    })
}
