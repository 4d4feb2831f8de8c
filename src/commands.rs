#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    New(Option<String>),
    Projects,
    Open(String),
    Phase(String),
    Status(String),
    Snippets,
    Preview(Option<String>),
    Live(Option<String>),
    Quit,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/new" => SlashCommand::New(argument),
        "/projects" => SlashCommand::Projects,
        "/open" => SlashCommand::Open(argument.unwrap_or_default()),
        "/phase" => SlashCommand::Phase(argument.unwrap_or_default()),
        "/status" => SlashCommand::Status(argument.unwrap_or_default()),
        "/snippets" => SlashCommand::Snippets,
        "/preview" => SlashCommand::Preview(argument),
        "/live" => SlashCommand::Live(argument),
        "/quit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}
