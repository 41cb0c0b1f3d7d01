use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub mode: Mode,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("help requested")]
    HelpRequested,
}

impl CliOptions {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut mode = Mode::Chat;

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Err(CliError::HelpRequested),
                "check" if mode == Mode::Chat => mode = Mode::Check,
                unknown => return Err(CliError::UnknownArgument(unknown.to_string())),
            }
        }

        Ok(Self { mode })
    }
}

pub fn print_usage() {
    eprintln!(
        "Usage: zodiac-guide [check]\n\
         \n\
         Commands:\n\
         - (none)  Start an interactive zodiac conversation\n\
         - check   Verify the chat deployment and search index are reachable\n\
         \n\
         Options:\n\
         - --help  Show this help text\n\
         \n\
         Configuration is read from the environment or a .env file in the\n\
         working directory."
    );
}
