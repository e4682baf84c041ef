pub mod build;
pub mod completions;
pub mod doctor;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;

use console::Style;
use thiserror::Error;

/// Failure surfaced by a subcommand, carrying its exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The manifest or pinned-version configuration is unusable.
    #[error("config error: {0}")]
    Config(String),
    /// Anything else that aborts the command.
    #[error("{0}")]
    Failure(String),
}

impl CommandError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => EXIT_CONFIG_ERROR,
            Self::Failure(_) => EXIT_FAILURE,
        }
    }
}

impl From<String> for CommandError {
    fn from(msg: String) -> Self {
        Self::Failure(msg)
    }
}

pub fn ok_line(msg: &str) -> String {
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

pub fn fail_line(msg: &str) -> String {
    format!("{} {msg}", Style::new().red().apply_to("✗"))
}

pub fn headline(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_CONFIG_ERROR);
    }

    #[test]
    fn config_errors_carry_the_config_exit_code() {
        let config = CommandError::Config("unknown field `bogus`".to_owned());
        assert_eq!(config.exit_code(), EXIT_CONFIG_ERROR);
        assert!(config.to_string().starts_with("config error:"));

        let failure = CommandError::from("make failed".to_owned());
        assert_eq!(failure.exit_code(), EXIT_FAILURE);
        assert_eq!(failure.to_string(), "make failed");
    }

    #[test]
    fn styled_lines_keep_the_message() {
        assert!(ok_line("artifacts written").contains("artifacts written"));
        assert!(fail_line("build failed").contains("build failed"));
        assert!(headline("launching").contains("launching"));
    }
}
