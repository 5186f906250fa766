//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use speakeasy_core::Settings;

/// Default destination of `--test` and of the save control.
pub const DEFAULT_OUTPUT: &str = "test_output.wav";

/// Offline text-to-speech with an interactive terminal front-end.
///
/// Without `--test` an interactive session starts; type text and press Enter
/// to hear it.
#[derive(Debug, Parser)]
#[command(name = "speakeasy")]
#[command(about = "Offline text-to-speech in your terminal")]
#[command(version)]
pub struct Cli {
    /// Override the voice models directory for this invocation
    #[arg(long = "models-dir", env = "SPEAKEASY_MODELS_DIR")]
    pub models_dir: Option<String>,

    /// Voice to load at start-up
    #[arg(long, env = "SPEAKEASY_VOICE")]
    pub voice: Option<String>,

    /// Synthesize TEXT to --out without the interactive front-end, then exit
    #[arg(long = "test", value_name = "TEXT")]
    pub test: Option<String>,

    /// Where --test and the save control write audio
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Runtime settings implied by the arguments.
    pub fn settings(&self) -> Settings {
        Settings {
            default_voice: self.voice.clone(),
            ..Settings::with_defaults()
        }
    }

    /// Whether to run the headless test instead of the terminal front-end.
    pub const fn is_headless(&self) -> bool {
        self.test.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["speakeasy"]);
        assert!(!cli.is_headless());
        assert_eq!(cli.out, PathBuf::from(DEFAULT_OUTPUT));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_headless_args() {
        let cli = Cli::parse_from([
            "speakeasy",
            "--test",
            "Hello there",
            "--out",
            "/tmp/hello.wav",
            "--voice",
            "Male (Ryan)",
            "--models-dir",
            "/tmp/models",
        ]);
        assert!(cli.is_headless());
        assert_eq!(cli.test.as_deref(), Some("Hello there"));
        assert_eq!(cli.out, PathBuf::from("/tmp/hello.wav"));
        assert_eq!(cli.models_dir.as_deref(), Some("/tmp/models"));
        assert_eq!(cli.settings().default_voice.as_deref(), Some("Male (Ryan)"));
    }
}
