//! Speech-to-text input
//!
//! Voice input is a second way into the text submission path. The
//! microphone control is a two-state toggle; the recognizer itself is an
//! external collaborator behind [`SpeechRecognizer`].

use crate::config::SpeechConfig;
use crate::error::{HcChatError, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Shown instead of listening when no recognizer is configured
pub const VOICE_UNSUPPORTED_MESSAGE: &str = "Voice input not supported on this system.";

/// Shown when the recognizer fails while listening
pub const VOICE_FAILED_MESSAGE: &str = "Sorry, I couldn't catch that.";

/// Source of recognized utterances
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen for one utterance
    ///
    /// Returns `Ok(None)` when listening ended without a result.
    async fn recognize(&self) -> Result<Option<String>>;
}

/// Recognizer backed by an external command
///
/// The command records one utterance and prints the transcript on stdout.
/// The language tag is exported as `HCCHAT_SPEECH_LANG`.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    language: String,
}

impl CommandRecognizer {
    /// Build a recognizer from configuration
    ///
    /// Returns `None` when no command is configured.
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        let command = config.command.as_ref()?;
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn recognize(&self) -> Result<Option<String>> {
        tracing::debug!("Starting speech recognizer: {}", self.program);

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .env("HCCHAT_SPEECH_LANG", &self.language)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        // Own process group: Ctrl-C stops listening, not the recorder.
        #[cfg(unix)]
        command.process_group(0);

        let output = command
            .output()
            .await
            .map_err(|e| {
                HcChatError::Recognition(format!("failed to start {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HcChatError::Recognition(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ))
            .into());
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            Ok(None)
        } else {
            Ok(Some(transcript))
        }
    }
}

/// Build the configured recognizer, if any
pub fn create_recognizer(config: &SpeechConfig) -> Option<Arc<dyn SpeechRecognizer>> {
    CommandRecognizer::from_config(config).map(|r| Arc::new(r) as Arc<dyn SpeechRecognizer>)
}

/// Microphone control state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicState {
    #[default]
    Idle,
    Listening,
}

impl fmt::Display for MicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Listening => write!(f, "listening"),
        }
    }
}

/// What a toggle of the microphone control asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicAction {
    /// Begin listening
    Start,
    /// Stop listening without a result
    Stop,
}

/// Single-control toggle between idle and listening
#[derive(Debug, Default)]
pub struct MicControl {
    state: MicState,
}

impl MicControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MicState {
        self.state
    }

    /// Flip the control
    ///
    /// # Arguments
    ///
    /// * `supported` - Whether a recognizer is available
    ///
    /// # Errors
    ///
    /// Returns `HcChatError::SpeechUnsupported` without a recognizer; the
    /// state never leaves idle in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use hcchat::speech::{MicAction, MicControl, MicState};
    ///
    /// let mut mic = MicControl::new();
    /// assert!(mic.toggle(false).is_err());
    /// assert_eq!(mic.toggle(true).unwrap(), MicAction::Start);
    /// assert_eq!(mic.state(), MicState::Listening);
    /// ```
    pub fn toggle(&mut self, supported: bool) -> Result<MicAction> {
        if !supported {
            return Err(HcChatError::SpeechUnsupported.into());
        }
        let action = match self.state {
            MicState::Idle => {
                self.state = MicState::Listening;
                MicAction::Start
            }
            MicState::Listening => {
                self.state = MicState::Idle;
                MicAction::Stop
            }
        };
        Ok(action)
    }

    /// Return to idle after a result, an error, or an explicit stop
    pub fn finish(&mut self) {
        self.state = MicState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cycles_idle_listening_idle() {
        let mut mic = MicControl::new();
        assert_eq!(mic.state(), MicState::Idle);
        assert_eq!(mic.toggle(true).unwrap(), MicAction::Start);
        assert_eq!(mic.state(), MicState::Listening);
        assert_eq!(mic.toggle(true).unwrap(), MicAction::Stop);
        assert_eq!(mic.state(), MicState::Idle);
    }

    #[test]
    fn test_toggle_unsupported_stays_idle() {
        let mut mic = MicControl::new();
        let err = mic.toggle(false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HcChatError>(),
            Some(HcChatError::SpeechUnsupported)
        ));
        assert_eq!(mic.state(), MicState::Idle);
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let mut mic = MicControl::new();
        mic.toggle(true).unwrap();
        mic.finish();
        assert_eq!(mic.state(), MicState::Idle);
    }

    #[test]
    fn test_from_config_without_command_is_none() {
        assert!(CommandRecognizer::from_config(&SpeechConfig::default()).is_none());
        assert!(create_recognizer(&SpeechConfig::default()).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_returns_trimmed_stdout() {
        let config = SpeechConfig {
            command: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo '  book an appointment  '".to_string(),
            ]),
            ..SpeechConfig::default()
        };
        let recognizer = CommandRecognizer::from_config(&config).unwrap();
        let transcript = recognizer.recognize().await.unwrap();
        assert_eq!(transcript, Some("book an appointment".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_passes_language() {
        let config = SpeechConfig {
            command: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf %s \"$HCCHAT_SPEECH_LANG\"".to_string(),
            ]),
            language: "de-DE".to_string(),
        };
        let recognizer = CommandRecognizer::from_config(&config).unwrap();
        assert_eq!(recognizer.recognize().await.unwrap(), Some("de-DE".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_empty_output_is_no_result() {
        let config = SpeechConfig {
            command: Some(vec!["true".to_string()]),
            ..SpeechConfig::default()
        };
        let recognizer = CommandRecognizer::from_config(&config).unwrap();
        assert_eq!(recognizer.recognize().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_failure_is_recognition_error() {
        let config = SpeechConfig {
            command: Some(vec!["false".to_string()]),
            ..SpeechConfig::default()
        };
        let recognizer = CommandRecognizer::from_config(&config).unwrap();
        let err = recognizer.recognize().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HcChatError>(),
            Some(HcChatError::Recognition(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_command_recognizer_leads_its_own_process_group() {
        // Field 5 of /proc/<pid>/stat is the process group id.
        let config = SpeechConfig {
            command: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "[ \"$(cut -d' ' -f5 /proc/$$/stat)\" = \"$$\" ] && echo leader || echo member"
                    .to_string(),
            ]),
            ..SpeechConfig::default()
        };
        let recognizer = CommandRecognizer::from_config(&config).unwrap();
        assert_eq!(recognizer.recognize().await.unwrap(), Some("leader".to_string()));
    }

    #[tokio::test]
    async fn test_command_recognizer_missing_program_is_recognition_error() {
        let config = SpeechConfig {
            command: Some(vec!["hcchat-no-such-recognizer".to_string()]),
            ..SpeechConfig::default()
        };
        let recognizer = CommandRecognizer::from_config(&config).unwrap();
        assert!(recognizer.recognize().await.is_err());
    }
}
