// Speech capabilities the chat surface can be wired to. Real engines live
// outside this crate; terminal stand-ins are provided for the CLI.

use fancy_regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Accent hint used when nothing else is configured.
pub const DEFAULT_ACCENT_HINT: &str =
    "zh|chinese|mandarin|xiaoyi|tian|liang|bing|yan|yunjian|yunzhe";

/// Produces transcripts, one per utterance.
pub trait SpeechInput {
    fn transcribe(&mut self) -> mpsc::Receiver<String>;
}

/// Turns reply text into audio. `speak` returns immediately.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
    /// Stop whatever is currently being spoken.
    fn cancel(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag, e.g. `en-US`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

fn pattern(source: &str) -> Option<Regex> {
    Regex::new(&format!("(?i){source}")).ok()
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref()
        .and_then(|r| r.is_match(text).ok())
        .unwrap_or(false)
}

/// Pick a voice for replies.
///
/// Preference: an English voice whose name matches `accent_hint` (a regex
/// alternation), then a male-sounding en-US/en-GB voice, then any en-US
/// voice, then whatever comes first.
pub fn select_voice<'a>(voices: &'a [Voice], accent_hint: &str) -> Option<&'a Voice> {
    let english = pattern("(en-|english)");
    let accent = pattern(&format!("({accent_hint})"));
    let us_or_gb = pattern("(en-GB|en-US)");
    let male = pattern("(male|man|google en|english)");
    let us = pattern("en-US");

    voices
        .iter()
        .find(|v| matches(&english, &v.lang) && matches(&accent, &v.name))
        .or_else(|| {
            voices
                .iter()
                .find(|v| matches(&us_or_gb, &v.lang) && matches(&male, &v.name))
        })
        .or_else(|| voices.iter().find(|v| matches(&us, &v.lang)))
        .or_else(|| voices.first())
}

/// Reads stdin line by line; each non-blank line is a transcript.
#[derive(Default)]
pub struct LineInput;

impl SpeechInput for LineInput {
    fn transcribe(&mut self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
        rx
    }
}

/// Speaker for environments without audio.
#[derive(Default)]
pub struct SilentOutput;

impl SpeechOutput for SilentOutput {
    fn speak(&self, text: &str) {
        debug!(chars = text.chars().count(), "speech output disabled");
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("Deutsch", "de-DE"),
            Voice::new("Zira", "en-US"),
            Voice::new("Google UK English Male", "en-GB"),
            Voice::new("Microsoft Yunjian", "en-US"),
        ]
    }

    #[test]
    fn accent_match_wins() {
        let v = voices();
        assert_eq!(
            select_voice(&v, DEFAULT_ACCENT_HINT).unwrap().name,
            "Microsoft Yunjian"
        );
    }

    #[test]
    fn male_english_next() {
        let v = voices();
        assert_eq!(
            select_voice(&v, "nomatch").unwrap().name,
            "Google UK English Male"
        );
    }

    #[test]
    fn any_us_voice_then_first() {
        let v = vec![Voice::new("Deutsch", "de-DE"), Voice::new("Zira", "en-US")];
        assert_eq!(select_voice(&v, "nomatch").unwrap().name, "Zira");
        let v = vec![Voice::new("Deutsch", "de-DE")];
        assert_eq!(select_voice(&v, "nomatch").unwrap().name, "Deutsch");
    }

    #[test]
    fn no_voices() {
        assert!(select_voice(&[], DEFAULT_ACCENT_HINT).is_none());
    }
}
