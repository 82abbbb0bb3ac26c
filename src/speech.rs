use anyhow::{Context, Result, bail};
use std::process::Command;

/// Turns text into audible speech, blocking until playback ends
pub trait SpeechEngine: Send + Sync + 'static {
    fn say(&self, text: &str) -> Result<()>;
}

/// Speech synthesis through the espeak-ng command line tool
#[derive(Debug, Clone)]
pub struct EspeakEngine {
    program: String,
    voice: String,
}

impl EspeakEngine {
    /// Lists installed voices and selects the one at `voice_index`
    pub fn new(program: &str, voice_index: usize) -> Result<Self> {
        let voices = list_voices(program)?;
        let Some(voice) = voices.get(voice_index) else {
            bail!(
                "voice index {} requested but only {} voices are installed for {}",
                voice_index,
                voices.len(),
                program
            );
        };
        log::info!("Narration voice: {} (index {})", voice, voice_index);
        Ok(Self {
            program: program.to_string(),
            voice: voice.clone(),
        })
    }
}

impl SpeechEngine for EspeakEngine {
    fn say(&self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(["-v", &self.voice, text])
            .status()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !status.success() {
            bail!("{} command failed with status: {}", self.program, status);
        }

        Ok(())
    }
}

/// Returns installed voice identifiers in the order the synthesizer lists them
pub fn list_voices(program: &str) -> Result<Vec<String>> {
    let output = Command::new(program)
        .arg("--voices")
        .output()
        .with_context(|| format!("Failed to execute {}. Is it installed?", program))?;

    if !output.status.success() {
        bail!("{} --voices failed with status: {}", program, output.status);
    }

    Ok(parse_voice_listing(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `--voices` output: a header row, then one voice per row with the
/// language code in column 2
fn parse_voice_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
 2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";

    #[test]
    fn test_parse_voice_listing() {
        let voices = parse_voice_listing(LISTING);
        assert_eq!(voices, vec!["af", "en-gb", "en-us"]);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_voice_listing("Pty Language Age/Gender VoiceName File\n").is_empty());
        assert!(parse_voice_listing("").is_empty());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        assert!(EspeakEngine::new("definitely-not-a-speech-synth", 1).is_err());
    }
}
