/// Text-to-speech surface. Calls return immediately; playback completion is
/// the host's concern.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str, rate: f32);
}

/// Speech output for hosts without audio. Logs what would be spoken.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechOutput for SilentSpeech {
    fn speak(&self, text: &str, rate: f32) {
        tracing::debug!(text, rate, "speak");
    }
}
