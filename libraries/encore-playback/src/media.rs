//! Media output seam
//!
//! Tracks that carry an audio URL are decoded and played elsewhere. The
//! engine drives that collaborator through this trait and receives its
//! position and end-of-track reports back through `report_position` and
//! `report_ended`.

use crate::error::Result;

/// Platform media player for tracks with a real audio source
pub trait MediaOutput: Send {
    /// Load an audio URL, replacing whatever was loaded
    fn load(&mut self, url: &str) -> Result<()>;

    /// Drop the loaded audio (current track has no audio source)
    fn unload(&mut self);

    /// Start or pause output
    fn set_playing(&mut self, playing: bool) -> Result<()>;

    /// Jump to a position in seconds
    fn seek(&mut self, position_secs: f64) -> Result<()>;

    /// Output level in 0.0-1.0
    fn set_volume(&mut self, level: f32);
}

/// Command received by a `RecordingOutput`
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    Load(String),
    Unload,
    SetPlaying(bool),
    Seek(f64),
    SetVolume(f32),
}

/// Records every command for assertions
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    pub commands: std::sync::Arc<std::sync::Mutex<Vec<MediaCommand>>>,
    pub fail_loads: bool,
}

#[cfg(test)]
impl RecordingOutput {
    fn record(&self, command: MediaCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

#[cfg(test)]
impl MediaOutput for RecordingOutput {
    fn load(&mut self, url: &str) -> Result<()> {
        if self.fail_loads {
            return Err(crate::error::PlaybackError::media(format!(
                "cannot open {}",
                url
            )));
        }
        self.record(MediaCommand::Load(url.to_string()));
        Ok(())
    }

    fn unload(&mut self) {
        self.record(MediaCommand::Unload);
    }

    fn set_playing(&mut self, playing: bool) -> Result<()> {
        self.record(MediaCommand::SetPlaying(playing));
        Ok(())
    }

    fn seek(&mut self, position_secs: f64) -> Result<()> {
        self.record(MediaCommand::Seek(position_secs));
        Ok(())
    }

    fn set_volume(&mut self, level: f32) {
        self.record(MediaCommand::SetVolume(level));
    }
}
