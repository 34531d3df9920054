//! Sequential playback of audio entries through system players.
//!
//! Each entry is staged as a temporary file and handed to a player picked
//! from the injected [`Platform`]. The temporary file is removed before
//! [`Orchestrator::try_play`] returns, whatever the outcome.

use std::ffi::OsString;
use std::io::Write;
use std::ops::ControlFlow;

use log::{debug, info, warn};
use tempfile::{Builder, TempPath};

use crate::archive::Entry;
use crate::error::PlaybackError;
use crate::platform::Platform;
use crate::process::ProcessRunner;

/// Linux candidates, in the order they are tried.
pub const DEFAULT_LINUX_PLAYERS: [&str; 4] = ["mpg123", "mpv", "vlc", "mplayer"];

/// The only player tried on macOS.
pub const MAC_PLAYER: &str = "afplay";

/// Name reported for the Windows default file-open action.
pub const WINDOWS_DEFAULT_ACTION: &str = "start";

/// How many audio entries are played when no limit is given.
pub const DEFAULT_PLAY_LIMIT: usize = 10;

/// Playback settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Candidate players on Linux-like hosts, in priority order.
    pub linux_players: Vec<String>,
    /// Maximum number of audio entries to play; `None` plays all of them.
    pub limit: Option<usize>,
    pub temp_prefix: String,
    /// Suffix of the staged file. Players sniff the format from content.
    pub temp_suffix: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            linux_players: DEFAULT_LINUX_PLAYERS.iter().map(|p| p.to_string()).collect(),
            limit: Some(DEFAULT_PLAY_LIMIT),
            temp_prefix: "mdd-audio-".to_string(),
            temp_suffix: ".mp3".to_string(),
        }
    }
}

/// Result of playing one entry.
#[derive(Debug)]
pub struct PlaybackOutcome {
    pub entry_key: String,
    pub succeeded: bool,
    pub player_used: Option<String>,
    pub error: Option<PlaybackError>,
}

/// Progress notifications from [`Orchestrator::play_all`].
#[derive(Debug)]
pub enum PlaybackEvent<'a> {
    Started { index: usize, total: usize, entry: &'a Entry },
    Finished { index: usize, total: usize, outcome: &'a PlaybackOutcome },
}

/// Totals for one playback run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

enum Strategy<'a> {
    /// One fixed player, no fallback.
    Single(&'a str),
    /// Try in order until one succeeds.
    Fallback(&'a [String]),
    /// Hand the file to the OS default open action.
    OsDefault,
}

/// Drives player selection for audio entries.
#[derive(Debug)]
pub struct Orchestrator<R> {
    platform: Platform,
    runner: R,
    config: PlaybackConfig,
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn new(platform: Platform, runner: R, config: PlaybackConfig) -> Self {
        Self {
            platform,
            runner,
            config,
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Plays one entry and returns the name of the player that succeeded.
    pub fn try_play(&self, entry: &Entry) -> Result<String, PlaybackError> {
        let strategy = self.strategy()?;
        let staged = self.stage(entry)?;
        debug!("Staged {} bytes at {}", entry.content.len(), staged.display());

        let file_arg = OsString::from(staged.as_os_str());
        let result = match strategy {
            Strategy::Single(player) => self.invoke(player, vec![file_arg]),
            Strategy::Fallback(players) => self.first_success(players, &file_arg),
            Strategy::OsDefault => self.open_with_default(file_arg),
        };

        if let Err(e) = staged.close() {
            warn!("Failed to remove temporary audio file: {}", e);
        }
        result
    }

    /// Plays one entry, folding the result into a [`PlaybackOutcome`].
    pub fn play(&self, entry: &Entry) -> PlaybackOutcome {
        let entry_key = entry.decoded_key();
        info!("Playing {}", entry_key);
        match self.try_play(entry) {
            Ok(player) => PlaybackOutcome {
                entry_key,
                succeeded: true,
                player_used: Some(player),
                error: None,
            },
            Err(e) => {
                warn!("Playback of {} failed: {}", entry_key, e);
                PlaybackOutcome {
                    entry_key,
                    succeeded: false,
                    player_used: None,
                    error: Some(e),
                }
            }
        }
    }

    /// Plays `entries` one after another. Failures do not stop the run.
    pub fn play_all<F>(&self, entries: &[Entry], mut observer: F) -> PlaybackSummary
    where
        F: FnMut(PlaybackEvent<'_>),
    {
        let total = entries.len();
        let mut summary = PlaybackSummary::default();
        for (index, entry) in entries.iter().enumerate() {
            observer(PlaybackEvent::Started { index, total, entry });
            let outcome = self.play(entry);
            summary.attempted += 1;
            if outcome.succeeded {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            observer(PlaybackEvent::Finished {
                index,
                total,
                outcome: &outcome,
            });
        }
        summary
    }

    fn strategy(&self) -> Result<Strategy<'_>, PlaybackError> {
        match &self.platform {
            Platform::MacLike => Ok(Strategy::Single(MAC_PLAYER)),
            Platform::LinuxLike => Ok(Strategy::Fallback(&self.config.linux_players)),
            Platform::WindowsLike => Ok(Strategy::OsDefault),
            Platform::Other(name) => Err(PlaybackError::UnsupportedPlatform(name.clone())),
        }
    }

    fn stage(&self, entry: &Entry) -> Result<TempPath, PlaybackError> {
        let mut file = Builder::new()
            .prefix(&self.config.temp_prefix)
            .suffix(&self.config.temp_suffix)
            .tempfile()?;
        file.write_all(&entry.content)?;
        file.flush()?;
        // Close the handle so players that want exclusive access can open it.
        Ok(file.into_temp_path())
    }

    fn invoke(&self, player: &str, args: Vec<OsString>) -> Result<String, PlaybackError> {
        self.runner
            .run(player, &args)
            .map(|()| player.to_string())
            .map_err(|e| PlaybackError::PlayerInvocationFailed {
                player: player.to_string(),
                reason: e.to_string(),
            })
    }

    fn first_success(
        &self,
        players: &[String],
        file_arg: &OsString,
    ) -> Result<String, PlaybackError> {
        let flow = players.iter().try_fold(Vec::new(), |mut tried, player| {
            match self.invoke(player, vec![file_arg.clone()]) {
                Ok(used) => ControlFlow::Break(used),
                Err(e) => {
                    debug!("{}; trying next candidate", e);
                    tried.push(player.clone());
                    ControlFlow::Continue(tried)
                }
            }
        });
        match flow {
            ControlFlow::Break(used) => Ok(used),
            ControlFlow::Continue(tried) => Err(PlaybackError::NoPlayerAvailable { tried }),
        }
    }

    fn open_with_default(&self, file_arg: OsString) -> Result<String, PlaybackError> {
        let args = vec![
            OsString::from("/C"),
            OsString::from("start"),
            OsString::from(""),
            OsString::from("/WAIT"),
            file_arg,
        ];
        self.runner
            .run("cmd", &args)
            .map(|()| WINDOWS_DEFAULT_ACTION.to_string())
            .map_err(|e| PlaybackError::PlayerInvocationFailed {
                player: WINDOWS_DEFAULT_ACTION.to_string(),
                reason: e.to_string(),
            })
    }
}
