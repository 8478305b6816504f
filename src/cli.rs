//! Command line interface for warbler.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Narrated tracks with background music, timed lyrics and tags
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay a voice recording over a music bed and tag the result
    Mix(MixCommand),

    /// Time a plain-text lyric file against an audio file and write .lrc
    Lrc(LrcCommand),

    /// Write album/artist/cover/lyrics tags to an audio file
    Tag(TagCommand),

    /// Print the tags found on an audio file
    Verify {
        audio: PathBuf,
    },

    /// Play a file with a progress gauge
    Play {
        audio: PathBuf,
    },

    /// Synthesize speech to a wav file
    Speak(SpeakCommand),

    /// Transcribe a short wav recording
    Listen {
        wav: PathBuf,
    },

    /// Generate structured poems and turn each into a tagged track
    Compose(ComposeCommand),

    /// Narrate free-form replies with background music
    Recite(ReciteCommand),

    /// Spoken chat: listen, answer aloud, stop on 退出 or quit
    Converse(ConverseCommand),
}

#[derive(Args, Debug)]
pub struct MixCommand {
    /// Voice recording
    #[arg(long)]
    pub voice: PathBuf,

    /// Background music (defaults to <data>/bgm/default.mp3)
    #[arg(long)]
    pub music: Option<PathBuf>,

    /// Plain-text lyrics, one line per lyric
    #[arg(long)]
    pub lyrics: Option<PathBuf>,

    /// Output file (defaults to <voice stem>_with_bgm.mp3)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Background volume, 0.0 to 1.0
    #[arg(long)]
    pub volume: Option<f32>,

    #[arg(long)]
    pub album: Option<String>,

    #[arg(long)]
    pub artist: Option<String>,

    /// Cover image
    #[arg(long)]
    pub cover: Option<PathBuf>,

    /// Play the result when done
    #[arg(long)]
    pub play: bool,
}

#[derive(Args, Debug)]
pub struct LrcCommand {
    pub audio: PathBuf,

    pub lyrics: PathBuf,

    /// Where to write the LRC (defaults to <audio stem>.lrc)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 2.0)]
    pub intro_secs: f64,

    #[arg(long, default_value_t = 1.0)]
    pub crossfade_secs: f64,
}

#[derive(Args, Debug)]
pub struct TagCommand {
    pub audio: PathBuf,

    #[arg(long)]
    pub album: Option<String>,

    #[arg(long)]
    pub artist: Option<String>,

    #[arg(long)]
    pub cover: Option<PathBuf>,

    /// LRC or plain-text lyrics
    #[arg(long)]
    pub lyrics: Option<PathBuf>,

    /// Also write <audio stem>.lrc
    #[arg(long)]
    pub sidecar: bool,
}

#[derive(Args, Debug)]
pub struct SpeakCommand {
    pub text: String,

    /// Output wav (defaults to the speech cache)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Play the speech once synthesized
    #[arg(long)]
    pub play: bool,
}

#[derive(Args, Debug)]
pub struct ComposeCommand {
    /// What the poem should be about
    #[arg(default_value = "写一首描写程序员工作成长过程的歌")]
    pub topic: String,

    #[arg(short, long, default_value_t = 1)]
    pub turns: usize,

    #[arg(long)]
    pub play: bool,
}

#[derive(Args, Debug)]
pub struct ReciteCommand {
    pub prompt: String,

    /// User turn sent after the first reply (defaults to chat.follow_up)
    #[arg(long)]
    pub follow_up: Option<String>,

    #[arg(short, long, default_value_t = 1)]
    pub turns: usize,

    #[arg(long)]
    pub play: bool,
}

#[derive(Args, Debug)]
pub struct ConverseCommand {
    /// Recorded questions to use instead of the microphone
    pub wavs: Vec<PathBuf>,

    /// Listening turns before giving up
    #[arg(short, long, default_value_t = 20)]
    pub turns: usize,

    /// Length of each microphone clip
    #[arg(long, default_value_t = 5.0)]
    pub seconds: f32,
}
