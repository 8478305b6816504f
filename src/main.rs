mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{
    Cli, Commands, ComposeCommand, ConverseCommand, LrcCommand, MixCommand, ReciteCommand, SpeakCommand, TagCommand,
};
use warbler::app::conversation::{MicrophoneListener, RecordingListener, VoiceSpeaker};
use warbler::app::{add_background_music, BgmRequest, Composer, Conversation};
use warbler::audio::{
    load_audio, read_duration, verify_metadata, write_metadata, MixSettings, PlaybackReporter, TrackTags,
};
use warbler::config::Config;
use warbler::lyrics::{lrc_path_for, LyricTimer};
use warbler::poem::poem_prompt;
use warbler::services::{ChatClient, SpeechClient};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Mix(cmd) => mix(&config, cmd),
        Commands::Lrc(cmd) => lrc(cmd),
        Commands::Tag(cmd) => tag(cmd),
        Commands::Verify { audio } => {
            let report = verify_metadata(&audio).with_context(|| format!("reading tags of {}", audio.display()))?;
            if !report.is_complete() {
                warn!("some tag fields are missing");
            }
            Ok(())
        }
        Commands::Play { audio } => {
            PlaybackReporter::new()
                .play(&audio)
                .with_context(|| format!("playing {}", audio.display()))?;
            Ok(())
        }
        Commands::Speak(cmd) => speak(&config, cmd),
        Commands::Listen { wav } => {
            let speech = SpeechClient::new(&config.speech, config.paths.speech_cache_dir())?;
            match speech.recognize_file(&wav)? {
                Some(text) => println!("{text}"),
                None => info!("no speech detected"),
            }
            Ok(())
        }
        Commands::Compose(cmd) => compose(config, cmd),
        Commands::Recite(cmd) => recite(config, cmd),
        Commands::Converse(cmd) => converse(&config, cmd),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warbler=info",
        1 => "warbler=debug",
        _ => "warbler=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

fn mix(config: &Config, cmd: MixCommand) -> Result<()> {
    let request = BgmRequest {
        lyrics: cmd.lyrics,
        output: cmd.output,
        settings: MixSettings {
            bg_volume: cmd.volume.unwrap_or(config.mix.bg_volume),
            intro_ms: config.mix.intro_ms,
            crossfade_ms: config.mix.crossfade_ms,
        },
        album: cmd.album.or_else(|| config.mix.album.clone()),
        artist: cmd.artist.or_else(|| Some(config.mix.artist.clone())),
        cover: cmd.cover,
        ..BgmRequest::new(cmd.voice, cmd.music.unwrap_or_else(|| config.paths.default_bgm()))
    };
    let output = add_background_music(&request).context("adding background music")?;
    println!("{}", output.path.display());

    if cmd.play {
        PlaybackReporter::new().play(&output.path)?;
    }
    Ok(())
}

fn lrc(cmd: LrcCommand) -> Result<()> {
    let track_secs = match read_duration(&cmd.audio) {
        Ok(duration) if !duration.is_zero() => duration.as_secs_f64(),
        _ => load_audio(&cmd.audio)
            .with_context(|| format!("decoding {}", cmd.audio.display()))?
            .duration_secs(),
    };
    let timed = LyricTimer::new(cmd.intro_secs, cmd.crossfade_secs).schedule_file(track_secs, &cmd.lyrics)?;
    let output = cmd.output.unwrap_or_else(|| lrc_path_for(&cmd.audio));
    timed.write_lrc(&output)?;
    println!("{}", output.display());
    Ok(())
}

fn tag(cmd: TagCommand) -> Result<()> {
    let tags = TrackTags {
        album: cmd.album,
        artist: cmd.artist,
        cover: cmd.cover,
        lyrics: cmd.lyrics,
        write_sidecar: cmd.sidecar,
    };
    write_metadata(&cmd.audio, &tags).with_context(|| format!("tagging {}", cmd.audio.display()))?;
    verify_metadata(&cmd.audio)?;
    Ok(())
}

fn speak(config: &Config, cmd: SpeakCommand) -> Result<()> {
    let speech = SpeechClient::new(&config.speech, config.paths.speech_cache_dir())?;
    let path = speech.get_or_create_audio(&cmd.text, cmd.output.as_deref())?;
    println!("{}", path.display());
    if cmd.play {
        PlaybackReporter::new().play(&path)?;
    }
    Ok(())
}

fn compose(config: Config, cmd: ComposeCommand) -> Result<()> {
    let chat = ChatClient::new(&config.chat).context("chat client")?;
    let composer = Composer::new(config)?;
    let tracks = composer.compose(chat, &poem_prompt(&cmd.topic), cmd.turns, cmd.play)?;
    report_tracks(&tracks);
    Ok(())
}

fn recite(config: Config, cmd: ReciteCommand) -> Result<()> {
    let chat = ChatClient::new(&config.chat).context("chat client")?;
    let follow_up = cmd.follow_up.unwrap_or_else(|| config.chat.follow_up.clone());
    let composer = Composer::new(config)?;
    let tracks = composer.recite(chat, &cmd.prompt, &follow_up, cmd.turns, cmd.play)?;
    report_tracks(&tracks);
    Ok(())
}

fn converse(config: &Config, cmd: ConverseCommand) -> Result<()> {
    let chat = ChatClient::new(&config.chat).context("chat client")?;
    let speech = SpeechClient::new(&config.speech, config.paths.speech_cache_dir())?;
    let mut speaker = VoiceSpeaker::new(&speech);
    let mut conversation = Conversation::new(chat);

    let ending = if cmd.wavs.is_empty() {
        let scratch = config.paths.speech_cache_dir().join("question.wav");
        let clip = Duration::from_secs_f32(cmd.seconds.max(0.5));
        let mut listener = MicrophoneListener::new(&speech, clip, scratch).context("opening microphone")?;
        conversation.run(&mut listener, &mut speaker, cmd.turns)
    } else {
        let turns = cmd.turns.min(cmd.wavs.len());
        let mut listener = RecordingListener::new(&speech, cmd.wavs);
        conversation.run(&mut listener, &mut speaker, turns)
    };
    info!(?ending, answered = conversation.answered(), "conversation over");
    Ok(())
}

fn report_tracks(tracks: &[PathBuf]) {
    for track in tracks {
        println!("{}", track.display());
    }
    if tracks.is_empty() {
        warn!("no tracks were produced");
    }
}
