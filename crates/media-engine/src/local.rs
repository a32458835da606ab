//! A [`PlayerClient`] that plays local files on a dedicated thread

use crate::client::{MediaItem, PlayerClient, PlayerEvent, PlayerSnapshot};
use crate::decoder::AudioDecoder;
use crate::error::{EngineError, EngineResult};
use crate::output::AudioOutput;
use crate::speed::SpeedProcessor;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration as StdDuration;
use tokio::sync::broadcast;

const IDLE_WAIT: StdDuration = StdDuration::from_millis(50);
const AUDIO_QUEUE: usize = 8;
const EVENT_CAPACITY: usize = 64;

/// Commands sent to the playback thread
#[derive(Debug, Clone)]
enum Command {
    SetItems(Vec<MediaItem>),
    SeekToItem(usize, u64),
    Play,
    Pause,
    Stop,
    Clear,
    Seek(u64),
    Next,
    Previous,
    SetSpeed(f32),
    Shutdown,
}

/// Plays a queue of files through the default output device.
///
/// Decoding, speed processing and output all live on one thread driven by a
/// command channel. The snapshot is published after every command and every
/// decoded packet.
pub struct LocalPlayer {
    commands: Sender<Command>,
    shared: Arc<Mutex<PlayerSnapshot>>,
    events: broadcast::Sender<PlayerEvent>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LocalPlayer {
    pub fn new() -> EngineResult<Self> {
        let (commands, command_rx) = unbounded();
        let shared = Arc::new(Mutex::new(PlayerSnapshot::default()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let worker = Worker::new(Arc::clone(&shared), events.clone());
        let handle = thread::Builder::new()
            .name("audii-playback".to_string())
            .spawn(move || worker.run(command_rx))?;

        Ok(Self {
            commands,
            shared,
            events,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stops the playback thread and waits for it
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("Playback thread panicked");
            }
        }
    }

    fn send(&self, command: Command) -> EngineResult<()> {
        self.commands
            .send(command)
            .map_err(|e| EngineError::InvalidState(format!("Playback thread is gone: {}", e)))
    }
}

impl Drop for LocalPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl PlayerClient for LocalPlayer {
    fn set_items(&self, items: Vec<MediaItem>) -> EngineResult<()> {
        self.send(Command::SetItems(items))
    }

    fn seek_to_item(&self, index: usize, offset_ms: u64) -> EngineResult<()> {
        self.send(Command::SeekToItem(index, offset_ms))
    }

    fn play(&self) -> EngineResult<()> {
        self.send(Command::Play)
    }

    fn pause(&self) -> EngineResult<()> {
        self.send(Command::Pause)
    }

    fn stop(&self) -> EngineResult<()> {
        self.send(Command::Stop)
    }

    fn clear(&self) -> EngineResult<()> {
        self.send(Command::Clear)
    }

    fn seek(&self, offset_ms: u64) -> EngineResult<()> {
        self.send(Command::Seek(offset_ms))
    }

    fn seek_to_next_item(&self) -> EngineResult<()> {
        self.send(Command::Next)
    }

    fn seek_to_previous_item(&self) -> EngineResult<()> {
        self.send(Command::Previous)
    }

    fn set_speed(&self, speed: f32) -> EngineResult<()> {
        if !audii_core::PlaybackSpeed::is_supported(speed) {
            return Err(EngineError::InvalidSpeed(speed));
        }
        self.send(Command::SetSpeed(speed))
    }

    fn snapshot(&self) -> PlayerSnapshot {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }
}

/// Open output stream plus the queue feeding it
struct Sink {
    output: AudioOutput,
    tx: Sender<Vec<f32>>,
    rx: Receiver<Vec<f32>>,
}

impl Sink {
    fn open(rate: u32, channels: u16) -> EngineResult<Self> {
        let mut output = AudioOutput::new(rate, channels)?;
        let (tx, rx) = bounded(AUDIO_QUEUE);
        output.play(rx.clone())?;
        Ok(Self { output, tx, rx })
    }

    fn matches(&self, rate: u32, channels: u16) -> bool {
        self.output.sample_rate() == rate && self.output.channels() == channels
    }

    /// Drops queued audio so a seek is heard immediately
    fn flush(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}

struct Worker {
    items: Vec<MediaItem>,
    index: Option<usize>,
    decoder: Option<AudioDecoder>,
    sink: Option<Sink>,
    speed: SpeedProcessor,
    playing: bool,
    position_ms: f64,
    duration_ms: u64,
    shared: Arc<Mutex<PlayerSnapshot>>,
    events: broadcast::Sender<PlayerEvent>,
}

impl Worker {
    fn new(shared: Arc<Mutex<PlayerSnapshot>>, events: broadcast::Sender<PlayerEvent>) -> Self {
        Self {
            items: Vec::new(),
            index: None,
            decoder: None,
            sink: None,
            speed: SpeedProcessor::new(2),
            playing: false,
            position_ms: 0.0,
            duration_ms: 0,
            shared,
            events,
        }
    }

    fn run(mut self, commands: Receiver<Command>) {
        loop {
            let command = if self.playing {
                match commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match commands.recv_timeout(IDLE_WAIT) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            };

            match command {
                Some(Command::Shutdown) => break,
                Some(command) => self.handle(command),
                None if self.playing => self.pump(),
                None => continue,
            }

            self.publish();
        }

        self.sink = None;
        log::debug!("Playback thread finished");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetItems(items) => {
                self.items = items;
                self.set_playing(false);
                if self.items.is_empty() {
                    self.unload();
                } else {
                    self.load(0);
                }
            }
            Command::SeekToItem(index, offset_ms) => {
                if index < self.items.len() {
                    self.load(index);
                    self.seek(offset_ms);
                } else {
                    log::warn!("Ignoring seek to missing item {}", index);
                }
            }
            Command::Play => self.play(),
            Command::Pause => self.set_playing(false),
            Command::Stop => {
                self.set_playing(false);
                if let Some(index) = self.index {
                    self.load(index);
                }
            }
            Command::Clear => {
                self.set_playing(false);
                self.items.clear();
                self.unload();
            }
            Command::Seek(offset_ms) => self.seek(offset_ms),
            Command::Next => {
                if let Some(index) = self.index.filter(|i| i + 1 < self.items.len()) {
                    self.load(index + 1);
                }
            }
            Command::Previous => {
                if let Some(index) = self.index.filter(|&i| i > 0) {
                    self.load(index - 1);
                }
            }
            Command::SetSpeed(speed) => {
                if let Err(e) = self.speed.set_speed(speed) {
                    self.emit(PlayerEvent::Error(e.to_string()));
                }
            }
            Command::Shutdown => {}
        }
    }

    fn play(&mut self) {
        if self.decoder.is_none() {
            match self.index.or(if self.items.is_empty() { None } else { Some(0) }) {
                Some(index) => self.load(index),
                None => return,
            }
        }

        match self.ensure_sink() {
            Ok(()) => self.set_playing(true),
            Err(e) => {
                log::error!("Cannot start playback: {}", e);
                self.emit(PlayerEvent::Error(e.to_string()));
                self.set_playing(false);
            }
        }
    }

    fn load(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else {
            return;
        };

        self.index = Some(index);
        self.position_ms = 0.0;
        self.speed.reset();
        if let Some(sink) = &self.sink {
            sink.flush();
        }

        match AudioDecoder::new(&item.path) {
            Ok(decoder) => {
                self.duration_ms = match decoder.duration_ms() {
                    0 => item.duration_ms,
                    known => known,
                };
                self.decoder = Some(decoder);
            }
            Err(e) => {
                log::error!("Cannot open {}: {}", item.path.display(), e);
                self.duration_ms = item.duration_ms;
                self.decoder = None;
                self.emit(PlayerEvent::Error(e.to_string()));
            }
        }

        self.emit(PlayerEvent::ItemChanged(index));

        if self.playing {
            if let Err(e) = self.ensure_sink() {
                self.emit(PlayerEvent::Error(e.to_string()));
                self.set_playing(false);
            }
        }
    }

    fn unload(&mut self) {
        self.index = None;
        self.decoder = None;
        self.position_ms = 0.0;
        self.duration_ms = 0;
        if let Some(sink) = &self.sink {
            sink.flush();
        }
    }

    fn seek(&mut self, offset_ms: u64) {
        let Some(decoder) = self.decoder.as_mut() else {
            return;
        };

        let target = if self.duration_ms > 0 {
            offset_ms.min(self.duration_ms)
        } else {
            offset_ms
        };

        match decoder.seek(target) {
            Ok(()) => {
                self.position_ms = target as f64;
                self.speed.reset();
                if let Some(sink) = &self.sink {
                    sink.flush();
                }
            }
            Err(e) => {
                log::warn!("{}", e);
                self.emit(PlayerEvent::Error(e.to_string()));
            }
        }
    }

    /// Decodes one packet and queues it for output
    fn pump(&mut self) {
        let Some(decoder) = self.decoder.as_mut() else {
            self.set_playing(false);
            return;
        };

        match decoder.decode_next() {
            Ok(Some(decoded)) => {
                self.position_ms += decoded.duration_ms();
                let samples = self.speed.process(&decoded.samples);
                if samples.is_empty() {
                    return;
                }
                let sent = self.sink.as_ref().map(|sink| sink.tx.send(samples).is_ok());
                if sent != Some(true) {
                    log::error!("Audio output went away");
                    self.set_playing(false);
                }
            }
            Ok(None) => self.finish_item(),
            Err(e) => {
                log::error!("{}", e);
                self.emit(PlayerEvent::Error(e.to_string()));
                self.finish_item();
            }
        }
    }

    fn finish_item(&mut self) {
        match self.index {
            Some(index) if index + 1 < self.items.len() => self.load(index + 1),
            _ => {
                self.position_ms = self.duration_ms as f64;
                self.set_playing(false);
                self.emit(PlayerEvent::Ended);
            }
        }
    }

    fn ensure_sink(&mut self) -> EngineResult<()> {
        let Some(decoder) = self.decoder.as_ref() else {
            return Err(EngineError::NoItems);
        };

        let rate = decoder.spec().rate;
        let channels = decoder.spec().channels.count() as u16;

        match &self.sink {
            Some(sink) if sink.matches(rate, channels) => {
                sink.output.resume();
            }
            _ => {
                self.sink = None;
                self.sink = Some(Sink::open(rate, channels)?);
                self.speed = {
                    let mut speed = SpeedProcessor::new(channels);
                    speed.set_speed(self.speed.speed())?;
                    speed
                };
            }
        }
        Ok(())
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing == playing {
            return;
        }
        self.playing = playing;
        if let Some(sink) = &self.sink {
            if playing {
                sink.output.resume();
            } else {
                sink.output.pause();
            }
        }
        self.emit(PlayerEvent::PlayingChanged(playing));
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        let mut snapshot = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        snapshot.item_index = self.index;
        snapshot.item_count = self.items.len();
        snapshot.position_ms = self.position_ms as u64;
        snapshot.duration_ms = self.duration_ms;
        snapshot.is_playing = self.playing;
        snapshot.speed = self.speed.speed();
    }
}
