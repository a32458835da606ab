use crate::error::{EngineError, EngineResult};
use std::path::Path;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;

/// Decodes one audio file into interleaved `f32` samples
pub struct AudioDecoder {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: SignalSpec,
    duration_ms: u64,
}

pub struct DecodedAudio {
    /// Interleaved samples
    pub samples: Vec<f32>,
    pub spec: SignalSpec,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        match self.spec.channels.count() {
            0 => 0,
            channels => self.samples.len() / channels,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        if self.spec.rate == 0 {
            return 0.0;
        }
        self.frames() as f64 * 1000.0 / f64::from(self.spec.rate)
    }
}

impl AudioDecoder {
    pub fn new(path: &Path) -> EngineResult<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| EngineError::DecodeError(format!("Failed to open file: {}", e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EngineError::DecodeError(format!("Failed to probe format: {}", e)))?;

        let reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| EngineError::DecodeError("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::DecodeError(format!("Failed to create decoder: {}", e)))?;

        let rate = codec_params.sample_rate.unwrap_or(44100);
        let spec = SignalSpec::new(rate, codec_params.channels.unwrap_or_default());
        let duration_ms = codec_params
            .n_frames
            .map(|frames| frames * 1000 / u64::from(rate.max(1)))
            .unwrap_or(0);

        Ok(Self {
            reader,
            decoder,
            track_id,
            spec,
            duration_ms,
        })
    }

    /// Next decoded packet, `None` at the end of the stream
    pub fn decode_next(&mut self) -> EngineResult<Option<DecodedAudio>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(EngineError::DecodeError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(EngineError::DecodeError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);

            return Ok(Some(DecodedAudio {
                samples: buffer.samples().to_vec(),
                spec,
            }));
        }
    }

    pub fn spec(&self) -> &SignalSpec {
        &self.spec
    }

    /// Stream length from the container, 0 when it does not say
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn seek(&mut self, offset_ms: u64) -> EngineResult<()> {
        let time = Time::new(offset_ms / 1000, (offset_ms % 1000) as f64 / 1000.0);

        self.reader
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| EngineError::SeekError(format!("Failed to seek: {}", e)))?;

        self.decoder.reset();

        Ok(())
    }
}
