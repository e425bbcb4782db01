use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use rtrb::{Consumer, Producer, RingBuffer};

use super::click::AudioBuffer;
use super::mixer::VoiceMixer;
use super::output::AudioOutput;
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Frames of scratch space reserved up front for the mix
const SCRATCH_SAMPLES: usize = 8192;

/// Plays clicks on the system's default output device.
///
/// `play` only pushes the buffer onto a lock-free queue; the device callback
/// mixes it with whatever is still sounding. The stream runs for as long as
/// this value lives, emitting silence between clicks.
pub struct CpalOutput {
    /// Output stream; dropping it closes the device
    _stream: cpal::Stream,
    /// Clicks waiting for the audio thread
    play_producer: Producer<AudioBuffer>,
    /// Finished clicks handed back for deallocation
    recycle_consumer: Consumer<AudioBuffer>,
    /// Device sample rate in Hz
    sample_rate: u32,
}

impl CpalOutput {
    /// Open the default output device and start an idle stream.
    ///
    /// # Errors
    /// - `DeviceUnavailable` when the host has no default output device
    /// - `StreamOpenFailed` / `UnsupportedSampleFormat` when no stream can be built
    /// - `HardwareError` when the stream refuses to start
    pub fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceUnavailable)?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to get default output config: {:?}", e),
            })?;

        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();
        let sample_rate = stream_config.sample_rate.0;

        let capacity = config.queue_capacity.max(1);
        let (play_producer, play_consumer) = RingBuffer::new(capacity);
        let (recycle_producer, recycle_consumer) = RingBuffer::new(capacity + config.max_voices);
        let mixer = VoiceMixer::new(config.max_voices, sample_rate);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(
                &device,
                &stream_config,
                play_consumer,
                recycle_producer,
                mixer,
            ),
            cpal::SampleFormat::I16 => build_stream::<i16>(
                &device,
                &stream_config,
                play_consumer,
                recycle_producer,
                mixer,
            ),
            cpal::SampleFormat::U16 => build_stream::<u16>(
                &device,
                &stream_config,
                play_consumer,
                recycle_producer,
                mixer,
            ),
            other => {
                return Err(AudioError::UnsupportedSampleFormat {
                    format: format!("{:?}", other),
                })
            }
        }?;

        stream.play().map_err(|e| AudioError::HardwareError {
            details: format!("Output start failed: {}", e),
        })?;

        log::info!(
            "[CpalOutput] Opened {:?} at {} Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "unknown device".to_string()),
            sample_rate,
            stream_config.channels,
            sample_format
        );

        Ok(Self {
            _stream: stream,
            play_producer,
            recycle_consumer,
            sample_rate,
        })
    }

    fn free_finished(&mut self) {
        while let Ok(buffer) = self.recycle_consumer.pop() {
            drop(buffer);
        }
    }
}

impl AudioOutput for CpalOutput {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError> {
        self.free_finished();
        self.play_producer
            .push(buffer)
            .map_err(|_| AudioError::QueueFull)
    }

    fn preferred_sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut play_consumer: Consumer<AudioBuffer>,
    mut recycle_producer: Producer<AudioBuffer>,
    mut mixer: VoiceMixer,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = config.channels as usize;
    let mut scratch = vec![0.0_f32; SCRATCH_SAMPLES];

    let err_fn = |err| log::error!("[CpalOutput] Output stream error: {}", err);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                while let Ok(buffer) = play_consumer.pop() {
                    if let Some(evicted) = mixer.push(buffer) {
                        let _ = recycle_producer.push(evicted);
                    }
                }

                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let mix = &mut scratch[..data.len()];
                mixer.render(mix, channels);
                for (out, &sample) in data.iter_mut().zip(mix.iter()) {
                    *out = T::from_sample(sample);
                }

                mixer.drain_finished(|buffer| {
                    let _ = recycle_producer.push(buffer);
                });
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })
}
