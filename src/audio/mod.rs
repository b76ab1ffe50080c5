use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::AudioCommand;

mod engine;
mod frame;
mod voice;
mod voice_id;

pub use voice_id::{next_voice_id, VoiceId};

use engine::Engine;

const COMMAND_QUEUE: usize = 1024;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!("audio command queue full, dropped {:?}", cmd);
        }
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate() as f32;
    let channels = config.channels() as usize;
    log::info!("audio output: {} Hz, {} channel(s)", sample_rate, channels);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream =
                build_output_stream_f32(&device, &config.into(), rx, sample_rate, channels)?;
            output_stream.play().context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                _output_stream: output_stream,
            })
        }
        _ => anyhow::bail!("unsupported sample format (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    sample_rate: f32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            // no allocation, locking or logging past this point
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            engine.render_block(data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
