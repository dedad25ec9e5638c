//! Audio output and the two ways of driving it.

use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};
use tracing::error;

use yeep::{graph::RenderContext, EffectOptions, EngineConfig, Yeep, MAX_BLOCK_SIZE};

use super::ui::{UiApp, VIS_BUFFER_SIZE};

/// Extra time after the last source stops, for filter tails.
const RING_OUT: Duration = Duration::from_millis(150);

/// An open output device with a render context behind it.
pub struct Soundboard {
    yeep: Yeep,
    context: Arc<Mutex<RenderContext>>,
    sample_rate: f32,
    stream: cpal::Stream,
    /// Consumer end of the oscilloscope tap.
    tap: rtrb::Consumer<f32>,
}

impl Soundboard {
    /// Open the default output device.
    pub fn open() -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;

        let config = EngineConfig::default().with_sample_rate(sample_rate);
        let yeep = Yeep::new(config.clone())?;
        let context = Arc::new(Mutex::new(RenderContext::new(&config)?));

        // A few visualizer frames of slack
        let (producer, tap) = RingBuffer::<f32>::new(VIS_BUFFER_SIZE * 8);

        let stream = build_stream(&device, &stream_config.into(), channels, context.clone(), producer)?;
        stream.play()?;

        Ok(Self {
            yeep,
            context,
            sample_rate,
            stream,
            tap,
        })
    }

    /// Play `name` and block until it has rung out.
    pub fn play_once(self, name: &str) -> EyreResult<()> {
        self.play(name)?;
        loop {
            thread::sleep(Duration::from_millis(50));
            if self.prune()? {
                break;
            }
        }
        thread::sleep(RING_OUT);
        drop(self.stream);
        Ok(())
    }

    /// Hand the terminal to the interactive UI.
    pub fn run(mut self) -> EyreResult<()> {
        let names = self.yeep.effects().map(str::to_string).collect();
        let mut app = UiApp::new(names, self.sample_rate);
        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal, &mut self);
        ratatui::restore();
        result
    }

    pub fn play(&self, name: &str) -> EyreResult<()> {
        let mut context = self
            .context
            .lock()
            .map_err(|_| eyre!("render context poisoned"))?;
        self.yeep.play(&mut *context, name, EffectOptions::default())?;
        Ok(())
    }

    /// Drop finished chains. Returns true once nothing is left to play.
    pub fn prune(&self) -> EyreResult<bool> {
        let mut context = self
            .context
            .lock()
            .map_err(|_| eyre!("render context poisoned"))?;
        context.prune();
        Ok(context.is_idle())
    }

    /// Samples copied out of the audio callback since the last call.
    pub fn drain_tap(&mut self, into: &mut Vec<f32>) {
        while let Ok(sample) = self.tap.pop() {
            into.push(sample);
        }
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    context: Arc<Mutex<RenderContext>>,
    mut tap: Producer<f32>,
) -> EyreResult<cpal::Stream> {
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _| {
            // Never wait on the control thread; a missed lock is a silent block
            let Ok(mut context) = context.try_lock() else {
                data.fill(0.0);
                return;
            };

            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let block = &mut render_buf[..frames];
                context.render(block);

                // Copy to output (mono to all channels)
                let out_off = frames_written * channels;
                for (i, &s) in block.iter().enumerate() {
                    for ch in 0..channels {
                        data[out_off + i * channels + ch] = s;
                    }
                    // Visualizer falls behind rather than blocking audio
                    let _ = tap.push(s);
                }

                frames_written += frames;
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;
    Ok(stream)
}
