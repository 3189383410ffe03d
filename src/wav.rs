//! Multichannel WAV I/O for the demo binary and offline rendering.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{BeamError, Result};

/// Read a WAV file into one `Vec<f32>` per channel. Integer samples are
/// scaled to [-1, 1].
pub fn read_wav_channels(path: &std::path::Path) -> Result<(Vec<Vec<f32>>, u32)> {
    let mut reader =
        WavReader::open(path).map_err(|e| BeamError::Wav(format!("{}: {}", path.display(), e)))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| BeamError::Wav(format!("{}", e)))?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| BeamError::Wav(format!("{}", e)))?
        }
    };

    let frames = interleaved.len() / num_channels;
    let mut channels = vec![Vec::with_capacity(frames); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok((channels, spec.sample_rate))
}

/// Write one `Vec<f32>` per channel as a 32-bit float WAV file. All
/// channels must have equal length.
pub fn save_wav_channels(
    path: &std::path::Path,
    channels: &[Vec<f32>],
    sample_rate: u32,
) -> Result<()> {
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| BeamError::Wav(format!("{}: {}", path.display(), e)))?;

    let frames = channels.first().map_or(0, |c| c.len());
    for frame in 0..frames {
        for channel in channels {
            writer
                .write_sample(channel[frame])
                .map_err(|e| BeamError::Wav(format!("{}", e)))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| BeamError::Wav(format!("{}", e)))?;
    Ok(())
}
