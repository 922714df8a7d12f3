//! WAV encoding of synthesized audio.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::tts::Waveform;

fn to_pcm16(sample: f32) -> i16 {
    (sample * 32767.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Mono 16-bit PCM WAV bytes for `waveform`.
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in &waveform.samples {
            writer.write_sample(to_pcm16(*sample))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn encodes_mono_pcm16() {
        let waveform = Waveform {
            sample_rate: 22_050,
            samples: vec![0.0, 0.5, -0.5, 1.0, -1.0],
        };
        let bytes = encode_wav(&waveform).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");

        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16384, -16384, 32767, -32767]);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        assert_eq!(to_pcm16(2.0), i16::MAX);
        assert_eq!(to_pcm16(-2.0), i16::MIN);
    }
}
