/// Converts 16-bit little-endian PCM bytes to f32 samples in [-1.0, 1.0].
///
/// A trailing odd byte (half a sample) is ignored.
pub fn pcm16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_decodes_to_zero_samples() {
        let samples = pcm16le_to_f32(&[0u8; 8]);
        assert_eq!(samples, vec![0.0; 4]);
    }

    #[test]
    fn full_scale_values_normalize() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&i16::MIN.to_le_bytes());
        bytes.extend_from_slice(&i16::MAX.to_le_bytes());
        let samples = pcm16le_to_f32(&bytes);
        assert_eq!(samples[0], -1.0);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn trailing_odd_byte_is_dropped() {
        let samples = pcm16le_to_f32(&[0, 0, 7]);
        assert_eq!(samples.len(), 1);
    }
}
