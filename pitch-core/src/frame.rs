//! Slicing of arbitrarily sized sample blocks into fixed-length frames.

/// Accumulates incoming samples and hands out complete frames.
///
/// Audio hosts deliver blocks whose size has nothing to do with the analysis
/// window. Leftover samples are kept for the next call.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    frame_length: usize,
    buffer: Vec<f32>,
}

impl FrameAssembler {
    pub fn new(frame_length: usize) -> Self {
        Self {
            frame_length,
            buffer: Vec::with_capacity(frame_length * 2),
        }
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Samples waiting for the next frame to fill up.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Appends `samples` and calls `emit` once per completed frame.
    pub fn push<F: FnMut(Vec<f32>)>(&mut self, samples: &[f32], mut emit: F) {
        if self.frame_length == 0 {
            return;
        }
        self.buffer.extend_from_slice(samples);

        // While we have enough data for a full frame, hand it out.
        while self.buffer.len() >= self.frame_length {
            let frame = self.buffer[..self.frame_length].to_vec();
            self.buffer.drain(..self.frame_length);
            emit(frame);
        }
    }

    /// Like [`push`](Self::push) but averages interleaved channels down to mono first.
    pub fn push_interleaved<F: FnMut(Vec<f32>)>(&mut self, data: &[f32], channels: usize, emit: F) {
        if channels <= 1 {
            self.push(data, emit);
            return;
        }
        let mono: Vec<f32> = data
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        self.push(&mono, emit);
    }

    /// Discards buffered samples.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Splits a whole signal into consecutive frames, dropping the incomplete tail.
pub fn frames(signal: &[f32], frame_length: usize) -> impl Iterator<Item = Vec<f32>> + '_ {
    signal
        .chunks_exact(frame_length.max(1))
        .map(|chunk| chunk.to_vec())
}
