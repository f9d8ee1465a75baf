// THEORY:
// The `DepthFrame` is the most fundamental unit of the tracker. It is a "dumb" data
// container for one captured depth image: a row-major grid of samples with one or
// more interleaved channels. A depth camera that delivers a colourised depth map
// (as browsers and many SDKs do) ends up as a 4-channel frame; a raw sensor dump is
// a 1-channel frame. The masker decides which channel carries depth.
//
// The only rule enforced here is shape: the buffer must hold exactly
// `width * height * channels` bytes. Once built, a frame is never mutated.

use crate::error::FrameError;
use image::{GrayImage, RgbaImage};

/// One row-major frame of depth samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthFrame {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl DepthFrame {
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(FrameError::ZeroDimension {
                width,
                height,
                channels,
            });
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Single-channel frame, one byte per pixel.
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        Self::new(width, height, 1, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample of `channel` at pixel `(x, y)`. Callers must stay in bounds.
    #[inline]
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> u8 {
        let index = (y as usize * self.width as usize + x as usize) * self.channels + channel;
        self.data[index]
    }
}

impl From<&GrayImage> for DepthFrame {
    fn from(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 1,
            data: image.as_raw().clone(),
        }
    }
}

impl From<&RgbaImage> for DepthFrame {
    fn from(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 4,
            data: image.as_raw().clone(),
        }
    }
}
