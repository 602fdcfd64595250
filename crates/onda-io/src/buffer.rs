//! Typed views over raw hardware sample memory.
//!
//! A driver period arrives as one `&mut [u8]` region. [`SampleBufferMut`]
//! and [`SampleBufferRef`] overlay that region with a [`SampleFormat`] and
//! a stride, so one view walks exactly one channel whether the memory is
//! planar (one channel per region) or interleaved (channels rotating
//! within the region). All access is bounds-checked against the element
//! count, never against raw byte offsets.

use crate::codec;
use crate::format::SampleFormat;
use crate::{Error, Result};

/// Element count for a strided region: slots start at multiples of
/// `stride` and each needs `width` bytes.
fn strided_len(bytes: usize, width: usize, stride: usize) -> usize {
    if bytes < width {
        0
    } else {
        (bytes - width) / stride + 1
    }
}

/// Mutable view over one channel of a sample region.
pub struct SampleBufferMut<'a> {
    bytes: &'a mut [u8],
    format: SampleFormat,
    stride: usize,
    len: usize,
}

impl<'a> SampleBufferMut<'a> {
    /// View a planar region: consecutive slots, one channel.
    pub fn planar(bytes: &'a mut [u8], format: SampleFormat) -> Self {
        let width = format.bytes();
        let len = bytes.len() / width;
        Self {
            bytes,
            format,
            stride: width,
            len,
        }
    }

    /// View one channel of an interleaved region.
    ///
    /// `channels` is the frame width; `channel` selects which slot of
    /// each frame the view walks.
    pub fn interleaved(
        bytes: &'a mut [u8],
        format: SampleFormat,
        channels: usize,
        channel: usize,
    ) -> Result<Self> {
        if channels == 0 || channel >= channels {
            return Err(Error::OutOfRange {
                index: channel,
                len: channels,
            });
        }
        let width = format.bytes();
        let start = (channel * width).min(bytes.len());
        let bytes = &mut bytes[start..];
        let stride = width * channels;
        let len = strided_len(bytes.len(), width, stride);
        Ok(Self {
            bytes,
            format,
            stride,
            len,
        })
    }

    /// Number of samples the view covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view covers no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The slot format of the view.
    #[inline]
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        if index >= self.len {
            return Err(Error::OutOfRange {
                index,
                len: self.len,
            });
        }
        let start = index * self.stride;
        Ok(&mut self.bytes[start..start + self.format.bytes()])
    }

    /// Encode one amplitude into the slot at `index`.
    pub fn write(&mut self, index: usize, value: f32) -> Result<()> {
        let format = self.format;
        codec::encode(self.slot_mut(index)?, format, value)
    }

    /// Decode the amplitude at `index`.
    pub fn read(&self, index: usize) -> Result<f32> {
        self.as_ref().read(index)
    }

    /// Fill every slot from a sample-index function.
    pub fn fill_with(&mut self, mut sample: impl FnMut(usize) -> f32) -> Result<()> {
        for index in 0..self.len {
            self.write(index, sample(index))?;
        }
        Ok(())
    }

    /// Reborrow as a shared view.
    pub fn as_ref(&self) -> SampleBufferRef<'_> {
        SampleBufferRef {
            bytes: &*self.bytes,
            format: self.format,
            stride: self.stride,
            len: self.len,
        }
    }
}

/// Shared view over one channel of a sample region.
#[derive(Clone, Copy)]
pub struct SampleBufferRef<'a> {
    bytes: &'a [u8],
    format: SampleFormat,
    stride: usize,
    len: usize,
}

impl<'a> SampleBufferRef<'a> {
    /// View a planar region: consecutive slots, one channel.
    pub fn planar(bytes: &'a [u8], format: SampleFormat) -> Self {
        let width = format.bytes();
        let len = bytes.len() / width;
        Self {
            bytes,
            format,
            stride: width,
            len,
        }
    }

    /// View one channel of an interleaved region.
    pub fn interleaved(
        bytes: &'a [u8],
        format: SampleFormat,
        channels: usize,
        channel: usize,
    ) -> Result<Self> {
        if channels == 0 || channel >= channels {
            return Err(Error::OutOfRange {
                index: channel,
                len: channels,
            });
        }
        let width = format.bytes();
        let bytes = &bytes[(channel * width).min(bytes.len())..];
        let stride = width * channels;
        let len = strided_len(bytes.len(), width, stride);
        Ok(Self {
            bytes,
            format,
            stride,
            len,
        })
    }

    /// Number of samples the view covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view covers no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The slot format of the view.
    #[inline]
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Decode the amplitude at `index`.
    pub fn read(&self, index: usize) -> Result<f32> {
        if index >= self.len {
            return Err(Error::OutOfRange {
                index,
                len: self.len,
            });
        }
        let start = index * self.stride;
        codec::decode(&self.bytes[start..start + self.format.bytes()], self.format)
    }

    /// Iterate the decoded amplitudes.
    pub fn samples(&self) -> Samples<'a> {
        Samples {
            buffer: *self,
            front: 0,
            back: self.len,
        }
    }
}

/// Iterator over the decoded amplitudes of a [`SampleBufferRef`].
pub struct Samples<'a> {
    buffer: SampleBufferRef<'a>,
    front: usize,
    back: usize,
}

impl Iterator for Samples<'_> {
    type Item = Result<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.buffer.read(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Samples<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.buffer.read(self.back))
    }
}

impl ExactSizeIterator for Samples<'_> {}
