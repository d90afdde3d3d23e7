//! Tile delivery and display pixel conversion
//!
//! Sinks are invoked from the renderer's worker thread, never the control
//! context. Consumers that share state with other threads must synchronize;
//! [`FrameAccumulator`] does so with a lock-guarded frame buffer.

use std::sync::Mutex;

use crossbeam_channel::Sender;

/// Channels per pixel (RGBA)
pub const CHANNELS: usize = 4;

/// One rendered tile in linear float RGBA
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    /// Left edge in frame pixels
    pub x: u32,
    /// Top edge in frame pixels
    pub y: u32,
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
    /// Row-major RGBA pixels, `width * height * CHANNELS` floats
    pub pixels: Vec<f32>,
}

/// A completed frame in linear float RGBA
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Row-major RGBA pixels
    pub pixels: Vec<f32>,
}

/// Receiver of asynchronous partial render results
///
/// All methods run on the renderer's worker thread.
pub trait TileSink: Send + Sync {
    /// A tile finished rendering
    fn on_tile(&self, tile_x: u32, tile_y: u32, tile: &TileData);

    /// The whole frame finished rendering
    fn on_complete(&self, frame: &FrameData);

    /// Progress fraction in `0..=1`; `-1.0` signals session teardown
    fn on_progress(&self, _fraction: f32) {}
}

/// Linear → sRGB transfer (IEC 61966-2-1)
#[must_use]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

// Color channels get the display transfer; alpha stays linear.
fn quantize_pixel(rgba: &[f32]) -> [u8; CHANNELS] {
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    [
        to_u8(linear_to_srgb(rgba[0].clamp(0.0, 1.0))),
        to_u8(linear_to_srgb(rgba[1].clamp(0.0, 1.0))),
        to_u8(linear_to_srgb(rgba[2].clamp(0.0, 1.0))),
        to_u8(rgba[3]),
    ]
}

struct AccumulatorState {
    pixels: Vec<u8>,
    complete: bool,
    progress: f32,
}

/// Assembles converted tiles into a display frame
///
/// Performs the linear → display color space → 8-bit conversion once per
/// tile, never redone. The frame buffer is lock-guarded so a display consumer
/// can snapshot it while the worker writes.
pub struct FrameAccumulator {
    width: u32,
    height: u32,
    state: Mutex<AccumulatorState>,
}

impl FrameAccumulator {
    /// Accumulator for a frame of the given size
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Mutex::new(AccumulatorState {
                pixels: vec![0; width as usize * height as usize * CHANNELS],
                complete: false,
                progress: 0.0,
            }),
        }
    }

    /// Copy of the current display pixels (RGBA, 8-bit)
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.state.lock().unwrap().pixels.clone()
    }

    /// Frame dimensions
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether a full frame has been delivered
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.lock().unwrap().complete
    }

    /// Most recent progress fraction
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.state.lock().unwrap().progress
    }
}

impl TileSink for FrameAccumulator {
    fn on_tile(&self, _tile_x: u32, _tile_y: u32, tile: &TileData) {
        let mut state = self.state.lock().unwrap();
        for row in 0..tile.height {
            let fy = tile.y + row;
            if fy >= self.height {
                break;
            }
            for col in 0..tile.width {
                let fx = tile.x + col;
                if fx >= self.width {
                    break;
                }
                let src = ((row * tile.width + col) as usize) * CHANNELS;
                let dst = ((fy * self.width + fx) as usize) * CHANNELS;
                let converted = quantize_pixel(&tile.pixels[src..src + CHANNELS]);
                state.pixels[dst..dst + CHANNELS].copy_from_slice(&converted);
            }
        }
    }

    fn on_complete(&self, frame: &FrameData) {
        let mut state = self.state.lock().unwrap();
        let rows = frame.height.min(self.height);
        let cols = frame.width.min(self.width);
        for fy in 0..rows {
            for fx in 0..cols {
                let src = ((fy * frame.width + fx) as usize) * CHANNELS;
                let dst = ((fy * self.width + fx) as usize) * CHANNELS;
                let converted = quantize_pixel(&frame.pixels[src..src + CHANNELS]);
                state.pixels[dst..dst + CHANNELS].copy_from_slice(&converted);
            }
        }
        state.complete = true;
    }

    fn on_progress(&self, fraction: f32) {
        self.state.lock().unwrap().progress = fraction;
    }
}

/// Tile event forwarded to a consumer thread
#[derive(Debug, Clone, PartialEq)]
pub enum TileEvent {
    /// A tile finished rendering
    Tile(TileData),
    /// Render progress changed
    Progress(f32),
    /// The frame is complete
    Complete {
        /// Frame width in pixels
        width: u32,
        /// Frame height in pixels
        height: u32,
    },
}

/// Forwards tile events over a channel to another thread
pub struct ChannelSink {
    tx: Sender<TileEvent>,
}

impl ChannelSink {
    /// Sink writing into the given sender
    #[must_use]
    pub const fn new(tx: Sender<TileEvent>) -> Self {
        Self { tx }
    }
}

impl TileSink for ChannelSink {
    fn on_tile(&self, _tile_x: u32, _tile_y: u32, tile: &TileData) {
        // a disconnected receiver just means nobody is watching anymore
        let _ = self.tx.send(TileEvent::Tile(tile.clone()));
    }

    fn on_complete(&self, frame: &FrameData) {
        let _ = self.tx.send(TileEvent::Complete {
            width: frame.width,
            height: frame.height,
        });
    }

    fn on_progress(&self, fraction: f32) {
        let _ = self.tx.send(TileEvent::Progress(fraction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_srgb_transfer_endpoints() {
        assert_relative_eq!(linear_to_srgb(0.0), 0.0, epsilon = 1e-6);
        assert_relative_eq!(linear_to_srgb(1.0), 1.0, epsilon = 1e-6);
        // mid grey lifts above linear
        assert!(linear_to_srgb(0.5) > 0.7);
    }

    #[test]
    fn test_accumulator_places_tile() {
        let acc = FrameAccumulator::new(4, 4);
        let tile = TileData {
            x: 2,
            y: 2,
            width: 2,
            height: 2,
            pixels: vec![1.0; 2 * 2 * CHANNELS],
        };
        acc.on_tile(1, 1, &tile);
        let pixels = acc.snapshot();
        // untouched corner stays black, written corner is white
        assert_eq!(&pixels[0..4], &[0, 0, 0, 0]);
        let dst = (3 * 4 + 3) * CHANNELS;
        assert_eq!(&pixels[dst..dst + 4], &[255, 255, 255, 255]);
        assert!(!acc.is_complete());
    }

    #[test]
    fn test_accumulator_complete_frame() {
        let acc = FrameAccumulator::new(2, 2);
        let frame = FrameData {
            width: 2,
            height: 2,
            pixels: vec![0.0; 2 * 2 * CHANNELS],
        };
        acc.on_complete(&frame);
        assert!(acc.is_complete());
    }

    #[test]
    fn test_channel_sink_forwards_events() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sink = ChannelSink::new(tx);
        sink.on_progress(0.5);
        sink.on_complete(&FrameData {
            width: 1,
            height: 1,
            pixels: vec![0.0; CHANNELS],
        });
        assert_eq!(rx.recv().unwrap(), TileEvent::Progress(0.5));
        assert_eq!(rx.recv().unwrap(), TileEvent::Complete { width: 1, height: 1 });
    }
}
