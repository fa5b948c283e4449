//! Sequence driver: one pipeline run per frame number, with progress reports.

use std::ops::RangeInclusive;
use std::sync::mpsc::Sender;

use image::RgbImage;

use crate::error::{GrainError, Result, check_dimensions};
use crate::params::GrainParams;
use crate::pipeline::{FrameRequest, GrainRenderer};

/// Progress report emitted after each frame, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameProgress {
    pub frame: u64,
    pub completed: u64,
    pub total: u64,
    pub error: Option<String>,
}

impl FrameProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Receiver of per-frame progress.
pub trait ProgressSink {
    fn report(&mut self, progress: &FrameProgress);
}

impl<F: FnMut(&FrameProgress)> ProgressSink for F {
    fn report(&mut self, progress: &FrameProgress) {
        self(progress)
    }
}

/// Forwards progress to another thread. A dropped receiver is not an error.
impl ProgressSink for Sender<FrameProgress> {
    fn report(&mut self, progress: &FrameProgress) {
        if self.send(progress.clone()).is_err() {
            log::debug!("Progress receiver dropped at frame {}", progress.frame);
        }
    }
}

/// Sink that discards reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: &FrameProgress) {}
}

/// Lazily renders frames in order, yielding `(frame, result)`.
///
/// The parameter snapshot is taken when the run starts; later edits by the
/// caller affect only subsequent runs. A failing frame is reported and the run
/// moves on to the next one.
pub struct SequenceRun<'a, P: ProgressSink> {
    renderer: &'a GrainRenderer,
    width: u32,
    height: u32,
    params: GrainParams,
    background: Option<&'a RgbImage>,
    next: u64,
    end: u64,
    finished: bool,
    completed: u64,
    total: u64,
    sink: P,
}

impl<P: ProgressSink> SequenceRun<'_, P> {
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl<P: ProgressSink> Iterator for SequenceRun<'_, P> {
    type Item = (u64, Result<RgbImage>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let frame = self.next;
        if frame == self.end {
            self.finished = true;
        } else {
            self.next += 1;
        }

        let request = FrameRequest::new(self.width, self.height, &self.params)
            .with_frame(frame)
            .with_background(self.background);
        let result = self.renderer.render_frame(&request);

        self.completed += 1;
        let error = match &result {
            Ok(_) => None,
            Err(e) => {
                log::warn!("Frame {frame} failed: {e}");
                Some(e.to_string())
            }
        };
        self.sink.report(&FrameProgress {
            frame,
            completed: self.completed,
            total: self.total,
            error,
        });
        if self.finished {
            log::info!("Sequence finished: {} frame(s)", self.completed);
        }
        Some((frame, result))
    }
}

/// Start rendering every frame in `frames`, using the frame number as the
/// per-frame stream offset.
///
/// Rejects `start > end`, zero dimensions, a background of the wrong size and
/// invalid parameters up front.
pub fn run_sequence<'a, P: ProgressSink>(
    renderer: &'a GrainRenderer,
    width: u32,
    height: u32,
    frames: RangeInclusive<u64>,
    params: &GrainParams,
    background: Option<&'a RgbImage>,
    sink: P,
) -> Result<SequenceRun<'a, P>> {
    let (start, end) = frames.into_inner();
    if start > end {
        return Err(GrainError::InvalidFrameRange { start, end });
    }
    check_dimensions(width, height)?;
    if let Some(bg) = background
        && bg.dimensions() != (width, height)
    {
        return Err(GrainError::parameter(
            "background",
            format!(
                "{}x{} does not match the {width}x{height} target",
                bg.width(),
                bg.height()
            ),
        ));
    }
    params.validate()?;
    let total = (end - start).saturating_add(1);
    log::info!("Starting sequence: frames {start}..={end} at {width}x{height}");

    Ok(SequenceRun {
        renderer,
        width,
        height,
        params: params.clone(),
        background,
        next: start,
        end,
        finished: false,
        completed: 0,
        total,
        sink,
    })
}
