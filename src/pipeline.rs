use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use rayon::prelude::*;

use crate::{
    composite::{CompositedFrame, composite},
    container::{GifArtifact, assemble},
    encode::{DisposalMethod, EncodedFrameBlock, encode_frame},
    foundation::error::{FlipbookError, FlipbookResult},
    model::{OutputSpec, PaletteMode, SourceFrame},
    quantize::{build_palette, map_indices, quantize},
};

/// Worker-pool configuration for one encoding run.
///
/// The pool is built per run and torn down with it; no worker state survives
/// between runs.
#[derive(Clone, Debug)]
pub struct EncodeThreading {
    /// Encode frames on a rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Pool size; `None` uses available hardware parallelism.
    pub threads: Option<usize>,
}

impl Default for EncodeThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Cooperative cancellation handle for a running encode.
///
/// Clone it, hand one clone to [`EncodeOptions`], keep the other; `cancel`
/// stops the run before the next frame is dispatched. A cancelled run yields
/// [`FlipbookError::Cancelled`] and no artifact.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Per-run options for [`render_gif`].
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Worker-pool configuration.
    pub threading: EncodeThreading,
    /// Optional cancellation handle.
    pub cancel: Option<CancelToken>,
}

/// Drive all source frames through composite → quantize → encode and
/// assemble the result into a finished GIF.
///
/// Frames are processed in input order (restored at the collect point when
/// running parallel) and the assembler consumes blocks strictly in that
/// order. `progress` receives monotonically non-decreasing fractions in
/// [0, 1]: one per completed frame, and exactly one final `1.0` after the
/// container is assembled. On any failure the run aborts with a single
/// terminal error and no partial artifact; no progress is reported after an
/// error.
#[tracing::instrument(
    skip(sources, spec, opts, progress),
    fields(frames = sources.len(), width = spec.width, height = spec.height)
)]
pub fn render_gif(
    sources: &[SourceFrame],
    spec: &OutputSpec,
    opts: &EncodeOptions,
    progress: &(dyn Fn(f64) + Send + Sync),
) -> FlipbookResult<GifArtifact> {
    if sources.is_empty() {
        return Err(FlipbookError::EmptyInput);
    }
    spec.validate()?;

    let run = Run {
        spec,
        disposal: if spec.transparent() {
            DisposalMethod::RestoreToBackground
        } else {
            DisposalMethod::Keep
        },
        abort: AtomicBool::new(false),
        cancel: opts.cancel.clone(),
        sink: ProgressSink::new(progress, sources.len()),
    };

    let artifact = match spec.palette {
        PaletteMode::PerFrame => run.per_frame(sources, &opts.threading)?,
        PaletteMode::Global => run.global(sources, &opts.threading)?,
    };

    tracing::debug!(bytes = artifact.len(), "gif assembled");
    run.sink.finish();
    Ok(artifact)
}

/// State shared by all frame tasks of one run.
struct Run<'a> {
    spec: &'a OutputSpec,
    disposal: DisposalMethod,
    /// Set on the first component failure so in-flight siblings bail early.
    abort: AtomicBool,
    cancel: Option<CancelToken>,
    sink: ProgressSink<'a>,
}

impl Run<'_> {
    fn check_live(&self) -> FlipbookResult<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.abort.load(Ordering::Relaxed)
        {
            return Err(FlipbookError::Cancelled);
        }
        Ok(())
    }

    fn guard<T>(&self, result: FlipbookResult<T>) -> FlipbookResult<T> {
        if result.is_err() {
            self.abort.store(true, Ordering::Relaxed);
        }
        result
    }

    /// Per-frame palette mode: composite, quantize, and encode fused into
    /// one task per frame, each frame carrying its own local color table.
    fn per_frame(
        &self,
        sources: &[SourceFrame],
        threading: &EncodeThreading,
    ) -> FlipbookResult<GifArtifact> {
        let encode_one = |source: &SourceFrame| -> FlipbookResult<EncodedFrameBlock> {
            self.check_live()?;
            let frame = self.guard(composite(source, self.spec))?;
            let (palette, indexed) =
                self.guard(quantize(&frame, self.spec.quality, self.spec.transparent()))?;
            let block = self.guard(encode_frame(
                &indexed,
                &palette,
                source.delay_centis(),
                palette.transparent_index(),
                self.disposal,
                true,
            ))?;
            self.sink.frame_done();
            Ok(block)
        };

        let blocks = self.map_ordered(sources, threading, &encode_one)?;
        assemble(self.spec, None, &blocks)
    }

    /// Global palette mode: composite every frame first, build one palette
    /// from the merged sample, then map and encode against it read-only.
    fn global(
        &self,
        sources: &[SourceFrame],
        threading: &EncodeThreading,
    ) -> FlipbookResult<GifArtifact> {
        let composite_one = |source: &SourceFrame| -> FlipbookResult<CompositedFrame> {
            self.check_live()?;
            self.guard(composite(source, self.spec))
        };
        let frames = self.map_ordered(sources, threading, &composite_one)?;

        let palette = self.guard(build_palette(
            frames.iter(),
            self.spec.quality,
            self.spec.transparent(),
        ))?;
        tracing::debug!(colors = palette.len(), "global palette built");

        let jobs: Vec<(&CompositedFrame, u16)> = frames
            .iter()
            .zip(sources)
            .map(|(frame, source)| (frame, source.delay_centis()))
            .collect();
        let encode_one = |job: &(&CompositedFrame, u16)| -> FlipbookResult<EncodedFrameBlock> {
            let (frame, delay_centis) = *job;
            self.check_live()?;
            let indexed = self.guard(map_indices(frame, &palette))?;
            let block = self.guard(encode_frame(
                &indexed,
                &palette,
                delay_centis,
                palette.transparent_index(),
                self.disposal,
                false,
            ))?;
            self.sink.frame_done();
            Ok(block)
        };

        let blocks = self.map_ordered(&jobs, threading, &encode_one)?;
        assemble(self.spec, Some(&palette), &blocks)
    }

    /// Run `work` over `items`, sequentially or on a per-run rayon pool.
    ///
    /// The parallel path relies on rayon's indexed collect to restore input
    /// order, so the caller always sees results positionally matched to
    /// items. Error selection prefers the first real failure over the
    /// `Cancelled` results that aborted siblings report.
    fn map_ordered<I, T>(
        &self,
        items: &[I],
        threading: &EncodeThreading,
        work: &(dyn Fn(&I) -> FlipbookResult<T> + Sync),
    ) -> FlipbookResult<Vec<T>>
    where
        I: Sync,
        T: Send,
    {
        if !threading.parallel {
            return items.iter().map(work).collect();
        }

        let pool = build_thread_pool(threading.threads)?;
        let results: Vec<FlipbookResult<T>> =
            pool.install(|| items.par_iter().map(work).collect());

        let mut out = Vec::with_capacity(results.len());
        let mut cancelled = false;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(v) => out.push(v),
                Err(FlipbookError::Cancelled) => cancelled = true,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        if cancelled {
            return Err(FlipbookError::Cancelled);
        }
        Ok(out)
    }
}

/// Monotonic progress reporter shared across worker threads.
///
/// Workers finish out of order, so the raw completed-count fraction can
/// arrive at the callback out of order too; the mutex-guarded high-water
/// mark makes the observable sequence non-decreasing. The exact `1.0` is
/// emitted once, by [`ProgressSink::finish`], only on success.
struct ProgressSink<'a> {
    callback: &'a (dyn Fn(f64) + Send + Sync),
    total: usize,
    state: Mutex<SinkState>,
}

struct SinkState {
    completed: usize,
    high_water: f64,
}

impl<'a> ProgressSink<'a> {
    fn new(callback: &'a (dyn Fn(f64) + Send + Sync), total: usize) -> Self {
        Self {
            callback,
            total,
            state: Mutex::new(SinkState {
                completed: 0,
                high_water: 0.0,
            }),
        }
    }

    fn frame_done(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.completed += 1;
        let fraction = state.completed as f64 / self.total as f64;
        // The terminal 1.0 belongs to finish(); frame completions cap just
        // below it while assembly is still pending.
        if fraction < 1.0 && fraction > state.high_water {
            state.high_water = fraction;
            (self.callback)(fraction);
        }
    }

    fn finish(&self) {
        (self.callback)(1.0);
    }
}

fn build_thread_pool(threads: Option<usize>) -> FlipbookResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(anyhow::anyhow!("encode threading 'threads' must be >= 1 when set").into());
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
