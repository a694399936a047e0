//! Concurrent compression requests against one source image.
//!
//! Every request is tagged with a generation number when it is submitted.
//! Requests may finish in any order; a result only becomes visible if its
//! generation is still the most recently submitted one when it arrives.
//! Superseded results are dropped, the work spent on them is not reclaimed.

use crate::compute_svd::SvdEngine;
use crate::jacobi::JacobiSvd;
use crate::pipeline::{CompressedImage, CompressionPipeline, Prepared};
use crate::raster::Raster;
use crate::types::{Result, SvdImageError};
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Sequence number assigned to a request at submission time.
pub type Generation = u64;

/// Publishes only the result of the latest submitted generation.
#[derive(Debug)]
pub struct GenerationGate<T> {
    submitted: AtomicU64,
    visible: Mutex<Visible<T>>,
}

#[derive(Debug)]
struct Visible<T> {
    generation: Generation,
    value: Option<Arc<T>>,
}

impl<T> Default for GenerationGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GenerationGate<T> {
    pub fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            visible: Mutex::new(Visible {
                generation: 0,
                value: None,
            }),
        }
    }

    /// Tag a new request. Generations start at 1 and strictly increase.
    pub fn begin(&self) -> Generation {
        self.submitted.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently submitted generation.
    pub fn latest(&self) -> Generation {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Make `value` visible if `generation` is the latest submitted one.
    ///
    /// The check and the store happen under the same lock, so two results can
    /// never both pass. Returns whether the value was published.
    pub fn publish(&self, generation: Generation, value: T) -> bool {
        let mut visible = self.visible.lock();
        let latest = self.latest();
        if generation != latest {
            debug!(
                "Discarding result of generation {} (latest is {})",
                generation, latest
            );
            return false;
        }
        visible.generation = generation;
        visible.value = Some(Arc::new(value));
        true
    }

    /// The currently visible value, if any request has been published yet.
    pub fn current(&self) -> Option<Arc<T>> {
        self.visible.lock().value.clone()
    }

    /// Generation of the currently visible value, 0 if nothing was published.
    pub fn published_generation(&self) -> Generation {
        self.visible.lock().generation
    }
}

/// What happened to a single request.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The result became the visible output.
    Published,
    /// The result arrived after a newer request had been submitted and was dropped.
    Superseded,
    /// The pipeline failed; the visible output is unchanged.
    Failed(SvdImageError),
}

/// Handle to a request running on a worker thread.
#[derive(Debug)]
pub struct Submission {
    generation: Generation,
    handle: JoinHandle<Outcome>,
}

impl Submission {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> Outcome {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Reuse the decomposition of the source image across rank changes.
    pub cache_decomposition: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cache_decomposition: true,
        }
    }
}

impl SessionOptions {
    pub fn with_cache_decomposition(mut self, cache_decomposition: bool) -> Self {
        self.cache_decomposition = cache_decomposition;
        self
    }
}

/// Compression requests for one uploaded image.
///
/// A new image gets a new session; nothing computed for the previous image
/// survives it.
pub struct CompressionSession<E = JacobiSvd> {
    inner: Arc<SessionInner<E>>,
}

impl<E> Clone for CompressionSession<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<E> {
    source: Raster,
    engine: E,
    options: SessionOptions,
    gate: GenerationGate<CompressedImage>,
    prepared: Mutex<Option<Arc<Prepared>>>,
}

impl<E: SvdEngine + 'static> CompressionSession<E> {
    pub fn new(source: Raster, engine: E) -> Self {
        Self::with_options(source, engine, SessionOptions::default())
    }

    pub fn with_options(source: Raster, engine: E, options: SessionOptions) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                source,
                engine,
                options,
                gate: GenerationGate::new(),
                prepared: Mutex::new(None),
            }),
        }
    }

    pub fn source(&self) -> &Raster {
        &self.inner.source
    }

    /// Start compressing with `rank` on a worker thread.
    pub fn submit(&self, rank: i64) -> Submission {
        let generation = self.inner.gate.begin();
        let inner = Arc::clone(&self.inner);
        let handle = thread::spawn(move || inner.process(generation, rank));
        Submission { generation, handle }
    }

    /// Compress with `rank` on the calling thread.
    pub fn compress_now(&self, rank: i64) -> Outcome {
        let generation = self.inner.gate.begin();
        self.inner.process(generation, rank)
    }

    /// The visible output: the result of the latest request that was published.
    pub fn output(&self) -> Option<Arc<CompressedImage>> {
        self.inner.gate.current()
    }

    pub fn latest_generation(&self) -> Generation {
        self.inner.gate.latest()
    }

    pub fn published_generation(&self) -> Generation {
        self.inner.gate.published_generation()
    }
}

impl<E: SvdEngine> SessionInner<E> {
    fn process(&self, generation: Generation, rank: i64) -> Outcome {
        debug!("Generation {}: compressing with rank {}", generation, rank);
        match self.compress(rank) {
            Ok(image) => {
                if self.gate.publish(generation, image) {
                    Outcome::Published
                } else {
                    Outcome::Superseded
                }
            }
            Err(err) => {
                debug!("Generation {} failed: {}", generation, err);
                Outcome::Failed(err)
            }
        }
    }

    fn compress(&self, rank: i64) -> Result<CompressedImage> {
        let mut pipeline = CompressionPipeline::new(&self.engine);
        if !self.options.cache_decomposition {
            return pipeline.run(&self.source, rank);
        }
        let prepared = self.cached_prepare(&mut pipeline)?;
        pipeline.render(&prepared, rank)
    }

    /// Decompose the source once. Concurrent first requests wait on the slot
    /// instead of decomposing the same image in parallel; a failed attempt
    /// leaves the slot empty.
    fn cached_prepare(&self, pipeline: &mut CompressionPipeline<&E>) -> Result<Arc<Prepared>> {
        let mut slot = self.prepared.lock();
        if let Some(prepared) = slot.as_ref() {
            return Ok(Arc::clone(prepared));
        }

        let prepared = Arc::new(pipeline.prepare(&self.source)?);
        *slot = Some(Arc::clone(&prepared));
        Ok(prepared)
    }
}
