/// Tuning knobs for building packs.
///
/// None of these affect correctness, only build time and (for the sphere
/// threshold) which near-surface hits get discarded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildConfig {
    /// Ranges with more leaves than this get their halves built in parallel.
    pub parallel_threshold: usize,

    /// Number of build workers; `None` lets rayon pick.
    pub worker_threads: Option<usize>,

    /// Sphere roots closer than this are ignored, so that rays spawned from a
    /// sphere's surface don't hit the same spot again.
    pub sphere_distance_threshold: f32,
}

impl BuildConfig {
    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    pub fn with_sphere_distance_threshold(
        mut self,
        sphere_distance_threshold: f32,
    ) -> Self {
        self.sphere_distance_threshold = sphere_distance_threshold;
        self
    }

    /// Returns a config that builds everything on the calling thread.
    pub fn single_threaded() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            worker_threads: Some(1),
            ..Default::default()
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 4096,
            worker_threads: None,
            sphere_distance_threshold: 1e-4,
        }
    }
}
