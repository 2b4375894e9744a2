use std::ops;

use derivative::Derivative;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    BoundingBox, BuildConfig, BuildStats, Bvh, BvhBuilder, EntityToken, Pack,
    PackBuilder, Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackId(u32);

impl PackId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Arena of built packs.
///
/// Packs can refer (through instances) only to packs inserted before them,
/// which keeps the instancing graph acyclic.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Packs {
    config: BuildConfig,
    #[derivative(Debug = "ignore")]
    pool: Option<ThreadPool>,
    #[derivative(Debug = "ignore")]
    packs: Vec<Pack>,
}

impl Packs {
    pub fn new(config: BuildConfig) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.unwrap_or(0))
            .thread_name(|idx| format!("trellis-build-{idx}"))
            .build();

        let pool = match pool {
            Ok(pool) => {
                log::debug!("Build pool ready; threads = {}", pool.current_num_threads());
                Some(pool)
            }

            Err(err) => {
                log::warn!(
                    "Couldn't spawn the build pool, falling back to \
                     single-threaded builds: {err}"
                );

                None
            }
        };

        Self {
            config,
            pool,
            packs: Default::default(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds a pack and publishes it, returning its handle.
    pub fn insert(&mut self, builder: PackBuilder) -> Result<PackId> {
        let pack = builder.build(self)?;
        let id = PackId::new(self.packs.len() as u32);

        log::debug!("Pack {:?} published; bounds = {:?}", id, pack.bounds());

        self.packs.push(pack);

        Ok(id)
    }

    pub fn get(&self, id: PackId) -> Option<&Pack> {
        self.packs.get(id.get() as usize)
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PackId, &Pack)> + '_ {
        self.packs
            .iter()
            .enumerate()
            .map(|(idx, pack)| (PackId::new(idx as u32), pack))
    }

    pub(crate) fn build_bvh(
        &self,
        bounds: &[BoundingBox],
        tokens: &[EntityToken],
    ) -> (Bvh, BuildStats) {
        let builder = BvhBuilder::new(bounds, tokens);

        match &self.pool {
            Some(pool) => pool.install(|| {
                builder
                    .with_parallel_threshold(self.config.parallel_threshold)
                    .build()
            }),

            None => builder.build(),
        }
    }
}

impl Default for Packs {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl ops::Index<PackId> for Packs {
    type Output = Pack;

    fn index(&self, id: PackId) -> &Self::Output {
        &self.packs[id.get() as usize]
    }
}
