use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::cache::SingleFlight;
use crate::dvh::{Dvh, DvhConfig, build_dvh};
use crate::error::{EngineError, Result, StructureError};
use crate::grid::{DoseGrid, Structure};
use crate::mask::{FillRule, StructureMask, resolve_mask};

type CacheKey = (String, u64);

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub type StructureDvh = std::result::Result<Arc<Dvh>, StructureError>;

pub struct Session {
    grid: Arc<DoseGrid>,
    structures: Vec<Structure>,
    fill_rule: FillRule,
    dvh_config: DvhConfig,
    masks: SingleFlight<CacheKey, StructureMask>,
    dvhs: SingleFlight<CacheKey, Dvh>,
}

impl Session {
    /// Structure names must be unique; they are the cache identity.
    pub fn new(grid: DoseGrid, structures: Vec<Structure>) -> Result<Self> {
        for (i, s) in structures.iter().enumerate() {
            if structures[..i].iter().any(|o| o.name == s.name) {
                return Err(EngineError::InvalidInput(format!(
                    "duplicate structure name '{}'",
                    s.name
                )));
            }
        }
        Ok(Self {
            grid: Arc::new(grid),
            structures,
            fill_rule: FillRule::default(),
            dvh_config: DvhConfig::default(),
            masks: SingleFlight::new(),
            dvhs: SingleFlight::new(),
        })
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }

    pub fn with_dvh_config(mut self, config: DvhConfig) -> Self {
        self.dvh_config = config;
        self
    }

    pub fn grid(&self) -> &Arc<DoseGrid> {
        &self.grid
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn structure(&self, name: &str) -> Result<&Structure> {
        self.structures
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown structure '{}'", name)))
    }

    fn key(&self, name: &str) -> CacheKey {
        (name.to_string(), self.grid.version())
    }

    pub fn mask(&self, name: &str) -> Result<Arc<StructureMask>> {
        let structure = self.structure(name)?;
        self.masks.get_or_compute(self.key(name), || {
            resolve_mask(&self.grid, structure, self.fill_rule)
        })
    }

    pub fn dvh(&self, name: &str) -> Result<Arc<Dvh>> {
        self.structure(name)?;
        self.dvhs.get_or_compute(self.key(name), || {
            let mask = self.mask(name)?;
            build_dvh(&self.grid, &mask, &self.dvh_config)
        })
    }

    /// DVHs for every structure, in input order. Structures not yet started
    /// when `cancel` fires report [`EngineError::Cancelled`].
    pub fn build_all(&self, threads: usize, cancel: &CancelToken) -> Result<Vec<StructureDvh>> {
        let started = Instant::now();
        let names: Vec<&str> = self.structures.iter().map(|s| s.name.as_str()).collect();
        let one = |name: &str| -> StructureDvh {
            if cancel.is_cancelled() {
                return Err(StructureError::new(
                    name,
                    EngineError::Cancelled(name.to_string()),
                ));
            }
            self.dvh(name).map_err(|e| StructureError::new(name, e))
        };

        #[cfg(feature = "mt")]
        let out: Vec<StructureDvh> = {
            use rayon::prelude::*;
            let mut builder = rayon::ThreadPoolBuilder::new();
            if threads > 0 {
                builder = builder.num_threads(threads);
            }
            let pool = builder.build().map_err(|e| {
                EngineError::InvalidInput(format!("failed to build thread pool: {}", e))
            })?;
            pool.install(|| names.par_iter().map(|n| one(*n)).collect())
        };
        #[cfg(not(feature = "mt"))]
        let out: Vec<StructureDvh> = {
            let _ = threads;
            names.iter().map(|n| one(*n)).collect()
        };

        info!(
            structures = names.len(),
            failed = out.iter().filter(|r| r.is_err()).count(),
            elapsed_ms = started.elapsed().as_millis(),
            "structure DVHs built"
        );
        Ok(out)
    }

    /// Swaps in a new grid. Entries keyed by the old grid version are dropped.
    pub fn replace_grid(&mut self, grid: DoseGrid) {
        let version = grid.version();
        self.grid = Arc::new(grid);
        self.masks.retain(|k| k.1 == version);
        self.dvhs.retain(|k| k.1 == version);
        debug!(version, "dose grid replaced");
    }

    pub fn replace_structure(&mut self, structure: Structure) {
        self.invalidate_structure(&structure.name);
        match self.structures.iter_mut().find(|s| s.name == structure.name) {
            Some(slot) => *slot = structure,
            None => self.structures.push(structure),
        }
    }

    pub fn invalidate_structure(&self, name: &str) {
        let key = self.key(name);
        self.masks.invalidate(&key);
        self.dvhs.invalidate(&key);
    }

    pub fn cached_dvhs(&self) -> usize {
        self.dvhs.len()
    }
}
