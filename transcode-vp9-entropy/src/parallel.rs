//! Tile-parallel coefficient coding.
//!
//! Tiles own disjoint entropy contexts and token caches, so they can be
//! coded concurrently against a shared, read-only probability set. Each
//! worker counts into its own [`FrameCounts`]; the partial tables are summed
//! once every tile has finished, before backward adaptation runs.

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::{CoefError, Result};
use crate::probs::FrameCounts;

/// Per-tile outputs and the merged branch counts of all tiles.
#[derive(Debug, Clone)]
pub struct TileResults<O> {
    /// Worker outputs, in tile order.
    pub outputs: Vec<O>,
    /// Sum of all per-tile counts.
    pub counts: FrameCounts,
}

/// Run `code_tile` for every tile on the global rayon pool.
///
/// The first error aborts the frame.
pub fn code_tiles<T, O, F>(tiles: &[T], code_tile: F) -> Result<TileResults<O>>
where
    T: Sync,
    O: Send,
    F: Fn(&T, &mut FrameCounts) -> Result<O> + Sync,
{
    let partials = tiles
        .par_iter()
        .map(|tile| {
            let mut counts = FrameCounts::new();
            let output = code_tile(tile, &mut counts)?;
            Ok((output, counts))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut counts = FrameCounts::new();
    let mut outputs = Vec::with_capacity(partials.len());
    for (output, partial) in partials {
        counts.merge(&partial);
        outputs.push(output);
    }
    Ok(TileResults { outputs, counts })
}

/// Accumulate the counts of every tile, discarding worker outputs.
pub fn accumulate_tiles<T, F>(tiles: &[T], code_tile: F) -> Result<FrameCounts>
where
    T: Sync,
    F: Fn(&T, &mut FrameCounts) -> Result<()> + Sync,
{
    Ok(code_tiles(tiles, code_tile)?.counts)
}

/// Dedicated pool for tile workers.
#[derive(Debug)]
pub struct TilePool {
    pool: ThreadPool,
}

impl TilePool {
    /// Create a pool with `num_threads` workers (0 = one per core).
    pub fn new(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|idx| format!("coef-tile-{}", idx))
            .build()
            .map_err(|e| CoefError::InvalidConfig(format!("tile pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// [`code_tiles`] on this pool.
    pub fn code_tiles<T, O, F>(&self, tiles: &[T], code_tile: F) -> Result<TileResults<O>>
    where
        T: Sync,
        O: Send,
        F: Fn(&T, &mut FrameCounts) -> Result<O> + Sync + Send,
    {
        self.pool.install(|| code_tiles(tiles, code_tile))
    }
}
