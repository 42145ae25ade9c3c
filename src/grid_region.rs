/// A populated leaf cell of the grid directory. The region covers the
/// rectangle reached by `level` successive binary splits of the unit
/// hypercube; `code` packs the left/right choice of every split.
#[derive(Debug, Clone)]
pub(crate) struct GridRegion<T> {
    pub(crate) code: u64,
    pub(crate) level: u32,
    pub(crate) position: usize,
    pub(crate) density: f64,
    pub(crate) tuples: Vec<Vec<T>>,
}

impl<T> GridRegion<T> {
    pub(crate) fn new(code: u64, level: u32) -> Self {
        GridRegion {
            code,
            level,
            position: 0,
            density: 0.0,
            tuples: Vec::new(),
        }
    }

    pub(crate) fn insert_tuple(&mut self, tuple: Vec<T>) {
        self.tuples.push(tuple);
    }

    pub(crate) fn clear_tuples(&mut self) {
        self.tuples.clear();
    }

    pub(crate) fn population(&self) -> usize {
        self.tuples.len()
    }

    /// Nominal size of the region, `1 / 2^level`. The root region has size 1.
    /// The effective size used for densities additionally subtracts the area
    /// of nested descendant regions and is computed by the directory.
    pub(crate) fn size(&self) -> f64 {
        0.5_f64.powi(self.level as i32)
    }
}
