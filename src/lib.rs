//! BANG-file clustering algorithm in Rust. Generic over floating point
//! numeric types.
//!
//! The BANG file is a grid-file index that partitions the unit hypercube by
//! successive binary bisections, cycling through the dimensions. Inserted
//! tuples collect in the leaf regions of a balanced binary directory; when a
//! region overflows its bucket it is split into two buddy regions, and
//! sparse buddies are merged back into their enclosing region to keep the
//! distribution even. Clusters are then read off the grid: regions are
//! ranked by density, a dendrogram grows greedily outwards from the densest
//! region through its neighbors, and the clusters are the runs of
//! dendrogram regions dense enough to make the requested population cut.
//!
//! Clustering this way has two useful properties:
//!  1. The grid adapts its resolution to the data. Dense areas are split
//!     into fine cells while sparse areas stay coarse, so no global cell
//!     width has to be chosen up front; and
//!  2. Not every tuple is forced into a cluster. Only the configured
//!     percentage of the population, taken from the densest regions, is
//!     clustered; the rest is left out as background noise.
//!
//! All tuple coordinates must be normalized into the unit interval before
//! insertion.
//!
//! # Examples
//!```
//!use bangfile::{BangFile, BangFileParams};
//!
//!let params = BangFileParams::builder()
//!    .bucketsize(4)
//!    .cluster_percent(50)
//!    .build();
//!let mut clusterer: BangFile<f64> = BangFile::new(2, params).unwrap();
//!for x in [0.1, 0.2, 0.3, 0.4, 0.7, 0.8] {
//!    clusterer.insert(vec![x, 0.1]).unwrap();
//!}
//!clusterer.build();
//!// The dense left half of the data makes the cut
//!assert_eq!(1, clusterer.number_of_clusters());
//!assert_eq!(0, clusterer.cluster_of(&[0.1, 0.1]).unwrap());
//!// Tuples in regions below the density cut are not clustered
//!assert_eq!(-1, clusterer.cluster_of(&[0.9, 0.9]).unwrap());
//!```
//!
//! # References
//! * [Freeston, M. The BANG file: A new kind of grid file.](https://dl.acm.org/doi/10.1145/38713.38743)
//! * [Nievergelt, J.; Hinterberger, H.; Sevcik, K.C. The grid file: An adaptable, symmetric multikey file structure.](https://dl.acm.org/doi/10.1145/348.318586)

use crate::cluster::Cluster;
use crate::directory::{Directory, EntryId};
use crate::grid_region::GridRegion;
use crate::region_coder::{is_neighbor, RegionCoder};
use log::{debug, warn};
use num_traits::Float;

pub use crate::error::BangFileError;
pub use crate::hyper_parameters::{BangFileParams, ParamsBuilder};

mod cluster;
mod directory;
mod error;
mod grid_region;
mod hyper_parameters;
mod region_coder;

// Valid minimums/left bounds of parameters
const BUCKETSIZE_MINIMUM: usize = 4;
const NEIGHBOR_MARGIN_MINIMUM: usize = 1;
const CLUSTER_PERCENT_MAXIMUM: usize = 100;

/// The BANG-file clustering algorithm in Rust. Generic over floating point
/// numeric types.
pub struct BangFile<T> {
    dimensions: usize,
    bucketsize: usize,
    neighbor_condition: usize,
    cluster_percent: usize,
    coder: RegionCoder,
    directory: Directory<T>,
    tuples_count: usize,
    dendrogram: Vec<EntryId>,
    clusters: Vec<Cluster>,
    built: bool,
}

impl<T: Float> BangFile<T> {
    /// Creates an instance of the BANG-file clustering model using a custom
    /// parameter configuration.
    ///
    /// # Parameters
    /// * `dimensions` - the dimensionality of the tuples to be inserted.
    /// * `params` - the parameter configuration.
    ///
    /// # Returns
    /// * A result that, if successful, contains the empty clustering model.
    ///   An error is returned when a parameter is out of range: the
    ///   bucketsize must be at least 4, the neighbor margin must lie
    ///   between 1 and the number of dimensions, and the cluster percentage
    ///   must not exceed 100.
    ///
    /// # Examples
    /// ```
    ///use bangfile::{BangFile, BangFileParams};
    ///
    ///let params = BangFileParams::builder()
    ///    .bucketsize(20)
    ///    .neighbor_margin(1)
    ///    .cluster_percent(75)
    ///    .build();
    ///let clusterer: BangFile<f64> = BangFile::new(2, params).unwrap();
    /// ```
    pub fn new(dimensions: usize, params: BangFileParams) -> Result<Self, BangFileError> {
        if dimensions == 0 {
            return Err(BangFileError::InvalidParameter(String::from(
                "at least one dimension is required",
            )));
        }
        if params.bucketsize < BUCKETSIZE_MINIMUM {
            return Err(BangFileError::InvalidParameter(format!(
                "bucketsize ({}) cannot be lower than {BUCKETSIZE_MINIMUM}",
                params.bucketsize
            )));
        }
        if params.neighbor_margin < NEIGHBOR_MARGIN_MINIMUM || params.neighbor_margin > dimensions
        {
            return Err(BangFileError::InvalidParameter(format!(
                "neighbor_margin ({}) must lie between {NEIGHBOR_MARGIN_MINIMUM} and the \
                number of dimensions ({dimensions})",
                params.neighbor_margin
            )));
        }
        if params.cluster_percent > CLUSTER_PERCENT_MAXIMUM {
            return Err(BangFileError::InvalidParameter(format!(
                "cluster_percent ({}) cannot exceed {CLUSTER_PERCENT_MAXIMUM}",
                params.cluster_percent
            )));
        }

        Ok(BangFile {
            dimensions,
            bucketsize: params.bucketsize,
            neighbor_condition: dimensions - params.neighbor_margin,
            cluster_percent: params.cluster_percent,
            coder: RegionCoder::new(dimensions),
            directory: Directory::new(),
            tuples_count: 0,
            dendrogram: Vec::new(),
            clusters: Vec::new(),
            built: false,
        })
    }

    /// Creates an instance of the BANG-file clustering model using the
    /// default parameters.
    ///
    /// # Parameters
    /// * `dimensions` - the dimensionality of the tuples to be inserted.
    ///
    /// # Returns
    /// * A result that, if successful, contains the empty clustering model.
    ///
    /// # Examples
    /// ```
    ///use bangfile::BangFile;
    ///
    ///let clusterer: BangFile<f64> = BangFile::default_params(2).unwrap();
    /// ```
    pub fn default_params(dimensions: usize) -> Result<Self, BangFileError> {
        BangFile::new(dimensions, BangFileParams::default())
    }

    /// Inserts a tuple into the grid directory. The tuple lands in the
    /// deepest existing region on its path; if that region overflows its
    /// bucket, the directory rebalances through buddy splits and
    /// redistribution before the tuple is placed.
    ///
    /// # Parameters
    /// * `tuple` - the tuple to insert. Its length must equal the model's
    ///             dimensionality and every coordinate must lie in the
    ///             closed unit interval.
    ///
    /// # Returns
    /// * A result that is an error if the model is already built, the tuple
    ///   arity does not match, or a coordinate falls outside the unit
    ///   hypercube.
    ///
    /// # Examples
    /// ```
    ///use bangfile::BangFile;
    ///
    ///let mut clusterer: BangFile<f64> = BangFile::default_params(2).unwrap();
    ///clusterer.insert(vec![0.1, 0.2]).unwrap();
    ///clusterer.insert(vec![0.2, 0.3]).unwrap();
    ///assert_eq!(2, clusterer.number_of_tuples());
    /// ```
    pub fn insert(&mut self, tuple: Vec<T>) -> Result<(), BangFileError> {
        if self.built {
            return Err(BangFileError::UseAfterBuild);
        }
        self.validate_tuple(&tuple)?;
        self.insert_tuple(tuple)?;
        self.tuples_count += 1;
        Ok(())
    }

    /// Builds the clustering model from the inserted tuples: computes
    /// region densities over the directory, ranks the regions, grows the
    /// dendrogram outwards from the densest region and cuts it into
    /// clusters covering the configured percentage of the population.
    ///
    /// Once built, the model only answers queries; further insertion is
    /// rejected.
    pub fn build(&mut self) {
        self.directory.calculate_density();
        let sorted = self.sorted_regions();
        self.dendrogram = self.create_dendrogram(&sorted);
        self.clusters = self.create_clusters(&sorted);
        self.built = true;
    }

    /// Returns the number of tuples inserted into the clustering model.
    pub fn number_of_tuples(&self) -> usize {
        self.tuples_count
    }

    /// Returns the number of clusters in the built clustering model.
    pub fn number_of_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Predicts the cluster membership for a tuple.
    ///
    /// # Parameters
    /// * `tuple` - the tuple to classify.
    ///
    /// # Returns
    /// * A result that, if successful, contains the index of the cluster
    ///   whose region contains the tuple, or -1 if the tuple falls outside
    ///   every cluster. An error is returned for mismatched arity or
    ///   coordinates outside the unit hypercube.
    pub fn cluster_of(&self, tuple: &[T]) -> Result<i32, BangFileError> {
        self.validate_tuple(tuple)?;
        let code = self.coder.map_region(tuple);
        let entry = match self.find_region(code, self.coder.total_levels()) {
            Some(entry) => entry,
            None => return Ok(-1),
        };
        for (index, cluster) in self.clusters.iter().enumerate() {
            if cluster.regions.contains(&entry) {
                return Ok(index as i32);
            }
        }
        Ok(-1)
    }

    /// Returns all tuples contained in the regions of a cluster.
    ///
    /// # Parameters
    /// * `cluster` - the index of the cluster.
    ///
    /// # Panics
    /// * If the cluster index is out of range.
    pub fn tuples_of(&self, cluster: usize) -> Vec<Vec<T>> {
        self.clusters[cluster]
            .regions
            .iter()
            .flat_map(|&id| self.region_of(id).tuples.iter().cloned())
            .collect()
    }

    /// Renders a formatted summary of the built clustering model: the
    /// configuration, the tuple count and one row per cluster with its
    /// population and share of the total and clustered populations.
    pub fn render_report(&self) -> String {
        let mut report = String::from("BANG-File:");
        report.push_str(&format!("\n    {:<19} {:>10}", "Dimension:", self.dimensions));
        report.push_str(&format!(
            "\n    {:<19} {:>10}",
            "Neighborhood-Cond.:", self.neighbor_condition
        ));
        report.push_str(&format!("\n    {:<19} {:>10}", "Bucketsize:", self.bucketsize));
        report.push_str(&format!(
            "\n    {:<19} {:>10}",
            "Cluster-Percent:", self.cluster_percent
        ));
        report.push_str(&format!("\n    {:<19} {:>10}", "Tuples:", self.tuples_count));

        report.push_str(&format!("\n\nClusters: {:>3}\n", self.clusters.len()));

        let line = "-".repeat(61);
        report.push_str(&format!("{line}\n"));
        report.push_str(&format!(
            "| {:<12} | {:>12} | {:>12} | {:>12} |\n",
            "Cluster ID", "Population", "Of Total", "Of Clustered"
        ));
        report.push_str(&format!("{line}\n"));

        let clustered_total = self.tuples_count * self.cluster_percent / 100;
        for (index, cluster) in self.clusters.iter().enumerate() {
            let of_total = if self.tuples_count > 0 {
                cluster.population as f64 * 100.0 / self.tuples_count as f64
            } else {
                0.0
            };
            let of_clustered = if clustered_total > 0 {
                cluster.population as f64 * 100.0 / clustered_total as f64
            } else {
                0.0
            };
            report.push_str(&format!(
                "| {:<12} | {:>12} | {:>10.1} % | {:>10.1} % |\n",
                format!("Cluster {index:>2}"),
                cluster.population,
                of_total,
                of_clustered
            ));
        }
        report.push_str(&format!("{line}\n\n"));

        report
    }

    fn validate_tuple(&self, tuple: &[T]) -> Result<(), BangFileError> {
        if tuple.len() != self.dimensions {
            return Err(BangFileError::DimensionMismatch(format!(
                "model expects {} dimensions, tuple has {}",
                self.dimensions,
                tuple.len()
            )));
        }
        for (n, &coordinate) in tuple.iter().enumerate() {
            if !(coordinate >= T::zero() && coordinate <= T::one()) {
                return Err(BangFileError::DomainViolation(format!(
                    "coordinate {n} must lie in range 0 to 1"
                )));
            }
        }
        Ok(())
    }

    /// Places a tuple into the deepest existing region on its path,
    /// rebalancing and retrying on overflow.
    fn insert_tuple(&mut self, tuple: Vec<T>) -> Result<(), BangFileError> {
        let code = self.coder.map_region(&tuple);
        let entry = self.deepest_region_entry(code)?;

        if self.directory.population(entry) < self.bucketsize {
            if let Some(region) = self.directory.entry_mut(entry).region.as_mut() {
                region.insert_tuple(tuple);
            }
            return Ok(());
        }

        match self.enclosing_entry(entry) {
            // an overflowing outermost region can only be split
            None => self.split_region(entry)?,
            Some(enclosing) => {
                if !self.redistribute(entry, enclosing)? {
                    let code = self.coder.map_region(&tuple);
                    let entry = self.deepest_region_entry(code)?;
                    self.split_region(entry)?;
                }
            }
        }

        // try inserting the tuple into the new structure
        self.insert_tuple(tuple)
    }

    fn deepest_region_entry(&self, code: u64) -> Result<EntryId, BangFileError> {
        self.find_region(code, self.coder.total_levels()).ok_or_else(|| {
            BangFileError::InternalInconsistency(String::from(
                "no region found on the tuple's path",
            ))
        })
    }

    /// Descends from the root along the code, one bit per level, stopping
    /// when the next child is absent or every code bit is consumed, then
    /// walks back up to the first region-carrying entry.
    fn find_region(&self, code: u64, levels: u32) -> Option<EntryId> {
        let mut entry = self.directory.root();
        let mut code = code;
        let mut remaining = levels;

        while remaining > 0 {
            remaining -= 1;

            // if the bit is set, go right
            let next = if code & 1 != 0 {
                self.directory.entry(entry).right
            } else {
                self.directory.entry(entry).left
            };

            match next {
                Some(next) => {
                    entry = next;
                    code >>= 1;
                }
                None => break,
            }
        }

        loop {
            if self.directory.region(entry).is_some() {
                return Some(entry);
            }
            entry = self.directory.entry(entry).back?;
        }
    }

    /// The nearest ancestor of the entry carrying a region, or `None` for
    /// an outermost region.
    fn enclosing_entry(&self, entry: EntryId) -> Option<EntryId> {
        let mut current = self.directory.entry(entry).back;
        while let Some(ancestor) = current {
            if self.directory.region(ancestor).is_some() {
                return Some(ancestor);
            }
            current = self.directory.entry(ancestor).back;
        }
        None
    }

    /// Splits an overflowing region via a buddy split, keeps the sparser
    /// half in place at the original level and pushes the denser half down,
    /// then rebalances around the split.
    fn split_region(&mut self, entry: EntryId) -> Result<(), BangFileError> {
        if let Some(region) = self.directory.region(entry) {
            debug!(
                "splitting region {} at level {}",
                region.code, region.level
            );
        }

        self.manage_buddy_split(entry)?;

        let sparse = self.directory.sparse_entry(entry);
        let dense = self.directory.dense_entry(entry);

        // the sparser half moves back up into the entry at its original level
        let tuples = self
            .directory
            .entry_mut(sparse)
            .region
            .take()
            .map(|region| region.tuples)
            .unwrap_or_default();
        if let Some(region) = self.directory.entry_mut(entry).region.as_mut() {
            region.clear_tuples();
            for tuple in tuples {
                region.insert_tuple(tuple);
            }
        }

        if self.directory.entry(sparse).left.is_none()
            && self.directory.entry(sparse).right.is_none()
        {
            self.directory.clear_succeeding_entry(entry, sparse);
        }

        let dense = self.check_tree(dense);

        self.redistribute(dense, entry)?;
        self.check_tree(entry);
        Ok(())
    }

    /// Performs the buddy split of an entry's region and re-inserts its
    /// tuples, which land in the two new buddies. If the region sat in the
    /// deepest level, the grid grows one level first, in the dimension the
    /// cyclic schedule assigns.
    ///
    /// # Returns
    /// * whether the split deepened the grid
    fn manage_buddy_split(&mut self, entry: EntryId) -> Result<bool, BangFileError> {
        self.directory.create_buddy_split(entry);

        let (level, tuples) = {
            let region = self
                .directory
                .region(entry)
                .expect("Buddy split requires a region");
            (region.level, region.tuples.clone())
        };

        let mut deepened = false;
        if level == self.coder.total_levels() {
            self.coder.split_deepest();
            deepened = true;
        }

        for tuple in tuples {
            self.insert_tuple(tuple)?;
        }

        Ok(deepened)
    }

    /// Merges a sparse buddy into the enclosing region when the denser
    /// buddy outweighs it, cascading while that remains true. Reverts the
    /// buddy split otherwise.
    ///
    /// # Returns
    /// * whether the buddy split was kept
    fn redistribute(&mut self, entry: EntryId, enclosing: EntryId) -> Result<bool, BangFileError> {
        let deepened = self.manage_buddy_split(entry)?;

        let sparse = self.directory.sparse_entry(entry);
        let dense = self.directory.dense_entry(entry);

        if self.directory.population(enclosing) < self.directory.population(dense) {
            debug!(
                "redistributing region {} into its enclosing region",
                self.region_of(entry).code
            );
            self.directory.entry_mut(entry).region = None;

            let tuples = self
                .directory
                .entry_mut(sparse)
                .region
                .take()
                .map(|region| region.tuples)
                .unwrap_or_default();
            if let Some(region) = self.directory.entry_mut(enclosing).region.as_mut() {
                for tuple in tuples {
                    region.insert_tuple(tuple);
                }
            }

            if self.directory.entry(sparse).left.is_none()
                && self.directory.entry(sparse).right.is_none()
            {
                self.directory.clear_succeeding_entry(entry, sparse);
            }

            // if the dense buddy has a follow-up region, move it down as a buddy
            let dense = self.check_tree(dense);

            if self.directory.population(enclosing) < self.directory.population(dense) {
                self.redistribute(dense, enclosing)?;
            }

            Ok(true)
        } else {
            if deepened {
                self.coder.unsplit_deepest();
            }
            self.directory.clear_buddy_split(entry);
            Ok(false)
        }
    }

    /// Restores the buddy invariant around an entry: while the entry holds
    /// a region and exactly one child does too, the entry's region moves
    /// down to become the child's buddy.
    ///
    /// # Returns
    /// * the entry now holding the region
    fn check_tree(&mut self, entry: EntryId) -> EntryId {
        let left_populated = self.directory.entry(entry).left
            .map_or(false, |left| self.directory.region(left).is_some());
        let right_populated = self.directory.entry(entry).right
            .map_or(false, |right| self.directory.region(right).is_some());

        if left_populated {
            if right_populated {
                warn!("directory entry holds a region while both children are populated");
                return entry;
            }
            let moved = self.directory.move_to_right(entry);
            self.check_tree(moved)
        } else if right_populated {
            let moved = self.directory.move_to_left(entry);
            self.check_tree(moved)
        } else {
            entry
        }
    }

    /// Collects every region and sorts descending by density; equal
    /// densities order by code, then level, for a deterministic ranking.
    /// Each region is assigned its 1-based rank.
    fn sorted_regions(&mut self) -> Vec<EntryId> {
        let mut sorted = Vec::new();
        self.directory.collect_regions(&mut sorted);

        sorted.sort_by(|&a, &b| {
            let region_a = self.directory.region(a).expect("Collected entry without region");
            let region_b = self.directory.region(b).expect("Collected entry without region");
            region_b
                .density
                .partial_cmp(&region_a.density)
                .expect("Invalid density")
                .then(region_a.code.cmp(&region_b.code))
                .then(region_a.level.cmp(&region_b.level))
        });

        for (rank, &id) in sorted.iter().enumerate() {
            if let Some(region) = self.directory.entry_mut(id).region.as_mut() {
                region.position = rank + 1;
            }
        }

        sorted
    }

    fn region_of(&self, id: EntryId) -> &GridRegion<T> {
        self.directory.region(id).expect("Entry without region")
    }

    /// Grows the dendrogram from the densest region: for every region
    /// already placed, its not-yet-placed neighbors are pulled in behind
    /// it, ordered by density and then by sorted rank.
    fn create_dendrogram(&self, sorted: &[EntryId]) -> Vec<EntryId> {
        let mut dendrogram = vec![sorted[0]];
        let mut remaining: Vec<EntryId> = sorted[1..].to_vec();

        let mut dendo_pos = 0;
        while !remaining.is_empty() {
            if dendo_pos == dendrogram.len() {
                // regions disconnected from every placed region seed a
                // fresh expansion front, densest first
                dendrogram.push(remaining.remove(0));
            }
            self.add_remaining(dendo_pos, &mut dendrogram, &mut remaining);
            dendo_pos += 1;
        }

        dendrogram
    }

    /// Pulls every remaining neighbor of `dendrogram[dendo_pos]` into the
    /// dendrogram. The insertion point starts right behind the anchor and
    /// advances past denser regions, then past equally dense regions of
    /// smaller rank.
    fn add_remaining(
        &self,
        dendo_pos: usize,
        dendrogram: &mut Vec<EntryId>,
        remaining: &mut Vec<EntryId>,
    ) {
        let anchor = dendrogram[dendo_pos];
        let mut start_search_pos = dendo_pos + 1;

        let mut i = 0;
        while i < remaining.len() {
            let candidate = remaining[i];
            if is_neighbor(
                self.region_of(anchor),
                self.region_of(candidate),
                self.dimensions,
                self.neighbor_condition,
            ) {
                let density = self.region_of(candidate).density;
                let position = self.region_of(candidate).position;

                let mut insert_pos = start_search_pos;
                while insert_pos < dendrogram.len()
                    && self.region_of(dendrogram[insert_pos]).density > density
                {
                    insert_pos += 1;
                }
                while insert_pos < dendrogram.len()
                    && self.region_of(dendrogram[insert_pos]).density == density
                    && self.region_of(dendrogram[insert_pos]).position < position
                {
                    insert_pos += 1;
                }

                dendrogram.insert(insert_pos, candidate);
                remaining.remove(i);
                start_search_pos += 1;
            } else {
                i += 1;
            }
        }
    }

    /// Cuts the dendrogram into clusters. The densest regions are kept
    /// until the configured percentage of the population is covered; each
    /// maximal run of kept regions in the dendrogram becomes one cluster.
    /// Clusters are sorted descending by population.
    fn create_clusters(&self, sorted: &[EntryId]) -> Vec<Cluster> {
        let clustered_goal = (self.cluster_percent * self.tuples_count + 50) / 100;

        let mut clustered_population = 0;
        let mut clustered_regions = 0;
        for &id in sorted {
            let population = self.region_of(id).population();
            let need = clustered_goal - clustered_population;
            if population < need {
                clustered_population += population;
                clustered_regions += 1;
            } else {
                // take the boundary region too if that lands closer to the goal
                if population - need <= need {
                    clustered_regions += 1;
                }
                break;
            }
        }

        let mut clusters = Vec::new();
        if clustered_regions == 0 {
            return clusters;
        }

        let mut cluster = Cluster::new();
        let mut added = 0;
        for &id in &self.dendrogram {
            if added == clustered_regions {
                break;
            }
            if self.region_of(id).position <= clustered_regions {
                cluster.regions.push(id);
                added += 1;
            } else if !cluster.regions.is_empty() {
                clusters.push(cluster);
                cluster = Cluster::new();
            }
        }
        if !cluster.regions.is_empty() {
            clusters.push(cluster);
        }

        for cluster in clusters.iter_mut() {
            cluster.population = cluster
                .regions
                .iter()
                .map(|&id| self.region_of(id).population())
                .sum();
        }
        clusters.sort_by(|a, b| b.population.cmp(&a.population));

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_bucket_model() -> BangFile<f64> {
        let params = BangFileParams::builder().bucketsize(4).build();
        BangFile::new(2, params).unwrap()
    }

    #[test]
    fn insert_keeps_tuples_in_order() {
        let tuples = [vec![0.1, 0.2], vec![0.2, 0.3], vec![0.3, 0.4]];

        let mut clusterer = small_bucket_model();
        for tuple in tuples.iter() {
            clusterer.insert(tuple.clone()).unwrap();
        }

        let root = clusterer.directory.root();
        let region = clusterer.directory.region(root).unwrap();
        assert_eq!(3, region.population());
        assert_eq!(tuples.to_vec(), region.tuples);
    }

    #[test]
    fn number_of_tuples_over_grid() {
        let mut clusterer = small_bucket_model();
        assert_eq!(0, clusterer.number_of_tuples());

        for x in 0..100 {
            for y in 0..100 {
                clusterer
                    .insert(vec![x as f64 / 100.0, y as f64 / 100.0])
                    .unwrap();
            }
        }
        assert_eq!(10_000, clusterer.number_of_tuples());
    }

    #[test]
    fn overflow_splits_into_buddies() {
        let mut clusterer = small_bucket_model();
        for x in [0.1, 0.2, 0.3, 0.4, 0.7, 0.8] {
            clusterer.insert(vec![x, 0.1]).unwrap();
        }

        let directory = &clusterer.directory;
        let root = directory.root();
        assert_eq!(4, directory.population(root));

        // the dense left half survives three levels down the left spine
        let left = directory.entry(root).left.unwrap();
        let left_left = directory.entry(left).left.unwrap();
        let left_left_left = directory.entry(left_left).left.unwrap();
        assert_eq!(2, directory.population(left_left_left));
    }

    #[test]
    fn populations_sum_to_tuple_count() {
        let mut clusterer = small_bucket_model();
        for x in 0..20 {
            for y in 0..20 {
                clusterer
                    .insert(vec![x as f64 / 20.0, y as f64 / 20.0])
                    .unwrap();
            }
        }

        let mut regions = Vec::new();
        clusterer.directory.collect_regions(&mut regions);
        let total: usize = regions
            .iter()
            .map(|&id| clusterer.directory.population(id))
            .sum();
        assert_eq!(clusterer.number_of_tuples(), total);
    }

    #[test]
    fn region_codes_fit_their_levels() {
        let mut clusterer = small_bucket_model();
        for x in 0..20 {
            for y in 0..20 {
                clusterer
                    .insert(vec![x as f64 / 20.0, y as f64 / 20.0])
                    .unwrap();
            }
        }

        let mut regions = Vec::new();
        clusterer.directory.collect_regions(&mut regions);
        for &id in &regions {
            let region = clusterer.directory.region(id).unwrap();
            assert!(region.code < 1 << region.level);
        }
    }

    #[test]
    fn no_entry_holds_region_beside_two_populated_children() {
        fn assert_no_conflict(clusterer: &BangFile<f64>, entry: usize) {
            let node = clusterer.directory.entry(entry);
            let left_populated = node
                .left
                .map_or(false, |left| clusterer.directory.region(left).is_some());
            let right_populated = node
                .right
                .map_or(false, |right| clusterer.directory.region(right).is_some());
            assert!(!(node.region.is_some() && left_populated && right_populated));
            if let Some(left) = node.left {
                assert_no_conflict(clusterer, left);
            }
            if let Some(right) = node.right {
                assert_no_conflict(clusterer, right);
            }
        }

        let mut clusterer = small_bucket_model();
        for x in 0..20 {
            for y in 0..20 {
                clusterer
                    .insert(vec![x as f64 / 20.0, y as f64 / 20.0])
                    .unwrap();
            }
        }
        assert_no_conflict(&clusterer, clusterer.directory.root());
    }

    #[test]
    fn density_pass_is_idempotent() {
        let mut clusterer = small_bucket_model();
        for x in [0.1, 0.2, 0.3, 0.4, 0.7, 0.8] {
            clusterer.insert(vec![x, 0.1]).unwrap();
        }

        clusterer.directory.calculate_density();
        let mut regions = Vec::new();
        clusterer.directory.collect_regions(&mut regions);
        let first: Vec<f64> = regions
            .iter()
            .map(|&id| clusterer.directory.region(id).unwrap().density)
            .collect();

        clusterer.directory.calculate_density();
        let second: Vec<f64> = regions
            .iter()
            .map(|&id| clusterer.directory.region(id).unwrap().density)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn find_region_walks_back_to_enclosing_region() {
        let mut clusterer = small_bucket_model();
        for x in [0.1, 0.2, 0.3, 0.4, 0.7, 0.8] {
            clusterer.insert(vec![x, 0.1]).unwrap();
        }

        // the right half of the square holds no region of its own, so the
        // lookup falls back to the root region
        let code = clusterer.coder.map_region(&[0.9, 0.9]);
        let entry = clusterer
            .find_region(code, clusterer.coder.total_levels())
            .unwrap();
        assert_eq!(clusterer.directory.root(), entry);
    }

    #[test]
    fn build_ranks_and_clusters_dense_regions() {
        let mut clusterer = small_bucket_model();
        for x in [0.1, 0.2, 0.3, 0.4, 0.7, 0.8] {
            clusterer.insert(vec![x, 0.1]).unwrap();
        }
        clusterer.build();

        // two regions: the level-3 cell holding {0.1, 0.2} at density 16,
        // and the root remainder at density 4/0.875
        assert_eq!(2, clusterer.dendrogram.len());
        let first = clusterer.region_of(clusterer.dendrogram[0]);
        assert_eq!(1, first.position);
        assert_eq!(16.0, first.density);

        assert_eq!(1, clusterer.number_of_clusters());
        assert_eq!(2, clusterer.clusters[0].population);

        assert_eq!(0, clusterer.cluster_of(&[0.1, 0.1]).unwrap());
        assert_eq!(-1, clusterer.cluster_of(&[0.9, 0.9]).unwrap());
    }
}
