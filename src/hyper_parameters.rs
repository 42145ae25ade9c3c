// Defaults for parameters
const BUCKETSIZE_DEFAULT: usize = 100;
const NEIGHBOR_MARGIN_DEFAULT: usize = 1;
const CLUSTER_PERCENT_DEFAULT: usize = 50;

/// A wrapper around the parameters used in BANG-file clustering.
/// Only use if you want to tune parameters. Otherwise use
/// `BangFile::default_params()` to instantiate the model with default
/// parameters.
pub struct BangFileParams {
    pub(crate) bucketsize: usize,
    pub(crate) neighbor_margin: usize,
    pub(crate) cluster_percent: usize,
}

/// Builder object to set custom parameters.
pub struct ParamsBuilder {
    bucketsize: Option<usize>,
    neighbor_margin: Option<usize>,
    cluster_percent: Option<usize>,
}

impl BangFileParams {
    pub(crate) fn default() -> Self {
        Self::builder().build()
    }

    /// Enters the builder pattern, allowing custom parameters to be set using
    /// various setter methods.
    ///
    /// # Returns
    /// * the parameter configuration builder
    pub fn builder() -> ParamsBuilder {
        ParamsBuilder {
            bucketsize: None,
            neighbor_margin: None,
            cluster_percent: None,
        }
    }
}

impl ParamsBuilder {
    /// Sets the bucketsize - the maximum number of tuples a single grid
    /// region holds before it is split into its two buddy regions. Smaller
    /// buckets give a finer grid and more regions to cluster.
    /// Must be at least 4. Defaults to 100.
    ///
    /// # Parameters
    /// * bucketsize - the maximum population of a region
    ///
    /// # Returns
    /// * the parameter configuration builder
    pub fn bucketsize(mut self, bucketsize: usize) -> ParamsBuilder {
        self.bucketsize = Some(bucketsize);
        self
    }

    /// Sets the neighbor margin used when testing whether two grid regions
    /// are neighbors. A margin of 1 requires regions to touch along an
    /// edge; larger margins loosen the test dimension by dimension.
    /// Must lie between 1 and the number of dimensions. Defaults to 1.
    ///
    /// # Parameters
    /// * neighbor_margin - the neighborhood margin
    ///
    /// # Returns
    /// * the parameter configuration builder
    pub fn neighbor_margin(mut self, neighbor_margin: usize) -> ParamsBuilder {
        self.neighbor_margin = Some(neighbor_margin);
        self
    }

    /// Sets the percentage of all inserted tuples that should end up inside
    /// clusters. The densest regions are kept until the target percentage
    /// of the population is covered; the remaining low-density regions are
    /// left unclustered. Must lie in range 0 to 100. Defaults to 50.
    ///
    /// # Parameters
    /// * cluster_percent - the percentage of tuples to cluster
    ///
    /// # Returns
    /// * the parameter configuration builder
    pub fn cluster_percent(mut self, cluster_percent: usize) -> ParamsBuilder {
        self.cluster_percent = Some(cluster_percent);
        self
    }

    /// Finishes the building of the parameter configuration. Range checks
    /// are performed against the dimensionality of the data when the
    /// configuration is passed to `BangFile::new`.
    ///
    /// # Returns
    /// * The completed BANG-file parameter configuration.
    pub fn build(self) -> BangFileParams {
        BangFileParams {
            bucketsize: self.bucketsize.unwrap_or(BUCKETSIZE_DEFAULT),
            neighbor_margin: self.neighbor_margin.unwrap_or(NEIGHBOR_MARGIN_DEFAULT),
            cluster_percent: self.cluster_percent.unwrap_or(CLUSTER_PERCENT_DEFAULT),
        }
    }
}
