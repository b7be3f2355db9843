use crate::{
    models::hydraulic::hpg::core::ProfileConfig,
    support::constraint::{Constrained, NonNegative, UnitIntervalLowerOpen},
};

/// Settings for sampling a conduit into a performance graph.
#[derive(Debug, Clone, Copy)]
pub struct BuilderConfig {
    /// Number of discharges sampled per family.
    pub curves: usize,

    /// Profile discretization used for every sampled point.
    pub profile: ProfileConfig,

    /// Downstream depths sampled per curve and pass.
    pub depth_samples: usize,

    /// A curve needs more points than this to be kept.
    pub min_points: usize,

    /// Top of the free-surface pass as a fraction of full depth.
    pub max_depth_frac: Constrained<f64, UnitIntervalLowerOpen>,

    /// Head above the crown covered by an optional pressurized pass.
    pub pressurized_height: Option<Constrained<f64, NonNegative>>,

    /// Smallest sampled discharge as a fraction of the largest.
    pub min_flow_fraction: f64,

    /// Iteration cap for each stage of the max-flow search.
    pub max_flow_iters: usize,

    /// Bracket width at which the max-flow search stops.
    pub max_flow_tol: f64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            curves: 20,
            profile: ProfileConfig::default(),
            depth_samples: 20,
            min_points: 3,
            max_depth_frac: Constrained::new_unchecked(0.95),
            pressurized_height: None,
            min_flow_fraction: 1e-3,
            max_flow_iters: 50,
            max_flow_tol: 1.0,
        }
    }
}
