/// Discretization and Newton settings for a standard-step profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileConfig {
    /// Number of segments the reach is divided into.
    pub steps: usize,

    /// Newton iteration cap per station before falling back to normal depth.
    pub max_iters: usize,

    /// Relative depth change accepted as converged.
    pub depth_rel_tol: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            max_iters: 100,
            depth_rel_tol: 1e-4,
        }
    }
}

impl ProfileConfig {
    /// Default settings with `steps` segments.
    #[must_use]
    pub fn with_steps(steps: usize) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }
}
