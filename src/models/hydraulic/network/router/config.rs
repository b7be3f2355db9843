use crate::models::hydraulic::hpg::core::ProfileConfig;

/// Settings for a steady-state routing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterConfig {
    /// Flows below this multiple of a graph's smallest tabulated flow are
    /// raised to it before lookup.
    pub low_flow_factor: f64,

    /// Flow magnitudes below this carry no water and pond instead.
    pub zero_flow: f64,

    /// Discretization of ponded (still-water) profiles.
    pub ponding: ProfileConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            low_flow_factor: 1.05,
            zero_flow: 1e-6,
            ponding: ProfileConfig::default(),
        }
    }
}
