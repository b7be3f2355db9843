//! Water-surface profiles through one reach by the standard-step method.
//!
//! The reach is split into equal segments. Starting from a known depth at
//! the control end, each new station's depth solves the energy balance
//!
//! ```text
//! E2 − E1 − s · ½(Sf1 + Sf2) · Δx = 0,   E = z + y + V²/2g
//! ```
//!
//! by Newton iteration, where `s` is `+1` when marching upstream and `−1`
//! when marching downstream.

mod config;
mod error;
mod station;

pub use config::ProfileConfig;
pub use error::ProfileError;

use log::warn;

use super::{
    CharacteristicDepths, ProfilePoint, Reach, critical_depth, depth::ZERO_FLOW, normal_depth,
};

use station::{Regime, Station};

/// Fractional distance from critical depth within which the first Newton
/// guess is pushed toward the marching regime.
const NEAR_CRITICAL: f64 = 0.01;

/// Size of that push.
const CRITICAL_NUDGE: f64 = 0.05;

/// Froude tolerance of the regime guard.
const FROUDE_TOL: f64 = 1e-6;

/// March direction, which also fixes the flow regime being traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Subcritical: boundary at the downstream end, march upstream.
    Upstream,
    /// Supercritical: boundary at the upstream end, march downstream.
    Downstream,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::Upstream => 1.0,
            Self::Downstream => -1.0,
        }
    }
}

/// One profile to trace through a reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileRequest {
    /// Signed discharge.
    pub flow: f64,

    /// Known depth at the control end.
    pub boundary_depth: f64,

    pub direction: Direction,

    /// Depth the profile may not exceed.
    pub ceiling: Option<f64>,
}

impl ProfileRequest {
    /// A subcritical profile traced upstream from `boundary_depth`.
    #[must_use]
    pub fn upstream(flow: f64, boundary_depth: f64) -> Self {
        Self {
            flow,
            boundary_depth,
            direction: Direction::Upstream,
            ceiling: None,
        }
    }

    /// A supercritical profile traced downstream from `boundary_depth`.
    #[must_use]
    pub fn downstream(flow: f64, boundary_depth: f64) -> Self {
        Self {
            direction: Direction::Downstream,
            ..Self::upstream(flow, boundary_depth)
        }
    }

    #[must_use]
    pub fn with_ceiling(self, ceiling: f64) -> Self {
        Self {
            ceiling: Some(ceiling),
            ..self
        }
    }
}

/// Outcome of a profile: the state at the far end and integrals along the reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileResult {
    /// Depth at the end opposite the boundary.
    pub depth: f64,

    /// Water stored in the reach.
    pub volume: f64,

    /// Cumulative friction head loss.
    pub friction_loss: f64,

    /// Mean velocity at the far end.
    pub velocity: f64,

    /// Friction slope at the far end.
    pub friction_slope: f64,

    /// Whether the far end runs full.
    pub pressurized: bool,
}

/// Traces one profile through `reach`.
///
/// A flow below `1e-6` in magnitude is treated as still water: the surface
/// stays level, so the far depth is the boundary depth shifted by the bed
/// drop, never below zero.
///
/// # Errors
///
/// Returns a [`ProfileError`] naming why the march stopped.
pub fn solve_profile(
    reach: &Reach,
    request: &ProfileRequest,
    config: &ProfileConfig,
) -> Result<ProfileResult, ProfileError> {
    if request.flow.abs() < ZERO_FLOW {
        return level_pool(reach, request.boundary_depth, request.direction, config);
    }

    let marcher = Marcher::new(reach, request, config)?;
    let stations = marcher.march(request.boundary_depth).into_result()?;
    Ok(summarize(&stations, marcher.dx))
}

/// Solves a reach for a discharge and a downstream depth, allowing a hydraulic jump.
///
/// The downstream boundary is raised to critical depth if needed, and a
/// subcritical profile is traced upstream. If that fails on a steep reach,
/// a supercritical profile is traced down from critical depth at the inlet
/// and joined to the subcritical one where it stopped; the inlet then sits at
/// critical depth.
///
/// # Errors
///
/// Returns a [`ProfileError`] when neither profile reaches the far end.
pub fn solve_combined(
    reach: &Reach,
    flow: f64,
    downstream_depth: f64,
    ceiling: Option<f64>,
    config: &ProfileConfig,
) -> Result<ProfilePoint, ProfileError> {
    if flow.abs() < ZERO_FLOW {
        let pool = level_pool(reach, downstream_depth, Direction::Upstream, config)?;
        return Ok(ProfilePoint {
            downstream: downstream_depth,
            upstream: pool.depth,
            volume: pool.volume,
            friction_loss: 0.0,
        });
    }

    let critical = critical_depth(reach, flow)?;
    let boundary = downstream_depth.max(critical);

    let request = ProfileRequest {
        flow,
        boundary_depth: boundary,
        direction: Direction::Upstream,
        ceiling,
    };
    let marcher = Marcher::new(reach, &request, config)?;
    let subcritical = marcher.march(boundary);

    let Some(stop) = subcritical.stop else {
        let result = summarize(&subcritical.stations, marcher.dx);
        return Ok(ProfilePoint {
            downstream: boundary,
            upstream: result.depth,
            volume: result.volume,
            friction_loss: result.friction_loss,
        });
    };

    let depths = CharacteristicDepths {
        critical,
        normal: normal_depth(reach, flow)?,
    };
    if !depths.is_steep() || !stop.allows_jump() {
        return Err(stop);
    }

    let request = ProfileRequest {
        direction: Direction::Downstream,
        ..request
    };
    let supercritical = Marcher::new(reach, &request, config)?
        .march(critical)
        .into_result()?;

    // Station k counts from the outlet; the supercritical march counts from the inlet.
    let steps = config.steps;
    let joined: Vec<Station> = (0..=steps)
        .map(|k| {
            subcritical
                .stations
                .get(k)
                .copied()
                .unwrap_or(supercritical[steps - k])
        })
        .collect();
    let result = summarize(&joined, marcher.dx);

    Ok(ProfilePoint {
        downstream: boundary,
        upstream: critical,
        volume: result.volume,
        friction_loss: result.friction_loss,
    })
}

/// Still water: a level surface with no friction loss.
fn level_pool(
    reach: &Reach,
    boundary_depth: f64,
    direction: Direction,
    config: &ProfileConfig,
) -> Result<ProfileResult, ProfileError> {
    if config.steps == 0 {
        return Err(ProfileError::NoSteps);
    }

    let dx = reach.length() / config.steps as f64;
    let drop = reach.slope() * dx * direction.sign();
    let depth_at = |i: usize| (boundary_depth - drop * i as f64).max(0.0);

    let section = reach.section();
    let volume: f64 = (0..config.steps)
        .map(|i| 0.5 * (section.area(depth_at(i)) + section.area(depth_at(i + 1))) * dx)
        .sum();

    let depth = depth_at(config.steps);
    Ok(ProfileResult {
        depth,
        volume,
        friction_loss: 0.0,
        velocity: 0.0,
        friction_slope: reach.slope(),
        pressurized: depth >= reach.max_depth() && reach.max_depth() > 0.0,
    })
}

/// Trapezoidal integrals over accepted stations and the far-end state.
fn summarize(stations: &[Station], dx: f64) -> ProfileResult {
    let (volume, friction_loss) = stations.windows(2).fold((0.0, 0.0), |(v, f), w| {
        (
            v + 0.5 * (w[0].area + w[1].area) * dx,
            f + 0.5 * (w[0].friction_slope + w[1].friction_slope) * dx,
        )
    });

    let last = stations[stations.len() - 1];
    ProfileResult {
        depth: last.depth,
        volume,
        friction_loss,
        velocity: last.velocity,
        friction_slope: last.friction_slope,
        pressurized: last.regime == Regime::Pressurized,
    }
}

/// Stations accepted by a march and the reason it stopped early, if any.
struct March {
    stations: Vec<Station>,
    stop: Option<ProfileError>,
}

impl March {
    fn into_result(self) -> Result<Vec<Station>, ProfileError> {
        match self.stop {
            Some(err) => Err(err),
            None => Ok(self.stations),
        }
    }
}

/// Per-call state of one profile march.
struct Marcher<'a> {
    reach: &'a Reach,
    flow: f64,
    direction: Direction,
    ceiling: Option<f64>,
    config: &'a ProfileConfig,
    critical: f64,
    dx: f64,
    start_elevation: f64,
    rise: f64,
}

impl<'a> Marcher<'a> {
    fn new(
        reach: &'a Reach,
        request: &ProfileRequest,
        config: &'a ProfileConfig,
    ) -> Result<Self, ProfileError> {
        if config.steps == 0 {
            return Err(ProfileError::NoSteps);
        }
        if reach.max_depth() <= 0.0 {
            return Err(ProfileError::ZeroArea {
                depth: request.boundary_depth,
            });
        }

        let dx = reach.length() / config.steps as f64;
        let (start_elevation, rise) = match request.direction {
            Direction::Upstream => (reach.ds_invert(), reach.slope() * dx),
            Direction::Downstream => (reach.us_invert(), -reach.slope() * dx),
        };

        Ok(Self {
            reach,
            flow: request.flow,
            direction: request.direction,
            ceiling: request.ceiling,
            config,
            critical: critical_depth(reach, request.flow)?,
            dx,
            start_elevation,
            rise,
        })
    }

    fn evaluate(&self, index: usize, depth: f64) -> Result<Station, ProfileError> {
        let elevation = self.start_elevation + self.rise * index as f64;
        Station::evaluate(self.reach, self.flow, depth, elevation, index)
    }

    /// Marches from `boundary` across every segment, stopping at the first failure.
    ///
    /// A station that flips regime relative to its predecessor sends the march
    /// back one index to re-solve the predecessor from the flipped depth; each
    /// station triggers this at most once.
    fn march(&self, boundary: f64) -> March {
        let steps = self.config.steps;
        let mut stations = Vec::with_capacity(steps + 1);
        let mut retried = vec![false; steps + 1];

        match self.evaluate(0, boundary) {
            Ok(first) => stations.push(first),
            Err(err) => {
                return March {
                    stations,
                    stop: Some(err),
                };
            }
        }

        let mut index = 1;
        while index <= steps {
            let previous = stations[index - 1];
            let guess = self.initial_guess(previous.depth);
            let station = match self.step(&previous, index, guess) {
                Ok(station) => station,
                Err(err) => {
                    return March {
                        stations,
                        stop: Some(err),
                    };
                }
            };

            if station.flipped_from(&previous) && index >= 2 && !retried[index] {
                retried[index] = true;
                let before = stations[index - 2];
                match self.step(&before, index - 1, station.depth) {
                    Ok(redone) => stations[index - 1] = redone,
                    Err(err) => {
                        stations.truncate(index - 1);
                        return March {
                            stations,
                            stop: Some(err),
                        };
                    }
                }
                continue;
            }

            stations.push(station);
            index += 1;
        }

        March {
            stations,
            stop: None,
        }
    }

    /// Starts Newton off critical depth, where the energy derivative vanishes.
    fn initial_guess(&self, previous: f64) -> f64 {
        if (previous - self.critical).abs() < NEAR_CRITICAL * self.critical {
            match self.direction {
                Direction::Upstream => previous * (1.0 + CRITICAL_NUDGE),
                Direction::Downstream => previous * (1.0 - CRITICAL_NUDGE),
            }
        } else {
            previous
        }
    }

    /// Solves station `index` from its neighbour `previous` and applies the guards.
    fn step(&self, previous: &Station, index: usize, guess: f64) -> Result<Station, ProfileError> {
        let station = self.newton(previous, index, guess)?;

        if station.regime == Regime::Free {
            let supercritical = station.froude_squared > 1.0 + FROUDE_TOL;
            let subcritical = station.froude_squared < 1.0 - FROUDE_TOL;
            let turned = match self.direction {
                Direction::Upstream => supercritical,
                Direction::Downstream => subcritical,
            };
            if turned {
                return Err(ProfileError::AtMinDepth { station: index });
            }
        }

        if self.ceiling.is_some_and(|ceiling| station.depth > ceiling) {
            return Err(ProfileError::AtMaxDepth {
                station: index,
                depth: station.depth,
            });
        }

        Ok(station)
    }

    fn newton(&self, previous: &Station, index: usize, guess: f64) -> Result<Station, ProfileError> {
        let sign = self.direction.sign();
        let mut depth = guess;

        for _ in 0..self.config.max_iters {
            let trial = self.evaluate(index, depth)?;
            let residual = trial.energy
                - previous.energy
                - sign * 0.5 * (previous.friction_slope + trial.friction_slope) * self.dx;
            let derivative = trial.d_energy - sign * 0.5 * self.dx * trial.d_friction;
            if derivative == 0.0 || !derivative.is_finite() {
                return Err(ProfileError::Divergence { station: index });
            }

            let mut next = depth - residual / derivative;
            if !next.is_finite() {
                return Err(ProfileError::Imaginary { station: index });
            }
            if next <= 0.0 {
                next = 0.5 * depth;
            }

            if (next - depth).abs() <= self.config.depth_rel_tol * next.abs().max(1e-12) {
                return self.evaluate(index, next);
            }
            depth = next;
        }

        let fallback = normal_depth(self.reach, self.flow)?;
        warn!(
            "newton iteration cap reached at station {index}; using normal depth {fallback}"
        );
        self.evaluate(index, fallback)
    }
}
