//! Performance curves and the graph that groups them.

use thiserror::Error;

use crate::support::spline::MonotoneSpline;

/// One tabulated solution of a reach for a fixed discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    /// Depth at the downstream end.
    pub downstream: f64,

    /// Depth at the upstream end; above the crown it includes pressure head.
    pub upstream: f64,

    /// Water stored in the reach.
    pub volume: f64,

    /// Cumulative friction head loss along the reach.
    pub friction_loss: f64,
}

/// A value a performance graph can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    UpstreamDepth,
    Volume,
    FrictionLoss,
}

impl ProfilePoint {
    /// The value of `quantity` at this point.
    #[must_use]
    pub fn get(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::UpstreamDepth => self.upstream,
            Quantity::Volume => self.volume,
            Quantity::FrictionLoss => self.friction_loss,
        }
    }
}

/// Flow regime of a curve, read from its first point.
///
/// A steep curve starts with the upstream end held at or below the
/// downstream depth (inlet control); a mild or adverse curve starts with the
/// upstream depth above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveClass {
    Steep,
    Mild,
}

/// Errors raised when curves violate the graph invariants.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CurveError {
    #[error("curve {index} does not increase in flow magnitude (flow {flow})")]
    NonMonotonicFlow { index: usize, flow: f64 },

    #[error("curve {index} has flow {flow} of the wrong sign for its family")]
    WrongSign { index: usize, flow: f64 },
}

#[derive(Debug, Clone)]
struct CurveSplines {
    upstream: MonotoneSpline,
    volume: MonotoneSpline,
    friction_loss: MonotoneSpline,
}

impl CurveSplines {
    fn new(points: &[ProfilePoint]) -> Option<Self> {
        let xs: Vec<f64> = points.iter().map(|p| p.downstream).collect();
        let column = |quantity| -> Vec<f64> { points.iter().map(|p| p.get(quantity)).collect() };

        Some(Self {
            upstream: MonotoneSpline::new(&xs, &column(Quantity::UpstreamDepth)).ok()?,
            volume: MonotoneSpline::new(&xs, &column(Quantity::Volume)).ok()?,
            friction_loss: MonotoneSpline::new(&xs, &column(Quantity::FrictionLoss)).ok()?,
        })
    }

    fn get(&self, quantity: Quantity) -> &MonotoneSpline {
        match quantity {
            Quantity::UpstreamDepth => &self.upstream,
            Quantity::Volume => &self.volume,
            Quantity::FrictionLoss => &self.friction_loss,
        }
    }
}

/// The profile points of one discharge, ordered by downstream depth.
#[derive(Debug, Clone)]
pub struct Curve {
    flow: f64,
    points: Vec<ProfilePoint>,
    splines: Option<CurveSplines>,
}

impl Curve {
    /// Creates a curve and derives its interpolation splines.
    ///
    /// Curves with fewer than two points, or whose downstream depths do not
    /// strictly increase, are kept but marked degenerate.
    #[must_use]
    pub fn new(flow: f64, points: Vec<ProfilePoint>) -> Self {
        let splines = CurveSplines::new(&points);
        Self {
            flow,
            points,
            splines,
        }
    }

    /// Signed discharge of the curve.
    #[must_use]
    pub fn flow(&self) -> f64 {
        self.flow
    }

    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.flow.abs()
    }

    #[must_use]
    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    #[must_use]
    pub fn first(&self) -> Option<&ProfilePoint> {
        self.points.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ProfilePoint> {
        self.points.last()
    }

    /// Whether the curve lacks usable interpolation splines.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.splines.is_none()
    }

    /// Steep when the first point's downstream depth is not below its upstream depth.
    #[must_use]
    pub fn class(&self) -> Option<CurveClass> {
        self.first().map(|p| {
            if p.downstream >= p.upstream {
                CurveClass::Steep
            } else {
                CurveClass::Mild
            }
        })
    }

    /// Spline value within the tabulated range, held at the end values outside it.
    pub(crate) fn eval(&self, quantity: Quantity, depth: f64) -> Option<f64> {
        self.splines.as_ref().map(|s| s.get(quantity).eval(depth))
    }

    /// Like [`Curve::eval`], but continues past the last point along the final segment.
    pub(crate) fn extrapolate(&self, quantity: Quantity, depth: f64) -> Option<f64> {
        let spline = self.splines.as_ref()?.get(quantity);
        let (_, last) = spline.domain();
        if depth > last {
            Some(spline.extrapolate_last(depth))
        } else {
            Some(spline.eval(depth))
        }
    }
}

/// Curves of one flow direction, strictly increasing in flow magnitude.
#[derive(Debug, Clone, Default)]
pub struct Family {
    curves: Vec<Curve>,
}

impl Family {
    /// Creates a family from curves ordered by increasing flow magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NonMonotonicFlow`] if a curve's flow magnitude does
    /// not exceed its predecessor's.
    pub fn new(curves: Vec<Curve>) -> Result<Self, CurveError> {
        if let Some(index) = curves
            .windows(2)
            .position(|w| w[1].magnitude() <= w[0].magnitude())
        {
            return Err(CurveError::NonMonotonicFlow {
                index: index + 1,
                flow: curves[index + 1].flow(),
            });
        }
        Ok(Self { curves })
    }

    #[must_use]
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Smallest and largest tabulated flow magnitude.
    #[must_use]
    pub fn flow_range(&self) -> Option<(f64, f64)> {
        match (self.curves.first(), self.curves.last()) {
            (Some(first), Some(last)) => Some((first.magnitude(), last.magnitude())),
            _ => None,
        }
    }

    pub(crate) fn curve(&self, index: usize) -> Option<&Curve> {
        self.curves.get(index)
    }
}

/// Descriptive metadata stored with a performance graph.
///
/// Every field is optional; absent values are written as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HpgHeader {
    pub node_id: Option<String>,
    pub ds_invert: Option<f64>,
    pub us_invert: Option<f64>,
    pub ds_station: Option<f64>,
    pub us_station: Option<f64>,
    pub slope: Option<f64>,
    pub length: Option<f64>,
    pub roughness: Option<f64>,
    pub diameter: Option<f64>,
    pub max_depth_frac: Option<f64>,
}

impl HpgHeader {
    /// Stored slope, or one derived from the inverts and length.
    #[must_use]
    pub fn resolved_slope(&self) -> Option<f64> {
        self.slope.or_else(|| match (self.us_invert, self.ds_invert, self.length) {
            (Some(us), Some(ds), Some(length)) if length > 0.0 => Some((us - ds) / length),
            _ => None,
        })
    }
}

/// Hydraulic Performance Graph of one conduit.
///
/// Holds the forward family (positive flows) and the adverse family
/// (negative flows, read with the conduit's upstream end as the control end).
/// Read-only once constructed.
#[derive(Debug, Clone, Default)]
pub struct Hpg {
    header: HpgHeader,
    forward: Family,
    adverse: Family,
}

impl Hpg {
    /// Assembles a graph from its families.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::WrongSign`] if a forward curve has a negative flow
    /// or an adverse curve a non-negative one.
    pub fn new(header: HpgHeader, forward: Family, adverse: Family) -> Result<Self, CurveError> {
        if let Some(index) = forward.curves().iter().position(|c| c.flow() < 0.0) {
            return Err(CurveError::WrongSign {
                index,
                flow: forward.curves()[index].flow(),
            });
        }
        if let Some(index) = adverse.curves().iter().position(|c| c.flow() >= 0.0) {
            return Err(CurveError::WrongSign {
                index,
                flow: adverse.curves()[index].flow(),
            });
        }
        Ok(Self {
            header,
            forward,
            adverse,
        })
    }

    #[must_use]
    pub fn header(&self) -> &HpgHeader {
        &self.header
    }

    #[must_use]
    pub fn forward(&self) -> &Family {
        &self.forward
    }

    #[must_use]
    pub fn adverse(&self) -> &Family {
        &self.adverse
    }

    /// The family serving flows of the sign of `flow`.
    #[must_use]
    pub fn family_for(&self, flow: f64) -> &Family {
        if flow < 0.0 {
            &self.adverse
        } else {
            &self.forward
        }
    }

    /// Tabulated flow-magnitude range for flows of the sign of `flow`.
    #[must_use]
    pub fn valid_range(&self, flow: f64) -> Option<(f64, f64)> {
        self.family_for(flow).flow_range()
    }

    /// Smallest tabulated flow magnitude for flows of the sign of `flow`.
    #[must_use]
    pub fn low_flow_threshold(&self, flow: f64) -> Option<f64> {
        self.valid_range(flow).map(|(low, _)| low)
    }

    /// Total number of curves in both families.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.forward.len() + self.adverse.len()
    }
}
