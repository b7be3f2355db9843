//! Steady-state backwater routing.
//!
//! One pass starts at a sink node with a known control depth and walks the
//! network upstream with an explicit worklist. Each link draining into the
//! current node gets its downstream depth from that node's head, and its
//! upstream depth, volume and friction loss from its performance graph (or
//! from a level pool when it carries no flow). The upstream node then takes
//! the highest head offered by the links it feeds, and is routed further only
//! once all of those links are resolved.
//!
//! A link with negative flow is entered at its outlet end: the depth at its
//! downstream node is the depth water leaves from, and the depth at its
//! upstream node is found by inverting the graph's adverse family.

mod config;
mod error;

pub use config::RouterConfig;
pub use error::RouteError;

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, trace};
use twine_core::Model;

use crate::models::hydraulic::hpg::{
    ConduitQuery, HpgModel,
    core::{
        DepthError, Hpg, ProfileRequest, bracketed_root, critical_depth, solve_profile,
    },
};

use super::{JunctionContext, JunctionLoss, LinkId, LinkState, Network, NodeId};

/// Known conditions at the sink node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Water depth at the sink (reservoir or receiving water).
    pub depth: f64,

    /// Flow leaving through the sink; zero means a closed outlet.
    pub flow: f64,
}

/// Counts from one routing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteSummary {
    pub nodes_visited: usize,
    pub links_visited: usize,

    /// Water stored in all links.
    pub total_volume: f64,
}

impl Network {
    /// Routes one steady-state pass from `sink` upstream.
    ///
    /// Node depths and link states are overwritten; link flows are inputs and
    /// are kept. On failure the message is also kept for [`Network::last_error`].
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] naming the link or node where the pass stopped.
    pub fn route(
        &mut self,
        sink: NodeId,
        boundary: Boundary,
        config: &RouterConfig,
        junctions: &dyn JunctionLoss,
    ) -> Result<RouteSummary, RouteError> {
        let result = self.route_pass(sink, boundary, config, junctions);
        self.set_last_error(result.as_ref().err().map(ToString::to_string));
        result
    }

    fn route_pass(
        &mut self,
        sink: NodeId,
        boundary: Boundary,
        config: &RouterConfig,
        junctions: &dyn JunctionLoss,
    ) -> Result<RouteSummary, RouteError> {
        if self.node(sink).is_err() {
            return Err(RouteError::UnknownSink {
                index: sink.index(),
            });
        }
        self.reset_results();
        self.node_mut(sink)?.set_depth(boundary.depth.max(0.0));

        let mut pending = self.pending_outflows(sink)?;
        let mut expanded = HashSet::new();
        let mut offered = BTreeSet::new();
        let mut worklist = vec![sink];
        let mut summary = RouteSummary::default();

        while let Some(id) = worklist.pop().or_else(|| release(&offered, &pending)) {
            offered.remove(&id);
            expanded.insert(id);
            summary.nodes_visited += 1;
            if id != sink && self.is_junction(id)? {
                self.correct_junction(id, junctions)?;
            }

            let head = self.node(id)?.head();
            let inflows = self.node(id)?.inflows().to_vec();
            for link in inflows {
                let outlet = (id == sink).then_some(boundary);
                let (upstream, offered_head) = self.resolve_link(link, head, outlet, config)?;
                summary.links_visited += 1;

                // Only a loop reaches a node that has already been routed.
                if expanded.contains(&upstream) || worklist.contains(&upstream) {
                    continue;
                }
                let node = self.node_mut(upstream)?;
                let depth = (offered_head - node.invert()).max(0.0);
                node.set_depth(node.depth().max(depth));

                let left = pending.entry(upstream).or_default();
                *left = left.saturating_sub(1);
                if *left == 0 {
                    offered.remove(&upstream);
                    worklist.push(upstream);
                } else {
                    offered.insert(upstream);
                }
            }
        }

        summary.total_volume = self.total_volume();
        debug!(
            "routed {} nodes and {} links, stored volume {}",
            summary.nodes_visited, summary.links_visited, summary.total_volume
        );
        Ok(summary)
    }

    /// Resolves one link from the head of its downstream node.
    ///
    /// Returns the link's upstream node and the head it offers there.
    fn resolve_link(
        &mut self,
        id: LinkId,
        downstream_head: f64,
        outlet: Option<Boundary>,
        config: &RouterConfig,
    ) -> Result<(NodeId, f64), RouteError> {
        let link = self.link(id)?;
        let reach = link.reach();
        let flow = link.state().flow;
        let flowing = flow.abs() >= config.zero_flow;

        let mut downstream_depth = (downstream_head - reach.ds_invert()).max(0.0);
        let open_outlet = outlet.is_some_and(|boundary| boundary.flow.abs() >= config.zero_flow);
        if open_outlet && flow >= config.zero_flow {
            let critical = critical_depth(reach, flow).map_err(|source| RouteError::Outlet {
                link: link.name().to_string(),
                flow,
                source,
            })?;
            downstream_depth = downstream_depth.max(critical);
        }

        let state = if flowing {
            let hpg = link.hpg().ok_or_else(|| RouteError::MissingHpg {
                link: link.name().to_string(),
            })?;
            let flow_in_table = nudged_flow(hpg, flow, config.low_flow_factor);
            let model = HpgModel::new(hpg);
            let lookup = |query: ConduitQuery| {
                model.call(&query).map_err(|source| RouteError::Lookup {
                    link: link.name().to_string(),
                    downstream_depth: query.downstream_depth,
                    flow,
                    source,
                })
            };

            if flow > 0.0 {
                let conduit = lookup(ConduitQuery {
                    flow: flow_in_table,
                    downstream_depth,
                })?;
                LinkState {
                    flow,
                    downstream_depth,
                    upstream_depth: conduit.upstream_depth,
                    volume: conduit.volume,
                    friction_loss: conduit.friction_loss,
                }
            } else {
                // The adverse family runs from the upstream end (its outlet)
                // to the downstream end, so solve for the outlet depth.
                let entry_depth = downstream_depth;
                lookup(ConduitQuery {
                    flow: flow_in_table,
                    downstream_depth: entry_depth,
                })?;
                let rise = (reach.us_invert() - reach.ds_invert()).abs();
                let exit = exit_depth(hpg, flow_in_table, entry_depth, rise + reach.max_depth())
                    .map_err(|source| RouteError::Reverse {
                        link: link.name().to_string(),
                        entry_depth,
                        flow,
                        source,
                    })?;
                let conduit = lookup(ConduitQuery {
                    flow: flow_in_table,
                    downstream_depth: exit,
                })?;
                LinkState {
                    flow,
                    downstream_depth: entry_depth,
                    upstream_depth: exit,
                    volume: conduit.volume,
                    friction_loss: conduit.friction_loss,
                }
            }
        } else {
            let pool = solve_profile(
                reach,
                &ProfileRequest::upstream(0.0, downstream_depth),
                &config.ponding,
            )
            .map_err(|source| RouteError::Ponding {
                link: link.name().to_string(),
                downstream_depth,
                source,
            })?;
            LinkState {
                flow,
                downstream_depth,
                upstream_depth: pool.depth,
                volume: pool.volume,
                friction_loss: 0.0,
            }
        };

        trace!(
            "link {}: flow {flow}, depths {downstream_depth} -> {}",
            link.name(),
            state.upstream_depth
        );

        let upstream = link.upstream();
        let offered_head = reach.us_invert() + state.upstream_depth;
        *self.link_mut(id)?.state_mut() = state;
        Ok((upstream, offered_head))
    }

    /// Counts, for every node that drains to `sink`, the outgoing links whose
    /// far end also drains to `sink`. A node is routed once all of them are.
    fn pending_outflows(&self, sink: NodeId) -> Result<HashMap<NodeId, usize>, RouteError> {
        let mut reachable = HashSet::from([sink]);
        let mut stack = vec![sink];
        while let Some(id) = stack.pop() {
            for &link in self.node(id)?.inflows() {
                let upstream = self.link(link)?.upstream();
                if reachable.insert(upstream) {
                    stack.push(upstream);
                }
            }
        }

        let mut pending = HashMap::new();
        for &id in &reachable {
            let mut count = 0;
            for &link in self.node(id)?.outflows() {
                if reachable.contains(&self.link(link)?.downstream()) {
                    count += 1;
                }
            }
            pending.insert(id, count);
        }
        Ok(pending)
    }

    /// Merging flows or a change of conduit size.
    fn is_junction(&self, id: NodeId) -> Result<bool, RouteError> {
        let node = self.node(id)?;
        if node.inflows().len() >= 2 {
            return Ok(true);
        }

        let mut sizes = Vec::new();
        for link in node.inflows().iter().chain(node.outflows()) {
            sizes.push(self.link(*link)?.reach().max_depth());
        }
        Ok(sizes.windows(2).any(|w| w[0] != w[1]))
    }

    fn correct_junction(
        &mut self,
        id: NodeId,
        junctions: &dyn JunctionLoss,
    ) -> Result<(), RouteError> {
        let node = self.node(id)?;
        let junction = JunctionContext {
            id,
            node,
            depth: node.depth(),
            inflows: node
                .inflows()
                .iter()
                .map(|&l| self.link(l))
                .collect::<Result<_, _>>()?,
            outflows: node
                .outflows()
                .iter()
                .map(|&l| self.link(l))
                .collect::<Result<_, _>>()?,
        };
        let depth = junctions
            .correct(&junction)
            .map_err(|source| RouteError::Junction {
                node: node.name().to_string(),
                source,
            })?;

        self.node_mut(id)?.set_depth(depth);
        Ok(())
    }
}

/// Picks the next node to route when every ready node is done.
///
/// The worklist only runs dry before all offered nodes are routed when the
/// network has a loop; the node with the fewest unresolved outflows goes first.
fn release(offered: &BTreeSet<NodeId>, pending: &HashMap<NodeId, usize>) -> Option<NodeId> {
    offered
        .iter()
        .copied()
        .min_by_key(|id| pending.get(id).copied().unwrap_or_default())
}

/// Depth at the outlet end of a reverse-flow link whose adverse lookup gives
/// `entry_depth` at the inlet end.
///
/// The outlet depth is searched up to `entry_depth + headroom`. When even an
/// empty outlet backs water up past `entry_depth`, the outlet runs free and
/// the depth there is zero.
fn exit_depth(hpg: &Hpg, flow: f64, entry_depth: f64, headroom: f64) -> Result<f64, DepthError> {
    let upper = entry_depth + headroom;
    let residual = |depth: f64| {
        hpg.upstream_depth(flow, depth)
            .map_or(f64::NAN, |entry| entry - entry_depth)
    };
    bracketed_root(residual, 0.0, upper, upper)
}

/// Raises flows below the graph's tabulated range to just inside it.
fn nudged_flow(hpg: &Hpg, flow: f64, factor: f64) -> f64 {
    match hpg.valid_range(flow) {
        Some((low, high)) if flow.abs() < factor * low => flow.signum() * (factor * low).min(high),
        _ => flow,
    }
}
