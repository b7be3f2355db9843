use std::sync::Arc;

use thiserror::Error;

use crate::models::hydraulic::hpg::core::{Hpg, Reach};

/// Index of a node within its [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

/// Index of a link within its [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(super) usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl LinkId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised while assembling a network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("no node with index {index}")]
    UnknownNode { index: usize },

    #[error("no link with index {index}")]
    UnknownLink { index: usize },

    #[error("node `{name}` already exists")]
    DuplicateNode { name: String },

    #[error("link `{name}` already exists")]
    DuplicateLink { name: String },

    #[error("link `{name}` already has a performance graph")]
    DuplicateHpg { name: String },
}

/// A junction, manhole or outfall.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    invert: f64,
    depth: f64,
    inflows: Vec<LinkId>,
    outflows: Vec<LinkId>,
}

impl Node {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn invert(&self) -> f64 {
        self.invert
    }

    /// Water depth from the last routing pass.
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Water-surface elevation.
    #[must_use]
    pub fn head(&self) -> f64 {
        self.invert + self.depth
    }

    /// Links draining into this node.
    #[must_use]
    pub fn inflows(&self) -> &[LinkId] {
        &self.inflows
    }

    /// Links leaving this node.
    #[must_use]
    pub fn outflows(&self) -> &[LinkId] {
        &self.outflows
    }

    pub(super) fn set_depth(&mut self, depth: f64) {
        self.depth = depth;
    }
}

/// Per-pass hydraulic state of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinkState {
    /// Signed flow, positive from the upstream node to the downstream node.
    pub flow: f64,
    pub downstream_depth: f64,
    pub upstream_depth: f64,
    pub volume: f64,
    pub friction_loss: f64,
}

/// A conduit joining two nodes.
#[derive(Debug, Clone)]
pub struct Link {
    name: String,
    upstream: NodeId,
    downstream: NodeId,
    reach: Reach,
    hpg: Option<Arc<Hpg>>,
    state: LinkState,
}

impl Link {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn upstream(&self) -> NodeId {
        self.upstream
    }

    #[must_use]
    pub fn downstream(&self) -> NodeId {
        self.downstream
    }

    #[must_use]
    pub fn reach(&self) -> &Reach {
        &self.reach
    }

    #[must_use]
    pub fn hpg(&self) -> Option<&Arc<Hpg>> {
        self.hpg.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub(super) fn state_mut(&mut self) -> &mut LinkState {
        &mut self.state
    }
}

/// Directed graph of nodes and conduits.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,
    last_error: Option<String>,
}

impl Network {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node with bottom elevation `invert`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateNode`] if the name is taken.
    pub fn add_node(&mut self, name: impl Into<String>, invert: f64) -> Result<NodeId, NetworkError> {
        let name = name.into();
        if self.find_node(&name).is_some() {
            return Err(NetworkError::DuplicateNode { name });
        }

        self.nodes.push(Node {
            name,
            invert,
            depth: 0.0,
            inflows: Vec::new(),
            outflows: Vec::new(),
        });
        Ok(NodeId(self.nodes.len() - 1))
    }

    /// Adds a conduit draining `upstream` into `downstream`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] if either node is unknown or the name is taken.
    pub fn add_link(
        &mut self,
        name: impl Into<String>,
        upstream: NodeId,
        downstream: NodeId,
        reach: Reach,
    ) -> Result<LinkId, NetworkError> {
        let name = name.into();
        self.node(upstream)?;
        self.node(downstream)?;
        if self.links.iter().any(|link| link.name == name) {
            return Err(NetworkError::DuplicateLink { name });
        }

        let id = LinkId(self.links.len());
        self.links.push(Link {
            name,
            upstream,
            downstream,
            reach,
            hpg: None,
            state: LinkState::default(),
        });
        self.nodes[upstream.0].outflows.push(id);
        self.nodes[downstream.0].inflows.push(id);
        Ok(id)
    }

    /// Attaches the performance graph used to route `link`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateHpg`] if the link already has one.
    pub fn attach_hpg(&mut self, link: LinkId, hpg: Arc<Hpg>) -> Result<(), NetworkError> {
        let link = self.link_mut(link)?;
        if link.hpg.is_some() {
            return Err(NetworkError::DuplicateHpg {
                name: link.name.clone(),
            });
        }
        link.hpg = Some(hpg);
        Ok(())
    }

    /// Sets the flow a link carries in the next routing pass.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownLink`] if the link does not exist.
    pub fn set_flow(&mut self, link: LinkId, flow: f64) -> Result<(), NetworkError> {
        self.link_mut(link)?.state.flow = flow;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if the node does not exist.
    pub fn node(&self, id: NodeId) -> Result<&Node, NetworkError> {
        self.nodes
            .get(id.0)
            .ok_or(NetworkError::UnknownNode { index: id.0 })
    }

    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownLink`] if the link does not exist.
    pub fn link(&self, id: LinkId) -> Result<&Link, NetworkError> {
        self.links
            .get(id.0)
            .ok_or(NetworkError::UnknownLink { index: id.0 })
    }

    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    #[must_use]
    pub fn find_link(&self, name: &str) -> Option<LinkId> {
        self.links.iter().position(|l| l.name == name).map(LinkId)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter().enumerate().map(|(i, l)| (LinkId(i), l))
    }

    /// Water stored in all links after the last routing pass.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.links.iter().map(|l| l.state.volume).sum()
    }

    /// Message of the last failed routing pass, cleared by a successful one.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Clears node depths and link results, keeping link flows.
    pub(super) fn reset_results(&mut self) {
        for node in &mut self.nodes {
            node.depth = 0.0;
        }
        for link in &mut self.links {
            link.state = LinkState {
                flow: link.state.flow,
                ..LinkState::default()
            };
        }
    }

    pub(super) fn set_last_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, NetworkError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(NetworkError::UnknownNode { index: id.0 })
    }

    pub(super) fn link_mut(&mut self, id: LinkId) -> Result<&mut Link, NetworkError> {
        self.links
            .get_mut(id.0)
            .ok_or(NetworkError::UnknownLink { index: id.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::hydraulic::hpg::core::{Family, HpgHeader, test_support::sample_reach};

    fn empty_hpg() -> Arc<Hpg> {
        Arc::new(Hpg::new(HpgHeader::default(), Family::default(), Family::default()).unwrap())
    }

    #[test]
    fn links_register_with_their_nodes() {
        let mut network = Network::new();
        let a = network.add_node("A", 1.0).unwrap();
        let b = network.add_node("B", 0.0).unwrap();
        let ab = network.add_link("AB", a, b, sample_reach()).unwrap();

        assert_eq!(network.node(a).unwrap().outflows(), &[ab]);
        assert_eq!(network.node(b).unwrap().inflows(), &[ab]);
        assert_eq!(network.link(ab).unwrap().upstream(), a);
        assert_eq!(network.find_node("B"), Some(b));
        assert_eq!(network.find_link("AB"), Some(ab));
    }

    #[test]
    fn names_are_unique() {
        let mut network = Network::new();
        let a = network.add_node("A", 1.0).unwrap();
        assert_eq!(
            network.add_node("A", 2.0),
            Err(NetworkError::DuplicateNode {
                name: "A".to_string()
            })
        );

        let b = network.add_node("B", 0.0).unwrap();
        network.add_link("AB", a, b, sample_reach()).unwrap();
        assert!(matches!(
            network.add_link("AB", a, b, sample_reach()),
            Err(NetworkError::DuplicateLink { .. })
        ));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut network = Network::new();
        let a = network.add_node("A", 1.0).unwrap();
        let err = network
            .add_link("AX", a, NodeId(7), sample_reach())
            .unwrap_err();
        assert_eq!(err, NetworkError::UnknownNode { index: 7 });
        assert_eq!(
            network.set_flow(LinkId(3), 1.0),
            Err(NetworkError::UnknownLink { index: 3 })
        );
    }

    #[test]
    fn one_graph_per_link() {
        let mut network = Network::new();
        let a = network.add_node("A", 1.0).unwrap();
        let b = network.add_node("B", 0.0).unwrap();
        let ab = network.add_link("AB", a, b, sample_reach()).unwrap();

        let hpg = empty_hpg();
        network.attach_hpg(ab, Arc::clone(&hpg)).unwrap();
        assert_eq!(Arc::strong_count(&hpg), 2);
        assert_eq!(
            network.attach_hpg(ab, hpg),
            Err(NetworkError::DuplicateHpg {
                name: "AB".to_string()
            })
        );
    }
}
