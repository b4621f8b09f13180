//! A network of neural field layers.
//!
//! Layers are created through a `Network`, which owns them along with their
//! output buffers, and wired together with `connect`. `init` validates the
//! graph and prepares every layer once, after which every call to `step`
//! evaluates all layers in dependency order.
//!
//! # Example
//!
//! A 1D dynamic neural field, where the potential `u` integrates its input
//! and the lateral interactions computed from the previous `f(u)`:
//!
//! ```
//! # use neuralfield::layers::Gaussian;
//! # use neuralfield::network::Network;
//! let n = 50;
//! let mut net = Network::new();
//!
//! let input = net.input("input", n).unwrap();
//! let fu = net.function("fu", n, "sigmoid").unwrap();
//! let exc = net.gaussian("gexc", n, Gaussian::new(1.5, 2.0).toric(true)).unwrap();
//! let inh = net.gaussian("ginh", n, Gaussian::new(-1.3, 10.0).toric(true)).unwrap();
//! let u = net.leaky_integrator("u", n, 0.1).unwrap();
//!
//! net.connect(fu, exc).unwrap();
//! net.connect(fu, inh).unwrap();
//! let total = net.sum_of(&[input, exc, inh]).unwrap();
//! net.connect(total, u).unwrap();
//! net.connect_delayed(u, fu).unwrap();
//!
//! net.init().unwrap();
//! net.set_input(input, 0.5.into()).unwrap();
//! for _ in 0..100 {
//!     net.step().unwrap();
//! }
//! assert_eq!(net.buffer(u).len(), n);
//! ```

use crate::activator::Activator;
use crate::error::{Error, Result};
use crate::layers::{
    Constant, Function, Gaussian, Input, Layer, LayerKind, LeakyIntegrator,
    Stimulus, Sum,
};
use crate::shape::Shape;
use crate::utils::ZeroOut;

use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

/// A handle to a layer of a `Network`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(usize);

impl LayerId {
    /// Returns the position of the layer in creation order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A connection into a layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Edge {
    from: LayerId,
    /// The layer reads the buffer as it was left by the previous step.
    delayed: bool,
}

#[derive(Debug)]
struct Node {
    name: String,
    shape: Shape,
    kind: LayerKind,
    predecessors: Vec<Edge>,
    prepared: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Owns a set of named layers and evaluates them synchronously.
#[derive(Debug, Default)]
pub struct Network {
    nodes: Vec<Node>,
    /// Output buffer of every layer, indexed like `nodes`.
    values: Vec<Vec<f64>>,
    names: HashMap<String, LayerId>,
    order: Vec<LayerId>,
    initialized: bool,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Network::default()
    }

    /// Registers a new layer.
    ///
    /// An empty `name` is replaced by a generated `<kind>-<index>` name.
    pub fn add<S, K>(&mut self, name: &str, shape: S, kind: K) -> Result<LayerId>
    where
        S: Into<Shape>,
        K: Into<LayerKind>,
    {
        let shape = shape.into();
        let kind = kind.into();
        let name = if name.is_empty() {
            format!("{}-{}", kind.kind_name(), self.nodes.len())
        } else {
            name.to_string()
        };
        if shape.is_empty() {
            return Err(Error::InvalidShape(format!(
                "layer '{}' has an empty shape {}x{}",
                name, shape.height, shape.width
            )));
        }
        if self.names.contains_key(&name) {
            return Err(Error::DuplicateLayer(name));
        }
        check_kind(&name, shape, &kind)?;

        let id = LayerId(self.nodes.len());
        self.names.insert(name.clone(), id);
        self.nodes.push(Node {
            name,
            shape,
            kind,
            predecessors: Vec::new(),
            prepared: false,
        });
        self.values.push(vec![0.0; shape.len()]);
        self.initialized = false;
        Ok(id)
    }

    /// Adds an input layer filled from its stimulus.
    pub fn input<S: Into<Shape>>(&mut self, name: &str, shape: S) -> Result<LayerId> {
        self.add(name, shape, Input::new())
    }

    /// Adds an input layer filled by `fill` on every step.
    pub fn input_with<S, F>(&mut self, name: &str, shape: S, fill: F) -> Result<LayerId>
    where
        S: Into<Shape>,
        F: FnMut(&Stimulus, &mut [f64]) + 'static,
    {
        self.add(name, shape, Input::with_fill(fill))
    }

    /// Adds a pointwise function layer, selecting the activator by name.
    pub fn function<S: Into<Shape>>(
        &mut self,
        name: &str,
        shape: S,
        activator: &str,
    ) -> Result<LayerId> {
        let activator: Activator = activator.parse()?;
        self.add(name, shape, Function::new(activator))
    }

    /// Adds a layer holding `value` everywhere.
    pub fn constant<S: Into<Shape>>(
        &mut self,
        name: &str,
        shape: S,
        value: f64,
    ) -> Result<LayerId> {
        self.add(name, shape, Constant::new(value))
    }

    /// Adds a Gaussian link.
    pub fn gaussian<S: Into<Shape>>(
        &mut self,
        name: &str,
        shape: S,
        link: Gaussian,
    ) -> Result<LayerId> {
        self.add(name, shape, link)
    }

    /// Adds a leaky integrator stepping by `dt_tau`.
    pub fn leaky_integrator<S: Into<Shape>>(
        &mut self,
        name: &str,
        shape: S,
        dt_tau: f64,
    ) -> Result<LayerId> {
        self.add(name, shape, LeakyIntegrator::new(dt_tau))
    }

    /// Adds an unnamed layer summing `layers`, shaped like the first of them.
    pub fn sum_of(&mut self, layers: &[LayerId]) -> Result<LayerId> {
        let first = match layers.first() {
            Some(&first) => first,
            None => {
                return Err(Error::InvalidArity {
                    layer: format!("sum-{}", self.nodes.len()),
                    expected: Sum.arity().to_string(),
                    actual: 0,
                })
            }
        };
        for &id in layers {
            self.node(id)?;
        }
        let shape = self.node(first)?.shape;
        let sum = self.add("", shape, Sum::new())?;
        for &id in layers {
            self.connect(id, sum)?;
        }
        Ok(sum)
    }

    /// Makes `from` a predecessor of `to`.
    ///
    /// The number of predecessors is only checked by `init`.
    pub fn connect(&mut self, from: LayerId, to: LayerId) -> Result<()> {
        self.add_edge(from, to, false)
    }

    /// Makes `from` a predecessor of `to`, read as left by the previous step.
    ///
    /// This is how recurrent fields are closed: `to` is always evaluated
    /// before `from` within a step, so the connection never forms a cycle.
    /// `from` must be a buffered layer, i.e. a leaky integrator.
    pub fn connect_delayed(&mut self, from: LayerId, to: LayerId) -> Result<()> {
        let source = self.node(from)?;
        match source.kind {
            LayerKind::LeakyIntegrator(_) => {}
            _ => return Err(Error::NotBuffered(source.name.clone())),
        }
        if from == to {
            return Err(Error::CycleDetected(source.name.clone()));
        }
        self.add_edge(from, to, true)
    }

    fn add_edge(&mut self, from: LayerId, to: LayerId, delayed: bool) -> Result<()> {
        self.node(from)?;
        self.node_mut(to)?.predecessors.push(Edge { from, delayed });
        self.initialized = false;
        Ok(())
    }

    /// Validates the graph, computes the evaluation order and prepares every
    /// layer that was not prepared yet.
    ///
    /// Does nothing if the network is initialized and was not modified since.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let order = self.topological_order()?;

        for node in &self.nodes {
            let arity = node.kind.arity();
            if !arity.accepts(node.predecessors.len()) {
                return Err(Error::InvalidArity {
                    layer: node.name.clone(),
                    expected: arity.to_string(),
                    actual: node.predecessors.len(),
                });
            }
            for edge in &node.predecessors {
                let from = &self.nodes[edge.from.0];
                if from.shape != node.shape {
                    return Err(Error::ShapeMismatch {
                        layer: node.name.clone(),
                        expected: node.shape.to_string(),
                        actual: format!("{} from '{}'", from.shape, from.name),
                    });
                }
            }
        }

        for &id in &order {
            let node = &mut self.nodes[id.0];
            if !node.prepared {
                node.kind.prepare(node.shape)?;
                node.prepared = true;
                log::debug!("prepared {} layer '{}'", node.kind.kind_name(), node.name);
            }
        }

        log::debug!(
            "evaluation order: {}",
            order.iter().map(|id| &self.nodes[id.0].name).join(" -> ")
        );
        log::info!("initialized network of {} layers", self.nodes.len());
        self.order = order;
        self.initialized = true;
        Ok(())
    }

    /// Computes an evaluation order where every layer follows its
    /// predecessors, and readers of a delayed connection precede its source.
    fn topological_order(&self) -> Result<Vec<LayerId>> {
        let mut delayed_readers = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for edge in node.predecessors.iter().filter(|e| e.delayed) {
                delayed_readers[edge.from.0].push(LayerId(i));
            }
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for i in 0..self.nodes.len() {
            self.visit(LayerId(i), &delayed_readers, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        id: LayerId,
        delayed_readers: &[Vec<LayerId>],
        marks: &mut [Mark],
        order: &mut Vec<LayerId>,
    ) -> Result<()> {
        match marks[id.0] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                return Err(Error::CycleDetected(self.nodes[id.0].name.clone()))
            }
            Mark::Unvisited => {}
        }
        marks[id.0] = Mark::Visiting;
        let node = &self.nodes[id.0];
        for edge in node.predecessors.iter().filter(|e| !e.delayed) {
            self.visit(edge.from, delayed_readers, marks, order)?;
        }
        for &reader in &delayed_readers[id.0] {
            self.visit(reader, delayed_readers, marks, order)?;
        }
        marks[id.0] = Mark::Done;
        order.push(id);
        Ok(())
    }

    /// Evaluates every layer once, in the order computed by `init`.
    ///
    /// If a layer fails, the buffers are left partially updated.
    pub fn step(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        for k in 0..self.order.len() {
            let id = self.order[k];
            let mut output = std::mem::take(&mut self.values[id.0]);
            let node = &mut self.nodes[id.0];
            let values = &self.values;
            let inputs: Vec<&[f64]> = node
                .predecessors
                .iter()
                .map(|edge| values[edge.from.0].as_slice())
                .collect();
            let result = node.kind.evaluate(&inputs, &mut output);
            self.values[id.0] = output;
            result?;
        }
        Ok(())
    }

    /// Zeroes every buffer, including the state of the integrators.
    pub fn reset(&mut self) {
        self.values.zero_out();
    }

    /// Looks a layer up by name.
    pub fn get(&self, name: &str) -> Option<LayerId> {
        self.names.get(name).cloned()
    }

    /// Returns the current values of a layer, row-major.
    ///
    /// Panics if `id` does not belong to this network.
    pub fn buffer(&self, id: LayerId) -> &[f64] {
        &self.values[id.0]
    }

    pub fn name(&self, id: LayerId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn shape(&self, id: LayerId) -> Shape {
        self.nodes[id.0].shape
    }

    /// Returns the layer itself, e.g. to inspect a Gaussian link.
    pub fn kind(&self, id: LayerId) -> &LayerKind {
        &self.nodes[id.0].kind
    }

    /// Returns the predecessors of a layer in connection order.
    pub fn predecessors(&self, id: LayerId) -> Vec<LayerId> {
        self.nodes[id.0]
            .predecessors
            .iter()
            .map(|edge| edge.from)
            .collect()
    }

    /// Returns the evaluation order computed by the last successful `init`.
    pub fn order(&self) -> &[LayerId] {
        &self.order
    }

    /// Iterates over every layer in creation order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> {
        (0..self.nodes.len()).map(LayerId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn parameters(&self, id: LayerId) -> Result<Vec<f64>> {
        Ok(self.node(id)?.kind.parameters())
    }

    /// Replaces the owned parameters of a layer.
    ///
    /// Setting the parameters of an input sets its stimulus. A prepared
    /// Gaussian link rebuilds its kernel right away.
    pub fn set_parameters(&mut self, id: LayerId, values: &[f64]) -> Result<()> {
        let node = self.node_mut(id)?;
        if let LayerKind::Input(_) = node.kind {
            if values.is_empty() {
                return Err(Error::InvalidParameters {
                    layer: node.name.clone(),
                    reason: "an input needs at least one value".to_string(),
                });
            }
            return self.set_input(id, Stimulus::from(values));
        }
        node.kind
            .set_parameters(values)
            .map_err(|reason| Error::InvalidParameters {
                layer: node.name.clone(),
                reason,
            })
    }

    /// Sets the stimulus of an input layer.
    pub fn set_input(&mut self, id: LayerId, stimulus: Stimulus) -> Result<()> {
        let node = self.node_mut(id)?;
        match node.kind {
            LayerKind::Input(ref mut input) => {
                if let Stimulus::Values(ref values) = stimulus {
                    if !input.has_custom_fill() && values.len() != node.shape.len() {
                        return Err(Error::ShapeMismatch {
                            layer: node.name.clone(),
                            expected: node.shape.to_string(),
                            actual: values.len().to_string(),
                        });
                    }
                }
                input.set_stimulus(stimulus);
                Ok(())
            }
            _ => Err(Error::NotAnInput(node.name.clone())),
        }
    }

    fn node(&self, id: LayerId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::UnknownLayer(format!("#{}", id.0)))
    }

    fn node_mut(&mut self, id: LayerId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::UnknownLayer(format!("#{}", id.0)))
    }
}

/// Rejects layer configurations that could not be evaluated on `shape`.
fn check_kind(name: &str, shape: Shape, kind: &LayerKind) -> Result<()> {
    match *kind {
        LayerKind::Gaussian(ref link) => {
            link.validate().map_err(|reason| Error::InvalidParameters {
                layer: name.to_string(),
                reason,
            })
        }
        LayerKind::Input(ref input) => match *input.stimulus() {
            Stimulus::Values(ref values)
                if !input.has_custom_fill() && values.len() != shape.len() =>
            {
                Err(Error::ShapeMismatch {
                    layer: name.to_string(),
                    expected: shape.to_string(),
                    actual: values.len().to_string(),
                })
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

impl fmt::Display for Network {
    /// Lists every layer with its kind, shape, parameters and predecessors.
    /// Delayed predecessors are prefixed with `~`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for node in &self.nodes {
            write!(
                f,
                "{} ({}, {}) [{}]",
                node.name,
                node.kind.kind_name(),
                node.shape,
                node.kind.parameters().iter().join(", ")
            )?;
            if !node.predecessors.is_empty() {
                let names = node.predecessors.iter().map(|edge| {
                    let name = &self.nodes[edge.from.0].name;
                    if edge.delayed {
                        format!("~{}", name)
                    } else {
                        name.clone()
                    }
                });
                write!(f, " <- {}", names.format(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn position(net: &Network, id: LayerId) -> usize {
        net.order().iter().position(|&o| o == id).unwrap()
    }

    #[test]
    fn order_respects_predecessors() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..20 {
            let count = 25;
            // Layers may only depend on layers of lower rank, but are
            // created in a random order.
            let mut ranks: Vec<usize> = (0..count).collect();
            ranks.shuffle(&mut rng);

            let mut net = Network::new();
            let kinds: Vec<usize> = ranks
                .iter()
                .map(|&r| if r < 3 { 0 } else { rng.gen_range(1..5) })
                .collect();
            let ids: Vec<LayerId> = kinds
                .iter()
                .map(|&k| {
                    let kind: LayerKind = match k {
                        0 => Input::new().into(),
                        1 => Function::new(Activator::Identity).into(),
                        2 => Gaussian::new(1.0, 1.0).into(),
                        3 => LeakyIntegrator::new(0.5).into(),
                        _ => Sum::new().into(),
                    };
                    net.add("", 8, kind).unwrap()
                })
                .collect();
            let by_rank = |rank: usize| ids[ranks.iter().position(|&r| r == rank).unwrap()];

            for (i, &rank) in ranks.iter().enumerate() {
                let wanted = match kinds[i] {
                    0 => 0,
                    4 => rng.gen_range(2..4),
                    _ => 1,
                };
                for _ in 0..wanted {
                    let from = by_rank(rng.gen_range(0..rank));
                    net.connect(from, ids[i]).unwrap();
                }
            }

            net.init().unwrap();
            assert_eq!(net.order().len(), count);
            for &id in &ids {
                for from in net.predecessors(id) {
                    assert!(position(&net, from) < position(&net, id));
                }
            }
            net.step().unwrap();
        }
    }

    #[test]
    fn cycle_is_detected() {
        let mut net = Network::new();
        let f = net.function("f", 5, "sigmoid").unwrap();
        let g = net.gaussian("g", 5, Gaussian::new(1.0, 1.0)).unwrap();
        let u = net.leaky_integrator("u", 5, 0.1).unwrap();
        net.connect(f, g).unwrap();
        net.connect(g, u).unwrap();
        net.connect(u, f).unwrap();
        match net.init() {
            Err(Error::CycleDetected(name)) => {
                assert!(["f", "g", "u"].contains(&name.as_str()))
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
        assert!(!net.is_initialized());
        assert_eq!(net.step(), Err(Error::NotInitialized));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut net = Network::new();
        let f = net.function("f", 3, "identity").unwrap();
        net.connect(f, f).unwrap();
        assert_eq!(net.init(), Err(Error::CycleDetected("f".to_string())));
    }

    #[test]
    fn arity_is_checked_at_init() {
        let mut net = Network::new();
        let input = net.input("input", 10).unwrap();
        let g = net.gaussian("gexc", 10, Gaussian::new(1.5, 2.0)).unwrap();
        net.function("fu", 10, "sigmoid").unwrap();
        net.connect(input, g).unwrap();
        assert_eq!(
            net.init(),
            Err(Error::InvalidArity {
                layer: "fu".to_string(),
                expected: "exactly 1".to_string(),
                actual: 0,
            })
        );

        let mut net = Network::new();
        let a = net.input("a", 4).unwrap();
        let b = net.input("b", 4).unwrap();
        net.connect(a, b).unwrap();
        assert!(matches!(net.init(), Err(Error::InvalidArity { .. })));

        let mut net = Network::new();
        let a = net.input("a", 4).unwrap();
        let sum = net.sum_of(&[a]).unwrap();
        assert!(matches!(net.init(), Err(Error::InvalidArity { layer, .. }) if layer == net.name(sum)));
    }

    #[test]
    fn shapes_must_match() {
        let mut net = Network::new();
        let input = net.input("input", (4, 4)).unwrap();
        let f = net.function("f", 16, "relu").unwrap();
        net.connect(input, f).unwrap();
        assert!(matches!(net.init(), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn step_requires_init() {
        let mut net = Network::new();
        net.input("input", 3).unwrap();
        assert_eq!(net.step(), Err(Error::NotInitialized));
        net.init().unwrap();
        assert!(net.step().is_ok());
    }

    #[test]
    fn init_twice_revalidates_after_changes() {
        let mut net = Network::new();
        let input = net.input("input", 3).unwrap();
        let f = net.function("f", 3, "identity").unwrap();
        net.connect(input, f).unwrap();
        net.init().unwrap();
        net.init().unwrap();
        assert!(net.is_initialized());

        net.connect(input, f).unwrap();
        assert!(!net.is_initialized());
        assert!(matches!(net.init(), Err(Error::InvalidArity { .. })));
        assert_eq!(net.step(), Err(Error::NotInitialized));
    }

    #[test]
    fn names_are_unique() {
        let mut net = Network::new();
        net.input("input", 3).unwrap();
        assert_eq!(
            net.constant("input", 3, 1.0),
            Err(Error::DuplicateLayer("input".to_string()))
        );
        let generated = net.constant("", 3, 1.0).unwrap();
        assert_eq!(net.name(generated), "constant-1");
        assert_eq!(net.get("constant-1"), Some(generated));
        assert_eq!(net.get("missing"), None);
        assert!(matches!(net.input("empty", (0, 3)), Err(Error::InvalidShape(_))));
        assert!(matches!(
            net.function("f", 3, "softmax"),
            Err(Error::UnknownFunction(_))
        ));
    }

    #[test]
    fn sum_of_constant_buffers() {
        let mut net = Network::new();
        let values = [1.0, -2.5, 4.0, 0.25];
        let layers: Vec<LayerId> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| net.constant(&format!("c{}", i), (2, 3), v).unwrap())
            .collect();
        let sum = net.sum_of(&layers).unwrap();
        net.init().unwrap();
        net.step().unwrap();
        for &y in net.buffer(sum) {
            assert_relative_eq!(y, 2.75);
        }
    }

    #[test]
    fn identity_follows_its_input() {
        let mut net = Network::new();
        let input = net.input("input", 6).unwrap();
        let f = net.function("f", 6, "identity").unwrap();
        net.connect(input, f).unwrap();
        net.init().unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let stimulus: Vec<f64> = (0..6).map(|_| rng.gen_range(-5.0..5.0)).collect();
            net.set_input(input, stimulus.clone().into()).unwrap();
            net.step().unwrap();
            assert_eq!(net.buffer(f), &stimulus[..]);
        }
    }

    #[test]
    fn layers_see_predecessors_of_the_same_step() {
        let mut net = Network::new();
        let input = net.input("input", 2).unwrap();
        let f = net.function("f", 2, "identity").unwrap();
        let g = net.function("g", 2, "identity").unwrap();
        net.connect(f, g).unwrap();
        net.connect(input, f).unwrap();
        net.init().unwrap();
        net.set_input(input, 3.0.into()).unwrap();
        net.step().unwrap();
        assert_eq!(net.buffer(g), &[3.0, 3.0]);
    }

    #[test]
    fn integrator_reaches_constant_input() {
        let mut net = Network::new();
        let c = net.constant("c", 4, 2.0).unwrap();
        let u = net.leaky_integrator("u", 4, 1.0).unwrap();
        net.connect(c, u).unwrap();
        net.init().unwrap();
        net.step().unwrap();
        assert_eq!(net.buffer(u), &[2.0; 4]);

        net.set_parameters(u, &[0.25]).unwrap();
        net.reset();
        assert_eq!(net.buffer(u), &[0.0; 4]);
        for n in 1..=20 {
            net.step().unwrap();
            assert_relative_eq!(
                net.buffer(u)[0],
                2.0 * (1.0 - 0.75f64.powi(n)),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn delayed_connection_reads_previous_step() {
        let mut net = Network::new();
        let c = net.constant("c", 1, 1.0).unwrap();
        let u = net.leaky_integrator("u", 1, 1.0).unwrap();
        let f = net.function("f", 1, "identity").unwrap();
        let total = net.sum_of(&[c, f]).unwrap();
        net.connect(total, u).unwrap();
        net.connect_delayed(u, f).unwrap();
        net.init().unwrap();
        assert!(position(&net, f) < position(&net, u));

        // u(t+1) = 1 + u(t)
        for n in 1..=5 {
            net.step().unwrap();
            assert_eq!(net.buffer(u)[0], n as f64);
            assert_eq!(net.buffer(f)[0], (n - 1) as f64);
        }
    }

    #[test]
    fn delayed_connection_needs_a_buffered_source() {
        let mut net = Network::new();
        let f = net.function("f", 1, "identity").unwrap();
        let g = net.function("g", 1, "identity").unwrap();
        assert_eq!(
            net.connect_delayed(f, g),
            Err(Error::NotBuffered("f".to_string()))
        );
        let u = net.leaky_integrator("u", 1, 0.5).unwrap();
        assert!(matches!(net.connect_delayed(u, u), Err(Error::CycleDetected(_))));
    }

    #[test]
    fn gaussian_parameters_take_effect_on_next_step() {
        let n = 15;
        let mut net = Network::new();
        let input = net.input("input", n).unwrap();
        let g = net.gaussian("g", n, Gaussian::new(1.0, 1.0).toric(true)).unwrap();
        net.connect(input, g).unwrap();
        net.init().unwrap();

        let mut impulse = vec![0.0; n];
        impulse[0] = 1.0;
        net.set_input(input, impulse.into()).unwrap();
        net.step().unwrap();
        assert_abs_diff_eq!(net.buffer(g)[1], (-0.5f64).exp(), epsilon = 1e-10);
        assert_abs_diff_eq!(net.buffer(g)[n - 1], (-0.5f64).exp(), epsilon = 1e-10);

        net.set_parameters(g, &[2.0, 3.0]).unwrap();
        assert_eq!(net.parameters(g).unwrap(), vec![2.0, 3.0]);
        net.step().unwrap();
        assert_abs_diff_eq!(net.buffer(g)[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(
            net.buffer(g)[2],
            2.0 * (-4.0f64 / 18.0).exp(),
            epsilon = 1e-10
        );

        assert!(matches!(
            net.set_parameters(g, &[1.0, 0.0]),
            Err(Error::InvalidParameters { .. })
        ));
    }

    #[test]
    fn input_parameters_and_stimulus() {
        let mut net = Network::new();
        let input = net.input("input", 3).unwrap();
        let h = net.constant("h", 3, 0.0).unwrap();
        net.init().unwrap();

        net.set_parameters(input, &[1.5]).unwrap();
        net.step().unwrap();
        assert_eq!(net.buffer(input), &[1.5; 3]);

        assert!(matches!(
            net.set_input(input, vec![1.0, 2.0].into()),
            Err(Error::ShapeMismatch { .. })
        ));
        assert_eq!(
            net.set_input(h, 1.0.into()),
            Err(Error::NotAnInput("h".to_string()))
        );
        assert!(net.set_parameters(input, &[]).is_err());
    }

    #[test]
    fn custom_fill_places_a_bump() {
        let mut net = Network::new();
        let n = 10;
        let input = net
            .input_with("input", n, move |stimulus, out| {
                if let Stimulus::Scalar(x) = *stimulus {
                    for (i, y) in out.iter_mut().enumerate() {
                        let d = i as f64 - x;
                        *y = (-d * d / 2.0).exp();
                    }
                }
            })
            .unwrap();
        net.init().unwrap();
        net.set_input(input, 4.0.into()).unwrap();
        net.step().unwrap();
        let peak = net
            .buffer(input)
            .iter()
            .cloned()
            .position_max_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap();
        assert_eq!(peak, 4);
    }

    #[test]
    fn added_inputs_must_fit_their_shape() {
        let mut net = Network::new();
        let mut input = Input::new();
        input.set_stimulus(vec![1.0, 2.0].into());
        assert_eq!(
            net.add("in", 3, input),
            Err(Error::ShapeMismatch {
                layer: "in".to_string(),
                expected: "3".to_string(),
                actual: "2".to_string(),
            })
        );
        assert!(net.is_empty());
        assert_eq!(net.get("in"), None);

        let mut input = Input::new();
        input.set_stimulus(vec![1.0, 2.0, 3.0].into());
        let id = net.add("in", 3, input).unwrap();
        net.init().unwrap();
        net.step().unwrap();
        assert_eq!(net.buffer(id), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn added_links_are_validated() {
        let mut net = Network::new();
        for &(amplitude, sigma) in &[(1.0, 0.0), (1.0, -1.0), (std::f64::NAN, 1.0)] {
            assert!(matches!(
                net.add("g", 5, Gaussian::new(amplitude, sigma)),
                Err(Error::InvalidParameters { ref layer, .. }) if layer == "g"
            ));
        }
        assert!(matches!(
            net.gaussian("g", 5, Gaussian::new(1.0, 0.0)),
            Err(Error::InvalidParameters { .. })
        ));
        assert!(net.is_empty());
    }

    #[test]
    fn display_lists_layers() {
        let mut net = Network::new();
        let input = net.input("input", 4).unwrap();
        let u = net.leaky_integrator("u", 4, 0.1).unwrap();
        let f = net.function("fu", 4, "sigmoid").unwrap();
        let total = net.sum_of(&[input, f]).unwrap();
        net.connect(total, u).unwrap();
        net.connect_delayed(u, f).unwrap();
        let listing = net.to_string();
        assert!(listing.contains("u (leaky_integrator, 4) [0.1] <- sum-3"));
        assert!(listing.contains("fu (function, 4) [1, 0] <- ~u"));
        assert!(listing.contains("sum-3 (sum, 4) [] <- input, fu"));
    }
}
