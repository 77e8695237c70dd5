use core::hash::Hash;
use std::{
    cmp::{Eq, PartialEq},
    collections::HashMap,
};

pub trait Dependable<K>
where
    K: Eq + PartialEq + Hash,
{
    fn key(&self) -> &K;
    fn dependencies(&self) -> Vec<K>;
}

/// A group of declarations that must be emitted together.
///
/// A component with a single member and no self-reference is an ordinary
/// declaration. A component with more than one member, or whose single member
/// references itself, is a cyclic group: every reference back into the group
/// needs an indirection in the emitted code.
#[derive(Debug, Clone)]
pub struct Component<T> {
    pub members: Vec<T>,
    pub cyclic: bool,
}

/// Dependency graph over declarations.
///
/// Edges run from an item to the items its definition references. Keys that
/// were never pushed (built-ins, external references) are ignored when the
/// graph is walked.
///
/// # Example
///
/// ```text
/// Invoice -> Address
/// Invoice -> LineItem
/// LineItem -> LineItem (self, optional)
/// => Components
/// [Address], [LineItem]*, [Invoice]      (* = cyclic)
/// ```
pub struct DependencyGraph<K, T>
where
    K: Eq + PartialEq + Hash + Clone + Ord,
    T: Clone + Dependable<K>,
{
    items: Vec<T>,
    indices: HashMap<K, usize>,
}

impl<K, T> DependencyGraph<K, T>
where
    K: Eq + PartialEq + Hash + Clone + Ord,
    T: Clone + Dependable<K>,
{
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            indices: HashMap::new(),
        }
    }

    /// Adds an item to the dependency graph. Pushing a second item with the
    /// same key replaces the first.
    pub fn push(&mut self, item: T) {
        match self.indices.get(item.key()) {
            Some(index) => self.items[*index] = item,
            None => {
                self.indices.insert(item.key().clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the strongly connected components of the graph in emission
    /// order: every component is listed after the components it depends on,
    /// and the members of a component are sorted by key.
    ///
    /// The output only depends on the set of items and their declared
    /// dependencies, never on insertion order of edges, so repeated runs over
    /// the same input produce the same sequence.
    pub fn sorted_components(&self) -> Vec<Component<T>> {
        let edges = self
            .items
            .iter()
            .map(|item| {
                let mut targets = item
                    .dependencies()
                    .iter()
                    .filter_map(|key| self.indices.get(key).copied())
                    .collect::<Vec<usize>>();
                targets.sort_unstable();
                targets.dedup();

                targets
            })
            .collect::<Vec<Vec<usize>>>();

        let mut tarjan = Tarjan::new(self.items.len(), &edges);

        for index in 0..self.items.len() {
            if tarjan.index_of[index].is_none() {
                tarjan.visit(index);
            }
        }

        tarjan
            .components
            .iter()
            .map(|indices| {
                let cyclic = indices.len() > 1
                    || indices
                        .iter()
                        .any(|&index| edges[index].contains(&index));

                let mut members = indices
                    .iter()
                    .map(|&index| self.items[index].clone())
                    .collect::<Vec<T>>();
                members.sort_by(|a, b| a.key().cmp(b.key()));

                Component { members, cyclic }
            })
            .collect()
    }
}

impl<K, T> Default for DependencyGraph<K, T>
where
    K: Eq + PartialEq + Hash + Clone + Ord,
    T: Clone + Dependable<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Tarjan's algorithm. Successor components are completed before the
/// component of the node that reaches them, so components come out
/// dependencies-first, which is exactly emission order.
struct Tarjan<'a> {
    edges: &'a [Vec<usize>],
    index_of: Vec<Option<usize>>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl<'a> Tarjan<'a> {
    fn new(node_count: usize, edges: &'a [Vec<usize>]) -> Self {
        Self {
            edges,
            index_of: vec![None; node_count],
            low_link: vec![0; node_count],
            on_stack: vec![false; node_count],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn visit(&mut self, node: usize) {
        self.index_of[node] = Some(self.next_index);
        self.low_link[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        let edges = self.edges;
        for &target in &edges[node] {
            match self.index_of[target] {
                None => {
                    self.visit(target);
                    self.low_link[node] = self.low_link[node].min(self.low_link[target]);
                }
                Some(target_index) if self.on_stack[target] => {
                    self.low_link[node] = self.low_link[node].min(target_index);
                }
                Some(_) => (),
            }
        }

        if Some(self.low_link[node]) == self.index_of[node] {
            let mut component = Vec::new();

            loop {
                let member = self.stack.pop().expect("tarjan stack underflow");
                self.on_stack[member] = false;
                component.push(member);

                if member == node {
                    break;
                }
            }

            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Eq, PartialEq)]
    struct GraphItem {
        key: String,
        deps: Vec<String>,
    }

    impl GraphItem {
        fn new(key: &str, deps: &[&str]) -> Self {
            Self {
                key: key.to_owned(),
                deps: deps.iter().map(|d| (*d).to_owned()).collect(),
            }
        }
    }

    impl Dependable<String> for GraphItem {
        fn key(&self) -> &String {
            &self.key
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }
    }

    fn position(components: &[Component<GraphItem>], key: &str) -> usize {
        components
            .iter()
            .position(|c| c.members.iter().any(|m| m.key == key))
            .unwrap()
    }

    #[test]
    fn sorted_components_with_empty_graph() {
        let graph = DependencyGraph::<String, GraphItem>::new();

        assert!(graph.sorted_components().is_empty());
    }

    #[test]
    fn sorted_components_orders_dependencies_first() {
        let mut graph = DependencyGraph::<String, GraphItem>::new();

        graph.push(GraphItem::new("Alias3", &["CustomNumber"]));
        graph.push(GraphItem::new("Alias4", &["Alias1"]));
        graph.push(GraphItem::new("Alias2", &["CustomNumber"]));
        graph.push(GraphItem::new("Alias6", &[]));
        graph.push(GraphItem::new("Alias1", &["Alias2"]));
        graph.push(GraphItem::new("Alias5", &["Alias1"]));
        graph.push(GraphItem::new("CustomNumber", &[]));

        let components = graph.sorted_components();

        assert_eq!(components.len(), 7);
        assert!(components.iter().all(|c| !c.cyclic));

        assert!(position(&components, "CustomNumber") < position(&components, "Alias3"));
        assert!(position(&components, "CustomNumber") < position(&components, "Alias2"));
        assert!(position(&components, "Alias2") < position(&components, "Alias1"));
        assert!(position(&components, "Alias1") < position(&components, "Alias4"));
        assert!(position(&components, "Alias1") < position(&components, "Alias5"));
    }

    #[test]
    fn self_reference_is_a_cyclic_singleton() {
        let mut graph = DependencyGraph::<String, GraphItem>::new();

        graph.push(GraphItem::new("Node", &["Node"]));
        graph.push(GraphItem::new("Leaf", &[]));

        let components = graph.sorted_components();

        let node = &components[position(&components, "Node")];
        assert!(node.cyclic);
        assert_eq!(node.members.len(), 1);

        let leaf = &components[position(&components, "Leaf")];
        assert!(!leaf.cyclic);
    }

    #[test]
    fn mutual_references_group_into_one_sorted_component() {
        let mut graph = DependencyGraph::<String, GraphItem>::new();

        graph.push(GraphItem::new("B", &["A"]));
        graph.push(GraphItem::new("A", &["B"]));
        graph.push(GraphItem::new("Root", &["A"]));

        let components = graph.sorted_components();

        assert_eq!(components.len(), 2);

        let cycle = &components[position(&components, "A")];
        assert!(cycle.cyclic);
        assert_eq!(
            cycle.members.iter().map(|m| m.key.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );

        assert!(position(&components, "A") < position(&components, "Root"));
    }

    #[test]
    fn unknown_dependencies_are_ignored() {
        let mut graph = DependencyGraph::<String, GraphItem>::new();

        graph.push(GraphItem::new("Amount", &["xs:decimal"]));

        let components = graph.sorted_components();

        assert_eq!(components.len(), 1);
        assert!(!components[0].cyclic);
    }
}
