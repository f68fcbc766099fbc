use {
    num::Zero,
    std::{
        cmp::{Ordering, Reverse},
        collections::{BinaryHeap, HashSet, VecDeque},
        hash::Hash,
        ops::Add,
    },
};

/// An open-set element for cost-ordered searches, sorted solely by cost
pub struct OpenSetElement<V, C>(pub V, pub C);

impl<V, C: Ord> PartialEq for OpenSetElement<V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<V, C: Ord> PartialOrd for OpenSetElement<V, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, C: Ord> Eq for OpenSetElement<V, C> {}

impl<V, C: Ord> Ord for OpenSetElement<V, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse the order so that cost is minimized when popping from the heap
        Reverse(&self.1).cmp(&Reverse(&other.1))
    }
}

/// Scratch state for a `CostSearch` run, reusable across runs for the same search
pub struct CostSearchState<V, C> {
    open_set: BinaryHeap<OpenSetElement<V, C>>,
    neighbors: Vec<OpenSetElement<V, C>>,
}

impl<V, C> CostSearchState<V, C> {
    fn clear(&mut self) {
        self.open_set.clear();
        self.neighbors.clear();
    }
}

impl<V, C: Ord> Default for CostSearchState<V, C> {
    fn default() -> Self {
        Self {
            open_set: BinaryHeap::new(),
            neighbors: Vec::new(),
        }
    }
}

/// An implementation of [Dijkstra's algorithm] over an implicit weighted graph
///
/// Stale open-set entries are detected by comparing the popped cost against the vertex's current
/// label, so no in-place heap surgery is needed when a cheaper path to a vertex is found.
///
/// [Dijkstra's algorithm]: https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm
pub trait CostSearch {
    type Vertex: Clone + Eq + Hash;
    type Cost: Add<Output = Self::Cost> + Clone + Ord + Zero;

    fn start(&self) -> &Self::Vertex;
    fn is_end(&self, vertex: &Self::Vertex) -> bool;
    fn path_to(&self, vertex: &Self::Vertex) -> Vec<Self::Vertex>;
    fn cost_from_start(&self, vertex: &Self::Vertex) -> Option<Self::Cost>;
    fn neighbors(
        &self,
        vertex: &Self::Vertex,
        neighbors: &mut Vec<OpenSetElement<Self::Vertex, Self::Cost>>,
    );

    /// Called on a neighbor whose cost label improves *or ties* via `from`. Equal-cost calls let
    /// the implementor track alternative optimal predecessors.
    fn update_vertex(
        &mut self,
        from: &Self::Vertex,
        to: &Self::Vertex,
        cost: Self::Cost,
        heuristic: Self::Cost,
    );
    fn reset(&mut self);

    fn run_internal(
        &mut self,
        state: &mut CostSearchState<Self::Vertex, Self::Cost>,
    ) -> Option<Vec<Self::Vertex>> {
        self.reset();
        state.clear();

        let start: Self::Vertex = self.start().clone();

        state
            .open_set
            .push(OpenSetElement(start, Self::Cost::zero()));

        while let Some(OpenSetElement(vertex, cost)) = state.open_set.pop() {
            match self.cost_from_start(&vertex) {
                // A cheaper path to `vertex` was settled after this element was pushed
                Some(label) if label < cost => continue,
                _ => (),
            }

            if self.is_end(&vertex) {
                return Some(self.path_to(&vertex));
            }

            self.neighbors(&vertex, &mut state.neighbors);

            for OpenSetElement(neighbor, edge_cost) in state.neighbors.drain(..) {
                let candidate: Self::Cost = cost.clone() + edge_cost;

                match self.cost_from_start(&neighbor) {
                    Some(label) if label < candidate => (),
                    Some(label) if label == candidate => {
                        self.update_vertex(&vertex, &neighbor, candidate, Self::Cost::zero());
                    }
                    _ => {
                        self.update_vertex(
                            &vertex,
                            &neighbor,
                            candidate.clone(),
                            Self::Cost::zero(),
                        );
                        state.open_set.push(OpenSetElement(neighbor, candidate));
                    }
                }
            }
        }

        None
    }

    fn run(&mut self) -> Option<Vec<Self::Vertex>> {
        self.run_internal(&mut CostSearchState::default())
    }
}

/// Scratch state for a `BreadthFirstSearch` run
pub struct BreadthFirstSearchState<V> {
    queue: VecDeque<V>,
    explored: HashSet<V>,
    neighbors: Vec<V>,
}

impl<V> BreadthFirstSearchState<V> {
    fn clear(&mut self) {
        self.queue.clear();
        self.explored.clear();
        self.neighbors.clear();
    }
}

impl<V> Default for BreadthFirstSearchState<V> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            explored: HashSet::new(),
            neighbors: Vec::new(),
        }
    }
}

/// An implementation of [breadth-first search] over an implicit unweighted graph, seeded from one
/// or more start vertices
///
/// [breadth-first search]: https://en.wikipedia.org/wiki/Breadth-first_search
pub trait BreadthFirstSearch {
    type Vertex: Clone + Eq + Hash;

    fn starts(&self) -> Vec<Self::Vertex>;
    fn is_end(&self, vertex: &Self::Vertex) -> bool;
    fn path_to(&self, vertex: &Self::Vertex) -> Vec<Self::Vertex>;
    fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>);
    fn update_parent(&mut self, from: &Self::Vertex, to: &Self::Vertex);
    fn reset(&mut self);

    fn run_internal(
        &mut self,
        state: &mut BreadthFirstSearchState<Self::Vertex>,
    ) -> Option<Vec<Self::Vertex>> {
        self.reset();
        state.clear();

        for start in self.starts() {
            if state.explored.insert(start.clone()) {
                state.queue.push_back(start);
            }
        }

        while let Some(vertex) = state.queue.pop_front() {
            if self.is_end(&vertex) {
                return Some(self.path_to(&vertex));
            }

            self.neighbors(&vertex, &mut state.neighbors);

            for neighbor in state.neighbors.drain(..) {
                if state.explored.insert(neighbor.clone()) {
                    self.update_parent(&vertex, &neighbor);
                    state.queue.push_back(neighbor);
                }
            }
        }

        None
    }

    fn run(&mut self) -> Option<Vec<Self::Vertex>> {
        self.run_internal(&mut BreadthFirstSearchState::default())
    }
}
