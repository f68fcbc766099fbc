//! Turn-penalized routing over rectangular character grids
//!
//! A route is searched over `(position, heading)` states: stepping forward costs one, rotating in
//! place by a quarter turn costs a configurable penalty. Alongside the minimum cost, the full set
//! of cells lying on *any* minimum-cost route is recovered by walking cost-consistent edges
//! backwards from the cheapest goal states.

use {
    crate::*,
    bitvec::vec::BitVec,
    glam::IVec2,
    nom::{combinator::map_res, error::Error as NomError, Err, IResult},
    std::collections::HashMap,
    strum::IntoEnumIterator,
};

/// The quarter-turn penalty applied by the runner binary when none is specified
pub const DEFAULT_TURN_PENALTY: u32 = 1000_u32;

define_cell! {
    #[repr(u8)]
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub enum Cell {
        #[default]
        Open = OPEN = b'.',
        Wall = WALL = b'#',
        Start = START = b'S',
        Goal = GOAL = b'E',
        BestPath = BEST_PATH = b'O',
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum MazeBuildError {
    NoStart,
    MultipleStarts,
    NoGoal,
    DimensionsTooLarge,
    PathAnnotationInInput,
}

pub struct Maze {
    grid: Grid2D<Cell>,
    start: SmallPosAndDir,
    goals: Vec<SmallPos>,
}

impl Maze {
    pub fn try_from_grid(
        grid: Grid2D<Cell>,
        start_dir: Direction,
    ) -> Result<Self, MazeBuildError> {
        use MazeBuildError::*;

        if !SmallPos::are_dimensions_valid(grid.dimensions()) {
            return Err(DimensionsTooLarge);
        }

        if grid
            .iter_positions_with_cell(&Cell::BestPath)
            .next()
            .is_some()
        {
            return Err(PathAnnotationInInput);
        }

        let start_pos: IVec2 = {
            let mut start_positions = grid.iter_positions_with_cell(&Cell::Start);
            let start_pos: IVec2 = start_positions.next().ok_or(NoStart)?;

            if start_positions.next().is_some() {
                return Err(MultipleStarts);
            }

            start_pos
        };

        let goals: Vec<SmallPos> = grid
            .iter_positions_with_cell(&Cell::Goal)
            // SAFETY: The grid dimensions have been verified above.
            .map(|goal_pos: IVec2| unsafe { SmallPos::from_pos_unsafe(goal_pos) })
            .collect();

        if goals.is_empty() {
            return Err(NoGoal);
        }

        // SAFETY: The grid dimensions have been verified above.
        let start: SmallPosAndDir =
            unsafe { SmallPosAndDir::from_pos_and_dir_unsafe(start_pos, start_dir) };

        Ok(Self { grid, start, goals })
    }

    #[inline]
    pub fn grid(&self) -> &Grid2D<Cell> {
        &self.grid
    }

    #[inline]
    pub fn start(&self) -> SmallPosAndDir {
        self.start
    }

    #[inline]
    pub fn goals(&self) -> &[SmallPos] {
        &self.goals
    }

    /// Computes the minimum route cost and the set of cells on any minimum-cost route.
    ///
    /// Unreachable goals yield a `Route` with no cost and no best cells.
    pub fn route(&self, turn_penalty: u32) -> Route {
        let mut labeling: RouteLabeling = RouteLabeling {
            maze: self,
            turn_penalty,
            cost_from_start: HashMap::new(),
        };

        // The goal predicate is constant `false`, so this labels all reachable states
        let _ = labeling.run();

        let min_cost: Option<u32> = labeling.min_route_cost();
        let mut best_cells: BitVec = BitVec::repeat(false, self.grid.area());

        if let Some(min_cost) = min_cost {
            let mut marker: BestCellMarker = BestCellMarker {
                maze: self,
                turn_penalty,
                cost_from_start: &labeling.cost_from_start,
                min_cost,
                best_cells,
            };

            let _ = marker.run();

            best_cells = marker.best_cells;
        }

        Route {
            min_cost,
            best_cells,
            dimensions: self.grid.dimensions(),
        }
    }

    /// Renders the grid with every best cell replaced by `Cell::BestPath`
    pub fn annotated_grid_string(&self, route: &Route) -> String {
        let mut grid: Grid2D<Cell> = self.grid.clone();

        for pos in route.iter_best_cells() {
            if let Some(cell) = grid.get_mut(pos) {
                *cell = Cell::BestPath;
            }
        }

        grid.into()
    }
}

impl Parse for Maze {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map_res(Grid2D::parse, |grid: Grid2D<Cell>| {
            Self::try_from_grid(grid, Direction::East)
        })(input)
    }
}

impl<'i> TryFrom<&'i str> for Maze {
    type Error = Err<NomError<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}

pub struct Route {
    min_cost: Option<u32>,
    best_cells: BitVec,
    dimensions: IVec2,
}

impl Route {
    #[inline]
    pub fn min_cost(&self) -> Option<u32> {
        self.min_cost
    }

    #[inline]
    pub fn best_cell_count(&self) -> usize {
        self.best_cells.count_ones()
    }

    pub fn is_best_cell(&self, pos: IVec2) -> bool {
        grid_2d_try_index_from_pos_and_dimensions(pos, self.dimensions)
            .map_or(false, |index: usize| self.best_cells[index])
    }

    pub fn iter_best_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        let dimensions: IVec2 = self.dimensions;

        self.best_cells
            .iter_ones()
            .map(move |index: usize| grid_2d_pos_from_index_and_dimensions(index, dimensions))
    }
}

/// Exhaustively labels all `(position, heading)` states with their minimum cost from the start
struct RouteLabeling<'m> {
    maze: &'m Maze,
    turn_penalty: u32,
    cost_from_start: HashMap<SmallPosAndDir, u32>,
}

impl<'m> RouteLabeling<'m> {
    fn min_route_cost(&self) -> Option<u32> {
        self.maze
            .goals
            .iter()
            .flat_map(|goal: &SmallPos| {
                let goal: SmallPos = *goal;

                Direction::iter().filter_map(move |dir: Direction| -> Option<u32> {
                    self.cost_from_start
                        .get(&SmallPosAndDir { pos: goal, dir })
                        .copied()
                })
            })
            .min()
    }
}

impl<'m> CostSearch for RouteLabeling<'m> {
    type Vertex = SmallPosAndDir;
    type Cost = u32;

    fn start(&self) -> &Self::Vertex {
        &self.maze.start
    }

    fn is_end(&self, _vertex: &Self::Vertex) -> bool {
        false
    }

    fn path_to(&self, _vertex: &Self::Vertex) -> Vec<Self::Vertex> {
        Vec::new()
    }

    fn cost_from_start(&self, vertex: &Self::Vertex) -> Option<Self::Cost> {
        self.cost_from_start.get(vertex).copied()
    }

    fn neighbors(
        &self,
        vertex: &Self::Vertex,
        neighbors: &mut Vec<OpenSetElement<Self::Vertex, Self::Cost>>,
    ) {
        neighbors.clear();

        let dir: Direction = vertex.dir;
        let forward_pos: IVec2 = vertex.pos.get() + dir.vec();

        if self
            .maze
            .grid
            .get(forward_pos)
            .map_or(false, |cell: &Cell| *cell != Cell::Wall)
        {
            neighbors.push(OpenSetElement(
                // SAFETY: `forward_pos` lies within the grid, whose dimensions fit.
                unsafe { SmallPosAndDir::from_pos_and_dir_unsafe(forward_pos, dir) },
                1_u32,
            ));
        }

        for turn_dir in [dir.prev(), dir.next()] {
            neighbors.push(OpenSetElement(
                SmallPosAndDir {
                    pos: vertex.pos,
                    dir: turn_dir,
                },
                self.turn_penalty,
            ));
        }
    }

    fn update_vertex(
        &mut self,
        _from: &Self::Vertex,
        to: &Self::Vertex,
        cost: Self::Cost,
        _heuristic: Self::Cost,
    ) {
        self.cost_from_start.insert(*to, cost);
    }

    fn reset(&mut self) {
        self.cost_from_start.clear();
        self.cost_from_start.insert(self.maze.start, 0_u32);
    }
}

/// Walks cost-consistent edges backwards from the cheapest goal states, setting the bit of every
/// cell visited along the way
struct BestCellMarker<'m> {
    maze: &'m Maze,
    turn_penalty: u32,
    cost_from_start: &'m HashMap<SmallPosAndDir, u32>,
    min_cost: u32,
    best_cells: BitVec,
}

impl<'m> BestCellMarker<'m> {
    fn min_cost_goal_states(&self) -> Vec<SmallPosAndDir> {
        self.maze
            .goals
            .iter()
            .flat_map(|goal: &SmallPos| {
                let goal: SmallPos = *goal;

                Direction::iter().map(move |dir: Direction| SmallPosAndDir { pos: goal, dir })
            })
            .filter(|goal_state: &SmallPosAndDir| {
                self.cost_from_start.get(goal_state).copied() == Some(self.min_cost)
            })
            .collect()
    }

    fn mark(&mut self, pos: SmallPos) {
        let index: usize = self.maze.grid.index_from_pos(pos.get());

        self.best_cells.set(index, true);
    }
}

impl<'m> BreadthFirstSearch for BestCellMarker<'m> {
    type Vertex = SmallPosAndDir;

    fn starts(&self) -> Vec<Self::Vertex> {
        self.min_cost_goal_states()
    }

    fn is_end(&self, _vertex: &Self::Vertex) -> bool {
        false
    }

    fn path_to(&self, _vertex: &Self::Vertex) -> Vec<Self::Vertex> {
        Vec::new()
    }

    fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>) {
        neighbors.clear();

        let Some(cost) = self.cost_from_start.get(vertex).copied() else {
            return;
        };

        let dir: Direction = vertex.dir;
        let back_pos: IVec2 = vertex.pos.get() - dir.vec();

        if let Some(back) = SmallPosAndDir::try_from_pos_and_dir(back_pos, dir) {
            if self
                .cost_from_start
                .get(&back)
                .map_or(false, |&back_cost: &u32| back_cost + 1_u32 == cost)
            {
                neighbors.push(back);
            }
        }

        for turn_dir in [dir.prev(), dir.next()] {
            let turn: SmallPosAndDir = SmallPosAndDir {
                pos: vertex.pos,
                dir: turn_dir,
            };

            if self
                .cost_from_start
                .get(&turn)
                .map_or(false, |&turn_cost: &u32| {
                    turn_cost + self.turn_penalty == cost
                })
            {
                neighbors.push(turn);
            }
        }
    }

    fn update_parent(&mut self, _from: &Self::Vertex, to: &Self::Vertex) {
        let pos: SmallPos = to.pos;

        self.mark(pos);
    }

    fn reset(&mut self) {
        self.best_cells = BitVec::repeat(false, self.maze.grid.area());

        for goal_state in self.min_cost_goal_states() {
            self.mark(goal_state.pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::sync::OnceLock};

    const MAZE_STRS: &[&str] = &[
        "\
        ###############\n\
        #.......#....E#\n\
        #.#.###.#.###.#\n\
        #.....#.#...#.#\n\
        #.###.#####.#.#\n\
        #.#.#.......#.#\n\
        #.#.#####.###.#\n\
        #...........#.#\n\
        ###.#.#####.#.#\n\
        #...#.....#.#.#\n\
        #.#.#.###.#.#.#\n\
        #.....#...#.#.#\n\
        #.###.#.#.#.#.#\n\
        #S..#.....#...#\n\
        ###############",
        "\
        #################\n\
        #...#...#...#..E#\n\
        #.#.#.#.#.#.#.#.#\n\
        #.#.#.#...#...#.#\n\
        #.#.#.#.###.#.#.#\n\
        #...#.#.#.....#.#\n\
        #.#.#.#.#.#####.#\n\
        #.#...#.#.#.....#\n\
        #.#.#####.#.###.#\n\
        #.#.#.......#...#\n\
        #.#.###.#####.###\n\
        #.#.#...#.....#.#\n\
        #.#.#.#####.###.#\n\
        #.#.#.........#.#\n\
        #.#.#.#########.#\n\
        #S#.............#\n\
        #################",
    ];

    fn maze(index: usize) -> &'static Maze {
        static ONCE_LOCK: OnceLock<Vec<Maze>> = OnceLock::new();

        &ONCE_LOCK.get_or_init(|| {
            MAZE_STRS
                .iter()
                .map(|maze_str: &&str| Maze::try_from(*maze_str).unwrap())
                .collect()
        })[index]
    }

    fn route(index: usize) -> &'static Route {
        static ONCE_LOCK: OnceLock<Vec<Route>> = OnceLock::new();

        &ONCE_LOCK.get_or_init(|| {
            (0_usize..MAZE_STRS.len())
                .map(|index: usize| maze(index).route(DEFAULT_TURN_PENALTY))
                .collect()
        })[index]
    }

    #[test]
    fn test_try_from_str() {
        let maze: &Maze = maze(0_usize);

        assert_eq!(maze.grid().dimensions(), IVec2::new(15_i32, 15_i32));
        assert_eq!(maze.start().pos.get(), IVec2::new(1_i32, 13_i32));
        assert_eq!(maze.start().dir, Direction::East);
        assert_eq!(
            maze.goals(),
            // SAFETY: Trivial
            &[unsafe { SmallPos::from_pos_unsafe(IVec2::new(13_i32, 1_i32)) }]
        );
    }

    #[test]
    fn test_build_errors() {
        use MazeBuildError::*;

        let grid = |grid_str: &str| -> Grid2D<Cell> { Grid2D::parse(grid_str).unwrap().1 };

        assert_eq!(
            Maze::try_from_grid(grid("..E"), Direction::East).err(),
            Some(NoStart)
        );
        assert_eq!(
            Maze::try_from_grid(grid("S.SE"), Direction::East).err(),
            Some(MultipleStarts)
        );
        assert_eq!(
            Maze::try_from_grid(grid("S.."), Direction::East).err(),
            Some(NoGoal)
        );
        assert_eq!(
            Maze::try_from_grid(grid("S.OE"), Direction::East).err(),
            Some(PathAnnotationInInput)
        );
    }

    #[test]
    fn test_ragged_grid_fails_to_parse() {
        assert!(Maze::try_from("S.E\n..").is_err());
    }

    #[test]
    fn test_min_cost() {
        assert_eq!(route(0_usize).min_cost(), Some(7036_u32));
        assert_eq!(route(1_usize).min_cost(), Some(11048_u32));
    }

    #[test]
    fn test_best_cell_count() {
        assert_eq!(route(0_usize).best_cell_count(), 45_usize);
        assert_eq!(route(1_usize).best_cell_count(), 64_usize);
    }

    #[test]
    fn test_unreachable_goal() {
        let route: Route = Maze::try_from("S#E").unwrap().route(DEFAULT_TURN_PENALTY);

        assert_eq!(route.min_cost(), None);
        assert_eq!(route.best_cell_count(), 0_usize);
    }

    #[test]
    fn test_multiple_goals() {
        let maze: Maze = Maze::try_from("S.E\n...\nE..").unwrap();
        let route: Route = maze.route(DEFAULT_TURN_PENALTY);

        // Only the straight-ahead goal is reachable at the minimum cost
        assert_eq!(route.min_cost(), Some(2_u32));
        assert_eq!(route.best_cell_count(), 3_usize);
        assert!(route.is_best_cell(IVec2::new(2_i32, 0_i32)));
        assert!(!route.is_best_cell(IVec2::new(0_i32, 2_i32)));
    }

    #[test]
    fn test_single_turn_route() {
        let maze: Maze = Maze::try_from("....E\n.....\n.....\n.....\nS....").unwrap();
        let route: Route = maze.route(DEFAULT_TURN_PENALTY);

        // The only single-turn route hugs the bottom and right edges
        assert_eq!(route.min_cost(), Some(1008_u32));
        assert_eq!(route.best_cell_count(), 9_usize);
        assert!(route.is_best_cell(IVec2::new(4_i32, 4_i32)));
        assert!(!route.is_best_cell(IVec2::new(0_i32, 0_i32)));
    }

    #[test]
    fn test_turn_penalty_monotonicity() {
        let maze: &Maze = maze(0_usize);
        let mut prev_min_cost: u32 = 0_u32;

        for turn_penalty in [0_u32, 1_u32, 10_u32, 100_u32, 1000_u32] {
            let min_cost: u32 = maze.route(turn_penalty).min_cost().unwrap();

            assert!(min_cost >= prev_min_cost);
            prev_min_cost = min_cost;
        }
    }

    #[test]
    fn test_best_cells_connected() {
        use strum::IntoEnumIterator;

        let route: &Route = route(0_usize);

        for pos in route.iter_best_cells() {
            assert!(Direction::iter()
                .any(|dir: Direction| route.is_best_cell(pos + dir.vec())));
        }
    }

    #[test]
    fn test_endpoints_are_best_cells() {
        for index in 0_usize..MAZE_STRS.len() {
            let maze: &Maze = maze(index);
            let route: &Route = route(index);

            assert!(route.is_best_cell(maze.start().pos.get()));
            assert!(route.is_best_cell(maze.goals()[0_usize].get()));
        }
    }

    #[test]
    fn test_annotated_grid_string() {
        let maze: Maze = Maze::try_from("S.E\n...\nE..").unwrap();
        let route: Route = maze.route(DEFAULT_TURN_PENALTY);

        assert_eq!(maze.annotated_grid_string(&route), "OOO\n...\nE..\n");
    }
}
