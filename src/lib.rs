//! # grid_bestfirst
//!
//! A steppable [greedy best-first search](https://en.wikipedia.org/wiki/Best-first_search)
//! over a 2D grid with user-placed obstacles. A [SearchSession] advances by
//! exactly one frontier expansion per [SearchSession::advance] call, so a
//! host can animate the search frame by frame instead of running it to
//! completion. Frontier priority is the Manhattan distance to the goal, not
//! the accumulated path cost: every run terminates, but the route it
//! discovers is not guaranteed to be minimum-hop when obstacles force
//! detours away from the heuristic direction. Pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! so hosts can predict an unreachable goal without flood-filling behaviour.
pub mod frontier;
pub mod search_grid;

use crate::frontier::Frontier;
use crate::search_grid::{Cell, SearchGrid};
use core::fmt;
use fxhash::FxBuildHasher;
use grid_util::grid::Grid;
use grid_util::point::Point;
use indexmap::IndexMap;
use log::{debug, info, warn};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Manhattan distance between two points, used directly as frontier
/// priority.
pub fn manhattan_distance(a: &Point, b: &Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Walks the discovery parents back from the entry at `start` to the seed
/// (whose parent is the `usize::MAX` sentinel) and reverses the result.
fn reverse_path(parents: &FxIndexMap<Point, usize>, start: usize) -> Vec<Point> {
    let mut path: Vec<Point> = itertools::unfold(start, |i| {
        parents.get_index(*i).map(|(point, &parent)| {
            *i = parent;
            *point
        })
    })
    .collect();
    path.reverse();
    path
}

/// Execution phase of a [SearchSession].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    /// No active frontier; the grid is freely editable.
    Idle,
    /// A run is consuming the frontier; grid edits are rejected.
    Running,
    /// A run ended, by reaching the goal or by exhausting the frontier.
    /// Terminal until [SearchSession::reset] returns the session to
    /// [SearchState::Idle].
    Finished,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A cleanly rejected command. All variants are local and recoverable: every
/// input is either accepted or rejected without side effect, and nothing in
/// the session panics on bad input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The coordinate lies outside the grid.
    OutOfBounds(Point),
    /// Start/end designation conflict, or an obstacle toggle on a designated
    /// cell.
    InvalidDesignation(Point),
    /// The operation is not permitted in the current state, including
    /// starting a run without both endpoints designated.
    IllegalStateTransition(SearchState),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionError::OutOfBounds(point) => {
                write!(f, "point {} lies outside the grid", point)
            }
            SessionError::InvalidDesignation(point) => {
                write!(f, "invalid designation at {}", point)
            }
            SessionError::IllegalStateTransition(state) => {
                write!(f, "operation not permitted while {}", state)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Read-only snapshot of a session for rendering one frame.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub width: usize,
    pub height: usize,
    /// Cell records (kind, visited, distance) and component queries.
    pub grid: &'a SearchGrid,
    pub start: Option<Point>,
    pub end: Option<Point>,
    /// Hover cell stored via [SearchSession::set_active_cell]; never
    /// interpreted by the engine.
    pub active_cell: Option<Point>,
    pub state: SearchState,
    /// Pending frontier entries; enumerate with [Frontier::entries].
    pub frontier: &'a Frontier<i32>,
    /// The discovered route, present once a run finished by reaching the
    /// goal.
    pub path: Option<&'a [Point]>,
}

/// An interactive search session: the grid model, the priority frontier and
/// the state machine that consumes it. One session owns its grid and
/// frontier exclusively; hosts drive it with [SearchSession::advance] once
/// per animation tick and read it back through [SearchSession::inspect].
///
/// All operations complete synchronously and assume a single caller; there
/// is no internal locking. Mode checks on the state are the only concurrency
/// control, which suffices for interleaved calls from input handlers and a
/// tick driver.
#[derive(Clone, Debug)]
pub struct SearchSession {
    grid: SearchGrid,
    frontier: Frontier<i32>,
    parents: FxIndexMap<Point, usize>,
    path: Option<Vec<Point>>,
    active_cell: Option<Point>,
    state: SearchState,
}

impl SearchSession {
    /// Creates a fresh [SearchState::Idle] session over an all-free grid.
    pub fn new(width: usize, height: usize) -> SearchSession {
        SearchSession {
            grid: SearchGrid::new(width, height, Cell::default()),
            frontier: Frontier::new(),
            parents: FxIndexMap::default(),
            path: None,
            active_cell: None,
            state: SearchState::Idle,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn grid(&self) -> &SearchGrid {
        &self.grid
    }

    /// The route discovered by the last finished run, start to goal, or
    /// [None] if no run reached the goal since the last reset. Follows the
    /// greedy discovery parents, so it is a valid route but not necessarily
    /// a shortest one.
    pub fn path(&self) -> Option<&[Point]> {
        self.path.as_deref()
    }

    /// Points in the order the search discovered them, oldest first.
    pub fn discovery_order(&self) -> impl Iterator<Item = Point> + '_ {
        self.parents.keys().copied()
    }

    fn require_idle(&self) -> Result<(), SessionError> {
        if self.state == SearchState::Idle {
            Ok(())
        } else {
            Err(SessionError::IllegalStateTransition(self.state))
        }
    }

    /// Paints or clears an obstacle; see [SearchGrid::toggle_obstacle] for
    /// the cell-level rules. Only permitted while [SearchState::Idle].
    pub fn toggle_obstacle(&mut self, point: Point, sticky: bool) -> Result<(), SessionError> {
        self.require_idle()?;
        self.grid.toggle_obstacle(point, sticky)
    }

    /// Designates `point` as an endpoint; see
    /// [SearchGrid::designate_endpoint] for the cycling rule. Only permitted
    /// while [SearchState::Idle].
    pub fn designate_endpoint(&mut self, point: Point) -> Result<(), SessionError> {
        self.require_idle()?;
        self.grid.designate_endpoint(point)
    }

    /// Stores the hover cell for renderers. Permitted in any state; the
    /// engine stores the value without interpreting it.
    pub fn set_active_cell(&mut self, point: Option<Point>) -> Result<(), SessionError> {
        if let Some(p) = point {
            if self.grid.cell(&p).is_none() {
                return Err(SessionError::OutOfBounds(p));
            }
        }
        self.active_cell = point;
        Ok(())
    }

    pub fn active_cell(&self) -> Option<Point> {
        self.active_cell
    }

    /// Regenerates the connected components if obstacle edits made them
    /// stale, so [SearchGrid::reachable] answers are current.
    pub fn refresh_components(&mut self) {
        self.grid.update();
    }

    /// Seeds the frontier with `start` at priority zero and transitions
    /// [SearchState::Idle] to [SearchState::Running]. Fails without side
    /// effect unless the session is idle with both endpoints designated.
    ///
    /// The start cell is marked visited here with its own heuristic
    /// distance, so every cell enters the frontier at most once over the
    /// whole run.
    pub fn start_run(&mut self) -> Result<(), SessionError> {
        self.require_idle()?;
        let (Some(start), Some(end)) = (self.grid.start, self.grid.end) else {
            return Err(SessionError::IllegalStateTransition(self.state));
        };
        self.grid.update();
        if self.grid.unreachable(&start, &end) {
            // Prediction only; the run itself reports no-path by draining
            // the frontier.
            info!(
                "{} is separated from {}; this run will exhaust its frontier",
                end, start
            );
        }
        self.grid
            .mark_discovered(&start, manhattan_distance(&start, &end));
        self.parents.insert(start, usize::MAX);
        self.frontier.seed(start);
        self.state = SearchState::Running;
        info!("run started from {} towards {}", start, end);
        Ok(())
    }

    /// Performs exactly one frontier expansion: pops the minimum-priority
    /// point, finishes if it is the goal or the frontier was exhausted, and
    /// otherwise discovers the unvisited neighbours of the popped point,
    /// recording their Manhattan distance to the goal and enqueueing them at
    /// that same distance.
    ///
    /// Outside [SearchState::Running] this is a documented no-op, not an
    /// error; callers observe the outcome through the returned state.
    pub fn advance(&mut self) -> SearchState {
        if self.state != SearchState::Running {
            return self.state;
        }
        let Some(end) = self.grid.end else {
            warn!("running session has no designated end; ignoring step");
            return self.state;
        };
        let Some((point, priority)) = self.frontier.extract_min() else {
            info!("frontier exhausted before reaching {}: no path", end);
            self.state = SearchState::Finished;
            return self.state;
        };
        if point == end {
            let end_ix = self.parents.get_index_of(&end).unwrap();
            self.path = Some(reverse_path(&self.parents, end_ix));
            info!(
                "goal {} reached after {} discoveries",
                end,
                self.parents.len()
            );
            self.state = SearchState::Finished;
            return self.state;
        }
        debug!("expanding {} at priority {}", point, priority);
        let parent_ix = self.parents.get_index_of(&point).unwrap();
        for neighbor in self.grid.neighbors(&point) {
            if self.grid.cells.get_point(neighbor).visited {
                continue;
            }
            let distance = manhattan_distance(&neighbor, &end);
            self.grid.mark_discovered(&neighbor, distance);
            self.parents.insert(neighbor, parent_ix);
            self.frontier.insert(neighbor, distance);
        }
        self.state
    }

    /// Returns the session to [SearchState::Idle]: clears the frontier, the
    /// endpoints and all computed cell state, keeping the obstacle layout.
    /// Rejected while [SearchState::Running].
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.state == SearchState::Running {
            return Err(SessionError::IllegalStateTransition(self.state));
        }
        self.frontier.clear();
        self.parents.clear();
        self.path = None;
        self.grid.start = None;
        self.grid.end = None;
        self.grid.reset_computed();
        self.state = SearchState::Idle;
        info!("session reset");
        Ok(())
    }

    /// Cancels a run in flight: [SearchState::Running] back to
    /// [SearchState::Idle], dropping the frontier and computed cell state
    /// while keeping the obstacle layout and both endpoints. Rejected in any
    /// other state.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        if self.state != SearchState::Running {
            return Err(SessionError::IllegalStateTransition(self.state));
        }
        self.frontier.clear();
        self.parents.clear();
        self.path = None;
        self.grid.reset_computed();
        self.state = SearchState::Idle;
        info!("run aborted");
        Ok(())
    }

    /// Read-only snapshot of everything a renderer needs for one frame.
    pub fn inspect(&self) -> Snapshot<'_> {
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            grid: &self.grid,
            start: self.grid.start,
            end: self.grid.end,
            active_cell: self.active_cell,
            state: self.state,
            frontier: &self.frontier,
            path: self.path.as_deref(),
        }
    }
}
