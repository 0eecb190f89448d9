//! The grid model: dense per-cell search records, designated endpoints and
//! validated mutators.

use crate::SessionError;
use core::fmt;
use grid_util::grid::{Grid, SimpleGrid};
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;

/// Occupancy of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellKind {
    #[default]
    Free,
    Obstacle,
}

/// Per-cell search record. `distance` is the Manhattan distance to the goal
/// recorded when the cell was discovered and is only meaningful while
/// `visited` is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    pub distance: i32,
    pub visited: bool,
}

/// [SearchGrid] owns a dense grid of [Cell] records in a [SimpleGrid]
/// together with the designated `start` and `end` cells. In addition it
/// maintains information about components of mutually reachable free cells
/// using a [UnionFind] structure, so hosts can predict a doomed run without
/// flood-filling. Implements [Grid] by building on [SimpleGrid].
#[derive(Clone, Debug)]
pub struct SearchGrid {
    pub cells: SimpleGrid<Cell>,
    pub start: Option<Point>,
    pub end: Option<Point>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl Default for SearchGrid {
    fn default() -> SearchGrid {
        SearchGrid {
            cells: SimpleGrid::default(),
            start: None,
            end: None,
            components: UnionFind::new(0),
            components_dirty: false,
        }
    }
}

impl SearchGrid {
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cells.width && (y as usize) < self.cells.height
    }

    /// The cell record at `point`, or [None] when out of bounds.
    pub fn cell(&self, point: &Point) -> Option<Cell> {
        if self.in_bounds(point.x, point.y) {
            Some(self.cells.get_point(*point))
        } else {
            None
        }
    }

    pub fn is_designated(&self, point: &Point) -> bool {
        self.start == Some(*point) || self.end == Some(*point)
    }

    /// Whether the search may enter `point`. The `end` cell is always
    /// enterable so the goal check composes even if its record were blocked
    /// through the raw grid.
    pub fn passable(&self, point: &Point) -> bool {
        if !self.in_bounds(point.x, point.y) {
            return false;
        }
        if self.end == Some(*point) {
            return true;
        }
        self.cells.get_point(*point).kind != CellKind::Obstacle
    }

    fn open(&self, point: &Point) -> bool {
        self.in_bounds(point.x, point.y)
            && self.cells.get_point(*point).kind != CellKind::Obstacle
    }

    /// The passable axis-aligned neighbours of `point` in the canonical
    /// expansion order: up, left, right, down.
    pub fn neighbors(&self, point: &Point) -> Vec<Point> {
        [
            Point::new(point.x, point.y + 1),
            Point::new(point.x - 1, point.y),
            Point::new(point.x + 1, point.y),
            Point::new(point.x, point.y - 1),
        ]
        .into_iter()
        .filter(|p| self.passable(p))
        .collect::<Vec<Point>>()
    }

    /// Flips a cell between free and obstacle, or force-sets it to obstacle
    /// when `sticky` (hold-to-paint). Rejects out-of-bounds points and the
    /// designated cells.
    pub fn toggle_obstacle(&mut self, point: Point, sticky: bool) -> Result<(), SessionError> {
        if !self.in_bounds(point.x, point.y) {
            return Err(SessionError::OutOfBounds(point));
        }
        if self.is_designated(&point) {
            return Err(SessionError::InvalidDesignation(point));
        }
        let cell = self.cells.get_point(point);
        let kind = match cell.kind {
            CellKind::Obstacle if !sticky => CellKind::Free,
            _ => CellKind::Obstacle,
        };
        self.set(point.x as usize, point.y as usize, Cell { kind, ..cell });
        Ok(())
    }

    /// Designates `point` as an endpoint: the first designation sets `start`,
    /// the second sets `end`, and any further designation replaces `start`
    /// and clears `end`. Setting `end` equal to `start` is rejected, so the
    /// two are never equal and `end` is never set while `start` is not.
    pub fn designate_endpoint(&mut self, point: Point) -> Result<(), SessionError> {
        if !self.in_bounds(point.x, point.y) {
            return Err(SessionError::OutOfBounds(point));
        }
        match (self.start, self.end) {
            (None, _) => self.start = Some(point),
            (Some(start), None) => {
                if start == point {
                    return Err(SessionError::InvalidDesignation(point));
                }
                self.end = Some(point);
            }
            (Some(_), Some(_)) => {
                self.start = Some(point);
                self.end = None;
            }
        }
        Ok(())
    }

    /// Clears `distance` and `visited` on every cell, keeping the obstacle
    /// layout. Never called by a running search.
    pub fn reset_computed(&mut self) {
        for x in 0..self.cells.width {
            for y in 0..self.cells.height {
                let cell = self.cells.get(x, y);
                self.cells.set(
                    x,
                    y,
                    Cell {
                        distance: 0,
                        visited: false,
                        ..cell
                    },
                );
            }
        }
    }

    /// Records a discovery: marks `point` visited with its computed distance.
    pub(crate) fn mark_discovered(&mut self, point: &Point, distance: i32) {
        let cell = self.cells.get_point(*point);
        self.cells.set_point(
            *point,
            Cell {
                distance,
                visited: true,
                ..cell
            },
        );
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, point: &Point) -> usize {
        self.components.find(self.cells.get_ix_point(point))
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.in_bounds(start.x, start.y) && self.in_bounds(goal.x, goal.y) {
            let start_ix = self.cells.get_ix_point(start);
            let goal_ix = self.cells.get_ix_point(goal);
            !self.components.equiv(start_ix, goal_ix)
        } else {
            true
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("components are stale, regenerating");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up grid neighbours to
    /// the same components. Components follow raw occupancy on a 4-grid;
    /// linking up and right suffices during the sweep.
    pub fn generate_components(&mut self) {
        let w = self.cells.width;
        let h = self.cells.height;
        self.components = UnionFind::new(w * h);
        self.components_dirty = false;
        for x in 0..w as i32 {
            for y in 0..h as i32 {
                let point = Point::new(x, y);
                if self.cells.get_point(point).kind == CellKind::Obstacle {
                    continue;
                }
                let parent_ix = self.cells.get_ix_point(&point);
                let neighbours = [Point::new(x, y + 1), Point::new(x + 1, y)]
                    .into_iter()
                    .filter(|p| self.open(p))
                    .map(|p| self.cells.get_ix_point(&p))
                    .collect::<Vec<usize>>();
                for ix in neighbours {
                    self.components.union(parent_ix, ix);
                }
            }
        }
    }
}

impl fmt::Display for SearchGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.cells.height as i32).rev() {
            for x in 0..self.cells.width as i32 {
                let p = Point::new(x, y);
                let glyph = if self.start == Some(p) {
                    'S'
                } else if self.end == Some(p) {
                    'G'
                } else {
                    let cell = self.cells.get_point(p);
                    match cell.kind {
                        CellKind::Obstacle => '#',
                        CellKind::Free if cell.visited => 'o',
                        CellKind::Free => '.',
                    }
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Grid<Cell> for SearchGrid {
    fn new(width: usize, height: usize, default_value: Cell) -> Self {
        SearchGrid {
            cells: SimpleGrid::new(width, height, default_value),
            start: None,
            end: None,
            components: UnionFind::new(width * height),
            components_dirty: true,
        }
    }
    fn get(&self, x: usize, y: usize) -> Cell {
        self.cells.get(x, y)
    }
    /// Raw cell write. Joins newly connected components and flags the
    /// components as dirty if components are (potentially) broken apart into
    /// multiple.
    fn set(&mut self, x: usize, y: usize, value: Cell) {
        let p = Point::new(x as i32, y as i32);
        let was_open = self.cells.get(x, y).kind != CellKind::Obstacle;
        if was_open && value.kind == CellKind::Obstacle {
            self.components_dirty = true;
        } else if value.kind != CellKind::Obstacle {
            let p_ix = self.cells.get_ix(x, y);
            let neighbours = [
                Point::new(p.x, p.y + 1),
                Point::new(p.x - 1, p.y),
                Point::new(p.x + 1, p.y),
                Point::new(p.x, p.y - 1),
            ]
            .into_iter()
            .filter(|n| self.open(n))
            .map(|n| self.cells.get_ix_point(&n))
            .collect::<Vec<usize>>();
            for ix in neighbours {
                self.components.union(p_ix, ix);
            }
        }
        self.cells.set(x, y, value);
    }
    fn width(&self) -> usize {
        self.cells.width
    }
    fn height(&self) -> usize {
        self.cells.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize) -> SearchGrid {
        SearchGrid::new(width, height, Cell::default())
    }

    #[test]
    fn toggle_flips_and_sticky_paints() {
        let mut g = grid(3, 3);
        let p = Point::new(1, 1);
        g.toggle_obstacle(p, false).unwrap();
        assert_eq!(g.cell(&p).unwrap().kind, CellKind::Obstacle);
        g.toggle_obstacle(p, false).unwrap();
        assert_eq!(g.cell(&p).unwrap().kind, CellKind::Free);
        // Sticky painting never flips back while the pointer is held.
        g.toggle_obstacle(p, true).unwrap();
        g.toggle_obstacle(p, true).unwrap();
        assert_eq!(g.cell(&p).unwrap().kind, CellKind::Obstacle);
    }

    #[test]
    fn toggle_rejects_out_of_bounds() {
        let mut g = grid(3, 3);
        let p = Point::new(3, 0);
        assert_eq!(
            g.toggle_obstacle(p, false),
            Err(SessionError::OutOfBounds(p))
        );
        assert_eq!(
            g.toggle_obstacle(Point::new(0, -1), false),
            Err(SessionError::OutOfBounds(Point::new(0, -1)))
        );
    }

    /// Toggling the designated start must be rejected and leave the cell free.
    #[test]
    fn toggle_rejects_designated_cells() {
        let mut g = grid(3, 3);
        let start = Point::new(0, 0);
        g.designate_endpoint(start).unwrap();
        assert_eq!(
            g.toggle_obstacle(start, false),
            Err(SessionError::InvalidDesignation(start))
        );
        assert_eq!(g.cell(&start).unwrap().kind, CellKind::Free);
    }

    /// First designation is start, second is end, third replaces start and
    /// clears end.
    #[test]
    fn designation_cycles() {
        let mut g = grid(4, 4);
        let a = Point::new(0, 0);
        let b = Point::new(3, 3);
        let c = Point::new(1, 2);
        g.designate_endpoint(a).unwrap();
        assert_eq!((g.start, g.end), (Some(a), None));
        g.designate_endpoint(b).unwrap();
        assert_eq!((g.start, g.end), (Some(a), Some(b)));
        g.designate_endpoint(c).unwrap();
        assert_eq!((g.start, g.end), (Some(c), None));
    }

    /// Designating the same point as start again must be rejected.
    #[test]
    fn designation_rejects_start_equal_end() {
        let mut g = grid(3, 3);
        let p = Point::new(1, 1);
        g.designate_endpoint(p).unwrap();
        assert_eq!(
            g.designate_endpoint(p),
            Err(SessionError::InvalidDesignation(p))
        );
        assert_eq!((g.start, g.end), (Some(p), None));
    }

    #[test]
    fn designation_rejects_out_of_bounds() {
        let mut g = grid(2, 2);
        assert_eq!(
            g.designate_endpoint(Point::new(5, 5)),
            Err(SessionError::OutOfBounds(Point::new(5, 5)))
        );
        assert_eq!((g.start, g.end), (None, None));
    }

    /// Neighbours come back in the canonical order up, left, right, down,
    /// skipping obstacles and out-of-bounds points.
    #[test]
    fn neighbors_in_canonical_order() {
        let mut g = grid(3, 3);
        let center = Point::new(1, 1);
        assert_eq!(
            g.neighbors(&center),
            vec![
                Point::new(1, 2),
                Point::new(0, 1),
                Point::new(2, 1),
                Point::new(1, 0),
            ]
        );
        g.toggle_obstacle(Point::new(0, 1), true).unwrap();
        assert_eq!(
            g.neighbors(&center),
            vec![Point::new(1, 2), Point::new(2, 1), Point::new(1, 0)]
        );
        // Corner cell only has in-bounds neighbours.
        assert_eq!(
            g.neighbors(&Point::new(0, 0)),
            vec![Point::new(0, 1), Point::new(1, 0)]
        );
    }

    /// The goal cell stays passable regardless of its raw record.
    #[test]
    fn end_is_always_passable() {
        let mut g = grid(3, 1);
        let end = Point::new(2, 0);
        g.designate_endpoint(Point::new(0, 0)).unwrap();
        g.designate_endpoint(end).unwrap();
        let raw = g.cells.get_point(end);
        g.cells.set_point(
            end,
            Cell {
                kind: CellKind::Obstacle,
                ..raw
            },
        );
        assert!(g.passable(&end));
        assert_eq!(g.neighbors(&Point::new(1, 0)), vec![Point::new(0, 0), end]);
    }

    #[test]
    fn reset_computed_clears_search_state_only() {
        let mut g = grid(2, 2);
        g.toggle_obstacle(Point::new(1, 1), true).unwrap();
        g.mark_discovered(&Point::new(0, 0), 7);
        g.reset_computed();
        let cell = g.cell(&Point::new(0, 0)).unwrap();
        assert!(!cell.visited);
        assert_eq!(cell.distance, 0);
        assert_eq!(g.cell(&Point::new(1, 1)).unwrap().kind, CellKind::Obstacle);
    }

    /// Tests whether points are correctly mapped to different connected
    /// components. Corresponds to the following 3x1 grid:
    ///  ___
    /// |.#.|
    ///  ___
    #[test]
    fn component_generation_splits_on_walls() {
        let mut g = grid(3, 1);
        g.toggle_obstacle(Point::new(1, 0), true).unwrap();
        g.generate_components();
        assert!(g.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
        assert!(g.reachable(&Point::new(0, 0), &Point::new(0, 0)));
    }

    /// A diagonal gap does not connect on a 4-grid:
    ///  __
    /// |.#|
    /// |#.|
    ///  __
    #[test]
    fn components_have_no_diagonal_links() {
        let mut g = grid(2, 2);
        g.toggle_obstacle(Point::new(1, 0), true).unwrap();
        g.toggle_obstacle(Point::new(0, 1), true).unwrap();
        g.generate_components();
        assert!(g.unreachable(&Point::new(0, 0), &Point::new(1, 1)));
    }

    /// Freeing a wall cell re-joins the components without a full rebuild.
    #[test]
    fn set_rejoins_components_when_freed() {
        let mut g = grid(3, 1);
        g.toggle_obstacle(Point::new(1, 0), true).unwrap();
        g.generate_components();
        assert!(g.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
        g.toggle_obstacle(Point::new(1, 0), false).unwrap();
        assert!(g.reachable(&Point::new(0, 0), &Point::new(2, 0)));
    }

    #[test]
    fn blocking_marks_components_dirty() {
        let mut g = grid(3, 1);
        g.generate_components();
        assert!(!g.components_dirty);
        g.toggle_obstacle(Point::new(1, 0), true).unwrap();
        assert!(g.components_dirty);
        g.update();
        assert!(!g.components_dirty);
        assert!(g.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
    }

    #[test]
    fn display_renders_glyphs() {
        let mut g = grid(3, 1);
        g.designate_endpoint(Point::new(0, 0)).unwrap();
        g.designate_endpoint(Point::new(2, 0)).unwrap();
        g.toggle_obstacle(Point::new(1, 0), true).unwrap();
        assert_eq!(format!("{}", g), "S#G\n");
    }
}
