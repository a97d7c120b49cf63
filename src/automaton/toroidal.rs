//! Toroidal addressing over a [`BitGrid`].
//!
//! A view is a borrowed grid plus coordinate wrapping; the grid itself stays
//! a plain rectangle.

use super::grid::BitGrid;

/// Wrap `n` into `[0, len)`, including negative offsets.
#[inline]
pub fn wrap(n: i64, len: usize) -> usize {
    n.rem_euclid(len as i64) as usize
}

/// Read-only toroidal view: both coordinates wrap modulo the grid's shape.
#[derive(Clone, Copy)]
pub struct ToroidalView<'a> {
    grid: &'a BitGrid,
}

impl<'a> ToroidalView<'a> {
    pub fn new(grid: &'a BitGrid) -> Self {
        ToroidalView { grid }
    }

    #[inline]
    pub fn is_alive(&self, row: i64, col: i64) -> bool {
        self.grid
            .cell(wrap(row, self.grid.height()), wrap(col, self.grid.width()))
    }

    pub fn grid(&self) -> &'a BitGrid {
        self.grid
    }
}

/// Mutable toroidal view.
pub struct ToroidalViewMut<'a> {
    grid: &'a mut BitGrid,
}

impl<'a> ToroidalViewMut<'a> {
    pub fn new(grid: &'a mut BitGrid) -> Self {
        ToroidalViewMut { grid }
    }

    pub fn is_alive(&self, row: i64, col: i64) -> bool {
        ToroidalView::new(self.grid).is_alive(row, col)
    }

    pub fn set(&mut self, row: i64, col: i64, alive: bool) {
        let (height, width) = (self.grid.height(), self.grid.width());
        self.grid.put(wrap(row, height), wrap(col, width), alive);
    }
}

impl BitGrid {
    pub fn toroidal(&self) -> ToroidalView<'_> {
        ToroidalView::new(self)
    }

    pub fn toroidal_mut(&mut self) -> ToroidalViewMut<'_> {
        ToroidalViewMut::new(self)
    }
}
