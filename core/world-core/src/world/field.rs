use math::{quantize, Point};

use super::{agent::Agent, boundary::Boundary, commons::HealthType};

const MAX_MESH: usize = 512;

/// Uniform mesh over the bounding box of the boundary, bucketing the indices
/// of active agents. A cell is never narrower than the infection radius, so
/// every source within the radius of a point sits in the point's cell or in
/// one of its eight neighbours.
pub(crate) struct Field {
    origin: Point,
    res_rate: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl Field {
    pub fn new(boundary: &Boundary, infection_radius: f64) -> Self {
        let (min, max) = boundary.bounding_box();
        let (w, h) = (max.x - min.x, max.y - min.y);
        let cell = infection_radius
            .max(w / MAX_MESH as f64)
            .max(h / MAX_MESH as f64);
        let cols = ((w / cell).ceil() as usize).clamp(1, MAX_MESH);
        let rows = ((h / cell).ceil() as usize).clamp(1, MAX_MESH);
        Self {
            origin: min,
            res_rate: 1.0 / cell,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn index(&self, pt: &Point) -> (usize, usize) {
        (
            quantize(pt.x - self.origin.x, self.res_rate, self.cols),
            quantize(pt.y - self.origin.y, self.res_rate, self.rows),
        )
    }

    /// Rebuilds the buckets from the agents currently active.
    pub fn refresh(&mut self, agents: &[Agent]) {
        for c in &mut self.cells {
            c.clear();
        }
        for (i, a) in agents.iter().enumerate() {
            if a.state() == HealthType::Active {
                let (col, row) = self.index(&a.pt());
                self.cells[row * self.cols + col].push(i);
            }
        }
    }

    /// Indices of the active agents bucketed around `pt`.
    pub fn around(&self, pt: &Point) -> impl Iterator<Item = usize> + '_ {
        let (col, row) = self.index(pt);
        let cols = col.saturating_sub(1)..=(col + 1).min(self.cols - 1);
        let rows = row.saturating_sub(1)..=(row + 1).min(self.rows - 1);
        rows.flat_map(move |r| {
            cols.clone()
                .flat_map(move |c| self.cells[r * self.cols + c].iter().copied())
        })
    }
}
