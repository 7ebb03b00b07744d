use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// One simulation sample: the amount of fluid and its local flow.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Cell {
    pub density: f32,
    /// Grid cells per unit time.
    pub velocity: Vec2,
}

impl Cell {
    pub fn channel(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Density | Channel::Scalar => self.density,
            Channel::VelocityX => self.velocity.x,
            Channel::VelocityY => self.velocity.y,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut f32 {
        match channel {
            Channel::Density | Channel::Scalar => &mut self.density,
            Channel::VelocityX => &mut self.velocity.x,
            Channel::VelocityY => &mut self.velocity.y,
        }
    }
}

/// Neighbor direction. `Up` is the previous row, `Down` the next one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const NEIGHBORS: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
}

/// Which float to read out of a grid-shaped array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    Density,
    VelocityX,
    VelocityY,
    /// The whole element of a scalar array (density when read from cells).
    Scalar,
}

impl Channel {
    pub const CELL: [Channel; 3] = [Channel::Density, Channel::VelocityX, Channel::VelocityY];
}

/// Anything laid out as `width * height` row-major samples.
pub trait Field {
    fn read(&self, index: usize, channel: Channel) -> f32;
}

impl Field for [Cell] {
    fn read(&self, index: usize, channel: Channel) -> f32 {
        self[index].channel(channel)
    }
}

impl Field for [f32] {
    fn read(&self, index: usize, _channel: Channel) -> f32 {
        self[index]
    }
}

/// Dimensions of a grid plus the edge-aware index arithmetic shared by every solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridShape {
    width: usize,
    height: usize,
}

impl GridShape {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width >= 3, "grid width must be >= 3, got {width}");
        assert!(height >= 3, "grid height must be >= 3, got {height}");
        Self { width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn is_boundary(&self, index: usize) -> bool {
        let (x, y) = self.coords(index);
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    /// Index of the neighbor in `direction`, or `None` when it would cross an edge.
    /// There are no ghost cells and no wraparound.
    pub fn neighbor(&self, direction: Direction, index: usize) -> Option<usize> {
        debug_assert!(index < self.len());
        let column = index % self.width;
        let row = index / self.width;
        match direction {
            Direction::None => Some(index),
            Direction::Up if row > 0 => Some(index - self.width),
            Direction::Down if row + 1 < self.height => Some(index + self.width),
            Direction::Left if column > 0 => Some(index - 1),
            Direction::Right if column + 1 < self.width => Some(index + 1),
            _ => None,
        }
    }

    /// Neighbor value, or `fallback` past the edge.
    pub fn access<F: Field + ?Sized>(
        &self,
        direction: Direction,
        index: usize,
        field: &F,
        channel: Channel,
        fallback: f32,
    ) -> f32 {
        match self.neighbor(direction, index) {
            Some(n) => field.read(n, channel),
            None => fallback,
        }
    }

    /// Neumann boundary: a missing neighbor reads as the center cell itself.
    pub fn access_clamped<F: Field + ?Sized>(
        &self,
        direction: Direction,
        index: usize,
        field: &F,
        channel: Channel,
    ) -> f32 {
        let center = field.read(index, channel);
        self.access(direction, index, field, channel, center)
    }

    /// Central difference `(right - left, down - up)` under the Neumann policy.
    pub fn central_difference<F: Field + ?Sized>(
        &self,
        index: usize,
        field: &F,
        channel: Channel,
    ) -> Vec2 {
        Vec2::new(
            self.access_clamped(Direction::Right, index, field, channel)
                - self.access_clamped(Direction::Left, index, field, channel),
            self.access_clamped(Direction::Down, index, field, channel)
                - self.access_clamped(Direction::Up, index, field, channel),
        )
    }

    /// Indices of every cell not on the outermost ring.
    pub fn interior(&self) -> impl Iterator<Item = usize> + '_ {
        (1..self.height - 1)
            .flat_map(move |y| (1..self.width - 1).map(move |x| y * self.width + x))
    }
}

/// The simulation grid. Owned by the simulator and sized once per dimension change.
#[derive(Clone, Debug)]
pub struct Grid {
    shape: GridShape,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let shape = GridShape::new(width, height);
        Self {
            shape,
            cells: vec![Cell::zeroed(); shape.len()],
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.shape.idx(x, y)]
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        let i = self.shape.idx(x, y);
        &mut self.cells[i]
    }

    /// Replace every cell from `source`, which must match the grid size exactly.
    pub fn copy_from(&mut self, source: &[Cell]) {
        assert_eq!(
            source.len(),
            self.cells.len(),
            "cell buffer does not match {}x{} grid",
            self.width(),
            self.height()
        );
        self.cells.copy_from_slice(source);
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::zeroed());
    }

    pub fn total_density(&self) -> f32 {
        self.cells.iter().map(|c| c.density).sum()
    }

    pub fn peak_speed(&self) -> f32 {
        self.cells
            .iter()
            .map(|c| c.velocity.length())
            .fold(0.0, f32::max)
    }

    pub fn is_finite(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.density.is_finite() && c.velocity.is_finite())
    }
}
