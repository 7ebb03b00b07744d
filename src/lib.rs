//! Real-time 2D grid fluid: pointer forcing, Gauss-Seidel diffusion,
//! semi-Lagrangian advection and Jacobi pressure projection, mapped to an
//! RGBA frame every tick.

pub mod advection;
pub mod capture;
pub mod color;
pub mod config;
pub mod diffusion;
pub mod forcing;
pub mod grid;
pub mod input;
pub mod projection;
pub mod render;
pub mod simulator;
pub mod timing;
pub mod vorticity;

pub use color::{flip_rows, ChannelCurve, ColorMap};
pub use config::{AdvectionScheme, SimulationSettings, WallMode};
pub use forcing::{ForcingParams, PointerState};
pub use grid::{Cell, Channel, Direction, Field, Grid, GridShape};
pub use simulator::{run_frames, FluidSimulator, InputSource, Renderer, TickStats};
