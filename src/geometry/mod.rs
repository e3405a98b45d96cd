pub mod axis_box;
pub mod capacity;
pub mod corner;

pub use axis_box::*;
pub use capacity::*;
pub use corner::*;
