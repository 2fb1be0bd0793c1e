pub mod consts;
pub mod error;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod quality;
pub mod selection;
pub mod stack;
pub mod stats;
