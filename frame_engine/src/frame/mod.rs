/// Frame module - frames-in-flight synchronization and command list pool

pub mod frame_manager;

pub use frame_manager::*;
