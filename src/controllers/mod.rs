pub mod garage_door;

pub use garage_door::GarageDoorController;
