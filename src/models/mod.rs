pub mod istates;
pub mod icommands;

pub use istates::*;
pub use icommands::*;
