pub mod atom;
pub mod bonding;
pub mod molecule;
pub mod sim_box;
