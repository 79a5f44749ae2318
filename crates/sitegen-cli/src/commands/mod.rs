pub mod distances;
pub mod energies;
pub mod energy;
pub mod generate;
pub mod layers;
pub mod materialize;
