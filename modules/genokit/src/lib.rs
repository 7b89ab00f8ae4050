pub mod cli;
pub mod code;
pub mod consts;
pub mod diff;
pub mod fasta;
pub mod frames;
pub mod genome;
pub mod mutation;
pub mod orthologs;
pub mod plot;
pub mod pretty;
pub mod stats;
pub mod utils;
