pub mod ident;
pub mod indexer;
pub mod library;
pub mod probe;
