mod router;

pub use router::Router;
