pub mod fastx;
pub mod file;
pub mod matcher;
pub mod reference;
pub mod router;
pub mod sam;
pub mod sequence;
