pub mod compose;
pub mod gate;
pub mod knowledge;
