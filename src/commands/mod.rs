pub mod build;
pub mod evaluate;
pub mod select;
pub mod status;
pub mod tag;
