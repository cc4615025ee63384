pub mod chord;
pub mod mode;
pub mod note;
pub mod scale;
