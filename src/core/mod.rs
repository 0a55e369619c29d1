pub mod audio;
pub mod gfx;
pub mod input;
