pub mod persistence;
pub mod player;
pub mod project;
pub mod recorder;
pub mod stroke_buffer;
pub mod take;
pub mod voice_binding;
