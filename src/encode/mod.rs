//! Frame-to-video assembly: chunking, external encoder invocations and the assembler.

pub mod assemble;
pub mod chunk;
pub mod ffmpeg;
