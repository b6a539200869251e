pub mod gateway;
pub mod gemini;
