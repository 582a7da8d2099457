pub mod chat2gemini;
