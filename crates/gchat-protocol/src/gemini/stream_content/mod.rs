pub mod request;
pub mod response;

pub use request::StreamGenerateContentRequest;
pub use response::StreamGenerateContentResponse;
