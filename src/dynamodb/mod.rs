pub mod backend;
pub mod debug;
pub mod json;
pub mod schema;
pub mod size;
pub mod value;

pub use backend::*;
pub use debug::send_dynamo_request;
pub use schema::*;
pub use size::*;
pub use value::*;
