pub mod aws;
pub mod command;
pub mod dynamodb;
