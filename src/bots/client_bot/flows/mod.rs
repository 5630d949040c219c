pub mod edit;
pub mod intake;
pub mod templates;
