pub mod analysis;
pub mod evaluation;
pub mod question;
