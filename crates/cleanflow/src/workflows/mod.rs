pub mod booking;
pub mod collaborators;
pub mod matching;
pub mod reliability;
