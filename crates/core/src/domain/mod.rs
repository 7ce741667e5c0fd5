pub mod intent;
pub mod knowledge;
pub mod lead;
pub mod session;
