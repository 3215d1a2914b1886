pub mod explorer_state;
pub mod session;
