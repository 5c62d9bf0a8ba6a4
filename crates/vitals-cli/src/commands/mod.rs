//! Command handlers, one module per subcommand.

mod activity;
#[cfg(feature = "dev-tools")]
mod dev;
mod doctor;
mod heart;
mod init;
mod meds;
mod nutrition;
mod records;
mod register;
mod summary;

pub use activity::handle_activity;
#[cfg(feature = "dev-tools")]
pub use dev::handle_dev;
pub use doctor::handle_doctor;
pub use heart::handle_heart;
pub use init::handle_init;
pub use meds::handle_meds;
pub use nutrition::handle_nutrition;
pub use records::handle_records;
pub use register::handle_register;
pub use summary::handle_summary;
