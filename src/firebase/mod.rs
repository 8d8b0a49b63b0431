pub mod connection;
pub mod stream;

pub use connection::FirebaseClient;
